//! Return-field mapping for reported server records.
//!
//! The provider's record field names are not the names callers want to see,
//! and a few numeric fields arrive as strings. The table below is a static
//! configuration: each descriptor names a remote field, the output name it
//! maps to, and an optional coercion. It shapes the final reported result
//! only and carries no behaviour.

use serde_json::{Map, Number, Value};

/// Type coercion applied to a remote field value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Coercion {
    /// Pass the value through unchanged.
    None,
    /// Coerce to a JSON integer.
    Int,
    /// Coerce to a JSON float.
    Float,
}

/// One entry of the return-field table.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ReturnField {
    /// Field name in the remote record.
    pub remote: &'static str,
    /// Field name in the normalized output.
    pub output: &'static str,
    /// Coercion applied to the value.
    pub coerce: Coercion,
}

impl ReturnField {
    const fn renamed(remote: &'static str, output: &'static str) -> Self {
        Self {
            remote,
            output,
            coerce: Coercion::None,
        }
    }

    const fn plain(remote: &'static str) -> Self {
        Self::renamed(remote, remote)
    }

    const fn coerced(remote: &'static str, coerce: Coercion) -> Self {
        Self {
            remote,
            output: remote,
            coerce,
        }
    }
}

/// Ordered table of fields reported back to the caller.
pub const RETURN_FIELDS: &[ReturnField] = &[
    ReturnField::renamed("SUBID", "id"),
    ReturnField::renamed("label", "name"),
    ReturnField::plain("date_created"),
    ReturnField::coerced("allowed_bandwidth_gb", Coercion::Int),
    ReturnField::plain("current_bandwidth_gb"),
    ReturnField::plain("default_password"),
    ReturnField::plain("internal_ip"),
    ReturnField::plain("disk"),
    ReturnField::coerced("cost_per_month", Coercion::Float),
    ReturnField::renamed("location", "region"),
    ReturnField::renamed("main_ip", "v4_main_ip"),
    ReturnField::renamed("network_v4", "v4_network"),
    ReturnField::renamed("gateway_v4", "v4_gateway"),
    ReturnField::plain("os"),
    ReturnField::coerced("pending_charges", Coercion::Float),
    ReturnField::plain("ram"),
    ReturnField::plain("plan"),
    ReturnField::plain("status"),
    ReturnField::plain("power_status"),
    ReturnField::plain("tag"),
    ReturnField::plain("v6_main_ip"),
    ReturnField::plain("v6_network"),
    ReturnField::plain("v6_network_size"),
    ReturnField::plain("v6_networks"),
];

/// Shapes a raw server record into the normalized output map.
///
/// Fields absent from the record (or null) are omitted. When a coercion does
/// not apply to the actual value, the raw value is passed through so callers
/// still see what the API returned.
#[must_use]
pub fn normalize(record: &Value) -> Map<String, Value> {
    let mut output = Map::new();
    for field in RETURN_FIELDS {
        let Some(value) = record.get(field.remote) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        output.insert(field.output.to_owned(), coerce(value, field.coerce));
    }
    output
}

fn coerce(value: &Value, coercion: Coercion) -> Value {
    match coercion {
        Coercion::None => value.clone(),
        Coercion::Int => coerce_int(value).unwrap_or_else(|| value.clone()),
        Coercion::Float => coerce_float(value).unwrap_or_else(|| value.clone()),
    }
}

fn coerce_int(value: &Value) -> Option<Value> {
    match value {
        Value::Number(number) => number.as_i64().map(Value::from),
        Value::String(text) => text.trim().parse::<i64>().ok().map(Value::from),
        _ => None,
    }
}

fn coerce_float(value: &Value) -> Option<Value> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    Number::from_f64(parsed).map(Value::Number)
}
