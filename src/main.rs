//! Binary entry point for the `skiff` CLI.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use skiff::config::{ConfigError, VultrConfig};
use skiff::lifecycle::{self, Intent, LifecycleError, WaitPolicy};
use skiff::report::ConvergeReport;
use skiff::spec::{ServerSpec, SpecError};
use skiff::user_data::{UserDataError, resolve_user_data};
use skiff::vultr::{HttpApiClient, VultrServer, fields};

mod cli;

use cli::{Cli, ServerCommand, StateArg};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid server spec: {0}")]
    Spec(#[from] SpecError),
    #[error("user-data error: {0}")]
    UserData(#[from] UserDataError),
    #[error("convergence failed: {0}")]
    Lifecycle(#[from] LifecycleError),
    #[error("failed to render the report: {0}")]
    Report(String),
}

#[tokio::main]
async fn main() {
    init_logging();

    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

async fn dispatch(cli: Cli) -> Result<i32, CliError> {
    match cli {
        Cli::Server(command) => server_command(command).await,
    }
}

async fn server_command(args: ServerCommand) -> Result<i32, CliError> {
    let config = VultrConfig::load_without_cli_args()?;
    config.validate()?;

    let intent = match args.state {
        StateArg::Present => Intent::Present,
        StateArg::Absent => Intent::Absent,
    };
    let user_data = resolve_user_data(args.user_data.as_deref(), args.user_data_file.as_deref())?;
    let spec = ServerSpec::builder()
        .name(args.name)
        .region(args.region.unwrap_or_default())
        .os(args.os.unwrap_or_default())
        .plan(args.plan.unwrap_or_default())
        .ssh_keys(args.ssh_keys)
        .startup_script(args.startup_script)
        .tag(args.tag)
        .user_data(user_data)
        .build()?;
    spec.validate_for(intent)?;

    let api = HttpApiClient::new(&config);
    let mut module = VultrServer::new(api, spec, args.check);
    let outcome = lifecycle::converge(
        &mut module,
        &WaitPolicy::default(),
        intent,
        !args.no_start_on_update,
    )
    .await?;

    let report = ConvergeReport {
        changed: outcome.changed,
        diff: outcome.diff,
        server: outcome.server.map(|record| fields::normalize(&record.raw)),
    };
    write_report(io::stdout(), &report)?;
    Ok(0)
}

fn write_report(mut target: impl Write, report: &ConvergeReport) -> Result<(), CliError> {
    let rendered =
        serde_json::to_string_pretty(report).map_err(|err| CliError::Report(err.to_string()))?;
    writeln!(target, "{rendered}").map_err(|err| CliError::Report(err.to_string()))
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use skiff::report::Diff;

    #[test]
    fn write_report_renders_pretty_json() {
        let report = ConvergeReport {
            changed: true,
            diff: Diff::for_deletion("12345"),
            server: None,
        };
        let mut buf = Vec::new();
        write_report(&mut buf, &report)
            .unwrap_or_else(|err| panic!("report should render: {err}"));
        let rendered = String::from_utf8(buf).unwrap_or_else(|err| panic!("utf8: {err}"));
        let parsed: Value = serde_json::from_str(&rendered)
            .unwrap_or_else(|err| panic!("report should be valid JSON: {err}"));
        assert_eq!(parsed["changed"], Value::Bool(true));
        assert_eq!(parsed["diff"]["before"]["id"], "12345");
        assert!(parsed.get("server").is_none());
    }

    #[test]
    fn write_error_writes_cli_error() {
        let mut buf = Vec::new();
        let err = CliError::Report(String::from("boom"));
        write_error(&mut buf, &err);
        let rendered = String::from_utf8(buf).unwrap_or_else(|err| panic!("utf8: {err}"));
        assert!(
            rendered.contains("failed to render the report"),
            "rendered: {rendered}"
        );
    }
}
