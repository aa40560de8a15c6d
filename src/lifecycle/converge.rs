//! The convergence state machine.
//!
//! One run maps a declared intent onto the minimal set of remote operations:
//! fetch the current record, branch on presence, mutate, and wait for the
//! remote state to reflect the outcome. Nothing is persisted between runs,
//! so a failed run is safely retried by re-invocation.

use tracing::{debug, info};

use crate::report::Diff;

use super::{LifecycleError, ServerModule, ServerRecord, WaitPolicy, wait};

/// Declared desired state for a server.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Intent {
    /// The server should exist and be configured per the spec.
    Present,
    /// The server should not exist.
    Absent,
}

/// Result of one convergence run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Outcome {
    /// Final server record; `None` when the server is absent after the run.
    pub server: Option<ServerRecord>,
    /// Whether any mutating call was (or, in check mode, would be) issued.
    pub changed: bool,
    /// Before/after diff, populated with the identifier on deletion.
    pub diff: Diff,
}

/// Drives the remote server to the declared intent.
///
/// `start_on_update` asks the module to power the server on when an update
/// pass changed anything.
///
/// # Errors
///
/// Returns [`LifecycleError`] when a module operation or wait fails; all
/// failures are terminal for the current run.
pub async fn converge<M: ServerModule>(
    module: &mut M,
    policy: &WaitPolicy,
    intent: Intent,
    start_on_update: bool,
) -> Result<Outcome, LifecycleError> {
    match intent {
        Intent::Present => present_server(module, start_on_update).await,
        Intent::Absent => absent_server(module, policy).await,
    }
}

async fn present_server<M: ServerModule>(
    module: &mut M,
    start_on_update: bool,
) -> Result<Outcome, LifecycleError> {
    let current = module.fetch_server(false).await?;
    if current.is_none() {
        info!(server = module.display_name(), "creating server");
        let created = module.create_server().await?;
        return Ok(Outcome {
            server: created,
            changed: true,
            diff: Diff::default(),
        });
    }

    debug!(server = module.display_name(), "server exists, updating");
    let update = module.update_server(start_on_update).await?;
    Ok(Outcome {
        server: Some(update.record),
        changed: update.changed,
        diff: Diff::default(),
    })
}

async fn absent_server<M: ServerModule>(
    module: &mut M,
    policy: &WaitPolicy,
) -> Result<Outcome, LifecycleError> {
    let Some(server) = module.fetch_server(false).await? else {
        debug!(server = module.display_name(), "server already absent");
        return Ok(Outcome::default());
    };

    let diff = Diff::for_deletion(server.id.as_str());
    if module.check_mode() {
        info!(server = module.display_name(), "check mode, skipping destroy");
        return Ok(Outcome {
            server: Some(server),
            changed: true,
            diff,
        });
    }

    info!(server = module.display_name(), id = %server.id, "destroying server");
    module.destroy_server(&server.id).await?;
    wait::wait_until_destroyed(module, policy).await?;

    Ok(Outcome {
        server: Some(server),
        changed: true,
        diff,
    })
}
