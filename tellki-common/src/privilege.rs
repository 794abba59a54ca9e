use tracing::{debug, info};

use crate::error::ServiceError;
use crate::runner::{CommandOutcome, CommandRunner, ShellCommand};

/// Gate for install and uninstall: `whoami` must succeed and print `root`.
pub async fn require_root<R: CommandRunner>(runner: &R) -> Result<(), ServiceError> {
    let outcome = runner.capture(&ShellCommand::parse("whoami")).await;
    debug!("whoami returned {:?}", outcome);

    match outcome {
        CommandOutcome::Success { stdout } if stdout == "root" => {
            info!("Running with root privileges");
            Ok(())
        }
        CommandOutcome::Success { .. } => Err(ServiceError::NotRoot),
        CommandOutcome::NotFound => Err(ServiceError::WhoamiNotFound),
        CommandOutcome::Failed { .. } => Err(ServiceError::WhoamiFailed),
    }
}
