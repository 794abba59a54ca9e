use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::runner::CommandOutcome;

/// Which direction a registration chain runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainKind {
    Install,
    Uninstall,
}

impl fmt::Display for ChainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainKind::Install => f.write_str("install"),
            ChainKind::Uninstall => f.write_str("uninstall"),
        }
    }
}

/// Every fatal condition the installer can hit. Each variant renders as the
/// single diagnostic line shown to the operator.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("root access needed")]
    NotRoot,

    #[error("Command whoami not found")]
    WhoamiNotFound,

    #[error("Error executing whoami")]
    WhoamiFailed,

    #[error("Error activating {service}")]
    AgentCheckFailed { service: String },

    #[error("invalid instance identifier `{0}`")]
    InvalidInstanceId(String),

    #[error("unresolved placeholder `{{{{{0}}}}}` in rendered template")]
    UnresolvedPlaceholder(String),

    #[error("Error writing init file {}", .path.display())]
    WriteInitScript { path: PathBuf, source: io::Error },

    #[error("Error setting init file permissions {}", .path.display())]
    SetPermissions { path: PathBuf, source: io::Error },

    #[error("Error deleting init file {}", .path.display())]
    DeleteInitScript { path: PathBuf, source: io::Error },

    #[error("Error sending {action} to service")]
    ServiceControl { action: String },

    #[error("Unable to {kind} {service} service: `{command}` exited with {}", describe_outcome(.outcome))]
    ToolFailed {
        kind: ChainKind,
        service: String,
        command: String,
        outcome: CommandOutcome,
    },

    #[error("Unable to {kind} {service} service")]
    NoRegistrationTool { kind: ChainKind, service: String },
}

fn describe_outcome(outcome: &CommandOutcome) -> String {
    match outcome {
        CommandOutcome::Failed { code: Some(code) } => format!("status {}", code),
        CommandOutcome::Failed { code: None } => "no status (signal or spawn error)".to_string(),
        CommandOutcome::NotFound => "command not found".to_string(),
        CommandOutcome::Success { .. } => "status 0".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_tool_message() {
        let err = ServiceError::NoRegistrationTool {
            kind: ChainKind::Install,
            service: "tellki-agent".to_string(),
        };
        assert_eq!(err.to_string(), "Unable to install tellki-agent service");
    }

    #[test]
    fn test_tool_failed_message() {
        let err = ServiceError::ToolFailed {
            kind: ChainKind::Uninstall,
            service: "tellki-agent.3".to_string(),
            command: "chkconfig --del tellki-agent.3".to_string(),
            outcome: CommandOutcome::Failed { code: Some(2) },
        };
        assert_eq!(
            err.to_string(),
            "Unable to uninstall tellki-agent.3 service: `chkconfig --del tellki-agent.3` exited with status 2"
        );
    }

    #[test]
    fn test_placeholder_message_keeps_braces() {
        let err = ServiceError::UnresolvedPlaceholder("ID".to_string());
        assert_eq!(
            err.to_string(),
            "unresolved placeholder `{{ID}}` in rendered template"
        );
    }
}
