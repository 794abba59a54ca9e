use std::fmt;

use tracing::{info, warn};

use crate::config::{
    ServiceConfig, CMD_CHKCONFIG, CMD_INSSERV, CMD_REMOVE_CHKCONFIG, CMD_REMOVE_INSSERV,
    CMD_REMOVE_UPDATE_RC, CMD_UPDATE_RC,
};
use crate::error::{ChainKind, ServiceError};
use crate::runner::{CommandOutcome, CommandRunner, ShellCommand};

/// Boot-ordering tools, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationTool {
    UpdateRcD,
    Chkconfig,
    Insserv,
}

impl RegistrationTool {
    pub const ALL: [RegistrationTool; 3] = [
        RegistrationTool::UpdateRcD,
        RegistrationTool::Chkconfig,
        RegistrationTool::Insserv,
    ];

    fn template(self, kind: ChainKind) -> &'static str {
        match (self, kind) {
            (RegistrationTool::UpdateRcD, ChainKind::Install) => CMD_UPDATE_RC,
            (RegistrationTool::Chkconfig, ChainKind::Install) => CMD_CHKCONFIG,
            (RegistrationTool::Insserv, ChainKind::Install) => CMD_INSSERV,
            (RegistrationTool::UpdateRcD, ChainKind::Uninstall) => CMD_REMOVE_UPDATE_RC,
            (RegistrationTool::Chkconfig, ChainKind::Uninstall) => CMD_REMOVE_CHKCONFIG,
            (RegistrationTool::Insserv, ChainKind::Uninstall) => CMD_REMOVE_INSSERV,
        }
    }
}

impl fmt::Display for RegistrationTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationTool::UpdateRcD => f.write_str("update-rc.d"),
            RegistrationTool::Chkconfig => f.write_str("chkconfig"),
            RegistrationTool::Insserv => f.write_str("insserv"),
        }
    }
}

/// One rung of the fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationStep {
    pub tool: RegistrationTool,
    pub command: ShellCommand,
}

/// The ordered registration (or removal) commands for a service.
pub fn chain(config: &ServiceConfig, kind: ChainKind) -> Result<Vec<RegistrationStep>, ServiceError> {
    let mut steps = Vec::with_capacity(RegistrationTool::ALL.len());
    for tool in RegistrationTool::ALL {
        steps.push(RegistrationStep {
            tool,
            command: config.command(tool.template(kind))?,
        });
    }
    Ok(steps)
}

/// Try each step in order. An absent tool moves on to the next one; the
/// first success ends the chain; any other failure is fatal.
pub async fn run_chain<R: CommandRunner>(
    runner: &R,
    config: &ServiceConfig,
    kind: ChainKind,
) -> Result<RegistrationTool, ServiceError> {
    for step in chain(config, kind)? {
        match runner.run(&step.command).await {
            CommandOutcome::Success { .. } => {
                info!("{} {} with {}", kind, config.service_name, step.tool);
                return Ok(step.tool);
            }
            CommandOutcome::NotFound => {
                warn!("{} not found, trying next registration tool", step.tool);
            }
            outcome => {
                return Err(ServiceError::ToolFailed {
                    kind,
                    service: config.service_name.clone(),
                    command: step.command.to_string(),
                    outcome,
                });
            }
        }
    }

    Err(ServiceError::NoRegistrationTool {
        kind,
        service: config.service_name.clone(),
    })
}
