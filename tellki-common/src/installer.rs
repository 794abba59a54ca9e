use tracing::{debug, info};

use crate::config::{ServiceConfig, Settings, AGENT_CHECK_FLAG, AGENT_PROGRAM};
use crate::error::{ChainKind, ServiceError};
use crate::init_script::render_init_script;
use crate::privilege::require_root;
use crate::registration::{run_chain, RegistrationTool};
use crate::runner::{CommandRunner, ShellCommand};
use crate::store::{LocalFs, ScriptStore};

/// Result of a completed install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub config: ServiceConfig,
    pub tool: RegistrationTool,
}

/// Drives install, uninstall and service control for one invocation.
/// Steps run strictly one after another; a failing step ends the run and
/// leaves whatever earlier steps already did in place.
pub struct Installer<R, S = LocalFs> {
    runner: R,
    store: S,
    settings: Settings,
}

impl<R: CommandRunner> Installer<R> {
    pub fn new(runner: R, settings: Settings) -> Self {
        Self::with_store(runner, LocalFs, settings)
    }
}

impl<R: CommandRunner, S: ScriptStore> Installer<R, S> {
    pub fn with_store(runner: R, store: S, settings: Settings) -> Self {
        Self {
            runner,
            store,
            settings,
        }
    }

    pub async fn install(&self, agent_args: &[String]) -> Result<InstallReport, ServiceError> {
        require_root(&self.runner).await?;

        let mut args = agent_args.to_vec();
        args.push(AGENT_CHECK_FLAG.to_string());
        self.check_agent(&args).await?;

        let config = ServiceConfig::from_args(&self.settings, agent_args)?;
        info!("Installing {} service", config.service_name);

        self.write_init_script(&config).await?;

        let tool = run_chain(&self.runner, &config, ChainKind::Install).await?;
        self.control(&config, "start").await?;

        info!("Installed {} service", config.service_name);
        Ok(InstallReport { config, tool })
    }

    pub async fn uninstall(&self, agent_args: &[String]) -> Result<ServiceConfig, ServiceError> {
        require_root(&self.runner).await?;

        let config = ServiceConfig::from_args(&self.settings, agent_args)?;
        info!("Uninstalling {} service", config.service_name);

        self.control(&config, "stop").await?;
        run_chain(&self.runner, &config, ChainKind::Uninstall).await?;

        self.store
            .remove(&config.service_file_path)
            .await
            .map_err(|source| ServiceError::DeleteInitScript {
                path: config.service_file_path.clone(),
                source,
            })?;

        info!("Uninstalled {} service", config.service_name);
        Ok(config)
    }

    /// Send `start`, `stop` or `status` to an installed service.
    pub async fn send(&self, agent_args: &[String], action: &str) -> Result<ServiceConfig, ServiceError> {
        require_root(&self.runner).await?;
        let config = ServiceConfig::from_args(&self.settings, agent_args)?;
        self.control(&config, action).await?;
        Ok(config)
    }

    /// Render the init script for the given arguments without touching the
    /// system.
    pub fn preview(&self, agent_args: &[String]) -> Result<String, ServiceError> {
        let config = ServiceConfig::from_args(&self.settings, agent_args)?;
        render_init_script(&config, &self.settings)
    }

    async fn check_agent(&self, args: &[String]) -> Result<(), ServiceError> {
        let program = self.settings.agent_program();
        let command = ShellCommand::new(program.to_string_lossy(), args.to_vec());
        debug!("Validating agent with {}", command);

        if self.runner.run(&command).await.is_success() {
            Ok(())
        } else {
            Err(ServiceError::AgentCheckFailed {
                service: AGENT_PROGRAM.to_string(),
            })
        }
    }

    async fn write_init_script(&self, config: &ServiceConfig) -> Result<(), ServiceError> {
        let script = render_init_script(config, &self.settings)?;
        let path = &config.service_file_path;

        self.store
            .write(path, &script)
            .await
            .map_err(|source| ServiceError::WriteInitScript {
                path: path.clone(),
                source,
            })?;

        self.store
            .set_mode(path, self.settings.script_mode)
            .await
            .map_err(|source| ServiceError::SetPermissions {
                path: path.clone(),
                source,
            })?;

        info!(
            "Wrote {} with mode {:o}",
            path.display(),
            self.settings.script_mode
        );
        Ok(())
    }

    async fn control(&self, config: &ServiceConfig, action: &str) -> Result<(), ServiceError> {
        let command = config.control_command(action)?;
        if self.runner.run(&command).await.is_success() {
            info!("Sent {} to {}", action, config.service_name);
            Ok(())
        } else {
            Err(ServiceError::ServiceControl {
                action: action.to_string(),
            })
        }
    }
}
