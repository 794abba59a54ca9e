use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ServiceError;
use crate::runner::ShellCommand;
use crate::template::render;

pub const SERVICE_NAME_TEMPLATE: &str = "tellki-agent{{ID}}";
pub const PID_FILE_TEMPLATE: &str = "agent{{ID}}pid";
pub const START_COMMAND_TEMPLATE: &str = "tellkiagent{{ID}}";
pub const SERVICE_FILE_TEMPLATE: &str = "{{INIT_DIR}}/{{SERVICE_NAME}}";

pub const AGENT_CHECK_FLAG: &str = "-check";
pub const AGENT_ID_FLAG: &str = "-id";
pub const AGENT_PROGRAM: &str = "tellki-agent";

pub const CMD_SERVICE: &str = "{{SERVICE_FILE_PATH}} {{COMMAND}}";
pub const CMD_UPDATE_RC: &str = "update-rc.d {{SERVICE_NAME}} defaults";
pub const CMD_CHKCONFIG: &str = "chkconfig --add {{SERVICE_NAME}}";
pub const CMD_INSSERV: &str = "insserv {{SERVICE_FILE_PATH}},start:lvl2,lvl3,lvl4,lvl5";
pub const CMD_REMOVE_UPDATE_RC: &str = "update-rc.d -f {{SERVICE_NAME}} remove";
pub const CMD_REMOVE_CHKCONFIG: &str = "chkconfig --del {{SERVICE_NAME}}";
pub const CMD_REMOVE_INSSERV: &str = "insserv -r {{SERVICE_FILE_PATH}}";

/// Installer settings, optionally read from a TOML file. Every field has a
/// default so an empty file is valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Directory the init script is written into.
    pub init_dir: PathBuf,
    /// Agent installation root, written into the script as `PATH_A`.
    /// Defaults to the parent of the installer's own directory.
    pub install_root: Option<PathBuf>,
    /// Agent executable forked once with `-check`. Defaults to
    /// `tellki-agent` next to the installer.
    pub agent_program: Option<PathBuf>,
    /// User the init script starts the agent as.
    pub agent_user: String,
    /// Mode applied to the written init script.
    pub script_mode: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            init_dir: PathBuf::from("/etc/init.d"),
            install_root: None,
            agent_program: None,
            agent_user: "root".to_string(),
            script_mode: 0o700,
        }
    }
}

impl Settings {
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read settings {}", path.display()))?;
        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("failed to parse settings {}", path.display()))?;
        Ok(settings)
    }

    /// Fill `install_root` and `agent_program` from the installer's location
    /// when the file left them unset.
    pub fn resolve_paths(mut self, installer_dir: &Path) -> Self {
        if self.install_root.is_none() {
            let root = installer_dir.parent().unwrap_or(installer_dir);
            self.install_root = Some(root.to_path_buf());
        }
        if self.agent_program.is_none() {
            self.agent_program = Some(installer_dir.join(AGENT_PROGRAM));
        }
        self
    }

    /// Agent executable; an unresolved setting falls back to a `PATH` lookup
    /// of `tellki-agent`.
    pub fn agent_program(&self) -> PathBuf {
        self.agent_program
            .clone()
            .unwrap_or_else(|| PathBuf::from(AGENT_PROGRAM))
    }
}

/// Locate the instance identifier: the value following the first `-id`.
/// A trailing `-id` with nothing after it counts as absent.
pub fn instance_id(args: &[String]) -> Result<Option<String>, ServiceError> {
    let position = match args.iter().position(|arg| arg == AGENT_ID_FLAG) {
        Some(position) => position,
        None => return Ok(None),
    };

    match args.get(position + 1) {
        Some(id) if is_valid_id(id) => Ok(Some(id.clone())),
        Some(id) => Err(ServiceError::InvalidInstanceId(id.clone())),
        None => Ok(None),
    }
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Everything derived for one agent instance. Built once per invocation and
/// passed by reference to each step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub instance_id: Option<String>,
    pub service_name: String,
    pub pid_file: String,
    pub start_command: String,
    pub service_file_path: PathBuf,
}

impl ServiceConfig {
    pub fn derive(settings: &Settings, instance_id: Option<&str>) -> Result<Self, ServiceError> {
        let (name_id, pid_id, start_id) = match instance_id {
            Some(id) => (
                format!(".{}", id),
                format!(".{}.", id),
                format!(" {} {}", AGENT_ID_FLAG, id),
            ),
            None => (String::new(), ".".to_string(), String::new()),
        };

        let service_name = render(SERVICE_NAME_TEMPLATE, &[("ID", name_id.as_str())])?;
        let pid_file = render(PID_FILE_TEMPLATE, &[("ID", pid_id.as_str())])?;
        let start_command = render(START_COMMAND_TEMPLATE, &[("ID", start_id.as_str())])?;

        let init_dir = settings.init_dir.to_string_lossy();
        let init_dir = init_dir.trim_end_matches('/');
        let service_file_path = render(
            SERVICE_FILE_TEMPLATE,
            &[("INIT_DIR", init_dir), ("SERVICE_NAME", service_name.as_str())],
        )?;

        Ok(Self {
            instance_id: instance_id.map(str::to_string),
            service_name,
            pid_file,
            start_command,
            service_file_path: PathBuf::from(service_file_path),
        })
    }

    pub fn from_args(settings: &Settings, args: &[String]) -> Result<Self, ServiceError> {
        let id = instance_id(args)?;
        Self::derive(settings, id.as_deref())
    }

    /// Substitute `SERVICE_NAME` and `SERVICE_FILE_PATH` into a command
    /// template and split it into a runnable command.
    pub fn command(&self, template: &str) -> Result<ShellCommand, ServiceError> {
        let path = self.service_file_path.to_string_lossy();
        let line = render(
            template,
            &[
                ("SERVICE_NAME", self.service_name.as_str()),
                ("SERVICE_FILE_PATH", &*path),
            ],
        )?;
        Ok(ShellCommand::parse(&line))
    }

    /// `<service file> <action>`, used for start/stop/status.
    pub fn control_command(&self, action: &str) -> Result<ShellCommand, ServiceError> {
        let path = self.service_file_path.to_string_lossy();
        let line = render(
            CMD_SERVICE,
            &[("SERVICE_FILE_PATH", &*path), ("COMMAND", action)],
        )?;
        Ok(ShellCommand::parse(&line))
    }
}
