use crate::config::{ServiceConfig, Settings};
use crate::error::ServiceError;
use crate::template::render;

/// System-V init script for the agent. Supports `start`, `stop` and `status`.
pub const INIT_SCRIPT: &str = include_str!("../assets/tellki-agent.init");

/// Render the script for one instance. `install_root` must already be
/// resolved; an unset root leaves `PATH_S` unresolved.
pub fn render_init_script(
    config: &ServiceConfig,
    settings: &Settings,
) -> Result<String, ServiceError> {
    let root = settings
        .install_root
        .as_deref()
        .map(|root| root.to_string_lossy())
        .ok_or_else(|| ServiceError::UnresolvedPlaceholder("PATH_S".to_string()))?;

    render(
        INIT_SCRIPT,
        &[
            ("PATH_S", &*root),
            ("SERVICE_NAME_S", config.service_name.as_str()),
            ("PIDFILE_S", config.pid_file.as_str()),
            ("STARTCMD_S", config.start_command.as_str()),
            ("AGENTUSER_S", settings.agent_user.as_str()),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use std::process::{Command, Stdio};
    use tempfile::TempDir;

    fn settings(root: &str) -> Settings {
        Settings {
            install_root: Some(PathBuf::from(root)),
            ..Settings::default()
        }
    }

    #[test]
    fn test_render_default_instance() {
        let settings = settings("/opt/tellki");
        let config = ServiceConfig::derive(&settings, None).unwrap();
        let script = render_init_script(&config, &settings).unwrap();

        assert!(!script.contains("{{"));
        assert!(script.starts_with("#! /bin/sh\n"));
        assert!(script.contains("PATH_A=/opt/tellki\n"));
        assert!(script.contains("SERVICE_NAME=tellki-agent\n"));
        assert!(script.contains("PIDFILE=\"$PATH_A/cfg/agent.pid\""));
        assert!(script.contains("su $AGENTUSER -c \"tellkiagent &\""));
        assert!(script.contains("AGENTUSER=\"root\""));
    }

    #[test]
    fn test_render_named_instance() {
        let settings = settings("/opt/tellki");
        let config = ServiceConfig::derive(&settings, Some("3")).unwrap();
        let script = render_init_script(&config, &settings).unwrap();

        assert!(!script.contains("{{"));
        assert!(script.contains("# Provides:          tellki-agent.3\n"));
        assert!(script.contains("SERVICE_NAME=tellki-agent.3\n"));
        assert!(script.contains("PIDFILE=\"$PATH_A/cfg/agent.3.pid\""));
        assert!(script.contains("su $AGENTUSER -c \"tellkiagent -id 3 &\""));
    }

    #[test]
    fn test_unresolved_install_root_is_rejected() {
        let settings = Settings::default();
        let config = ServiceConfig::derive(&settings, None).unwrap();
        let err = render_init_script(&config, &settings).unwrap_err();
        assert!(matches!(err, ServiceError::UnresolvedPlaceholder(name) if name == "PATH_S"));
    }

    #[test]
    fn test_script_detects_distribution_markers() {
        for marker in [
            "/etc/SuSE-release",
            "/etc/debian_version",
            "/etc/lsb-release",
            "/etc/gentoo-release",
        ] {
            assert!(INIT_SCRIPT.contains(marker), "missing {}", marker);
        }
    }

    fn ps_available() -> bool {
        Command::new("ps")
            .args(["-p", "1"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    // Freshly written executables can briefly fail with ETXTBSY while other
    // test threads fork.
    fn spawn_retrying(program: &Path) -> std::process::Child {
        let mut attempts = 0;
        loop {
            match Command::new(program).spawn() {
                Ok(child) => return child,
                Err(e) if attempts < 10 => {
                    attempts += 1;
                    eprintln!("retrying spawn of {}: {}", program.display(), e);
                    std::thread::sleep(std::time::Duration::from_millis(50));
                }
                Err(e) => panic!("failed to spawn {}: {}", program.display(), e),
            }
        }
    }

    #[test]
    fn test_start_refuses_when_already_running() {
        if !ps_available() {
            return;
        }

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::create_dir_all(root.join("cfg")).unwrap();

        // A live process whose command name matches the running check.
        let fake_agent = root.join("tellki-agent");
        std::fs::write(&fake_agent, "#!/bin/sh\nwhile :; do sleep 1; done\n").unwrap();
        std::fs::set_permissions(&fake_agent, std::fs::Permissions::from_mode(0o755)).unwrap();
        let mut child = spawn_retrying(&fake_agent);
        std::thread::sleep(std::time::Duration::from_millis(100));
        std::fs::write(root.join("cfg/agent.pid"), child.id().to_string()).unwrap();

        let settings = settings(root.to_str().unwrap());
        let config = ServiceConfig::derive(&settings, None).unwrap();
        let script_path = root.join("tellki-agent.init");
        std::fs::write(&script_path, render_init_script(&config, &settings).unwrap()).unwrap();

        let output = Command::new("sh")
            .arg(&script_path)
            .arg("start")
            .output()
            .unwrap();
        let _ = child.kill();
        let _ = child.wait();

        assert_eq!(output.status.code(), Some(1));
        assert!(String::from_utf8_lossy(&output.stdout).contains("tellki-agent is already running"));
    }

    #[test]
    fn test_status_without_pid_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        let settings = settings(root.to_str().unwrap());
        let config = ServiceConfig::derive(&settings, Some("5")).unwrap();
        let script_path = root.join("tellki-agent.5");
        std::fs::write(&script_path, render_init_script(&config, &settings).unwrap()).unwrap();

        let output = Command::new("sh")
            .arg(&script_path)
            .arg("status")
            .output()
            .unwrap();

        assert!(output.status.success());
        assert!(String::from_utf8_lossy(&output.stdout).contains("tellki-agent.5 is not running"));
    }

    #[test]
    fn test_unknown_action_prints_usage() {
        let temp_dir = TempDir::new().unwrap();
        let settings = settings(temp_dir.path().to_str().unwrap());
        let config = ServiceConfig::derive(&settings, None).unwrap();
        let script_path = temp_dir.path().join("tellki-agent");
        std::fs::write(&script_path, render_init_script(&config, &settings).unwrap()).unwrap();

        let output = Command::new("sh")
            .arg(&script_path)
            .arg("restart")
            .output()
            .unwrap();

        assert_eq!(output.status.code(), Some(1));
        let usage = format!("Usage: {} start|stop|status", script_path.display());
        assert!(String::from_utf8_lossy(&output.stdout).contains(&usage));
    }
}
