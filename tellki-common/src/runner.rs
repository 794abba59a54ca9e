use std::fmt;
use std::io::ErrorKind;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

/// A program and its arguments, split from a rendered command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ShellCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split a command line on whitespace. No quoting is understood; every
    /// command the installer renders is a plain word list.
    pub fn parse(line: &str) -> Self {
        let mut tokens = line.split_whitespace().map(str::to_string);
        let program = tokens.next().unwrap_or_default();
        Self {
            program,
            args: tokens.collect(),
        }
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// How a child process ended. `NotFound` is reserved for an executable that
/// could not be located, never for a real exit status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Success { stdout: String },
    Failed { code: Option<i32> },
    NotFound,
}

impl CommandOutcome {
    pub fn success() -> Self {
        Self::Success {
            stdout: String::new(),
        }
    }

    pub fn success_with_stdout(stdout: impl Into<String>) -> Self {
        Self::Success {
            stdout: stdout.into(),
        }
    }

    pub fn failed(code: i32) -> Self {
        Self::Failed { code: Some(code) }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Spawns external processes for the installer. Calls are awaited one at a
/// time; no implementation is expected to run commands concurrently.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run with inherited stdio.
    async fn run(&self, command: &ShellCommand) -> CommandOutcome;

    /// Run with stdout piped; a successful outcome carries the trimmed text.
    async fn capture(&self, command: &ShellCommand) -> CommandOutcome;
}

impl<R: CommandRunner> CommandRunner for &R {
    async fn run(&self, command: &ShellCommand) -> CommandOutcome {
        (**self).run(command).await
    }

    async fn capture(&self, command: &ShellCommand) -> CommandOutcome {
        (**self).capture(command).await
    }
}

/// Production runner backed by `tokio::process`. The child inherits the
/// current environment. No timeout is applied.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioRunner;

impl TokioRunner {
    pub fn new() -> Self {
        Self
    }

    fn command(command: &ShellCommand) -> Command {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args).stdin(Stdio::null());
        cmd
    }
}

fn spawn_error(command: &ShellCommand, error: std::io::Error) -> CommandOutcome {
    debug!("Failed to spawn {}: {}", command.program, error);
    if error.kind() == ErrorKind::NotFound {
        CommandOutcome::NotFound
    } else {
        CommandOutcome::Failed { code: None }
    }
}

impl CommandRunner for TokioRunner {
    async fn run(&self, command: &ShellCommand) -> CommandOutcome {
        debug!("Running {}", command);
        match Self::command(command).status().await {
            Ok(status) if status.success() => CommandOutcome::success(),
            Ok(status) => CommandOutcome::Failed {
                code: status.code(),
            },
            Err(e) => spawn_error(command, e),
        }
    }

    async fn capture(&self, command: &ShellCommand) -> CommandOutcome {
        debug!("Running {} (capturing stdout)", command);
        let output = Self::command(command)
            .stdout(Stdio::piped())
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => CommandOutcome::Success {
                stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            },
            Ok(output) => CommandOutcome::Failed {
                code: output.status.code(),
            },
            Err(e) => spawn_error(command, e),
        }
    }
}
