mod service;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tellki_common::{Installer, Settings, TokioRunner};
use tracing::{debug, Level};

#[derive(Parser)]
#[command(name = "tellki-service")]
#[command(about = "Install or remove the tellki-agent System-V init service")]
struct Args {
    /// TOML settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Agent executable forked once to validate it starts
    #[arg(long, global = true)]
    agent: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the agent, write its init script, register and start it
    Install {
        /// Agent arguments, forwarded to the validation run (`-id <n>` selects the instance)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        agent_args: Vec<String>,
    },
    /// Stop the service, unregister it and delete its init script
    Uninstall {
        /// Agent arguments (`-id <n>` selects the instance)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        agent_args: Vec<String>,
    },
    /// Start an installed service
    Start {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        agent_args: Vec<String>,
    },
    /// Stop an installed service
    Stop {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        agent_args: Vec<String>,
    },
    /// Show whether the service is running
    Status {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        agent_args: Vec<String>,
    },
    /// Print the init script that install would write
    PrintScript {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        agent_args: Vec<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args).await {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let settings = load_settings(args.config.as_deref(), args.agent).await?;
    debug!("Using settings {:?}", settings);

    let installer = Installer::new(TokioRunner::new(), settings);
    service::handle_service_command(&installer, args.command).await
}

async fn load_settings(config: Option<&Path>, agent: Option<PathBuf>) -> Result<Settings> {
    let settings = match config {
        Some(path) => Settings::load(path).await?,
        None => Settings::default(),
    };

    let exe = std::env::current_exe()
        .and_then(|exe| exe.canonicalize())
        .context("failed to locate the installer executable")?;
    let installer_dir = exe.parent().unwrap_or_else(|| Path::new("/"));

    let mut settings = settings.resolve_paths(installer_dir);
    if agent.is_some() {
        settings.agent_program = agent;
    }
    Ok(settings)
}
