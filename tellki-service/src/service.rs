use anyhow::Result;
use tellki_common::{CommandRunner, Installer};

use crate::Commands;

pub async fn handle_service_command<R: CommandRunner>(
    installer: &Installer<R>,
    command: Commands,
) -> Result<()> {
    match command {
        Commands::Install { agent_args } => {
            let report = installer.install(&agent_args).await?;
            println!(
                "Installed service: {} (registered with {})",
                report.config.service_name, report.tool
            );
        }
        Commands::Uninstall { agent_args } => {
            let config = installer.uninstall(&agent_args).await?;
            println!("Uninstalled service: {}", config.service_name);
        }
        Commands::Start { agent_args } => {
            let config = installer.send(&agent_args, "start").await?;
            println!("Started service: {}", config.service_name);
        }
        Commands::Stop { agent_args } => {
            let config = installer.send(&agent_args, "stop").await?;
            println!("Stopped service: {}", config.service_name);
        }
        Commands::Status { agent_args } => {
            installer.send(&agent_args, "status").await?;
        }
        Commands::PrintScript { agent_args } => {
            print!("{}", installer.preview(&agent_args)?);
        }
    }

    Ok(())
}
