pub mod config;
pub mod error;
pub mod init_script;
pub mod installer;
pub mod privilege;
pub mod registration;
pub mod runner;
pub mod store;
pub mod template;


pub use config::{ServiceConfig, Settings};
pub use error::{ChainKind, ServiceError};
pub use installer::{InstallReport, Installer};
pub use registration::RegistrationTool;
pub use runner::{CommandOutcome, CommandRunner, ShellCommand, TokioRunner};
pub use store::{LocalFs, ScriptStore};
