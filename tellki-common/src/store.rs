use std::fs::Permissions;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// File operations the installer performs on the init script.
#[allow(async_fn_in_trait)]
pub trait ScriptStore {
    async fn write(&self, path: &Path, contents: &str) -> io::Result<()>;

    async fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()>;

    async fn remove(&self, path: &Path) -> io::Result<()>;
}

/// Local filesystem through `tokio::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl ScriptStore for LocalFs {
    async fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        tokio::fs::write(path, contents).await
    }

    async fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
        tokio::fs::set_permissions(path, Permissions::from_mode(mode)).await
    }

    async fn remove(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_file(path).await
    }
}
