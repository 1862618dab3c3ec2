use crate::domain::model::{PersistedSettings, StateChange};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// Durable mirror of the spool settings tree.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// `None` on first use.
    async fn load(&self) -> Result<Option<PersistedSettings>>;
    /// Must be durable and atomic once it returns `Ok`.
    async fn save(&self, settings: &PersistedSettings) -> Result<()>;
}

/// Fire-and-forget broadcast of state changes to observers.
pub trait NotificationSink: Send + Sync {
    fn publish(&self, change: &StateChange);
}

pub trait Authorizer: Send + Sync {
    fn can_read(&self) -> bool;
    fn can_write(&self) -> bool;
}

/// Resolves the opaque `origin`/`path` pair of a finished job into a local file.
pub trait FileResolver: Send + Sync {
    fn path_on_disk(&self, origin: &str, path: &str) -> Result<PathBuf>;
}
