use crate::domain::model::PersistedSettings;
use crate::domain::ports::SettingsStore;
use crate::utils::error::{Result, TrackerError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::io::AsyncWriteExt;

/// TOML file holding the spool settings tree.
#[derive(Debug, Clone)]
pub struct TomlSettingsStore {
    path: PathBuf,
}

impl TomlSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SettingsStore for TomlSettingsStore {
    async fn load(&self) -> Result<Option<PersistedSettings>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(TrackerError::IoError(e)),
        };

        let settings = toml::from_str(&content)?;
        Ok(Some(settings))
    }

    /// 先寫入暫存檔並 fsync，再以 rename 原子替換
    async fn save(&self, settings: &PersistedSettings) -> Result<()> {
        let content = toml::to_string_pretty(settings)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let temp_path = self.temp_path();
        let write = async {
            let mut file = tokio::fs::File::create(&temp_path).await?;
            file.write_all(content.as_bytes()).await?;
            file.sync_all().await?;
            tokio::fs::rename(&temp_path, &self.path).await
        };

        write.await.map_err(|e| TrackerError::PersistenceError {
            message: format!("{}: {}", self.path.display(), e),
        })?;

        tracing::debug!("Saved spool settings to {}", self.path.display());
        Ok(())
    }
}

/// Keeps settings in memory; used by tests and embedders without a settings file.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: Mutex<Option<PersistedSettings>>,
    saves: Mutex<usize>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: PersistedSettings) -> Self {
        Self {
            settings: Mutex::new(Some(settings)),
            saves: Mutex::new(0),
        }
    }

    pub fn current(&self) -> Option<PersistedSettings> {
        self.settings.lock().ok()?.clone()
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|n| *n).unwrap_or(0)
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self) -> Result<Option<PersistedSettings>> {
        Ok(self.current())
    }

    async fn save(&self, settings: &PersistedSettings) -> Result<()> {
        let mut slot = self
            .settings
            .lock()
            .map_err(|e| TrackerError::PersistenceError {
                message: e.to_string(),
            })?;
        *slot = Some(settings.clone());

        if let Ok(mut saves) = self.saves.lock() {
            *saves += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Profile;
    use tempfile::TempDir;

    fn sample_settings() -> PersistedSettings {
        let mut settings = PersistedSettings {
            spool_capacity_g: 1000.0,
            remaining_g: 612.25,
            filament_type: "PETG".to_string(),
            color: "#1e90ff".to_string(),
            manufacturer: "Polymaker".to_string(),
            ..PersistedSettings::default()
        };
        settings.profiles.insert(
            "Polymaker Blue".to_string(),
            Profile {
                spool_capacity_g: 1000.0,
                filament_type: "PETG".to_string(),
                color: "#1e90ff".to_string(),
                manufacturer: "Polymaker".to_string(),
            },
        );
        settings
    }

    #[tokio::test]
    async fn test_missing_file_is_first_use() {
        let dir = TempDir::new().unwrap();
        let store = TomlSettingsStore::new(dir.path().join("settings.toml"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = TomlSettingsStore::new(dir.path().join("nested/settings.toml"));

        store.save(&sample_settings()).await.unwrap();
        assert!(!store.temp_path().exists());

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, sample_settings());
    }

    #[tokio::test]
    async fn test_load_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "remaining_g = 42.5\nmanufacturer = \"Sunlu\"\n").unwrap();

        let loaded = TomlSettingsStore::new(&path).load().await.unwrap().unwrap();
        assert_eq!(loaded.remaining_g, 42.5);
        assert_eq!(loaded.manufacturer, "Sunlu");
        assert_eq!(loaded.filament_type, "PLA");
        assert!(loaded.profiles.is_empty());
    }

    #[tokio::test]
    async fn test_load_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "remaining_g = [not toml").unwrap();

        let err = TomlSettingsStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, TrackerError::TomlParseError(_)));
    }

    #[test]
    fn test_memory_store_counts_saves() {
        let store = MemorySettingsStore::new();
        assert!(tokio_test::block_on(store.load()).unwrap().is_none());

        tokio_test::block_on(store.save(&sample_settings())).unwrap();
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.current(), Some(sample_settings()));
    }
}
