use crate::adapters::{LocalFileResolver, StaticAuthorizer};
use crate::core::extractor::{UsageExtractor, DEFAULT_TAIL_WINDOW};
use crate::utils::error::{Result, TrackerError};
use crate::utils::validation::{validate_one_of, validate_path, validate_range, Validate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "spool-tracker.toml";

const MAX_TAIL_WINDOW: u64 = 16 * 1024 * 1024;

static ENV_VAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub storage: StorageConfig,
    pub files: FilesConfig,
    pub extractor: ExtractorConfig,
    pub access: AccessConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub settings_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            settings_path: "./spool-tracker-settings.toml".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    pub uploads_dir: String,
    pub origins: HashMap<String, String>,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            uploads_dir: "./uploads".to_string(),
            origins: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub tail_window_bytes: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            tail_window_bytes: DEFAULT_TAIL_WINDOW,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    pub read: bool,
    pub write: bool,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            read: true,
            write: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl TrackerConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(TrackerError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 檔案不存在時使用預設配置
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load(path, false)
    }

    /// `required` 為 true 時檔案必須存在，否則回傳 `ConfigError`
    pub fn load<P: AsRef<Path>>(path: P, required: bool) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::from_file(path);
        }

        if required {
            return Err(TrackerError::ConfigError {
                message: format!("config file {} not found", path.display()),
            });
        }

        tracing::debug!("Config file {} not found, using defaults", path.display());
        Ok(Self::default())
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| TrackerError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${UPLOADS_DIR})，未定義的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_RE
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn extractor(&self) -> UsageExtractor {
        UsageExtractor::new(self.extractor.tail_window_bytes)
    }

    pub fn resolver(&self) -> LocalFileResolver {
        self.files
            .origins
            .iter()
            .fold(LocalFileResolver::new(&self.files.uploads_dir), |resolver, (origin, root)| {
                resolver.with_origin(origin, root)
            })
    }

    pub fn authorizer(&self) -> StaticAuthorizer {
        StaticAuthorizer::new(self.access.read, self.access.write)
    }
}

impl Validate for TrackerConfig {
    fn validate(&self) -> Result<()> {
        validate_path("storage.settings_path", &self.storage.settings_path)?;
        validate_path("files.uploads_dir", &self.files.uploads_dir)?;
        for (origin, root) in &self.files.origins {
            validate_path(&format!("files.origins.{}", origin), root)?;
        }

        validate_range(
            "extractor.tail_window_bytes",
            self.extractor.tail_window_bytes,
            1,
            MAX_TAIL_WINDOW,
        )?;

        validate_one_of("logging.format", &self.logging.format, &["compact", "json"])?;
        validate_one_of(
            "logging.level",
            &self.logging.level,
            &["trace", "debug", "info", "warn", "error"],
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{Authorizer, FileResolver};
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TrackerConfig::from_toml_str("").unwrap();

        assert_eq!(config.storage.settings_path, "./spool-tracker-settings.toml");
        assert_eq!(config.extractor.tail_window_bytes, 32768);
        assert!(config.access.read && config.access.write);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[storage]
settings_path = "/var/lib/spool/settings.toml"

[files]
uploads_dir = "/srv/uploads"

[files.origins]
sdcard = "/mnt/sd"

[extractor]
tail_window_bytes = 65536

[access]
read = true
write = false

[logging]
level = "debug"
format = "json"
"#;

        let config = TrackerConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.extractor().window(), 65536);
        assert!(!config.authorizer().can_write());
        assert_eq!(
            config.resolver().path_on_disk("sdcard", "part.gco").unwrap(),
            PathBuf::from("/mnt/sd/part.gco")
        );
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("SPOOL_TEST_UPLOADS", "/tmp/spool-uploads");

        let toml_content = r#"
[files]
uploads_dir = "${SPOOL_TEST_UPLOADS}"

[storage]
settings_path = "${SPOOL_TEST_UNDEFINED_VAR}"
"#;

        let config = TrackerConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.files.uploads_dir, "/tmp/spool-uploads");
        assert_eq!(config.storage.settings_path, "${SPOOL_TEST_UNDEFINED_VAR}");

        std::env::remove_var("SPOOL_TEST_UPLOADS");
    }

    #[test]
    fn test_config_validation() {
        let config = TrackerConfig::from_toml_str(
            r#"
[extractor]
tail_window_bytes = 0
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = TrackerConfig::from_toml_str(
            r#"
[logging]
format = "xml"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[storage]\nsettings_path = \"./file-test.toml\"\n")
            .unwrap();

        let config = TrackerConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.storage.settings_path, "./file-test.toml");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = TrackerConfig::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.files.uploads_dir, "./uploads");
    }

    #[test]
    fn test_required_config_must_exist() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = TrackerConfig::load(dir.path().join("typo.toml"), true).unwrap_err();
        assert!(matches!(err, TrackerError::ConfigError { .. }));
        assert!(err.to_string().contains("typo.toml"));

        let path = dir.path().join("present.toml");
        std::fs::write(&path, "[files]\nuploads_dir = \"/srv/gcode\"\n").unwrap();
        let config = TrackerConfig::load(&path, true).unwrap();
        assert_eq!(config.files.uploads_dir, "/srv/gcode");
    }
}
