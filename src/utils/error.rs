use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlWriteError(#[from] toml::ser::Error),

    #[error("Spool capacity must be greater than 0 (got {value})")]
    InvalidCapacity { value: f64 },

    #[error("Profile name is required")]
    EmptyName,

    #[error("Invalid value for '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Profile not found: {name}")]
    ProfileNotFound { name: String },

    #[error("Instruction file not found: {path}")]
    FileMissing { path: String },

    #[error("Cannot resolve file '{path}' on origin '{origin}'")]
    UnresolvableFile { origin: String, path: String },

    #[error("Forbidden: {action}")]
    Forbidden { action: String },

    #[error("Unknown command")]
    UnknownCommand { command: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Persistence error: {message}")]
    PersistenceError { message: String },
}

/// 對應到命令 API 的錯誤分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    Forbidden,
    Unrecognized,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl TrackerError {
    pub fn invalid_field(field: &str, reason: impl Into<String>) -> Self {
        TrackerError::InvalidField {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TrackerError::InvalidCapacity { .. }
            | TrackerError::EmptyName
            | TrackerError::InvalidField { .. }
            | TrackerError::ProfileNotFound { .. } => ErrorKind::InvalidInput,
            TrackerError::FileMissing { .. } | TrackerError::UnresolvableFile { .. } => {
                ErrorKind::NotFound
            }
            TrackerError::Forbidden { .. } => ErrorKind::Forbidden,
            TrackerError::UnknownCommand { .. } => ErrorKind::Unrecognized,
            TrackerError::IoError(_)
            | TrackerError::SerializationError(_)
            | TrackerError::TomlParseError(_)
            | TrackerError::TomlWriteError(_)
            | TrackerError::ConfigError { .. }
            | TrackerError::InvalidConfigValueError { .. }
            | TrackerError::PersistenceError { .. } => ErrorKind::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TrackerError::FileMissing { .. } | TrackerError::UnresolvableFile { .. } => {
                ErrorSeverity::Low
            }
            TrackerError::InvalidCapacity { .. }
            | TrackerError::EmptyName
            | TrackerError::InvalidField { .. }
            | TrackerError::ProfileNotFound { .. }
            | TrackerError::UnknownCommand { .. } => ErrorSeverity::Medium,
            TrackerError::Forbidden { .. }
            | TrackerError::ConfigError { .. }
            | TrackerError::InvalidConfigValueError { .. }
            | TrackerError::TomlParseError(_) => ErrorSeverity::High,
            TrackerError::IoError(_)
            | TrackerError::SerializationError(_)
            | TrackerError::TomlWriteError(_)
            | TrackerError::PersistenceError { .. } => ErrorSeverity::Critical,
        }
    }

    /// 給終端使用者看的訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            TrackerError::InvalidCapacity { .. } => {
                "Spool capacity must be greater than 0".to_string()
            }
            TrackerError::EmptyName => "Profile name is required".to_string(),
            TrackerError::InvalidField { field, reason } => {
                format!("Field '{}' is invalid: {}", field, reason)
            }
            TrackerError::ProfileNotFound { name } => format!("No profile named '{}'", name),
            TrackerError::FileMissing { path } => format!("G-code file not found: {}", path),
            TrackerError::UnresolvableFile { origin, path } => {
                format!("Cannot locate '{}' on '{}'", path, origin)
            }
            TrackerError::Forbidden { .. } => "Permission denied".to_string(),
            TrackerError::UnknownCommand { .. } => "Unknown command".to_string(),
            TrackerError::ConfigError { message } => format!("Configuration problem: {}", message),
            TrackerError::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration field '{}' is invalid: {}", field, reason)
            }
            TrackerError::TomlParseError(e) => format!("Could not parse TOML: {}", e),
            TrackerError::PersistenceError { message } => {
                format!("Could not save spool settings: {}", message)
            }
            other => other.to_string(),
        }
    }

    /// 建議的修復方式
    pub fn recovery_suggestion(&self) -> &'static str {
        match self.kind() {
            ErrorKind::InvalidInput => "Check the command arguments and try again",
            ErrorKind::NotFound => "Make sure the print file still exists on the printer host",
            ErrorKind::Forbidden => "Ask an administrator to grant the required access",
            ErrorKind::Unrecognized => {
                "Use one of: load_new_spool, save_profile, delete_profile, apply_profile"
            }
            ErrorKind::Internal => match self {
                TrackerError::ConfigError { .. }
                | TrackerError::InvalidConfigValueError { .. }
                | TrackerError::TomlParseError(_) => {
                    "Fix the configuration file and run the command again"
                }
                _ => "Check file permissions and free disk space for the settings file",
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
