use crate::config::toml_config::{TrackerConfig, DEFAULT_CONFIG_PATH};
use crate::domain::model::{DEFAULT_COLOR, DEFAULT_FILAMENT_TYPE};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};

#[derive(Debug, Clone, Parser)]
#[command(name = "spool-tracker")]
#[command(about = "Track remaining filament on the active 3D-printer spool")]
pub struct CliConfig {
    /// Path to TOML configuration file; spool-tracker.toml is used when present
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override storage.settings_path from the config file
    #[arg(long, global = true)]
    pub settings: Option<String>,

    /// Override logging.format from the config file
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CliCommand {
    /// Show the active spool and stored profiles
    State,

    /// Load a new spool; remaining mass resets to its capacity
    LoadSpool {
        #[arg(long)]
        capacity: f64,
        #[arg(long = "type", default_value = DEFAULT_FILAMENT_TYPE)]
        filament_type: String,
        #[arg(long, default_value = DEFAULT_COLOR)]
        color: String,
        #[arg(long, default_value = "")]
        manufacturer: String,
    },

    /// Create or replace a named spool profile
    SaveProfile {
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 0.0)]
        capacity: f64,
        #[arg(long = "type", default_value = DEFAULT_FILAMENT_TYPE)]
        filament_type: String,
        #[arg(long, default_value = DEFAULT_COLOR)]
        color: String,
        #[arg(long, default_value = "")]
        manufacturer: String,
    },

    /// Delete a named spool profile
    DeleteProfile {
        #[arg(long)]
        name: String,
    },

    /// Load a new spool from a stored profile
    ApplyProfile {
        #[arg(long)]
        name: String,
    },

    /// Account for one completed print job
    JobDone {
        #[arg(long, default_value = crate::adapters::files::LOCAL_ORIGIN)]
        origin: String,
        #[arg(long)]
        path: String,
    },

    /// Read newline-delimited JSON host events from stdin
    Events,

    /// Send a raw command to the command API
    Command {
        name: String,
        /// JSON object with the command fields
        #[arg(long, default_value = "{}")]
        data: String,
    },
}

impl CliCommand {
    /// 轉換為命令 API 的名稱與資料；非命令 API 的子命令回傳 `None`
    pub fn to_api_command(&self) -> Option<(String, Value)> {
        match self {
            CliCommand::LoadSpool {
                capacity,
                filament_type,
                color,
                manufacturer,
            } => Some((
                "load_new_spool".to_string(),
                json!({
                    "spool_capacity_g": capacity,
                    "filament_type": filament_type,
                    "color": color,
                    "manufacturer": manufacturer,
                }),
            )),
            CliCommand::SaveProfile {
                name,
                capacity,
                filament_type,
                color,
                manufacturer,
            } => Some((
                "save_profile".to_string(),
                json!({
                    "name": name,
                    "spool_capacity_g": capacity,
                    "filament_type": filament_type,
                    "color": color,
                    "manufacturer": manufacturer,
                }),
            )),
            CliCommand::DeleteProfile { name } => {
                Some(("delete_profile".to_string(), json!({ "name": name })))
            }
            CliCommand::ApplyProfile { name } => {
                Some(("apply_profile".to_string(), json!({ "name": name })))
            }
            _ => None,
        }
    }

    /// `events` 會把狀態更新寫到 stdout
    pub fn streams_notifications(&self) -> bool {
        matches!(self, CliCommand::Events)
    }
}

impl CliConfig {
    pub fn config_path(&self) -> &str {
        self.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH)
    }

    /// 明確指定的配置檔必須存在；預設路徑不存在時使用預設配置
    pub fn load_config(&self) -> crate::utils::error::Result<TrackerConfig> {
        TrackerConfig::load(self.config_path(), self.config.is_some())
    }

    /// 套用命令列覆蓋設定
    pub fn apply_overrides(&self, config: &mut TrackerConfig) {
        if let Some(settings) = &self.settings {
            config.storage.settings_path = settings.clone();
        }
        if let Some(format) = self.log_format {
            config.logging.format = match format {
                LogFormat::Compact => "compact".to_string(),
                LogFormat::Json => "json".to_string(),
            };
        }
    }
}
