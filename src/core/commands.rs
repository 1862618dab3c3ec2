use crate::core::service::AccountingService;
use crate::domain::model::{Profile, DEFAULT_COLOR, DEFAULT_FILAMENT_TYPE};
use crate::utils::error::{ErrorKind, Result, TrackerError};
use crate::utils::validation::{parse_mass_field, parse_text_field};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiStatus {
    Ok,
    BadRequest,
    Forbidden,
    InternalError,
}

impl ApiStatus {
    pub fn code(&self) -> u16 {
        match self {
            ApiStatus::Ok => 200,
            ApiStatus::BadRequest => 400,
            ApiStatus::Forbidden => 403,
            ApiStatus::InternalError => 500,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ApiStatus::Ok)
    }
}

/// Transport-agnostic response: a status and a JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: ApiStatus,
    pub body: Value,
}

impl ApiResponse {
    pub fn ok(body: Value) -> Self {
        Self {
            status: ApiStatus::Ok,
            body,
        }
    }

    pub fn from_error(err: &TrackerError) -> Self {
        let status = match err.kind() {
            ErrorKind::InvalidInput | ErrorKind::Unrecognized | ErrorKind::NotFound => {
                ApiStatus::BadRequest
            }
            ErrorKind::Forbidden => ApiStatus::Forbidden,
            ErrorKind::Internal => ApiStatus::InternalError,
        };
        Self {
            status,
            body: json!({ "error": err.to_string() }),
        }
    }
}

/// Mutating commands accepted by `POST`.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    LoadNewSpool {
        capacity_g: f64,
        filament_type: String,
        color: String,
        manufacturer: String,
    },
    SaveProfile {
        name: String,
        profile: Profile,
    },
    DeleteProfile {
        name: String,
    },
    ApplyProfile {
        name: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandName {
    LoadNewSpool,
    SaveProfile,
    DeleteProfile,
    ApplyProfile,
}

impl CommandName {
    fn lookup(command: &str) -> Result<Self> {
        match command {
            "load_new_spool" => Ok(CommandName::LoadNewSpool),
            "save_profile" => Ok(CommandName::SaveProfile),
            "delete_profile" => Ok(CommandName::DeleteProfile),
            "apply_profile" => Ok(CommandName::ApplyProfile),
            other => Err(TrackerError::UnknownCommand {
                command: other.to_string(),
            }),
        }
    }
}

/// 網頁端會把欄位包在 `data` 之下；沒有時直接使用最外層
fn command_fields(data: &Value) -> &Value {
    match data.get("data") {
        Some(inner @ Value::Object(_)) => inner,
        _ => data,
    }
}

fn parse_name(fields: &Value) -> Result<String> {
    parse_text_field("name", fields.get("name"), "")
}

fn parse_template(fields: &Value) -> Result<(f64, String, String, String)> {
    Ok((
        parse_mass_field("spool_capacity_g", fields.get("spool_capacity_g"), 0.0)?,
        parse_text_field("filament_type", fields.get("filament_type"), DEFAULT_FILAMENT_TYPE)?,
        parse_text_field("color", fields.get("color"), DEFAULT_COLOR)?,
        parse_text_field("manufacturer", fields.get("manufacturer"), "")?,
    ))
}

impl Command {
    fn parse(name: CommandName, data: &Value) -> Result<Self> {
        let fields = command_fields(data);
        match name {
            CommandName::LoadNewSpool => {
                let (capacity_g, filament_type, color, manufacturer) = parse_template(fields)?;
                Ok(Command::LoadNewSpool {
                    capacity_g,
                    filament_type,
                    color,
                    manufacturer,
                })
            }
            CommandName::SaveProfile => {
                let name = parse_name(fields)?;
                let (spool_capacity_g, filament_type, color, manufacturer) =
                    parse_template(fields)?;
                Ok(Command::SaveProfile {
                    name,
                    profile: Profile {
                        spool_capacity_g,
                        filament_type,
                        color,
                        manufacturer,
                    },
                })
            }
            CommandName::DeleteProfile => Ok(Command::DeleteProfile {
                name: parse_name(fields)?,
            }),
            CommandName::ApplyProfile => Ok(Command::ApplyProfile {
                name: parse_name(fields)?,
            }),
        }
    }
}

impl AccountingService {
    /// `GET state`
    pub async fn handle_get(&self) -> ApiResponse {
        if !self.authorizer().can_read() {
            tracing::warn!("Rejected state read: missing read permission");
            return ApiResponse::from_error(&TrackerError::Forbidden {
                action: "read spool state".to_string(),
            });
        }

        match serde_json::to_value(self.state_view().await) {
            Ok(body) => ApiResponse::ok(body),
            Err(e) => ApiResponse::from_error(&TrackerError::SerializationError(e)),
        }
    }

    /// `POST <command>`; errors never escape, they become structured responses.
    pub async fn handle_command(&self, command: &str, data: &Value) -> ApiResponse {
        tracing::info!("Received API command: {}", command);
        tracing::debug!("Command data: {}", data);

        match self.dispatch(command, data).await {
            Ok(body) => ApiResponse::ok(body),
            Err(e) => {
                match e.kind() {
                    ErrorKind::Internal => tracing::error!("❌ Command {} failed: {}", command, e),
                    _ => tracing::warn!("Command {} rejected: {}", command, e),
                }
                ApiResponse::from_error(&e)
            }
        }
    }

    async fn dispatch(&self, command: &str, data: &Value) -> Result<Value> {
        let name = CommandName::lookup(command)?;

        // 權限檢查必須在任何變更之前
        if !self.authorizer().can_write() {
            return Err(TrackerError::Forbidden {
                action: command.to_string(),
            });
        }

        match Command::parse(name, data)? {
            Command::LoadNewSpool {
                capacity_g,
                filament_type,
                color,
                manufacturer,
            } => {
                self.load_new_spool(capacity_g, &filament_type, &color, &manufacturer)
                    .await?;
                Ok(json!({ "success": true }))
            }
            Command::SaveProfile { name, profile } => {
                let profiles = self.save_profile(&name, profile).await?;
                Ok(json!({ "success": true, "profiles": profiles }))
            }
            Command::DeleteProfile { name } => {
                let profiles = self.delete_profile(&name).await?;
                Ok(json!({ "success": true, "profiles": profiles }))
            }
            Command::ApplyProfile { name } => {
                let (name, profile) = self.apply_profile(&name).await?;
                Ok(json!({ "success": true, "name": name, "profile": profile }))
            }
        }
    }
}
