use crate::utils::error::{Result, TrackerError};
use serde_json::Value;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(TrackerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(TrackerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(TrackerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

pub fn validate_one_of(field_name: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if !allowed.contains(&value) {
        return Err(TrackerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Valid values: {}", allowed.join(", ")),
        });
    }
    Ok(())
}

/// 去除前後空白後的名稱，空字串視為錯誤
pub fn validate_profile_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(TrackerError::EmptyName);
    }
    Ok(trimmed.to_string())
}

/// 讀取質量欄位：接受 JSON 數字或數字字串，缺少時回傳預設值
pub fn parse_mass_field(field_name: &str, value: Option<&Value>, default: f64) -> Result<f64> {
    let parsed = match value {
        None | Some(Value::Null) => default,
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| TrackerError::invalid_field(field_name, "not a representable number"))?,
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| {
            TrackerError::invalid_field(field_name, format!("'{}' is not a number", s))
        })?,
        Some(other) => {
            return Err(TrackerError::invalid_field(
                field_name,
                format!("expected a number, got {}", other),
            ))
        }
    };

    if !parsed.is_finite() {
        return Err(TrackerError::invalid_field(field_name, "must be a finite number"));
    }
    Ok(parsed)
}

/// 讀取字串欄位：缺少時回傳預設值，非字串視為格式錯誤
pub fn parse_text_field(field_name: &str, value: Option<&Value>, default: &str) -> Result<String> {
    match value {
        None | Some(Value::Null) => Ok(default.to_string()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(TrackerError::invalid_field(
            field_name,
            format!("expected a string, got {}", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("settings_path", "./settings.toml").is_ok());
        assert!(validate_path("settings_path", "").is_err());
        assert!(validate_path("settings_path", "bad\0path").is_err());
    }

    #[test]
    fn test_validate_profile_name_trims() {
        assert_eq!(validate_profile_name("  Prusa PLA ").unwrap(), "Prusa PLA");
        assert!(matches!(
            validate_profile_name("   "),
            Err(TrackerError::EmptyName)
        ));
    }

    #[test]
    fn test_parse_mass_field() {
        assert_eq!(parse_mass_field("c", Some(&json!(1000)), 0.0).unwrap(), 1000.0);
        assert_eq!(parse_mass_field("c", Some(&json!("750.5")), 0.0).unwrap(), 750.5);
        assert_eq!(parse_mass_field("c", None, 0.0).unwrap(), 0.0);
        assert!(parse_mass_field("c", Some(&json!("heavy")), 0.0).is_err());
        assert!(parse_mass_field("c", Some(&json!([1])), 0.0).is_err());
        assert!(parse_mass_field("c", Some(&json!("inf")), 0.0).is_err());
    }

    #[test]
    fn test_parse_text_field() {
        assert_eq!(parse_text_field("color", None, "#000000").unwrap(), "#000000");
        assert_eq!(
            parse_text_field("color", Some(&json!("#ff0000")), "#000000").unwrap(),
            "#ff0000"
        );
        assert!(parse_text_field("color", Some(&json!(12)), "#000000").is_err());
    }
}
