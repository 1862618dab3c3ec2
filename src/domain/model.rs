use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_FILAMENT_TYPE: &str = "PLA";
pub const DEFAULT_COLOR: &str = "#000000";

/// 常見耗材種類；其他名稱仍以自由文字接受
pub const KNOWN_MATERIALS: &[&str] = &["PLA", "ABS", "PETG", "TPU", "Nylon", "PC", "PVA", "HIPS"];

pub fn is_known_material(name: &str) -> bool {
    KNOWN_MATERIALS.iter().any(|m| m.eq_ignore_ascii_case(name))
}

/// The single active spool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpoolState {
    pub capacity_g: f64,
    pub remaining_g: f64,
    pub filament_type: String,
    pub color: String,
    pub manufacturer: String,
}

impl Default for SpoolState {
    fn default() -> Self {
        Self {
            capacity_g: 0.0,
            remaining_g: 0.0,
            filament_type: DEFAULT_FILAMENT_TYPE.to_string(),
            color: DEFAULT_COLOR.to_string(),
            manufacturer: String::new(),
        }
    }
}

/// Reusable spool template. Never carries a remaining mass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub spool_capacity_g: f64,
    pub filament_type: String,
    pub color: String,
    pub manufacturer: String,
}

pub type ProfileMap = BTreeMap<String, Profile>;

/// Read-only projection returned by `GET state`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpoolSnapshot {
    pub remaining_g: f64,
    pub spool_capacity_g: f64,
    pub filament_type: String,
    pub color: String,
    pub manufacturer: String,
}

/// 持久化設定樹，鍵名與外部設定儲存一致
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedSettings {
    pub spool_capacity_g: f64,
    pub remaining_g: f64,
    pub filament_type: String,
    pub color: String,
    pub manufacturer: String,
    pub profiles: ProfileMap,
}

impl Default for PersistedSettings {
    fn default() -> Self {
        Self::from_parts(&SpoolState::default(), &ProfileMap::new())
    }
}

impl PersistedSettings {
    pub fn from_parts(spool: &SpoolState, profiles: &ProfileMap) -> Self {
        Self {
            spool_capacity_g: spool.capacity_g,
            remaining_g: spool.remaining_g,
            filament_type: spool.filament_type.clone(),
            color: spool.color.clone(),
            manufacturer: spool.manufacturer.clone(),
            profiles: profiles.clone(),
        }
    }

    /// 拆回記憶體中的狀態；負數的剩餘量在載入時歸零
    pub fn into_parts(self) -> (SpoolState, ProfileMap) {
        let spool = SpoolState {
            capacity_g: self.spool_capacity_g.max(0.0),
            remaining_g: self.remaining_g.max(0.0),
            filament_type: self.filament_type,
            color: self.color,
            manufacturer: self.manufacturer,
        };
        (spool, self.profiles)
    }
}

/// Broadcast payloads emitted after a mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StateChange {
    Consumed {
        remaining_g: f64,
        color: String,
        manufacturer: String,
    },
    SpoolLoaded {
        remaining_g: f64,
        spool_capacity_g: f64,
        filament_type: String,
        color: String,
        manufacturer: String,
    },
}

impl StateChange {
    pub fn remaining_g(&self) -> f64 {
        match self {
            StateChange::Consumed { remaining_g, .. } => *remaining_g,
            StateChange::SpoolLoaded { remaining_g, .. } => *remaining_g,
        }
    }
}

/// Payload of a job-completion notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCompletion {
    pub origin: String,
    pub path: String,
}

/// 主機事件串流的一行
#[derive(Debug, Clone, Deserialize)]
pub struct HostEvent {
    pub event: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl HostEvent {
    pub const PRINT_DONE: &'static str = "PrintDone";

    pub fn is_print_done(&self) -> bool {
        self.event == Self::PRINT_DONE
    }
}
