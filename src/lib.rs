pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliCommand, CliConfig};
pub use config::TrackerConfig;

pub use core::{
    commands::{ApiResponse, ApiStatus},
    events::EventStats,
    extractor::{UsageExtractor, UsageLookup},
    service::{AccountingService, StateView},
};
pub use domain::model::{HostEvent, JobCompletion, Profile, SpoolSnapshot, StateChange};
pub use utils::error::{Result, TrackerError};
