pub mod commands;
pub mod events;
pub mod extractor;
pub mod profiles;
pub mod service;
pub mod spool;

pub use crate::domain::model::{JobCompletion, Profile, ProfileMap, SpoolSnapshot, SpoolState};
pub use crate::domain::ports::{Authorizer, FileResolver, NotificationSink, SettingsStore};
pub use crate::utils::error::Result;
