// Adapters layer: concrete implementations of the domain ports (settings file, uploads dir, sinks, access).

pub mod auth;
pub mod files;
pub mod notify;
pub mod settings;

pub use auth::StaticAuthorizer;
pub use files::LocalFileResolver;
pub use notify::{ChannelNotificationSink, JsonLinesSink, LogNotificationSink};
pub use settings::{MemorySettingsStore, TomlSettingsStore};
