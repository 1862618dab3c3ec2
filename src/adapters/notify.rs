use crate::domain::model::StateChange;
use crate::domain::ports::NotificationSink;
use serde_json::json;
use std::io::Write;
use tokio::sync::mpsc;

pub const PLUGIN_IDENTIFIER: &str = "spooltracker";

/// Logs every state change.
#[derive(Debug, Default, Clone)]
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn publish(&self, change: &StateChange) {
        tracing::info!("📣 Spool update: {:.2}g remaining", change.remaining_g());
    }
}

/// Writes one JSON envelope per state change to stdout.
#[derive(Debug, Default, Clone)]
pub struct JsonLinesSink;

impl NotificationSink for JsonLinesSink {
    fn publish(&self, change: &StateChange) {
        let envelope = json!({
            "plugin": PLUGIN_IDENTIFIER,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "data": change,
        });

        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", envelope) {
            tracing::debug!("Dropped spool update notification: {}", e);
        }
    }
}

/// Forwards state changes to an async receiver. A closed receiver is ignored.
#[derive(Debug, Clone)]
pub struct ChannelNotificationSink {
    tx: mpsc::UnboundedSender<StateChange>,
}

impl ChannelNotificationSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StateChange>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelNotificationSink {
    fn publish(&self, change: &StateChange) {
        if self.tx.send(change.clone()).is_err() {
            tracing::debug!("No observers for spool update");
        }
    }
}
