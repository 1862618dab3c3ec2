use crate::core::service::AccountingService;
use crate::domain::model::HostEvent;
use crate::utils::error::Result;
use std::future::Future;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Counters for one run of the host event stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventStats {
    pub handled: usize,
    pub accounted: usize,
    pub skipped: usize,
}

impl AccountingService {
    /// 逐行讀取主機事件 (JSON lines)，直到 EOF 或 `shutdown` 完成
    ///
    /// Lines that are not valid UTF-8 or not a valid `HostEvent` are logged and
    /// skipped. An event already read is always handled to completion, even if
    /// `shutdown` fires meanwhile.
    pub async fn consume_host_events<R, F>(&self, mut reader: R, shutdown: F) -> Result<EventStats>
    where
        R: AsyncBufRead + Unpin,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut stats = EventStats::default();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let read = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!("Interrupted, shutting down");
                    break;
                }
                read = reader.read_until(b'\n', &mut buf) => read?,
            };
            if read == 0 {
                break;
            }

            let line = String::from_utf8_lossy(&buf);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match serde_json::from_str::<HostEvent>(line) {
                Ok(event) => {
                    stats.handled += 1;
                    if self.handle_host_event(&event).await.is_some() {
                        stats.accounted += 1;
                    }
                }
                Err(e) => {
                    tracing::warn!("⚠️ Skipping malformed host event: {}", e);
                    stats.skipped += 1;
                }
            }
        }

        tracing::debug!(
            "Host event stream closed: {} handled, {} accounted, {} skipped",
            stats.handled,
            stats.accounted,
            stats.skipped
        );
        Ok(stats)
    }
}
