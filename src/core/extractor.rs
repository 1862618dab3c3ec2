use crate::utils::error::{Result, TrackerError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::SeekFrom;
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Slicers append the usage annotation near the end of the file.
pub const DEFAULT_TAIL_WINDOW: u64 = 32 * 1024;

static FILAMENT_USED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r";\s*filament used \[g\]\s*=\s*([0-9.]+)").expect("valid usage pattern")
});

/// Outcome of a usage lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UsageLookup {
    Found(f64),
    NotFound,
}

impl UsageLookup {
    pub fn grams(&self) -> Option<f64> {
        match self {
            UsageLookup::Found(g) => Some(*g),
            UsageLookup::NotFound => None,
        }
    }
}

/// Recovers the consumed mass of a job from its instruction file.
#[derive(Debug, Clone)]
pub struct UsageExtractor {
    window: u64,
}

impl Default for UsageExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_TAIL_WINDOW)
    }
}

impl UsageExtractor {
    pub fn new(window: u64) -> Self {
        Self {
            window: window.max(1),
        }
    }

    pub fn window(&self) -> u64 {
        self.window
    }

    /// 讀取檔案尾端並解析耗材用量；任何錯誤都轉為 `NotFound`
    pub async fn extract(&self, path: &Path) -> UsageLookup {
        match self.try_extract(path).await {
            Ok(Some(grams)) => {
                tracing::info!("Found filament usage: {}g", grams);
                UsageLookup::Found(grams)
            }
            Ok(None) => {
                tracing::warn!("No filament usage found in G-code file {}", path.display());
                UsageLookup::NotFound
            }
            Err(TrackerError::FileMissing { path }) => {
                tracing::error!("G-code file not found: {}", path);
                UsageLookup::NotFound
            }
            Err(e) => {
                tracing::error!(
                    "Error reading filament usage from {}: {}",
                    path.display(),
                    e
                );
                UsageLookup::NotFound
            }
        }
    }

    async fn try_extract(&self, path: &Path) -> Result<Option<f64>> {
        tracing::info!("Reading G-code file: {}", path.display());

        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(TrackerError::FileMissing {
                path: path.display().to_string(),
            });
        }

        let content = self.read_tail(path).await?;
        tracing::debug!("Read {} bytes from file", content.len());

        Ok(parse_filament_used(&content))
    }

    /// 只讀取最後 `window` 個位元組，避免載入整個大檔
    async fn read_tail(&self, path: &Path) -> Result<String> {
        let mut file = tokio::fs::File::open(path).await?;
        let file_size = file.metadata().await?.len();
        let read_size = self.window.min(file_size);
        let start_pos = file_size - read_size;

        file.seek(SeekFrom::Start(start_pos)).await?;

        let mut buf = Vec::with_capacity(read_size as usize);
        file.take(read_size).read_to_end(&mut buf).await?;

        // 視窗可能切在多位元組字元中間
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// First `; filament used [g] = N` annotation in `text`, scanning forward.
pub fn parse_filament_used(text: &str) -> Option<f64> {
    let caps = FILAMENT_USED_RE.captures(text)?;
    let raw = caps.get(1)?.as_str();
    match raw.parse::<f64>() {
        Ok(grams) => Some(grams),
        Err(_) => {
            tracing::warn!("Malformed filament usage value: {}", raw);
            None
        }
    }
}
