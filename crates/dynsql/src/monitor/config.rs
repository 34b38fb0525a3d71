use serde::{Deserialize, Deserializer};
use std::time::Duration;
use tracing::Level;

/// Configuration for [`InstrumentedExecutor`](super::InstrumentedExecutor).
///
/// Deserializes from e.g.
///
/// ```toml
/// slow_query_threshold_ms = 250
/// max_sql_length = 120
/// level = "info"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Statements at or above this duration are logged at WARN. `None` disables the check.
    #[serde(rename = "slow_query_threshold_ms", deserialize_with = "millis")]
    pub slow_query_threshold: Option<Duration>,
    /// Truncate logged SQL (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
    /// Level of the per-statement event.
    #[serde(deserialize_with = "level")]
    pub level: Level,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            slow_query_threshold: None,
            max_sql_length: Some(200),
            level: Level::DEBUG,
        }
    }
}

impl MonitorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }

    pub fn with_max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Log full SQL text.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }
}

fn millis<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
    Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
}

fn level<'de, D: Deserializer<'de>>(d: D) -> Result<Level, D::Error> {
    String::deserialize(d)?
        .parse()
        .map_err(serde::de::Error::custom)
}
