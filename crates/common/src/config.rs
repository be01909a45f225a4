//! Bot configuration types.

use serde::{Deserialize, Serialize};

/// Top-level bot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Tickers to scan for the leaderboard.
    #[serde(default = "default_universe")]
    pub universe: Vec<TickerConfig>,

    /// Live market-data provider settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Stability-lock parameters.
    #[serde(default)]
    pub lock: LockConfig,

    /// Leaderboard shape.
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,

    /// Timing parameters (seconds).
    #[serde(default)]
    pub timing: TimingConfig,
}

/// One ticker in the scan universe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerConfig {
    /// Underlying symbol, e.g. "SPY".
    pub symbol: String,
    /// Spot used when no live quote is available.
    pub reference_spot: f64,
}

/// Live options-data provider. Disabled by default — the engine runs fully
/// simulated without it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Base URL of the stats endpoint.
    #[serde(default)]
    pub base_url: String,

    /// API key (usually set via PROPHET_PROVIDER_API_KEY).
    #[serde(default)]
    pub api_key: String,

    /// Request budget per second.
    #[serde(default = "default_requests_per_sec")]
    pub requests_per_sec: u32,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_provider_timeout_ms")]
    pub timeout_ms: u64,
}

/// Stability-lock tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// Lock time-to-live in hours.
    #[serde(default = "default_lock_ttl_hours")]
    pub ttl_hours: i64,

    /// Minimum top-score improvement that justifies replacing a live lock.
    #[serde(default = "default_score_jump")]
    pub score_jump_threshold: f64,

    /// Directory for persisted lock records. In-memory store when unset.
    #[serde(default)]
    pub persist_dir: Option<String>,
}

/// Leaderboard shape parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    /// How many trades each ticker may contribute.
    #[serde(default = "default_per_ticker_top")]
    pub per_ticker_top: usize,

    /// Global leaderboard length.
    #[serde(default = "default_global_top")]
    pub global_top: usize,
}

/// Timing configuration (all values in seconds).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Leaderboard refresh interval.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
}

// ── Defaults ──────────────────────────────────────────────────────────

fn default_universe() -> Vec<TickerConfig> {
    [
        ("SPY", 595.0),
        ("QQQ", 520.0),
        ("IWM", 240.0),
        ("AAPL", 235.0),
        ("MSFT", 430.0),
        ("NVDA", 145.0),
        ("AMZN", 230.0),
        ("TSLA", 350.0),
    ]
    .into_iter()
    .map(|(symbol, reference_spot)| TickerConfig {
        symbol: symbol.to_string(),
        reference_spot,
    })
    .collect()
}

fn default_requests_per_sec() -> u32 {
    5
}
fn default_provider_timeout_ms() -> u64 {
    5000
}
fn default_lock_ttl_hours() -> i64 {
    24
}
fn default_score_jump() -> f64 {
    8.0
}
fn default_per_ticker_top() -> usize {
    3
}
fn default_global_top() -> usize {
    10
}
fn default_refresh_interval() -> u64 {
    60
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            universe: default_universe(),
            provider: ProviderConfig::default(),
            lock: LockConfig::default(),
            leaderboard: LeaderboardConfig::default(),
            timing: TimingConfig::default(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: String::new(),
            api_key: String::new(),
            requests_per_sec: default_requests_per_sec(),
            timeout_ms: default_provider_timeout_ms(),
        }
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            ttl_hours: default_lock_ttl_hours(),
            score_jump_threshold: default_score_jump(),
            persist_dir: None,
        }
    }
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            per_ticker_top: default_per_ticker_top(),
            global_top: default_global_top(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config: BotConfig = toml::from_str("").unwrap();
        assert_eq!(config.universe.len(), 8);
        assert_eq!(config.lock.ttl_hours, 24);
        assert_eq!(config.lock.score_jump_threshold, 8.0);
        assert_eq!(config.leaderboard.per_ticker_top, 3);
        assert_eq!(config.leaderboard.global_top, 10);
        assert_eq!(config.timing.refresh_interval_secs, 60);
        assert!(!config.provider.enabled);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let raw = r#"
            [[universe]]
            symbol = "SPY"
            reference_spot = 600.0

            [lock]
            ttl_hours = 12
        "#;
        let config: BotConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.universe.len(), 1);
        assert_eq!(config.universe[0].symbol, "SPY");
        assert_eq!(config.lock.ttl_hours, 12);
        // Untouched sections keep their defaults.
        assert_eq!(config.lock.score_jump_threshold, 8.0);
        assert_eq!(config.leaderboard.global_top, 10);
    }
}
