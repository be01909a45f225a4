//! Unified error type for the prophet engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Live market-data fetch failed. Absorbed at the snapshot boundary —
    /// callers fall back to the simulated snapshot instead of surfacing this.
    #[error("market data unavailable: {0}")]
    DataUnavailable(String),

    #[error("invalid spot price: {0}")]
    InvalidSpot(f64),

    #[error("config error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rate limited — retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("lock store error: {0}")]
    LockStore(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
