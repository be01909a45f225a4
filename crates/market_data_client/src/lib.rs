//! Live options market-data client.
//!
//! Fetches per-ticker volatility statistics from a REST provider and maps
//! them to partial overrides for the snapshot generator. Every failure is
//! surfaced as an error here; the scanner absorbs it and falls back to the
//! fully simulated snapshot.

pub mod rate_limit;

use async_trait::async_trait;
use common::config::ProviderConfig;
use common::{Error, Result};
use serde::Deserialize;
use tracing::debug;

pub use rate_limit::RateLimiter;

/// Partial live overrides for a synthesized snapshot. Absent fields keep
/// their simulated values — this is a merge, not a replacement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveVolStats {
    pub spot_price: Option<f64>,
    /// ATM implied volatility, percent.
    pub implied_volatility: Option<f64>,
    /// 0–100.
    pub iv_percentile: Option<f64>,
    /// Percent.
    pub realized_volatility: Option<f64>,
    /// 0–100.
    pub rsi: Option<f64>,
}

/// Outbound market-data collaborator. Object-safe so the scanner can hold
/// an optional trait object and tests can inject stubs.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch(&self, ticker: &str) -> Result<LiveVolStats>;
}

// ── REST provider ─────────────────────────────────────────────────────

/// Wire shape of the provider's `/stats/{ticker}` response.
#[derive(Debug, Deserialize)]
struct StatsResponse {
    #[serde(default)]
    spot: Option<f64>,
    #[serde(default)]
    iv: Option<f64>,
    #[serde(default)]
    iv_percentile: Option<f64>,
    #[serde(default)]
    hv: Option<f64>,
    #[serde(default)]
    rsi: Option<f64>,
}

impl From<StatsResponse> for LiveVolStats {
    fn from(raw: StatsResponse) -> Self {
        LiveVolStats {
            spot_price: raw.spot.filter(|v| *v > 0.0),
            implied_volatility: raw.iv.filter(|v| *v >= 0.0),
            iv_percentile: raw.iv_percentile.map(|v| v.clamp(0.0, 100.0)),
            realized_volatility: raw.hv.filter(|v| *v >= 0.0),
            rsi: raw.rsi.map(|v| v.clamp(0.0, 100.0)),
        }
    }
}

/// HTTP client for the options-stats provider, with connection pooling and
/// a read rate limit.
#[derive(Debug, Clone)]
pub struct OptionsDataClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    limiter: RateLimiter,
}

impl OptionsDataClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(Error::Config(
                "provider.base_url is required when provider.enabled=true".into(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.timeout_ms))
            .user_agent("prophet-bot/0.1")
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            limiter: RateLimiter::new(config.requests_per_sec.max(1)),
        })
    }
}

#[async_trait]
impl MarketDataProvider for OptionsDataClient {
    async fn fetch(&self, ticker: &str) -> Result<LiveVolStats> {
        self.limiter.wait().await;

        let url = format!("{}/stats/{}", self.base_url, ticker);
        let mut request = self.client.get(&url);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(Error::RateLimited {
                retry_after_ms: 1000,
            });
        }
        if !status.is_success() {
            return Err(Error::DataUnavailable(format!(
                "{} returned status {}",
                url,
                status.as_u16()
            )));
        }

        let raw: StatsResponse = response
            .json()
            .await
            .map_err(|e| Error::DataUnavailable(e.to_string()))?;

        debug!("{}: live stats {:?}", ticker, raw);
        Ok(raw.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_response_maps_to_partial_overrides() {
        let raw: StatsResponse =
            serde_json::from_str(r#"{"spot": 594.8, "iv": 41.2, "rsi": 55.0}"#).unwrap();
        let stats: LiveVolStats = raw.into();
        assert_eq!(stats.spot_price, Some(594.8));
        assert_eq!(stats.implied_volatility, Some(41.2));
        assert_eq!(stats.rsi, Some(55.0));
        // Fields the provider did not send stay absent.
        assert_eq!(stats.iv_percentile, None);
        assert_eq!(stats.realized_volatility, None);
    }

    #[test]
    fn out_of_range_values_are_sanitized() {
        let raw: StatsResponse =
            serde_json::from_str(r#"{"spot": -1.0, "iv_percentile": 140.0, "rsi": -3.0}"#).unwrap();
        let stats: LiveVolStats = raw.into();
        assert_eq!(stats.spot_price, None);
        assert_eq!(stats.iv_percentile, Some(100.0));
        assert_eq!(stats.rsi, Some(0.0));
    }

    #[test]
    fn client_requires_base_url() {
        let config = ProviderConfig {
            enabled: true,
            ..ProviderConfig::default()
        };
        assert!(matches!(
            OptionsDataClient::new(&config),
            Err(Error::Config(_))
        ));
    }
}
