//! Configuration loader — merges defaults, config.toml, and env vars.

use common::config::BotConfig;
use common::Error;
use std::path::Path;

fn parse_bool(raw: &str) -> bool {
    let lowered = raw.trim().to_ascii_lowercase();
    lowered != "0" && lowered != "false" && lowered != "no" && lowered != "off"
}

fn validate_config(config: &BotConfig) -> Result<(), Error> {
    let mut issues: Vec<String> = Vec::new();

    if config.universe.is_empty() {
        issues.push("universe must contain at least one ticker".into());
    }
    for ticker in &config.universe {
        if ticker.symbol.trim().is_empty() {
            issues.push("universe entries must have a non-empty symbol".into());
        }
        if ticker.reference_spot <= 0.0 {
            issues.push(format!(
                "universe.{}: reference_spot must be > 0",
                ticker.symbol
            ));
        }
    }

    if config.lock.ttl_hours <= 0 {
        issues.push("lock.ttl_hours must be > 0".into());
    }
    if config.lock.score_jump_threshold < 0.0 {
        issues.push("lock.score_jump_threshold must be >= 0".into());
    }

    if config.leaderboard.per_ticker_top == 0 {
        issues.push("leaderboard.per_ticker_top must be > 0".into());
    }
    if config.leaderboard.global_top == 0 {
        issues.push("leaderboard.global_top must be > 0".into());
    }

    if config.timing.refresh_interval_secs == 0 {
        issues.push("timing.refresh_interval_secs must be > 0".into());
    }

    if config.provider.enabled {
        if config.provider.base_url.trim().is_empty() {
            issues.push("provider.base_url is required when provider.enabled=true".into());
        }
        if config.provider.requests_per_sec == 0 {
            issues.push("provider.requests_per_sec must be > 0".into());
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Invalid config:\n - {}",
            issues.join("\n - ")
        )))
    }
}

/// Load bot configuration from defaults, optional config file, and env.
pub fn load_config() -> Result<BotConfig, Error> {
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    let mut config = BotConfig::default();

    let config_path = Path::new("config.toml");
    if config_path.exists() {
        let contents = std::fs::read_to_string(config_path)
            .map_err(|e| Error::Config(format!("Failed to read config.toml: {}", e)))?;
        config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config.toml: {}", e)))?;
    }

    // Env overrides (highest priority).
    if let Ok(raw) = std::env::var("PROPHET_PROVIDER_ENABLED") {
        config.provider.enabled = parse_bool(&raw);
    }
    if let Ok(url) = std::env::var("PROPHET_PROVIDER_BASE_URL") {
        config.provider.base_url = url;
    }
    if let Ok(key) = std::env::var("PROPHET_PROVIDER_API_KEY") {
        config.provider.api_key = key;
    }
    if let Ok(dir) = std::env::var("PROPHET_LOCK_DIR") {
        let trimmed = dir.trim();
        if !trimmed.is_empty() {
            config.lock.persist_dir = Some(trimmed.to_string());
        }
    }

    validate_config(&config)?;
    Ok(config)
}
