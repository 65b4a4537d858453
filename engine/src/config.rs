//! Configuration management for the auction engine.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Bidding engine tuning
    pub engine: EngineSettings,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Metrics server host (for Prometheus scraping)
    pub metrics_host: String,
    /// Metrics server port
    pub metrics_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout: u64,
}

/// Bidding engine tuning knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Bidding window applied when a listing doesn't specify one, in seconds
    pub default_auction_duration_secs: i64,
    /// Anti-snipe grace window in seconds: a bid landing this close to the
    /// deadline pushes the deadline out by the same amount
    pub grace_window_secs: i64,
    /// Bounded CAS attempt budget per bid submission
    pub bid_attempt_budget: u32,
    /// Settlement delivery attempts before deferring to the dead letter queue
    pub settlement_max_attempts: u32,
    /// Initial settlement retry backoff in milliseconds
    pub settlement_initial_backoff_ms: u64,
    /// Cap on the settlement retry backoff in seconds
    pub settlement_max_backoff_secs: u64,
    /// Dead letter queue capacity for deferred settlements
    pub dlq_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(8080),
                log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
                metrics_host: env::var("METRICS_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                metrics_port: env::var("METRICS_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(9090),
                shutdown_timeout: env::var("SHUTDOWN_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            },
            engine: EngineSettings {
                default_auction_duration_secs: env::var("AUCTION_DEFAULT_DURATION_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(86_400), // 24 hours
                grace_window_secs: env::var("AUCTION_GRACE_WINDOW_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
                bid_attempt_budget: env::var("BID_ATTEMPT_BUDGET")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3),
                settlement_max_attempts: env::var("SETTLEMENT_MAX_ATTEMPTS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
                settlement_initial_backoff_ms: env::var("SETTLEMENT_INITIAL_BACKOFF_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1000),
                settlement_max_backoff_secs: env::var("SETTLEMENT_MAX_BACKOFF_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(32),
                dlq_capacity: env::var("SETTLEMENT_DLQ_CAPACITY")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1000),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible_without_env() {
        let config = Config::from_env();

        assert!(config.engine.default_auction_duration_secs > 0);
        assert!(config.engine.grace_window_secs > 0);
        assert!(config.engine.bid_attempt_budget >= 1);
        assert!(config.engine.settlement_max_attempts >= 1);
    }
}
