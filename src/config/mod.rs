use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;
use crate::search::{SearchConfig, Strategy};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub langbase: LangbaseConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub request: RequestConfig,
    pub pipes: PipeConfig,
    pub search: SearchConfig,
    pub resilience: ResilienceConfig,
}

/// Langbase API configuration
#[derive(Debug, Clone)]
pub struct LangbaseConfig {
    pub api_key: String,
    pub base_url: String,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Per-call request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// Upper bound for a single oracle round trip.
    pub timeout_ms: u64,
}

/// Langbase pipe names used by the reasoning oracle
#[derive(Debug, Clone)]
pub struct PipeConfig {
    pub generate: String,
    pub evaluate: String,
    pub aggregate: String,
}

/// Circuit breaker and generation retry settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ResilienceConfig {
    /// Consecutive failures before the breaker opens.
    pub failure_threshold: u32,
    /// How long the breaker stays open once tripped.
    pub cooldown_ms: u64,
    /// Additional attempts after a transient generation failure.
    pub max_retries: u32,
    /// Backoff before each retry; the last entry is reused if retries outnumber it.
    pub retry_delays_ms: Vec<u64>,
}

impl ResilienceConfig {
    /// Cooldown as a [`Duration`].
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// Backoff before the given retry (1-based).
    pub fn retry_delay(&self, retry: u32) -> Duration {
        let index = (retry.saturating_sub(1) as usize).min(self.retry_delays_ms.len().saturating_sub(1));
        Duration::from_millis(self.retry_delays_ms.get(index).copied().unwrap_or(0))
    }
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown_ms: 30_000,
            max_retries: 2,
            retry_delays_ms: vec![700, 1500],
        }
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self { timeout_ms: 30000 }
    }
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            generate: "got-generate-v1".to_string(),
            evaluate: "got-evaluate-v1".to_string(),
            aggregate: "got-aggregate-v1".to_string(),
        }
    }
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let langbase = LangbaseConfig {
            api_key: env::var("LANGBASE_API_KEY").map_err(|_| AppError::Config {
                message: "LANGBASE_API_KEY is required".to_string(),
            })?,
            base_url: env::var("LANGBASE_BASE_URL")
                .unwrap_or_else(|_| "https://api.langbase.com".to_string()),
        };

        let database = DatabaseConfig {
            path: PathBuf::from(
                env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/got-runs.db".to_string()),
            ),
            max_connections: parsed_var("DATABASE_MAX_CONNECTIONS").unwrap_or(5),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let request = RequestConfig {
            timeout_ms: parsed_var("REQUEST_TIMEOUT_MS").unwrap_or(30000),
        };

        let default_pipes = PipeConfig::default();
        let pipes = PipeConfig {
            generate: env::var("PIPE_GOT_GENERATE").unwrap_or(default_pipes.generate),
            evaluate: env::var("PIPE_GOT_EVALUATE").unwrap_or(default_pipes.evaluate),
            aggregate: env::var("PIPE_GOT_AGGREGATE").unwrap_or(default_pipes.aggregate),
        };

        let search = Self::search_from_env()?;

        let default_resilience = ResilienceConfig::default();
        let resilience = ResilienceConfig {
            failure_threshold: parsed_var("CIRCUIT_FAILURE_THRESHOLD")
                .unwrap_or(default_resilience.failure_threshold),
            cooldown_ms: parsed_var("CIRCUIT_COOLDOWN_MS")
                .unwrap_or(default_resilience.cooldown_ms),
            max_retries: parsed_var("GENERATION_MAX_RETRIES")
                .unwrap_or(default_resilience.max_retries),
            retry_delays_ms: env::var("GENERATION_RETRY_DELAYS_MS")
                .ok()
                .and_then(|s| {
                    s.split(',')
                        .map(|part| part.trim().parse::<u64>())
                        .collect::<Result<Vec<_>, _>>()
                        .ok()
                })
                .filter(|delays| !delays.is_empty())
                .unwrap_or(default_resilience.retry_delays_ms),
        };

        Ok(Config {
            langbase,
            database,
            logging,
            request,
            pipes,
            search,
            resilience,
        })
    }

    /// Search defaults; an unknown strategy or an out-of-range value is a hard error.
    fn search_from_env() -> Result<SearchConfig, AppError> {
        let defaults = SearchConfig::default();

        let strategy = match env::var("GOT_STRATEGY") {
            Ok(name) => name
                .parse::<Strategy>()
                .map_err(|message| AppError::Config { message })?,
            Err(_) => defaults.strategy,
        };

        let search = SearchConfig {
            strategy,
            max_depth: parsed_var("GOT_MAX_DEPTH").unwrap_or(defaults.max_depth),
            branching_factor: parsed_var("GOT_BRANCHING_FACTOR")
                .unwrap_or(defaults.branching_factor),
            prune_threshold: parsed_var("GOT_PRUNE_THRESHOLD").unwrap_or(defaults.prune_threshold),
            max_thoughts: parsed_var("GOT_MAX_THOUGHTS").unwrap_or(defaults.max_thoughts),
            enable_aggregation: env::var("GOT_ENABLE_AGGREGATION")
                .map(|v| !matches!(v.to_lowercase().as_str(), "false" | "0" | "no"))
                .unwrap_or(defaults.enable_aggregation),
        };

        search.validate()?;
        Ok(search)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resilience_defaults() {
        let config = ResilienceConfig::default();
        assert_eq!(config.failure_threshold, 3);
        assert_eq!(config.cooldown(), Duration::from_secs(30));
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn test_retry_delay_escalates_and_saturates() {
        let config = ResilienceConfig::default();
        assert_eq!(config.retry_delay(1), Duration::from_millis(700));
        assert_eq!(config.retry_delay(2), Duration::from_millis(1500));
        assert_eq!(config.retry_delay(5), Duration::from_millis(1500));
    }

    #[test]
    fn test_retry_delay_without_schedule_is_zero() {
        let config = ResilienceConfig {
            retry_delays_ms: vec![],
            ..Default::default()
        };
        assert_eq!(config.retry_delay(1), Duration::ZERO);
    }
}
