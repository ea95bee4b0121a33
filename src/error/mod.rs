use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Langbase error: {0}")]
    Langbase(#[from] LangbaseError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database connection failed: {message}")]
    Connection { message: String },

    #[error("Query failed: {message}")]
    Query { message: String },

    #[error("Run not found: {run_id}")]
    RunNotFound { run_id: String },

    #[error("Migration failed: {message}")]
    Migration { message: String },

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Thought graph integrity errors
#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Thought {thought_id} references missing parent {parent_id}")]
    DanglingParent { thought_id: String, parent_id: String },

    #[error("Thought already present: {thought_id}")]
    DuplicateThought { thought_id: String },

    #[error("Thought not found: {thought_id}")]
    ThoughtNotFound { thought_id: String },
}

/// Langbase API errors
#[derive(Debug, Error)]
pub enum LangbaseError {
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Errors raised by a reasoning oracle call
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Oracle unavailable: {message}")]
    Unavailable { message: String },

    #[error("Oracle call timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Malformed oracle response: {message}")]
    InvalidResponse { message: String },

    #[error("Circuit open: oracle calls suspended for {remaining_ms}ms")]
    CircuitOpen { remaining_ms: u64 },

    #[error("Langbase error: {0}")]
    Langbase(#[from] LangbaseError),
}

/// Keywords that mark an oracle failure as worth retrying.
const TRANSIENT_MARKERS: &[&str] = &[
    "timeout",
    "timed out",
    "connection reset",
    "rate limit",
    "429",
    "temporarily unavailable",
];

fn has_transient_marker(message: &str) -> bool {
    let message = message.to_lowercase();
    TRANSIENT_MARKERS.iter().any(|marker| message.contains(marker))
}

impl OracleError {
    /// Whether the failure is transient (network, timeout or rate-limit class).
    ///
    /// Keywords are matched against every level of the `source()` chain;
    /// transport errors keep the socket cause below a generic message.
    pub fn is_transient(&self) -> bool {
        match self {
            OracleError::Timeout { .. } => true,
            OracleError::CircuitOpen { .. } => false,
            OracleError::Langbase(LangbaseError::Http(e)) if e.is_connect() || e.is_timeout() => {
                true
            }
            other => {
                let mut current: Option<&(dyn std::error::Error + 'static)> = Some(other);
                while let Some(err) = current {
                    if has_transient_marker(&err.to_string()) {
                        return true;
                    }
                    current = err.source();
                }
                false
            }
        }
    }
}

/// Tool-specific errors with structured details
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Validation failed: {field} - {reason}")]
    Validation { field: String, reason: String },
}

impl From<ToolError> for AppError {
    fn from(err: ToolError) -> Self {
        AppError::Config {
            message: err.to_string(),
        }
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for Langbase operations
pub type LangbaseResult<T> = Result<T, LangbaseError>;

/// Result type alias for graph mutations
pub type GraphResult<T> = Result<T, GraphError>;

/// Result type alias for oracle calls
pub type OracleResult<T> = Result<T, OracleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Config {
            message: "missing key".to_string(),
        };
        assert_eq!(err.to_string(), "Configuration error: missing key");

        let err = AppError::Internal {
            message: "unexpected".to_string(),
        };
        assert_eq!(err.to_string(), "Internal error: unexpected");
    }

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::Connection {
            message: "failed to connect".to_string(),
        };
        assert_eq!(err.to_string(), "Database connection failed: failed to connect");

        let err = StorageError::RunNotFound {
            run_id: "run-123".to_string(),
        };
        assert_eq!(err.to_string(), "Run not found: run-123");

        let err = StorageError::Migration {
            message: "version mismatch".to_string(),
        };
        assert_eq!(err.to_string(), "Migration failed: version mismatch");
    }

    #[test]
    fn test_graph_error_display() {
        let err = GraphError::DanglingParent {
            thought_id: "t-2".to_string(),
            parent_id: "t-1".to_string(),
        };
        assert_eq!(err.to_string(), "Thought t-2 references missing parent t-1");
    }

    #[test]
    fn test_langbase_error_display() {
        let err = LangbaseError::Api {
            status: 401,
            message: "unauthorized".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 401 - unauthorized");

        let err = LangbaseError::Timeout { timeout_ms: 5000 };
        assert_eq!(err.to_string(), "Request timeout after 5000ms");
    }

    #[test]
    fn test_oracle_error_transient_keywords() {
        let transient = [
            OracleError::Unavailable {
                message: "Connection reset by peer".to_string(),
            },
            OracleError::Unavailable {
                message: "Rate limit exceeded".to_string(),
            },
            OracleError::Unavailable {
                message: "service temporarily unavailable".to_string(),
            },
            OracleError::Langbase(LangbaseError::Api {
                status: 429,
                message: "slow down".to_string(),
            }),
            OracleError::Langbase(LangbaseError::Timeout { timeout_ms: 100 }),
            OracleError::Timeout { timeout_ms: 100 },
        ];
        for err in &transient {
            assert!(err.is_transient(), "expected transient: {}", err);
        }
    }

    #[test]
    fn test_oracle_error_non_transient() {
        let permanent = [
            OracleError::Langbase(LangbaseError::Api {
                status: 401,
                message: "unauthorized".to_string(),
            }),
            OracleError::InvalidResponse {
                message: "missing score".to_string(),
            },
            OracleError::CircuitOpen { remaining_ms: 1000 },
        ];
        for err in &permanent {
            assert!(!err.is_transient(), "expected permanent: {}", err);
        }
    }

    #[test]
    fn test_validation_error_becomes_config_error() {
        let tool_err = ToolError::Validation {
            field: "branching_factor".to_string(),
            reason: "must be at least 1".to_string(),
        };
        let app_err: AppError = tool_err.into();
        assert!(matches!(app_err, AppError::Config { .. }));
        assert!(app_err.to_string().contains("branching_factor"));
    }

    #[test]
    fn test_oracle_error_conversion_to_app_error() {
        let err = OracleError::Timeout { timeout_ms: 1000 };
        let app_err: AppError = err.into();
        assert!(matches!(app_err, AppError::Oracle(_)));
    }
}
