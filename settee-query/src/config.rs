//! Query configuration.
//!
//! Loaded from a flat TOML file:
//!
//! ```toml
//! index_prefix = "by"
//! timeout_ms = 5000
//! log_queries = true
//! ```
//!
//! ```rust
//! use settee_query::config::QueryConfig;
//!
//! let config: QueryConfig = "timeout_ms = 250".parse()?;
//! assert_eq!(config.index_prefix, "by");
//! assert_eq!(config.timeout().map(|t| t.as_millis()), Some(250));
//! # Ok::<(), settee_query::QueryError>(())
//! ```

use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};

/// Default marker prepended to generated index names.
pub const DEFAULT_INDEX_PREFIX: &str = "by";

/// Settings shared by every query of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryConfig {
    /// Marker prepended to index names.
    #[serde(default = "default_index_prefix")]
    pub index_prefix: String,

    /// Per-call timeout for store operations, in milliseconds.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Log every compiled query at `info` level.
    #[serde(default)]
    pub log_queries: bool,
}

fn default_index_prefix() -> String {
    DEFAULT_INDEX_PREFIX.to_string()
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            index_prefix: default_index_prefix(),
            timeout_ms: None,
            log_queries: false,
        }
    }
}

impl QueryConfig {
    /// Create a builder.
    pub fn builder() -> QueryConfigBuilder {
        QueryConfigBuilder::default()
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> QueryResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| QueryError::config(format!("cannot read {}: {}", path.display(), e)))?;
        content.parse()
    }

    /// Apply `SETTEE_INDEX_PREFIX` and `SETTEE_TIMEOUT_MS` overrides.
    pub fn with_env_overrides(mut self) -> QueryResult<Self> {
        if let Ok(prefix) = env::var("SETTEE_INDEX_PREFIX") {
            self.index_prefix = prefix;
        }
        if let Ok(timeout) = env::var("SETTEE_TIMEOUT_MS") {
            let ms = timeout.trim().parse().map_err(|_| {
                QueryError::config(format!("SETTEE_TIMEOUT_MS is not a number: {}", timeout))
            })?;
            self.timeout_ms = Some(ms);
        }
        self.validate()?;
        Ok(self)
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> QueryResult<()> {
        if self.index_prefix.trim().is_empty() {
            return Err(QueryError::config("index_prefix must not be empty"));
        }
        if self.timeout_ms == Some(0) {
            return Err(QueryError::config("timeout_ms must be greater than zero"));
        }
        Ok(())
    }

    /// Store call timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl FromStr for QueryConfig {
    type Err = QueryError;

    fn from_str(content: &str) -> QueryResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| QueryError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// Builder for [`QueryConfig`].
#[derive(Debug, Default)]
pub struct QueryConfigBuilder {
    config: QueryConfig,
}

impl QueryConfigBuilder {
    /// Set the index name prefix.
    pub fn index_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.index_prefix = prefix.into();
        self
    }

    /// Set the store call timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Enable or disable query logging.
    pub fn log_queries(mut self, enabled: bool) -> Self {
        self.config.log_queries = enabled;
        self
    }

    /// Validate and build.
    pub fn build(self) -> QueryResult<QueryConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
