//! Environment configuration for the dev tools

use std::path::PathBuf;

pub const SEED_ENV: &str = "ORGGRAPH_SEED";
pub const LOG_ENV: &str = "RUST_LOG";
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Settings read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevConfig {
    /// Seed file to load; `None` uses the built-in sample org
    pub seed_path: Option<PathBuf>,
    /// `tracing_subscriber` filter directive
    pub log_filter: String,
}

impl DevConfig {
    /// Read `ORGGRAPH_SEED` and `RUST_LOG`, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            seed_path: value(SEED_ENV).map(PathBuf::from),
            log_filter: value(LOG_ENV).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_when_unset() {
        let config = DevConfig::from_lookup(|_| None);
        assert_eq!(config.seed_path, None);
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_reads_both_variables() {
        let vars: HashMap<&str, &str> = [
            (SEED_ENV, "/tmp/org.json"),
            (LOG_ENV, "orggraph_core=debug"),
        ]
        .into_iter()
        .collect();
        let config = DevConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.seed_path, Some(PathBuf::from("/tmp/org.json")));
        assert_eq!(config.log_filter, "orggraph_core=debug");
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = DevConfig::from_lookup(|_| Some("  ".to_string()));
        assert_eq!(config.seed_path, None);
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }
}
