//! `[store]` section configuration.
//!
//! ```toml
//! [store]
//! path = "data/pagesmith.db"  # SQLite database holding stored page overrides
//! pool_size = 8               # Pooled connections
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database file.
    pub path: PathBuf,

    /// Maximum number of pooled connections.
    pub pool_size: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/pagesmith.db"),
            pool_size: 8,
        }
    }
}

impl StoreConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.path.as_os_str() == ":memory:" {
            diag.error_with_hint(
                FieldPath::new("store.path"),
                "in-memory databases are not shared between pooled connections",
                "point `store.path` at a file",
            );
        }
        if self.pool_size == 0 {
            diag.error(FieldPath::new("store.pool_size"), "must be at least 1");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ConfigDiagnostics, test_parse_config};

    #[test]
    fn test_store_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.store.path, std::path::PathBuf::from("data/pagesmith.db"));
        assert_eq!(config.store.pool_size, 8);
    }

    #[test]
    fn test_memory_database_rejected() {
        let config = test_parse_config("[store]\npath = \":memory:\"");
        let mut diag = ConfigDiagnostics::new();
        config.store.validate(&mut diag);
        assert_eq!(diag.len(), 1);
    }
}
