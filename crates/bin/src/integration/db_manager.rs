//! Research database location.
//!
//! Resolves the SQLite research database path, falling back to a
//! platform-specific default location.

use sorts_data::ResearchDb;
use sorts_data::error::DataError;
use std::path::{Path, PathBuf};

/// Environment variable naming the research database.
pub(crate) const DB_ENV_VAR: &str = "DISASTER_SORTS_DB";

/// Get the default data directory path.
///
/// Uses platform-specific data directories:
/// - Linux: `~/.local/share/disaster-sorts/`
/// - macOS: `~/Library/Application Support/disaster-sorts/`
/// - Windows: `%APPDATA%\disaster-sorts\`
pub(crate) fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("disaster-sorts")
}

/// Get the default research database path.
pub(crate) fn default_db_path() -> PathBuf {
    default_data_dir().join("research.db")
}

/// Explicit path (flag or environment) if given, otherwise the default.
pub(crate) fn resolve_db_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(default_db_path)
}

/// Open the research database; it must already exist.
pub(crate) fn open_db(path: &Path) -> Result<ResearchDb, DataError> {
    ResearchDb::open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path_layout() {
        let path = default_db_path();
        assert!(path.ends_with("disaster-sorts/research.db"));
    }

    #[test]
    fn test_explicit_path_wins() {
        let explicit = PathBuf::from("/tmp/custom.db");
        assert_eq!(resolve_db_path(Some(explicit.clone())), explicit);
        assert_eq!(resolve_db_path(None), default_db_path());
    }

    #[test]
    fn test_open_missing_db() {
        let path = std::env::temp_dir().join("disaster_sorts_bin_missing.db");
        std::fs::remove_file(&path).ok();
        assert!(matches!(open_db(&path), Err(DataError::DatabaseNotFound(_))));
    }
}
