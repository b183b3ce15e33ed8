use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Overrides the platform data directory when set.
pub(crate) const DATA_DIR_ENV: &str = "SPENDCAST_DATA_DIR";

const DB_FILE: &str = "spendcast.db";
const LOG_FILE: &str = "spendcast.log";

#[derive(Debug, Clone)]
pub(crate) struct AppConfig {
    data_dir: PathBuf,
}

impl AppConfig {
    pub(crate) fn load() -> Result<Self> {
        let data_dir = match std::env::var_os(DATA_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => directories::ProjectDirs::from("com", "spendcast", "Spendcast")
                .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?
                .data_dir()
                .to_path_buf(),
        };
        Self::at(data_dir)
    }

    /// Use `data_dir`, creating it if needed.
    pub(crate) fn at(data_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
        Ok(Self { data_dir })
    }

    pub(crate) fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub(crate) fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE)
    }

    pub(crate) fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_paths_live_in_data_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("data");
        let config = AppConfig::at(dir.clone()).unwrap();
        assert!(dir.is_dir());
        assert_eq!(config.data_dir(), dir.as_path());
        assert_eq!(config.db_path(), dir.join("spendcast.db"));
        assert_eq!(config.log_path(), dir.join("spendcast.log"));
    }
}
