// Election deployment configuration
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use crate::primitives::{Principal, Result, VotingError};
use crate::voting::ElectionMode;

/// Deployment settings, read from a JSON file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionConfig {
    /// The only principal allowed to register voters and change phase
    pub admin: Principal,
    pub options_count: u32,
    #[serde(default)]
    pub mode: ElectionMode,
    /// Directory holding `<circuit>.pk` / `<circuit>.vk` and the setup manifest
    #[serde(default = "default_keys_dir")]
    pub keys_dir: PathBuf,
}

fn default_keys_dir() -> PathBuf {
    PathBuf::from("./ballot_keys")
}

impl ElectionConfig {
    pub fn new(admin: impl Into<String>, options_count: u32, mode: ElectionMode) -> Self {
        Self {
            admin: Principal::new(admin),
            options_count,
            mode,
            keys_dir: default_keys_dir(),
        }
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .await
            .map_err(|e| VotingError::Configuration(format!("Failed to read {:?}: {}", path, e)))?;
        let config: ElectionConfig = serde_json::from_str(&json)
            .map_err(|e| VotingError::Configuration(format!("Invalid config {:?}: {}", path, e)))?;
        config.validate()?;
        info!("⚙️  Loaded election config from {:?}", path);
        Ok(config)
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).await?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.options_count == 0 {
            return Err(VotingError::Configuration("options_count must be at least 1".to_string()));
        }
        if self.admin.as_str().is_empty() {
            return Err(VotingError::Configuration("admin must not be empty".to_string()));
        }
        Ok(())
    }
}

impl Default for ElectionConfig {
    fn default() -> Self {
        Self::new("admin", 2, ElectionMode::CommitReveal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_config_file_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("election.json");
        let config = ElectionConfig::new("alice", 3, ElectionMode::OpenBallot { voting_duration_secs: 3600 });
        config.save(&path).await.unwrap();

        assert_eq!(ElectionConfig::load(&path).await.unwrap(), config);
    }

    #[tokio::test]
    async fn test_minimal_config_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("election.json");
        tokio::fs::write(&path, r#"{"admin": "alice", "options_count": 2}"#).await.unwrap();

        let config = ElectionConfig::load(&path).await.unwrap();
        assert_eq!(config.mode, ElectionMode::CommitReveal);
        assert_eq!(config.keys_dir, PathBuf::from("./ballot_keys"));
    }

    #[tokio::test]
    async fn test_zero_options_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("election.json");
        tokio::fs::write(&path, r#"{"admin": "alice", "options_count": 0}"#).await.unwrap();

        assert!(matches!(
            ElectionConfig::load(&path).await,
            Err(VotingError::Configuration(_))
        ));
    }
}
