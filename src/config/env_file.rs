//! Persistence of refreshed OAuth access tokens
//!
//! After a successful refresh the new access token is written back to the
//! `.env` file the server was started from, so the next start picks it up.

use crate::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Environment key the access token is stored under
pub const ACCESS_TOKEN_KEY: &str = "GOOGLE_ACCESS_TOKEN";

/// Somewhere a refreshed access token can be kept
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Persist a freshly issued access token
    async fn store_access_token(&self, token: &str) -> Result<()>;
}

/// Stores the token in a dotenv file
#[derive(Debug, Clone)]
pub struct EnvFileTokenStore {
    path: PathBuf,
}

impl EnvFileTokenStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

/// Replace (or append) `key` in dotenv content, keeping every other line.
pub fn upsert_env_value(content: &str, key: &str, value: &str) -> String {
    let entry = format!("{key}='{value}'");
    let mut replaced = false;
    let mut lines: Vec<String> = content
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            let body = trimmed.strip_prefix("export ").unwrap_or(trimmed);
            let is_key = body
                .split_once('=')
                .map(|(name, _)| name.trim() == key)
                .unwrap_or(false);
            if is_key && !replaced {
                replaced = true;
                entry.clone()
            } else {
                line.to_string()
            }
        })
        .collect();

    if !replaced {
        lines.push(entry);
    }

    let mut updated = lines.join("\n");
    updated.push('\n');
    updated
}

#[async_trait]
impl TokenStore for EnvFileTokenStore {
    async fn store_access_token(&self, token: &str) -> Result<()> {
        if !tokio::fs::try_exists(&self.path).await? {
            warn!(
                "{} not found, refreshed access token was not persisted",
                self.path.display()
            );
            return Ok(());
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        let updated = upsert_env_value(&content, ACCESS_TOKEN_KEY, token);

        let tmp_path = self.path.with_extension("tmp");
        tokio::fs::write(&tmp_path, updated).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        debug!("Updated {} in {}", ACCESS_TOKEN_KEY, self.path.display());
        Ok(())
    }
}

/// Keeps the token in memory only
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last token handed to the store
    pub async fn current(&self) -> Option<String> {
        self.token.read().await.clone()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn store_access_token(&self, token: &str) -> Result<()> {
        *self.token.write().await = Some(token.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_upsert_replaces_existing_key() {
        let content = "USE_REAL_NEST_API=true\nGOOGLE_ACCESS_TOKEN=old\nGOOGLE_PROJECT_ID=p\n";
        assert_eq!(
            upsert_env_value(content, ACCESS_TOKEN_KEY, "new"),
            "USE_REAL_NEST_API=true\nGOOGLE_ACCESS_TOKEN='new'\nGOOGLE_PROJECT_ID=p\n"
        );
    }

    #[test]
    fn test_upsert_appends_missing_key() {
        assert_eq!(
            upsert_env_value("# comment\nFOO=1", ACCESS_TOKEN_KEY, "tok"),
            "# comment\nFOO=1\nGOOGLE_ACCESS_TOKEN='tok'\n"
        );
    }

    #[test]
    fn test_upsert_ignores_prefixed_keys() {
        let content = "GOOGLE_ACCESS_TOKEN_OLD=x\nexport GOOGLE_ACCESS_TOKEN=y\n";
        assert_eq!(
            upsert_env_value(content, ACCESS_TOKEN_KEY, "z"),
            "GOOGLE_ACCESS_TOKEN_OLD=x\nGOOGLE_ACCESS_TOKEN='z'\n"
        );
    }

    #[tokio::test]
    async fn test_env_file_store_rewrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        tokio::fs::write(&path, "GOOGLE_ACCESS_TOKEN=stale\nWEATHER_API_KEY=k\n")
            .await
            .unwrap();

        let store = EnvFileTokenStore::new(&path);
        store.store_access_token("fresh").await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "GOOGLE_ACCESS_TOKEN='fresh'\nWEATHER_API_KEY=k\n");
    }

    #[tokio::test]
    async fn test_env_file_store_missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.env");

        let store = EnvFileTokenStore::new(&path);
        store.store_access_token("fresh").await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.current().await, None);
        store.store_access_token("abc").await.unwrap();
        assert_eq!(store.current().await.as_deref(), Some("abc"));
    }
}
