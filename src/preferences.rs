use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::debug;

/// Small string key-value store that survives restarts.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, sqlx::Error>;
    async fn set(&self, key: &str, value: &str) -> Result<(), sqlx::Error>;
}

pub struct SqlitePreferenceStore {
    pool: SqlitePool,
}

impl SqlitePreferenceStore {
    pub async fn open(db_path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let opts = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(opts).await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS preferences (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )"
        ).execute(&pool).await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl PreferenceStore for SqlitePreferenceStore {
    async fn get(&self, key: &str) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM preferences WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        debug!("preference {} -> {:?}", key, row);
        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT OR REPLACE INTO preferences (key, value, updated_at) VALUES (?, ?, ?)"
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn get(&self, key: &str) -> Result<Option<String>, sqlx::Error> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), sqlx::Error> {
        self.values.lock().await.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
