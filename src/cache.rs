//! Device-local mirror of each user's last fetched goals.

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::db::repository;
use crate::error::AppError;
use crate::models::{Goal, validate_snapshot};

pub const CACHE_KEY_PREFIX: &str = "CACHE_GOALS_";

pub fn cache_key(uid: &str) -> String {
    format!("{}{}", CACHE_KEY_PREFIX, uid)
}

/// Whole-snapshot cache, one entry per user. Both calls are best-effort:
/// a read that fails for any reason is a miss, a failed write is only logged.
#[async_trait]
pub trait SnapshotCache: Send + Sync {
    async fn read_snapshot(&self, uid: &str) -> Option<Vec<Goal>>;
    async fn write_snapshot(&self, uid: &str, goals: &[Goal]);
}

#[derive(Clone)]
pub struct SqliteSnapshotCache {
    db: SqlitePool,
}

impl SqliteSnapshotCache {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Reads and validates the stored snapshot. `CacheCorrupt` when the
    /// entry exists but cannot be trusted.
    pub async fn try_read(&self, uid: &str) -> Result<Option<Vec<Goal>>, AppError> {
        let Some(entry) = repository::find_entry(&self.db, &cache_key(uid)).await? else {
            return Ok(None);
        };

        let goals: Vec<Goal> = serde_json::from_str(&entry.value)
            .map_err(|e| AppError::CacheCorrupt(e.to_string()))?;
        validate_snapshot(&goals).map_err(AppError::CacheCorrupt)?;
        Ok(Some(goals))
    }

    pub async fn try_write(&self, uid: &str, goals: &[Goal]) -> Result<(), AppError> {
        let value = serde_json::to_string(goals)?;
        repository::upsert_entry(&self.db, &cache_key(uid), &value).await?;
        Ok(())
    }

    pub async fn clear_snapshot(&self, uid: &str) -> Result<bool, AppError> {
        Ok(repository::delete_entry(&self.db, &cache_key(uid)).await?)
    }
}

#[async_trait]
impl SnapshotCache for SqliteSnapshotCache {
    async fn read_snapshot(&self, uid: &str) -> Option<Vec<Goal>> {
        match self.try_read(uid).await {
            Ok(Some(goals)) => {
                debug!("Cache hit for {}: {} goals", uid, goals.len());
                Some(goals)
            }
            Ok(None) => None,
            Err(AppError::CacheCorrupt(reason)) => {
                warn!("Discarding corrupt cache entry for {}: {}", uid, reason);
                if let Err(e) = self.clear_snapshot(uid).await {
                    warn!("Failed to clear corrupt cache entry for {}: {}", uid, e);
                }
                None
            }
            Err(e) => {
                warn!("Cache read failed for {}: {}", uid, e);
                None
            }
        }
    }

    async fn write_snapshot(&self, uid: &str, goals: &[Goal]) {
        if let Err(e) = self.try_write(uid, goals).await {
            warn!("Cache write failed for {}: {}", uid, e);
        }
    }
}
