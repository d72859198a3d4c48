use std::sync::Arc;

use sqlx::SqlitePool;

use crate::connectivity::NetworkMonitor;
use crate::identity::Session;
use crate::services::GoalStore;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub store: Arc<GoalStore>,
    pub session: Arc<Session>,
    pub network: NetworkMonitor,
}
