use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use super::RemoteStore;
use crate::error::AppError;
use crate::models::{Goal, Task};

/// Process-local document store. Used when no Firestore project is
/// configured and as the gateway in tests.
#[derive(Default)]
pub struct InMemoryRemoteStore {
    users: Mutex<HashMap<String, Vec<Goal>>>,
    offline: AtomicBool,
    writes: AtomicUsize,
}

impl InMemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts goals in place as if another client had written them.
    pub fn seed(&self, uid: &str, goals: Vec<Goal>) {
        let mut users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        users.entry(uid.to_string()).or_default().extend(goals);
    }

    /// While unavailable every call fails with `RemoteUnavailable`.
    pub fn set_available(&self, available: bool) {
        self.offline.store(!available, Ordering::SeqCst);
    }

    /// Number of successful create/update calls.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn goals_for(&self, uid: &str) -> Vec<Goal> {
        let users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        users
            .get(uid)
            .cloned()
            .unwrap_or_default()
    }

    fn check_available(&self) -> Result<(), AppError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::RemoteUnavailable("in-memory store is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemoteStore {
    async fn fetch_goals(&self, uid: &str) -> Result<Vec<Goal>, AppError> {
        self.check_available()?;
        Ok(self.goals_for(uid))
    }

    async fn create_goal(&self, uid: &str, name: &str) -> Result<(), AppError> {
        self.check_available()?;
        let goal = Goal {
            id: Uuid::new_v4().simple().to_string(),
            name: name.to_string(),
            tasks: Vec::new(),
        };
        let mut users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        users.entry(uid.to_string()).or_default().push(goal);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update_goal_tasks(&self, uid: &str, goal_id: &str, tasks: &[Task]) -> Result<(), AppError> {
        self.check_available()?;
        let mut users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        let stored = users
            .get_mut(uid)
            .and_then(|goals| goals.iter_mut().find(|g| g.id == goal_id))
            .ok_or(AppError::NotFound)?;
        stored.tasks = tasks.to_vec();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
