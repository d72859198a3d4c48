use std::sync::{Arc, RwLock};

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::SnapshotCache;
use crate::error::AppError;
use crate::identity::Session;
use crate::models::{Goal, GoalStats, GoalSummary, Task, progress_percent};
use crate::remote::RemoteStore;
use crate::services::advice::{Insight, Recommendation};

/// Where the in-memory goals came from after a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum LoadOutcome {
    /// No active user; state was cleared.
    SignedOut,
    /// Fresh remote snapshot adopted and cached.
    Remote { goals: usize },
    /// Remote fetch failed; whatever the cache (or the previous state) held is kept.
    CacheOnly { goals: usize },
    /// The active user changed while the fetch was in flight.
    Superseded,
}

#[derive(Default)]
struct StoreState {
    uid: Option<String>,
    goals: Vec<Goal>,
}

/// Goals of the signed-in user, loaded cache-first then from the remote store.
///
/// Every mutation writes to the remote store and then reloads; the in-memory
/// list is never patched locally. Queries are synchronous reads of that list.
pub struct GoalStore {
    remote: Arc<dyn RemoteStore>,
    cache: Arc<dyn SnapshotCache>,
    session: Arc<Session>,
    state: RwLock<StoreState>,
}

impl GoalStore {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        cache: Arc<dyn SnapshotCache>,
        session: Arc<Session>,
    ) -> Self {
        Self {
            remote,
            cache,
            session,
            state: RwLock::new(StoreState::default()),
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Reloads whenever the signed-in user changes. Runs until the session is dropped.
    pub async fn run_session_watcher(self: Arc<Self>) {
        let mut rx = self.session.subscribe();
        rx.borrow_and_update();
        self.load().await;

        while rx.changed().await.is_ok() {
            rx.borrow_and_update();
            self.load().await;
        }
    }

    /// Cache first, then remote. Failures only downgrade the result.
    pub async fn load(&self) -> LoadOutcome {
        let Some(uid) = self.session.current_uid() else {
            self.replace(None, Vec::new());
            debug!("No active user, cleared goals");
            return LoadOutcome::SignedOut;
        };

        match self.cache.read_snapshot(&uid).await {
            Some(cached) => {
                if self.is_active(&uid) {
                    debug!("Showing {} cached goals for {}", cached.len(), uid);
                    self.replace(Some(uid.clone()), cached);
                }
            }
            None => {
                let mut state = self.write_state();
                if state.uid.as_deref() != Some(uid.as_str()) {
                    state.uid = Some(uid.clone());
                    state.goals.clear();
                }
            }
        }

        match self.remote.fetch_goals(&uid).await {
            Ok(goals) => {
                if !self.is_active(&uid) {
                    debug!("Discarding goals fetched for {}, user changed", uid);
                    return LoadOutcome::Superseded;
                }
                let count = goals.len();
                self.replace(Some(uid.clone()), goals.clone());
                self.cache.write_snapshot(&uid, &goals).await;
                info!("Loaded {} goals for {}", count, uid);
                LoadOutcome::Remote { goals: count }
            }
            Err(e) => {
                warn!("Remote fetch failed for {}, keeping last known goals: {}", uid, e);
                LoadOutcome::CacheOnly { goals: self.with_goals(|goals| goals.len()) }
            }
        }
    }

    /// Creates a goal remotely; its id is only known after the reload.
    pub async fn add_goal(&self, name: &str) -> Result<(), AppError> {
        let Some(uid) = self.session.current_uid() else {
            return Ok(());
        };
        let name = non_empty(name, "goal name")?;

        self.remote.create_goal(&uid, name).await?;
        self.load().await;
        Ok(())
    }

    pub async fn add_task(&self, goal_id: &str, title: &str) -> Result<(), AppError> {
        let Some(uid) = self.session.current_uid() else {
            return Ok(());
        };
        let title = non_empty(title, "task title")?;

        let mut tasks = self.tasks_of(&uid, goal_id).ok_or(AppError::NotFound)?;
        let id = new_task_id(&tasks);
        tasks.push(Task::new(id, title.to_string()));

        self.remote.update_goal_tasks(&uid, goal_id, &tasks).await?;
        self.load().await;
        Ok(())
    }

    pub async fn toggle_task(&self, goal_id: &str, task_id: &str) -> Result<(), AppError> {
        let Some(uid) = self.session.current_uid() else {
            return Ok(());
        };

        let mut tasks = self.tasks_of(&uid, goal_id).ok_or(AppError::NotFound)?;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or(AppError::NotFound)?;
        task.completed = !task.completed;

        self.remote.update_goal_tasks(&uid, goal_id, &tasks).await?;
        self.load().await;
        Ok(())
    }

    pub fn goals(&self) -> Vec<Goal> {
        self.with_goals(|goals| goals.to_vec())
    }

    pub fn goal(&self, goal_id: &str) -> Option<Goal> {
        self.with_goals(|goals| goals.iter().find(|g| g.id == goal_id).cloned())
    }

    pub fn overall_progress(&self) -> u8 {
        self.with_goals(overall_of)
    }

    /// 0 for an unknown goal.
    pub fn goal_progress(&self, goal_id: &str) -> u8 {
        self.goal(goal_id).map(|g| g.progress()).unwrap_or(0)
    }

    pub fn stats(&self) -> GoalStats {
        self.with_goals(GoalStats::from_goals)
    }

    pub fn goal_summaries(&self) -> Vec<GoalSummary> {
        self.with_goals(|goals| goals.iter().map(GoalSummary::from).collect())
    }

    pub fn recommendation(&self) -> Recommendation {
        self.with_goals(|goals| Recommendation::select(overall_of(goals), goals.len()))
    }

    pub fn insight(&self) -> Insight {
        Insight::select(self.overall_progress())
    }

    pub fn has_pending_tasks(&self) -> bool {
        self.stats().pending_tasks > 0
    }

    /// Runs `f` over the goals of the currently signed-in user. Goals still
    /// held for a previous user read as empty until the next load replaces them.
    fn with_goals<R>(&self, f: impl FnOnce(&[Goal]) -> R) -> R {
        let current = self.session.current_uid();
        let state = self.read_state();
        if current.is_some() && state.uid == current {
            f(&state.goals)
        } else {
            f(&[])
        }
    }

    /// Task list of `goal_id`, only if the held goals belong to `uid`.
    fn tasks_of(&self, uid: &str, goal_id: &str) -> Option<Vec<Task>> {
        let state = self.read_state();
        if state.uid.as_deref() != Some(uid) {
            return None;
        }
        state.goals.iter().find(|g| g.id == goal_id).map(|g| g.tasks.clone())
    }

    fn is_active(&self, uid: &str) -> bool {
        self.session.current_uid().as_deref() == Some(uid)
    }

    fn replace(&self, uid: Option<String>, goals: Vec<Goal>) {
        let mut state = self.write_state();
        state.uid = uid;
        state.goals = goals;
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn overall_of(goals: &[Goal]) -> u8 {
    let stats = GoalStats::from_goals(goals);
    progress_percent(stats.completed_tasks, stats.total_tasks)
}

fn non_empty<'a>(value: &'a str, what: &str) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("{} must not be empty", what)));
    }
    Ok(trimmed)
}

fn new_task_id(existing: &[Task]) -> String {
    loop {
        let id = Uuid::new_v4().simple().to_string();
        if !existing.iter().any(|t| t.id == id) {
            return id;
        }
    }
}
