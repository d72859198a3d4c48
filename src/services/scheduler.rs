use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime, NaiveTime, TimeDelta};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::services::goal_store::GoalStore;

pub const DEFAULT_REMINDER_TITLE: &str = "Skill Companion Reminder";
pub const DEFAULT_REMINDER_BODY: &str = "Complete your pending tasks today 💪";

/// What the platform scheduler is asked to show, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderRequest {
    pub title: String,
    pub body: String,
    pub hour: u32,
    pub minute: u32,
    pub repeats: bool,
}

impl ReminderRequest {
    pub fn daily(hour: u32, minute: u32) -> Result<Self, AppError> {
        if hour > 23 || minute > 59 {
            return Err(AppError::Config(format!(
                "Invalid reminder time {:02}:{:02}",
                hour, minute
            )));
        }
        Ok(Self {
            title: DEFAULT_REMINDER_TITLE.to_string(),
            body: DEFAULT_REMINDER_BODY.to_string(),
            hour,
            minute,
            repeats: true,
        })
    }

    /// The first wall-clock time strictly after `now` matching hour:minute.
    pub fn next_fire_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let at = NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or_default();
        let today = now.date().and_time(at);
        if today > now {
            today
        } else {
            today + TimeDelta::days(1)
        }
    }
}

/// Hands a reminder to whatever displays notifications on the host.
#[async_trait]
pub trait NotificationScheduler: Send + Sync {
    async fn deliver(&self, request: &ReminderRequest) -> Result<(), AppError>;
}

/// Writes reminders to the log. Used when no platform notifier is wired in.
pub struct LogNotifier;

#[async_trait]
impl NotificationScheduler for LogNotifier {
    async fn deliver(&self, request: &ReminderRequest) -> Result<(), AppError> {
        info!("Reminder: {} - {}", request.title, request.body);
        Ok(())
    }
}

/// Fires the reminder at the configured time of day, but only while the
/// signed-in user still has something left to do.
pub struct ReminderScheduler {
    store: Arc<GoalStore>,
    notifier: Arc<dyn NotificationScheduler>,
    request: ReminderRequest,
}

impl ReminderScheduler {
    pub fn new(
        store: Arc<GoalStore>,
        notifier: Arc<dyn NotificationScheduler>,
        request: ReminderRequest,
    ) -> Self {
        Self {
            store,
            notifier,
            request,
        }
    }

    pub async fn start(self) {
        info!(
            "Starting reminder scheduler ({:02}:{:02}, repeats: {})",
            self.request.hour, self.request.minute, self.request.repeats
        );

        loop {
            let now = Local::now().naive_local();
            let wait = (self.request.next_fire_after(now) - now)
                .to_std()
                .unwrap_or(Duration::ZERO);
            tokio::time::sleep(wait).await;

            match self.fire().await {
                Ok(true) => debug!("Reminder delivered"),
                Ok(false) => debug!("Reminder skipped, nothing pending"),
                Err(e) => {
                    warn!("Reminder delivery failed: {:?}", e);
                }
            }

            if !self.request.repeats {
                break;
            }
        }
    }

    /// Returns whether a reminder was actually delivered.
    pub async fn fire(&self) -> Result<bool, AppError> {
        if !self.store.has_pending_tasks() {
            return Ok(false);
        }
        self.notifier.deliver(&self.request).await?;
        Ok(true)
    }
}
