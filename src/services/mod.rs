pub mod advice;
pub mod goal_store;
pub mod scheduler;

pub use advice::{Insight, Recommendation};
pub use goal_store::{GoalStore, LoadOutcome};
pub use scheduler::{LogNotifier, NotificationScheduler, ReminderRequest, ReminderScheduler};
