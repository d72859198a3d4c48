pub mod goal;
pub mod task;

pub use goal::{Goal, GoalStats, GoalSummary, NewGoalRequest, progress_percent, validate_snapshot};
pub use task::{NewTaskRequest, Task};
