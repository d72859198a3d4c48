use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::task::Task;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Goal {
    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    pub fn progress(&self) -> u8 {
        progress_percent(self.completed_count(), self.tasks.len())
    }

    pub fn find_task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGoalRequest {
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GoalStats {
    pub total_goals: usize,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub pending_tasks: usize,
}

impl GoalStats {
    pub fn from_goals(goals: &[Goal]) -> Self {
        let total_tasks: usize = goals.iter().map(|g| g.tasks.len()).sum();
        let completed_tasks: usize = goals.iter().map(Goal::completed_count).sum();
        Self {
            total_goals: goals.len(),
            total_tasks,
            completed_tasks,
            pending_tasks: total_tasks - completed_tasks,
        }
    }
}

/// Per-goal row for the progress view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoalSummary {
    pub id: String,
    pub name: String,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub progress: u8,
}

impl From<&Goal> for GoalSummary {
    fn from(goal: &Goal) -> Self {
        Self {
            id: goal.id.clone(),
            name: goal.name.clone(),
            total_tasks: goal.tasks.len(),
            completed_tasks: goal.completed_count(),
            progress: goal.progress(),
        }
    }
}

/// Rounded completion percentage. An empty list counts as 0%.
pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    // Integer half-up rounding; completed <= total keeps this within 0..=100.
    let pct = (200 * completed + total) / (2 * total);
    pct.min(100) as u8
}

/// Checks the structural invariants a snapshot must hold before it is trusted.
pub fn validate_snapshot(goals: &[Goal]) -> Result<(), String> {
    let mut goal_ids = HashSet::new();
    for goal in goals {
        if goal.id.is_empty() {
            return Err("goal with empty id".to_string());
        }
        if !goal_ids.insert(goal.id.as_str()) {
            return Err(format!("duplicate goal id: {}", goal.id));
        }
        if goal.name.trim().is_empty() {
            return Err(format!("goal {} has an empty name", goal.id));
        }

        let mut task_ids = HashSet::new();
        for task in &goal.tasks {
            if task.id.is_empty() {
                return Err(format!("task with empty id in goal {}", goal.id));
            }
            if !task_ids.insert(task.id.as_str()) {
                return Err(format!("duplicate task id {} in goal {}", task.id, goal.id));
            }
            if task.title.trim().is_empty() {
                return Err(format!("task {} in goal {} has an empty title", task.id, goal.id));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, completed: bool) -> Task {
        Task {
            id: id.to_string(),
            title: format!("task {}", id),
            completed,
        }
    }

    #[test]
    fn test_progress_percent_rounds() {
        assert_eq!(progress_percent(0, 0), 0);
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(1, 2), 50);
        assert_eq!(progress_percent(1, 8), 13);
        assert_eq!(progress_percent(3, 3), 100);
    }

    #[test]
    fn test_progress_percent_stays_in_range() {
        for total in 1..=50 {
            for completed in 0..=total {
                let expected = ((100.0 * completed as f64) / total as f64).round() as u8;
                assert_eq!(progress_percent(completed, total), expected);
            }
        }
    }

    #[test]
    fn test_stats_counts_add_up() {
        let goals = vec![
            Goal {
                id: "g1".to_string(),
                name: "Learn Go".to_string(),
                tasks: vec![task("t1", true), task("t2", false)],
            },
            Goal {
                id: "g2".to_string(),
                name: "Learn Rust".to_string(),
                tasks: vec![task("t1", true)],
            },
        ];

        let stats = GoalStats::from_goals(&goals);
        assert_eq!(stats.total_goals, 2);
        assert_eq!(stats.total_tasks, 3);
        assert_eq!(stats.completed_tasks, 2);
        assert_eq!(stats.pending_tasks, 1);
        assert_eq!(stats.pending_tasks + stats.completed_tasks, stats.total_tasks);
    }

    #[test]
    fn test_validate_snapshot_rejects_duplicates() {
        let dup_goal = vec![
            Goal { id: "g1".to_string(), name: "a".to_string(), tasks: vec![] },
            Goal { id: "g1".to_string(), name: "b".to_string(), tasks: vec![] },
        ];
        assert!(validate_snapshot(&dup_goal).is_err());

        let dup_task = vec![Goal {
            id: "g1".to_string(),
            name: "a".to_string(),
            tasks: vec![task("t1", false), task("t1", true)],
        }];
        assert!(validate_snapshot(&dup_task).is_err());

        // same task id in different goals is fine
        let ok = vec![
            Goal { id: "g1".to_string(), name: "a".to_string(), tasks: vec![task("t1", false)] },
            Goal { id: "g2".to_string(), name: "b".to_string(), tasks: vec![task("t1", false)] },
        ];
        assert!(validate_snapshot(&ok).is_ok());
    }

    #[test]
    fn test_validate_snapshot_rejects_blank_text() {
        let blank_name = vec![Goal { id: "g1".to_string(), name: "  ".to_string(), tasks: vec![] }];
        assert!(validate_snapshot(&blank_name).is_err());

        let mut untitled = task("t1", false);
        untitled.title = String::new();
        let blank_title = vec![Goal {
            id: "g1".to_string(),
            name: "a".to_string(),
            tasks: vec![untitled],
        }];
        assert!(validate_snapshot(&blank_title).is_err());
    }
}
