use serde::Serialize;

/// Next-step suggestion derived from overall progress and goal count.
/// Rules are checked top to bottom; the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    CreateFirstGoal,
    BeginSmall,
    TwoTasksDaily,
    MaintainRoutine,
    FocusOnDifficultTopics,
    FinishRemaining,
    StartAdvancedSkill,
}

impl Recommendation {
    pub fn select(overall: u8, goal_count: usize) -> Self {
        if goal_count == 0 {
            Self::CreateFirstGoal
        } else if overall == 0 {
            Self::BeginSmall
        } else if overall < 30 {
            Self::TwoTasksDaily
        } else if overall < 60 {
            Self::MaintainRoutine
        } else if overall < 80 {
            Self::FocusOnDifficultTopics
        } else if overall < 100 {
            Self::FinishRemaining
        } else {
            Self::StartAdvancedSkill
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::CreateFirstGoal => "Create your first goal to get started.",
            Self::BeginSmall => "Begin with one small task today.",
            Self::TwoTasksDaily => "Try completing 2 tasks daily to build momentum.",
            Self::MaintainRoutine => "Good consistency. Maintain your routine.",
            Self::FocusOnDifficultTopics => "Great work! Focus on the difficult topics next.",
            Self::FinishRemaining => "Almost complete. Finish the remaining tasks.",
            Self::StartAdvancedSkill => "Excellent! Start a new advanced skill.",
        }
    }
}

/// Short analytics blurb over overall progress alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Insight {
    StartSmall,
    GoodStart,
    NiceMomentum,
    StrongDiscipline,
    LevelUp,
}

impl Insight {
    pub fn select(overall: u8) -> Self {
        match overall {
            0 => Self::StartSmall,
            1..=39 => Self::GoodStart,
            40..=69 => Self::NiceMomentum,
            70..=99 => Self::StrongDiscipline,
            _ => Self::LevelUp,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::StartSmall => "Start small. One task today makes progress real.",
            Self::GoodStart => "Good start. Consistency matters more than speed.",
            Self::NiceMomentum => "Nice momentum. Keep pushing forward.",
            Self::StrongDiscipline => "Strong discipline. Finish what you started.",
            Self::LevelUp => "Excellent work. Time to level up 🚀",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_goals_always_suggests_first_goal() {
        for overall in 0..=100 {
            assert_eq!(Recommendation::select(overall, 0), Recommendation::CreateFirstGoal);
        }
    }

    #[test]
    fn test_bucket_boundaries() {
        let cases = [
            (0, Recommendation::BeginSmall),
            (1, Recommendation::TwoTasksDaily),
            (29, Recommendation::TwoTasksDaily),
            (30, Recommendation::MaintainRoutine),
            (59, Recommendation::MaintainRoutine),
            (60, Recommendation::FocusOnDifficultTopics),
            (79, Recommendation::FocusOnDifficultTopics),
            (80, Recommendation::FinishRemaining),
            (99, Recommendation::FinishRemaining),
            (100, Recommendation::StartAdvancedSkill),
        ];
        for (overall, expected) in cases {
            assert_eq!(Recommendation::select(overall, 3), expected, "overall={}", overall);
        }
    }

    #[test]
    fn test_fifty_percent_message() {
        assert_eq!(
            Recommendation::select(50, 1).message(),
            "Good consistency. Maintain your routine."
        );
    }

    #[test]
    fn test_insight_ladder() {
        assert_eq!(Insight::select(0), Insight::StartSmall);
        assert_eq!(Insight::select(39), Insight::GoodStart);
        assert_eq!(Insight::select(40), Insight::NiceMomentum);
        assert_eq!(Insight::select(70), Insight::StrongDiscipline);
        assert_eq!(Insight::select(100), Insight::LevelUp);
    }
}
