use serde::{Deserialize, Serialize};

/// Test counts that earn a congratulatory signal.
pub const MILESTONES: [u32; 6] = [10, 20, 50, 100, 500, 1000];

/// Lifetime running statistics for one user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserStatistics {
    pub user_id: String,
    pub mean_wpm: f64,
    pub mean_accuracy: f64,
    pub top_wpm: f64,
    pub tests_finished: u32,
}

impl UserStatistics {
    pub fn empty(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            mean_wpm: 0.0,
            mean_accuracy: 0.0,
            top_wpm: 0.0,
            tests_finished: 0,
        }
    }
}

/// Outcome of folding one result into a user's statistics.
#[derive(Clone, Debug, PartialEq)]
pub struct StatsUpdate {
    pub stats: UserStatistics,
    pub new_top_wpm: bool,
    pub milestone: Option<u32>,
}

/// Fold one score into the running means. The mean is updated
/// incrementally from the stored count, never recomputed from history.
pub fn apply_result(
    user_id: &str,
    existing: Option<&UserStatistics>,
    wpm: f64,
    accuracy: f64,
) -> StatsUpdate {
    let Some(old) = existing else {
        return StatsUpdate {
            stats: UserStatistics {
                user_id: user_id.to_string(),
                mean_wpm: wpm,
                mean_accuracy: accuracy,
                top_wpm: wpm,
                tests_finished: 1,
            },
            new_top_wpm: false,
            milestone: None,
        };
    };

    let n = f64::from(old.tests_finished);
    let count = old.tests_finished.saturating_add(1);
    let total = f64::from(count);
    let top_wpm = old.top_wpm.max(wpm);

    StatsUpdate {
        stats: UserStatistics {
            user_id: old.user_id.clone(),
            mean_wpm: (old.mean_wpm * n + wpm) / total,
            mean_accuracy: (old.mean_accuracy * n + accuracy) / total,
            top_wpm,
            tests_finished: count,
        },
        new_top_wpm: top_wpm > old.top_wpm,
        milestone: MILESTONES.contains(&count).then_some(count),
    }
}
