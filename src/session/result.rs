use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::scoring::Score;
use crate::session::state::SessionState;

/// Immutable record of one completed session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub id: String,
    pub user_id: String,
    pub test_id: String,
    pub wpm: f64,
    pub accuracy: f64,
    pub passed: bool,
    #[serde(default)]
    pub elapsed_secs: f64,
    pub completed_at: DateTime<Utc>,
}

impl TestResult {
    pub fn from_session(
        id: String,
        state: &SessionState,
        score: &Score,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id: state.user_id().to_string(),
            test_id: state.test_id().to_string(),
            wpm: score.wpm,
            accuracy: score.accuracy,
            passed: score.passed,
            elapsed_secs: score.elapsed_secs,
            completed_at,
        }
    }
}
