use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::session::state::{SessionState, WordStatus};

/// Shortest elapsed time a started session can be scored with.
pub const MIN_ELAPSED_SECS: f64 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub wpm: f64,
    pub accuracy: f64,
    pub elapsed_secs: f64,
    pub passed: bool,
}

pub fn elapsed_secs(start: Option<DateTime<Utc>>, completed_at: DateTime<Utc>) -> f64 {
    match start {
        Some(start) => {
            let secs = (completed_at - start).num_milliseconds() as f64 / 1000.0;
            secs.max(MIN_ELAPSED_SECS)
        }
        None => 0.0,
    }
}

pub fn words_per_minute(correct: usize, elapsed_secs: f64) -> f64 {
    if elapsed_secs <= 0.0 {
        return 0.0;
    }
    (correct as f64 / elapsed_secs * 60.0).round()
}

pub fn accuracy_percent(correct: usize, total: usize) -> Result<f64, CoreError> {
    if total == 0 {
        return Err(CoreError::invalid("cannot score a session without words"));
    }
    Ok((correct as f64 / total as f64 * 100.0).round())
}

pub fn passes(accuracy: f64, min_accuracy: Option<f64>) -> bool {
    min_accuracy.is_none_or(|min| accuracy >= min)
}

/// Score a session as of `completed_at`. Unstarted sessions score zero WPM
/// and zero elapsed time.
pub fn compute_score(state: &SessionState, completed_at: DateTime<Utc>) -> Result<Score, CoreError> {
    let correct = state
        .word_statuses
        .iter()
        .filter(|s| **s == WordStatus::Correct)
        .count();
    let accuracy = accuracy_percent(correct, state.words.len())?;
    let elapsed = if state.is_started {
        elapsed_secs(state.start_time, completed_at)
    } else {
        0.0
    };

    Ok(Score {
        wpm: words_per_minute(correct, elapsed),
        accuracy,
        elapsed_secs: elapsed,
        passed: passes(accuracy, state.min_accuracy),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn elapsed_has_a_floor() {
        let t0 = Utc::now();
        assert_eq!(elapsed_secs(Some(t0), t0), MIN_ELAPSED_SECS);
        assert_eq!(elapsed_secs(Some(t0), t0 - Duration::seconds(3)), MIN_ELAPSED_SECS);
        assert_eq!(elapsed_secs(Some(t0), t0 + Duration::seconds(12)), 12.0);
        assert_eq!(elapsed_secs(None, t0), 0.0);
    }

    #[test]
    fn wpm_rounds_correct_words_per_minute() {
        assert_eq!(words_per_minute(10, 30.0), 20.0);
        assert_eq!(words_per_minute(7, 9.0), 47.0);
        assert_eq!(words_per_minute(5, 0.0), 0.0);
        assert_eq!(words_per_minute(0, 12.0), 0.0);
    }

    #[test]
    fn accuracy_rounds_and_rejects_empty() {
        assert_eq!(accuracy_percent(2, 3), Ok(67.0));
        assert_eq!(accuracy_percent(0, 4), Ok(0.0));
        assert_eq!(accuracy_percent(4, 4), Ok(100.0));
        assert!(matches!(
            accuracy_percent(0, 0),
            Err(CoreError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn pass_threshold_is_inclusive() {
        assert!(passes(50.0, None));
        assert!(passes(80.0, Some(80.0)));
        assert!(!passes(79.0, Some(80.0)));
    }

    #[test]
    fn empty_state_cannot_be_scored() {
        let state = SessionState::default();
        assert!(compute_score(&state, Utc::now()).is_err());
    }
}
