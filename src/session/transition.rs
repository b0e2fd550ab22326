//! Pure session transitions. Each function takes the current snapshot and
//! the caller's notion of "now" and returns the next snapshot; nothing here
//! reads a clock or touches I/O.

use chrono::{DateTime, Utc};

use crate::engine::scoring::{self, Score};
use crate::error::CoreError;
use crate::session::state::{SessionConfig, SessionState, WordStatus};

pub fn create_session(config: SessionConfig) -> Result<SessionState, CoreError> {
    if config.words.is_empty() {
        return Err(CoreError::invalid("a session needs at least one word"));
    }
    if let Some(min) = config.min_accuracy
        && !(0.0..=100.0).contains(&min)
    {
        return Err(CoreError::invalid(format!(
            "minimum accuracy {min} is outside 0..=100"
        )));
    }

    let word_count = config.words.len();
    Ok(SessionState {
        words: config.words,
        word_statuses: vec![WordStatus::NotTyped; word_count],
        time_limit_secs: config.time_limit_secs,
        time_left_secs: config.time_limit_secs.map(i64::from),
        min_accuracy: config.min_accuracy,
        user_id: config.user_id,
        test_id: config.test_id,
        ..SessionState::default()
    })
}

/// Apply a full input buffer. The call that starts the session only starts
/// it: a buffer that both starts the session and ends in whitespace is not
/// finalized until the next call.
pub fn submit_input(
    state: &SessionState,
    buffer: &str,
    now: DateTime<Utc>,
) -> Result<SessionState, CoreError> {
    let mut next = state.clone();
    if state.words.is_empty() || state.is_completed {
        return Ok(next);
    }

    if !state.is_started && !buffer.is_empty() {
        next.is_started = true;
        next.start_time = Some(now);
        next.typed_text = buffer.to_string();
        return Ok(next);
    }

    let trimmed = buffer.trim();
    let ends_with_delimiter = buffer.chars().last().is_some_and(char::is_whitespace);
    if ends_with_delimiter && !trimmed.is_empty() {
        let idx = next.current_word_index;
        let correct = next.words.get(idx).is_some_and(|w| w == trimmed);
        if let Some(status) = next.word_statuses.get_mut(idx) {
            *status = if correct {
                WordStatus::Correct
            } else {
                WordStatus::Incorrect
            };
        }
        next.typed_words.push(trimmed.to_string());
        next.typed_text.clear();
        next.current_word_index += 1;

        if next.current_word_index >= next.words.len() {
            complete(&mut next, now)?;
        }
    } else {
        next.typed_text = buffer.to_string();
    }
    Ok(next)
}

/// One whole-second countdown step. Sessions without a time limit and
/// completed sessions are returned unchanged.
pub fn tick(state: &SessionState, now: DateTime<Utc>) -> Result<SessionState, CoreError> {
    let mut next = state.clone();
    if state.is_completed {
        return Ok(next);
    }
    let Some(left) = state.time_left_secs else {
        return Ok(next);
    };

    let left = (left - 1).max(0);
    next.time_left_secs = Some(left);
    if left <= 0 {
        complete(&mut next, now)?;
    }
    Ok(next)
}

pub fn completed_score(state: &SessionState) -> Option<Score> {
    state.score
}

pub fn reset_session() -> SessionState {
    SessionState::default()
}

fn complete(state: &mut SessionState, now: DateTime<Utc>) -> Result<(), CoreError> {
    let score = scoring::compute_score(state, now)?;
    state.score = Some(score);
    state.is_completed = true;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::state::SessionPhase;
    use chrono::Duration;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    fn created(list: &[&str]) -> SessionState {
        create_session(SessionConfig::new(words(list), "user", "test")).unwrap()
    }

    #[test]
    fn create_rejects_empty_words() {
        let err = create_session(SessionConfig::new(Vec::new(), "u", "t")).unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfiguration(_)));
    }

    #[test]
    fn create_rejects_out_of_range_accuracy() {
        let config = SessionConfig::new(words(&["a"]), "u", "t").with_min_accuracy(Some(120.0));
        assert!(create_session(config).is_err());
    }

    #[test]
    fn create_initializes_defaults() {
        let config = SessionConfig::new(words(&["a", "b"]), "u", "t").with_time_limit(Some(30));
        let state = create_session(config).unwrap();
        assert_eq!(state.phase(), SessionPhase::Created);
        assert_eq!(state.word_statuses(), &[WordStatus::NotTyped; 2]);
        assert_eq!(state.time_left_secs(), Some(30));
        assert!(!state.is_started());
        assert!(state.start_time().is_none());
    }

    #[test]
    fn first_input_only_starts_the_session() {
        let t0 = Utc::now();
        let state = submit_input(&created(&["the", "cat"]), "the ", t0).unwrap();
        assert_eq!(state.phase(), SessionPhase::Running);
        assert_eq!(state.start_time(), Some(t0));
        assert_eq!(state.typed_text(), "the ");
        assert_eq!(state.current_word_index(), 0);
        assert!(state.typed_words().is_empty());

        // Same buffer again finalizes.
        let state = submit_input(&state, "the ", t0).unwrap();
        assert_eq!(state.current_word_index(), 1);
        assert_eq!(state.word_statuses()[0], WordStatus::Correct);
        assert_eq!(state.typed_text(), "");
    }

    #[test]
    fn empty_input_does_not_start() {
        let state = submit_input(&created(&["a"]), "", Utc::now()).unwrap();
        assert!(!state.is_started());
    }

    #[test]
    fn whitespace_only_buffer_is_kept_verbatim() {
        let t0 = Utc::now();
        let state = submit_input(&created(&["a", "b"]), "a", t0).unwrap();
        let state = submit_input(&state, "  ", t0).unwrap();
        assert_eq!(state.typed_text(), "  ");
        assert_eq!(state.current_word_index(), 0);
    }

    #[test]
    fn comparison_is_case_sensitive() {
        let t0 = Utc::now();
        let state = submit_input(&created(&["Rust", "ok"]), "r", t0).unwrap();
        let state = submit_input(&state, "rust ", t0).unwrap();
        assert_eq!(state.word_statuses()[0], WordStatus::Incorrect);
        assert_eq!(state.typed_words(), &["rust".to_string()]);
    }

    #[test]
    fn three_word_session_scores_on_last_word() {
        let t0 = Utc::now();
        let mut state = created(&["the", "quick", "brown"]);
        state = submit_input(&state, "t", t0).unwrap();
        state = submit_input(&state, "the ", t0 + Duration::seconds(1)).unwrap();
        state = submit_input(&state, "quick ", t0 + Duration::seconds(2)).unwrap();
        state = submit_input(&state, "brwn ", t0 + Duration::seconds(3)).unwrap();

        assert_eq!(
            state.word_statuses(),
            &[WordStatus::Correct, WordStatus::Correct, WordStatus::Incorrect]
        );
        assert_eq!(state.current_word_index(), 3);
        assert_eq!(state.phase(), SessionPhase::Completed);
        let score = completed_score(&state).unwrap();
        assert_eq!(score.accuracy, 67.0);
        assert_eq!(score.elapsed_secs, 3.0);
        assert_eq!(score.wpm, 40.0);
        assert!(score.passed);
    }

    #[test]
    fn input_after_completion_is_ignored() {
        let t0 = Utc::now();
        let mut state = created(&["a"]);
        state = submit_input(&state, "a", t0).unwrap();
        state = submit_input(&state, "a ", t0).unwrap();
        assert!(state.is_completed());
        let after = submit_input(&state, "zzz ", t0).unwrap();
        assert_eq!(after, state);
    }

    #[test]
    fn ticks_expire_unstarted_session_with_zero_score() {
        let t0 = Utc::now();
        let config = SessionConfig::new(words(&["a", "b", "c"]), "u", "t").with_time_limit(Some(5));
        let mut state = create_session(config).unwrap();
        for i in 0..5 {
            assert!(!state.is_completed());
            state = tick(&state, t0 + Duration::seconds(i + 1)).unwrap();
        }
        assert!(state.is_completed());
        assert_eq!(state.time_left_secs(), Some(0));
        let score = completed_score(&state).unwrap();
        assert_eq!(score.wpm, 0.0);
        assert_eq!(score.elapsed_secs, 0.0);
        assert_eq!(score.accuracy, 0.0);
    }

    #[test]
    fn expiry_scores_from_start_time() {
        let t0 = Utc::now();
        let config = SessionConfig::new(words(&["a", "b", "c", "d"]), "u", "t")
            .with_time_limit(Some(2))
            .with_min_accuracy(Some(50.0));
        let mut state = create_session(config).unwrap();
        state = submit_input(&state, "a", t0).unwrap();
        state = submit_input(&state, "a ", t0).unwrap();
        state = tick(&state, t0 + Duration::seconds(1)).unwrap();
        state = tick(&state, t0 + Duration::seconds(2)).unwrap();

        let score = completed_score(&state).unwrap();
        assert_eq!(score.elapsed_secs, 2.0);
        assert_eq!(score.wpm, 30.0);
        assert_eq!(score.accuracy, 25.0);
        assert!(!score.passed);
    }

    #[test]
    fn tick_after_completion_changes_nothing() {
        let t0 = Utc::now();
        let config = SessionConfig::new(words(&["a"]), "u", "t").with_time_limit(Some(1));
        let state = tick(&create_session(config).unwrap(), t0).unwrap();
        assert!(state.is_completed());
        let again = tick(&state, t0 + Duration::seconds(10)).unwrap();
        assert_eq!(again, state);
    }

    #[test]
    fn tick_without_limit_is_a_no_op() {
        let state = created(&["a"]);
        assert_eq!(tick(&state, Utc::now()).unwrap(), state);
    }

    #[test]
    fn typed_counts_track_index_before_completion() {
        let t0 = Utc::now();
        let mut state = created(&["a", "b", "c", "d"]);
        state = submit_input(&state, "x", t0).unwrap();
        for buffer in ["a ", "x ", "c "] {
            state = submit_input(&state, buffer, t0).unwrap();
            let typed =
                state.count_status(WordStatus::Correct) + state.count_status(WordStatus::Incorrect);
            assert_eq!(typed, state.current_word_index());
            for (i, status) in state.word_statuses().iter().enumerate() {
                assert_eq!(*status == WordStatus::NotTyped, i >= state.current_word_index());
            }
        }
    }

    #[test]
    fn reset_returns_idle() {
        assert_eq!(reset_session().phase(), SessionPhase::Idle);
    }
}
