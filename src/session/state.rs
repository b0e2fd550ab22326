use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::scoring::Score;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WordStatus {
    NotTyped,
    Correct,
    Incorrect,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Created,
    Running,
    Completed,
}

/// Everything needed to start one attempt.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    pub words: Vec<String>,
    pub time_limit_secs: Option<u32>,
    pub min_accuracy: Option<f64>,
    pub user_id: String,
    pub test_id: String,
}

impl SessionConfig {
    pub fn new(words: Vec<String>, user_id: &str, test_id: &str) -> Self {
        Self {
            words,
            time_limit_secs: None,
            min_accuracy: None,
            user_id: user_id.to_string(),
            test_id: test_id.to_string(),
        }
    }

    pub fn with_time_limit(mut self, secs: Option<u32>) -> Self {
        self.time_limit_secs = secs;
        self
    }

    pub fn with_min_accuracy(mut self, min_accuracy: Option<f64>) -> Self {
        self.min_accuracy = min_accuracy;
        self
    }
}

/// Snapshot of one typing attempt. Transitions in `session::transition`
/// take a snapshot and return the next one; fields are read-only outside
/// this module tree so the per-word invariants cannot be broken from outside.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub(crate) words: Vec<String>,
    pub(crate) word_statuses: Vec<WordStatus>,
    pub(crate) current_word_index: usize,
    pub(crate) typed_text: String,
    pub(crate) typed_words: Vec<String>,
    pub(crate) is_started: bool,
    pub(crate) start_time: Option<DateTime<Utc>>,
    pub(crate) time_limit_secs: Option<u32>,
    /// `None` while no time limit is set.
    pub(crate) time_left_secs: Option<i64>,
    pub(crate) min_accuracy: Option<f64>,
    pub(crate) is_completed: bool,
    pub(crate) score: Option<Score>,
    pub(crate) user_id: String,
    pub(crate) test_id: String,
}

impl SessionState {
    pub fn phase(&self) -> SessionPhase {
        if self.words.is_empty() {
            SessionPhase::Idle
        } else if self.is_completed {
            SessionPhase::Completed
        } else if self.is_started {
            SessionPhase::Running
        } else {
            SessionPhase::Created
        }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn word_statuses(&self) -> &[WordStatus] {
        &self.word_statuses
    }

    pub fn current_word_index(&self) -> usize {
        self.current_word_index
    }

    pub fn current_word(&self) -> Option<&str> {
        self.words.get(self.current_word_index).map(String::as_str)
    }

    pub fn typed_text(&self) -> &str {
        &self.typed_text
    }

    pub fn typed_words(&self) -> &[String] {
        &self.typed_words
    }

    pub fn is_started(&self) -> bool {
        self.is_started
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn time_limit_secs(&self) -> Option<u32> {
        self.time_limit_secs
    }

    pub fn time_left_secs(&self) -> Option<i64> {
        self.time_left_secs
    }

    pub fn min_accuracy(&self) -> Option<f64> {
        self.min_accuracy
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    pub fn score(&self) -> Option<&Score> {
        self.score.as_ref()
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn test_id(&self) -> &str {
        &self.test_id
    }

    pub fn count_status(&self, status: WordStatus) -> usize {
        self.word_statuses.iter().filter(|s| **s == status).count()
    }

    pub fn progress(&self) -> f64 {
        if self.words.is_empty() {
            return 0.0;
        }
        self.current_word_index as f64 / self.words.len() as f64
    }
}
