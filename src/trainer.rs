//! Wires the session core to its collaborators: word source, catalog,
//! persistence and notifications. Everything is injected through
//! `Trainer::new`.

use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::warn;

use crate::catalog::{TestCatalog, TestSettings};
use crate::engine::scoring::Score;
use crate::engine::statistics::UserStatistics;
use crate::generator::WordSource;
use crate::generator::selection::select_words;
use crate::notify::Notifier;
use crate::recorder::{PendingCompletion, ResultRecorder};
use crate::session::clock::Clock;
use crate::session::controller::TypingSession;
use crate::session::result::TestResult;
use crate::session::state::SessionConfig;
use crate::store::DocumentStore;

/// Test id used for random sessions, which have no stored definition.
pub const RANDOM_TEST_ID: &str = "random";

/// A finished score next to the user's lifetime numbers.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultsSummary {
    pub score: Score,
    pub mean_wpm: f64,
    pub mean_accuracy: f64,
    pub top_wpm: f64,
    pub tests_finished: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    pub stats: UserStatistics,
    pub recent_results: Vec<TestResult>,
}

pub struct Trainer {
    store: Arc<dyn DocumentStore>,
    words: Arc<dyn WordSource>,
    clock: Arc<dyn Clock>,
    catalog: TestCatalog,
    recorder: Arc<ResultRecorder>,
    sample_size: usize,
    rng: Mutex<SmallRng>,
}

impl Trainer {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        words: Arc<dyn WordSource>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        sample_size: usize,
    ) -> Self {
        Self {
            catalog: TestCatalog::new(Arc::clone(&store), Arc::clone(&clock)),
            recorder: ResultRecorder::new(Arc::clone(&store), notifier),
            store,
            words,
            clock,
            sample_size,
            rng: Mutex::new(SmallRng::from_entropy()),
        }
    }

    /// Replace the word-sampling generator, e.g. for deterministic replay.
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(SmallRng::seed_from_u64(seed)),
            ..self
        }
    }

    pub fn catalog(&self) -> &TestCatalog {
        &self.catalog
    }

    pub fn random_session(&self, user_id: &str, settings: TestSettings) -> Result<TypingSession> {
        let words = {
            let mut rng = self.rng.lock().map_err(|_| anyhow!("rng lock poisoned"))?;
            select_words(self.words.as_ref(), None, self.sample_size, &mut *rng)?
        };
        let config = SessionConfig::new(words, user_id, RANDOM_TEST_ID)
            .with_time_limit(settings.time_limit_secs)
            .with_min_accuracy(settings.min_accuracy);
        Ok(TypingSession::create(config, Arc::clone(&self.clock))?)
    }

    /// A session over the user's own text. The text is saved as a test so it
    /// can be replayed later.
    pub fn custom_session(
        &self,
        user_id: &str,
        text: &str,
        settings: TestSettings,
    ) -> Result<TypingSession> {
        let test = self.catalog.create_test(text, settings, user_id)?;
        self.session_from_test(user_id, &test.id)
    }

    pub fn session_from_test(&self, user_id: &str, test_id: &str) -> Result<TypingSession> {
        let test = self.catalog.get_test_by_id(test_id)?;
        let config = SessionConfig::new(test.words(), user_id, &test.id)
            .with_time_limit(test.time_limit())
            .with_min_accuracy(test.min_accuracy());
        Ok(TypingSession::create(config, Arc::clone(&self.clock))?)
    }

    /// Forward one buffer update; returns the background writes if this
    /// input completed the session.
    pub fn submit_input(
        &self,
        session: &mut TypingSession,
        buffer: &str,
    ) -> Result<Option<PendingCompletion>> {
        session.submit_input(buffer)?;
        Ok(self.persist_if_completed(session))
    }

    pub fn tick(&self, session: &mut TypingSession) -> Result<Option<PendingCompletion>> {
        session.tick()?;
        Ok(self.persist_if_completed(session))
    }

    fn persist_if_completed(&self, session: &mut TypingSession) -> Option<PendingCompletion> {
        let (state, score) = session.take_completion()?;
        Some(self.recorder.record(&state, &score, self.clock.now()))
    }

    pub fn statistics(&self, user_id: &str) -> Result<Option<UserStatistics>> {
        self.store.get_user_statistics(user_id)
    }

    /// Missing or unreadable statistics read as zeros.
    pub fn results_summary(&self, user_id: &str, score: Score) -> ResultsSummary {
        let stats = self
            .statistics(user_id)
            .unwrap_or_else(|e| {
                warn!(user_id, "statistics unavailable for summary: {e:#}");
                None
            })
            .unwrap_or_else(|| UserStatistics::empty(user_id));
        ResultsSummary {
            score,
            mean_wpm: stats.mean_wpm,
            mean_accuracy: stats.mean_accuracy,
            top_wpm: stats.top_wpm,
            tests_finished: stats.tests_finished,
        }
    }

    pub fn history(&self, user_id: &str) -> Result<Vec<TestResult>> {
        self.store.list_test_results(user_id)
    }

    /// Statistics plus the `limit` most recent results, newest first.
    pub fn profile(&self, user_id: &str, limit: usize) -> Result<Profile> {
        let stats = self
            .statistics(user_id)?
            .unwrap_or_else(|| UserStatistics::empty(user_id));
        let recent_results = self.history(user_id)?.into_iter().rev().take(limit).collect();
        Ok(Profile {
            stats,
            recent_results,
        })
    }

    pub fn purge_user(&self, user_id: &str) -> Result<()> {
        self.store.purge_user(user_id)
    }
}
