//! Persists completed sessions in the background: the immutable test result
//! and the user's statistics fold run on their own threads and may finish
//! in any order relative to each other and to the next session.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::engine::scoring::Score;
use crate::engine::statistics::{StatsUpdate, apply_result};
use crate::notify::Notifier;
use crate::session::result::TestResult;
use crate::session::state::SessionState;
use crate::store::DocumentStore;

/// A background write that failed. The completed session is unaffected.
#[derive(Clone, Debug, PartialEq)]
pub enum CompletionWarning {
    ResultNotSaved(String),
    StatisticsNotUpdated(String),
}

impl fmt::Display for CompletionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionWarning::ResultNotSaved(e) => write!(f, "test result was not saved: {e}"),
            CompletionWarning::StatisticsNotUpdated(e) => {
                write!(f, "statistics were not updated: {e}")
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct CompletionReport {
    pub result: Option<TestResult>,
    pub stats: Option<StatsUpdate>,
    pub warnings: Vec<CompletionWarning>,
}

/// Handles to the two background writes. Dropping it detaches them.
pub struct PendingCompletion {
    pub result: TestResult,
    result_write: JoinHandle<Result<()>>,
    stats_write: JoinHandle<Result<StatsUpdate>>,
}

impl PendingCompletion {
    pub fn is_finished(&self) -> bool {
        self.result_write.is_finished() && self.stats_write.is_finished()
    }

    /// Block until both writes finish and collect their outcomes.
    pub fn wait(self) -> CompletionReport {
        let mut report = CompletionReport::default();

        match join(self.result_write) {
            Ok(()) => report.result = Some(self.result),
            Err(e) => report
                .warnings
                .push(CompletionWarning::ResultNotSaved(e.to_string())),
        }
        match join(self.stats_write) {
            Ok(update) => report.stats = Some(update),
            Err(e) => report
                .warnings
                .push(CompletionWarning::StatisticsNotUpdated(e.to_string())),
        }
        report
    }
}

fn join<T>(handle: JoinHandle<Result<T>>) -> Result<T> {
    handle
        .join()
        .map_err(|_| anyhow!("background writer panicked"))?
}

pub struct ResultRecorder {
    store: Arc<dyn DocumentStore>,
    notifier: Arc<dyn Notifier>,
    user_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ResultRecorder {
    pub fn new(store: Arc<dyn DocumentStore>, notifier: Arc<dyn Notifier>) -> Arc<Self> {
        Arc::new(Self {
            store,
            notifier,
            user_locks: Mutex::new(HashMap::new()),
        })
    }

    /// Start both writes for a completed session and return immediately.
    pub fn record(
        self: &Arc<Self>,
        state: &SessionState,
        score: &Score,
        completed_at: DateTime<Utc>,
    ) -> PendingCompletion {
        let result = TestResult::from_session(self.store.allocate_id(), state, score, completed_at);
        info!(
            user_id = %result.user_id,
            test_id = %result.test_id,
            wpm = result.wpm,
            accuracy = result.accuracy,
            passed = result.passed,
            "session completed"
        );

        let store = Arc::clone(&self.store);
        let to_save = result.clone();
        let result_write = thread::spawn(move || {
            store.save_test_result(&to_save).inspect_err(|e| {
                warn!(result_id = %to_save.id, "failed to save test result: {e:#}");
            })
        });

        let recorder = Arc::clone(self);
        let user_id = result.user_id.clone();
        let (wpm, accuracy) = (score.wpm, score.accuracy);
        let stats_write = thread::spawn(move || {
            recorder
                .update_statistics(&user_id, wpm, accuracy)
                .inspect_err(|e| {
                    warn!(user_id = %user_id, "failed to update statistics: {e:#}");
                })
        });

        PendingCompletion {
            result,
            result_write,
            stats_write,
        }
    }

    /// Fold one score into the user's statistics as a single read-modify-write
    /// under that user's lock. A failed read counts as "no record yet".
    ///
    /// The lock only covers this process: two processes sharing one store can
    /// still interleave their updates.
    pub fn update_statistics(&self, user_id: &str, wpm: f64, accuracy: f64) -> Result<StatsUpdate> {
        let lock = self.user_lock(user_id)?;
        let outcome = {
            let _guard = lock.lock().map_err(|_| anyhow!("statistics lock poisoned"))?;
            self.fold_and_save(user_id, wpm, accuracy)
        };
        self.release_user_lock(user_id, lock);
        outcome
    }

    fn fold_and_save(&self, user_id: &str, wpm: f64, accuracy: f64) -> Result<StatsUpdate> {
        let existing = self.store.get_user_statistics(user_id).unwrap_or_else(|e| {
            warn!(user_id, "statistics fetch failed, starting a new record: {e:#}");
            None
        });
        let update = apply_result(user_id, existing.as_ref(), wpm, accuracy);
        self.store.save_user_statistics(user_id, &update.stats)?;
        debug!(
            user_id,
            tests_finished = update.stats.tests_finished,
            mean_wpm = update.stats.mean_wpm,
            "statistics updated"
        );

        if update.new_top_wpm {
            self.notifier.notify_new_top_wpm(user_id, update.stats.top_wpm);
        }
        if let Some(count) = update.milestone {
            self.notifier.notify_milestone(user_id, count);
        }
        Ok(update)
    }

    fn user_lock(&self, user_id: &str) -> Result<Arc<Mutex<()>>> {
        let mut locks = self
            .user_locks
            .lock()
            .map_err(|_| anyhow!("statistics lock table poisoned"))?;
        Ok(Arc::clone(locks.entry(user_id.to_string()).or_default()))
    }

    /// Drop the table entry once no other update holds it. Handles are only
    /// cloned under the table lock, so the count cannot grow while we look.
    fn release_user_lock(&self, user_id: &str, lock: Arc<Mutex<()>>) {
        let Ok(mut locks) = self.user_locks.lock() else {
            return;
        };
        if Arc::strong_count(&lock) == 2 {
            locks.remove(user_id);
        }
    }

    #[cfg(test)]
    fn tracked_users(&self) -> usize {
        self.user_locks.lock().map(|l| l.len()).unwrap_or(0)
    }
}
