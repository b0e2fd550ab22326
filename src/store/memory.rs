use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{Result, anyhow};

use crate::engine::statistics::UserStatistics;
use crate::session::result::TestResult;
use crate::store::DocumentStore;
use crate::store::schema::TestDefinition;

#[derive(Default)]
struct Collections {
    tests: Vec<TestDefinition>,
    results: Vec<TestResult>,
    statistics: HashMap<String, UserStatistics>,
}

/// In-process store; nothing survives the process.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Collections>> {
        self.data.read().map_err(|_| anyhow!("memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Collections>> {
        self.data.write().map_err(|_| anyhow!("memory store lock poisoned"))
    }
}

impl DocumentStore for MemoryStore {
    fn save_test_result(&self, result: &TestResult) -> Result<()> {
        self.write()?.results.push(result.clone());
        Ok(())
    }

    fn list_test_results(&self, user_id: &str) -> Result<Vec<TestResult>> {
        let mut results: Vec<TestResult> = self
            .read()?
            .results
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        results.sort_by_key(|r| r.completed_at);
        Ok(results)
    }

    fn get_user_statistics(&self, user_id: &str) -> Result<Option<UserStatistics>> {
        Ok(self.read()?.statistics.get(user_id).cloned())
    }

    fn save_user_statistics(&self, user_id: &str, stats: &UserStatistics) -> Result<()> {
        self.write()?
            .statistics
            .insert(user_id.to_string(), stats.clone());
        Ok(())
    }

    fn save_test(&self, test: &TestDefinition) -> Result<()> {
        let mut data = self.write()?;
        data.tests.retain(|t| t.id != test.id);
        data.tests.push(test.clone());
        Ok(())
    }

    fn list_tests(&self) -> Result<Vec<TestDefinition>> {
        Ok(self.read()?.tests.clone())
    }

    fn get_test(&self, id: &str) -> Result<Option<TestDefinition>> {
        Ok(self.read()?.tests.iter().find(|t| t.id == id).cloned())
    }

    fn purge_user(&self, user_id: &str) -> Result<()> {
        let mut data = self.write()?;
        data.statistics.remove(user_id);
        data.results.retain(|r| r.user_id != user_id);
        Ok(())
    }
}
