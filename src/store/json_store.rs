use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result, anyhow};
use serde::{Serialize, de::DeserializeOwned};

use crate::engine::statistics::UserStatistics;
use crate::session::result::TestResult;
use crate::store::DocumentStore;
use crate::store::schema::{ResultsData, StatisticsData, TestDefinition, TestsData};

const TESTS_FILE: &str = "tests.json";
const RESULTS_FILE: &str = "results.json";
const STATISTICS_FILE: &str = "statistics.json";

/// One JSON file per collection under `base_dir`.
pub struct JsonStore {
    base_dir: PathBuf,
    // Every collection file is rewritten whole, so read-modify-write
    // cycles must not interleave.
    io: Mutex<()>,
}

impl JsonStore {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("typecoach");
        Self::with_base_dir(base_dir)
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            io: Mutex::new(()),
        })
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.io.lock().map_err(|_| anyhow!("json store lock poisoned"))
    }

    /// A missing file loads as an empty collection. A file that exists but
    /// cannot be read or parsed is an error; callers must not write over it.
    fn load<T: DeserializeOwned + Default>(&self, name: &str) -> Result<T> {
        let path = self.file_path(name);
        if !path.exists() {
            return Ok(T::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let path = self.file_path(name);
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}

impl DocumentStore for JsonStore {
    fn save_test_result(&self, result: &TestResult) -> Result<()> {
        let _guard = self.lock()?;
        let mut data: ResultsData = self.load(RESULTS_FILE)?;
        data.results.push(result.clone());
        self.save(RESULTS_FILE, &data)
    }

    fn list_test_results(&self, user_id: &str) -> Result<Vec<TestResult>> {
        let _guard = self.lock()?;
        let data: ResultsData = self.load(RESULTS_FILE)?;
        let mut results: Vec<TestResult> = data
            .results
            .into_iter()
            .filter(|r| r.user_id == user_id)
            .collect();
        results.sort_by_key(|r| r.completed_at);
        Ok(results)
    }

    fn get_user_statistics(&self, user_id: &str) -> Result<Option<UserStatistics>> {
        let _guard = self.lock()?;
        let data: StatisticsData = self.load(STATISTICS_FILE)?;
        Ok(data.statistics.into_iter().find(|s| s.user_id == user_id))
    }

    fn save_user_statistics(&self, user_id: &str, stats: &UserStatistics) -> Result<()> {
        let _guard = self.lock()?;
        let mut data: StatisticsData = self.load(STATISTICS_FILE)?;
        data.statistics.retain(|s| s.user_id != user_id);
        data.statistics.push(stats.clone());
        self.save(STATISTICS_FILE, &data)
    }

    fn save_test(&self, test: &TestDefinition) -> Result<()> {
        let _guard = self.lock()?;
        let mut data: TestsData = self.load(TESTS_FILE)?;
        data.tests.retain(|t| t.id != test.id);
        data.tests.push(test.clone());
        self.save(TESTS_FILE, &data)
    }

    fn list_tests(&self) -> Result<Vec<TestDefinition>> {
        let _guard = self.lock()?;
        let data: TestsData = self.load(TESTS_FILE)?;
        Ok(data.tests)
    }

    fn get_test(&self, id: &str) -> Result<Option<TestDefinition>> {
        let _guard = self.lock()?;
        let data: TestsData = self.load(TESTS_FILE)?;
        Ok(data.tests.into_iter().find(|t| t.id == id))
    }

    fn purge_user(&self, user_id: &str) -> Result<()> {
        let _guard = self.lock()?;
        // Both files must parse before either is rewritten.
        let mut stats: StatisticsData = self.load(STATISTICS_FILE)?;
        let mut results: ResultsData = self.load(RESULTS_FILE)?;

        stats.statistics.retain(|s| s.user_id != user_id);
        self.save(STATISTICS_FILE, &stats)?;
        results.results.retain(|r| r.user_id != user_id);
        self.save(RESULTS_FILE, &results)
    }
}
