use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::statistics::UserStatistics;
use crate::generator::selection::split_words;
use crate::session::result::TestResult;

pub const SCHEMA_VERSION: u32 = 1;

/// A stored custom or timed test.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestDefinition {
    pub id: String,
    pub owner_user_id: String,
    pub text: String,
    /// 0 means no pass threshold.
    #[serde(default)]
    pub min_accuracy: f64,
    /// 0 means untimed.
    #[serde(default)]
    pub time_limit_secs: u32,
    pub created_at: DateTime<Utc>,
}

impl TestDefinition {
    pub fn words(&self) -> Vec<String> {
        split_words(&self.text)
    }

    pub fn time_limit(&self) -> Option<u32> {
        (self.time_limit_secs > 0).then_some(self.time_limit_secs)
    }

    pub fn min_accuracy(&self) -> Option<f64> {
        (self.min_accuracy > 0.0).then_some(self.min_accuracy)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestsData {
    pub schema_version: u32,
    pub tests: Vec<TestDefinition>,
}

impl Default for TestsData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            tests: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResultsData {
    pub schema_version: u32,
    pub results: Vec<TestResult>,
}

impl Default for ResultsData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            results: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatisticsData {
    pub schema_version: u32,
    pub statistics: Vec<UserStatistics>,
}

impl Default for StatisticsData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            statistics: Vec::new(),
        }
    }
}
