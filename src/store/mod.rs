pub mod json_store;
pub mod memory;
pub mod schema;

use anyhow::Result;

use crate::engine::statistics::UserStatistics;
use crate::session::result::TestResult;
use crate::store::schema::TestDefinition;

/// Persistence for tests, results and statistics. Implementations must be
/// safe to call from the background persistence threads.
pub trait DocumentStore: Send + Sync {
    /// Fresh document id.
    fn allocate_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }

    fn save_test_result(&self, result: &TestResult) -> Result<()>;

    /// A user's results, oldest first.
    fn list_test_results(&self, user_id: &str) -> Result<Vec<TestResult>>;

    fn get_user_statistics(&self, user_id: &str) -> Result<Option<UserStatistics>>;

    fn save_user_statistics(&self, user_id: &str, stats: &UserStatistics) -> Result<()>;

    fn save_test(&self, test: &TestDefinition) -> Result<()>;

    fn list_tests(&self) -> Result<Vec<TestDefinition>>;

    fn get_test(&self, id: &str) -> Result<Option<TestDefinition>>;

    /// Drop a user's statistics and results.
    fn purge_user(&self, user_id: &str) -> Result<()>;
}
