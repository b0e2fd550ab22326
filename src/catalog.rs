//! Custom and timed test definitions, backed by the document store with a
//! local cache in front. Cached entries win over store copies with the same
//! id; a store read never overwrites a cached entry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use tracing::{debug, info};

use crate::error::CoreError;
use crate::generator::selection::split_words;
use crate::session::clock::Clock;
use crate::store::DocumentStore;
use crate::store::schema::TestDefinition;

/// Limits typed into the custom test form, already validated.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TestSettings {
    pub time_limit_secs: Option<u32>,
    pub min_accuracy: Option<f64>,
}

impl TestSettings {
    /// Parse raw form fields. Blank fields mean "none"; zero means "none" too.
    pub fn parse(time_limit: &str, min_accuracy: &str) -> Result<Self, CoreError> {
        let time_limit_secs = match time_limit.trim() {
            "" => None,
            raw => {
                let secs: f64 = raw
                    .parse()
                    .map_err(|_| CoreError::invalid(format!("time limit '{raw}' is not a number")))?;
                if !secs.is_finite() || secs < 0.0 {
                    return Err(CoreError::invalid(format!("time limit '{raw}' is negative")));
                }
                let secs = secs.round() as u32;
                (secs > 0).then_some(secs)
            }
        };

        let min_accuracy = match min_accuracy.trim() {
            "" => None,
            raw => {
                let min: f64 = raw.parse().map_err(|_| {
                    CoreError::invalid(format!("minimum accuracy '{raw}' is not a number"))
                })?;
                if !(0.0..=100.0).contains(&min) {
                    return Err(CoreError::invalid(format!(
                        "minimum accuracy {min} is outside 0..=100"
                    )));
                }
                (min > 0.0).then_some(min)
            }
        };

        Ok(Self {
            time_limit_secs,
            min_accuracy,
        })
    }
}

pub struct TestCatalog {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    cache: Mutex<HashMap<String, TestDefinition>>,
}

impl TestCatalog {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn create_test(
        &self,
        text: &str,
        settings: TestSettings,
        user_id: &str,
    ) -> Result<TestDefinition> {
        let words = split_words(text);
        if words.is_empty() {
            return Err(CoreError::invalid("test text has no words").into());
        }

        let test = TestDefinition {
            id: self.store.allocate_id(),
            owner_user_id: user_id.to_string(),
            text: words.join(" "),
            min_accuracy: settings.min_accuracy.unwrap_or(0.0),
            time_limit_secs: settings.time_limit_secs.unwrap_or(0),
            created_at: self.clock.now(),
        };
        self.store.save_test(&test)?;
        self.cache_insert(test.clone())?;
        info!(test_id = %test.id, user_id, words = words.len(), "created test");
        Ok(test)
    }

    /// Cached tests merged with the store's, unique by id, cached first.
    pub fn list_tests(&self) -> Result<Vec<TestDefinition>> {
        let remote = self.store.list_tests()?;
        let cache = self.cache.lock().map_err(|_| anyhow!("test cache poisoned"))?;

        let mut merged: Vec<TestDefinition> = cache.values().cloned().collect();
        merged.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        for test in remote {
            if !cache.contains_key(&test.id) && !merged.iter().any(|t| t.id == test.id) {
                merged.push(test);
            }
        }
        Ok(merged)
    }

    pub fn get_test_by_id(&self, id: &str) -> Result<TestDefinition> {
        if let Some(test) = self
            .cache
            .lock()
            .map_err(|_| anyhow!("test cache poisoned"))?
            .get(id)
        {
            return Ok(test.clone());
        }

        debug!(test_id = id, "test cache miss");
        let test = self
            .store
            .get_test(id)?
            .ok_or_else(|| CoreError::test_not_found(id))?;
        self.cache_insert(test.clone())?;
        Ok(test)
    }

    /// Forget cached entries so the next read goes to the store.
    pub fn invalidate(&self) -> Result<()> {
        self.cache
            .lock()
            .map_err(|_| anyhow!("test cache poisoned"))?
            .clear();
        Ok(())
    }

    fn cache_insert(&self, test: TestDefinition) -> Result<()> {
        self.cache
            .lock()
            .map_err(|_| anyhow!("test cache poisoned"))?
            .entry(test.id.clone())
            .or_insert(test);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::clock::ManualClock;
    use crate::store::memory::MemoryStore;

    fn catalog() -> (Arc<MemoryStore>, TestCatalog) {
        let store = Arc::new(MemoryStore::new());
        let catalog = TestCatalog::new(store.clone(), Arc::new(ManualClock::default()));
        (store, catalog)
    }

    #[test]
    fn parse_blank_and_zero_mean_none() {
        assert_eq!(TestSettings::parse("", " ").unwrap(), TestSettings::default());
        assert_eq!(TestSettings::parse("0", "0").unwrap(), TestSettings::default());
        let settings = TestSettings::parse("45", "80.5").unwrap();
        assert_eq!(settings.time_limit_secs, Some(45));
        assert_eq!(settings.min_accuracy, Some(80.5));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(TestSettings::parse("soon", "").is_err());
        assert!(TestSettings::parse("-5", "").is_err());
        assert!(TestSettings::parse("", "150").is_err());
        assert!(TestSettings::parse("", "high").is_err());
    }

    #[test]
    fn create_normalizes_text_and_persists() {
        let (store, catalog) = catalog();
        let test = catalog
            .create_test("  a   quick\tfox ", TestSettings::default(), "u1")
            .unwrap();
        assert_eq!(test.text, "a quick fox");
        assert_eq!(test.owner_user_id, "u1");
        assert_eq!(store.get_test(&test.id).unwrap(), Some(test));
    }

    #[test]
    fn create_rejects_blank_text() {
        let (_store, catalog) = catalog();
        let err = catalog
            .create_test("   ", TestSettings::default(), "u1")
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn local_entry_wins_on_conflict() {
        let (store, catalog) = catalog();
        let test = catalog
            .create_test("local words", TestSettings::default(), "u1")
            .unwrap();
        let mut stale = test.clone();
        stale.text = "remote words".into();
        store.save_test(&stale).unwrap();

        let listed = catalog.list_tests().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].text, "local words");
        assert_eq!(catalog.get_test_by_id(&test.id).unwrap().text, "local words");

        catalog.invalidate().unwrap();
        assert_eq!(catalog.get_test_by_id(&test.id).unwrap().text, "remote words");
    }

    #[test]
    fn store_only_tests_are_listed_and_fetched() {
        let (store, catalog) = catalog();
        let remote = TestDefinition {
            id: "remote".into(),
            owner_user_id: "u2".into(),
            text: "x y".into(),
            min_accuracy: 0.0,
            time_limit_secs: 0,
            created_at: chrono::Utc::now(),
        };
        store.save_test(&remote).unwrap();

        assert_eq!(catalog.list_tests().unwrap(), vec![remote.clone()]);
        assert_eq!(catalog.get_test_by_id("remote").unwrap(), remote);
        let err = catalog.get_test_by_id("nope").unwrap_err();
        assert_eq!(
            err.downcast_ref::<CoreError>(),
            Some(&CoreError::test_not_found("nope"))
        );
    }
}
