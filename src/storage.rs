// src/storage.rs

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    error::AppError,
    models::{result::TestResult, test::Test},
};

/// Everything that is persisted: tests and results in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreRoot {
    #[serde(default)]
    pub tests: Vec<Test>,
    #[serde(default)]
    pub results: Vec<TestResult>,
}

impl StoreRoot {
    pub fn find_test(&self, test_id: &str) -> Option<&Test> {
        self.tests.iter().find(|t| t.test_id == test_id)
    }

    /// Removes any test with the same id, then appends `test`.
    /// Results for that id are kept.
    pub fn replace_test(&mut self, test: Test) {
        self.tests.retain(|t| t.test_id != test.test_id);
        self.tests.push(test);
    }

    /// Removes the test and every result that references it.
    pub fn remove_test(&mut self, test_id: &str) -> Option<Test> {
        let index = self.tests.iter().position(|t| t.test_id == test_id)?;
        let removed = self.tests.remove(index);
        self.results.retain(|r| r.test_id != test_id);
        Some(removed)
    }

    pub fn results_for(&self, test_id: &str) -> Vec<TestResult> {
        self.results
            .iter()
            .filter(|r| r.test_id == test_id)
            .cloned()
            .collect()
    }

    pub fn has_submission(&self, username: &str, test_id: &str, day: NaiveDate) -> bool {
        self.results.iter().any(|r| r.blocks(username, test_id, day))
    }

    /// Tests newest first; equal timestamps keep insertion order.
    pub fn tests_by_newest(&self) -> Vec<Test> {
        let mut tests = self.tests.clone();
        tests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tests
    }
}

/// JSON document store with whole-file rewrites.
///
/// Every mutation goes through [`JsonStore::update`], which holds the write
/// lock across load, mutate and save. Writes land in a temporary file that is
/// renamed over the document, so readers always see a complete snapshot.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the persisted root, or an empty one if the file is missing or
    /// unreadable. Failures are logged, never returned.
    ///
    /// Records are taken as stored. Id rules apply only when a test is
    /// authored, so older documents survive the next rewrite untouched.
    pub async fn load(&self) -> StoreRoot {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return StoreRoot::default(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Failed to read store ({}). Starting empty.", e);
                return StoreRoot::default();
            }
        };

        match serde_json::from_slice::<StoreRoot>(&bytes) {
            Ok(root) => root,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Failed to parse store ({}). Starting empty.", e);
                StoreRoot::default()
            }
        }
    }

    /// Overwrites the persisted document with `root`.
    pub async fn save(&self, root: &StoreRoot) -> Result<(), AppError> {
        self.write(root).await.map_err(|e| {
            tracing::error!(path = %self.path.display(), "Failed to save store: {}", e);
            e
        })
    }

    async fn write(&self, root: &StoreRoot) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(root)?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Runs `f` against the current root as one critical section.
    ///
    /// The root is saved only if `f` succeeds; an error from `f` leaves the
    /// persisted document untouched.
    pub async fn update<T, F>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut StoreRoot) -> Result<T, AppError>,
    {
        let _guard = self.write_lock.lock().await;
        let mut root = self.load().await;
        let value = f(&mut root)?;
        self.save(&root).await?;
        Ok(value)
    }
}
