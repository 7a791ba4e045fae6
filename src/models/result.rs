// src/models/result.rs

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{error::AppError, utils::clock::timestamp};

/// One learner's scored submission against one test.
/// Created once and never mutated; removed only when its test is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct TestResult {
    pub student_name: String,

    /// Identity key for the duplicate guard: the account handle or `id_<id>`.
    #[validate(length(min = 1))]
    pub username: String,

    #[validate(length(min = 1))]
    pub test_id: String,

    pub correct_count: usize,
    pub incorrect_count: usize,

    /// Submission time. The calendar day drives the duplicate guard.
    #[serde(with = "timestamp")]
    pub date: NaiveDateTime,
}

impl TestResult {
    pub fn new(
        student_name: impl Into<String>,
        username: impl Into<String>,
        test_id: impl Into<String>,
        correct_count: usize,
        incorrect_count: usize,
        date: NaiveDateTime,
    ) -> Result<Self, AppError> {
        let result = Self {
            student_name: student_name.into(),
            username: username.into(),
            test_id: test_id.into(),
            correct_count,
            incorrect_count,
            date,
        };
        result.validate()?;
        Ok(result)
    }

    /// Whether this result blocks another submission by `username` for
    /// `test_id` on `day`.
    pub fn blocks(&self, username: &str, test_id: &str, day: NaiveDate) -> bool {
        self.username == username && self.test_id == test_id && self.date.date() == day
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(raw: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(raw, timestamp::FORMAT).unwrap()
    }

    #[test]
    fn test_blocks_same_day_only() {
        let result = TestResult::new("Ann", "ann", "T1", 3, 1, at("2024-02-02 23:59:59")).unwrap();
        let same_day = at("2024-02-02 00:00:01").date();
        let next_day = at("2024-02-03 00:00:00").date();

        assert!(result.blocks("ann", "T1", same_day));
        assert!(!result.blocks("ann", "T1", next_day));
        assert!(!result.blocks("bob", "T1", same_day));
        assert!(!result.blocks("ann", "T2", same_day));
    }

    #[test]
    fn test_new_requires_identity() {
        let now = at("2024-02-02 10:00:00");
        assert!(TestResult::new("Ann", "", "T1", 0, 0, now).is_err());
        assert!(TestResult::new("Ann", "ann", "", 0, 0, now).is_err());
    }
}
