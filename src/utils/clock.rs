// src/utils/clock.rs

use chrono::{Local, NaiveDateTime, SubsecRound};

/// Source of "now" for timestamps and the same-day duplicate check.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall clock, truncated to whole seconds to match the stored format.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local().trunc_subsecs(0)
    }
}

/// Serde adapter for `YYYY-MM-DD HH:MM:SS` timestamps.
pub mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}
