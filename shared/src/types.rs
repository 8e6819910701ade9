//! Common types used across the platform

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Source of "today" for time-derived batch state
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Clock backed by the system time (UTC calendar date)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Clock pinned to a single date
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Optional reference date for reads and sweeps
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AsOfQuery {
    pub as_of: Option<NaiveDate>,
}

impl AsOfQuery {
    /// Resolve to the requested date or the clock's today
    pub fn resolve(&self, clock: &dyn Clock) -> NaiveDate {
        self.as_of.unwrap_or_else(|| clock.today())
    }
}
