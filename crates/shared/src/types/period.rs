//! Reporting periods for history and finance queries.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Days on either side of "now" covered by [`Period::default_window`].
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Errors raised when building a [`Period`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodError {
    /// The start of the period lies after its end.
    #[error("Period start {from} is after its end {to}")]
    Inverted {
        /// Requested start.
        from: DateTime<Utc>,
        /// Requested end.
        to: DateTime<Utc>,
    },
}

/// A half-open time range `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

impl Period {
    /// Creates a period, rejecting `from > to`. An empty period (`from == to`)
    /// is allowed and matches nothing.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self, PeriodError> {
        if from > to {
            return Err(PeriodError::Inverted { from, to });
        }
        Ok(Self { from, to })
    }

    /// The window of [`DEFAULT_WINDOW_DAYS`] either side of `now`.
    #[must_use]
    pub fn around(now: DateTime<Utc>) -> Self {
        let span = Duration::days(DEFAULT_WINDOW_DAYS);
        Self {
            from: now - span,
            to: now + span,
        }
    }

    /// The default query window, centred on the current time.
    #[must_use]
    pub fn default_window() -> Self {
        Self::around(Utc::now())
    }

    /// Builds a period from optional bounds, filling gaps from the default
    /// window around `now`.
    pub fn from_bounds(
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Self, PeriodError> {
        let window = Self::around(now);
        Self::new(from.unwrap_or(window.from), to.unwrap_or(window.to))
    }

    /// Inclusive start.
    #[must_use]
    pub const fn from(&self) -> DateTime<Utc> {
        self.from
    }

    /// Exclusive end.
    #[must_use]
    pub const fn to(&self) -> DateTime<Utc> {
        self.to
    }

    /// Returns true if `at` falls within `[from, to)`.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from <= at && at < self.to
    }
}
