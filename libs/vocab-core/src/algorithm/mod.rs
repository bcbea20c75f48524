//! Spaced repetition scheduling.

pub mod sm2;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use sm2::compute_next_review;

/// Scheduling state produced by one review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingResult {
    pub interval: i64,
    pub repetition: i64,
    pub efactor: f64,
    pub next_review_at: DateTime<Utc>,
}
