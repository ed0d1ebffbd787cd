//! Daily wellness self-report.

use crate::model::{ensure_non_negative, ValidationError};
use serde::{Deserialize, Serialize};

/// Morning check-in submitted by one user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WellnessReport {
    pub sleep_hours: f64,
    /// Self-rated mood, `1..=5`.
    pub mood: u8,
    #[serde(default)]
    pub caffeine_cups: u8,
}

impl WellnessReport {
    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_non_negative("sleep_hours", self.sleep_hours)?;
        if !(1..=5).contains(&self.mood) {
            return Err(ValidationError::MoodOutOfRange(self.mood));
        }
        Ok(())
    }
}
