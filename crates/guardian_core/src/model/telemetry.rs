//! Behavioral telemetry samples and their derived cognitive indices.
//!
//! # Responsibility
//! - Define the hourly raw sample shape and the auxiliary scoring inputs.
//! - Define the bounded index tuple and the ordinal burnout phase.
//!
//! # Invariants
//! - A sample is unique per `(user_id, date, hour)` and never mutated.
//! - `hour` is within `0..=23`; every metric is finite.
//! - Every `CognitiveIndices` field produced by `scoring` is within `[0, 100]`.

use crate::model::user::UserId;
use crate::model::{ensure_finite, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One pre-sampled hour of behavioral readings for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub user_id: UserId,
    pub date: NaiveDate,
    /// Hour of day, `0..=23`.
    pub hour: u8,
    pub keys_per_minute: f64,
    /// Pointer travel during the hour, in pixels.
    pub mouse_distance: f64,
    pub idle_minutes: f64,
    /// Correction keystrokes relative to total keystrokes.
    pub backspace_rate: f64,
    /// Application/context switches per minute.
    pub task_switch_rate: f64,
}

impl TelemetrySample {
    /// Creates a sample with all metrics set to zero.
    pub fn new(user_id: UserId, date: NaiveDate, hour: u8) -> Self {
        Self {
            user_id,
            date,
            hour,
            keys_per_minute: 0.0,
            mouse_distance: 0.0,
            idle_minutes: 0.0,
            backspace_rate: 0.0,
            task_switch_rate: 0.0,
        }
    }

    /// Validates sample shape.
    ///
    /// Negative metrics are accepted; index functions clamp their output.
    /// Non-finite metrics are rejected because they cannot be persisted.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.hour > 23 {
            return Err(ValidationError::HourOutOfRange(self.hour));
        }
        ensure_finite("keys_per_minute", self.keys_per_minute)?;
        ensure_finite("mouse_distance", self.mouse_distance)?;
        ensure_finite("idle_minutes", self.idle_minutes)?;
        ensure_finite("backspace_rate", self.backspace_rate)?;
        ensure_finite("task_switch_rate", self.task_switch_rate)?;
        Ok(())
    }

    /// Ordering key used by latest/history queries.
    pub fn slot(&self) -> (NaiveDate, u8) {
        (self.date, self.hour)
    }
}

/// Auxiliary scoring inputs that are not part of the raw sample.
///
/// All fields default to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringContext {
    /// Fraction of the hour overlapped by meetings.
    pub meeting_overlap: f64,
    /// Stability volatility measured by the sampling collaborator.
    pub volatility: f64,
    /// Hours of deviation from the user's sleep baseline.
    pub sleep_deviation: f64,
    /// Recovery headroom; negative values express a recovery deficit.
    pub recovery_ratio: f64,
}

impl ScoringContext {
    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_finite("meeting_overlap", self.meeting_overlap)?;
        ensure_finite("volatility", self.volatility)?;
        ensure_finite("sleep_deviation", self.sleep_deviation)?;
        ensure_finite("recovery_ratio", self.recovery_ratio)?;
        Ok(())
    }
}

/// Four bounded indices derived from one sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CognitiveIndices {
    pub fragmentation: f64,
    pub latent_stress: f64,
    pub adaptive_capacity: f64,
    pub neural_load: f64,
}

/// Ordinal burnout phase, `1..=4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BurnoutPhase {
    SilentAccumulation = 1,
    FunctionalOverdrive = 2,
    VolatilityEscalation = 3,
    CollapseRisk = 4,
}

impl BurnoutPhase {
    pub const ALL: [BurnoutPhase; 4] = [
        Self::SilentAccumulation,
        Self::FunctionalOverdrive,
        Self::VolatilityEscalation,
        Self::CollapseRisk,
    ];

    /// Ordinal value in `1..=4`.
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::SilentAccumulation),
            2 => Some(Self::FunctionalOverdrive),
            3 => Some(Self::VolatilityEscalation),
            4 => Some(Self::CollapseRisk),
            _ => None,
        }
    }

    /// Human-readable phase name.
    pub fn label(self) -> &'static str {
        match self {
            Self::SilentAccumulation => "Silent Accumulation",
            Self::FunctionalOverdrive => "Functional Overdrive",
            Self::VolatilityEscalation => "Volatility Escalation",
            Self::CollapseRisk => "Collapse Risk",
        }
    }

    /// One-line explanation shown next to the phase.
    pub fn description(self) -> &'static str {
        match self {
            Self::SilentAccumulation => "Stability is good, but micro-stress is gathering.",
            Self::FunctionalOverdrive => "High performance maintained via high effort.",
            Self::VolatilityEscalation => "Frequent stability spikes; recovery slowing down.",
            Self::CollapseRisk => "Critical neural load; high probability of performance drop.",
        }
    }
}

/// A stored sample together with its cached indices and read-through phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryPoint {
    pub sample: TelemetrySample,
    pub indices: CognitiveIndices,
    pub phase: BurnoutPhase,
}

#[cfg(test)]
mod tests {
    use super::{BurnoutPhase, ScoringContext, TelemetrySample};
    use crate::model::ValidationError;
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).expect("valid date")
    }

    #[test]
    fn validate_rejects_hour_past_23() {
        let sample = TelemetrySample::new(1, day(), 24);
        assert_eq!(sample.validate(), Err(ValidationError::HourOutOfRange(24)));
    }

    #[test]
    fn validate_accepts_negative_but_rejects_nan() {
        let mut sample = TelemetrySample::new(1, day(), 9);
        sample.backspace_rate = -5.0;
        assert!(sample.validate().is_ok());

        sample.keys_per_minute = f64::NAN;
        assert_eq!(
            sample.validate(),
            Err(ValidationError::NonFiniteValue("keys_per_minute"))
        );
    }

    #[test]
    fn context_rejects_infinite_volatility() {
        let context = ScoringContext {
            volatility: f64::INFINITY,
            ..ScoringContext::default()
        };
        assert!(context.validate().is_err());
    }

    #[test]
    fn phase_ordinals_roundtrip_and_order() {
        for phase in BurnoutPhase::ALL {
            assert_eq!(BurnoutPhase::from_ordinal(phase.ordinal()), Some(phase));
        }
        assert_eq!(BurnoutPhase::from_ordinal(0), None);
        assert!(BurnoutPhase::CollapseRisk > BurnoutPhase::VolatilityEscalation);
    }
}
