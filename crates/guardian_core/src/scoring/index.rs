//! Cognitive index calculator.
//!
//! Inputs are permissive (negative or huge values are accepted); outputs are
//! strict (clamped to `[0, 100]`).

use crate::model::telemetry::{CognitiveIndices, ScoringContext, TelemetrySample};

const SCORE_MIN: f64 = 0.0;
const SCORE_MAX: f64 = 100.0;

/// Attention-switching cost.
///
/// Formula: `task_switch_rate * 40 + backspace_rate * 0.5 + meeting_overlap * 20`
pub fn fragmentation(task_switch_rate: f64, backspace_rate: f64, meeting_overlap: f64) -> f64 {
    clamp_score(task_switch_rate * 40.0 + backspace_rate * 0.5 + meeting_overlap * 20.0)
}

/// Accumulated micro-stress.
///
/// Formula: `volatility * 1.5 + sleep_deviation * 10`
pub fn latent_stress(volatility: f64, sleep_deviation: f64) -> f64 {
    clamp_score(volatility * 1.5 + sleep_deviation * 10.0)
}

/// Recovery headroom, inversely related to sustained stress.
///
/// Formula: `100 - current_stress * 0.5 + recovery_ratio * 20`
pub fn adaptive_capacity(current_stress: f64, recovery_ratio: f64) -> f64 {
    clamp_score(100.0 - current_stress * 0.5 + recovery_ratio * 20.0)
}

/// Typing intensity blended with fragmentation and stress.
///
/// Formula: `keys_per_minute / 2 + fragmentation * 0.3 + stress * 0.2`
pub fn neural_load(keys_per_minute: f64, fragmentation: f64, stress: f64) -> f64 {
    clamp_score(keys_per_minute / 2.0 + fragmentation * 0.3 + stress * 0.2)
}

/// Computes all four indices for one sample.
///
/// Latent stress feeds both adaptive capacity and neural load.
pub fn compute_indices(sample: &TelemetrySample, context: &ScoringContext) -> CognitiveIndices {
    let fragmentation = fragmentation(
        sample.task_switch_rate,
        sample.backspace_rate,
        context.meeting_overlap,
    );
    let latent_stress = latent_stress(context.volatility, context.sleep_deviation);
    let adaptive_capacity = adaptive_capacity(latent_stress, context.recovery_ratio);
    let neural_load = neural_load(sample.keys_per_minute, fragmentation, latent_stress);

    CognitiveIndices {
        fragmentation,
        latent_stress,
        adaptive_capacity,
        neural_load,
    }
}

// NaN (e.g. `inf - inf`) maps to the floor so the output bound holds.
fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        return SCORE_MIN;
    }
    value.clamp(SCORE_MIN, SCORE_MAX)
}

#[cfg(test)]
mod tests {
    use super::{adaptive_capacity, compute_indices, fragmentation, latent_stress, neural_load};
    use crate::model::telemetry::{ScoringContext, TelemetrySample};
    use chrono::NaiveDate;

    fn approx(left: f64, right: f64) -> bool {
        (left - right).abs() < 1e-9
    }

    #[test]
    fn fragmentation_uses_fixed_coefficients() {
        assert!(approx(fragmentation(0.9, 80.0, 0.0), 76.0));
        assert!(approx(fragmentation(0.5, 10.0, 1.0), 45.0));
    }

    #[test]
    fn stress_and_capacity_clamp_at_bounds() {
        assert!(approx(latent_stress(60.0, 0.0), 90.0));
        assert_eq!(latent_stress(100.0, 3.0), 100.0);
        assert_eq!(latent_stress(-10.0, 0.0), 0.0);
        assert!(approx(adaptive_capacity(90.0, 0.0), 55.0));
        assert_eq!(adaptive_capacity(0.0, 5.0), 100.0);
    }

    #[test]
    fn neural_load_blends_inputs() {
        assert!(approx(neural_load(60.0, 50.0, 20.0), 49.0));
        assert_eq!(neural_load(150.0, 76.0, 90.0), 100.0);
    }

    #[test]
    fn nan_producing_inputs_clamp_to_floor() {
        assert_eq!(fragmentation(f64::INFINITY, f64::NEG_INFINITY, 0.0), 0.0);
        assert_eq!(neural_load(f64::NAN, 0.0, 0.0), 0.0);
    }

    #[test]
    fn compute_indices_chains_latent_stress() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).expect("valid date");
        let mut sample = TelemetrySample::new(1, date, 10);
        sample.keys_per_minute = 40.0;
        sample.task_switch_rate = 0.5;
        sample.backspace_rate = 20.0;
        let context = ScoringContext {
            volatility: 20.0,
            recovery_ratio: 0.5,
            ..ScoringContext::default()
        };

        let indices = compute_indices(&sample, &context);
        assert!(approx(indices.fragmentation, 30.0));
        assert!(approx(indices.latent_stress, 30.0));
        assert!(approx(indices.adaptive_capacity, 95.0));
        assert!(approx(indices.neural_load, 20.0 + 9.0 + 6.0));
    }
}
