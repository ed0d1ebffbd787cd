use chrono::NaiveDate;
use guardian_core::model::telemetry::{BurnoutPhase, ScoringContext, TelemetrySample};
use guardian_core::scoring::{
    adaptive_capacity, classify, compute_indices, fragmentation, latent_stress, neural_load,
};
use proptest::prelude::*;

fn in_bounds(value: f64) -> bool {
    (0.0..=100.0).contains(&value)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn prop_every_index_is_bounded_for_any_f64(
        a in any::<f64>(),
        b in any::<f64>(),
        c in any::<f64>(),
    ) {
        prop_assert!(in_bounds(fragmentation(a, b, c)));
        prop_assert!(in_bounds(latent_stress(a, b)));
        prop_assert!(in_bounds(adaptive_capacity(a, b)));
        prop_assert!(in_bounds(neural_load(a, b, c)));
    }

    #[test]
    fn prop_compute_indices_is_bounded(
        keys_per_minute in any::<f64>(),
        backspace_rate in any::<f64>(),
        task_switch_rate in any::<f64>(),
        meeting_overlap in any::<f64>(),
        volatility in any::<f64>(),
        sleep_deviation in any::<f64>(),
        recovery_ratio in any::<f64>(),
    ) {
        let sample = TelemetrySample {
            keys_per_minute,
            backspace_rate,
            task_switch_rate,
            ..TelemetrySample::new(1, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(), 12)
        };
        let context = ScoringContext {
            meeting_overlap,
            volatility,
            sleep_deviation,
            recovery_ratio,
        };
        let indices = compute_indices(&sample, &context);
        prop_assert!(in_bounds(indices.fragmentation));
        prop_assert!(in_bounds(indices.latent_stress));
        prop_assert!(in_bounds(indices.adaptive_capacity));
        prop_assert!(in_bounds(indices.neural_load));
    }

    #[test]
    fn prop_classifier_is_total_and_ordinal(
        load in any::<f64>(),
        capacity in any::<f64>(),
    ) {
        let phase = classify(load, capacity);
        prop_assert!((1..=4).contains(&phase.ordinal()));
        prop_assert_eq!(BurnoutPhase::from_ordinal(phase.ordinal()), Some(phase));
    }

    #[test]
    fn prop_higher_stress_never_raises_capacity(
        stress in 0.0f64..200.0,
        extra in 0.0f64..200.0,
        recovery in -5.0f64..5.0,
    ) {
        prop_assert!(adaptive_capacity(stress + extra, recovery) <= adaptive_capacity(stress, recovery));
    }
}

#[test]
fn collapse_risk_boundaries_are_strict() {
    assert_ne!(classify(80.0, 30.0), BurnoutPhase::CollapseRisk);
    assert_ne!(classify(80.0, 29.0), BurnoutPhase::CollapseRisk);
    assert_ne!(classify(81.0, 30.0), BurnoutPhase::CollapseRisk);
    assert_eq!(classify(81.0, 29.0), BurnoutPhase::CollapseRisk);
}

#[test]
fn non_finite_inputs_clamp_instead_of_propagating() {
    assert_eq!(fragmentation(f64::NAN, 0.0, 0.0), 0.0);
    assert_eq!(latent_stress(f64::INFINITY, 0.0), 100.0);
    assert_eq!(latent_stress(f64::INFINITY, f64::NEG_INFINITY), 0.0);
    assert_eq!(adaptive_capacity(f64::INFINITY, 0.0), 0.0);
}
