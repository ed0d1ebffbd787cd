//! Burnout phase classifier.

use crate::model::telemetry::{BurnoutPhase, CognitiveIndices};

/// Maps `(neural_load, adaptive_capacity)` to a phase.
///
/// Rules are evaluated in order and the first match wins:
/// 1. load > 80 and capacity < 30: `CollapseRisk`
/// 2. load > 60 and capacity < 50: `VolatilityEscalation`
/// 3. load > 40: `FunctionalOverdrive`
/// 4. otherwise: `SilentAccumulation`
pub fn classify(neural_load: f64, adaptive_capacity: f64) -> BurnoutPhase {
    if neural_load > 80.0 && adaptive_capacity < 30.0 {
        return BurnoutPhase::CollapseRisk;
    }
    if neural_load > 60.0 && adaptive_capacity < 50.0 {
        return BurnoutPhase::VolatilityEscalation;
    }
    if neural_load > 40.0 {
        return BurnoutPhase::FunctionalOverdrive;
    }
    BurnoutPhase::SilentAccumulation
}

/// Classifies a full index tuple.
pub fn classify_phase(indices: &CognitiveIndices) -> BurnoutPhase {
    classify(indices.neural_load, indices.adaptive_capacity)
}
