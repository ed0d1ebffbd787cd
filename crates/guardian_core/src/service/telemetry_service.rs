//! Telemetry scoring use-cases.
//!
//! # Responsibility
//! - Score incoming samples and append them with their cached indices.
//! - Serve latest, history, team and org views with a read-through phase.
//! - Raise a collapse-risk alert when a user enters phase 4.
//!
//! # Invariants
//! - Phases are never persisted; they are classified from cached indices.
//! - History is ascending by `(date, hour)` and can be iterated repeatedly.
//! - The alert fires only on entry: the sample must become the user's latest
//!   and the previous latest must not already be phase 4. The previous
//!   latest is read inside the insert transaction, so concurrent writers for
//!   one user see a serialized order.

use crate::config::WorkflowLimits;
use crate::model::telemetry::{
    BurnoutPhase, CognitiveIndices, ScoringContext, TelemetryPoint, TelemetrySample,
};
use crate::model::user::{Role, UserId, UserRecord};
use crate::model::ValidationError;
use crate::notify::{DomainEvent, EventSink};
use crate::repo::directory_repo::DirectoryRepository;
use crate::repo::telemetry_repo::{
    DailyLoad, HistoryQuery, ScoredSample, TelemetryRepository,
};
use crate::repo::RepoError;
use crate::scoring::{classify_phase, compute_indices};
use crate::service::{Committed, ServiceError, ServiceResult, StateConflict};
use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Finite, ascending window of scored samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetryHistory {
    points: Vec<TelemetryPoint>,
}

impl TelemetryHistory {
    pub fn iter(&self) -> std::slice::Iter<'_, TelemetryPoint> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Last point of the window.
    pub fn last(&self) -> Option<&TelemetryPoint> {
        self.points.last()
    }

    pub fn into_points(self) -> Vec<TelemetryPoint> {
        self.points
    }
}

impl<'a> IntoIterator for &'a TelemetryHistory {
    type Item = &'a TelemetryPoint;
    type IntoIter = std::slice::Iter<'a, TelemetryPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Users per phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDistribution {
    pub silent_accumulation: u32,
    pub functional_overdrive: u32,
    pub volatility_escalation: u32,
    pub collapse_risk: u32,
}

impl PhaseDistribution {
    pub fn add(&mut self, phase: BurnoutPhase) {
        match phase {
            BurnoutPhase::SilentAccumulation => self.silent_accumulation += 1,
            BurnoutPhase::FunctionalOverdrive => self.functional_overdrive += 1,
            BurnoutPhase::VolatilityEscalation => self.volatility_escalation += 1,
            BurnoutPhase::CollapseRisk => self.collapse_risk += 1,
        }
    }

    pub fn count(&self, phase: BurnoutPhase) -> u32 {
        match phase {
            BurnoutPhase::SilentAccumulation => self.silent_accumulation,
            BurnoutPhase::FunctionalOverdrive => self.functional_overdrive,
            BurnoutPhase::VolatilityEscalation => self.volatility_escalation,
            BurnoutPhase::CollapseRisk => self.collapse_risk,
        }
    }

    pub fn total(&self) -> u32 {
        BurnoutPhase::ALL.iter().map(|phase| self.count(*phase)).sum()
    }
}

/// Latest state of one direct report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberStability {
    pub user_id: UserId,
    pub name: String,
    /// `None` when the user has no samples yet.
    pub latest: Option<TelemetryPoint>,
}

/// Team view for one manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStability {
    pub members: Vec<MemberStability>,
    /// Members without samples count as `SilentAccumulation`.
    pub distribution: PhaseDistribution,
}

/// Organization-wide view for admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgIntelligence {
    /// Every employee by latest phase; employees without samples count as
    /// `SilentAccumulation`.
    pub distribution: PhaseDistribution,
    /// Average neural load per sampled day, ascending, most recent days only.
    pub neural_traffic: Vec<DailyLoad>,
}

/// Telemetry service facade.
pub struct TelemetryService<T: TelemetryRepository, D: DirectoryRepository, E: EventSink> {
    repo: T,
    directory: D,
    events: E,
    limits: WorkflowLimits,
}

impl<T: TelemetryRepository, D: DirectoryRepository, E: EventSink> TelemetryService<T, D, E> {
    pub fn new(repo: T, directory: D, events: E) -> Self {
        Self {
            repo,
            directory,
            events,
            limits: WorkflowLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: WorkflowLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Scores and appends one sample.
    pub fn record(
        &self,
        sample: TelemetrySample,
        context: &ScoringContext,
    ) -> ServiceResult<Committed<TelemetryPoint>> {
        sample.validate()?;
        context.validate()?;

        let indices = compute_indices(&sample, context);
        let phase = classify_phase(&indices);

        let previous = self
            .repo
            .insert_scored(&sample, &indices)
            .map_err(|err| match err {
                RepoError::Duplicate { .. } => StateConflict::DuplicateSample.into(),
                other => ServiceError::from(other),
            })?;

        info!(
            "event=telemetry_record module=telemetry status=ok user_id={} date={} hour={} phase={}",
            sample.user_id,
            sample.date,
            sample.hour,
            phase.ordinal()
        );

        let point = TelemetryPoint {
            sample,
            indices,
            phase,
        };
        if !enters_collapse_risk(previous.as_ref(), &point) {
            return Ok(Committed::quiet(point));
        }

        warn!(
            "event=collapse_risk module=telemetry status=alert user_id={} neural_load={:.0}",
            point.sample.user_id, point.indices.neural_load
        );
        let report = self.events.publish(&DomainEvent::CollapseRiskDetected {
            user_id: point.sample.user_id,
            date: point.sample.date,
            hour: point.sample.hour,
            neural_load: point.indices.neural_load,
        });
        Ok(Committed::new(point, report))
    }

    /// Most recent sample by `(date, hour)`.
    pub fn latest(&self, user_id: UserId) -> ServiceResult<Option<TelemetryPoint>> {
        Ok(self.repo.latest(user_id)?.map(into_point))
    }

    pub fn latest_indices(&self, user_id: UserId) -> ServiceResult<Option<CognitiveIndices>> {
        Ok(self.repo.latest(user_id)?.map(|scored| scored.indices))
    }

    /// Inclusive date window, first `limit` samples, ascending.
    ///
    /// `None` or `Some(0)` uses the configured default; larger values are
    /// capped.
    pub fn history(
        &self,
        user_id: UserId,
        date_from: NaiveDate,
        date_to: NaiveDate,
        limit: Option<u32>,
    ) -> ServiceResult<TelemetryHistory> {
        if date_from > date_to {
            return Err(ValidationError::InvalidDateRange.into());
        }
        let query = HistoryQuery {
            user_id,
            date_from,
            date_to,
            limit: self.limits.telemetry_history_limit(limit),
        };
        let points = self
            .repo
            .history(&query)?
            .into_iter()
            .map(into_point)
            .collect();
        Ok(TelemetryHistory { points })
    }

    /// Latest state of each direct report of `manager_id`.
    pub fn team_stability(&self, manager_id: UserId) -> ServiceResult<TeamStability> {
        let (members, distribution) = self.latest_of(self.directory.list_reports(manager_id)?)?;
        Ok(TeamStability {
            members,
            distribution,
        })
    }

    /// Employee phase distribution plus the recent org-wide load series.
    pub fn org_intelligence(&self) -> ServiceResult<OrgIntelligence> {
        let (_, distribution) = self.latest_of(self.directory.list_by_role(Role::Employee)?)?;
        let neural_traffic = self.repo.daily_neural_load(self.limits.org_traffic_days)?;
        info!(
            "event=org_intelligence module=telemetry status=ok employees={} days={}",
            distribution.total(),
            neural_traffic.len()
        );
        Ok(OrgIntelligence {
            distribution,
            neural_traffic,
        })
    }

    fn latest_of(
        &self,
        users: Vec<UserRecord>,
    ) -> ServiceResult<(Vec<MemberStability>, PhaseDistribution)> {
        let mut members = Vec::with_capacity(users.len());
        let mut distribution = PhaseDistribution::default();
        for user in users {
            let latest = self.repo.latest(user.id)?.map(into_point);
            distribution.add(
                latest
                    .as_ref()
                    .map_or(BurnoutPhase::SilentAccumulation, |point| point.phase),
            );
            members.push(MemberStability {
                user_id: user.id,
                name: user.name,
                latest,
            });
        }
        Ok((members, distribution))
    }
}

fn into_point(scored: ScoredSample) -> TelemetryPoint {
    let phase = classify_phase(&scored.indices);
    TelemetryPoint {
        sample: scored.sample,
        indices: scored.indices,
        phase,
    }
}

fn enters_collapse_risk(previous: Option<&ScoredSample>, point: &TelemetryPoint) -> bool {
    if point.phase != BurnoutPhase::CollapseRisk {
        return false;
    }
    match previous {
        None => true,
        Some(prev) => {
            prev.sample.slot() < point.sample.slot()
                && classify_phase(&prev.indices) != BurnoutPhase::CollapseRisk
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{enters_collapse_risk, PhaseDistribution};
    use crate::model::telemetry::{
        BurnoutPhase, CognitiveIndices, TelemetryPoint, TelemetrySample,
    };
    use crate::repo::telemetry_repo::ScoredSample;
    use chrono::NaiveDate;

    const CRITICAL: CognitiveIndices = CognitiveIndices {
        fragmentation: 76.0,
        latent_stress: 90.0,
        adaptive_capacity: 25.0,
        neural_load: 100.0,
    };
    const CALM: CognitiveIndices = CognitiveIndices {
        fragmentation: 10.0,
        latent_stress: 10.0,
        adaptive_capacity: 80.0,
        neural_load: 20.0,
    };

    fn sample(hour: u8) -> TelemetrySample {
        TelemetrySample::new(1, NaiveDate::from_ymd_opt(2026, 3, 2).expect("date"), hour)
    }

    fn point(hour: u8, indices: CognitiveIndices, phase: BurnoutPhase) -> TelemetryPoint {
        TelemetryPoint {
            sample: sample(hour),
            indices,
            phase,
        }
    }

    #[test]
    fn alert_only_on_entry_into_phase_four() {
        let current = point(10, CRITICAL, BurnoutPhase::CollapseRisk);
        let calm_before = ScoredSample {
            sample: sample(9),
            indices: CALM,
        };
        let critical_before = ScoredSample {
            sample: sample(9),
            indices: CRITICAL,
        };

        assert!(enters_collapse_risk(None, &current));
        assert!(enters_collapse_risk(Some(&calm_before), &current));
        assert!(!enters_collapse_risk(Some(&critical_before), &current));
        assert!(!enters_collapse_risk(
            Some(&calm_before),
            &point(10, CALM, BurnoutPhase::SilentAccumulation)
        ));
    }

    #[test]
    fn backfilled_sample_does_not_alert() {
        let later = ScoredSample {
            sample: sample(15),
            indices: CALM,
        };
        let backfill = point(8, CRITICAL, BurnoutPhase::CollapseRisk);
        assert!(!enters_collapse_risk(Some(&later), &backfill));
    }

    #[test]
    fn distribution_counts_each_phase() {
        let mut distribution = PhaseDistribution::default();
        distribution.add(BurnoutPhase::CollapseRisk);
        distribution.add(BurnoutPhase::CollapseRisk);
        distribution.add(BurnoutPhase::SilentAccumulation);

        assert_eq!(distribution.count(BurnoutPhase::CollapseRisk), 2);
        assert_eq!(distribution.count(BurnoutPhase::FunctionalOverdrive), 0);
        assert_eq!(distribution.total(), 3);
    }
}
