//! Daily wellness check-in.
//!
//! Nothing is stored except the notifications sent to the supervisory chain.

use crate::model::user::Actor;
use crate::model::wellness::WellnessReport;
use crate::notify::{DomainEvent, EventSink};
use crate::service::{Committed, ServiceResult};
use log::info;

pub struct WellnessService<E: EventSink> {
    events: E,
}

impl<E: EventSink> WellnessService<E> {
    pub fn new(events: E) -> Self {
        Self { events }
    }

    pub fn daily_check_in(
        &self,
        actor: &Actor,
        report: WellnessReport,
    ) -> ServiceResult<Committed<WellnessReport>> {
        report.validate()?;
        info!(
            "event=wellness_check_in module=wellness status=ok user_id={}",
            actor.user_id
        );
        let dispatch = self.events.publish(&DomainEvent::DailyCheckIn {
            user_id: actor.user_id,
            mood: report.mood,
            sleep_hours: report.sleep_hours,
        });
        Ok(Committed::new(report, dispatch))
    }
}
