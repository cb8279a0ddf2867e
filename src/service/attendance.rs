//! Attendance state machine and reporting projections.
//!
//! Per employee per calendar day the derived state alternates
//! `NONE -> IN -> OUT -> IN -> ...`; multiple cycles per day are allowed.
//! The transition check and the insert happen atomically in the store so
//! concurrent marks for one employee cannot both pass the same check.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

use crate::clock::{Clock, day_bounds};
use crate::geo;
use crate::model::{
    attendance::{Attendance, MarkStatus, NewAttendance},
    employee::Employee,
    geo_marking::GeoMarking,
};
use crate::service::ServiceError;
use crate::store::{AttendanceStore, GeoMarkingStore, MarkOutcome, MarkPrecondition};

/// The day's last mark and first mark-in, as independent projections.
#[derive(Debug, Serialize, ToSchema)]
pub struct DayState {
    pub last: Option<Attendance>,
    pub first_in: Option<Attendance>,
}

#[derive(Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum DayStatus {
    Complete,
    /// The day's last event was an IN with no subsequent OUT.
    Incomplete,
}

/// Per-day report summary.
#[derive(Debug, Serialize, ToSchema)]
pub struct DayCard {
    pub date: NaiveDate,
    pub first_in_at: Option<DateTime<Utc>>,
    pub first_in_marking: Option<u64>,
    pub last_out_at: Option<DateTime<Utc>>,
    pub last_out_marking: Option<u64>,
    pub total_in: usize,
    pub status: DayStatus,
}

pub struct AttendanceService<S, C> {
    store: S,
    clock: C,
    offset: FixedOffset,
}

impl<S, C> AttendanceService<S, C>
where
    S: AttendanceStore + GeoMarkingStore,
    C: Clock,
{
    pub fn new(store: S, clock: C, offset: FixedOffset) -> Self {
        Self {
            store,
            clock,
            offset,
        }
    }

    pub async fn mark_in(
        &self,
        employee: &Employee,
        lat: f64,
        lon: f64,
    ) -> Result<(Attendance, Option<GeoMarking>), ServiceError> {
        self.mark(employee, lat, lon, MarkStatus::In).await
    }

    pub async fn mark_out(
        &self,
        employee: &Employee,
        lat: f64,
        lon: f64,
    ) -> Result<(Attendance, Option<GeoMarking>), ServiceError> {
        self.mark(employee, lat, lon, MarkStatus::Out).await
    }

    async fn mark(
        &self,
        employee: &Employee,
        lat: f64,
        lon: f64,
        status: MarkStatus,
    ) -> Result<(Attendance, Option<GeoMarking>), ServiceError> {
        let now = self.clock.now_utc();
        let day = day_bounds(now, self.offset);

        let markings = self.store.active_markings(employee.tenant_id).await?;
        let nearest = geo::find_nearest(&markings, lat, lon);
        let (geo_marking_id, distance, nearest) = match nearest {
            Some((marking, dist)) => (Some(marking.id), dist, Some(marking.clone())),
            None => (None, 0.0, None),
        };

        let precondition = match status {
            MarkStatus::In => MarkPrecondition::NotCurrentlyIn,
            MarkStatus::Out => MarkPrecondition::CurrentlyIn,
        };

        let outcome = self
            .store
            .insert_mark_if(
                NewAttendance {
                    tenant_id: employee.tenant_id,
                    employee_id: employee.id,
                    timestamp: now,
                    latitude: lat,
                    longitude: lon,
                    geo_marking_id,
                    distance_from_marking: distance,
                    status,
                },
                precondition,
                day,
            )
            .await?;

        match outcome {
            MarkOutcome::Recorded(row) => Ok((row, nearest)),
            MarkOutcome::Rejected { last_status } => {
                debug!(
                    employee_id = employee.id,
                    attempted = %status,
                    last = ?last_status,
                    "attendance transition rejected"
                );
                Err(ServiceError::InvalidState(match (status, last_status) {
                    (MarkStatus::In, _) => "already marked in, mark out first",
                    (MarkStatus::Out, None) => "no mark-in recorded today",
                    (MarkStatus::Out, _) => "already marked out",
                }))
            }
        }
    }

    pub async fn day_state(
        &self,
        tenant_id: u64,
        employee_id: u64,
    ) -> Result<DayState, ServiceError> {
        let (start, end) = day_bounds(self.clock.now_utc(), self.offset);

        let last = self
            .store
            .last_mark_between(tenant_id, employee_id, start, end)
            .await?;
        let first_in = self
            .store
            .first_in_between(tenant_id, employee_id, start, end)
            .await?;

        Ok(DayState { last, first_in })
    }

    /// All marks whose local date falls in `[from, to]`.
    pub async fn attendance_between(
        &self,
        tenant_id: u64,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Attendance>, ServiceError> {
        let (start, end) = self.range_bounds(from, to);
        Ok(self
            .store
            .marks_between(tenant_id, employee_id, start, end)
            .await?)
    }

    /// Per-day summaries over `[from, to]`; days without marks are omitted.
    pub async fn attendance_card(
        &self,
        tenant_id: u64,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DayCard>, ServiceError> {
        let marks = self
            .attendance_between(tenant_id, employee_id, from, to)
            .await?;

        let mut by_day: BTreeMap<NaiveDate, Vec<Attendance>> = BTreeMap::new();
        for mark in marks {
            let date = mark.timestamp.with_timezone(&self.offset).date_naive();
            by_day.entry(date).or_default().push(mark);
        }

        Ok(by_day
            .into_iter()
            .map(|(date, rows)| summarize_day(date, &rows))
            .collect())
    }

    fn range_bounds(&self, from: NaiveDate, to: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let local = |date: NaiveDate| {
            date.and_hms_opt(0, 0, 0)
                .expect("midnight is a valid time")
                .and_local_timezone(self.offset)
                .single()
                .expect("fixed offsets have no DST gaps")
                .with_timezone(&Utc)
        };
        (local(from), local(to) + Duration::days(1))
    }
}

/// `rows` must be the day's marks in timestamp order.
fn summarize_day(date: NaiveDate, rows: &[Attendance]) -> DayCard {
    let first_in = rows.iter().find(|m| m.status == MarkStatus::In);
    let last_out = rows.iter().rev().find(|m| m.status == MarkStatus::Out);

    let status = match rows.last().map(|m| m.status) {
        Some(MarkStatus::In) => DayStatus::Incomplete,
        _ => DayStatus::Complete,
    };

    DayCard {
        date,
        first_in_at: first_in.map(|m| m.timestamp),
        first_in_marking: first_in.and_then(|m| m.geo_marking_id),
        last_out_at: last_out.map(|m| m.timestamp),
        last_out_marking: last_out.and_then(|m| m.geo_marking_id),
        total_in: rows.iter().filter(|m| m.status == MarkStatus::In).count(),
        status,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::clock::testing::ManualClock;
    use crate::store::memory::MemStore;

    fn utc0() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn service(
        store: MemStore,
        clock: ManualClock,
    ) -> AttendanceService<MemStore, ManualClock> {
        AttendanceService::new(store, clock, utc0())
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap()
    }

    #[actix_web::test]
    async fn marks_must_alternate_within_a_day() {
        let store = MemStore::new();
        let employee = store.add_employee(1, "Jane");
        let clock = ManualClock::at(fixed_now());
        let svc = service(store.clone(), clock.clone());

        let (row, _) = svc.mark_in(&employee, 12.97, 77.59).await.unwrap();
        assert_eq!(row.status, MarkStatus::In);

        clock.advance(Duration::minutes(1));
        let err = svc.mark_in(&employee, 12.97, 77.59).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        clock.advance(Duration::minutes(1));
        let (row, _) = svc.mark_out(&employee, 12.97, 77.59).await.unwrap();
        assert_eq!(row.status, MarkStatus::Out);

        clock.advance(Duration::minutes(1));
        let err = svc.mark_out(&employee, 12.97, 77.59).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        // A second IN/OUT cycle the same day is fine.
        clock.advance(Duration::minutes(1));
        assert!(svc.mark_in(&employee, 12.97, 77.59).await.is_ok());
    }

    #[actix_web::test]
    async fn mark_out_without_mark_in_is_rejected() {
        let store = MemStore::new();
        let employee = store.add_employee(1, "Jane");
        let svc = service(store.clone(), ManualClock::at(fixed_now()));

        let err = svc.mark_out(&employee, 12.97, 77.59).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InvalidState("no mark-in recorded today")
        ));
        assert_eq!(store.mark_count(), 0);
    }

    #[actix_web::test]
    async fn yesterdays_marks_do_not_carry_over() {
        let store = MemStore::new();
        let employee = store.add_employee(1, "Jane");
        let clock = ManualClock::at(fixed_now());
        let svc = service(store.clone(), clock.clone());

        svc.mark_in(&employee, 12.97, 77.59).await.unwrap();

        // Next day: the derived state resets, so a fresh mark-in passes.
        clock.advance(Duration::days(1));
        assert!(svc.mark_in(&employee, 12.97, 77.59).await.is_ok());
    }

    #[actix_web::test]
    async fn nearest_marking_is_resolved_and_recorded() {
        let store = MemStore::new();
        let employee = store.add_employee(1, "Jane");
        let office = store.add_marking(1, "Head Office", 12.97, 77.59);
        store.add_marking(1, "Warehouse", 13.20, 77.80);
        let svc = service(store.clone(), ManualClock::at(fixed_now()));

        let (row, nearest) = svc.mark_in(&employee, 12.9701, 77.5901).await.unwrap();

        let nearest = nearest.expect("marking resolved");
        assert_eq!(nearest.id, office.id);
        assert_eq!(row.geo_marking_id, Some(office.id));
        assert!(row.distance_from_marking < 200.0);
    }

    #[actix_web::test]
    async fn no_markings_resolves_to_none() {
        let store = MemStore::new();
        let employee = store.add_employee(1, "Jane");
        let svc = service(store.clone(), ManualClock::at(fixed_now()));

        let (row, nearest) = svc.mark_in(&employee, 12.97, 77.59).await.unwrap();

        assert!(nearest.is_none());
        assert_eq!(row.geo_marking_id, None);
        assert_eq!(row.distance_from_marking, 0.0);
    }

    #[actix_web::test]
    async fn other_tenants_markings_are_invisible() {
        let store = MemStore::new();
        let employee = store.add_employee(1, "Jane");
        store.add_marking(2, "Other Tenant HQ", 12.97, 77.59);
        let svc = service(store.clone(), ManualClock::at(fixed_now()));

        let (row, nearest) = svc.mark_in(&employee, 12.97, 77.59).await.unwrap();
        assert!(nearest.is_none());
        assert_eq!(row.geo_marking_id, None);
    }

    #[actix_web::test]
    async fn day_state_exposes_last_and_first_in() {
        let store = MemStore::new();
        let employee = store.add_employee(1, "Jane");
        let clock = ManualClock::at(fixed_now());
        let svc = service(store.clone(), clock.clone());

        let (first, _) = svc.mark_in(&employee, 12.97, 77.59).await.unwrap();
        clock.advance(Duration::hours(1));
        svc.mark_out(&employee, 12.97, 77.59).await.unwrap();
        clock.advance(Duration::hours(1));
        svc.mark_in(&employee, 12.97, 77.59).await.unwrap();
        clock.advance(Duration::hours(1));
        let (last, _) = svc.mark_out(&employee, 12.97, 77.59).await.unwrap();

        let state = svc.day_state(1, employee.id).await.unwrap();
        assert_eq!(state.first_in.unwrap().id, first.id);
        assert_eq!(state.last.unwrap().id, last.id);
    }

    #[actix_web::test]
    async fn attendance_card_summarizes_each_day() {
        let store = MemStore::new();
        let employee = store.add_employee(1, "Jane");
        let clock = ManualClock::at(fixed_now());
        let svc = service(store.clone(), clock.clone());

        // Day 1: full IN/OUT cycle plus a dangling IN.
        svc.mark_in(&employee, 12.97, 77.59).await.unwrap();
        clock.advance(Duration::hours(4));
        svc.mark_out(&employee, 12.97, 77.59).await.unwrap();
        clock.advance(Duration::hours(1));
        svc.mark_in(&employee, 12.97, 77.59).await.unwrap();

        // Day 2: one complete cycle.
        clock.advance(Duration::days(1));
        svc.mark_in(&employee, 12.97, 77.59).await.unwrap();
        clock.advance(Duration::hours(8));
        svc.mark_out(&employee, 12.97, 77.59).await.unwrap();

        let from = fixed_now().date_naive();
        let to = from + Duration::days(1);
        let cards = svc.attendance_card(1, employee.id, from, to).await.unwrap();

        assert_eq!(cards.len(), 2);

        assert_eq!(cards[0].date, from);
        assert_eq!(cards[0].total_in, 2);
        assert_eq!(cards[0].status, DayStatus::Incomplete);
        assert!(cards[0].first_in_at.is_some());
        assert!(cards[0].last_out_at.is_some());

        assert_eq!(cards[1].date, to);
        assert_eq!(cards[1].total_in, 1);
        assert_eq!(cards[1].status, DayStatus::Complete);
    }
}
