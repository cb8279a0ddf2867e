//! Storage seams for the core services.
//!
//! The services only see these traits; MySQL implements them for
//! production and the in-memory store stands in for tests. Every
//! tenant-owned query filters by tenant id.

#[cfg(test)]
pub mod memory;
pub mod mysql;

use chrono::{DateTime, Utc};

use crate::model::{
    attendance::{Attendance, MarkStatus, NewAttendance},
    employee::Employee,
    geo_marking::GeoMarking,
    token::{NewToken, TokenKind, TokenRecord},
};

#[derive(Debug, derive_more::Display)]
pub enum StoreError {
    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Database(e)
    }
}

/// State the day's last mark must be in for a new mark to be accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkPrecondition {
    /// Mark-in: last mark absent or `OUT`.
    NotCurrentlyIn,
    /// Mark-out: last mark present and `IN`.
    CurrentlyIn,
}

impl MarkPrecondition {
    pub fn holds(self, last_status: Option<MarkStatus>) -> bool {
        match self {
            MarkPrecondition::NotCurrentlyIn => last_status != Some(MarkStatus::In),
            MarkPrecondition::CurrentlyIn => last_status == Some(MarkStatus::In),
        }
    }
}

#[derive(Debug)]
pub enum MarkOutcome {
    Recorded(Attendance),
    /// Precondition failed; carries the status the day's last mark was
    /// observed in so callers can phrase the rejection.
    Rejected { last_status: Option<MarkStatus> },
}

#[allow(async_fn_in_trait)]
pub trait TokenStore {
    /// Replace-then-insert for the (employee_id, token_type) slot, as one
    /// atomic operation. Never surfaces a uniqueness violation.
    async fn replace_token(&self, token: NewToken) -> Result<TokenRecord, StoreError>;

    async fn find_token(
        &self,
        tenant_id: u64,
        employee_id: u64,
        kind: TokenKind,
    ) -> Result<Option<TokenRecord>, StoreError>;

    async fn delete_token(&self, id: u64) -> Result<(), StoreError>;
}

#[allow(async_fn_in_trait)]
pub trait AttendanceStore {
    /// Atomically re-check the day's last mark against `precondition` and
    /// insert. Serializes concurrent transitions for one employee.
    async fn insert_mark_if(
        &self,
        mark: NewAttendance,
        precondition: MarkPrecondition,
        day: (DateTime<Utc>, DateTime<Utc>),
    ) -> Result<MarkOutcome, StoreError>;

    async fn last_mark_between(
        &self,
        tenant_id: u64,
        employee_id: u64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<Attendance>, StoreError>;

    async fn first_in_between(
        &self,
        tenant_id: u64,
        employee_id: u64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<Attendance>, StoreError>;

    async fn marks_between(
        &self,
        tenant_id: u64,
        employee_id: u64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Attendance>, StoreError>;
}

#[allow(async_fn_in_trait)]
pub trait GeoMarkingStore {
    async fn active_markings(&self, tenant_id: u64) -> Result<Vec<GeoMarking>, StoreError>;
}

#[allow(async_fn_in_trait)]
pub trait EmployeeStore {
    async fn employee(&self, tenant_id: u64, id: u64) -> Result<Option<Employee>, StoreError>;
}
