//! In-memory store used by the service tests. Mirrors the trait contracts,
//! including replace semantics and the guarded mark insert (serialized here
//! by the single mutex).

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::model::{
    attendance::{Attendance, MarkStatus, NewAttendance},
    employee::Employee,
    geo_marking::GeoMarking,
    token::{NewToken, TokenKind, TokenRecord},
};
use crate::store::{
    AttendanceStore, EmployeeStore, GeoMarkingStore, MarkOutcome, MarkPrecondition, StoreError,
    TokenStore,
};

#[derive(Default)]
struct Inner {
    tokens: Vec<TokenRecord>,
    marks: Vec<Attendance>,
    markings: Vec<GeoMarking>,
    employees: Vec<Employee>,
    next_id: u64,
}

impl Inner {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Default)]
pub struct MemStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_employee(&self, tenant_id: u64, name: &str) -> Employee {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id();
        let employee = Employee {
            id,
            tenant_id,
            employee_no: format!("EMP-{id:03}"),
            name: name.to_string(),
            email: None,
            phone: None,
            is_active: true,
            created_at: Utc::now(),
        };
        inner.employees.push(employee.clone());
        employee
    }

    pub fn add_marking(&self, tenant_id: u64, name: &str, lat: f64, lon: f64) -> GeoMarking {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id();
        let marking = GeoMarking {
            id,
            tenant_id,
            name: name.to_string(),
            latitude: lat,
            longitude: lon,
            radius_meters: 2000.0,
            is_active: true,
            created_at: Utc::now(),
        };
        inner.markings.push(marking.clone());
        marking
    }

    pub fn token_count(&self) -> usize {
        self.inner.lock().unwrap().tokens.len()
    }

    pub fn mark_count(&self) -> usize {
        self.inner.lock().unwrap().marks.len()
    }

    fn last_between(
        inner: &Inner,
        tenant_id: u64,
        employee_id: u64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Option<Attendance> {
        inner
            .marks
            .iter()
            .filter(|m| {
                m.tenant_id == tenant_id
                    && m.employee_id == employee_id
                    && m.timestamp >= start
                    && m.timestamp < end
            })
            .max_by_key(|m| (m.timestamp, m.id))
            .cloned()
    }
}

impl TokenStore for MemStore {
    async fn replace_token(&self, token: NewToken) -> Result<TokenRecord, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .tokens
            .retain(|t| !(t.employee_id == token.employee_id && t.token_type == token.token_type));

        let id = inner.next_id();
        let record = TokenRecord {
            id,
            tenant_id: token.tenant_id,
            employee_id: token.employee_id,
            token_type: token.token_type,
            token_hash: token.token_hash,
            device_hash: token.device_hash,
            expires_at: token.expires_at,
            used_at: None,
            created_at: Utc::now(),
        };
        inner.tokens.push(record.clone());
        Ok(record)
    }

    async fn find_token(
        &self,
        tenant_id: u64,
        employee_id: u64,
        kind: TokenKind,
    ) -> Result<Option<TokenRecord>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .tokens
            .iter()
            .find(|t| {
                t.tenant_id == tenant_id && t.employee_id == employee_id && t.token_type == kind
            })
            .cloned())
    }

    async fn delete_token(&self, id: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.tokens.retain(|t| t.id != id);
        Ok(())
    }
}

impl AttendanceStore for MemStore {
    async fn insert_mark_if(
        &self,
        mark: NewAttendance,
        precondition: MarkPrecondition,
        day: (DateTime<Utc>, DateTime<Utc>),
    ) -> Result<MarkOutcome, StoreError> {
        let mut inner = self.inner.lock().unwrap();

        let last_status =
            Self::last_between(&inner, mark.tenant_id, mark.employee_id, day.0, day.1)
                .map(|m| m.status);
        if !precondition.holds(last_status) {
            return Ok(MarkOutcome::Rejected { last_status });
        }

        let id = inner.next_id();
        let row = Attendance {
            id,
            tenant_id: mark.tenant_id,
            employee_id: mark.employee_id,
            timestamp: mark.timestamp,
            latitude: mark.latitude,
            longitude: mark.longitude,
            geo_marking_id: mark.geo_marking_id,
            distance_from_marking: mark.distance_from_marking,
            status: mark.status,
        };
        inner.marks.push(row.clone());
        Ok(MarkOutcome::Recorded(row))
    }

    async fn last_mark_between(
        &self,
        tenant_id: u64,
        employee_id: u64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<Attendance>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(Self::last_between(&inner, tenant_id, employee_id, start, end))
    }

    async fn first_in_between(
        &self,
        tenant_id: u64,
        employee_id: u64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<Attendance>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .marks
            .iter()
            .filter(|m| {
                m.tenant_id == tenant_id
                    && m.employee_id == employee_id
                    && m.timestamp >= start
                    && m.timestamp < end
                    && m.status == MarkStatus::In
            })
            .min_by_key(|m| (m.timestamp, m.id))
            .cloned())
    }

    async fn marks_between(
        &self,
        tenant_id: u64,
        employee_id: u64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Attendance>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut marks: Vec<Attendance> = inner
            .marks
            .iter()
            .filter(|m| {
                m.tenant_id == tenant_id
                    && m.employee_id == employee_id
                    && m.timestamp >= start
                    && m.timestamp < end
            })
            .cloned()
            .collect();
        marks.sort_by_key(|m| (m.timestamp, m.id));
        Ok(marks)
    }
}

impl GeoMarkingStore for MemStore {
    async fn active_markings(&self, tenant_id: u64) -> Result<Vec<GeoMarking>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .markings
            .iter()
            .filter(|m| m.tenant_id == tenant_id && m.is_active)
            .cloned()
            .collect())
    }
}

impl EmployeeStore for MemStore {
    async fn employee(&self, tenant_id: u64, id: u64) -> Result<Option<Employee>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .employees
            .iter()
            .find(|e| e.tenant_id == tenant_id && e.id == id)
            .cloned())
    }
}
