//! MySQL-backed store. Runtime-checked queries against the schema in
//! `schema.sql`; see the trait docs in the parent module for the atomicity
//! requirements the transactions here satisfy.

use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

use crate::model::{
    attendance::{Attendance, NewAttendance},
    employee::Employee,
    geo_marking::{GeoMarking, GeoMarkingPatch},
    tenant::Tenant,
    token::{NewToken, TokenKind, TokenRecord},
    user::User,
};
use crate::store::{
    AttendanceStore, EmployeeStore, GeoMarkingStore, MarkOutcome, MarkPrecondition, StoreError,
    TokenStore,
};

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    // ---- tenants ----

    pub async fn create_tenant(
        &self,
        name: &str,
        icon: Option<&str>,
    ) -> Result<Tenant, StoreError> {
        let res = sqlx::query("INSERT INTO tenants (name, icon) VALUES (?, ?)")
            .bind(name)
            .bind(icon)
            .execute(&self.pool)
            .await?;

        let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = ?")
            .bind(res.last_insert_id())
            .fetch_one(&self.pool)
            .await?;
        Ok(tenant)
    }

    pub async fn tenant(&self, id: u64) -> Result<Option<Tenant>, StoreError> {
        let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tenant)
    }

    pub async fn tenants(&self) -> Result<Vec<Tenant>, StoreError> {
        let tenants = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(tenants)
    }

    pub async fn set_tenant_active(&self, id: u64, active: bool) -> Result<u64, StoreError> {
        let res = sqlx::query("UPDATE tenants SET is_active = ? WHERE id = ?")
            .bind(active)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    // ---- admin users ----

    pub async fn create_user(
        &self,
        tenant_id: u64,
        email: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<User, StoreError> {
        let res = sqlx::query(
            "INSERT INTO users (tenant_id, email, password_hash, role) VALUES (?, ?, ?, ?)",
        )
        .bind(tenant_id)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .execute(&self.pool)
        .await?;

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(res.last_insert_id())
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn user(&self, id: u64) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn user_in_tenant(
        &self,
        tenant_id: u64,
        id: u64,
    ) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE tenant_id = ? AND id = ?")
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn users_in_tenant(&self, tenant_id: u64) -> Result<Vec<User>, StoreError> {
        let users =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE tenant_id = ? ORDER BY id")
                .bind(tenant_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(users)
    }

    pub async fn set_user_active(
        &self,
        tenant_id: u64,
        id: u64,
        active: bool,
    ) -> Result<u64, StoreError> {
        let res = sqlx::query("UPDATE users SET is_active = ? WHERE tenant_id = ? AND id = ?")
            .bind(active)
            .bind(tenant_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    // ---- employees ----

    pub async fn create_employee(
        &self,
        tenant_id: u64,
        employee_no: &str,
        name: &str,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Employee, StoreError> {
        let res = sqlx::query(
            "INSERT INTO employees (tenant_id, employee_no, name, email, phone) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(tenant_id)
        .bind(employee_no)
        .bind(name)
        .bind(email)
        .bind(phone)
        .execute(&self.pool)
        .await?;

        let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ?")
            .bind(res.last_insert_id())
            .fetch_one(&self.pool)
            .await?;
        Ok(employee)
    }

    pub async fn employees(&self, tenant_id: u64) -> Result<Vec<Employee>, StoreError> {
        let employees = sqlx::query_as::<_, Employee>(
            "SELECT * FROM employees WHERE tenant_id = ? ORDER BY id",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(employees)
    }

    pub async fn set_employee_active(
        &self,
        tenant_id: u64,
        id: u64,
        active: bool,
    ) -> Result<u64, StoreError> {
        let res = sqlx::query("UPDATE employees SET is_active = ? WHERE tenant_id = ? AND id = ?")
            .bind(active)
            .bind(tenant_id)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    // ---- geomarkings ----

    pub async fn create_geo_marking(
        &self,
        tenant_id: u64,
        name: &str,
        latitude: f64,
        longitude: f64,
        radius_meters: f64,
    ) -> Result<GeoMarking, StoreError> {
        let res = sqlx::query(
            "INSERT INTO geo_markings (tenant_id, name, latitude, longitude, radius_meters) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(tenant_id)
        .bind(name)
        .bind(latitude)
        .bind(longitude)
        .bind(radius_meters)
        .execute(&self.pool)
        .await?;

        let marking = sqlx::query_as::<_, GeoMarking>("SELECT * FROM geo_markings WHERE id = ?")
            .bind(res.last_insert_id())
            .fetch_one(&self.pool)
            .await?;
        Ok(marking)
    }

    pub async fn geo_marking(
        &self,
        tenant_id: u64,
        id: u64,
    ) -> Result<Option<GeoMarking>, StoreError> {
        let marking = sqlx::query_as::<_, GeoMarking>(
            "SELECT * FROM geo_markings WHERE tenant_id = ? AND id = ?",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(marking)
    }

    pub async fn geo_markings(&self, tenant_id: u64) -> Result<Vec<GeoMarking>, StoreError> {
        let markings = sqlx::query_as::<_, GeoMarking>(
            "SELECT * FROM geo_markings WHERE tenant_id = ? ORDER BY id",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(markings)
    }

    pub async fn update_geo_marking(
        &self,
        tenant_id: u64,
        id: u64,
        patch: &GeoMarkingPatch,
    ) -> Result<u64, StoreError> {
        let res = sqlx::query(
            "UPDATE geo_markings SET \
             name = COALESCE(?, name), \
             latitude = COALESCE(?, latitude), \
             longitude = COALESCE(?, longitude), \
             radius_meters = COALESCE(?, radius_meters), \
             is_active = COALESCE(?, is_active) \
             WHERE tenant_id = ? AND id = ?",
        )
        .bind(patch.name.as_deref())
        .bind(patch.latitude)
        .bind(patch.longitude)
        .bind(patch.radius_meters)
        .bind(patch.is_active)
        .bind(tenant_id)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected())
    }
}

impl EmployeeStore for MySqlStore {
    async fn employee(&self, tenant_id: u64, id: u64) -> Result<Option<Employee>, StoreError> {
        let employee = sqlx::query_as::<_, Employee>(
            "SELECT * FROM employees WHERE tenant_id = ? AND id = ?",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(employee)
    }
}

impl GeoMarkingStore for MySqlStore {
    async fn active_markings(&self, tenant_id: u64) -> Result<Vec<GeoMarking>, StoreError> {
        let markings = sqlx::query_as::<_, GeoMarking>(
            "SELECT * FROM geo_markings WHERE tenant_id = ? AND is_active = TRUE",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(markings)
    }
}

impl TokenStore for MySqlStore {
    async fn replace_token(&self, token: NewToken) -> Result<TokenRecord, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Delete-then-insert inside one transaction so the unique
        // (employee_id, token_type) slot never raises a violation.
        sqlx::query("DELETE FROM tokens WHERE employee_id = ? AND token_type = ?")
            .bind(token.employee_id)
            .bind(token.token_type)
            .execute(&mut *tx)
            .await?;

        let res = sqlx::query(
            "INSERT INTO tokens \
             (tenant_id, employee_id, token_type, token_hash, device_hash, expires_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(token.tenant_id)
        .bind(token.employee_id)
        .bind(token.token_type)
        .bind(&token.token_hash)
        .bind(&token.device_hash)
        .bind(token.expires_at)
        .execute(&mut *tx)
        .await?;

        let record = sqlx::query_as::<_, TokenRecord>("SELECT * FROM tokens WHERE id = ?")
            .bind(res.last_insert_id())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(record)
    }

    async fn find_token(
        &self,
        tenant_id: u64,
        employee_id: u64,
        kind: TokenKind,
    ) -> Result<Option<TokenRecord>, StoreError> {
        let record = sqlx::query_as::<_, TokenRecord>(
            "SELECT * FROM tokens WHERE tenant_id = ? AND employee_id = ? AND token_type = ?",
        )
        .bind(tenant_id)
        .bind(employee_id)
        .bind(kind)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn delete_token(&self, id: u64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM tokens WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

impl AttendanceStore for MySqlStore {
    async fn insert_mark_if(
        &self,
        mark: NewAttendance,
        precondition: MarkPrecondition,
        day: (DateTime<Utc>, DateTime<Utc>),
    ) -> Result<MarkOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Lock the day's last mark so concurrent transitions for the same
        // employee serialize; next-key locking also covers the empty-day
        // insert race.
        let last = sqlx::query_as::<_, Attendance>(
            "SELECT * FROM attendance \
             WHERE tenant_id = ? AND employee_id = ? AND timestamp >= ? AND timestamp < ? \
             ORDER BY timestamp DESC, id DESC LIMIT 1 FOR UPDATE",
        )
        .bind(mark.tenant_id)
        .bind(mark.employee_id)
        .bind(day.0)
        .bind(day.1)
        .fetch_optional(&mut *tx)
        .await?;

        let last_status = last.map(|m| m.status);
        if !precondition.holds(last_status) {
            tx.rollback().await?;
            return Ok(MarkOutcome::Rejected { last_status });
        }

        let res = sqlx::query(
            "INSERT INTO attendance \
             (tenant_id, employee_id, timestamp, latitude, longitude, geo_marking_id, \
              distance_from_marking, status) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(mark.tenant_id)
        .bind(mark.employee_id)
        .bind(mark.timestamp)
        .bind(mark.latitude)
        .bind(mark.longitude)
        .bind(mark.geo_marking_id)
        .bind(mark.distance_from_marking)
        .bind(mark.status)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, Attendance>("SELECT * FROM attendance WHERE id = ?")
            .bind(res.last_insert_id())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(MarkOutcome::Recorded(row))
    }

    async fn last_mark_between(
        &self,
        tenant_id: u64,
        employee_id: u64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<Attendance>, StoreError> {
        let mark = sqlx::query_as::<_, Attendance>(
            "SELECT * FROM attendance \
             WHERE tenant_id = ? AND employee_id = ? AND timestamp >= ? AND timestamp < ? \
             ORDER BY timestamp DESC, id DESC LIMIT 1",
        )
        .bind(tenant_id)
        .bind(employee_id)
        .bind(start)
        .bind(end)
        .fetch_optional(&self.pool)
        .await?;
        Ok(mark)
    }

    async fn first_in_between(
        &self,
        tenant_id: u64,
        employee_id: u64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<Attendance>, StoreError> {
        let mark = sqlx::query_as::<_, Attendance>(
            "SELECT * FROM attendance \
             WHERE tenant_id = ? AND employee_id = ? AND timestamp >= ? AND timestamp < ? \
             AND status = 'IN' \
             ORDER BY timestamp ASC, id ASC LIMIT 1",
        )
        .bind(tenant_id)
        .bind(employee_id)
        .bind(start)
        .bind(end)
        .fetch_optional(&self.pool)
        .await?;
        Ok(mark)
    }

    async fn marks_between(
        &self,
        tenant_id: u64,
        employee_id: u64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Attendance>, StoreError> {
        let marks = sqlx::query_as::<_, Attendance>(
            "SELECT * FROM attendance \
             WHERE tenant_id = ? AND employee_id = ? AND timestamp >= ? AND timestamp < ? \
             ORDER BY timestamp ASC, id ASC",
        )
        .bind(tenant_id)
        .bind(employee_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(marks)
    }
}
