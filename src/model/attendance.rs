use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Attendance event status. Events must alternate per employee per day:
/// `NONE -> IN -> OUT -> IN -> ...`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    sqlx::Type,
    strum::Display,
    ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum MarkStatus {
    #[sqlx(rename = "IN")]
    In,
    #[sqlx(rename = "OUT")]
    Out,
}

/// A single attendance event. Rows are immutable once written; the daily
/// state is derived by querying, never by updating a row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Attendance {
    #[schema(example = 42)]
    pub id: u64,

    #[schema(example = 1)]
    pub tenant_id: u64,

    #[schema(example = 7)]
    pub employee_id: u64,

    pub timestamp: DateTime<Utc>,

    #[schema(example = 12.9701)]
    pub latitude: f64,

    #[schema(example = 77.5901)]
    pub longitude: f64,

    /// Nearest resolved geomarking; null when the tenant has none.
    #[schema(example = 3, nullable = true)]
    pub geo_marking_id: Option<u64>,

    /// Meters from the resolved marking (0 when none resolved).
    #[schema(example = 153.2)]
    pub distance_from_marking: f64,

    pub status: MarkStatus,
}

/// Fields of an attendance row before it is persisted.
#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub tenant_id: u64,
    pub employee_id: u64,
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub geo_marking_id: Option<u64>,
    pub distance_from_marking: f64,
    pub status: MarkStatus,
}
