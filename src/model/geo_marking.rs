use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A recognized work site: named coordinate plus an advisory radius.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct GeoMarking {
    #[schema(example = 3)]
    pub id: u64,

    #[schema(example = 1)]
    pub tenant_id: u64,

    #[schema(example = "Head Office")]
    pub name: String,

    #[schema(example = 12.9716)]
    pub latitude: f64,

    #[schema(example = 77.5946)]
    pub longitude: f64,

    /// Advisory only; marks are accepted at any distance from the nearest
    /// marking.
    #[schema(example = 2000.0)]
    pub radius_meters: f64,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,
}

/// Partial update for a marking; absent fields are left untouched.
#[derive(Debug, Deserialize, ToSchema)]
pub struct GeoMarkingPatch {
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_meters: Option<f64>,
    pub is_active: Option<bool>,
}
