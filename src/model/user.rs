use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Tenant admin account. Authenticates with email + password and manages
/// employees and geomarkings within its own tenant.
#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct User {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1)]
    pub tenant_id: u64,

    #[schema(example = "admin@acme.com")]
    pub email: String,

    #[serde(skip_serializing)]
    #[schema(value_type = String, write_only)]
    pub password_hash: String,

    #[schema(example = "admin")]
    pub role: String,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,
}
