use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Tenant {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Acme Logistics")]
    pub name: String,

    #[schema(example = "acme.png", nullable = true)]
    pub icon: Option<String>,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,
}
