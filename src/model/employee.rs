use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 7,
        "tenant_id": 1,
        "employee_no": "EMP-007",
        "name": "Jane Doe",
        "email": "jane.doe@acme.com",
        "phone": "+8801712345678",
        "is_active": true,
        "created_at": "2026-01-01T08:00:00Z"
    })
)]
pub struct Employee {
    #[schema(example = 7)]
    pub id: u64,

    #[schema(example = 1)]
    pub tenant_id: u64,

    #[schema(example = "EMP-007")]
    pub employee_no: String,

    #[schema(example = "Jane Doe")]
    pub name: String,

    #[schema(example = "jane.doe@acme.com", nullable = true)]
    pub email: Option<String>,

    #[schema(example = "+8801712345678", nullable = true)]
    pub phone: Option<String>,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,
}
