use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted employee session token kinds. At most one row may exist per
/// (employee_id, token_type); issuing a new one replaces the old row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, strum::Display)]
pub enum TokenKind {
    #[serde(rename = "access_token_employee")]
    #[sqlx(rename = "access_token_employee")]
    #[strum(serialize = "access_token_employee")]
    Access,

    #[serde(rename = "refresh_token_employee")]
    #[sqlx(rename = "refresh_token_employee")]
    #[strum(serialize = "refresh_token_employee")]
    Refresh,
}

/// A stored session token. `token_hash` holds the signed token string
/// itself and is compared verbatim against presented tokens.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TokenRecord {
    pub id: u64,
    pub tenant_id: u64,
    pub employee_id: u64,
    pub token_type: TokenKind,
    pub token_hash: String,
    pub device_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewToken {
    pub tenant_id: u64,
    pub employee_id: u64,
    pub token_type: TokenKind,
    pub token_hash: String,
    pub device_hash: String,
    pub expires_at: DateTime<Utc>,
}
