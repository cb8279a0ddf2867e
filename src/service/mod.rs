//! Core services and the outcome taxonomy they surface.

pub mod attendance;
pub mod session;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use tracing::error;

use crate::clock::SystemClock;
use crate::store::{StoreError, mysql::MySqlStore};

/// Discriminated outcomes of the core services.
///
/// Authentication failures are deliberately uniform at the boundary — the
/// failing check is logged, never echoed. State-machine rejections carry a
/// specific, actionable message and leave the session valid.
#[derive(Debug, derive_more::Display)]
pub enum ServiceError {
    #[display(fmt = "Not authenticated")]
    NotAuthenticated,

    #[display(fmt = "{}", _0)]
    InvalidState(&'static str),

    #[display(fmt = "Not found")]
    NotFound,

    #[display(fmt = "storage failure: {}", _0)]
    Storage(StoreError),
}

impl std::error::Error for ServiceError {}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        ServiceError::Storage(e)
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            ServiceError::InvalidState(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound => StatusCode::NOT_FOUND,
            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ServiceError::NotAuthenticated => "Not authenticated",
            ServiceError::InvalidState(msg) => msg,
            ServiceError::NotFound => "Not found",
            ServiceError::Storage(e) => {
                error!(error = %e, "storage failure");
                "Internal Server Error"
            }
        };

        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}

/// Concrete service types wired to MySQL for the HTTP surface.
pub type SessionSvc = session::SessionService<MySqlStore, SystemClock>;
pub type AttendanceSvc = attendance::AttendanceService<MySqlStore, SystemClock>;
