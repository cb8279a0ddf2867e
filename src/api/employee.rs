//! Employee surface: login-token exchange and the attendance operations.
//! All of it is cookie-based and gated to mobile devices.

use actix_web::{
    HttpRequest, HttpResponse, Responder,
    cookie::{Cookie, time::Duration as CookieDuration},
    web,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

use crate::auth::extract::EmployeeAuth;
use crate::auth::fingerprint::{device_hash, is_mobile};
use crate::config::Config;
use crate::model::attendance::Attendance;
use crate::service::attendance::DayState;
use crate::service::{AttendanceSvc, ServiceError, SessionSvc};
use crate::store::{EmployeeStore, mysql::MySqlStore};

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct Coordinate {
    #[schema(example = 12.9701)]
    pub lat: f64,
    #[schema(example = 77.5901)]
    pub lon: f64,
}

/// A recorded mark plus the resolved marking's name.
#[derive(Serialize, ToSchema)]
pub struct MarkResponse {
    pub mark: Attendance,
    #[schema(example = "Head Office", nullable = true)]
    pub place: Option<String>,
}

/// Exchange a login token for an employee session.
///
/// The token arrives as a link opened on the employee's phone; the session
/// it creates is bound to that device's fingerprint.
#[utoipa::path(
    get,
    path = "/e/t/{token}",
    params(("token", Path, description = "One-time login token")),
    responses(
        (status = 200, description = "Session cookies set"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Employee"
)]
#[instrument(name = "employee_login", skip_all)]
pub async fn employee_login(
    req: HttpRequest,
    path: web::Path<String>,
    store: web::Data<MySqlStore>,
    sessions: web::Data<SessionSvc>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    if !is_mobile(&req) {
        debug!("login exchange from a non-mobile device");
        return Err(ServiceError::NotAuthenticated.into());
    }

    let subject = sessions
        .exchange_login_token(&path.into_inner())
        .ok_or(ServiceError::NotAuthenticated)?;

    let employee = store
        .employee(subject.tenant_id, subject.employee_id)
        .await
        .map_err(ServiceError::from)?;
    match employee {
        Some(employee) if employee.is_active => {}
        _ => {
            debug!(
                employee_id = subject.employee_id,
                "login token for missing or inactive employee"
            );
            return Err(ServiceError::NotAuthenticated.into());
        }
    }

    let tokens = sessions
        .issue_session(subject.tenant_id, subject.employee_id, &device_hash(&req))
        .await?;

    info!(employee_id = subject.employee_id, "employee session issued");
    Ok(HttpResponse::Ok()
        .cookie(
            Cookie::build("act_employee", tokens.access.clone())
                .http_only(true)
                .path("/")
                .max_age(CookieDuration::minutes(config.access_token_ttl_minutes))
                .finish(),
        )
        .cookie(
            Cookie::build("rft_employee", tokens.refresh.clone())
                .http_only(true)
                .path("/")
                .max_age(CookieDuration::minutes(config.refresh_token_ttl_minutes))
                .finish(),
        )
        .json(json!({ "refresh": tokens.refresh, "access": tokens.access })))
}

/// The authenticated employee plus today's derived state.
#[utoipa::path(
    get,
    path = "/employee/me",
    responses(
        (status = 200, description = "Employee and today's state"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Employee"
)]
pub async fn get_me(
    auth: EmployeeAuth,
    attendance: web::Data<AttendanceSvc>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let state: DayState = attendance
        .day_state(auth.employee.tenant_id, auth.employee.id)
        .await?;

    let resp = HttpResponse::Ok().json(json!({
        "employee": auth.employee,
        "state": state.last,
        "today_in": state.first_in,
    }));
    Ok(with_rotated_cookie(resp, &auth, &config))
}

/// Record a mark-in at the given coordinates.
#[utoipa::path(
    post,
    path = "/employee/markin",
    request_body = Coordinate,
    responses(
        (status = 200, description = "Marked in", body = MarkResponse),
        (status = 400, description = "Already marked in"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Employee"
)]
pub async fn mark_in(
    auth: EmployeeAuth,
    attendance: web::Data<AttendanceSvc>,
    config: web::Data<Config>,
    coordinates: web::Json<Coordinate>,
) -> actix_web::Result<impl Responder> {
    let (mark, nearest) = attendance
        .mark_in(&auth.employee, coordinates.lat, coordinates.lon)
        .await?;

    let resp = HttpResponse::Ok().json(MarkResponse {
        mark,
        place: nearest.map(|m| m.name),
    });
    Ok(with_rotated_cookie(resp, &auth, &config))
}

/// Record a mark-out at the given coordinates.
#[utoipa::path(
    post,
    path = "/employee/markout",
    request_body = Coordinate,
    responses(
        (status = 200, description = "Marked out", body = MarkResponse),
        (status = 400, description = "Not currently marked in"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Employee"
)]
pub async fn mark_out(
    auth: EmployeeAuth,
    attendance: web::Data<AttendanceSvc>,
    config: web::Data<Config>,
    coordinates: web::Json<Coordinate>,
) -> actix_web::Result<impl Responder> {
    let (mark, nearest) = attendance
        .mark_out(&auth.employee, coordinates.lat, coordinates.lon)
        .await?;

    let resp = HttpResponse::Ok().json(MarkResponse {
        mark,
        place: nearest.map(|m| m.name),
    });
    Ok(with_rotated_cookie(resp, &auth, &config))
}

/// Re-set the access cookie when this request rotated the session.
fn with_rotated_cookie(
    mut resp: HttpResponse,
    auth: &EmployeeAuth,
    config: &Config,
) -> HttpResponse {
    if let Some(cookie) = auth.rotated_cookie(config) {
        let _ = resp.add_cookie(&cookie);
    }
    resp
}
