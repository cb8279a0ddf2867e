//! Admin surface: employees, geomarkings, employee session management,
//! and attendance reporting within the admin's own tenant.

use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;

use crate::auth::extract::AdminAuth;
use crate::config::Config;
use crate::model::{
    attendance::Attendance,
    employee::Employee,
    geo_marking::{GeoMarking, GeoMarkingPatch},
    user::User,
};
use crate::service::{AttendanceSvc, ServiceError, SessionSvc};
use crate::service::attendance::DayCard;
use crate::store::{EmployeeStore, mysql::MySqlStore};

#[derive(Deserialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "EMP-007")]
    pub employee_no: String,
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane.doe@acme.com", nullable = true)]
    pub email: Option<String>,
    #[schema(example = "+8801712345678", nullable = true)]
    pub phone: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateGeoMarking {
    #[schema(example = "Head Office")]
    pub name: String,
    #[schema(example = 12.9716)]
    pub latitude: f64,
    #[schema(example = 77.5946)]
    pub longitude: f64,
    /// Defaults to the configured marking radius when omitted.
    #[schema(example = 2000.0, nullable = true)]
    pub radius_meters: Option<f64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Attendance row joined with the resolved marking's name.
#[derive(Serialize, ToSchema)]
pub struct AttendanceEntry {
    pub mark: Attendance,
    #[schema(example = "Head Office", nullable = true)]
    pub place: Option<String>,
}

/// The authenticated admin account.
#[utoipa::path(
    get,
    path = "/admin/me",
    responses(
        (status = 200, description = "Authenticated admin", body = User),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Admin"
)]
pub async fn get_me(auth: AdminAuth) -> impl Responder {
    HttpResponse::Ok().json(auth.user)
}

/// Create an employee in the admin's tenant.
#[utoipa::path(
    post,
    path = "/admin/tenant/employee",
    request_body = CreateEmployee,
    responses(
        (status = 200, description = "Employee created", body = Employee),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Admin"
)]
pub async fn create_employee(
    auth: AdminAuth,
    store: web::Data<MySqlStore>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<impl Responder> {
    let employee = store
        .create_employee(
            auth.user.tenant_id,
            &payload.employee_no,
            &payload.name,
            payload.email.as_deref(),
            payload.phone.as_deref(),
        )
        .await
        .map_err(ServiceError::from)?;

    Ok(HttpResponse::Ok().json(employee))
}

#[utoipa::path(
    get,
    path = "/admin/tenant/employee/{id}",
    params(("id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found")
    ),
    tag = "Admin"
)]
pub async fn get_employee(
    auth: AdminAuth,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee = store
        .employee(auth.user.tenant_id, path.into_inner())
        .await
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)?;

    Ok(HttpResponse::Ok().json(employee))
}

#[utoipa::path(
    get,
    path = "/admin/tenant/employees",
    responses((status = 200, description = "Tenant employees", body = [Employee])),
    tag = "Admin"
)]
pub async fn list_employees(
    auth: AdminAuth,
    store: web::Data<MySqlStore>,
) -> actix_web::Result<impl Responder> {
    let employees = store
        .employees(auth.user.tenant_id)
        .await
        .map_err(ServiceError::from)?;
    Ok(HttpResponse::Ok().json(employees))
}

#[utoipa::path(
    put,
    path = "/admin/tenant/employee/{id}/activate",
    params(("id", Path, description = "Employee ID")),
    responses((status = 200, description = "Employee activated")),
    tag = "Admin"
)]
pub async fn activate_employee(
    auth: AdminAuth,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    set_employee_active(auth, store, path.into_inner(), true).await
}

#[utoipa::path(
    put,
    path = "/admin/tenant/employee/{id}/deactivate",
    params(("id", Path, description = "Employee ID")),
    responses((status = 200, description = "Employee deactivated")),
    tag = "Admin"
)]
pub async fn deactivate_employee(
    auth: AdminAuth,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    set_employee_active(auth, store, path.into_inner(), false).await
}

async fn set_employee_active(
    auth: AdminAuth,
    store: web::Data<MySqlStore>,
    id: u64,
    active: bool,
) -> actix_web::Result<HttpResponse> {
    let affected = store
        .set_employee_active(auth.user.tenant_id, id, active)
        .await
        .map_err(ServiceError::from)?;
    if affected == 0 {
        return Err(ServiceError::NotFound.into());
    }

    Ok(HttpResponse::Ok().json(json!({ "is_active": active })))
}

/// Issue a one-time login token for an employee, to be delivered
/// out-of-band (e.g. as a link). Refused while the employee still has a
/// live session.
#[utoipa::path(
    post,
    path = "/admin/tenant/employee/{id}/idtoken",
    params(("id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Login token issued"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Employee already has a live session")
    ),
    tag = "Admin"
)]
pub async fn issue_login_token(
    auth: AdminAuth,
    store: web::Data<MySqlStore>,
    sessions: web::Data<SessionSvc>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee = store
        .employee(auth.user.tenant_id, path.into_inner())
        .await
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)?;

    let token = sessions
        .create_login_token(employee.tenant_id, employee.id)
        .await?;

    match token {
        Some(token) => Ok(HttpResponse::Ok().json(json!({ "token": token }))),
        None => Ok(HttpResponse::Conflict().json(json!({
            "error": "employee already has a live session"
        }))),
    }
}

/// Tear down an employee's session so a new login token can be issued.
#[utoipa::path(
    delete,
    path = "/admin/tenant/employee/{id}/session",
    params(("id", Path, description = "Employee ID")),
    responses((status = 200, description = "Session cleared")),
    tag = "Admin"
)]
pub async fn clear_employee_session(
    auth: AdminAuth,
    sessions: web::Data<SessionSvc>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    sessions
        .clear_session(auth.user.tenant_id, employee_id)
        .await?;

    info!(employee_id, "employee session cleared by admin");
    Ok(HttpResponse::Ok().json(json!({ "message": "OK" })))
}

/// Create a geomarking in the admin's tenant.
#[utoipa::path(
    post,
    path = "/admin/tenant/geomarking",
    request_body = CreateGeoMarking,
    responses((status = 200, description = "Marking created", body = GeoMarking)),
    tag = "Admin"
)]
pub async fn create_geo_marking(
    auth: AdminAuth,
    store: web::Data<MySqlStore>,
    config: web::Data<Config>,
    payload: web::Json<CreateGeoMarking>,
) -> actix_web::Result<impl Responder> {
    let marking = store
        .create_geo_marking(
            auth.user.tenant_id,
            &payload.name,
            payload.latitude,
            payload.longitude,
            payload
                .radius_meters
                .unwrap_or(config.default_marking_radius_m),
        )
        .await
        .map_err(ServiceError::from)?;

    Ok(HttpResponse::Ok().json(marking))
}

#[utoipa::path(
    get,
    path = "/admin/tenant/geomarking/{id}",
    params(("id", Path, description = "Marking ID")),
    responses(
        (status = 200, description = "Marking found", body = GeoMarking),
        (status = 404, description = "Marking not found")
    ),
    tag = "Admin"
)]
pub async fn get_geo_marking(
    auth: AdminAuth,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let marking = store
        .geo_marking(auth.user.tenant_id, path.into_inner())
        .await
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)?;

    Ok(HttpResponse::Ok().json(marking))
}

#[utoipa::path(
    get,
    path = "/admin/tenant/geomarking",
    responses((status = 200, description = "Tenant markings", body = [GeoMarking])),
    tag = "Admin"
)]
pub async fn list_geo_markings(
    auth: AdminAuth,
    store: web::Data<MySqlStore>,
) -> actix_web::Result<impl Responder> {
    let markings = store
        .geo_markings(auth.user.tenant_id)
        .await
        .map_err(ServiceError::from)?;
    Ok(HttpResponse::Ok().json(markings))
}

#[utoipa::path(
    put,
    path = "/admin/tenant/geomarking/{id}",
    params(("id", Path, description = "Marking ID")),
    request_body = GeoMarkingPatch,
    responses(
        (status = 200, description = "Marking updated", body = GeoMarking),
        (status = 404, description = "Marking not found")
    ),
    tag = "Admin"
)]
pub async fn update_geo_marking(
    auth: AdminAuth,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
    payload: web::Json<GeoMarkingPatch>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    let affected = store
        .update_geo_marking(auth.user.tenant_id, id, &payload)
        .await
        .map_err(ServiceError::from)?;
    if affected == 0 {
        return Err(ServiceError::NotFound.into());
    }

    let marking = store
        .geo_marking(auth.user.tenant_id, id)
        .await
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)?;
    Ok(HttpResponse::Ok().json(marking))
}

/// Attendance rows for an employee over a local-date range, joined with
/// marking names.
#[utoipa::path(
    get,
    path = "/admin/tenant/employee/{id}/attendance",
    params(
        ("id", Path, description = "Employee ID"),
        ("start", Query, description = "Range start (YYYY-MM-DD)"),
        ("end", Query, description = "Range end, inclusive (YYYY-MM-DD)")
    ),
    responses((status = 200, description = "Attendance rows", body = [AttendanceEntry])),
    tag = "Admin"
)]
pub async fn attendance_by_date(
    auth: AdminAuth,
    store: web::Data<MySqlStore>,
    attendance: web::Data<AttendanceSvc>,
    path: web::Path<u64>,
    range: web::Query<DateRange>,
) -> actix_web::Result<impl Responder> {
    let employee = store
        .employee(auth.user.tenant_id, path.into_inner())
        .await
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)?;

    let marks = attendance
        .attendance_between(employee.tenant_id, employee.id, range.start, range.end)
        .await?;

    let markings = store
        .geo_markings(employee.tenant_id)
        .await
        .map_err(ServiceError::from)?;
    let name_of = |id: Option<u64>| {
        id.and_then(|id| markings.iter().find(|m| m.id == id))
            .map(|m| m.name.clone())
    };

    let entries: Vec<AttendanceEntry> = marks
        .into_iter()
        .map(|mark| AttendanceEntry {
            place: name_of(mark.geo_marking_id),
            mark,
        })
        .collect();

    Ok(HttpResponse::Ok().json(entries))
}

/// Per-day attendance summary over a local-date range.
#[utoipa::path(
    get,
    path = "/admin/tenant/employee/{id}/attendance/card",
    params(
        ("id", Path, description = "Employee ID"),
        ("start", Query, description = "Range start (YYYY-MM-DD)"),
        ("end", Query, description = "Range end, inclusive (YYYY-MM-DD)")
    ),
    responses((status = 200, description = "Per-day summaries", body = [DayCard])),
    tag = "Admin"
)]
pub async fn attendance_card(
    auth: AdminAuth,
    store: web::Data<MySqlStore>,
    attendance: web::Data<AttendanceSvc>,
    path: web::Path<u64>,
    range: web::Query<DateRange>,
) -> actix_web::Result<impl Responder> {
    let employee = store
        .employee(auth.user.tenant_id, path.into_inner())
        .await
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)?;

    let cards = attendance
        .attendance_card(employee.tenant_id, employee.id, range.start, range.end)
        .await?;

    Ok(HttpResponse::Ok().json(cards))
}
