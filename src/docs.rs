use utoipa::OpenApi;

use crate::api::admin::{AttendanceEntry, CreateEmployee, CreateGeoMarking, DateRange};
use crate::api::employee::{Coordinate, MarkResponse};
use crate::api::owner::{CreateTenant, CreateTenantUser};
use crate::auth::handlers::LoginDto;
use crate::model::attendance::{Attendance, MarkStatus};
use crate::model::employee::Employee;
use crate::model::geo_marking::{GeoMarking, GeoMarkingPatch};
use crate::model::tenant::Tenant;
use crate::model::user::User;
use crate::service::attendance::{DayCard, DayStatus};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Geoattend API",
        version = "1.0.0",
        description = r#"
## Multi-tenant geofenced attendance tracking

Owners manage tenants, tenant admins manage employees and geomarkings, and
employees mark in/out with their phone's location.

### Roles
- **Owner** — configured principal; creates tenants and their admin accounts
- **Admin** — per-tenant; manages employees, geomarkings, login links, reports
- **Employee** — mobile-only, cookie session bootstrapped from a login link

### Sessions
Employee sessions are an access/refresh cookie pair bound to the device
fingerprint. An expired access token is rotated transparently through the
refresh token; the fresh cookie rides on the response.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::owner_login,
        crate::auth::handlers::admin_login,
        crate::auth::handlers::admin_logout,

        crate::api::owner::create_tenant,
        crate::api::owner::get_tenant,
        crate::api::owner::list_tenants,
        crate::api::owner::activate_tenant,
        crate::api::owner::deactivate_tenant,
        crate::api::owner::create_tenant_user,
        crate::api::owner::get_tenant_user,
        crate::api::owner::list_tenant_users,
        crate::api::owner::activate_tenant_user,
        crate::api::owner::deactivate_tenant_user,

        crate::api::admin::get_me,
        crate::api::admin::create_employee,
        crate::api::admin::get_employee,
        crate::api::admin::list_employees,
        crate::api::admin::activate_employee,
        crate::api::admin::deactivate_employee,
        crate::api::admin::issue_login_token,
        crate::api::admin::clear_employee_session,
        crate::api::admin::create_geo_marking,
        crate::api::admin::get_geo_marking,
        crate::api::admin::list_geo_markings,
        crate::api::admin::update_geo_marking,
        crate::api::admin::attendance_by_date,
        crate::api::admin::attendance_card,

        crate::api::employee::employee_login,
        crate::api::employee::get_me,
        crate::api::employee::mark_in,
        crate::api::employee::mark_out
    ),
    components(
        schemas(
            LoginDto,
            Tenant,
            CreateTenant,
            User,
            CreateTenantUser,
            Employee,
            CreateEmployee,
            GeoMarking,
            GeoMarkingPatch,
            CreateGeoMarking,
            Attendance,
            MarkStatus,
            AttendanceEntry,
            DateRange,
            DayCard,
            DayStatus,
            Coordinate,
            MarkResponse
        )
    ),
    tags(
        (name = "Owner", description = "Tenant and admin-account management"),
        (name = "Admin", description = "Per-tenant employee, marking, and report APIs"),
        (name = "Employee", description = "Mobile attendance APIs"),
    )
)]
pub struct ApiDoc;
