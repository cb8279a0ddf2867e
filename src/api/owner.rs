//! Owner surface: tenant lifecycle and tenant-admin accounts.

use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::auth::extract::OwnerAuth;
use crate::auth::password::hash_password;
use crate::model::{tenant::Tenant, user::User};
use crate::service::ServiceError;
use crate::store::mysql::MySqlStore;

#[derive(Deserialize, ToSchema)]
pub struct CreateTenant {
    #[schema(example = "Acme Logistics")]
    pub name: String,
    #[schema(example = "acme.png", nullable = true)]
    pub icon: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateTenantUser {
    #[schema(example = 1)]
    pub tenant_id: u64,
    #[schema(example = "admin@acme.com")]
    pub email: String,
    #[schema(example = "s3cret")]
    pub password: String,
    #[schema(example = "admin", nullable = true)]
    pub role: Option<String>,
}

/// Create a tenant.
#[utoipa::path(
    post,
    path = "/owner/tenant",
    request_body = CreateTenant,
    responses(
        (status = 200, description = "Tenant created", body = Tenant),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Owner"
)]
pub async fn create_tenant(
    _auth: OwnerAuth,
    store: web::Data<MySqlStore>,
    payload: web::Json<CreateTenant>,
) -> actix_web::Result<impl Responder> {
    let tenant = store
        .create_tenant(&payload.name, payload.icon.as_deref())
        .await
        .map_err(ServiceError::from)?;

    Ok(HttpResponse::Ok().json(tenant))
}

#[utoipa::path(
    get,
    path = "/owner/tenant/{id}",
    params(("id", Path, description = "Tenant ID")),
    responses(
        (status = 200, description = "Tenant found", body = Tenant),
        (status = 404, description = "Tenant not found")
    ),
    tag = "Owner"
)]
pub async fn get_tenant(
    _auth: OwnerAuth,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let tenant = store
        .tenant(path.into_inner())
        .await
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)?;

    Ok(HttpResponse::Ok().json(tenant))
}

#[utoipa::path(
    get,
    path = "/owner/tenants",
    responses((status = 200, description = "All tenants", body = [Tenant])),
    tag = "Owner"
)]
pub async fn list_tenants(
    _auth: OwnerAuth,
    store: web::Data<MySqlStore>,
) -> actix_web::Result<impl Responder> {
    let tenants = store.tenants().await.map_err(ServiceError::from)?;
    Ok(HttpResponse::Ok().json(tenants))
}

#[utoipa::path(
    put,
    path = "/owner/tenant/{id}/activate",
    params(("id", Path, description = "Tenant ID")),
    responses((status = 200, description = "Tenant activated")),
    tag = "Owner"
)]
pub async fn activate_tenant(
    auth: OwnerAuth,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    set_tenant_active(auth, store, path.into_inner(), true).await
}

#[utoipa::path(
    put,
    path = "/owner/tenant/{id}/deactivate",
    params(("id", Path, description = "Tenant ID")),
    responses((status = 200, description = "Tenant deactivated")),
    tag = "Owner"
)]
pub async fn deactivate_tenant(
    auth: OwnerAuth,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    set_tenant_active(auth, store, path.into_inner(), false).await
}

// Soft flag only; owned records are left in place.
async fn set_tenant_active(
    _auth: OwnerAuth,
    store: web::Data<MySqlStore>,
    id: u64,
    active: bool,
) -> actix_web::Result<HttpResponse> {
    let affected = store
        .set_tenant_active(id, active)
        .await
        .map_err(ServiceError::from)?;
    if affected == 0 {
        return Err(ServiceError::NotFound.into());
    }

    Ok(HttpResponse::Ok().json(json!({ "is_active": active })))
}

/// Create an admin account under a tenant.
#[utoipa::path(
    post,
    path = "/owner/tenants/user",
    request_body = CreateTenantUser,
    responses(
        (status = 200, description = "Admin user created", body = User),
        (status = 404, description = "Tenant not found")
    ),
    tag = "Owner"
)]
pub async fn create_tenant_user(
    _auth: OwnerAuth,
    store: web::Data<MySqlStore>,
    payload: web::Json<CreateTenantUser>,
) -> actix_web::Result<impl Responder> {
    store
        .tenant(payload.tenant_id)
        .await
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)?;

    let hashed = hash_password(&payload.password);
    let user = store
        .create_user(
            payload.tenant_id,
            &payload.email,
            &hashed,
            payload.role.as_deref().unwrap_or("admin"),
        )
        .await
        .map_err(ServiceError::from)?;

    Ok(HttpResponse::Ok().json(user))
}

#[utoipa::path(
    get,
    path = "/owner/tenant/{tenant_id}/user/{id}",
    params(
        ("tenant_id", Path, description = "Tenant ID"),
        ("id", Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 404, description = "User not found")
    ),
    tag = "Owner"
)]
pub async fn get_tenant_user(
    _auth: OwnerAuth,
    store: web::Data<MySqlStore>,
    path: web::Path<(u64, u64)>,
) -> actix_web::Result<impl Responder> {
    let (tenant_id, id) = path.into_inner();
    let user = store
        .user_in_tenant(tenant_id, id)
        .await
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)?;

    Ok(HttpResponse::Ok().json(user))
}

#[utoipa::path(
    get,
    path = "/owner/tenant/{tenant_id}/users",
    params(("tenant_id", Path, description = "Tenant ID")),
    responses((status = 200, description = "Tenant admin users", body = [User])),
    tag = "Owner"
)]
pub async fn list_tenant_users(
    _auth: OwnerAuth,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let users = store
        .users_in_tenant(path.into_inner())
        .await
        .map_err(ServiceError::from)?;
    Ok(HttpResponse::Ok().json(users))
}

#[utoipa::path(
    put,
    path = "/owner/tenant/{tenant_id}/user/{id}/activate",
    params(
        ("tenant_id", Path, description = "Tenant ID"),
        ("id", Path, description = "User ID")
    ),
    responses((status = 200, description = "User activated")),
    tag = "Owner"
)]
pub async fn activate_tenant_user(
    auth: OwnerAuth,
    store: web::Data<MySqlStore>,
    path: web::Path<(u64, u64)>,
) -> actix_web::Result<impl Responder> {
    set_user_active(auth, store, path.into_inner(), true).await
}

#[utoipa::path(
    put,
    path = "/owner/tenant/{tenant_id}/user/{id}/deactivate",
    params(
        ("tenant_id", Path, description = "Tenant ID"),
        ("id", Path, description = "User ID")
    ),
    responses((status = 200, description = "User deactivated")),
    tag = "Owner"
)]
pub async fn deactivate_tenant_user(
    auth: OwnerAuth,
    store: web::Data<MySqlStore>,
    path: web::Path<(u64, u64)>,
) -> actix_web::Result<impl Responder> {
    set_user_active(auth, store, path.into_inner(), false).await
}

async fn set_user_active(
    _auth: OwnerAuth,
    store: web::Data<MySqlStore>,
    (tenant_id, id): (u64, u64),
    active: bool,
) -> actix_web::Result<HttpResponse> {
    let affected = store
        .set_user_active(tenant_id, id, active)
        .await
        .map_err(ServiceError::from)?;
    if affected == 0 {
        return Err(ServiceError::NotFound.into());
    }

    Ok(HttpResponse::Ok().json(json!({ "is_active": active })))
}
