//! Owner and admin login. Employee login lives on the employee surface
//! (`api::employee`) since it exchanges a link token, not credentials.

use actix_web::{
    HttpRequest, HttpResponse, Responder,
    cookie::{Cookie, time::Duration as CookieDuration},
    web,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::auth::fingerprint::{device_hash, ip_hash};
use crate::auth::jwt::TokenCodec;
use crate::auth::password::verify_password;
use crate::config::Config;
use crate::service::ServiceError;
use crate::store::mysql::MySqlStore;

#[derive(Deserialize, ToSchema)]
pub struct LoginDto {
    #[schema(example = "admin@acme.com")]
    pub username: String,
    #[schema(example = "s3cret")]
    pub password: String,
}

fn not_authenticated() -> HttpResponse {
    HttpResponse::Unauthorized().json(json!({ "error": "Not authenticated" }))
}

/// Owner login against the configured principal.
#[utoipa::path(
    post,
    path = "/owner/login",
    request_body = LoginDto,
    responses(
        (status = 200, description = "Owner session cookie set"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Owner"
)]
#[instrument(name = "owner_login", skip_all)]
pub async fn owner_login(
    req: HttpRequest,
    credential: web::Json<LoginDto>,
    config: web::Data<Config>,
    codec: web::Data<TokenCodec>,
) -> impl Responder {
    if credential.username != config.owner_username
        || credential.password != config.owner_password
    {
        info!("owner login rejected");
        return not_authenticated();
    }

    let token = codec.issue_owner(
        device_hash(&req),
        ip_hash(&req),
        Utc::now(),
        Duration::minutes(config.owner_token_ttl_minutes),
    );

    info!("owner login successful");
    HttpResponse::Ok()
        .cookie(
            Cookie::build("access_token", token.clone())
                .http_only(true)
                .path("/")
                .max_age(CookieDuration::minutes(config.owner_token_ttl_minutes))
                .finish(),
        )
        .json(json!({ "access_token": token }))
}

/// Tenant admin login.
#[utoipa::path(
    post,
    path = "/admin/login",
    request_body = LoginDto,
    responses(
        (status = 200, description = "Admin session cookie set"),
        (status = 401, description = "Not authenticated")
    ),
    tag = "Admin"
)]
#[instrument(name = "admin_login", skip_all, fields(email = %credential.username))]
pub async fn admin_login(
    req: HttpRequest,
    credential: web::Json<LoginDto>,
    store: web::Data<MySqlStore>,
    config: web::Data<Config>,
    codec: web::Data<TokenCodec>,
) -> actix_web::Result<impl Responder> {
    let user = store
        .user_by_email(&credential.username)
        .await
        .map_err(ServiceError::from)?;

    // Uniform rejection: missing account, inactive account, and password
    // mismatch are indistinguishable to the caller.
    let Some(user) = user else {
        info!("admin login rejected: unknown email");
        return Ok(not_authenticated());
    };
    if !user.is_active || !verify_password(&credential.password, &user.password_hash) {
        info!(user_id = user.id, "admin login rejected");
        return Ok(not_authenticated());
    }

    let token = codec.issue_admin(
        user.id,
        user.tenant_id,
        device_hash(&req),
        ip_hash(&req),
        Utc::now(),
        Duration::minutes(config.admin_token_ttl_minutes),
    );

    info!(user_id = user.id, "admin login successful");
    Ok(HttpResponse::Ok()
        .cookie(
            Cookie::build("access_token_admin", token.clone())
                .http_only(true)
                .path("/")
                .max_age(CookieDuration::minutes(config.admin_token_ttl_minutes))
                .finish(),
        )
        .json(json!({ "access_token": token })))
}

/// Admin logout: drop the session cookie.
#[utoipa::path(
    post,
    path = "/admin/logout",
    responses((status = 200, description = "Logged out")),
    tag = "Admin"
)]
pub async fn admin_logout() -> impl Responder {
    let mut cookie = Cookie::build("access_token_admin", "").path("/").finish();
    cookie.make_removal();

    HttpResponse::Ok()
        .cookie(cookie)
        .json(json!({ "message": "Logged out" }))
}
