//! Request guards for the three trust levels.
//!
//! Every rejection surfaces as the uniform `NotAuthenticated` outcome; the
//! failing check is only logged.

use actix_web::{
    Error, FromRequest, HttpRequest,
    cookie::{Cookie, time::Duration as CookieDuration},
    dev::Payload,
    error::ErrorInternalServerError,
    web::Data,
};
use futures::future::{LocalBoxFuture, Ready, ready};
use tracing::debug;

use crate::auth::fingerprint;
use crate::auth::jwt::{AdminClaims, Level, OwnerClaims, TokenCodec};
use crate::config::Config;
use crate::model::{employee::Employee, user::User};
use crate::service::{ServiceError, SessionSvc};
use crate::store::{EmployeeStore, mysql::MySqlStore};

/// Verified owner request. The owner is a configured principal; the claims
/// carry no ids, only the device and address bindings.
pub struct OwnerAuth;

impl FromRequest for OwnerAuth {
    type Error = Error;
    type Future = Ready<Result<Self, Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authorize_owner(req))
    }
}

fn authorize_owner(req: &HttpRequest) -> Result<OwnerAuth, Error> {
    let codec = req
        .app_data::<Data<TokenCodec>>()
        .ok_or_else(|| ErrorInternalServerError("token codec missing"))?;

    let cookie = req
        .cookie("access_token")
        .ok_or(ServiceError::NotAuthenticated)?;
    let claims: OwnerClaims = codec
        .verify(cookie.value())
        .ok_or(ServiceError::NotAuthenticated)?;

    if claims.level != Level::Owner {
        debug!("owner cookie carries a non-owner token");
        return Err(ServiceError::NotAuthenticated.into());
    }
    if claims.ua_hash != fingerprint::device_hash(req) {
        debug!("owner token presented from a different device");
        return Err(ServiceError::NotAuthenticated.into());
    }
    if claims.ip_hash != fingerprint::ip_hash(req) {
        debug!("owner token presented from a different address");
        return Err(ServiceError::NotAuthenticated.into());
    }

    Ok(OwnerAuth)
}

/// Verified admin request, resolved to the active tenant admin row.
pub struct AdminAuth {
    pub user: User,
}

impl FromRequest for AdminAuth {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let codec = req
                .app_data::<Data<TokenCodec>>()
                .ok_or_else(|| ErrorInternalServerError("token codec missing"))?;
            let store = req
                .app_data::<Data<MySqlStore>>()
                .ok_or_else(|| ErrorInternalServerError("store missing"))?;

            let cookie = req
                .cookie("access_token_admin")
                .ok_or(ServiceError::NotAuthenticated)?;
            let claims: AdminClaims = codec
                .verify(cookie.value())
                .ok_or(ServiceError::NotAuthenticated)?;

            if claims.level != Level::Admin {
                debug!("admin cookie carries a non-admin token");
                return Err(ServiceError::NotAuthenticated.into());
            }
            if claims.ua_hash != fingerprint::device_hash(&req) {
                debug!("admin token presented from a different device");
                return Err(ServiceError::NotAuthenticated.into());
            }
            if claims.ip_hash != fingerprint::ip_hash(&req) {
                debug!("admin token presented from a different address");
                return Err(ServiceError::NotAuthenticated.into());
            }

            let user_id: u64 = claims
                .user_id
                .parse()
                .map_err(|_| ServiceError::NotAuthenticated)?;
            let tenant_id: u64 = claims
                .tenant_id
                .parse()
                .map_err(|_| ServiceError::NotAuthenticated)?;

            let user = store.user(user_id).await.map_err(ServiceError::from)?;
            match user {
                Some(user) if user.is_active && user.tenant_id == tenant_id => {
                    Ok(AdminAuth { user })
                }
                _ => {
                    debug!(user_id, "admin missing, inactive, or tenant mismatch");
                    Err(ServiceError::NotAuthenticated.into())
                }
            }
        })
    }
}

/// Verified employee request: session validated (rotating the access token
/// when needed) and resolved to the active employee row.
pub struct EmployeeAuth {
    pub employee: Employee,
    rotated_access: Option<String>,
}

impl EmployeeAuth {
    /// Fresh `act_employee` cookie when this request rotated the access
    /// token; handlers attach it to their response.
    pub fn rotated_cookie(&self, cfg: &Config) -> Option<Cookie<'static>> {
        self.rotated_access.as_ref().map(|token| {
            Cookie::build("act_employee", token.clone())
                .http_only(true)
                .path("/")
                .max_age(CookieDuration::minutes(cfg.access_token_ttl_minutes))
                .finish()
        })
    }
}

impl FromRequest for EmployeeAuth {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            if !fingerprint::is_mobile(&req) {
                debug!("employee request from a non-mobile device");
                return Err(ServiceError::NotAuthenticated.into());
            }

            let sessions = req
                .app_data::<Data<SessionSvc>>()
                .ok_or_else(|| ErrorInternalServerError("session service missing"))?;
            let store = req
                .app_data::<Data<MySqlStore>>()
                .ok_or_else(|| ErrorInternalServerError("store missing"))?;

            let access = req.cookie("act_employee").map(|c| c.value().to_string());
            let refresh = req.cookie("rft_employee").map(|c| c.value().to_string());
            if refresh.is_none() {
                debug!("refresh cookie missing");
                return Err(ServiceError::NotAuthenticated.into());
            }

            let device = fingerprint::device_hash(&req);
            let (record, rotated) = sessions
                .validate_session(access.as_deref(), refresh.as_deref(), &device)
                .await?;

            let employee = store
                .employee(record.tenant_id, record.employee_id)
                .await
                .map_err(ServiceError::from)?;
            let employee = match employee {
                Some(employee) if employee.is_active => employee,
                _ => {
                    debug!(employee_id = record.employee_id, "employee missing or inactive");
                    return Err(ServiceError::NotAuthenticated.into());
                }
            };

            Ok(EmployeeAuth {
                employee,
                rotated_access: rotated.then(|| record.token_hash),
            })
        })
    }
}
