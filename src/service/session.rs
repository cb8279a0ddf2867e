//! Employee session protocol: login-token bootstrap, access/refresh
//! issuance, validation with rotation, and teardown.
//!
//! Per employee and device the session moves through
//! `no session -> login token issued -> active -> access expired /
//! refresh valid -> (rotate) -> active`; an expired refresh token or a
//! device mismatch requires a full re-login.

use chrono::Duration;
use tracing::{debug, info};

use crate::auth::jwt::{EmployeeClaims, Level, Purpose, TokenCodec};
use crate::clock::Clock;
use crate::config::Config;
use crate::model::token::{NewToken, TokenKind, TokenRecord};
use crate::service::ServiceError;
use crate::store::TokenStore;

#[derive(Debug, Clone, Copy)]
pub struct SessionTtl {
    pub login: Duration,
    pub access: Duration,
    pub refresh: Duration,
}

impl SessionTtl {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            login: Duration::minutes(cfg.login_token_ttl_minutes),
            access: Duration::minutes(cfg.access_token_ttl_minutes),
            refresh: Duration::minutes(cfg.refresh_token_ttl_minutes),
        }
    }
}

/// The (tenant, employee) a verified token speaks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSubject {
    pub tenant_id: u64,
    pub employee_id: u64,
}

#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub refresh: String,
    pub access: String,
}

pub struct SessionService<S, C> {
    store: S,
    codec: TokenCodec,
    clock: C,
    ttl: SessionTtl,
}

impl<S: TokenStore, C: Clock> SessionService<S, C> {
    pub fn new(store: S, codec: TokenCodec, clock: C, ttl: SessionTtl) -> Self {
        Self {
            store,
            codec,
            clock,
            ttl,
        }
    }

    /// Short-lived bootstrap token for an employee, delivered out-of-band.
    ///
    /// Refused (`None`) while the employee still has a live refresh token:
    /// a login token is a single-use bootstrap, not a second session.
    pub async fn create_login_token(
        &self,
        tenant_id: u64,
        employee_id: u64,
    ) -> Result<Option<String>, ServiceError> {
        let existing = self
            .store
            .find_token(tenant_id, employee_id, TokenKind::Refresh)
            .await?;
        if existing.is_some() {
            info!(tenant_id, employee_id, "refresh token live, login token refused");
            return Ok(None);
        }

        let now = self.clock.now_utc();
        Ok(Some(self.codec.issue_employee(
            tenant_id,
            employee_id,
            Purpose::Login,
            now,
            self.ttl.login,
        )))
    }

    /// Signature/expiry/purpose check only; the session store is untouched.
    pub fn exchange_login_token(&self, token: &str) -> Option<SessionSubject> {
        let claims: EmployeeClaims = self.codec.verify(token)?;
        if claims.purpose != Purpose::Login || claims.level != Level::Employee {
            debug!("login token has wrong purpose or level");
            return None;
        }
        subject_of(&claims)
    }

    /// Mint and persist an access/refresh pair bound to `device_hash`,
    /// replacing any prior session for the employee.
    pub async fn issue_session(
        &self,
        tenant_id: u64,
        employee_id: u64,
        device_hash: &str,
    ) -> Result<SessionTokens, ServiceError> {
        let now = self.clock.now_utc();

        let refresh =
            self.codec
                .issue_employee(tenant_id, employee_id, Purpose::AuthRefresh, now, self.ttl.refresh);
        let access =
            self.codec
                .issue_employee(tenant_id, employee_id, Purpose::Auth, now, self.ttl.access);

        self.store
            .replace_token(NewToken {
                tenant_id,
                employee_id,
                token_type: TokenKind::Refresh,
                token_hash: refresh.clone(),
                device_hash: device_hash.to_string(),
                expires_at: now + self.ttl.refresh,
            })
            .await?;
        self.store
            .replace_token(NewToken {
                tenant_id,
                employee_id,
                token_type: TokenKind::Access,
                token_hash: access.clone(),
                device_hash: device_hash.to_string(),
                expires_at: now + self.ttl.access,
            })
            .await?;

        Ok(SessionTokens { refresh, access })
    }

    /// Validate the presented session, rotating the access token through
    /// the refresh token when needed.
    ///
    /// Returns the authoritative access-token record and whether it was
    /// rotated. Every failure — missing or mismatched record, device
    /// mismatch, expiry — collapses to `NotAuthenticated`.
    pub async fn validate_session(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
        device_hash: &str,
    ) -> Result<(TokenRecord, bool), ServiceError> {
        let now = self.clock.now_utc();

        if let Some(subject) = access_token.and_then(|t| self.verify_employee(t, Purpose::Auth)) {
            let record = self
                .store
                .find_token(subject.tenant_id, subject.employee_id, TokenKind::Access)
                .await?
                .ok_or(ServiceError::NotAuthenticated)?;

            if record.token_hash != access_token.unwrap_or_default() {
                debug!("presented access token does not match the stored one");
                return Err(ServiceError::NotAuthenticated);
            }
            if record.device_hash != device_hash {
                debug!("access token presented from a different device");
                return Err(ServiceError::NotAuthenticated);
            }
            if record.expires_at <= now {
                debug!("stored access token record expired");
                return Err(ServiceError::NotAuthenticated);
            }

            return Ok((record, false));
        }

        // Access token absent or expired: fall back to the refresh token.
        let Some(refresh_token) = refresh_token else {
            debug!("no refresh token presented");
            return Err(ServiceError::NotAuthenticated);
        };
        let Some(subject) = self.verify_employee(refresh_token, Purpose::AuthRefresh) else {
            debug!("refresh token invalid or expired");
            return Err(ServiceError::NotAuthenticated);
        };

        let record = self
            .store
            .find_token(subject.tenant_id, subject.employee_id, TokenKind::Refresh)
            .await?
            .ok_or(ServiceError::NotAuthenticated)?;

        if record.token_hash != refresh_token {
            debug!("presented refresh token does not match the stored one");
            return Err(ServiceError::NotAuthenticated);
        }
        if record.device_hash != device_hash {
            debug!("refresh token presented from a different device");
            return Err(ServiceError::NotAuthenticated);
        }
        if record.expires_at <= now {
            debug!("stored refresh token record expired");
            return Err(ServiceError::NotAuthenticated);
        }

        // Drop the stale access record, then mint and persist a fresh one.
        if let Some(stale) = self
            .store
            .find_token(subject.tenant_id, subject.employee_id, TokenKind::Access)
            .await?
        {
            self.store.delete_token(stale.id).await?;
        }

        let access = self.codec.issue_employee(
            subject.tenant_id,
            subject.employee_id,
            Purpose::Auth,
            now,
            self.ttl.access,
        );
        let rotated = self
            .store
            .replace_token(NewToken {
                tenant_id: subject.tenant_id,
                employee_id: subject.employee_id,
                token_type: TokenKind::Access,
                token_hash: access,
                device_hash: device_hash.to_string(),
                expires_at: now + self.ttl.access,
            })
            .await?;
        debug!(
            tenant_id = subject.tenant_id,
            employee_id = subject.employee_id,
            "access token rotated"
        );

        Ok((rotated, true))
    }

    /// Delete both session records. Missing rows are a no-op.
    pub async fn clear_session(
        &self,
        tenant_id: u64,
        employee_id: u64,
    ) -> Result<(), ServiceError> {
        for kind in [TokenKind::Access, TokenKind::Refresh] {
            if let Some(record) = self.store.find_token(tenant_id, employee_id, kind).await? {
                self.store.delete_token(record.id).await?;
            }
        }
        Ok(())
    }

    fn verify_employee(&self, token: &str, purpose: Purpose) -> Option<SessionSubject> {
        let claims: EmployeeClaims = self.codec.verify(token)?;
        if claims.purpose != purpose || claims.level != Level::Employee {
            debug!("token purpose or level mismatch");
            return None;
        }
        subject_of(&claims)
    }
}

fn subject_of(claims: &EmployeeClaims) -> Option<SessionSubject> {
    let tenant_id = claims.tenant_id.parse().ok()?;
    let employee_id = claims.employee_id.parse().ok()?;
    Some(SessionSubject {
        tenant_id,
        employee_id,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::clock::testing::ManualClock;
    use crate::store::memory::MemStore;

    const DEVICE: &str = "device-1";

    fn ttl() -> SessionTtl {
        SessionTtl {
            login: Duration::minutes(5),
            access: Duration::minutes(20),
            refresh: Duration::minutes(10080),
        }
    }

    fn service(store: MemStore, clock: ManualClock) -> SessionService<MemStore, ManualClock> {
        SessionService::new(
            store,
            TokenCodec::new("test-secret-key-min-32-characters-long"),
            clock,
            ttl(),
        )
    }

    #[actix_web::test]
    async fn login_token_exchanges_into_a_session() {
        let svc = service(MemStore::new(), ManualClock::at(Utc::now()));

        let login = svc.create_login_token(1, 7).await.unwrap().expect("token");
        let subject = svc.exchange_login_token(&login).expect("valid login token");
        assert_eq!(
            subject,
            SessionSubject {
                tenant_id: 1,
                employee_id: 7
            }
        );
    }

    #[actix_web::test]
    async fn login_token_refused_while_refresh_is_live() {
        let store = MemStore::new();
        let svc = service(store.clone(), ManualClock::at(Utc::now()));

        svc.issue_session(1, 7, DEVICE).await.unwrap();
        assert!(svc.create_login_token(1, 7).await.unwrap().is_none());

        // Another employee of the same tenant is unaffected.
        assert!(svc.create_login_token(1, 8).await.unwrap().is_some());
    }

    #[actix_web::test]
    async fn access_token_validates_unrotated() {
        let store = MemStore::new();
        let svc = service(store.clone(), ManualClock::at(Utc::now()));

        let tokens = svc.issue_session(1, 7, DEVICE).await.unwrap();
        let (record, rotated) = svc
            .validate_session(Some(tokens.access.as_str()), Some(tokens.refresh.as_str()), DEVICE)
            .await
            .unwrap();

        assert!(!rotated);
        assert_eq!(record.token_hash, tokens.access);
        assert_eq!(store.token_count(), 2);
    }

    #[actix_web::test]
    async fn expired_access_rotates_through_refresh() {
        let store = MemStore::new();
        // Issue in the past so the access token is expired in real time
        // (jwt expiry is checked against the system clock) while the
        // refresh token is still live.
        let clock = ManualClock::at(Utc::now() - Duration::minutes(30));
        let svc = service(store.clone(), clock.clone());

        let tokens = svc.issue_session(1, 7, DEVICE).await.unwrap();
        clock.advance(Duration::minutes(30));

        let (record, rotated) = svc
            .validate_session(Some(tokens.access.as_str()), Some(tokens.refresh.as_str()), DEVICE)
            .await
            .unwrap();

        assert!(rotated);
        assert_ne!(record.token_hash, tokens.access);

        // The stale access record is gone; exactly one access row remains.
        let stored = store.find_token(1, 7, TokenKind::Access).await.unwrap().unwrap();
        assert_eq!(stored.token_hash, record.token_hash);
        assert_eq!(store.token_count(), 2);
    }

    #[actix_web::test]
    async fn expired_refresh_fails_closed() {
        let store = MemStore::new();
        let clock = ManualClock::at(Utc::now() - Duration::days(8));
        let svc = service(store.clone(), clock.clone());

        let tokens = svc.issue_session(1, 7, DEVICE).await.unwrap();
        clock.advance(Duration::days(8));

        let result = svc
            .validate_session(Some(tokens.access.as_str()), Some(tokens.refresh.as_str()), DEVICE)
            .await;
        assert!(matches!(result, Err(ServiceError::NotAuthenticated)));
    }

    #[actix_web::test]
    async fn device_mismatch_rejects_valid_tokens() {
        let svc = service(MemStore::new(), ManualClock::at(Utc::now()));

        let tokens = svc.issue_session(1, 7, DEVICE).await.unwrap();

        let result = svc
            .validate_session(Some(tokens.access.as_str()), Some(tokens.refresh.as_str()), "device-2")
            .await;
        assert!(matches!(result, Err(ServiceError::NotAuthenticated)));
    }

    #[actix_web::test]
    async fn rotation_rejected_from_a_different_device() {
        let store = MemStore::new();
        let clock = ManualClock::at(Utc::now() - Duration::minutes(30));
        let svc = service(store.clone(), clock.clone());

        let tokens = svc.issue_session(1, 7, DEVICE).await.unwrap();
        clock.advance(Duration::minutes(30));

        let result = svc
            .validate_session(Some(tokens.access.as_str()), Some(tokens.refresh.as_str()), "device-2")
            .await;
        assert!(matches!(result, Err(ServiceError::NotAuthenticated)));
    }

    #[actix_web::test]
    async fn replaced_session_invalidates_the_old_access_token() {
        let store = MemStore::new();
        let svc = service(store.clone(), ManualClock::at(Utc::now()));

        let old = svc.issue_session(1, 7, DEVICE).await.unwrap();
        let new = svc.issue_session(1, 7, DEVICE).await.unwrap();

        // Replace semantics: still one row per kind.
        assert_eq!(store.token_count(), 2);

        let result = svc
            .validate_session(Some(old.access.as_str()), Some(old.refresh.as_str()), DEVICE)
            .await;
        assert!(matches!(result, Err(ServiceError::NotAuthenticated)));

        assert!(
            svc.validate_session(Some(new.access.as_str()), Some(new.refresh.as_str()), DEVICE)
                .await
                .is_ok()
        );
    }

    #[actix_web::test]
    async fn clear_session_is_idempotent() {
        let store = MemStore::new();
        let svc = service(store.clone(), ManualClock::at(Utc::now()));

        svc.issue_session(1, 7, DEVICE).await.unwrap();
        svc.clear_session(1, 7).await.unwrap();
        assert_eq!(store.token_count(), 0);

        // Second teardown is a no-op, not an error.
        svc.clear_session(1, 7).await.unwrap();
    }
}
