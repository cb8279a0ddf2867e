//! Signed bearer tokens: one typed claim set per trust level.
//!
//! `verify` collapses every failure (bad signature, malformed payload,
//! expiry) into `None`; callers only ever branch on presence.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Owner,
    Admin,
    Employee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    Login,
    Auth,
    AuthRefresh,
}

/// Employee-level payload. Device binding for employees lives in the
/// session store, not in the claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeClaims {
    pub employee_id: String,
    pub tenant_id: String,
    pub purpose: Purpose,
    #[serde(rename = "level_")]
    pub level: Level,
    pub jti: String,
    pub exp: i64,
}

/// Admin-level payload, bound to the issuing device and client address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    pub user_id: String,
    pub tenant_id: String,
    #[serde(rename = "level_")]
    pub level: Level,
    pub ua_hash: String,
    pub ip_hash: String,
    pub exp: i64,
}

/// Owner-level payload. The owner is a configured principal, so the claims
/// carry only the binding hashes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerClaims {
    #[serde(rename = "level_")]
    pub level: Level,
    pub ua_hash: String,
    pub ip_hash: String,
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue_employee(
        &self,
        tenant_id: u64,
        employee_id: u64,
        purpose: Purpose,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> String {
        self.sign(&EmployeeClaims {
            employee_id: employee_id.to_string(),
            tenant_id: tenant_id.to_string(),
            purpose,
            level: Level::Employee,
            jti: Uuid::new_v4().to_string(),
            exp: (now + ttl).timestamp(),
        })
    }

    pub fn issue_admin(
        &self,
        user_id: u64,
        tenant_id: u64,
        ua_hash: String,
        ip_hash: String,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> String {
        self.sign(&AdminClaims {
            user_id: user_id.to_string(),
            tenant_id: tenant_id.to_string(),
            level: Level::Admin,
            ua_hash,
            ip_hash,
            exp: (now + ttl).timestamp(),
        })
    }

    pub fn issue_owner(
        &self,
        ua_hash: String,
        ip_hash: String,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> String {
        self.sign(&OwnerClaims {
            level: Level::Owner,
            ua_hash,
            ip_hash,
            exp: (now + ttl).timestamp(),
        })
    }

    /// Decode and verify a token into the expected claim set. Any failure
    /// yields `None`; the reason is only logged.
    pub fn verify<T: DeserializeOwned>(&self, token: &str) -> Option<T> {
        match decode::<T>(token, &self.decoding, &Validation::new(Algorithm::HS256)) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                debug!(error = %e, "token verification failed");
                None
            }
        }
    }

    fn sign<T: Serialize>(&self, claims: &T) -> String {
        // HS256 signing of a plain struct cannot fail.
        encode(&Header::default(), claims, &self.encoding).expect("HS256 encode")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new("test-secret-key-min-32-characters-long")
    }

    #[test]
    fn employee_token_round_trips() {
        let token = codec().issue_employee(1, 7, Purpose::Auth, Utc::now(), Duration::minutes(20));
        let claims: EmployeeClaims = codec().verify(&token).expect("valid token");

        assert_eq!(claims.tenant_id, "1");
        assert_eq!(claims.employee_id, "7");
        assert_eq!(claims.purpose, Purpose::Auth);
        assert_eq!(claims.level, Level::Employee);
    }

    #[test]
    fn expired_token_is_rejected() {
        let issued_at = Utc::now() - Duration::minutes(10);
        let token = codec().issue_employee(1, 7, Purpose::Auth, issued_at, Duration::minutes(1));

        assert!(codec().verify::<EmployeeClaims>(&token).is_none());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let mut token =
            codec().issue_employee(1, 7, Purpose::Auth, Utc::now(), Duration::minutes(20));
        token.push('x');

        assert!(codec().verify::<EmployeeClaims>(&token).is_none());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = codec().issue_employee(1, 7, Purpose::Login, Utc::now(), Duration::minutes(5));
        let other = TokenCodec::new("another-secret-key-32-characters!!");

        assert!(other.verify::<EmployeeClaims>(&token).is_none());
    }

    #[test]
    fn admin_token_does_not_parse_as_employee_claims() {
        let token = codec().issue_admin(
            2,
            1,
            "ua".into(),
            "ip".into(),
            Utc::now(),
            Duration::minutes(60),
        );

        assert!(codec().verify::<EmployeeClaims>(&token).is_none());
        let claims: AdminClaims = codec().verify(&token).expect("valid admin token");
        assert_eq!(claims.level, Level::Admin);
    }

    #[test]
    fn minted_tokens_are_unique() {
        let now = Utc::now();
        let a = codec().issue_employee(1, 7, Purpose::Auth, now, Duration::minutes(20));
        let b = codec().issue_employee(1, 7, Purpose::Auth, now, Duration::minutes(20));
        assert_ne!(a, b);
    }
}
