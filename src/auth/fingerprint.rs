//! Request-derived binding material: device fingerprint, client address,
//! and the mobile-device gate for the employee surface.

use actix_web::HttpRequest;
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

static MOBILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Mobi|Android|iPhone|iPad|iPod").unwrap());

fn user_agent(req: &HttpRequest) -> &str {
    req.headers()
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// sha256(user-agent), hex. Binds tokens to the originating device; a
/// user-agent change therefore forces a re-login.
pub fn device_hash(req: &HttpRequest) -> String {
    hex::encode(Sha256::digest(user_agent(req).as_bytes()))
}

/// First `x-forwarded-for` entry, falling back to the peer address.
pub fn client_ip(req: &HttpRequest) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_default()
}

/// sha256(client ip), hex. Embedded in owner/admin tokens.
pub fn ip_hash(req: &HttpRequest) -> String {
    hex::encode(Sha256::digest(client_ip(req).as_bytes()))
}

pub fn is_mobile(req: &HttpRequest) -> bool {
    MOBILE_RE.is_match(user_agent(req))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    const ANDROID_UA: &str = "Mozilla/5.0 (Linux; Android 14) Mobile Safari/537.36";
    const DESKTOP_UA: &str = "Mozilla/5.0 (X11; Linux x86_64) Firefox/128.0";

    #[test]
    fn device_hash_is_deterministic_per_user_agent() {
        let a = TestRequest::default()
            .insert_header(("user-agent", ANDROID_UA))
            .to_http_request();
        let b = TestRequest::default()
            .insert_header(("user-agent", ANDROID_UA))
            .to_http_request();
        let c = TestRequest::default()
            .insert_header(("user-agent", DESKTOP_UA))
            .to_http_request();

        assert_eq!(device_hash(&a), device_hash(&b));
        assert_ne!(device_hash(&a), device_hash(&c));
    }

    #[test]
    fn forwarded_header_wins_over_peer_address() {
        let req = TestRequest::default()
            .insert_header(("x-forwarded-for", "203.0.113.9, 10.0.0.1"))
            .to_http_request();

        assert_eq!(client_ip(&req), "203.0.113.9");
    }

    #[test]
    fn mobile_gate_matches_mobile_agents_only() {
        let mobile = TestRequest::default()
            .insert_header(("user-agent", ANDROID_UA))
            .to_http_request();
        let desktop = TestRequest::default()
            .insert_header(("user-agent", DESKTOP_UA))
            .to_http_request();

        assert!(is_mobile(&mobile));
        assert!(!is_mobile(&desktop));
    }
}
