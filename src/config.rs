use std::env;

use chrono::FixedOffset;
use dotenvy::dotenv;

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    pub database_url: String,
    pub jwt_secret: String,

    // Owner is a configured principal, not a database row.
    pub owner_username: String,
    pub owner_password: String,

    pub login_token_ttl_minutes: i64,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_minutes: i64,
    pub owner_token_ttl_minutes: i64,
    pub admin_token_ttl_minutes: i64,

    /// Single configured zone for day boundaries and reports.
    pub utc_offset: FixedOffset,

    pub default_marking_radius_m: f64,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_protected_per_min: u32,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),

            owner_username: env::var("OWNER_USERNAME").expect("OWNER_USERNAME must be set"),
            owner_password: env::var("OWNER_PASSWORD").expect("OWNER_PASSWORD must be set"),

            login_token_ttl_minutes: env::var("LOGIN_TOKEN_TTL_MINUTES")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap(),
            access_token_ttl_minutes: env::var("ACCESS_TOKEN_TTL_MINUTES")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .unwrap(),
            refresh_token_ttl_minutes: env::var("REFRESH_TOKEN_TTL_MINUTES")
                .unwrap_or_else(|_| "10080".to_string()) // default 7 days
                .parse()
                .unwrap(),
            owner_token_ttl_minutes: env::var("OWNER_TOKEN_TTL_MINUTES")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .unwrap(),
            admin_token_ttl_minutes: env::var("ADMIN_TOKEN_TTL_MINUTES")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap(),

            utc_offset: env::var("UTC_OFFSET")
                .unwrap_or_else(|_| "+00:00".to_string())
                .parse()
                .expect("UTC_OFFSET must look like +06:00"),

            default_marking_radius_m: env::var("DEFAULT_MARKING_RADIUS_M")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()
                .unwrap(),

            rate_login_per_min: env::var("RATE_LOGIN_PER_MIN")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap(),
            rate_protected_per_min: env::var("RATE_PROTECTED_PER_MIN")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap(),
        }
    }
}
