// src/config.rs

use dotenvy::dotenv;
use std::env;

/// Page size used by `GET /post` when the caller omits `limit`.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Upper bound applied to any requested page size.
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub port: u16,

    /// Directory uploaded cover images are written to.
    pub media_root: String,
    /// Public prefix prepended to stored file names when building image URLs.
    pub media_base_url: String,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3600);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let admin_username = env::var("ADMIN_USERNAME").ok();
        let admin_password = env::var("ADMIN_PASSWORD").ok();

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);

        let media_root = env::var("MEDIA_ROOT").unwrap_or_else(|_| "uploads".to_string());

        let media_base_url = env::var("MEDIA_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}/media", port));

        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5 * 1024 * 1024);

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            admin_username,
            admin_password,
            port,
            media_root,
            media_base_url,
            max_upload_bytes,
        }
    }
}
