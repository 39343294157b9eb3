//! Configuration module for the thesis archive backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key for API authentication (required in production)
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Root directory for stored blobs (cover images, PDFs)
    pub blob_root: PathBuf,
    /// Base URL under which stored blobs are publicly reachable
    pub public_base_url: String,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_psk = env::var("ARCHIVE_API_PSK").ok();

        let db_path = env::var("ARCHIVE_DB_PATH")
            .unwrap_or_else(|_| "./data/archive.sqlite".to_string())
            .into();

        let blob_root = env::var("ARCHIVE_BLOB_ROOT")
            .unwrap_or_else(|_| "./data/blobs".to_string())
            .into();

        let public_base_url = env::var("ARCHIVE_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8080/files".to_string());

        let bind_addr = env::var("ARCHIVE_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid ARCHIVE_BIND_ADDR format");

        let log_level = env::var("ARCHIVE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Self {
            api_psk,
            db_path,
            blob_root,
            public_base_url,
            bind_addr,
            log_level,
        }
    }
}
