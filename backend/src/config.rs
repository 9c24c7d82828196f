// src/config.rs

use std::env;
use std::net::SocketAddr;

use chrono::{FixedOffset, Offset, Utc};
use dotenvy::dotenv;

/// Share of correct answers at or above which an attempt counts as passed.
pub const DEFAULT_PASS_THRESHOLD: f64 = 0.5;

/// Number of rows shown on a quiz leaderboard.
pub const DEFAULT_TOP_PERFORMERS: usize = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub bind_addr: SocketAddr,
    pub pass_threshold: f64,
    pub top_performers: usize,
    /// Offset used as the "local" calendar when bucketing activity by day.
    pub activity_offset: FixedOffset,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86_400);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

        let pass_threshold = env::var("PASS_THRESHOLD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PASS_THRESHOLD);

        let top_performers = env::var("TOP_PERFORMERS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TOP_PERFORMERS);

        let activity_offset = env::var("ACTIVITY_UTC_OFFSET_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i32>().ok())
            .and_then(|minutes| FixedOffset::east_opt(minutes * 60))
            .unwrap_or_else(utc_offset);

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            bind_addr,
            pass_threshold,
            top_performers,
            activity_offset,
        }
    }

    /// Configuration for tests and tooling that never touch a real database.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            database_url: String::new(),
            jwt_secret: jwt_secret.to_string(),
            jwt_expiration: 600,
            rust_log: "error".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            pass_threshold: DEFAULT_PASS_THRESHOLD,
            top_performers: DEFAULT_TOP_PERFORMERS,
            activity_offset: utc_offset(),
        }
    }
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}
