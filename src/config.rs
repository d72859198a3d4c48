use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::error::AppError;
use crate::remote::FirestoreConfig;

const DEFAULT_DATABASE_URL: &str = "sqlite://goaltrack.db?mode=rwc";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_PROBE_URL: &str = "https://clients3.google.com/generate_204";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    /// `None` runs against the in-memory store.
    pub firestore: Option<FirestoreConfig>,
    pub probe_url: String,
    pub probe_interval_secs: u64,
    pub reminder_hour: u32,
    pub reminder_minute: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
        let bind_addr: SocketAddr = parse_var("BIND_ADDR", DEFAULT_BIND_ADDR.parse().ok())?;

        let firestore = match FirestoreConfig::new_from_env() {
            Ok(config) => Some(config),
            Err(AppError::Config(_)) => None,
            Err(e) => return Err(e),
        };

        let probe_url = env::var("CONNECTIVITY_PROBE_URL")
            .unwrap_or_else(|_| DEFAULT_PROBE_URL.to_string());
        let probe_interval_secs: u64 = parse_var("CONNECTIVITY_PROBE_INTERVAL_SECS", Some(15))?;
        let reminder_hour: u32 = parse_var("REMINDER_HOUR", Some(20))?;
        let reminder_minute: u32 = parse_var("REMINDER_MINUTE", Some(0))?;

        Ok(Self {
            database_url,
            bind_addr,
            firestore,
            probe_url,
            probe_interval_secs,
            reminder_hour,
            reminder_minute,
        })
    }
}

fn parse_var<T: FromStr>(key: &str, default: Option<T>) -> Result<T, AppError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} has an invalid value: {}", key, raw))),
        Err(_) => default.ok_or_else(|| AppError::Config(format!("{} is not set", key))),
    }
}
