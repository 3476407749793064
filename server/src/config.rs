use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub credential_url: String,
    pub credential_key: String,
    pub store_url: String,
    pub store_key: String,
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("RUST_PORT", "4000"),
            credential_url: try_load("CREDENTIAL_URL", "http://127.0.0.1:9099"),
            credential_key: read_secret("CREDENTIAL_API_KEY"),
            store_url: try_load("STORE_URL", "http://127.0.0.1:8200"),
            store_key: read_secret("STORE_API_KEY"),
            allowed_origins: parse_origins(&try_load::<String>(
                "ALLOWED_ORIGINS",
                "http://localhost:4000,http://127.0.0.1:4000",
            )),
        }
    }
}

pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/').to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

fn read_secret(secret_name: &str) -> String {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            warn!("Failed to read {secret_name} from file: {e}");
        })
        .expect("Secrets misconfigured!")
}
