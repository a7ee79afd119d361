//! Environment variable loading for configuration

use std::env;
use std::time::Duration;

use url::Url;

use super::builder::ConfigBuilder;
use crate::{Error, Result};

/// Environment variable names
mod vars {
    pub const BIGIP_URL: &str = "BIGIP_URL";
    pub const BIGIP_USER: &str = "BIGIP_USER";
    pub const BIGIP_PASSWORD: &str = "BIGIP_PASSWORD";
    pub const BIGIP_VERIFY_TLS: &str = "BIGIP_VERIFY_TLS";
    pub const BIGIP_VERSION_CHECK: &str = "BIGIP_VERSION_CHECK";
    pub const BIGIP_WRITABLE_FOLDER: &str = "BIGIP_WRITABLE_FOLDER";
    pub const BIGIP_TRANSACTION_TIMEOUT_SECS: &str = "BIGIP_TRANSACTION_TIMEOUT_SECS";
    pub const RUST_LOG: &str = "RUST_LOG";
    pub const BIGIP_JSON_LOGS: &str = "BIGIP_JSON_LOGS";
}

/// Load configuration from environment variables
pub fn load_from_env(mut builder: ConfigBuilder) -> Result<ConfigBuilder> {
    if let Ok(url_str) = env::var(vars::BIGIP_URL) {
        let url = Url::parse(&url_str)
            .map_err(|e| Error::Config(format!("Invalid {}: {}", vars::BIGIP_URL, e)))?;
        builder = builder.url(url);
    }

    if let Ok(user) = env::var(vars::BIGIP_USER) {
        builder = builder.username(user);
    }

    if let Ok(password) = env::var(vars::BIGIP_PASSWORD) {
        builder = builder.password(password);
    }

    if let Ok(val) = env::var(vars::BIGIP_VERIFY_TLS) {
        builder = builder.verify_tls(parse_bool(&val));
    }

    if let Ok(val) = env::var(vars::BIGIP_VERSION_CHECK) {
        builder = builder.version_check(parse_bool(&val));
    }

    if let Ok(folder) = env::var(vars::BIGIP_WRITABLE_FOLDER) {
        builder = builder.writable_folder(folder);
    }

    if let Ok(timeout_str) = env::var(vars::BIGIP_TRANSACTION_TIMEOUT_SECS)
        && let Ok(secs) = timeout_str.parse::<u64>()
    {
        builder = builder.transaction_timeout((secs > 0).then(|| Duration::from_secs(secs)));
    }

    if let Ok(level) = env::var(vars::RUST_LOG) {
        builder = builder.log_level(level);
    }

    if let Ok(val) = env::var(vars::BIGIP_JSON_LOGS) {
        builder = builder.json_logs(parse_bool(&val));
    }

    Ok(builder)
}

fn parse_bool(s: &str) -> bool {
    matches!(s.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}
