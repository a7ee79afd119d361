//! TOML configuration file loading

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use super::builder::ConfigBuilder;
use crate::{Error, Result};

/// Configuration file locations checked in order
const CONFIG_PATHS: &[&str] = &[
    "./bigip.toml",
    "~/.config/bigip/config.toml",
    "/etc/bigip/config.toml",
];

/// Find the first existing configuration file
pub fn find_config_file() -> Option<PathBuf> {
    for path_str in CONFIG_PATHS {
        let path = if path_str.starts_with('~') {
            if let Ok(home) = std::env::var("HOME") {
                PathBuf::from(path_str.replacen('~', &home, 1))
            } else {
                continue;
            }
        } else {
            PathBuf::from(path_str)
        };

        if path.exists() {
            return Some(path);
        }
    }
    None
}

/// Load configuration from a TOML file
pub fn load_from_file(path: &Path, builder: ConfigBuilder) -> Result<ConfigBuilder> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    let file_config: FileConfig = toml::from_str(&content).map_err(|e| {
        Error::Config(format!(
            "Failed to parse config file {}: {}",
            path.display(),
            e
        ))
    })?;

    apply_file_config(builder, file_config)
}

fn apply_file_config(mut builder: ConfigBuilder, config: FileConfig) -> Result<ConfigBuilder> {
    if let Some(conn) = config.connection {
        if let Some(url_str) = conn.url {
            let url = Url::parse(&url_str)
                .map_err(|e| Error::Config(format!("Invalid connection URL: {e}")))?;
            builder = builder.url(url);
        }

        if let Some(username) = conn.username {
            builder = builder.username(username);
        }

        if let Some(password) = conn.password {
            builder = builder.password(password);
        }

        if let Some(verify) = conn.verify_tls {
            builder = builder.verify_tls(verify);
        }

        if let Some(check) = conn.version_check {
            builder = builder.version_check(check);
        }

        if let Some(use_session) = conn.use_session {
            builder = builder.use_session(use_session);
        }
    }

    if let Some(session) = config.session {
        if let Some(folder) = session.writable_folder {
            builder = builder.writable_folder(folder);
        }

        if let Some(secs) = session.transaction_timeout_secs {
            builder = builder.transaction_timeout((secs > 0).then(|| Duration::from_secs(secs)));
        }
    }

    if let Some(logging) = config.logging {
        if let Some(level) = logging.level {
            builder = builder.log_level(level);
        }

        if let Some(json) = logging.json {
            builder = builder.json_logs(json);
        }
    }

    Ok(builder)
}

/// Root configuration file structure
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    connection: Option<ConnectionSection>,
    session: Option<SessionSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConnectionSection {
    url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    verify_tls: Option<bool>,
    version_check: Option<bool>,
    use_session: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SessionSection {
    writable_folder: Option<String>,
    transaction_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LoggingSection {
    level: Option<String>,
    json: Option<bool>,
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[connection]
url = "https://lb1.example.com"
username = "admin"
password = "secret"
verify_tls = false
version_check = true
use_session = true

[session]
writable_folder = "/App"
transaction_timeout_secs = 60

[logging]
level = "debug"
json = true
"#;

        let config: FileConfig = toml::from_str(toml_content).unwrap();
        let conn = config.connection.unwrap();
        assert_eq!(conn.url.as_deref(), Some("https://lb1.example.com"));
        assert_eq!(conn.verify_tls, Some(false));
        let session = config.session.unwrap();
        assert_eq!(session.writable_folder.as_deref(), Some("/App"));
        assert_eq!(session.transaction_timeout_secs, Some(60));
        assert_eq!(config.logging.unwrap().json, Some(true));
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: FileConfig = toml::from_str(
            r#"
[connection]
url = "https://admin@lb1"
"#,
        )
        .unwrap();
        assert!(config.connection.is_some());
        assert!(config.session.is_none());
        assert!(config.logging.is_none());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result: std::result::Result<FileConfig, _> = toml::from_str(
            r#"
[connection]
uri = "https://lb1"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file_success() {
        let temp_file = create_temp_config(
            r#"
[connection]
url = "https://lb1.example.com"
username = "admin"
password = "secret"

[session]
writable_folder = "/Tenant"
transaction_timeout_secs = 30
"#,
        );

        let config = load_from_file(temp_file.path(), ConfigBuilder::new())
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(config.host(), "lb1.example.com");
        assert_eq!(config.password(), "secret");
        assert_eq!(config.session.writable_folder, "/Tenant");
        assert_eq!(
            config.session.transaction_timeout,
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn test_load_from_file_not_found() {
        let err = load_from_file(
            Path::new("/nonexistent/path/config.toml"),
            ConfigBuilder::new(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_load_from_file_invalid_toml() {
        let temp_file = create_temp_config("this is not valid toml {{{{");
        let err = load_from_file(temp_file.path(), ConfigBuilder::new()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_load_from_file_invalid_url() {
        let temp_file = create_temp_config(
            r#"
[connection]
url = "not a valid url"
"#,
        );
        let err = load_from_file(temp_file.path(), ConfigBuilder::new()).unwrap_err();
        assert!(err.to_string().contains("Invalid connection URL"));
    }

    #[test]
    fn test_zero_timeout_means_device_default() {
        let temp_file = create_temp_config(
            r#"
[connection]
url = "https://admin@lb1"

[session]
transaction_timeout_secs = 0
"#,
        );
        let config = load_from_file(temp_file.path(), ConfigBuilder::new())
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.session.transaction_timeout, None);
    }

    #[test]
    fn test_empty_config_file() {
        let temp_file = create_temp_config("");
        let builder = load_from_file(temp_file.path(), ConfigBuilder::new()).unwrap();
        assert!(builder.build().is_err());
    }

    #[test]
    fn test_find_config_file_not_found() {
        let result = find_config_file();
        assert!(result.is_none() || result.unwrap().exists());
    }
}
