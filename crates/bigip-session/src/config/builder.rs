//! Configuration builder

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::constants::DEFAULT_WRITABLE_FOLDER;
use crate::{Error, Result};

/// Settings for one device session
#[derive(Clone)]
pub struct ConnectionConfig {
    pub url: Url,
    username: String,
    password: String,
    pub verify_tls: bool,
    pub version_check: bool,
    pub use_session: bool,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("url", &self.url.as_str())
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("verify_tls", &self.verify_tls)
            .field("version_check", &self.version_check)
            .field("use_session", &self.use_session)
            .field("session", &self.session)
            .field("logging", &self.logging)
            .finish()
    }
}

impl ConnectionConfig {
    #[must_use]
    pub const fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Host part of the endpoint URL, used as the connection identity.
    #[must_use]
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Password for transports that authenticate. Never logged.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

/// Ambient session defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Folder mutating calls switch to when the session sits at `/`.
    pub writable_folder: String,
    pub transaction_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            writable_folder: DEFAULT_WRITABLE_FOLDER.to_string(),
            transaction_timeout: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Configuration builder with fluent API
#[derive(Debug)]
pub struct ConfigBuilder {
    url: Option<Url>,
    username: Option<String>,
    password: Option<String>,
    verify_tls: bool,
    version_check: bool,
    use_session: bool,
    writable_folder: Option<String>,
    transaction_timeout: Option<Duration>,
    log_level: Option<String>,
    json_logs: bool,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            url: None,
            username: None,
            password: None,
            verify_tls: true,
            version_check: true,
            use_session: true,
            writable_folder: None,
            transaction_timeout: None,
            log_level: None,
            json_logs: false,
        }
    }

    #[must_use]
    pub fn url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    #[must_use]
    pub const fn verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    /// Reject devices that do not report a supported major version (on by default)
    #[must_use]
    pub const fn version_check(mut self, check: bool) -> Self {
        self.version_check = check;
        self
    }

    #[must_use]
    pub const fn use_session(mut self, use_session: bool) -> Self {
        self.use_session = use_session;
        self
    }

    #[must_use]
    pub fn writable_folder(mut self, folder: impl Into<String>) -> Self {
        self.writable_folder = Some(folder.into());
        self
    }

    #[must_use]
    pub const fn transaction_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.transaction_timeout = timeout;
        self
    }

    #[must_use]
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    #[must_use]
    pub const fn json_logs(mut self, enabled: bool) -> Self {
        self.json_logs = enabled;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ConnectionConfig> {
        let url = self
            .url
            .ok_or_else(|| Error::Config("url is required".into()))?;
        if url.host_str().is_none_or(str::is_empty) {
            return Err(Error::Config(format!("url has no host: {url}")));
        }

        // credentials embedded in the URL are used unless set explicitly
        let username = self
            .username
            .or_else(|| (!url.username().is_empty()).then(|| url.username().to_string()))
            .ok_or_else(|| Error::Config("username is required".into()))?;
        let password = self
            .password
            .or_else(|| url.password().map(ToString::to_string))
            .unwrap_or_default();

        let writable_folder = self
            .writable_folder
            .unwrap_or_else(|| DEFAULT_WRITABLE_FOLDER.to_string());
        if !writable_folder.starts_with('/') || writable_folder == "/" {
            return Err(Error::Config(format!(
                "writable_folder must be an absolute non-root folder: {writable_folder}"
            )));
        }

        Ok(ConnectionConfig {
            url,
            username,
            password,
            verify_tls: self.verify_tls,
            version_check: self.version_check,
            use_session: self.use_session,
            session: SessionConfig {
                writable_folder,
                transaction_timeout: self.transaction_timeout,
            },
            logging: LoggingConfig {
                level: self.log_level.unwrap_or_else(|| "info".to_string()),
                json: self.json_logs,
            },
        })
    }
}
