//! Error types for the session layer and the resource proxies built on it.
//!
//! Remote faults are decoded once, at the transport boundary, into a [`Fault`]
//! carrying a typed [`FaultKind`](crate::FaultKind). Nothing above the transport
//! matches on fault message text.

use thiserror::Error;

use crate::cache::ResourceKind;
use crate::fault::Fault;

#[derive(Error, Debug)]
pub enum Error {
    /// The named resource does not exist on the device.
    #[error("{kind} not found: {name}")]
    NotFound { kind: ResourceKind, name: String },

    /// The device runs a major version this client does not speak.
    #[error("unsupported BIG-IP version: {version}")]
    VersionIncompatible { version: String },

    /// Ambient session state could not be written back after a guarded call.
    #[error("failed to restore session state: {source}")]
    SessionRestore {
        #[source]
        source: Box<Self>,
    },

    /// Fault reported by the remote endpoint.
    #[error("remote fault: {0}")]
    Fault(Fault),

    /// Transport failure that never reached the endpoint.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// A remote operation was attempted on a proxy with no connection.
    #[error("{kind} is not bound to a connection")]
    Unbound { kind: ResourceKind },

    /// Another live proxy already holds the identity a rename asked for.
    #[error("another live {kind} proxy already holds {name}")]
    IdentityConflict { kind: ResourceKind, name: String },

    /// A create was attempted without a required attribute.
    #[error("{kind} requires '{field}' to be set on create")]
    Incomplete {
        kind: ResourceKind,
        field: &'static str,
    },

    /// The endpoint answered with a payload we cannot decode.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// A resource document could not be decoded.
    #[error("invalid resource document: {0}")]
    Document(#[from] serde_json::Error),

    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

impl Error {
    #[must_use]
    pub fn not_found(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::UnexpectedResponse(msg.into())
    }

    #[must_use]
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Not-found for one specific resource kind.
    #[must_use]
    pub fn is_not_found_for(&self, expected: ResourceKind) -> bool {
        matches!(self, Self::NotFound { kind, .. } if *kind == expected)
    }

    #[must_use]
    pub const fn is_version_incompatible(&self) -> bool {
        matches!(self, Self::VersionIncompatible { .. })
    }

    #[must_use]
    pub const fn is_session_restore(&self) -> bool {
        matches!(self, Self::SessionRestore { .. })
    }

    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    #[must_use]
    pub const fn is_unbound(&self) -> bool {
        matches!(self, Self::Unbound { .. })
    }

    #[must_use]
    pub const fn is_identity_conflict(&self) -> bool {
        matches!(self, Self::IdentityConflict { .. })
    }

    /// Remote fault, if this error is one.
    #[must_use]
    pub const fn fault(&self) -> Option<&Fault> {
        match self {
            Self::Fault(fault) => Some(fault),
            _ => None,
        }
    }

    /// Whether the device reported that the addressed object does not exist.
    ///
    /// True for [`Error::NotFound`] and for raw faults that decode as not-found.
    #[must_use]
    pub fn is_remote_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Fault(fault) => fault.kind().is_not_found(),
            _ => false,
        }
    }

    /// Translate a raw not-found fault into a kind-specific [`Error::NotFound`].
    #[must_use]
    pub fn into_not_found(self, kind: ResourceKind, name: impl Into<String>) -> Self {
        match self {
            Self::Fault(ref fault) if fault.kind().is_not_found() => Self::not_found(kind, name),
            other => other,
        }
    }
}

impl From<Fault> for Error {
    fn from(fault: Fault) -> Self {
        Self::Fault(fault)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::Config(format!("invalid URL: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    const NOT_FOUND: &str = "Server raised fault: 'Exception caught in LocalLB::urn:iControl:LocalLB/Pool::get_description()\n\
Exception: Common::OperationFailed\n\
\tprimary_error_code   : 16908342 (0x01020036)\n\
\tsecondary_error_code : 0\n\
\terror_string         : 01020036:3: The requested pool (/App/pool1) was not found.'";

    #[test]
    fn test_not_found_display() {
        let err = Error::not_found(ResourceKind::Pool, "/App/pool1");
        assert_eq!(err.to_string(), "pool not found: /App/pool1");
        assert!(err.is_not_found());
        assert!(err.is_not_found_for(ResourceKind::Pool));
        assert!(!err.is_not_found_for(ResourceKind::Node));
    }

    #[test]
    fn test_version_incompatible() {
        let err = Error::VersionIncompatible {
            version: "BIG-IP_v10.2.4".to_string(),
        };
        assert!(err.is_version_incompatible());
        assert!(err.to_string().contains("BIG-IP_v10.2.4"));
    }

    #[test]
    fn test_session_restore_wraps_source() {
        let err = Error::SessionRestore {
            source: Box::new(Error::transport("connection reset")),
        };
        assert!(err.is_session_restore());
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_identity_conflict_display() {
        let err = Error::IdentityConflict {
            kind: ResourceKind::Rule,
            name: "/Common/redirect".to_string(),
        };
        assert!(err.is_identity_conflict());
        assert_eq!(
            err.to_string(),
            "another live rule proxy already holds /Common/redirect"
        );
    }

    #[test]
    fn test_into_not_found_translates_fault() {
        let err: Error = Fault::parse(NOT_FOUND).into();
        assert!(err.is_remote_not_found());

        let err = err.into_not_found(ResourceKind::Pool, "/App/pool1");
        assert!(err.is_not_found_for(ResourceKind::Pool));
    }

    #[test]
    fn test_into_not_found_keeps_other_errors() {
        let err = Error::transport("timeout").into_not_found(ResourceKind::Node, "n1");
        assert!(matches!(err, Error::Transport(_)));
    }

    #[test]
    fn test_fault_accessor() {
        let err: Error = Fault::parse(NOT_FOUND).into();
        assert_eq!(err.fault().and_then(Fault::primary_error_code), Some(16_908_342));
        assert!(Error::Config("x".into()).fault().is_none());
    }

    #[test]
    fn test_incomplete_display() {
        let err = Error::Incomplete {
            kind: ResourceKind::Pool,
            field: "lbmethod",
        };
        assert_eq!(err.to_string(), "pool requires 'lbmethod' to be set on create");
    }
}
