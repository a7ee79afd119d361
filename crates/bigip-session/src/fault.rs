//! Decoding of iControl fault messages.
//!
//! The endpoint reports every failure as a free-form SOAP fault string:
//!
//! ```text
//! Server raised fault: 'Exception caught in LocalLB::urn:iControl:LocalLB/Pool::get_description()
//! Exception: Common::OperationFailed
//!     primary_error_code   : 16908342 (0x01020036)
//!     secondary_error_code : 0
//!     error_string         : 01020036:3: The requested pool (/App/pool1) was not found.'
//! ```
//!
//! [`Fault::parse`] splits that into structured fields and resolves a [`FaultKind`]
//! once, so the guards and proxies branch on an enum instead of message text.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static FAULT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^(?P<ins>\w+) raised fault: '(?P<cg>.+)\nException: (?P<ex>.+)\n\s+primary_error_code\s*:\s*(?P<pec>.+)\n\s+secondary_error_code\s*:\s*(?P<sec>.+)\n\s+error_string\s*:\s*(?P<es>.+?)'?$",
    )
    .expect("fault pattern is valid")
});

const NOT_FOUND_MARKER: &str = "was not found";
const ALREADY_OPEN_MARKER: &str = "Only one transaction can be open";
const NOTHING_TO_ROLL_BACK_MARKER: &str = "No transaction is open to roll back";

/// Classification of a remote fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// The addressed object does not exist.
    NotFound,
    /// `start_transaction` while a transaction is already open.
    TransactionAlreadyOpen,
    /// `rollback_transaction` with nothing open.
    NoTransactionOpen,
    Other,
}

impl FaultKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::TransactionAlreadyOpen => "transaction_already_open",
            Self::NoTransactionOpen => "no_transaction_open",
            Self::Other => "other",
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Expected transaction bookkeeping conditions, never surfaced to callers.
    #[must_use]
    pub const fn is_transaction_conflict(&self) -> bool {
        matches!(self, Self::TransactionAlreadyOpen | Self::NoTransactionOpen)
    }

    fn classify(text: &str) -> Self {
        if text.contains(NOT_FOUND_MARKER) {
            Self::NotFound
        } else if text.contains(ALREADY_OPEN_MARKER) {
            Self::TransactionAlreadyOpen
        } else if text.contains(NOTHING_TO_ROLL_BACK_MARKER) {
            Self::NoTransactionOpen
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured remote fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    kind: FaultKind,
    message: String,
    instance: Option<String>,
    caught: Option<String>,
    exception: Option<String>,
    primary_error_code: Option<u32>,
    secondary_error_code: Option<u32>,
    error_string: Option<String>,
}

impl Fault {
    /// Decode a raw fault message.
    ///
    /// Messages that do not follow the iControl layout are kept verbatim and
    /// classified on their full text.
    #[must_use]
    pub fn parse(message: &str) -> Self {
        let Some(caps) = FAULT_RE.captures(message) else {
            return Self {
                kind: FaultKind::classify(message),
                message: message.to_string(),
                instance: None,
                caught: None,
                exception: None,
                primary_error_code: None,
                secondary_error_code: None,
                error_string: None,
            };
        };

        let text = |name: &str| caps.name(name).map(|m| m.as_str().trim().to_string());
        let error_string = text("es");

        Self {
            kind: FaultKind::classify(error_string.as_deref().unwrap_or(message)),
            message: message.to_string(),
            instance: text("ins"),
            caught: text("cg"),
            exception: text("ex"),
            primary_error_code: text("pec").as_deref().and_then(parse_code),
            secondary_error_code: text("sec").as_deref().and_then(parse_code),
            error_string,
        }
    }

    /// Build a fault of a known kind without a structured message.
    #[must_use]
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            instance: None,
            caught: None,
            exception: None,
            primary_error_code: None,
            secondary_error_code: None,
            error_string: None,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> FaultKind {
        self.kind
    }

    /// Raw message as received.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn instance(&self) -> Option<&str> {
        self.instance.as_deref()
    }

    #[must_use]
    pub fn caught(&self) -> Option<&str> {
        self.caught.as_deref()
    }

    #[must_use]
    pub fn exception(&self) -> Option<&str> {
        self.exception.as_deref()
    }

    #[must_use]
    pub const fn primary_error_code(&self) -> Option<u32> {
        self.primary_error_code
    }

    #[must_use]
    pub const fn secondary_error_code(&self) -> Option<u32> {
        self.secondary_error_code
    }

    #[must_use]
    pub fn error_string(&self) -> Option<&str> {
        self.error_string.as_deref()
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.exception, &self.error_string) {
            (Some(exception), Some(error_string)) => write!(f, "{exception}: {error_string}"),
            _ => f.write_str(&self.message),
        }
    }
}

// "16908342 (0x01020036)" -> 16908342
fn parse_code(raw: &str) -> Option<u32> {
    raw.split_whitespace().next()?.parse().ok()
}
