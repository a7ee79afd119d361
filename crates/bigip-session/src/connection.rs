//! One authenticated session to a BIG-IP device.
//!
//! The device keeps ambient state per session (active folder, recursive query flag,
//! open transaction) that silently changes the meaning of every later call.
//! [`Connection`] mirrors that state in explicit fields so the guards in
//! [`crate::session`] can snapshot and restore it without extra round trips.

use std::fmt;

use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::config::ConnectionConfig;
use crate::constants::{FAILOVER_STATE_PREFIX, ROOT_FOLDER, SUPPORTED_VERSION_MARKER, procedures};
use crate::fault::FaultKind;
use crate::transport::Transport;
use crate::{Error, Result, wire};

/// Whether a transaction is open on the device for this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionState {
    Open,
    Closed,
    /// Not checked yet, or lost track after a failed submit.
    #[default]
    Unknown,
}

/// Outcome of a `start_transaction` attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStart {
    /// A new transaction was opened; the caller owns it.
    Started,
    /// A transaction was already open; the caller must not end it.
    AlreadyOpen,
}

/// Locally mirrored ambient session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbientState {
    pub active_folder: String,
    pub recursive_query: bool,
    pub transaction: TransactionState,
}

impl Default for AmbientState {
    fn default() -> Self {
        Self {
            active_folder: ROOT_FOLDER.to_string(),
            recursive_query: false,
            transaction: TransactionState::Unknown,
        }
    }
}

/// Session to one device.
///
/// A connection is meant to be driven by one logical operation at a time: two
/// threads changing the active folder concurrently would corrupt each other's
/// restore snapshots. Run one connection per worker for parallelism.
pub struct Connection {
    host: String,
    username: String,
    version_check: bool,
    use_session: bool,
    verify_tls: bool,
    writable_folder: String,
    transport: Box<dyn Transport>,
    state: Mutex<AmbientState>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Open a session over `transport`.
    ///
    /// Checks the device version (when enabled), primes the mirrored ambient state
    /// from the device and applies the configured transaction timeout.
    pub fn open(config: &ConnectionConfig, transport: impl Transport + 'static) -> Result<Self> {
        let conn = Self {
            host: config.host().to_string(),
            username: config.username().to_string(),
            version_check: config.version_check,
            use_session: config.use_session,
            verify_tls: config.verify_tls,
            writable_folder: config.session.writable_folder.clone(),
            transport: Box::new(transport),
            state: Mutex::new(AmbientState::default()),
        };

        let version = conn.version()?;
        if conn.version_check && !version.contains(SUPPORTED_VERSION_MARKER) {
            return Err(Error::VersionIncompatible { version });
        }

        let folder = conn.refresh_active_folder()?;
        let recursive = conn.refresh_recursive_query()?;

        if let Some(timeout) = config.session.transaction_timeout {
            conn.set_transaction_timeout(u32::try_from(timeout.as_secs()).unwrap_or(u32::MAX))?;
        }

        tracing::info!(
            host = %conn.host,
            version = %version,
            active_folder = %folder,
            recursive_query = recursive,
            "Connected to BIG-IP"
        );

        Ok(conn)
    }

    /// Endpoint identity used in cache keys.
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub const fn version_check(&self) -> bool {
        self.version_check
    }

    pub const fn use_session(&self) -> bool {
        self.use_session
    }

    pub const fn verify_tls(&self) -> bool {
        self.verify_tls
    }

    /// Folder mutations switch to when the session sits at the root folder.
    pub fn writable_folder(&self) -> &str {
        &self.writable_folder
    }

    /// Invoke a remote procedure on this session.
    pub fn call(&self, procedure: &str, args: &[Value]) -> Result<Value> {
        tracing::trace!(procedure, "iControl call");
        self.transport.invoke(procedure, args)
    }

    // Device information

    pub fn version(&self) -> Result<String> {
        let value = self.call(procedures::GET_VERSION, &[])?;
        wire::as_string(&value, "version")
    }

    pub fn system_information(&self) -> Result<Value> {
        self.call(procedures::GET_SYSTEM_INFORMATION, &[])
    }

    /// Failover state with the `FAILOVER_STATE_` prefix removed, lowercased.
    pub fn failover_state(&self) -> Result<String> {
        let value = self.call(procedures::GET_FAILOVER_STATE, &[])?;
        let raw = wire::as_string(&value, "failover_state")?;
        Ok(raw
            .strip_prefix(FAILOVER_STATE_PREFIX)
            .unwrap_or(&raw)
            .to_lowercase())
    }

    // Ambient state

    /// Snapshot of the mirrored ambient state. No remote call.
    pub fn ambient(&self) -> AmbientState {
        self.state.lock().clone()
    }

    /// Mirrored active folder. No remote call.
    pub fn active_folder(&self) -> String {
        self.state.lock().active_folder.clone()
    }

    /// Read the active folder from the device and update the mirror.
    pub fn refresh_active_folder(&self) -> Result<String> {
        let value = self.call(procedures::GET_ACTIVE_FOLDER, &[])?;
        let folder = wire::as_string(&value, "active_folder")?;
        self.state.lock().active_folder.clone_from(&folder);
        Ok(folder)
    }

    pub fn set_active_folder(&self, folder: &str) -> Result<()> {
        self.call(procedures::SET_ACTIVE_FOLDER, &[json!(folder)])?;
        tracing::debug!(folder, "Active folder changed");
        self.state.lock().active_folder = folder.to_string();
        Ok(())
    }

    /// Mirrored recursive query flag. No remote call.
    pub fn recursive_query(&self) -> bool {
        self.state.lock().recursive_query
    }

    pub fn refresh_recursive_query(&self) -> Result<bool> {
        let value = self.call(procedures::GET_RECURSIVE_QUERY_STATE, &[])?;
        let enabled = wire::parse_enabled_state(&value, "recursive_query_state")?;
        self.state.lock().recursive_query = enabled;
        Ok(enabled)
    }

    pub fn set_recursive_query(&self, enabled: bool) -> Result<()> {
        self.call(
            procedures::SET_RECURSIVE_QUERY_STATE,
            &[json!(wire::enabled_state(enabled))],
        )?;
        tracing::debug!(enabled, "Recursive query changed");
        self.state.lock().recursive_query = enabled;
        Ok(())
    }

    // Transactions

    /// Mirrored transaction state. No remote call.
    pub fn transaction_state(&self) -> TransactionState {
        self.state.lock().transaction
    }

    /// Try to open a transaction.
    ///
    /// The device has no "is a transaction open" query; attempting to start one is
    /// the check. An "already open" fault is an answer, not an error.
    pub fn start_transaction(&self) -> Result<TransactionStart> {
        let outcome = match self.call(procedures::START_TRANSACTION, &[]) {
            Ok(_) => TransactionStart::Started,
            Err(Error::Fault(fault)) if fault.kind() == FaultKind::TransactionAlreadyOpen => {
                TransactionStart::AlreadyOpen
            }
            Err(e) => return Err(e),
        };
        self.state.lock().transaction = TransactionState::Open;
        Ok(outcome)
    }

    pub fn submit_transaction(&self) -> Result<()> {
        match self.call(procedures::SUBMIT_TRANSACTION, &[]) {
            Ok(_) => {
                self.state.lock().transaction = TransactionState::Closed;
                Ok(())
            }
            Err(e) => {
                self.state.lock().transaction = TransactionState::Unknown;
                Err(e)
            }
        }
    }

    /// Roll back the open transaction.
    ///
    /// Returns `false` when nothing was open; that is not an error.
    pub fn rollback_transaction(&self) -> Result<bool> {
        let rolled_back = match self.call(procedures::ROLLBACK_TRANSACTION, &[]) {
            Ok(_) => true,
            Err(Error::Fault(fault)) if fault.kind() == FaultKind::NoTransactionOpen => false,
            Err(e) => {
                self.state.lock().transaction = TransactionState::Unknown;
                return Err(e);
            }
        };
        self.state.lock().transaction = TransactionState::Closed;
        Ok(rolled_back)
    }

    /// Probe whether a transaction is open, leaving the device as it was.
    pub fn has_open_transaction(&self) -> Result<bool> {
        match self.start_transaction()? {
            TransactionStart::AlreadyOpen => Ok(true),
            TransactionStart::Started => {
                self.rollback_transaction()?;
                Ok(false)
            }
        }
    }

    /// Open a transaction unless one is already open.
    pub fn ensure_transaction(&self) -> Result<()> {
        self.start_transaction().map(|_| ())
    }

    /// Roll back any open transaction.
    pub fn ensure_no_transaction(&self) -> Result<()> {
        self.rollback_transaction().map(|_| ())
    }

    /// Transaction timeout in seconds.
    pub fn transaction_timeout(&self) -> Result<u32> {
        let value = self.call(procedures::GET_TRANSACTION_TIMEOUT, &[])?;
        wire::as_u32(&value, "transaction_timeout")
    }

    pub fn set_transaction_timeout(&self, seconds: u32) -> Result<()> {
        self.call(procedures::SET_TRANSACTION_TIMEOUT, &[json!(seconds)])
            .map(|_| ())
    }
}
