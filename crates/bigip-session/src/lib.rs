//! Session-state coordination for the BIG-IP iControl API
//!
//! An iControl session carries ambient state that changes the meaning of every
//! call made on it: the active folder, the recursive query flag and an optional
//! open transaction. This crate makes that state explicit and safe to use:
//!
//! * [`Connection`] mirrors the ambient state next to the [`Transport`] it talks
//!   through;
//! * [`session`] provides guards that switch the state around an operation and
//!   restore it on every exit path, plus an open-or-join transaction scope;
//! * [`cache`] maps resource identities to one shared proxy per resource.
//!
//! ```no_run
//! use bigip_session::{Connection, ConnectionConfig, Result, Transport, session};
//! use serde_json::Value;
//!
//! #[derive(Debug)]
//! struct Soap;
//!
//! impl Transport for Soap {
//!     fn invoke(&self, _procedure: &str, _args: &[Value]) -> Result<Value> {
//!         unimplemented!("send the request")
//!     }
//! }
//!
//! fn list_pools(config: &ConnectionConfig) -> Result<Value> {
//!     let conn = Connection::open(config, Soap)?;
//!     session::with_recursive_read(&conn, |c| c.call("LocalLB.Pool.get_list", &[]))
//! }
//! ```

pub mod cache;
pub mod config;
mod connection;
pub mod constants;
mod error;
mod fault;
pub mod observability;
pub mod session;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
mod transport;
pub mod wire;

pub use cache::{CacheStats, IdentityCache, ResourceIdentity, ResourceKey, ResourceKind};
pub use config::{ConfigBuilder, ConnectionConfig, LoggingConfig, SessionConfig};
pub use connection::{AmbientState, Connection, TransactionStart, TransactionState};
pub use error::{Error, Result};
pub use fault::{Fault, FaultKind};
pub use session::{
    SessionSnapshot, with_folder_read, with_recursive_read, with_restored_session,
    with_transaction, with_writable_folder, with_write_transaction,
};
pub use transport::Transport;
