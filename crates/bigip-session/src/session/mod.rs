//! Guards around ambient session state.
//!
//! Every guard is a plain function taking the connection and the operation to
//! run. They compose by nesting; the write path is fixed as
//!
//! ```text
//! with_restored_session -> writable folder switch -> with_transaction -> op
//! ```
//!
//! so folder state is only written back after the transaction has been submitted
//! or rolled back. Resource code never touches the ambient state directly.

mod transaction;


pub use transaction::{with_transaction, with_write_transaction};

use crate::connection::Connection;
use crate::constants::ROOT_FOLDER;
use crate::{Error, Result};

/// Ambient state captured at the start of a guarded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub active_folder: String,
    pub recursive_query: bool,
}

impl SessionSnapshot {
    /// Capture from the connection's mirrored state. No remote call.
    pub fn capture(conn: &Connection) -> Self {
        let ambient = conn.ambient();
        Self {
            active_folder: ambient.active_folder,
            recursive_query: ambient.recursive_query,
        }
    }

    /// Write back every field that differs from the current state.
    ///
    /// Both fields are attempted even if the first fails; the first error is
    /// returned.
    pub fn restore(&self, conn: &Connection) -> Result<()> {
        let folder = if conn.active_folder() == self.active_folder {
            Ok(())
        } else {
            conn.set_active_folder(&self.active_folder)
        };
        let recursive = if conn.recursive_query() == self.recursive_query {
            Ok(())
        } else {
            conn.set_recursive_query(self.recursive_query)
        };
        folder.and(recursive)
    }
}

/// Restores the snapshot if the guarded operation unwinds.
struct UnwindRestore<'a> {
    conn: &'a Connection,
    snapshot: &'a SessionSnapshot,
    armed: bool,
}

impl Drop for UnwindRestore<'_> {
    fn drop(&mut self) {
        if self.armed
            && std::thread::panicking()
            && let Err(e) = self.snapshot.restore(self.conn)
        {
            tracing::warn!(error = %e, "Failed to restore session state while unwinding");
        }
    }
}

/// Run `op` and put `(active_folder, recursive_query)` back as it was.
///
/// An error from `op` always wins; a restore failure on that path is only
/// logged. If `op` succeeded but the restore failed, the result is
/// [`Error::SessionRestore`].
pub fn with_restored_session<T, F>(conn: &Connection, op: F) -> Result<T>
where
    F: FnOnce(&Connection) -> Result<T>,
{
    let snapshot = SessionSnapshot::capture(conn);
    let mut unwind = UnwindRestore {
        conn,
        snapshot: &snapshot,
        armed: true,
    };

    let result = op(conn);
    unwind.armed = false;

    match (result, snapshot.restore(conn)) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(restore)) => Err(Error::SessionRestore {
            source: Box::new(restore),
        }),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(restore)) => {
            tracing::warn!(
                error = %e,
                restore_error = %restore,
                folder = %snapshot.active_folder,
                "Failed to restore session state after failed operation"
            );
            Err(e)
        }
    }
}

/// Run `op` at the root folder with recursive queries on, then restore.
///
/// Used by every bulk read so that listings see all partitions.
pub fn with_recursive_read<T, F>(conn: &Connection, op: F) -> Result<T>
where
    F: FnOnce(&Connection) -> Result<T>,
{
    with_restored_session(conn, |conn| {
        if conn.active_folder() != ROOT_FOLDER {
            conn.set_active_folder(ROOT_FOLDER)?;
        }
        if !conn.recursive_query() {
            conn.set_recursive_query(true)?;
        }
        op(conn)
    })
}

/// Run `op` scoped to one folder, then restore.
///
/// Recursion is enabled only when `folder` is the root.
pub fn with_folder_read<T, F>(conn: &Connection, folder: &str, op: F) -> Result<T>
where
    F: FnOnce(&Connection) -> Result<T>,
{
    with_restored_session(conn, |conn| {
        if conn.active_folder() != folder {
            conn.set_active_folder(folder)?;
        }
        let recursive = folder == ROOT_FOLDER;
        if conn.recursive_query() != recursive {
            conn.set_recursive_query(recursive)?;
        }
        op(conn)
    })
}

/// Run `op` in a folder that accepts mutations, then restore.
///
/// The device rejects writes while the session sits at the root folder; in that
/// case the session switches to the connection's writable folder.
pub fn with_writable_folder<T, F>(conn: &Connection, op: F) -> Result<T>
where
    F: FnOnce(&Connection) -> Result<T>,
{
    with_restored_session(conn, |conn| {
        if conn.active_folder() == ROOT_FOLDER {
            tracing::debug!(folder = conn.writable_folder(), "Switching to writable folder");
            conn.set_active_folder(conn.writable_folder())?;
        }
        op(conn)
    })
}
