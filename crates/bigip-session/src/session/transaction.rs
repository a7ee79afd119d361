//! Open-or-join transaction scopes

use super::with_writable_folder;
use crate::Result;
use crate::connection::{Connection, TransactionStart};

/// Rolls back an owned transaction if the operation unwinds.
struct UnwindRollback<'a> {
    conn: &'a Connection,
    armed: bool,
}

impl Drop for UnwindRollback<'_> {
    fn drop(&mut self) {
        if self.armed
            && std::thread::panicking()
            && let Err(e) = self.conn.rollback_transaction()
        {
            tracing::warn!(error = %e, "Rollback failed while unwinding");
        }
    }
}

/// Run `op` inside a transaction.
///
/// The start call that opens the transaction is the real start. If one was already
/// open, this scope joins it and leaves submit/rollback to the owner. An owning
/// scope submits on success and rolls back on failure; a rollback failure is
/// logged and the operation's error is returned unchanged.
pub fn with_transaction<T, F>(conn: &Connection, op: F) -> Result<T>
where
    F: FnOnce(&Connection) -> Result<T>,
{
    match conn.start_transaction()? {
        TransactionStart::AlreadyOpen => {
            tracing::debug!("Joining open transaction");
            op(conn)
        }
        TransactionStart::Started => {
            tracing::debug!("Transaction started");
            let mut unwind = UnwindRollback { conn, armed: true };
            let result = op(conn);
            unwind.armed = false;

            match result {
                Ok(value) => {
                    conn.submit_transaction()?;
                    tracing::debug!("Transaction submitted");
                    Ok(value)
                }
                Err(e) => {
                    match conn.rollback_transaction() {
                        Ok(_) => tracing::debug!(error = %e, "Transaction rolled back"),
                        Err(rollback) => tracing::warn!(
                            error = %e,
                            rollback_error = %rollback,
                            "Rollback failed"
                        ),
                    }
                    Err(e)
                }
            }
        }
    }
}

/// Writable folder, then transaction, then `op`; session state is restored last.
pub fn with_write_transaction<T, F>(conn: &Connection, op: F) -> Result<T>
where
    F: FnOnce(&Connection) -> Result<T>,
{
    with_writable_folder(conn, |conn| with_transaction(conn, op))
}
