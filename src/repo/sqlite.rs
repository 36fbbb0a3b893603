use crate::models::config::{DatabaseConfig, TransactionMode};
use crate::models::error::ExecutionError;
use crate::service::statement::{is_transaction_control, preview};
use log::{debug, warn};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;

const STATEMENT_PREVIEW_CHARS: usize = 80;

/// Open a fresh connection to the database that belongs to `location_name`.
///
/// The connection is owned by the caller and closed when dropped; nothing is
/// pooled between files.
pub fn open_connection(
    database: &DatabaseConfig,
    location_name: &str,
) -> Result<Connection, ExecutionError> {
    let path = database.database_path(location_name);

    let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    if database.create_if_missing {
        flags |= OpenFlags::SQLITE_OPEN_CREATE;
    }

    let conn = Connection::open_with_flags(&path, flags)
        .map_err(|cause| connection_error(location_name, &path, cause))?;

    conn.busy_timeout(database.busy_timeout())
        .map_err(|cause| connection_error(location_name, &path, cause))?;

    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|cause| connection_error(location_name, &path, cause))?;

    debug!("Opened database '{}' at {}", location_name, path.display());
    Ok(conn)
}

fn connection_error(location_name: &str, path: &Path, cause: rusqlite::Error) -> ExecutionError {
    ExecutionError::Connection {
        database: location_name.to_string(),
        path: path.to_path_buf(),
        cause,
    }
}

/// Execute `statements` in order and return how many ran.
///
/// With `commit` false everything runs inside a transaction that is rolled
/// back at the end, whatever `mode` says. While a file runs inside that
/// transaction (file mode or an uncommitted run) its own `BEGIN`, `COMMIT`
/// and `END` statements are skipped, so `sqlite3 .dump` output runs as is.
pub fn execute_statements(
    conn: &mut Connection,
    statements: &[String],
    mode: TransactionMode,
    commit: bool,
) -> Result<usize, ExecutionError> {
    if mode == TransactionMode::Statement && commit {
        let result = run_each(conn, statements, false);

        // The file may have opened its own transaction and left it open
        if conn.is_autocommit() {
            return result;
        }
        return match (result, conn.execute_batch("COMMIT;")) {
            (result, Ok(())) => result,
            (Ok(_), Err(cause)) => Err(ExecutionError::Transaction {
                operation: "commit",
                cause,
            }),
            (Err(err), Err(cause)) => {
                warn!("Could not commit transaction left open by the file: {}", cause);
                if let Err(cause) = conn.execute_batch("ROLLBACK;") {
                    warn!("Rollback after failed commit also failed: {}", cause);
                }
                Err(mark_rolled_back(err))
            }
        };
    }

    let tx = conn
        .transaction()
        .map_err(|cause| ExecutionError::Transaction {
            operation: "begin",
            cause,
        })?;

    // Dropping `tx` on error rolls the whole file back
    let executed = run_each(&tx, statements, true)?;

    if commit {
        tx.commit().map_err(|cause| ExecutionError::Transaction {
            operation: "commit",
            cause,
        })?;
    } else {
        tx.rollback().map_err(|cause| ExecutionError::Transaction {
            operation: "roll back",
            cause,
        })?;
    }

    Ok(executed)
}

/// Run each statement; `wrapped` means an outer transaction is open and must
/// stay open until the caller finishes it.
fn run_each(
    conn: &Connection,
    statements: &[String],
    wrapped: bool,
) -> Result<usize, ExecutionError> {
    for (idx, statement) in statements.iter().enumerate() {
        if wrapped && is_transaction_control(statement) {
            debug!(
                "Skipped statement #{} inside file transaction: {}",
                idx + 1,
                preview(statement, STATEMENT_PREVIEW_CHARS)
            );
            continue;
        }

        conn.execute_batch(statement)
            .map_err(|cause| ExecutionError::StatementExecution {
                index: idx + 1,
                statement: preview(statement, STATEMENT_PREVIEW_CHARS),
                executed: idx,
                rolled_back: wrapped,
                cause,
            })?;

        if wrapped && conn.is_autocommit() {
            return Err(ExecutionError::TransactionEnded {
                index: idx + 1,
                statement: preview(statement, STATEMENT_PREVIEW_CHARS),
                executed: idx,
            });
        }

        debug!(
            "Executed statement #{}: {}",
            idx + 1,
            preview(statement, STATEMENT_PREVIEW_CHARS)
        );
    }
    Ok(statements.len())
}

fn mark_rolled_back(err: ExecutionError) -> ExecutionError {
    match err {
        ExecutionError::StatementExecution {
            index,
            statement,
            executed,
            cause,
            ..
        } => ExecutionError::StatementExecution {
            index,
            statement,
            executed,
            rolled_back: true,
            cause,
        },
        other => other,
    }
}
