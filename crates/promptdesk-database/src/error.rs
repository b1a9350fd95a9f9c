//! Classification of sqlx failures into the error-code taxonomy.
//!
//! SQLite reports extended result codes; the low byte is the primary
//! code. Lock contention (`SQLITE_BUSY`, `SQLITE_LOCKED`) is the only
//! transient class. Constraint violations are the store's backstop for
//! checks the service layer already ran, so they map onto the same
//! referential kinds.

use promptdesk_core::error::{AppError, ErrorKind};

/// `SQLITE_BUSY`
const SQLITE_BUSY: i32 = 5;
/// `SQLITE_LOCKED`
const SQLITE_LOCKED: i32 = 6;

/// Map a sqlx error raised by a read, insert or update.
///
/// `context` is a short description of the attempted action. It becomes
/// the message of opaque errors, which callers never see verbatim anyway.
pub fn map_sqlx_error(context: &str, err: sqlx::Error) -> AppError {
    classify(context, err, ErrorKind::NotFound)
}

/// Map a sqlx error raised by a delete. A foreign-key failure there means
/// rows still reference the target.
pub fn map_delete_error(context: &str, err: sqlx::Error) -> AppError {
    classify(context, err, ErrorKind::NotEmpty)
}

/// Whether the error is SQLite lock contention.
pub fn is_lock_contention(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .map(|code| matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
            .unwrap_or(false),
        sqlx::Error::PoolTimedOut => true,
        _ => false,
    }
}

fn classify(context: &str, err: sqlx::Error, foreign_key_kind: ErrorKind) -> AppError {
    if is_lock_contention(&err) {
        return AppError::with_source(
            ErrorKind::StoreBusy,
            format!("{context}: the store is locked by another writer"),
            err,
        );
    }

    let kind = match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => ErrorKind::Conflict,
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => foreign_key_kind,
        _ => ErrorKind::Database,
    };

    let message = match kind {
        ErrorKind::Conflict => format!("{context}: an entry with the same name already exists"),
        ErrorKind::NotFound => format!("{context}: a referenced entry does not exist"),
        ErrorKind::NotEmpty => format!("{context}: the entry still has contents"),
        _ => format!("{context}: {err}"),
    };

    AppError::with_source(kind, message, err)
}
