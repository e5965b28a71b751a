//! Mapping of driver failures onto [`DocumentStoreError`].

use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};

use docflow_core::error::{DocumentStoreError, ResourceKind};

const DUPLICATE_KEY: i32 = 11000;
const NAMESPACE_EXISTS: i32 = 48;
const UNAUTHORIZED: i32 = 13;
const AUTHENTICATION_FAILED: i32 = 18;
const TOO_MANY_REQUESTS: i32 = 16500;

fn server_code(err: &MongoError) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => Some(write_error.code),
        ErrorKind::Command(command_error) => Some(command_error.code),
        _ => None,
    }
}

/// Whether the server rejected a write because the key or namespace is taken.
pub(crate) fn is_duplicate(err: &MongoError) -> bool {
    matches!(server_code(err), Some(DUPLICATE_KEY | NAMESPACE_EXISTS))
}

/// Classifies a driver error, keeping its message.
pub(crate) fn driver_error(err: MongoError) -> DocumentStoreError {
    match err.kind.as_ref() {
        ErrorKind::Authentication { .. } => DocumentStoreError::Unauthorized(err.to_string()),
        ErrorKind::Io(_)
        | ErrorKind::ServerSelection { .. }
        | ErrorKind::ConnectionPoolCleared { .. } => DocumentStoreError::Transport(err.to_string()),
        ErrorKind::InvalidArgument { .. } => DocumentStoreError::Validation(err.to_string()),
        _ => code_error(server_code(&err), err.to_string()),
    }
}

/// Classifies a server error by its code.
fn code_error(code: Option<i32>, message: String) -> DocumentStoreError {
    match code {
        Some(UNAUTHORIZED | AUTHENTICATION_FAILED) => DocumentStoreError::Unauthorized(message),
        Some(TOO_MANY_REQUESTS) => DocumentStoreError::Throttled(message),
        _ => DocumentStoreError::Backend(message),
    }
}

/// Like [`driver_error`], reporting duplicates as a conflict on `id`.
pub(crate) fn write_error(kind: ResourceKind, id: &str) -> impl FnOnce(MongoError) -> DocumentStoreError + '_ {
    move |err| {
        if is_duplicate(&err) {
            DocumentStoreError::conflict(kind, id)
        } else {
            driver_error(err)
        }
    }
}
