// SPDX-FileCopyrightText: 2026 The roster developers
// SPDX-License-Identifier: MIT

//! Error types for account database operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::DbKind;

/// Result type for account database operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during account database operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database file not found under the target root
    #[error("Account database not found at: {0}")]
    DatabaseNotFound(PathBuf),

    /// Lock acquisition timed out
    #[error("Failed to lock '{path}': gave up after {attempts} attempts")]
    LockTimeout { path: PathBuf, attempts: u32 },

    /// Lock release failed. This is programmer error, not contention.
    #[error("Failed to release lock at '{path}': {source}")]
    LockRelease {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A database line does not have the fixed field shape for its kind
    #[error("Malformed {kind} entry: {line:?}")]
    MalformedEntry { kind: DbKind, line: String },

    /// Entry kind does not match the database it is being written to
    #[error("Cannot write a {entry} entry into the {db} database")]
    KindMismatch { entry: DbKind, db: DbKind },

    /// IO error with context
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }
}

/// Helper trait for adding context to IO errors
pub trait IoContext<T> {
    fn io_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> IoContext<T> for io::Result<T> {
    fn io_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| Error::io(f(), e))
    }
}
