// SPDX-FileCopyrightText: 2026 The roster developers
// SPDX-License-Identifier: MIT

//! Error types for account provisioning.

use std::io;
use std::path::PathBuf;

use roster_db::DbKind;
use thiserror::Error;

use crate::context::Phase;

/// Result type for provisioning operations.
pub type Result<T> = std::result::Result<T, ProvisionError>;

/// Errors that can occur while provisioning an account.
///
/// Everything here is fatal for the current provisioning call; the one
/// recoverable condition (a read-only build-root database) is an
/// [`Provisioned::ReadOnly`](crate::provision::Provisioned) outcome, not
/// an error.
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// Account database error
    #[error("Account database error: {0}")]
    Db(#[from] roster_db::Error),

    /// The caller passed arguments this subsystem refuses to accept
    #[error("Usage error: {0}")]
    Usage(String),

    /// Provisioning called outside the setup/pre-install/post-install phases
    #[error("Account provisioning is not allowed in the {0} phase")]
    WrongPhase(Phase),

    /// Overlay enumeration collaborator failed
    #[error("Overlay enumeration failed: {0}")]
    Overlays(String),

    /// No template found anywhere on the search path
    #[error("No {kind} template found for '{name}'")]
    MissingTemplate { kind: DbKind, name: String },

    /// A field name outside the fixed set for the template kind
    #[error("Unknown {kind} template field: {field}")]
    UnknownField { kind: DbKind, field: String },

    /// Template line that is not a `field:value` mapping
    #[error("Malformed line in template {path}: {line:?}")]
    MalformedTemplate { path: PathBuf, line: String },

    /// Template declares a name that differs from its own file name
    #[error("Template for '{name}' declares mismatched name '{declared}'")]
    TemplateNameMismatch { name: String, declared: String },

    /// Template declares a value that does not parse for its field
    #[error("Template for '{name}' declares invalid {field}: {value:?}")]
    InvalidTemplateValue {
        name: String,
        field: &'static str,
        value: String,
    },

    /// Caller-requested and template-declared identifiers disagree
    #[error("Conflicting {what} for '{name}': requested {requested}, template declares {declared}")]
    IdConflict {
        what: &'static str,
        name: String,
        requested: u32,
        declared: u32,
    },

    /// Neither the caller nor the template supplies an identifier
    #[error("No {what} available for '{name}': none requested and none declared")]
    NoIdAvailable { what: &'static str, name: String },

    /// The resolved identifier already belongs to another entry
    #[error("{what} {id} for '{name}' is already taken by '{holder}'")]
    IdTaken {
        what: &'static str,
        name: String,
        id: u32,
        holder: String,
    },

    /// The resolved login shell does not exist under the target root
    #[error("Shell '{shell}' does not exist under {root}")]
    ShellMissing { shell: String, root: PathBuf },

    /// A setup-phase commit into the live root cannot degrade to read-only
    #[error("Setup-phase commit into {root} failed: {kind} database is read-only")]
    LiveCommitReadOnly { root: PathBuf, kind: DbKind },

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// IO error with context
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: io::Error,
    },
}

impl ProvisionError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

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
        self.map_err(|e| ProvisionError::io(f(), e))
    }
}
