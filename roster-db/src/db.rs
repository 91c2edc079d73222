// SPDX-FileCopyrightText: 2026 The roster developers
// SPDX-License-Identifier: MIT

//! Handles to the account database files under a filesystem root.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use nix::unistd::{AccessFlags, access};
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::DbKind;

/// A passwd or group database under a filesystem root.
///
/// The file itself must already exist; creating the initial databases is
/// the bootstrap component's job, not ours.
#[derive(Debug)]
pub struct AccountDb {
    pub(crate) kind: DbKind,
    pub(crate) path: PathBuf,
}

impl AccountDb {
    /// Open the `kind` database under `root`.
    ///
    /// The path is resolved to its canonical form so the lock protocol
    /// and the external tooling agree on which file is being guarded even
    /// when `etc` or the database is reached through a symlink. Fails with
    /// [`Error::DatabaseNotFound`] if the file does not exist.
    pub fn open(root: &Path, kind: DbKind) -> Result<Self> {
        let raw = root.join("etc").join(kind.file_name());
        let path = fs::canonicalize(&raw).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                Error::DatabaseNotFound(raw.clone())
            } else {
                Error::io(format!("Failed to resolve {}", raw.display()), e)
            }
        })?;
        debug!("Opened {} database at {}", kind, path.display());
        Ok(Self { kind, path })
    }

    /// Which database this handle refers to.
    pub fn kind(&self) -> DbKind {
        self.kind
    }

    /// Canonical path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the database file can be written by this process.
    ///
    /// A read-only database (e.g. on a read-only mount) is scanned without
    /// locking and treated as a recoverable condition on writes.
    pub fn is_writable(&self) -> bool {
        access(&self.path, AccessFlags::W_OK).is_ok()
    }
}
