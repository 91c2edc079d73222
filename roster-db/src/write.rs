// SPDX-FileCopyrightText: 2026 The roster developers
// SPDX-License-Identifier: MIT

//! Conditional-append write operations for the account databases.

use std::fs::{self, OpenOptions};
use std::io::Write;

use tracing::{debug, info};

use crate::db::AccountDb;
use crate::error::{Error, IoContext, Result};
use crate::lock::DbLock;
use crate::types::Entry;

/// Outcome of an append attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The entry was appended.
    Written,
    /// An entry with the same primary key already exists; nothing written.
    AlreadyExists,
    /// The database file is not writable; nothing written. Recoverable —
    /// callers decide whether a read-only target is acceptable.
    ReadOnly,
}

impl AccountDb {
    /// Append `entry` unless its primary key is already present.
    ///
    /// The existence check runs again under the lock: two concurrent
    /// callers can both observe "absent" beforehand, and only the
    /// re-check decides which one appends. Existing keys are never
    /// rewritten or removed.
    pub fn append(&self, entry: &Entry) -> Result<WriteOutcome> {
        if entry.kind() != self.kind {
            return Err(Error::KindMismatch {
                entry: entry.kind(),
                db: self.kind,
            });
        }
        if !self.is_writable() {
            debug!(
                "{} is read-only, skipping append for '{}'",
                self.path.display(),
                entry.name()
            );
            return Ok(WriteOutcome::ReadOnly);
        }

        let lock = DbLock::acquire(&self.path)?;
        let outcome = self.append_locked(entry);
        lock.release()?;
        outcome
    }

    fn append_locked(&self, entry: &Entry) -> Result<WriteOutcome> {
        let content = fs::read_to_string(&self.path)
            .io_context(|| format!("Failed to read {}", self.path.display()))?;
        for line in content.lines().filter(|l| !l.is_empty()) {
            if Entry::parse(self.kind, line)?.name() == entry.name() {
                debug!(
                    "'{}' already present in {}, not appending",
                    entry.name(),
                    self.path.display()
                );
                return Ok(WriteOutcome::AlreadyExists);
            }
        }

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .io_context(|| format!("Failed to open {} for append", self.path.display()))?;
        // Repair a missing final newline before appending ours.
        if !content.is_empty() && !content.ends_with('\n') {
            file.write_all(b"\n")
                .io_context(|| format!("Failed to write to {}", self.path.display()))?;
        }
        writeln!(file, "{}", entry.to_line())
            .io_context(|| format!("Failed to write to {}", self.path.display()))?;

        info!(
            "Added {} entry '{}' to {}",
            self.kind,
            entry.name(),
            self.path.display()
        );
        Ok(WriteOutcome::Written)
    }
}
