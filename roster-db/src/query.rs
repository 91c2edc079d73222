// SPDX-FileCopyrightText: 2026 The roster developers
// SPDX-License-Identifier: MIT

//! Read query operations for the account databases.

use std::fs;

use crate::db::AccountDb;
use crate::error::{IoContext, Result};
use crate::lock::DbLock;
use crate::types::Entry;

impl AccountDb {
    /// Return all entries matching `key`.
    ///
    /// A key matches an entry's primary key (the name field) or its
    /// numeric secondary key — the uid for passwd, the gid for group —
    /// so callers can look up by name or by id with one operation. An
    /// empty result is not an error.
    ///
    /// Scans under the database lock unless the file is read-only, in
    /// which case no writer can race us and locking is skipped.
    pub fn query(&self, key: &str) -> Result<Vec<Entry>> {
        if !self.is_writable() {
            return self.query_unlocked(key);
        }
        let lock = DbLock::acquire(&self.path)?;
        let result = self.query_unlocked(key);
        lock.release()?;
        result
    }

    /// As [`AccountDb::query`], without taking the lock.
    ///
    /// For use where the caller already holds the lock; a second
    /// acquisition attempt would wait out the full retry budget against
    /// our own lock file.
    pub fn query_unlocked(&self, key: &str) -> Result<Vec<Entry>> {
        let content = fs::read_to_string(&self.path)
            .io_context(|| format!("Failed to read {}", self.path.display()))?;

        let mut matches = Vec::new();
        for line in content.lines() {
            if line.is_empty() {
                continue;
            }
            let entry = Entry::parse(self.kind, line)?;
            if entry.name() == key || entry.id().to_string() == key {
                matches.push(entry);
            }
        }
        Ok(matches)
    }

    /// Whether any entry has `name` as its primary key.
    pub fn contains_name(&self, name: &str) -> Result<bool> {
        Ok(self.query(name)?.iter().any(|e| e.name() == name))
    }
}
