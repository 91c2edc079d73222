// SPDX-FileCopyrightText: 2026 The roster developers
// SPDX-License-Identifier: MIT

//! Lock-guarded access to the passwd and group databases under a
//! filesystem root.
//!
//! This crate is the database layer of roster: it knows the on-disk
//! colon-delimited format, the `<file>.lock` hard-link convention shared
//! with the package-manager tooling, and the conditional-append write
//! discipline that keeps concurrent provisioners from duplicating
//! entries. It never modifies or removes an existing entry.
//!
//! # Example
//!
//! ```ignore
//! use roster_db::{AccountDb, DbKind, Entry, WriteOutcome};
//!
//! let db = AccountDb::open(build_root, DbKind::Passwd)?;
//! if db.query("builder")?.is_empty() {
//!     match db.append(&entry)? {
//!         WriteOutcome::Written => { /* side effects */ }
//!         WriteOutcome::AlreadyExists => { /* lost the race, fine */ }
//!         WriteOutcome::ReadOnly => { /* degraded target */ }
//!     }
//! }
//! ```

mod db;
mod error;
mod lock;
mod query;
mod types;
mod write;

pub use db::AccountDb;
pub use error::{Error, IoContext, Result};
pub use lock::{DbLock, LOCK_MAX_ATTEMPTS, LOCK_RETRY_INTERVAL};
pub use types::{DbKind, Entry, GroupEntry, PasswdEntry};
pub use write::WriteOutcome;
