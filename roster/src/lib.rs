// SPDX-FileCopyrightText: 2026 The roster developers
// SPDX-License-Identifier: MIT

//! Account provisioning for package build roots.
//!
//! roster creates POSIX user and group accounts inside a target
//! filesystem tree during package installation, reconciling three
//! sources of truth: the caller's request, per-overlay account
//! templates, and whatever the target's passwd/group databases already
//! contain. Creation is idempotent and append-only, serialized across
//! processes by the hard-link lock convention of the surrounding
//! package-manager tooling (see the `roster-db` crate).
//!
//! # Example
//!
//! ```ignore
//! use roster::{BuildContext, Config, Phase, Provisioner, UserRequest};
//!
//! let config = Config::from_file(Path::new("/etc/roster.toml"))?;
//! let ctx = BuildContext::new("/var/tmp/build/image", Phase::PreInstall);
//! let engine = Provisioner::new(&ctx, &config);
//!
//! let mut req = UserRequest::new("ntpd");
//! req.groups.push("ntp".to_string());
//! engine.ensure_user(&req)?;
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod provision;
pub mod reconcile;
pub mod templates;

pub use config::Config;
pub use context::{BuildContext, DEFAULT_DISABLED_SHELLS, Overlay, Overlays, Phase};
pub use error::{ProvisionError, Result};
pub use provision::{GroupRequest, Provisioned, Provisioner, UserRequest};
pub use templates::TemplateStore;

// The database layer is part of the public contract.
pub use roster_db as db;
