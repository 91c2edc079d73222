// SPDX-FileCopyrightText: 2026 The roster developers
// SPDX-License-Identifier: MIT

//! Build-context collaborators: lifecycle phase, provenance marker, and
//! the overlay-enumeration seam.
//!
//! The engine never reads ambient globals; everything the surrounding
//! build framework knows is carried in a [`BuildContext`] handle so the
//! core stays testable in isolation.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Build lifecycle phases, as reported by the invoking framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Setup,
    Unpack,
    Compile,
    Test,
    Install,
    PreInstall,
    PostInstall,
}

impl Phase {
    /// Account provisioning may only run in these phases.
    pub fn can_provision(self) -> bool {
        matches!(self, Phase::Setup | Phase::PreInstall | Phase::PostInstall)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Setup => "setup",
            Phase::Unpack => "unpack",
            Phase::Compile => "compile",
            Phase::Test => "test",
            Phase::Install => "install",
            Phase::PreInstall => "pre-install",
            Phase::PostInstall => "post-install",
        };
        f.write_str(name)
    }
}

/// One template source: a named overlay rooted at a filesystem path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    pub name: String,
    pub path: PathBuf,
}

/// The overlay-enumeration collaborator.
///
/// Supplied by the external build-configuration service: the ordered
/// list of overlays for the current build target, highest priority
/// first. A failure here is fatal to the provisioning call.
pub trait Overlays {
    fn overlays(&self) -> Result<Vec<Overlay>>;
}

/// Disabled-login shells. A resolved shell in this set is a placeholder
/// meaning "no login", and is exempt from the must-exist-under-root
/// check. Configurable; this is the default set.
pub const DEFAULT_DISABLED_SHELLS: &[&str] = &["/bin/false", "/sbin/nologin", "/usr/sbin/nologin"];

/// Ambient facts about the current invocation, owned by the caller.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// The filesystem tree being assembled.
    pub build_root: PathBuf,
    /// The true host root; only written during the setup phase.
    pub live_root: PathBuf,
    /// Current lifecycle phase.
    pub phase: Phase,
    /// Provenance marker: when the request originates from a frozen
    /// upstream source, caller-supplied identifier overrides are ignored.
    pub frozen: bool,
    /// Scratch directory for the search-path cache file. `None` disables
    /// persistence; a fresh scratch directory invalidates the cache.
    pub scratch_dir: Option<PathBuf>,
    /// Disabled-login shell sentinels.
    pub disabled_shells: Vec<String>,
}

impl BuildContext {
    pub fn new(build_root: impl Into<PathBuf>, phase: Phase) -> Self {
        Self {
            build_root: build_root.into(),
            live_root: PathBuf::from("/"),
            phase,
            frozen: false,
            scratch_dir: None,
            disabled_shells: DEFAULT_DISABLED_SHELLS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Whether `shell` is a disabled-login sentinel.
    pub fn is_disabled_shell(&self, shell: &str) -> bool {
        self.disabled_shells.iter().any(|s| s == shell)
    }

    /// Resolve an absolute account path (home, shell) under a root.
    pub fn under_root(root: &Path, abs: &str) -> PathBuf {
        root.join(abs.trim_start_matches('/'))
    }
}
