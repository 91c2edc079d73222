// SPDX-FileCopyrightText: 2026 The roster developers
// SPDX-License-Identifier: MIT

//! Pure reconciliation of requested vs. template-declared values.
//!
//! Each function is a small decision table over (caller override,
//! template declaration, provenance marker) with no I/O, so the
//! precedence rules are testable without a filesystem. Uniqueness
//! against the live database is the engine's job, not ours.

use tracing::warn;

use crate::error::{ProvisionError, Result};

/// Default shell for accounts that must never log in.
pub const DEFAULT_LOCKED_SHELL: &str = "/bin/false";

fn resolve_id(
    what: &'static str,
    requested: Option<u32>,
    declared: Option<u32>,
    frozen: bool,
    name: &str,
) -> Result<u32> {
    // A frozen upstream source owns its identifier assignments; local
    // overrides are dropped, not rejected.
    let requested = match requested {
        Some(r) if frozen => {
            warn!("Ignoring requested {what} {r} for '{name}': frozen build context");
            None
        }
        other => other,
    };

    match (requested, declared) {
        (Some(r), Some(d)) if r == d => Ok(r),
        (Some(r), Some(d)) => Err(ProvisionError::IdConflict {
            what,
            name: name.to_string(),
            requested: r,
            declared: d,
        }),
        (Some(r), None) => Ok(r),
        (None, Some(d)) => Ok(d),
        (None, None) => Err(ProvisionError::NoIdAvailable {
            what,
            name: name.to_string(),
        }),
    }
}

/// Resolve the uid for a user account.
pub fn resolve_user_uid(
    requested: Option<u32>,
    declared: Option<u32>,
    frozen: bool,
    name: &str,
) -> Result<u32> {
    resolve_id("uid", requested, declared, frozen, name)
}

/// Resolve the gid for a group. Agreement-or-fail when both sources are
/// present; otherwise whichever is present is adopted.
pub fn resolve_group_gid(
    requested: Option<u32>,
    declared: Option<u32>,
    frozen: bool,
    name: &str,
) -> Result<u32> {
    resolve_id("gid", requested, declared, frozen, name)
}

/// Resolve the login shell for a user account.
///
/// A caller must not request a disabled-login sentinel by name; the
/// sentinel is what the absence of an override means. Existence of the
/// resolved shell under the target root is checked by the engine.
pub fn resolve_shell(
    requested: Option<&str>,
    declared: Option<&str>,
    disabled_shells: &[String],
    name: &str,
) -> Result<String> {
    if let Some(shell) = requested {
        if disabled_shells.iter().any(|s| s == shell) {
            return Err(ProvisionError::usage(format!(
                "Do not request the disabled-login shell '{shell}' for '{name}'; \
                 omit the shell override instead"
            )));
        }
        return Ok(shell.to_string());
    }
    Ok(declared.unwrap_or(DEFAULT_LOCKED_SHELL).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    // Template only: template wins.
    #[case(None, Some(1000), false, Ok(1000))]
    // Agreement: no error.
    #[case(Some(1000), Some(1000), false, Ok(1000))]
    // Override only: adopted.
    #[case(Some(1001), None, false, Ok(1001))]
    // Frozen context drops the override, template applies.
    #[case(Some(1001), Some(1000), true, Ok(1000))]
    fn test_uid_resolution(
        #[case] requested: Option<u32>,
        #[case] declared: Option<u32>,
        #[case] frozen: bool,
        #[case] expected: Result<u32>,
    ) {
        let got = resolve_user_uid(requested, declared, frozen, "svc");
        assert_eq!(got.unwrap(), expected.unwrap());
    }

    #[test]
    fn test_uid_conflict_is_fatal() {
        let err = resolve_user_uid(Some(1001), Some(1000), false, "svc").unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::IdConflict {
                what: "uid",
                requested: 1001,
                declared: 1000,
                ..
            }
        ));
    }

    #[test]
    fn test_no_uid_anywhere_is_fatal() {
        let err = resolve_user_uid(None, None, false, "svc").unwrap_err();
        assert!(matches!(err, ProvisionError::NoIdAvailable { what: "uid", .. }));
    }

    #[test]
    fn test_frozen_with_no_template_uid_is_fatal() {
        // The override is dropped, and nothing remains to resolve from.
        let err = resolve_user_uid(Some(1001), None, true, "svc").unwrap_err();
        assert!(matches!(err, ProvisionError::NoIdAvailable { .. }));
    }

    #[rstest]
    #[case(None, Some(10), Ok(10))]
    #[case(Some(10), Some(10), Ok(10))]
    #[case(Some(11), None, Ok(11))]
    fn test_gid_adopts_present_source(
        #[case] requested: Option<u32>,
        #[case] declared: Option<u32>,
        #[case] expected: Result<u32>,
    ) {
        let got = resolve_group_gid(requested, declared, false, "wheel");
        assert_eq!(got.unwrap(), expected.unwrap());
    }

    #[test]
    fn test_gid_disagreement_is_fatal() {
        assert!(resolve_group_gid(Some(11), Some(10), false, "wheel").is_err());
    }

    fn disabled() -> Vec<String> {
        vec!["/bin/false".to_string(), "/sbin/nologin".to_string()]
    }

    #[test]
    fn test_shell_override_wins() {
        let shell = resolve_shell(Some("/bin/bash"), Some("/bin/sh"), &disabled(), "svc");
        assert_eq!(shell.unwrap(), "/bin/bash");
    }

    #[test]
    fn test_requesting_sentinel_shell_is_usage_error() {
        let err = resolve_shell(Some("/sbin/nologin"), None, &disabled(), "svc").unwrap_err();
        assert!(matches!(err, ProvisionError::Usage(_)));
    }

    #[test]
    fn test_shell_defaults() {
        // Template declaration applies when there is no override.
        let shell = resolve_shell(None, Some("/bin/sh"), &disabled(), "svc");
        assert_eq!(shell.unwrap(), "/bin/sh");
        // Nothing declared: the locked-account default.
        let shell = resolve_shell(None, None, &disabled(), "svc");
        assert_eq!(shell.unwrap(), DEFAULT_LOCKED_SHELL);
    }
}
