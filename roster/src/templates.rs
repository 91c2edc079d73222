// SPDX-FileCopyrightText: 2026 The roster developers
// SPDX-License-Identifier: MIT

//! Account template resolution across the overlay search path.
//!
//! Templates are read-only declarations of intended account attributes,
//! one file per account under `<overlay>/profiles/base/accounts/{user,group}/`.
//! Each file is a newline-delimited `field:value` mapping; `#` comments
//! and blank lines are ignored. A template may declare only a subset of
//! its kind's fields.

use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use roster_db::DbKind;
use tracing::{debug, warn};

use crate::context::Overlays;
use crate::error::{IoContext, ProvisionError, Result};

/// Accounts subdirectory within an overlay.
pub const ACCOUNTS_SUBDIR: &str = "profiles/base/accounts";

/// Name of the search-path cache file within the scratch directory.
pub const SEARCH_PATH_CACHE_FILE: &str = "accounts-search-path";

/// Fixed field set of a user template.
pub const USER_FIELDS: &[&str] = &["user", "password", "uid", "gid", "gecos", "home", "shell"];

/// Fixed field set of a group template.
pub const GROUP_FIELDS: &[&str] = &["group", "password", "gid", "users"];

/// Fixed field set for a template kind.
pub fn template_fields(kind: DbKind) -> &'static [&'static str] {
    match kind {
        DbKind::Passwd => USER_FIELDS,
        DbKind::Group => GROUP_FIELDS,
    }
}

fn template_subdir(kind: DbKind) -> &'static str {
    match kind {
        DbKind::Passwd => "user",
        DbKind::Group => "group",
    }
}

/// Resolves and caches the accounts search path, and looks up template
/// field values.
pub struct TemplateStore<'a> {
    overlays: &'a dyn Overlays,
    cache_file: Option<PathBuf>,
    search_path: OnceLock<Vec<PathBuf>>,
}

impl<'a> TemplateStore<'a> {
    /// `cache_file` persists the resolved search path across processes
    /// within one build context; pass `None` to disable.
    pub fn new(overlays: &'a dyn Overlays, cache_file: Option<PathBuf>) -> Self {
        Self {
            overlays,
            cache_file,
            search_path: OnceLock::new(),
        }
    }

    /// The ordered accounts search path, highest priority first.
    ///
    /// Resolved once per store: overlays are enumerated in priority
    /// order and filtered to those that carry an accounts subdirectory.
    /// An empty path is valid and means there is nothing to provision
    /// against.
    pub fn search_path(&self) -> Result<&[PathBuf]> {
        if let Some(cached) = self.search_path.get() {
            return Ok(cached);
        }
        let resolved = self.resolve_search_path()?;
        Ok(self.search_path.get_or_init(|| resolved))
    }

    fn resolve_search_path(&self) -> Result<Vec<PathBuf>> {
        if let Some(cache) = &self.cache_file {
            if cache.is_file() {
                let content = fs::read_to_string(cache)
                    .io_context(|| format!("Failed to read {}", cache.display()))?;
                let dirs: Vec<PathBuf> = content.lines().map(PathBuf::from).collect();
                debug!(
                    "Loaded accounts search path ({} dirs) from {}",
                    dirs.len(),
                    cache.display()
                );
                return Ok(dirs);
            }
        }

        let overlays = self.overlays.overlays()?;
        let dirs: Vec<PathBuf> = overlays
            .iter()
            .map(|o| o.path.join(ACCOUNTS_SUBDIR))
            .filter(|d| d.is_dir())
            .collect();
        debug!(
            "Resolved accounts search path: {} of {} overlays carry accounts",
            dirs.len(),
            overlays.len()
        );

        if let Some(cache) = &self.cache_file {
            let mut content = String::new();
            for dir in &dirs {
                content.push_str(&dir.to_string_lossy());
                content.push('\n');
            }
            // The cache is an optimization; a failure to persist it must
            // not fail the provisioning call.
            if let Err(e) = fs::write(cache, content) {
                warn!("Failed to persist search path to {}: {e}", cache.display());
            }
        }

        Ok(dirs)
    }

    /// Locate the template for `name`, if any overlay declares one.
    ///
    /// The first match on the search path wins; `None` is not an error.
    pub fn find(&self, kind: DbKind, name: &str) -> Result<Option<PathBuf>> {
        for dir in self.search_path()? {
            let candidate = dir.join(template_subdir(kind)).join(name);
            if candidate.is_file() {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    /// Extract a declared field value from the template for `name`.
    ///
    /// Fatal if `field` is not in the kind's fixed field set, or if no
    /// template exists at all. Returns the empty string when the
    /// template exists but does not declare the field.
    pub fn field(&self, kind: DbKind, name: &str, field: &str) -> Result<String> {
        if !template_fields(kind).contains(&field) {
            return Err(ProvisionError::UnknownField {
                kind,
                field: field.to_string(),
            });
        }
        let path = self
            .find(kind, name)?
            .ok_or_else(|| ProvisionError::MissingTemplate {
                kind,
                name: name.to_string(),
            })?;

        let content = fs::read_to_string(&path)
            .io_context(|| format!("Failed to read template at {}", path.display()))?;
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line
                .split_once(':')
                .ok_or_else(|| ProvisionError::MalformedTemplate {
                    path: path.clone(),
                    line: line.to_string(),
                })?;
            if key == field {
                return Ok(value.to_string());
            }
        }
        Ok(String::new())
    }

    /// As [`TemplateStore::field`], with the empty string mapped to `None`.
    pub fn field_opt(&self, kind: DbKind, name: &str, field: &str) -> Result<Option<String>> {
        let value = self.field(kind, name, field)?;
        Ok(if value.is_empty() { None } else { Some(value) })
    }

    /// A declared numeric identifier field, or `None` if undeclared.
    pub fn id_field(&self, kind: DbKind, name: &str, field: &'static str) -> Result<Option<u32>> {
        match self.field_opt(kind, name, field)? {
            None => Ok(None),
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|_| ProvisionError::InvalidTemplateValue {
                    name: name.to_string(),
                    field,
                    value,
                }),
        }
    }
}
