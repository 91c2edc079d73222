// SPDX-FileCopyrightText: 2026 The roster developers
// SPDX-License-Identifier: MIT

//! The provisioning engine: user and group creation into a build root.
//!
//! Composes the template store and the database layer. Each call is a
//! single synchronous check-then-commit sequence; the database lock
//! serializes us against other provisioners (and the package-manager
//! tooling) targeting the same files.

use std::fs;
use std::os::unix::fs::PermissionsExt;

use nix::unistd::{Gid, Uid, chown};
use roster_db::{AccountDb, DbKind, Entry, GroupEntry, PasswdEntry, WriteOutcome};
use tracing::{debug, info, warn};

use crate::context::{BuildContext, Overlays, Phase};
use crate::error::{IoContext, ProvisionError, Result};
use crate::reconcile::{resolve_group_gid, resolve_shell, resolve_user_uid};
use crate::templates::{SEARCH_PATH_CACHE_FILE, TemplateStore};

/// Password field for accounts that can never authenticate.
pub const LOCKED_PASSWORD: &str = "!";

/// Home directory for accounts that have none.
pub const DEFAULT_HOME: &str = "/dev/null";

/// Mode for a freshly materialized home directory (owner rwx, rest rx).
const HOME_DIR_MODE: u32 = 0o755;

/// A request to provision a user account.
///
/// Every field except the name is an optional override; `None` means
/// "use the template's declaration or the documented default".
#[derive(Debug, Clone)]
pub struct UserRequest {
    pub name: String,
    pub uid: Option<u32>,
    pub shell: Option<String>,
    pub home: Option<String>,
    /// Groups the user belongs to; each is provisioned first.
    pub groups: Vec<String>,
}

impl UserRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uid: None,
            shell: None,
            home: None,
            groups: Vec::new(),
        }
    }
}

/// A request to provision a group.
#[derive(Debug, Clone)]
pub struct GroupRequest {
    pub name: String,
    pub gid: Option<u32>,
}

impl GroupRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            gid: None,
        }
    }
}

/// How a provisioning call concluded. All variants are success; fatal
/// conditions are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    /// The entry was created.
    Created,
    /// An entry with this name already existed; nothing changed.
    AlreadyPresent,
    /// The search path is empty; there is nothing to provision against.
    Skipped,
    /// The build-root database is read-only; the commit was skipped.
    ReadOnly,
}

/// The provisioning engine for one build context.
pub struct Provisioner<'a> {
    ctx: &'a BuildContext,
    templates: TemplateStore<'a>,
}

impl<'a> Provisioner<'a> {
    pub fn new(ctx: &'a BuildContext, overlays: &'a dyn Overlays) -> Self {
        let cache_file = ctx
            .scratch_dir
            .as_ref()
            .map(|d| d.join(SEARCH_PATH_CACHE_FILE));
        Self {
            ctx,
            templates: TemplateStore::new(overlays, cache_file),
        }
    }

    /// The template store backing this engine.
    pub fn templates(&self) -> &TemplateStore<'a> {
        &self.templates
    }

    /// Provision a user account into the build root.
    ///
    /// Idempotent: an already-present name is success. Creating the user
    /// provisions each of its groups first, and materializes the home
    /// directory once the entry is committed.
    pub fn ensure_user(&self, req: &UserRequest) -> Result<Provisioned> {
        self.check_phase()?;
        if req.name.is_empty() {
            return Err(ProvisionError::usage("user name must not be empty"));
        }
        if self.templates.search_path()?.is_empty() {
            debug!("Empty accounts search path, nothing to provision");
            return Ok(Provisioned::Skipped);
        }

        let db = AccountDb::open(&self.ctx.build_root, DbKind::Passwd)?;
        if db.contains_name(&req.name)? {
            debug!("User '{}' already present", req.name);
            return Ok(Provisioned::AlreadyPresent);
        }

        self.check_template_name(DbKind::Passwd, &req.name, "user")?;

        let declared_uid = self.templates.id_field(DbKind::Passwd, &req.name, "uid")?;
        let uid = resolve_user_uid(req.uid, declared_uid, self.ctx.frozen, &req.name)?;
        self.check_id_free(&db, "uid", &req.name, uid)?;

        // Classic same-uid-gid convention when the template is silent.
        let gid = self
            .templates
            .id_field(DbKind::Passwd, &req.name, "gid")?
            .unwrap_or(uid);

        let declared_shell = self.templates.field_opt(DbKind::Passwd, &req.name, "shell")?;
        let shell = resolve_shell(
            req.shell.as_deref(),
            declared_shell.as_deref(),
            &self.ctx.disabled_shells,
            &req.name,
        )?;
        if !self.ctx.is_disabled_shell(&shell) {
            let shell_path = BuildContext::under_root(&self.ctx.build_root, &shell);
            if !shell_path.exists() {
                return Err(ProvisionError::ShellMissing {
                    shell,
                    root: self.ctx.build_root.clone(),
                });
            }
        }

        let home = match (&req.home, self.templates.field_opt(DbKind::Passwd, &req.name, "home")?) {
            (Some(h), _) => h.clone(),
            (None, Some(h)) => h,
            (None, None) => DEFAULT_HOME.to_string(),
        };

        // Group memberships first: a user may pull its groups into
        // existence.
        for group in &req.groups {
            self.ensure_group(&GroupRequest::new(group))?;
        }

        let gecos = self.templates.field(DbKind::Passwd, &req.name, "gecos")?;
        let password = self
            .templates
            .field_opt(DbKind::Passwd, &req.name, "password")?
            .unwrap_or_else(|| LOCKED_PASSWORD.to_string());

        let entry = Entry::Passwd(PasswdEntry {
            name: req.name.clone(),
            password,
            uid,
            gid,
            gecos,
            home: home.clone(),
            shell,
        });

        match self.commit(&entry, DbKind::Passwd)? {
            WriteOutcome::Written => {
                info!("Provisioned user '{}' (uid {uid}, gid {gid})", req.name);
                self.materialize_home(&home, uid, gid)?;
                Ok(Provisioned::Created)
            }
            WriteOutcome::AlreadyExists => Ok(Provisioned::AlreadyPresent),
            WriteOutcome::ReadOnly => {
                warn!(
                    "Skipping user '{}': {} database under {} is read-only",
                    req.name,
                    DbKind::Passwd,
                    self.ctx.build_root.display()
                );
                Ok(Provisioned::ReadOnly)
            }
        }
    }

    /// Provision a group into the build root. Mirrors [`ensure_user`]
    /// at smaller scale.
    ///
    /// [`ensure_user`]: Provisioner::ensure_user
    pub fn ensure_group(&self, req: &GroupRequest) -> Result<Provisioned> {
        self.check_phase()?;
        if req.name.is_empty() {
            return Err(ProvisionError::usage("group name must not be empty"));
        }
        if self.templates.search_path()?.is_empty() {
            debug!("Empty accounts search path, nothing to provision");
            return Ok(Provisioned::Skipped);
        }

        let db = AccountDb::open(&self.ctx.build_root, DbKind::Group)?;
        if db.contains_name(&req.name)? {
            debug!("Group '{}' already present", req.name);
            return Ok(Provisioned::AlreadyPresent);
        }

        self.check_template_name(DbKind::Group, &req.name, "group")?;

        let declared_gid = self.templates.id_field(DbKind::Group, &req.name, "gid")?;
        let gid = resolve_group_gid(req.gid, declared_gid, self.ctx.frozen, &req.name)?;
        self.check_id_free(&db, "gid", &req.name, gid)?;

        let password = self
            .templates
            .field_opt(DbKind::Group, &req.name, "password")?
            .unwrap_or_else(|| LOCKED_PASSWORD.to_string());
        let users = self.templates.field(DbKind::Group, &req.name, "users")?;
        let members = if users.is_empty() {
            Vec::new()
        } else {
            users.split(',').map(str::to_string).collect()
        };

        let entry = Entry::Group(GroupEntry {
            name: req.name.clone(),
            password,
            gid,
            members,
        });

        match self.commit(&entry, DbKind::Group)? {
            WriteOutcome::Written => {
                info!("Provisioned group '{}' (gid {gid})", req.name);
                Ok(Provisioned::Created)
            }
            WriteOutcome::AlreadyExists => Ok(Provisioned::AlreadyPresent),
            WriteOutcome::ReadOnly => {
                warn!(
                    "Skipping group '{}': {} database under {} is read-only",
                    req.name,
                    DbKind::Group,
                    self.ctx.build_root.display()
                );
                Ok(Provisioned::ReadOnly)
            }
        }
    }

    fn check_phase(&self) -> Result<()> {
        if !self.ctx.phase.can_provision() {
            return Err(ProvisionError::WrongPhase(self.ctx.phase));
        }
        Ok(())
    }

    /// A template may restate its own name; if it does, it must agree
    /// with the file name it was found under.
    fn check_template_name(&self, kind: DbKind, name: &str, name_field: &str) -> Result<()> {
        let declared = self.templates.field(kind, name, name_field)?;
        if !declared.is_empty() && declared != name {
            return Err(ProvisionError::TemplateNameMismatch {
                name: name.to_string(),
                declared,
            });
        }
        Ok(())
    }

    fn check_id_free(&self, db: &AccountDb, what: &'static str, name: &str, id: u32) -> Result<()> {
        let taken = db.query(&id.to_string())?;
        if let Some(holder) = taken.first() {
            return Err(ProvisionError::IdTaken {
                what,
                name: name.to_string(),
                id,
                holder: holder.name().to_string(),
            });
        }
        Ok(())
    }

    /// Commit `entry`, honoring the setup-phase live-root rule: during
    /// setup the entry also lands in the live system database, and that
    /// commit must succeed — a read-only live root is fatal, never a
    /// degradation.
    fn commit(&self, entry: &Entry, kind: DbKind) -> Result<WriteOutcome> {
        if self.ctx.phase == Phase::Setup {
            let live = AccountDb::open(&self.ctx.live_root, kind)?;
            match live.append(entry)? {
                WriteOutcome::Written => {
                    info!(
                        "Committed {} entry '{}' into live root {}",
                        kind,
                        entry.name(),
                        self.ctx.live_root.display()
                    );
                }
                WriteOutcome::AlreadyExists => {}
                WriteOutcome::ReadOnly => {
                    return Err(ProvisionError::LiveCommitReadOnly {
                        root: self.ctx.live_root.clone(),
                        kind,
                    });
                }
            }
        }

        let db = AccountDb::open(&self.ctx.build_root, kind)?;
        Ok(db.append(entry)?)
    }

    /// Create the home directory under the build root, owned by the new
    /// account. Only runs after a successful commit; `/dev/null` homes
    /// are placeholders and never materialized.
    fn materialize_home(&self, home: &str, uid: u32, gid: u32) -> Result<()> {
        if home == DEFAULT_HOME {
            return Ok(());
        }
        let path = BuildContext::under_root(&self.ctx.build_root, home);
        if path.exists() {
            return Ok(());
        }
        fs::create_dir_all(&path)
            .io_context(|| format!("Failed to create home at {}", path.display()))?;
        fs::set_permissions(&path, fs::Permissions::from_mode(HOME_DIR_MODE))
            .io_context(|| format!("Failed to set mode on {}", path.display()))?;
        chown(&path, Some(Uid::from_raw(uid)), Some(Gid::from_raw(gid))).map_err(|errno| {
            ProvisionError::io(format!("Failed to chown {}", path.display()), errno.into())
        })?;
        debug!("Created home directory at {}", path.display());
        Ok(())
    }
}
