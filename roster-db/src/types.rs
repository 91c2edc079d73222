// SPDX-FileCopyrightText: 2026 The roster developers
// SPDX-License-Identifier: MIT

//! Typed rows of the passwd and group databases.

use std::fmt;

use crate::error::{Error, Result};

/// Which account database a path, entry, or template refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbKind {
    /// The user database (`etc/passwd`, 7 fields per entry).
    Passwd,
    /// The group database (`etc/group`, 4 fields per entry).
    Group,
}

impl DbKind {
    /// File name under `<root>/etc`.
    pub fn file_name(self) -> &'static str {
        match self {
            DbKind::Passwd => "passwd",
            DbKind::Group => "group",
        }
    }

    /// Fixed number of colon-delimited fields per entry.
    pub fn field_count(self) -> usize {
        match self {
            DbKind::Passwd => 7,
            DbKind::Group => 4,
        }
    }
}

impl fmt::Display for DbKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// One line of the user database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswdEntry {
    pub name: String,
    pub password: String,
    pub uid: u32,
    pub gid: u32,
    pub gecos: String,
    pub home: String,
    pub shell: String,
}

impl PasswdEntry {
    /// Parse a 7-field `passwd` line. Trailing fields may be empty.
    pub fn parse(line: &str) -> Result<Self> {
        let malformed = || Error::MalformedEntry {
            kind: DbKind::Passwd,
            line: line.to_string(),
        };
        let fields: Vec<&str> = line.split(':').collect();
        if fields.len() != DbKind::Passwd.field_count() {
            return Err(malformed());
        }
        Ok(Self {
            name: fields[0].to_string(),
            password: fields[1].to_string(),
            uid: fields[2].parse().map_err(|_| malformed())?,
            gid: fields[3].parse().map_err(|_| malformed())?,
            gecos: fields[4].to_string(),
            home: fields[5].to_string(),
            shell: fields[6].to_string(),
        })
    }

    /// Format as a canonical database line (no trailing newline).
    pub fn to_line(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}:{}:{}",
            self.name, self.password, self.uid, self.gid, self.gecos, self.home, self.shell
        )
    }
}

/// One line of the group database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupEntry {
    pub name: String,
    pub password: String,
    pub gid: u32,
    /// Member user names. Empty for a group with no explicit members.
    pub members: Vec<String>,
}

impl GroupEntry {
    /// Parse a 4-field `group` line.
    pub fn parse(line: &str) -> Result<Self> {
        let malformed = || Error::MalformedEntry {
            kind: DbKind::Group,
            line: line.to_string(),
        };
        let fields: Vec<&str> = line.split(':').collect();
        if fields.len() != DbKind::Group.field_count() {
            return Err(malformed());
        }
        let members = if fields[3].is_empty() {
            Vec::new()
        } else {
            fields[3].split(',').map(str::to_string).collect()
        };
        Ok(Self {
            name: fields[0].to_string(),
            password: fields[1].to_string(),
            gid: fields[2].parse().map_err(|_| malformed())?,
            members,
        })
    }

    /// Format as a canonical database line (no trailing newline).
    pub fn to_line(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.name,
            self.password,
            self.gid,
            self.members.join(",")
        )
    }
}

/// A parsed entry from either database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Passwd(PasswdEntry),
    Group(GroupEntry),
}

impl Entry {
    /// Parse a line according to the database kind.
    pub fn parse(kind: DbKind, line: &str) -> Result<Self> {
        match kind {
            DbKind::Passwd => Ok(Entry::Passwd(PasswdEntry::parse(line)?)),
            DbKind::Group => Ok(Entry::Group(GroupEntry::parse(line)?)),
        }
    }

    /// Which database this entry belongs to.
    pub fn kind(&self) -> DbKind {
        match self {
            Entry::Passwd(_) => DbKind::Passwd,
            Entry::Group(_) => DbKind::Group,
        }
    }

    /// Primary key: the account name.
    pub fn name(&self) -> &str {
        match self {
            Entry::Passwd(e) => &e.name,
            Entry::Group(e) => &e.name,
        }
    }

    /// Numeric secondary key: uid for passwd entries, gid for group entries.
    pub fn id(&self) -> u32 {
        match self {
            Entry::Passwd(e) => e.uid,
            Entry::Group(e) => e.gid,
        }
    }

    /// Format as a canonical database line (no trailing newline).
    pub fn to_line(&self) -> String {
        match self {
            Entry::Passwd(e) => e.to_line(),
            Entry::Group(e) => e.to_line(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passwd_roundtrip() {
        let line = "builder:!:1000:1000:CI builder:/home/builder:/bin/bash";
        let entry = PasswdEntry::parse(line).unwrap();
        assert_eq!(entry.name, "builder");
        assert_eq!(entry.uid, 1000);
        assert_eq!(entry.gid, 1000);
        assert_eq!(entry.shell, "/bin/bash");
        assert_eq!(entry.to_line(), line);
    }

    #[test]
    fn test_passwd_trailing_fields_may_be_empty() {
        let entry = PasswdEntry::parse("svc:!:200:200:::").unwrap();
        assert_eq!(entry.gecos, "");
        assert_eq!(entry.home, "");
        assert_eq!(entry.shell, "");
    }

    #[test]
    fn test_passwd_wrong_field_count() {
        let err = PasswdEntry::parse("svc:!:200:200").unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedEntry {
                kind: DbKind::Passwd,
                ..
            }
        ));
    }

    #[test]
    fn test_passwd_non_numeric_uid() {
        assert!(PasswdEntry::parse("svc:!:abc:200:::/bin/false").is_err());
    }

    #[test]
    fn test_group_roundtrip() {
        let line = "wheel:!:10:alice,bob";
        let entry = GroupEntry::parse(line).unwrap();
        assert_eq!(entry.gid, 10);
        assert_eq!(entry.members, vec!["alice", "bob"]);
        assert_eq!(entry.to_line(), line);
    }

    #[test]
    fn test_group_empty_member_list() {
        let entry = GroupEntry::parse("audio:!:18:").unwrap();
        assert!(entry.members.is_empty());
        assert_eq!(entry.to_line(), "audio:!:18:");
    }

    #[test]
    fn test_entry_secondary_key() {
        let user = Entry::parse(DbKind::Passwd, "svc:!:200:201:::/bin/false").unwrap();
        assert_eq!(user.id(), 200);
        let group = Entry::parse(DbKind::Group, "svc:!:201:").unwrap();
        assert_eq!(group.id(), 201);
    }
}
