use std::cmp::Ordering;

use bitgit_hash::{ObjectId, OID_LEN};
use bstr::{BString, ByteSlice};

use crate::{ObjectError, ObjectType};

/// Mode of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileMode {
    /// 100644
    Regular,
    /// 100755
    Executable,
    /// 120000
    Symlink,
    /// 160000, a submodule commit
    Gitlink,
    /// 40000
    Tree,
    /// Any other octal value, preserved as-is.
    Unknown(u32),
}

impl FileMode {
    /// Parse octal ASCII such as `b"100644"`.
    pub fn from_bytes(s: &[u8]) -> Result<Self, ObjectError> {
        parse_octal(s)
            .map(Self::from_raw)
            .ok_or_else(|| ObjectError::InvalidFileMode(s.to_str_lossy().into_owned()))
    }

    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0o100644 => Self::Regular,
            0o100755 => Self::Executable,
            0o120000 => Self::Symlink,
            0o160000 => Self::Gitlink,
            0o040000 => Self::Tree,
            other => Self::Unknown(other),
        }
    }

    pub fn raw(&self) -> u32 {
        match self {
            Self::Regular => 0o100644,
            Self::Executable => 0o100755,
            Self::Symlink => 0o120000,
            Self::Gitlink => 0o160000,
            Self::Tree => 0o40000,
            Self::Unknown(v) => *v,
        }
    }

    /// Octal form without leading zeros, as stored in tree payloads.
    pub fn as_bytes(&self) -> BString {
        BString::from(format!("{:o}", self.raw()))
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, Self::Tree)
    }

    /// Kind of object an entry with this mode points at.
    pub fn object_type(&self) -> ObjectType {
        match self {
            Self::Tree => ObjectType::Tree,
            Self::Gitlink => ObjectType::Commit,
            _ => ObjectType::Blob,
        }
    }
}

fn parse_octal(s: &[u8]) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    s.iter().try_fold(0u32, |acc, &b| {
        if !(b'0'..=b'7').contains(&b) {
            return None;
        }
        acc.checked_mul(8)?.checked_add(u32::from(b - b'0'))
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: FileMode,
    pub name: BString,
    pub oid: ObjectId,
}

impl TreeEntry {
    /// Canonical tree order: byte-wise on names, with directories compared
    /// as if their name ended in `/`.
    pub fn cmp_entries(a: &TreeEntry, b: &TreeEntry) -> Ordering {
        base_name_compare(&a.name, a.mode.is_tree(), &b.name, b.mode.is_tree())
    }
}

fn base_name_compare(name1: &[u8], is_dir1: bool, name2: &[u8], is_dir2: bool) -> Ordering {
    let common = name1.len().min(name2.len());
    match name1[..common].cmp(&name2[..common]) {
        Ordering::Equal => {}
        other => return other,
    }
    let next = |name: &[u8], is_dir: bool| match name.get(common) {
        Some(&c) => c,
        None if is_dir => b'/',
        None => 0,
    };
    next(name1, is_dir1).cmp(&next(name2, is_dir2))
}

/// A tree object. Entries are kept, and serialized, in the order given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `<octal mode> <name>\0<20-byte id>` records.
    ///
    /// The mode must be written exactly as [`FileMode::as_bytes`] would
    /// write it, so `040000` is refused. Names may not be empty or contain
    /// `/`.
    pub fn parse(content: &[u8]) -> Result<Self, ObjectError> {
        let mut entries = Vec::new();
        let mut pos = 0;

        while pos < content.len() {
            let bad = |offset: usize, reason: &str| ObjectError::InvalidTreeEntry {
                offset,
                reason: reason.into(),
            };

            let space = content[pos..]
                .find_byte(b' ')
                .ok_or_else(|| bad(pos, "missing space after mode"))?
                + pos;
            let raw_mode = &content[pos..space];
            let mode = FileMode::from_bytes(raw_mode)?;
            if mode.as_bytes() != raw_mode {
                return Err(ObjectError::InvalidFileMode(format!(
                    "non-canonical mode '{}'",
                    raw_mode.to_str_lossy()
                )));
            }

            let name_start = space + 1;
            let nul = content[name_start..]
                .find_byte(0)
                .ok_or_else(|| bad(name_start, "missing NUL after name"))?
                + name_start;
            let name = &content[name_start..nul];
            if name.is_empty() {
                return Err(bad(name_start, "empty name"));
            }
            if name.contains(&b'/') {
                return Err(bad(name_start, "name contains '/'"));
            }

            let oid_start = nul + 1;
            let oid_bytes = content
                .get(oid_start..oid_start + OID_LEN)
                .ok_or_else(|| bad(oid_start, "truncated object id"))?;

            entries.push(TreeEntry {
                mode,
                name: BString::from(name),
                oid: ObjectId::from_bytes(oid_bytes)?,
            });
            pos = oid_start + OID_LEN;
        }

        Ok(Self { entries })
    }

    pub fn serialize_content(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.entries.len() * (OID_LEN + 16));
        for entry in &self.entries {
            out.extend_from_slice(&entry.mode.as_bytes());
            out.push(b' ');
            out.extend_from_slice(&entry.name);
            out.push(0);
            out.extend_from_slice(entry.oid.as_bytes());
        }
        out
    }

    /// Put entries into canonical tree order.
    pub fn sort(&mut self) {
        self.entries.sort_by(TreeEntry::cmp_entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
