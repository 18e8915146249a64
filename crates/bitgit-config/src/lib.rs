//! Reader and writer for git-style `config` files.
//!
//! Only single files are handled: a repository's `.git/config` is all bitgit
//! consults. Formatting, comments and ordering survive a load/modify/write
//! cycle untouched except for the lines that were changed.

mod error;
mod file;
mod parse;
pub mod types;

use std::fmt;

use bstr::{BString, ByteSlice};

pub use error::ConfigError;
pub use file::ConfigFile;

/// A variable name such as `core.bare` or `remote.origin.url`.
///
/// Section and variable names are stored lowercased; the optional subsection
/// keeps its case and may itself contain dots.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigKey {
    pub section: BString,
    pub subsection: Option<BString>,
    pub name: BString,
}

impl ConfigKey {
    /// Split `section[.subsection].name`, taking the section up to the first
    /// dot and the name after the last one.
    pub fn parse(key: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidKey(key.to_string());

        let (section, rest) = key.split_once('.').ok_or_else(invalid)?;
        let (subsection, name) = match rest.rsplit_once('.') {
            Some((sub, name)) => (Some(sub), name),
            None => (None, rest),
        };

        let section_ok = !section.is_empty()
            && section
                .bytes()
                .all(|c| c.is_ascii_alphanumeric() || c == b'-');
        let name_ok = name.bytes().next().is_some_and(|c| c.is_ascii_alphabetic())
            && name.bytes().all(|c| c.is_ascii_alphanumeric() || c == b'-');
        let subsection_ok = subsection.map_or(true, |s| !s.contains('\n'));
        if !(section_ok && name_ok && subsection_ok) {
            return Err(invalid());
        }

        Ok(Self {
            section: section.to_ascii_lowercase().into(),
            subsection: subsection.map(BString::from),
            name: name.to_ascii_lowercase().into(),
        })
    }

    pub(crate) fn is_in(&self, section: &[u8], subsection: Option<&BString>) -> bool {
        self.section == section && self.subsection.as_ref() == subsection
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.", self.section.to_str_lossy())?;
        if let Some(sub) = &self.subsection {
            write!(f, "{}.", sub.to_str_lossy())?;
        }
        write!(f, "{}", self.name.to_str_lossy())
    }
}
