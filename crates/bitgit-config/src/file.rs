use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use bitgit_utils::lockfile::LockFile;
use bstr::{BStr, BString, ByteSlice};

use crate::error::ConfigError;
use crate::parse::{self, Event};
use crate::{types, ConfigKey};

/// One config file, kept as the sequence of lines it was parsed from.
#[derive(Clone, Default)]
pub struct ConfigFile {
    path: Option<PathBuf>,
    events: Vec<Event>,
}

impl ConfigFile {
    /// An empty, unsaved config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse config text. `path` is only used in error messages.
    pub fn parse(content: &[u8], path: Option<&Path>) -> Result<Self, ConfigError> {
        let origin = path.map_or_else(|| "<memory>".to_string(), |p| p.display().to_string());
        Ok(Self {
            path: path.map(Path::to_path_buf),
            events: parse::parse(content, &origin)?,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ConfigError::FileNotFound(path.to_path_buf()),
            _ => ConfigError::Io(e),
        })?;
        Self::parse(&content, Some(path))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Every value of `key` in file order.
    fn values<'s, 'k>(&'s self, key: &'k ConfigKey) -> impl Iterator<Item = Option<&'s BStr>> + 'k
    where
        's: 'k,
    {
        let mut in_key_section = false;
        self.events.iter().filter_map(move |event| match event {
            Event::Section {
                name, subsection, ..
            } => {
                in_key_section = key.is_in(name, subsection.as_ref());
                None
            }
            Event::Entry { name, value, .. } if in_key_section && *name == key.name => {
                Some(value.as_ref().map(|v| v.as_bstr()))
            }
            _ => None,
        })
    }

    /// The effective value of `key`: the last one in the file wins.
    ///
    /// The outer `Option` is `None` when the key is absent; the inner one is
    /// `None` for a bare `name` line without `=`.
    pub fn get(&self, key: &ConfigKey) -> Option<Option<&BStr>> {
        self.values(key).last()
    }

    pub fn get_bool(&self, key: &ConfigKey) -> Result<Option<bool>, ConfigError> {
        self.get(key)
            .map(|value| {
                types::parse_bool(value).ok_or_else(|| ConfigError::InvalidBool {
                    key: key.to_string(),
                    value: value.map_or_else(String::new, |v| v.to_str_lossy().into_owned()),
                })
            })
            .transpose()
    }

    /// Integer value of `key`. A bare `name` line is not an integer.
    pub fn get_int(&self, key: &ConfigKey) -> Result<Option<i64>, ConfigError> {
        self.get(key)
            .map(|value| {
                value
                    .and_then(types::parse_int)
                    .ok_or_else(|| ConfigError::InvalidInt {
                        key: key.to_string(),
                        value: value.map_or_else(String::new, |v| v.to_str_lossy().into_owned()),
                    })
            })
            .transpose()
    }

    /// Set `key` to `value`.
    ///
    /// The last existing assignment is rewritten in place. Otherwise the
    /// entry is appended to the last matching section, and a new section is
    /// added at the end of the file when there is none.
    pub fn set(&mut self, key: &ConfigKey, value: &str) {
        let mut in_key_section = false;
        let mut last_assignment = None;
        let mut section_end = None;

        for (i, event) in self.events.iter().enumerate() {
            match event {
                Event::Section {
                    name, subsection, ..
                } => {
                    in_key_section = key.is_in(name, subsection.as_ref());
                    if in_key_section {
                        section_end = Some(i);
                    }
                }
                Event::Entry { name, .. } if in_key_section => {
                    section_end = Some(i);
                    if *name == key.name {
                        last_assignment = Some(i);
                    }
                }
                _ => {}
            }
        }

        let entry = Event::Entry {
            raw: format_entry(&key.name, value),
            name: key.name.clone(),
            value: Some(value.into()),
        };

        match (last_assignment, section_end) {
            (Some(i), _) => self.events[i] = entry,
            (None, Some(i)) => {
                self.terminate_line(i);
                self.events.insert(i + 1, entry);
            }
            (None, None) => {
                if let Some(last) = self.events.len().checked_sub(1) {
                    self.terminate_line(last);
                }
                self.events.push(Event::Section {
                    raw: format_section_header(key),
                    name: key.section.clone(),
                    subsection: key.subsection.clone(),
                });
                self.events.push(entry);
            }
        }
    }

    fn terminate_line(&mut self, index: usize) {
        let raw = self.events[index].raw_mut();
        if !raw.is_empty() && !raw.ends_with(b"\n") {
            raw.push(b'\n');
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.events
            .iter()
            .flat_map(|event| event.raw().iter().copied())
            .collect()
    }

    /// Replace `path` with this config through `<path>.lock`.
    pub fn write_to(&self, path: &Path) -> Result<(), ConfigError> {
        LockFile::write_atomic(path, &self.to_bytes())?;
        Ok(())
    }
}

impl fmt::Debug for ConfigFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigFile")
            .field("path", &self.path)
            .field("lines", &self.events.len())
            .finish()
    }
}

fn format_section_header(key: &ConfigKey) -> BString {
    let mut out = BString::from("[");
    out.extend_from_slice(&key.section);
    if let Some(sub) = &key.subsection {
        out.extend_from_slice(b" \"");
        for &c in sub.iter() {
            if c == b'"' || c == b'\\' {
                out.push(b'\\');
            }
            out.push(c);
        }
        out.push(b'"');
    }
    out.extend_from_slice(b"]\n");
    out
}

/// Render `\tname = value\n`, quoting when the value would not survive
/// the parser's whitespace and comment handling.
fn format_entry(name: &[u8], value: &str) -> BString {
    let needs_quotes = value.starts_with([' ', '\t'])
        || value.ends_with([' ', '\t'])
        || value.contains("  ")
        || value.contains(['#', ';', '\t']);

    let mut out = BString::from("\t");
    out.extend_from_slice(name);
    out.extend_from_slice(b" = ");
    if needs_quotes {
        out.push(b'"');
    }
    for c in value.bytes() {
        match c {
            b'\\' => out.extend_from_slice(b"\\\\"),
            b'"' => out.extend_from_slice(b"\\\""),
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\t' => out.extend_from_slice(b"\\t"),
            0x08 => out.extend_from_slice(b"\\b"),
            _ => out.push(c),
        }
    }
    if needs_quotes {
        out.push(b'"');
    }
    out.push(b'\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> ConfigKey {
        ConfigKey::parse(s).unwrap()
    }

    fn parse(s: &str) -> ConfigFile {
        ConfigFile::parse(s.as_bytes(), None).unwrap()
    }

    #[test]
    fn last_value_wins() {
        let cfg = parse("[core]\n\tbare = true\n[core]\n\tbare = false\n");
        assert_eq!(cfg.get(&key("core.bare")), Some(Some(BStr::new("false"))));
    }

    #[test]
    fn lookup_is_case_insensitive_except_subsection() {
        let cfg = parse("[Remote \"Origin\"]\n\tURL = a\n");
        assert!(cfg.get(&key("remote.Origin.url")).is_some());
        assert!(cfg.get(&key("REMOTE.Origin.Url")).is_some());
        assert!(cfg.get(&key("remote.origin.url")).is_none());
    }

    #[test]
    fn typed_getters() {
        let cfg = parse("[core]\n\tbare\n\tfilemode = no\n\tcompression = 1k\n\tbad = wat\n");
        assert_eq!(cfg.get_bool(&key("core.bare")).unwrap(), Some(true));
        assert_eq!(cfg.get_bool(&key("core.filemode")).unwrap(), Some(false));
        assert_eq!(cfg.get_int(&key("core.compression")).unwrap(), Some(1024));
        assert_eq!(cfg.get_int(&key("core.missing")).unwrap(), None);
        assert!(matches!(
            cfg.get_bool(&key("core.bad")),
            Err(ConfigError::InvalidBool { .. })
        ));
        assert!(matches!(
            cfg.get_int(&key("core.bare")),
            Err(ConfigError::InvalidInt { .. })
        ));
    }

    #[test]
    fn set_rewrites_in_place() {
        let mut cfg = parse("# keep me\n[core]\n\tbare = true ; old\n\tfilemode = true\n");
        cfg.set(&key("core.bare"), "false");
        assert_eq!(
            cfg.to_bytes(),
            b"# keep me\n[core]\n\tbare = false\n\tfilemode = true\n"
        );
    }

    #[test]
    fn set_appends_to_section_and_creates_sections() {
        let mut cfg = parse("[core]\n\tbare = true\n[user]\n\tname = x");
        cfg.set(&key("core.filemode"), "false");
        cfg.set(&key("branch.Main.remote"), "origin");
        assert_eq!(
            cfg.to_bytes().to_str().unwrap(),
            "[core]\n\tbare = true\n\tfilemode = false\n[user]\n\tname = x\n\
             [branch \"Main\"]\n\tremote = origin\n"
        );
    }

    #[test]
    fn set_quotes_when_needed() {
        let mut cfg = ConfigFile::new();
        cfg.set(&key("a.b"), " padded # not a comment");
        cfg.set(&key("a.c"), "line\nbreak \"q\"");
        let reparsed = ConfigFile::parse(&cfg.to_bytes(), None).unwrap();
        assert_eq!(
            reparsed.get(&key("a.b")),
            Some(Some(BStr::new(" padded # not a comment")))
        );
        assert_eq!(
            reparsed.get(&key("a.c")),
            Some(Some(BStr::new("line\nbreak \"q\"")))
        );
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigFile::load(&dir.path().join("config")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }
}
