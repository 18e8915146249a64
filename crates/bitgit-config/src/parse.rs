//! Line scanner for git's INI dialect.
//!
//! Every byte of the input ends up in exactly one [`Event`]'s `raw` text, so
//! concatenating the raw parts reproduces the file unchanged.

use bstr::BString;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    /// `[section]` or `[section "subsection"]`. `name` is lowercased.
    Section {
        raw: BString,
        name: BString,
        subsection: Option<BString>,
    },
    /// `name = value`, possibly spanning continuation lines. A key written
    /// without `=` has no value.
    Entry {
        raw: BString,
        name: BString,
        value: Option<BString>,
    },
    /// Blank lines and comments.
    Trivia(BString),
}

impl Event {
    pub(crate) fn raw(&self) -> &BString {
        match self {
            Event::Section { raw, .. } | Event::Entry { raw, .. } | Event::Trivia(raw) => raw,
        }
    }

    pub(crate) fn raw_mut(&mut self) -> &mut BString {
        match self {
            Event::Section { raw, .. } | Event::Entry { raw, .. } | Event::Trivia(raw) => raw,
        }
    }
}

pub(crate) fn parse(input: &[u8], origin: &str) -> Result<Vec<Event>, ConfigError> {
    Scanner {
        input,
        pos: 0,
        line: 1,
        origin,
    }
    .run()
}

struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
    line: usize,
    origin: &'a str,
}

impl Scanner<'_> {
    fn run(mut self) -> Result<Vec<Event>, ConfigError> {
        let mut events = Vec::new();
        let mut in_section = false;

        // A UTF-8 byte order mark is tolerated and kept as trivia.
        if self.input.starts_with(b"\xef\xbb\xbf") {
            self.pos = 3;
            events.push(Event::Trivia(BString::from(&self.input[..3])));
        }

        while self.pos < self.input.len() {
            let start = self.pos;
            self.skip_blanks();

            let event = match self.peek() {
                None | Some(b'\n' | b'\r' | b'#' | b';') => {
                    self.finish_line();
                    Event::Trivia(self.raw_since(start))
                }
                Some(b'[') => {
                    let (name, subsection) = self.section_header()?;
                    self.trailing_comment()?;
                    in_section = true;
                    Event::Section {
                        raw: self.raw_since(start),
                        name,
                        subsection,
                    }
                }
                Some(c) if c.is_ascii_alphabetic() => {
                    if !in_section {
                        return Err(self.error("variable outside of any section"));
                    }
                    let name = self.key_name();
                    self.skip_blanks();
                    let value = match self.peek() {
                        Some(b'=') => {
                            self.pos += 1;
                            Some(self.value()?)
                        }
                        None | Some(b'\n' | b'\r' | b'#' | b';') => {
                            self.finish_line();
                            None
                        }
                        Some(_) => return Err(self.error("expected '=' after variable name")),
                    };
                    Event::Entry {
                        raw: self.raw_since(start),
                        name,
                        value,
                    }
                }
                Some(_) => return Err(self.error("unexpected character")),
            };
            events.push(event);
        }
        Ok(events)
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn raw_since(&self, start: usize) -> BString {
        BString::from(&self.input[start..self.pos])
    }

    fn error(&self, message: &str) -> ConfigError {
        ConfigError::Parse {
            origin: self.origin.to_string(),
            line: self.line,
            message: message.to_string(),
        }
    }

    fn skip_blanks(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t')) {
            self.pos += 1;
        }
    }

    /// Move past the rest of the current line and its newline.
    fn finish_line(&mut self) {
        match find_newline(&self.input[self.pos..]) {
            Some(offset) => {
                self.pos += offset + 1;
                self.line += 1;
            }
            None => self.pos = self.input.len(),
        }
    }

    /// After a section header only whitespace or a comment may follow.
    fn trailing_comment(&mut self) -> Result<(), ConfigError> {
        self.skip_blanks();
        match self.peek() {
            None | Some(b'\n' | b'\r' | b'#' | b';') => {
                self.finish_line();
                Ok(())
            }
            Some(_) => Err(self.error("junk after section header")),
        }
    }

    fn section_header(&mut self) -> Result<(BString, Option<BString>), ConfigError> {
        self.pos += 1;
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == b'-' || c == b'.')
        {
            self.pos += 1;
        }
        let name = self.input[start..self.pos].to_ascii_lowercase();
        if name.is_empty() {
            return Err(self.error("empty section name"));
        }

        match self.peek() {
            Some(b']') => {
                self.pos += 1;
                // Legacy `[section.sub]` form: the subsection is case-folded.
                match name.iter().position(|&c| c == b'.') {
                    Some(dot) => Ok((
                        BString::from(&name[..dot]),
                        Some(BString::from(&name[dot + 1..])),
                    )),
                    None => Ok((BString::from(name), None)),
                }
            }
            Some(b' ' | b'\t') => {
                self.skip_blanks();
                if self.peek() != Some(b'"') {
                    return Err(self.error("expected quoted subsection"));
                }
                self.pos += 1;
                let subsection = self.quoted_subsection()?;
                if self.peek() != Some(b']') {
                    return Err(self.error("expected ']' after subsection"));
                }
                self.pos += 1;
                Ok((BString::from(name), Some(subsection)))
            }
            _ => Err(self.error("malformed section header")),
        }
    }

    fn quoted_subsection(&mut self) -> Result<BString, ConfigError> {
        let mut out = Vec::new();
        loop {
            match self.peek() {
                None | Some(b'\n') => return Err(self.error("unterminated subsection name")),
                Some(b'"') => {
                    self.pos += 1;
                    return Ok(BString::from(out));
                }
                Some(b'\\') => {
                    self.pos += 1;
                    match self.peek() {
                        None | Some(b'\n') => {
                            return Err(self.error("unterminated subsection name"))
                        }
                        Some(c) => out.push(c),
                    }
                    self.pos += 1;
                }
                Some(c) => {
                    out.push(c);
                    self.pos += 1;
                }
            }
        }
    }

    fn key_name(&mut self) -> BString {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == b'-') {
            self.pos += 1;
        }
        BString::from(self.input[start..self.pos].to_ascii_lowercase())
    }

    /// Decode a value up to the end of its (last continuation) line.
    ///
    /// Unquoted whitespace is collapsed to single spaces and trimmed at both
    /// ends; quoted text and escapes are kept verbatim.
    fn value(&mut self) -> Result<BString, ConfigError> {
        let mut out = Vec::new();
        let mut quoted = false;
        let mut pending_space = false;

        loop {
            let Some(c) = self.peek() else { break };
            match c {
                b'\n' => break,
                b' ' | b'\t' | b'\r' if !quoted => {
                    pending_space = !out.is_empty();
                    self.pos += 1;
                    continue;
                }
                b'#' | b';' if !quoted => break,
                _ => {}
            }

            if pending_space {
                out.push(b' ');
                pending_space = false;
            }
            self.pos += 1;
            match c {
                b'"' => quoted = !quoted,
                b'\\' => {
                    let escaped = self.peek();
                    self.pos += 1;
                    match escaped {
                        Some(b'\n') => self.line += 1,
                        Some(b'\r') if self.peek() == Some(b'\n') => {
                            self.pos += 1;
                            self.line += 1;
                        }
                        Some(b'n') => out.push(b'\n'),
                        Some(b't') => out.push(b'\t'),
                        Some(b'b') => out.push(0x08),
                        Some(b'\\') => out.push(b'\\'),
                        Some(b'"') => out.push(b'"'),
                        _ => return Err(self.error("bad escape sequence in value")),
                    }
                }
                _ => out.push(c),
            }
        }

        if quoted {
            return Err(self.error("unterminated quoted value"));
        }
        self.finish_line();
        Ok(BString::from(out))
    }
}

fn find_newline(haystack: &[u8]) -> Option<usize> {
    haystack.iter().position(|&c| c == b'\n')
}
