//! Header block shared by commit and tag payloads.

use bitgit_hash::ObjectId;
use bitgit_utils::date::Signature;
use bstr::{BStr, ByteSlice};

use crate::ObjectError;

/// One `key value` header; continuation lines are joined with `\n`.
pub(crate) struct Field<'a> {
    pub key: &'a [u8],
    pub value: Vec<u8>,
}

impl Field<'_> {
    pub fn key_str(&self) -> String {
        self.key.to_str_lossy().into_owned()
    }

    pub fn oid(&self) -> Result<ObjectId, ObjectError> {
        let hex = std::str::from_utf8(&self.value).map_err(|_| {
            ObjectError::InvalidHeader(format!("non-ASCII id in '{}'", self.key_str()))
        })?;
        Ok(ObjectId::from_hex(hex)?)
    }

    pub fn signature(&self) -> Result<Signature, ObjectError> {
        Signature::parse(BStr::new(&self.value))
            .map_err(|e| ObjectError::InvalidSignature(format!("{}: {e}", self.key_str())))
    }
}

/// Split a payload into its header fields and the message after the blank line.
pub(crate) fn split_headers(data: &[u8]) -> Result<(Vec<Field<'_>>, &[u8]), ObjectError> {
    let mut fields: Vec<Field<'_>> = Vec::new();
    let mut pos = 0;

    loop {
        let rest = &data[pos..];
        let eol = rest.find_byte(b'\n').ok_or_else(|| {
            ObjectError::InvalidHeader("missing blank line after headers".into())
        })?;
        let line = &rest[..eol];
        pos += eol + 1;

        if line.is_empty() {
            return Ok((fields, &data[pos..]));
        }

        if let Some(cont) = line.strip_prefix(b" ") {
            let prev = fields.last_mut().ok_or_else(|| {
                ObjectError::InvalidHeader("continuation line without a header".into())
            })?;
            prev.value.push(b'\n');
            prev.value.extend_from_slice(cont);
            continue;
        }

        let space = line.find_byte(b' ').ok_or_else(|| {
            ObjectError::InvalidHeader(format!("no value in '{}'", line.to_str_lossy()))
        })?;
        fields.push(Field {
            key: &line[..space],
            value: line[space + 1..].to_vec(),
        });
    }
}

/// Append `key value\n`, writing each embedded newline as a continuation.
pub(crate) fn write_field(out: &mut Vec<u8>, key: &[u8], value: &[u8]) {
    out.extend_from_slice(key);
    out.push(b' ');
    for (i, line) in value.split(|&b| b == b'\n').enumerate() {
        if i > 0 {
            out.extend_from_slice(b"\n ");
        }
        out.extend_from_slice(line);
    }
    out.push(b'\n');
}
