use crate::{ObjectError, ObjectType};

fn malformed(reason: impl Into<String>) -> ObjectError {
    ObjectError::MalformedEnvelope(reason.into())
}

/// Parse the envelope header `"<type> <len>\0"`.
///
/// Returns `(type, declared_len, header_len)`; `header_len` counts the NUL.
/// Exactly one space separates the tag from the length, and the length is
/// plain ASCII decimal without sign, padding or leading zeros. The length
/// syntax is checked before the type tag, so a well-formed header with an
/// unrecognized tag yields [`ObjectError::UnknownType`].
pub fn parse_header(data: &[u8]) -> Result<(ObjectType, usize, usize), ObjectError> {
    let nul = data
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| malformed("missing NUL after length"))?;
    let header = &data[..nul];

    let space = header
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| malformed("missing space after type"))?;
    let type_bytes = &header[..space];
    let len_bytes = &header[space + 1..];

    if type_bytes.is_empty() {
        return Err(malformed("empty type"));
    }
    if len_bytes.is_empty() || !len_bytes.iter().all(u8::is_ascii_digit) {
        return Err(malformed(format!(
            "invalid length {:?}",
            String::from_utf8_lossy(len_bytes)
        )));
    }
    if len_bytes.len() > 1 && len_bytes[0] == b'0' {
        return Err(malformed("length has leading zeros"));
    }
    let declared = std::str::from_utf8(len_bytes)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .ok_or_else(|| malformed("length out of range"))?;

    let obj_type = ObjectType::from_bytes(type_bytes)?;
    Ok((obj_type, declared, nul + 1))
}

/// `"<type> <len>\0"`
pub fn write_header(obj_type: ObjectType, content_size: usize) -> Vec<u8> {
    format!("{} {}\0", obj_type, content_size).into_bytes()
}
