//! Conversions from raw config values to typed values.
//!
//! These return `None` on malformed input; [`ConfigFile`](crate::ConfigFile)
//! attaches the offending key when turning that into an error.

use bstr::{BStr, ByteSlice};

/// Interpret a value the way git does for boolean variables.
///
/// A key written without `=` is true and an empty value is false. Besides
/// the words `true/yes/on` and `false/no/off` (any case), any integer is
/// accepted and is true when non-zero.
pub fn parse_bool(value: Option<&BStr>) -> Option<bool> {
    let Some(value) = value else {
        return Some(true);
    };
    if value.is_empty() {
        return Some(false);
    }
    let word = value.to_str().ok()?.to_ascii_lowercase();
    match word.as_str() {
        "true" | "yes" | "on" => Some(true),
        "false" | "no" | "off" => Some(false),
        _ => parse_int(value).map(|n| n != 0),
    }
}

/// Parse a decimal integer with an optional `k`, `m` or `g` unit suffix
/// (powers of 1024). Overflow is treated as malformed.
pub fn parse_int(value: &BStr) -> Option<i64> {
    let text = value.to_str().ok()?;
    let (digits, scale) = match text.as_bytes().last()? {
        b'k' | b'K' => (&text[..text.len() - 1], 1i64 << 10),
        b'm' | b'M' => (&text[..text.len() - 1], 1i64 << 20),
        b'g' | b'G' => (&text[..text.len() - 1], 1i64 << 30),
        _ => (text, 1),
    };
    digits.parse::<i64>().ok()?.checked_mul(scale)
}
