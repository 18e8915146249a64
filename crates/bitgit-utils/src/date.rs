use bstr::{BStr, BString, ByteSlice, ByteVec};
use chrono::{DateTime, FixedOffset, TimeZone};

use crate::error::UtilError;
use crate::Result;

/// A point in time as recorded in author, committer and tagger lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GitDate {
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    /// Offset from UTC in minutes (e.g. -300 for `-0500`).
    pub tz_offset: i32,
}

/// `-0130` is stored on disk as the decimal -130; turn that into minutes.
fn tz_offset_to_minutes(tz: i32) -> i32 {
    let sign = if tz < 0 { -1 } else { 1 };
    let abs = tz.unsigned_abs() as i32;
    sign * ((abs / 100) * 60 + abs % 100)
}

fn minutes_to_tz_offset(minutes: i32) -> i32 {
    let sign = if minutes < 0 { -1 } else { 1 };
    let abs = minutes.unsigned_abs() as i32;
    sign * ((abs / 60) * 100 + abs % 60)
}

impl GitDate {
    pub fn new(timestamp: i64, tz_offset_minutes: i32) -> Self {
        Self {
            timestamp,
            tz_offset: tz_offset_minutes,
        }
    }

    /// Parse the raw on-disk form `"<unix-seconds> <+|-HHMM>"`.
    pub fn parse_raw(input: &str) -> Result<Self> {
        let (ts, tz) = input
            .trim()
            .split_once(' ')
            .ok_or_else(|| UtilError::Date(format!("missing timezone in '{input}'")))?;

        let timestamp: i64 = ts
            .parse()
            .map_err(|_| UtilError::Date(format!("invalid timestamp '{ts}'")))?;

        let tz = tz.trim();
        let digits = tz
            .strip_prefix('+')
            .or_else(|| tz.strip_prefix('-'))
            .filter(|d| d.len() == 4 && d.bytes().all(|b| b.is_ascii_digit()))
            .ok_or_else(|| UtilError::Date(format!("invalid timezone '{tz}'")))?;
        let mut tz_int: i32 = digits
            .parse()
            .map_err(|_| UtilError::Date(format!("invalid timezone '{tz}'")))?;
        if tz.starts_with('-') {
            tz_int = -tz_int;
        }

        let date = Self::new(timestamp, tz_offset_to_minutes(tz_int));
        date.to_datetime()
            .ok_or_else(|| UtilError::Date(format!("out of range: '{input}'")))?;
        Ok(date)
    }

    /// Raw form as written to disk.
    pub fn to_raw(&self) -> String {
        format!(
            "{} {:+05}",
            self.timestamp,
            minutes_to_tz_offset(self.tz_offset)
        )
    }

    /// The date in its recorded timezone, if representable.
    pub fn to_datetime(&self) -> Option<DateTime<FixedOffset>> {
        let offset = FixedOffset::east_opt(self.tz_offset.checked_mul(60)?)?;
        offset.timestamp_opt(self.timestamp, 0).single()
    }
}

/// Identity plus timestamp: `Name <email> <unix-seconds> <+|-HHMM>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: BString,
    pub email: BString,
    pub date: GitDate,
}

impl Signature {
    pub fn parse(input: &BStr) -> Result<Self> {
        let input = input.as_bytes();

        let gt_pos = input
            .iter()
            .rposition(|&b| b == b'>')
            .ok_or_else(|| UtilError::Signature("missing '>'".into()))?;
        let lt_pos = input[..gt_pos]
            .iter()
            .rposition(|&b| b == b'<')
            .ok_or_else(|| UtilError::Signature("missing '<'".into()))?;

        let name = input[..lt_pos].trim();
        let email = &input[lt_pos + 1..gt_pos];
        let date_str = std::str::from_utf8(input[gt_pos + 1..].trim())
            .map_err(|_| UtilError::Signature("non-UTF-8 date".into()))?;

        Ok(Self {
            name: BString::from(name),
            email: BString::from(email),
            date: GitDate::parse_raw(date_str)?,
        })
    }

    pub fn to_bytes(&self) -> BString {
        let mut out = BString::new(Vec::with_capacity(self.name.len() + self.email.len() + 24));
        out.push_str(&self.name);
        out.push_str(b" <");
        out.push_str(&self.email);
        out.push_str(b"> ");
        out.push_str(self.date.to_raw().as_bytes());
        out
    }
}
