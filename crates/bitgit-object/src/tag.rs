use bitgit_hash::ObjectId;
use bitgit_utils::date::Signature;
use bstr::{BString, ByteSlice};

use crate::fields::{split_headers, write_field};
use crate::{ObjectError, ObjectType};

const SIGNATURE_MARKERS: [&[u8]; 2] = [
    b"-----BEGIN PGP SIGNATURE-----",
    b"-----BEGIN SSH SIGNATURE-----",
];

/// An annotated tag object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub target: ObjectId,
    pub target_type: ObjectType,
    pub tag_name: BString,
    /// Very old tags carry no tagger line.
    pub tagger: Option<Signature>,
    pub message: BString,
    /// Trailing signature block, split off the end of the message.
    pub gpgsig: Option<BString>,
}

impl Tag {
    pub fn parse(content: &[u8]) -> Result<Self, ObjectError> {
        let (fields, body) = split_headers(content)?;
        let mut fields = fields.into_iter().peekable();

        let mut require = |key: &[u8], name: &'static str| {
            fields
                .next_if(|f| f.key == key)
                .ok_or(ObjectError::MissingTagField { field: name })
        };
        let target = require(b"object", "object")?.oid()?;
        let target_type = ObjectType::from_bytes(&require(b"type", "type")?.value)?;
        let tag_name = BString::from(require(b"tag", "tag")?.value);

        let tagger = match fields.next_if(|f| f.key == b"tagger") {
            Some(f) => Some(f.signature()?),
            None => None,
        };
        if let Some(f) = fields.next() {
            return Err(ObjectError::InvalidHeader(format!(
                "unexpected '{}' header in tag",
                f.key_str()
            )));
        }

        let (message, gpgsig) = match signature_start(body) {
            Some(at) => (&body[..at], Some(BString::from(&body[at..]))),
            None => (body, None),
        };

        let tag = Self {
            target,
            target_type,
            tag_name,
            tagger,
            message: BString::from(message),
            gpgsig,
        };
        if tag.serialize_content() != content {
            return Err(ObjectError::NonCanonical(ObjectType::Tag));
        }
        Ok(tag)
    }

    pub fn serialize_content(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(128 + self.message.len());
        write_field(&mut out, b"object", self.target.to_hex().as_bytes());
        write_field(&mut out, b"type", self.target_type.as_bytes());
        write_field(&mut out, b"tag", &self.tag_name);
        if let Some(tagger) = &self.tagger {
            write_field(&mut out, b"tagger", &tagger.to_bytes());
        }
        out.push(b'\n');
        out.extend_from_slice(&self.message);
        if let Some(sig) = &self.gpgsig {
            out.extend_from_slice(sig);
        }
        out
    }
}

/// Offset of the first line that opens a signature block.
fn signature_start(body: &[u8]) -> Option<usize> {
    let line_starts = std::iter::once(0).chain(body.find_iter(b"\n").map(|nl| nl + 1));
    for start in line_starts {
        let line = &body[start..];
        if SIGNATURE_MARKERS.iter().any(|marker| line.starts_with(marker)) {
            return Some(start);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<u8> {
        b"object 4b825dc642cb6eb9a060e54bf8d69288fbee4904\n\
          type commit\n\
          tag v1.0\n\
          tagger John Doe <john@example.com> 1234567890 +0000\n\
          \n\
          Release v1.0\n"
            .to_vec()
    }

    #[test]
    fn parse_fields() {
        let tag = Tag::parse(&sample()).unwrap();
        assert_eq!(tag.target.to_hex(), "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
        assert_eq!(tag.target_type, ObjectType::Commit);
        assert_eq!(tag.tag_name, "v1.0");
        assert_eq!(tag.tagger.as_ref().unwrap().email, "john@example.com");
        assert_eq!(tag.message, "Release v1.0\n");
        assert!(tag.gpgsig.is_none());
        assert_eq!(tag.serialize_content(), sample());
    }

    #[test]
    fn without_tagger() {
        let data = b"object 4b825dc642cb6eb9a060e54bf8d69288fbee4904\ntype tree\ntag old\n\nOld tag\n";
        let tag = Tag::parse(data).unwrap();
        assert!(tag.tagger.is_none());
        assert_eq!(tag.target_type, ObjectType::Tree);
    }

    #[test]
    fn trailing_signature_kept_apart() {
        let mut data = sample();
        data.extend_from_slice(b"-----BEGIN PGP SIGNATURE-----\n\nabc\n-----END PGP SIGNATURE-----\n");
        let tag = Tag::parse(&data).unwrap();
        assert_eq!(tag.message, "Release v1.0\n");
        assert!(tag.gpgsig.as_ref().unwrap().starts_with(b"-----BEGIN PGP"));
        assert_eq!(tag.serialize_content(), data);
    }

    #[test]
    fn marker_inside_a_line_is_message_text() {
        let mut data = sample();
        data.extend_from_slice(b"quote: -----BEGIN PGP SIGNATURE----- inline\n");
        let tag = Tag::parse(&data).unwrap();
        assert!(tag.gpgsig.is_none());
        assert!(tag.message.ends_with(b"quote: -----BEGIN PGP SIGNATURE----- inline\n"));
    }

    #[test]
    fn missing_object() {
        assert!(matches!(
            Tag::parse(b"type commit\ntag v1.0\n\nmessage\n"),
            Err(ObjectError::MissingTagField { field: "object" })
        ));
    }

    #[test]
    fn unknown_target_type() {
        let data = b"object 4b825dc642cb6eb9a060e54bf8d69288fbee4904\ntype blobby\ntag x\n\n";
        assert!(matches!(Tag::parse(data), Err(ObjectError::UnknownType(_))));
    }

    #[test]
    fn unexpected_header() {
        let data = b"object 4b825dc642cb6eb9a060e54bf8d69288fbee4904\ntype commit\ntag x\nfoo bar\n\n";
        assert!(matches!(Tag::parse(data), Err(ObjectError::InvalidHeader(_))));
    }
}
