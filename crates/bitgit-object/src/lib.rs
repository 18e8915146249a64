//! Typed objects and their canonical byte encoding.
//!
//! [`Object`] is a closed sum over the four object kinds. Every kind
//! parses from and serializes to the exact payload bytes that are hashed
//! and stored; parsing tree, commit and tag payloads is strict and refuses
//! input that would not re-serialize to the same bytes.

mod blob;
mod commit;
mod fields;
pub mod header;
mod tag;
mod tree;

pub use blob::Blob;
pub use commit::Commit;
pub use tag::Tag;
pub use tree::{FileMode, Tree, TreeEntry};

use bitgit_hash::{hasher::Hasher, HashError, ObjectId};
use bstr::BString;

/// Errors produced while decoding or encoding objects.
#[derive(Debug, thiserror::Error)]
pub enum ObjectError {
    #[error("unknown object type: {0}")]
    UnknownType(BString),

    #[error("malformed object envelope: {0}")]
    MalformedEnvelope(String),

    #[error("object length mismatch: header says {declared} bytes, found {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("invalid tree entry at offset {offset}: {reason}")]
    InvalidTreeEntry { offset: usize, reason: String },

    #[error("invalid commit: missing '{field}' header")]
    MissingCommitField { field: &'static str },

    #[error("invalid tag: missing '{field}' header")]
    MissingTagField { field: &'static str },

    #[error("invalid header line: {0}")]
    InvalidHeader(String),

    #[error("invalid file mode: {0}")]
    InvalidFileMode(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("{0} payload is not in canonical form")]
    NonCanonical(ObjectType),

    #[error(transparent)]
    Hash(#[from] HashError),
}

/// The four object kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl ObjectType {
    /// Parse a type tag. Only the four exact lowercase names are accepted.
    pub fn from_bytes(s: &[u8]) -> Result<Self, ObjectError> {
        match s {
            b"blob" => Ok(Self::Blob),
            b"tree" => Ok(Self::Tree),
            b"commit" => Ok(Self::Commit),
            b"tag" => Ok(Self::Tag),
            _ => Err(ObjectError::UnknownType(BString::from(s))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
            Self::Tag => "tag",
        }
    }

    pub fn as_bytes(&self) -> &'static [u8] {
        self.as_str().as_bytes()
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ObjectType {
    type Err = ObjectError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(s.as_bytes())
    }
}

/// A decoded object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
    Tag(Tag),
}

impl Object {
    /// Decode a full envelope (`<type> <len>\0<payload>`).
    ///
    /// The declared length must match the payload exactly.
    pub fn parse(data: &[u8]) -> Result<Self, ObjectError> {
        let (obj_type, declared, header_len) = header::parse_header(data)?;
        let payload = &data[header_len..];
        if payload.len() != declared {
            return Err(ObjectError::LengthMismatch {
                declared,
                actual: payload.len(),
            });
        }
        Self::parse_content(obj_type, payload)
    }

    /// Decode a payload of a known type.
    pub fn parse_content(obj_type: ObjectType, content: &[u8]) -> Result<Self, ObjectError> {
        Ok(match obj_type {
            ObjectType::Blob => Self::Blob(Blob::parse(content)?),
            ObjectType::Tree => Self::Tree(Tree::parse(content)?),
            ObjectType::Commit => Self::Commit(Commit::parse(content)?),
            ObjectType::Tag => Self::Tag(Tag::parse(content)?),
        })
    }

    /// The full envelope: header followed by the payload.
    pub fn serialize(&self) -> Vec<u8> {
        let content = self.serialize_content();
        let mut out = header::write_header(self.object_type(), content.len());
        out.extend_from_slice(&content);
        out
    }

    pub fn serialize_content(&self) -> Vec<u8> {
        match self {
            Self::Blob(b) => b.serialize_content().to_vec(),
            Self::Tree(t) => t.serialize_content(),
            Self::Commit(c) => c.serialize_content(),
            Self::Tag(t) => t.serialize_content(),
        }
    }

    pub fn object_type(&self) -> ObjectType {
        match self {
            Self::Blob(_) => ObjectType::Blob,
            Self::Tree(_) => ObjectType::Tree,
            Self::Commit(_) => ObjectType::Commit,
            Self::Tag(_) => ObjectType::Tag,
        }
    }

    /// Identifier this object would be stored under.
    pub fn compute_oid(&self) -> Result<ObjectId, HashError> {
        Hasher::hash_object(self.object_type().as_str(), &self.serialize_content())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_type_from_bytes() {
        assert_eq!(ObjectType::from_bytes(b"blob").unwrap(), ObjectType::Blob);
        assert_eq!(ObjectType::from_bytes(b"tree").unwrap(), ObjectType::Tree);
        assert_eq!(ObjectType::from_bytes(b"commit").unwrap(), ObjectType::Commit);
        assert_eq!(ObjectType::from_bytes(b"tag").unwrap(), ObjectType::Tag);
    }

    #[test]
    fn object_type_rejects_near_misses() {
        for bad in [&b"Blob"[..], b"blobs", b"", b" blob", b"unknown"] {
            assert!(matches!(
                ObjectType::from_bytes(bad),
                Err(ObjectError::UnknownType(_))
            ));
        }
    }

    #[test]
    fn object_type_display_and_from_str() {
        assert_eq!(ObjectType::Commit.to_string(), "commit");
        assert_eq!("tree".parse::<ObjectType>().unwrap(), ObjectType::Tree);
        assert!("invalid".parse::<ObjectType>().is_err());
    }

    #[test]
    fn parse_rejects_short_payload() {
        let err = Object::parse(b"blob 10\0hello").unwrap_err();
        assert!(matches!(
            err,
            ObjectError::LengthMismatch {
                declared: 10,
                actual: 5
            }
        ));
    }

    #[test]
    fn parse_rejects_trailing_bytes() {
        let err = Object::parse(b"blob 2\0hello").unwrap_err();
        assert!(matches!(err, ObjectError::LengthMismatch { .. }));
    }

    #[test]
    fn hello_blob_oid() {
        let obj = Object::Blob(Blob::new(b"hello\n".to_vec()));
        assert_eq!(
            obj.compute_oid().unwrap().to_hex(),
            "ce013625030ba8dba906f756967f9e9ca394464a"
        );
        assert_eq!(obj.serialize(), b"blob 6\0hello\n");
    }
}
