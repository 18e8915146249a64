//! Loose object storage.
//!
//! Each object lives at `objects/XX/YYYY...`, where `XX` is the first byte
//! of its id in hex and `YYYY...` the remaining 38 characters. The file is
//! the zlib-compressed envelope `"<type> <len>\0<payload>"`, and the id is
//! the SHA-1 of that envelope before compression.
//!
//! Reads are always verified: the envelope is validated, the payload is
//! decoded, and the digest is recomputed and compared with the id that was
//! asked for. A damaged file therefore yields an error, never a different
//! object.

mod enumerate;
mod read;
mod write;

pub use enumerate::LooseObjectIter;
pub use write::{hash_object, hash_raw};

use std::path::{Path, PathBuf};

use bitgit_hash::ObjectId;
use bstr::BString;

/// Handle on an `objects/` directory.
#[derive(Debug, Clone)]
pub struct LooseObjectStore {
    objects_dir: PathBuf,
    compression_level: flate2::Compression,
}

impl LooseObjectStore {
    pub fn open(objects_dir: impl AsRef<Path>) -> Self {
        Self {
            objects_dir: objects_dir.as_ref().to_path_buf(),
            compression_level: flate2::Compression::default(),
        }
    }

    /// zlib level used for new objects, 0 (store) to 9 (best).
    pub fn set_compression_level(&mut self, level: u32) {
        self.compression_level = flate2::Compression::new(level.min(9));
    }

    pub fn compression_level(&self) -> u32 {
        self.compression_level.level()
    }

    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }

    pub fn object_path(&self, oid: &ObjectId) -> PathBuf {
        self.objects_dir.join(oid.loose_path())
    }
}

/// Errors from loose object operations.
#[derive(Debug, thiserror::Error)]
pub enum LooseError {
    #[error("object {0} not found")]
    NotFound(ObjectId),

    #[error("corrupt loose object {oid}: {reason}")]
    Corrupt { oid: ObjectId, reason: String },

    #[error("loose object {oid} has unknown type '{type_name}'")]
    UnknownType { oid: ObjectId, type_name: BString },

    #[error("loose object {oid} has a malformed payload: {source}")]
    MalformedPayload {
        oid: ObjectId,
        #[source]
        source: bitgit_object::ObjectError,
    },

    #[error("decompression error for {oid}: {source}")]
    Decompress {
        oid: ObjectId,
        #[source]
        source: std::io::Error,
    },

    #[error("hash mismatch for {}: expected {expected}, got {actual}", path.display())]
    HashMismatch {
        path: PathBuf,
        expected: ObjectId,
        actual: ObjectId,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("hash error: {0}")]
    Hash(#[from] bitgit_hash::HashError),
}
