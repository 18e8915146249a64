use std::fs;
use std::io::{self, Read};

use bitgit_hash::hasher::Hasher;
use bitgit_hash::ObjectId;
use bitgit_object::{header, Object, ObjectError, ObjectType};
use flate2::read::ZlibDecoder;
use tracing::trace;

use crate::{LooseError, LooseObjectStore};

/// Upper bound on `"<type> <len>\0"`; the longest legal header is far shorter.
const MAX_HEADER_LEN: usize = 64;

impl LooseObjectStore {
    pub fn contains(&self, oid: &ObjectId) -> bool {
        self.object_path(oid).is_file()
    }

    /// Read and fully verify an object.
    ///
    /// Checks run in order: the file must exist, inflate cleanly, carry a
    /// well-formed envelope with a known type and exact length, decode as
    /// that type, and hash back to `oid`.
    pub fn read(&self, oid: &ObjectId) -> Result<Object, LooseError> {
        let path = self.object_path(oid);
        let compressed = read_file(&path, oid)?;
        let envelope = inflate_all(&compressed, oid)?;

        let (obj_type, declared, header_len) = parse_envelope_header(&envelope, oid)?;
        let payload = &envelope[header_len..];
        if payload.len() != declared {
            return Err(LooseError::Corrupt {
                oid: *oid,
                reason: format!(
                    "header declares {declared} bytes but payload has {}",
                    payload.len()
                ),
            });
        }

        let object = Object::parse_content(obj_type, payload)
            .map_err(|source| LooseError::MalformedPayload { oid: *oid, source })?;

        let actual = Hasher::digest(&envelope)?;
        if actual != *oid {
            return Err(LooseError::HashMismatch {
                path,
                expected: *oid,
                actual,
            });
        }

        trace!(%oid, %obj_type, size = declared, "read loose object");
        Ok(object)
    }

    /// Type and payload size, inflating only the header.
    pub fn read_header(&self, oid: &ObjectId) -> Result<(ObjectType, usize), LooseError> {
        let compressed = read_file(&self.object_path(oid), oid)?;
        let mut decoder = ZlibDecoder::new(&compressed[..]);
        let mut buf = [0u8; MAX_HEADER_LEN];
        let mut filled = 0;

        while !buf[..filled].contains(&0) {
            if filled == buf.len() {
                return Err(LooseError::Corrupt {
                    oid: *oid,
                    reason: format!("header exceeds {MAX_HEADER_LEN} bytes"),
                });
            }
            let n = decoder
                .read(&mut buf[filled..])
                .map_err(|source| LooseError::Decompress { oid: *oid, source })?;
            if n == 0 {
                return Err(LooseError::Corrupt {
                    oid: *oid,
                    reason: "end of data before header terminator".into(),
                });
            }
            filled += n;
        }

        let (obj_type, declared, _) = parse_envelope_header(&buf[..filled], oid)?;
        Ok((obj_type, declared))
    }
}

fn read_file(path: &std::path::Path, oid: &ObjectId) -> Result<Vec<u8>, LooseError> {
    fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => LooseError::NotFound(*oid),
        _ => LooseError::Io(e),
    })
}

fn inflate_all(compressed: &[u8], oid: &ObjectId) -> Result<Vec<u8>, LooseError> {
    let mut out = Vec::with_capacity(compressed.len() * 2);
    ZlibDecoder::new(compressed)
        .read_to_end(&mut out)
        .map_err(|source| LooseError::Decompress { oid: *oid, source })?;
    Ok(out)
}

fn parse_envelope_header(
    data: &[u8],
    oid: &ObjectId,
) -> Result<(ObjectType, usize, usize), LooseError> {
    header::parse_header(data).map_err(|e| match e {
        ObjectError::UnknownType(type_name) => LooseError::UnknownType {
            oid: *oid,
            type_name,
        },
        other => LooseError::Corrupt {
            oid: *oid,
            reason: other.to_string(),
        },
    })
}
