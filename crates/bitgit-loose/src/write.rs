use std::fs;
use std::io::Write;
use std::path::Path;

use bitgit_hash::hasher::Hasher;
use bitgit_hash::{HashError, ObjectId};
use bitgit_object::{header, Object, ObjectType};
use flate2::write::ZlibEncoder;
use tracing::{debug, trace};

use crate::{LooseError, LooseObjectStore};

/// Identifier `obj` would be stored under, without touching disk.
pub fn hash_object(obj: &Object) -> Result<ObjectId, HashError> {
    obj.compute_oid()
}

/// Identifier of raw payload bytes of `obj_type`, without touching disk.
///
/// The payload must decode as `obj_type`; the same check [`LooseObjectStore::write_raw`]
/// applies before storing.
pub fn hash_raw(obj_type: ObjectType, content: &[u8]) -> Result<ObjectId, LooseError> {
    let oid = Hasher::hash_object(obj_type.as_str(), content)?;
    Object::parse_content(obj_type, content)
        .map_err(|source| LooseError::MalformedPayload { oid, source })?;
    Ok(oid)
}

impl LooseObjectStore {
    /// Store `obj` and return its id. Writing an object that is already
    /// present leaves the existing file untouched.
    pub fn write(&self, obj: &Object) -> Result<ObjectId, LooseError> {
        let content = obj.serialize_content();
        let oid = Hasher::hash_object(obj.object_type().as_str(), &content)?;
        self.store(oid, obj.object_type(), &content)?;
        Ok(oid)
    }

    /// Store payload bytes of a declared type after checking they decode.
    pub fn write_raw(&self, obj_type: ObjectType, content: &[u8]) -> Result<ObjectId, LooseError> {
        let oid = hash_raw(obj_type, content)?;
        self.store(oid, obj_type, content)?;
        Ok(oid)
    }

    fn store(&self, oid: ObjectId, obj_type: ObjectType, content: &[u8]) -> Result<(), LooseError> {
        let final_path = self.object_path(&oid);
        if final_path.is_file() {
            trace!(%oid, "loose object already present");
            return Ok(());
        }
        if let Some(fanout) = final_path.parent() {
            fs::create_dir_all(fanout)?;
        }

        let hdr = header::write_header(obj_type, content.len());
        let tmp = self.write_to_temp(&hdr, content)?;

        // Another writer may have stored the same id since the check above;
        // its bytes are identical, so losing that race is fine.
        match tmp.persist_noclobber(&final_path) {
            Ok(_) => {
                debug!(%oid, %obj_type, size = content.len(), "wrote loose object");
                Ok(())
            }
            Err(e) if final_path.is_file() => {
                trace!(%oid, "lost write race; keeping existing file");
                drop(e.file);
                Ok(())
            }
            Err(e) => Err(LooseError::Io(e.error)),
        }
    }

    /// Compress the envelope into a temp file inside `objects/`, so the
    /// final rename never crosses filesystems.
    fn write_to_temp(&self, hdr: &[u8], content: &[u8]) -> Result<tempfile::NamedTempFile, LooseError> {
        let mut tmp = tempfile::Builder::new()
            .prefix("tmp_obj_")
            .tempfile_in(&self.objects_dir)?;
        {
            let mut encoder = ZlibEncoder::new(tmp.as_file_mut(), self.compression_level);
            encoder.write_all(hdr)?;
            encoder.write_all(content)?;
            encoder.finish()?;
        }
        make_read_only(tmp.path())?;
        Ok(tmp)
    }
}

#[cfg(unix)]
fn make_read_only(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o444))
}

#[cfg(not(unix))]
fn make_read_only(path: &Path) -> std::io::Result<()> {
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_readonly(true);
    fs::set_permissions(path, perms)
}
