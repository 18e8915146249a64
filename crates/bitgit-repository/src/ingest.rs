//! Turning files into objects and objects back into bytes.
//!
//! Nothing here writes to a terminal; callers decide what to print.

use std::fs;
use std::io::Write;
use std::path::Path;

use bitgit_hash::ObjectId;
use bitgit_object::{Object, ObjectType};
use tracing::debug;

use crate::resolve::ResolveRevision;
use crate::{RepoError, Repository};

/// Hash `data` as an object of `obj_type`, storing it when `repo` is given.
///
/// The bytes are decoded first, so a malformed tree, commit or tag is
/// rejected instead of being stored.
pub fn hash_bytes(
    data: &[u8],
    obj_type: ObjectType,
    repo: Option<&Repository>,
) -> Result<ObjectId, RepoError> {
    let object = Object::parse_content(obj_type, data)
        .map_err(|source| RepoError::MalformedPayload { obj_type, source })?;

    let oid = match repo {
        Some(repo) => repo.objects().write(&object)?,
        None => bitgit_loose::hash_object(&object).map_err(bitgit_loose::LooseError::from)?,
    };
    debug!(%oid, %obj_type, len = data.len(), stored = repo.is_some(), "hashed object");
    Ok(oid)
}

/// [`hash_bytes`] on the whole contents of `path`.
pub fn hash_file(
    path: impl AsRef<Path>,
    obj_type: ObjectType,
    repo: Option<&Repository>,
) -> Result<ObjectId, RepoError> {
    let data = fs::read(path.as_ref())?;
    hash_bytes(&data, obj_type, repo)
}

/// Resolve `name` and read the object it names.
pub fn read_object(
    repo: &Repository,
    name: &str,
    resolver: &dyn ResolveRevision,
) -> Result<(ObjectId, Object), RepoError> {
    let oid = resolver.resolve(repo, name)?;
    let object = repo.objects().read(&oid)?;
    Ok((oid, object))
}

/// Canonical payload of the object `name`, which must be of type `expected`.
pub fn show_object(
    repo: &Repository,
    name: &str,
    expected: ObjectType,
    resolver: &dyn ResolveRevision,
) -> Result<Vec<u8>, RepoError> {
    let (oid, object) = read_object(repo, name, resolver)?;
    let actual = object.object_type();
    if actual != expected {
        return Err(RepoError::TypeMismatch {
            oid,
            expected,
            actual,
        });
    }
    Ok(object.serialize_content())
}

/// Human-readable rendering: trees become `<mode> <type> <id>\t<name>`
/// lines, every other type is shown as its payload.
pub fn pretty_object(object: &Object) -> Vec<u8> {
    let Object::Tree(tree) = object else {
        return object.serialize_content();
    };
    let mut out = Vec::new();
    for entry in tree.iter() {
        // Writing into a Vec cannot fail.
        let _ = write!(
            out,
            "{:06o} {} {}\t",
            entry.mode.raw(),
            entry.mode.object_type(),
            entry.oid
        );
        out.extend_from_slice(&entry.name);
        out.push(b'\n');
    }
    out
}
