//! Turning user-supplied names into object ids.

use std::fs;
use std::io;

use bitgit_hash::hex::is_hex_digits;
use bitgit_hash::{ObjectId, OID_HEX_LEN};
use bitgit_loose::LooseError;
use tracing::trace;

use crate::Repository;

/// Shortest hex prefix accepted as an abbreviated id.
pub const MIN_PREFIX_LEN: usize = 4;

/// Symbolic refs are followed at most this many times.
const MAX_SYMREF_DEPTH: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("not a valid object name: '{0}'")]
    NotFound(String),

    #[error("short object id '{name}' is ambiguous ({} candidates)", candidates.len())]
    Ambiguous {
        name: String,
        candidates: Vec<ObjectId>,
    },

    #[error("bad ref '{name}': {reason}")]
    BadRef { name: String, reason: String },

    #[error(transparent)]
    Loose(#[from] LooseError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Maps a name to exactly one object id.
pub trait ResolveRevision {
    fn resolve(&self, repo: &Repository, name: &str) -> Result<ObjectId, ResolveError>;
}

/// Accepts only full 40-character hex ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactId;

impl ResolveRevision for ExactId {
    fn resolve(&self, _repo: &Repository, name: &str) -> Result<ObjectId, ResolveError> {
        ObjectId::from_hex(name).map_err(|_| ResolveError::NotFound(name.to_string()))
    }
}

/// Resolves full ids, loose refs and unique abbreviated ids.
///
/// Lookup order: a full hex id, then `HEAD` or a ref name (tried as given
/// and under `refs/`, `refs/tags/` and `refs/heads/`), then a hex prefix of
/// at least [`MIN_PREFIX_LEN`] characters matched against loose objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct LooseRevisionResolver;

impl ResolveRevision for LooseRevisionResolver {
    fn resolve(&self, repo: &Repository, name: &str) -> Result<ObjectId, ResolveError> {
        let is_hex = is_hex_digits(name);
        if is_hex && name.len() == OID_HEX_LEN {
            return ExactId.resolve(repo, name);
        }

        if is_plausible_ref(name) {
            for candidate in ref_candidates(name) {
                if let Some(oid) = read_ref(repo, &candidate, 0)? {
                    trace!(name, %candidate, %oid, "resolved ref");
                    return Ok(oid);
                }
            }
        }

        if is_hex && name.len() >= MIN_PREFIX_LEN {
            return resolve_prefix(repo, name);
        }
        Err(ResolveError::NotFound(name.to_string()))
    }
}

fn resolve_prefix(repo: &Repository, prefix: &str) -> Result<ObjectId, ResolveError> {
    let mut candidates = Vec::new();
    for oid in repo.objects().iter()? {
        let oid = oid?;
        if oid.starts_with_hex(prefix) {
            candidates.push(oid);
        }
    }
    match candidates.len() {
        0 => Err(ResolveError::NotFound(prefix.to_string())),
        1 => Ok(candidates[0]),
        _ => Err(ResolveError::Ambiguous {
            name: prefix.to_string(),
            candidates,
        }),
    }
}

fn ref_candidates(name: &str) -> Vec<String> {
    if name == "HEAD" || name.starts_with("refs/") {
        vec![name.to_string()]
    } else {
        vec![
            format!("refs/{name}"),
            format!("refs/tags/{name}"),
            format!("refs/heads/{name}"),
        ]
    }
}

/// Keeps lookups inside the metadata directory.
fn is_plausible_ref(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('/')
        && !name.ends_with('/')
        && name.split('/').all(|part| !part.is_empty() && part != "." && part != "..")
        && !name.chars().any(|c| c.is_ascii_control() || c == '\\')
}

/// Read a loose ref file, following `ref: ` links. A missing file or a
/// link to an unborn branch is `None`.
fn read_ref(repo: &Repository, name: &str, depth: usize) -> Result<Option<ObjectId>, ResolveError> {
    let bad_ref = |reason: &str| ResolveError::BadRef {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    if depth > MAX_SYMREF_DEPTH {
        return Err(bad_ref("symbolic ref loop"));
    }

    let segments: Vec<&str> = name.split('/').collect();
    let path = repo.path(&segments);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound) || path.is_dir() => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let content = content.trim_end();

    match content.strip_prefix("ref:") {
        Some(target) => {
            let target = target.trim_start();
            if !target.starts_with("refs/") || !is_plausible_ref(target) {
                return Err(bad_ref("symbolic ref outside refs/"));
            }
            read_ref(repo, target, depth + 1)
        }
        None => ObjectId::from_hex(content)
            .map(Some)
            .map_err(|_| bad_ref("not an object id")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_follow_rev_parse_order() {
        assert_eq!(ref_candidates("HEAD"), vec!["HEAD"]);
        assert_eq!(ref_candidates("refs/heads/x"), vec!["refs/heads/x"]);
        assert_eq!(
            ref_candidates("v1"),
            vec!["refs/v1", "refs/tags/v1", "refs/heads/v1"]
        );
    }

    #[test]
    fn implausible_refs() {
        for bad in ["", "/etc/passwd", "../config", "refs/../../x", "a//b", "a/", "a\\b"] {
            assert!(!is_plausible_ref(bad), "{bad:?}");
        }
        assert!(is_plausible_ref("refs/heads/feature/x"));
    }
}
