use std::fs;
use std::path::{Path, PathBuf};

use bitgit_hash::{hex::is_hex_digits, ObjectId, OID_HEX_LEN};

use crate::{LooseError, LooseObjectStore};

/// Iterator over the ids of all loose objects, in ascending order.
///
/// Only two-hex-digit fan-out directories and 38-hex-digit file names are
/// considered, so temp files and anything else in `objects/` are skipped.
pub struct LooseObjectIter {
    fanouts: std::vec::IntoIter<(String, PathBuf)>,
    pending: std::vec::IntoIter<ObjectId>,
}

fn is_fanout_name(name: &str) -> bool {
    name.len() == 2 && is_hex_digits(name)
}

impl LooseObjectIter {
    fn new(objects_dir: &Path) -> Result<Self, LooseError> {
        let mut fanouts = Vec::new();
        if objects_dir.is_dir() {
            for entry in fs::read_dir(objects_dir)? {
                let entry = entry?;
                let name = entry.file_name().to_string_lossy().to_ascii_lowercase();
                if is_fanout_name(&name) && entry.file_type()?.is_dir() {
                    fanouts.push((name, entry.path()));
                }
            }
        }
        fanouts.sort();
        Ok(Self {
            fanouts: fanouts.into_iter(),
            pending: Vec::new().into_iter(),
        })
    }

    fn load(prefix: &str, dir: &Path) -> Result<Vec<ObjectId>, LooseError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.len() != OID_HEX_LEN - 2 || !is_hex_digits(&name) {
                continue;
            }
            if !entry.file_type()?.is_file() {
                continue;
            }
            ids.push(ObjectId::from_hex(&format!("{prefix}{name}"))?);
        }
        ids.sort();
        Ok(ids)
    }
}

impl Iterator for LooseObjectIter {
    type Item = Result<ObjectId, LooseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(oid) = self.pending.next() {
                return Some(Ok(oid));
            }
            let (prefix, dir) = self.fanouts.next()?;
            match Self::load(&prefix, &dir) {
                Ok(ids) => self.pending = ids.into_iter(),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl LooseObjectStore {
    pub fn iter(&self) -> Result<LooseObjectIter, LooseError> {
        LooseObjectIter::new(&self.objects_dir)
    }
}
