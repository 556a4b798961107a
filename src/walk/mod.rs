
use std::path::{Path, PathBuf};

use log::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::{
    error::Error,
    format::format_path,
    unit::{TransferUnit, UnitResult},
};

/// An entry that could not be read while walking the tree.
#[derive(Debug)]
pub struct WalkFailure {
    pub unit: TransferUnit,
    pub error: Error,
}

impl From<WalkFailure> for UnitResult {
    fn from(failure: WalkFailure) -> Self {
        UnitResult::failure(failure.unit, failure.error)
    }
}

/// Lazily yields every file below `source_dir`, sorted by name within each
/// directory. Symlinks to directories are not followed.
#[derive(Debug)]
pub struct TransferUnits {
    source_dir: PathBuf,
    walker: walkdir::IntoIter,
}

impl TransferUnits {
    pub fn new<P: AsRef<Path>>(source_dir: P) -> Self {
        let source_dir = source_dir.as_ref().to_owned();
        let walker = WalkDir::new(&source_dir)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter();

        TransferUnits { source_dir, walker }
    }

    fn unit_from_entry(&self, entry: &DirEntry) -> Option<TransferUnit> {
        let local_path = entry.path();
        let file_type = entry.file_type();

        if file_type.is_file() {
            Some(TransferUnit::new(&self.source_dir, local_path))
        } else if file_type.is_symlink() {
            if local_path.is_dir() {
                debug!("skipped directory symlink {}", format_path(local_path));
                None
            } else {
                Some(TransferUnit::new(&self.source_dir, local_path))
            }
        } else if file_type.is_dir() {
            None
        } else {
            warn!("skipped special file {}", format_path(local_path));
            None
        }
    }

    fn walk_failure(&self, error: walkdir::Error) -> WalkFailure {
        let path = error.path().unwrap_or(&self.source_dir).to_owned();
        let unit = TransferUnit::new(&self.source_dir, path);
        WalkFailure {
            unit,
            error: error.into(),
        }
    }
}

impl Iterator for TransferUnits {
    type Item = Result<TransferUnit, WalkFailure>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.walker.next()? {
                Ok(entry) => {
                    if let Some(unit) = self.unit_from_entry(&entry) {
                        return Some(Ok(unit));
                    }
                }
                Err(err) => return Some(Err(self.walk_failure(err))),
            }
        }
    }
}
