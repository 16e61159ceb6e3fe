//! Binary snapshot of the note index.

use std::path::{Path, PathBuf};

use tracing::info;

use notex_core::{NoteIndex, NoteRecord};

use crate::error::{Result, StorageError};

pub struct IndexFile {
    path: PathBuf,
}

impl IndexFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the index snapshot; a missing file is an empty index.
    pub fn load(&self) -> Result<NoteIndex> {
        if !self.path.exists() {
            return Ok(NoteIndex::new());
        }

        let data = std::fs::read(&self.path)?;
        let records: Vec<NoteRecord> =
            bincode::deserialize(&data).map_err(|e| StorageError::Codec(e.to_string()))?;
        info!(records = records.len(), "note index loaded");
        Ok(NoteIndex::from_records(records))
    }

    /// Write the full index through a temp file and atomic rename.
    pub fn save(&self, index: &NoteIndex) -> Result<()> {
        let records = index.records();
        let data =
            bincode::serialize(&records).map_err(|e| StorageError::Codec(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let temp = self.path.with_extension("tmp");
        std::fs::write(&temp, &data)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }
}
