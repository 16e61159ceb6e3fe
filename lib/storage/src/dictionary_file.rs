//! YAML dictionary persistence.
//!
//! Saves copy the current file to a `.backup` sibling, then write through a
//! temp file and atomic rename, so a subsequent load never observes a
//! partial write. No cross-process lock is taken; concurrent external
//! writers are last-writer-wins.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use notex_dict::Dictionary;

use crate::error::Result;

pub struct DictionaryFile {
    path: PathBuf,
}

impl DictionaryFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the dictionary. A missing file is an empty dictionary; a file
    /// that fails to parse is logged and also treated as empty, never
    /// partially populated.
    pub fn load(&self) -> Result<Dictionary> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "no dictionary file, starting empty");
            return Ok(Dictionary::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        match Dictionary::from_yaml(&content) {
            Ok(dictionary) => {
                info!(entries = dictionary.entries().len(), "dictionary loaded");
                Ok(dictionary)
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "dictionary file unreadable, resetting to empty");
                Ok(Dictionary::new())
            }
        }
    }

    /// Persist the dictionary: back up the existing file, then write
    /// atomically via temp file and rename.
    pub fn save(&self, dictionary: &Dictionary) -> Result<()> {
        let content = dictionary.to_yaml()?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if self.path.exists() {
            let backup = self.backup_path();
            std::fs::copy(&self.path, &backup)?;
        }

        let temp = self.path.with_extension("tmp");
        std::fs::write(&temp, &content)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }

    fn backup_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".backup");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dictionary() -> Dictionary {
        let mut dict = Dictionary::new();
        dict.add_entry("水酸化ナトリウム", vec!["NaOH".to_string()], None, None)
            .unwrap();
        dict
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = DictionaryFile::new(dir.path().join("dictionary.yaml"));
        assert!(file.load().unwrap().entries().is_empty());
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let file = DictionaryFile::new(dir.path().join("dictionary.yaml"));

        file.save(&sample_dictionary()).unwrap();
        let loaded = file.load().unwrap();
        assert_eq!(loaded.entries().len(), 1);
        assert_eq!(loaded.normalize_term("NaOH"), "水酸化ナトリウム");
    }

    #[test]
    fn test_save_writes_backup_of_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dictionary.yaml");
        let file = DictionaryFile::new(&path);

        file.save(&sample_dictionary()).unwrap();
        let first_content = std::fs::read_to_string(&path).unwrap();

        let mut updated = sample_dictionary();
        updated.add_entry("エタノール", vec![], None, None).unwrap();
        file.save(&updated).unwrap();

        let backup = std::fs::read_to_string(dir.path().join("dictionary.yaml.backup")).unwrap();
        assert_eq!(backup, first_content);
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dictionary.yaml");
        std::fs::write(&path, ": not [ valid yaml").unwrap();

        let loaded = DictionaryFile::new(&path).load().unwrap();
        assert!(loaded.entries().is_empty());
    }
}
