//! Process-level storage wiring.
//!
//! One [`StorageManager`] per process owns the dictionary and the note
//! index together with their files, loading both at startup. Dictionary
//! mutations go through [`StorageManager::with_dictionary`], which
//! serializes writers behind the lock and persists after every successful
//! mutation; a failed save rolls the in-memory state back so memory and
//! disk never drift apart.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use notex_core::NoteIndex;
use notex_dict::{generate_patterns, Dictionary};
use notex_model::EmbeddingProvider;

use crate::dictionary_file::DictionaryFile;
use crate::error::Result;
use crate::index_file::IndexFile;
use crate::ingest::{ingest_notes, IngestReport};

pub struct StorageManager {
    data_dir: PathBuf,
    dictionary: Arc<RwLock<Dictionary>>,
    dictionary_file: DictionaryFile,
    index: Arc<NoteIndex>,
    index_file: IndexFile,
}

impl StorageManager {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;

        let dictionary_file = DictionaryFile::new(data_dir.join("dictionary.yaml"));
        let dictionary = Arc::new(RwLock::new(dictionary_file.load()?));

        let index_file = IndexFile::new(data_dir.join("index.bin"));
        let index = Arc::new(index_file.load()?);

        info!(data_dir = %data_dir.display(), "storage initialized");
        Ok(Self {
            data_dir,
            dictionary,
            dictionary_file,
            index,
            index_file,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn dictionary(&self) -> Arc<RwLock<Dictionary>> {
        self.dictionary.clone()
    }

    pub fn index(&self) -> Arc<NoteIndex> {
        self.index.clone()
    }

    /// Run a mutation against the dictionary and persist the result. The
    /// write lock is held across mutate-and-save, so in-process writers
    /// cannot interleave. If the save fails, the previous in-memory state
    /// is restored and the error returned.
    pub fn with_dictionary<T>(
        &self,
        mutate: impl FnOnce(&mut Dictionary) -> notex_dict::Result<T>,
    ) -> Result<notex_dict::Result<T>> {
        let mut dictionary = self.dictionary.write();
        let before = dictionary.clone();

        let outcome = mutate(&mut dictionary);
        if outcome.is_ok() {
            if let Err(err) = self.dictionary_file.save(&dictionary) {
                *dictionary = before;
                return Err(err);
            }
        }
        Ok(outcome)
    }

    /// Persist the current note index.
    pub fn save_index(&self) -> Result<()> {
        self.index_file.save(&self.index)
    }

    /// Ingest new notes from `source_dir`, register unseen material term
    /// patterns in the dictionary, then snapshot the index.
    pub async fn ingest(
        &self,
        source_dir: &Path,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<IngestReport> {
        let (mut report, material_terms) = {
            let dictionary = self.dictionary.read();
            ingest_notes(source_dir, &dictionary, &self.index, embedder).await?
        };
        if !report.added.is_empty() {
            let patterns: Vec<String> = material_terms
                .iter()
                .flat_map(|term| generate_patterns(term))
                .collect();
            report.new_terms = self
                .with_dictionary(|dict| Ok(dict.register_patterns(&patterns)))??;
            self.save_index()?;
        }
        Ok(report)
    }
}
