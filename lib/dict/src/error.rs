use thiserror::Error;

pub type Result<T> = std::result::Result<T, DictError>;

#[derive(Error, Debug)]
pub enum DictError {
    #[error("Entry already exists: {0}")]
    DuplicateCanonical(String),

    #[error("Entry not found: {0}")]
    EntryNotFound(String),

    #[error("Variant '{variant}' already belongs to entry '{canonical}'")]
    VariantConflict { variant: String, canonical: String },

    #[error("Import failed: {0}")]
    Import(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}
