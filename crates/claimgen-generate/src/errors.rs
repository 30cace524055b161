use std::path::PathBuf;

use thiserror::Error;

/// Errors emitted by the generation engine and corpus store.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("No {entity} is left matching the specification")]
    NoMatch { entity: &'static str },
    #[error("corpus not found at {}: {source}", path.display())]
    CorpusNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("template for {document} has field '{field}' of unsupported kind '{kind}'")]
    TemplateBinding {
        document: String,
        field: String,
        kind: String,
    },
    #[error("invalid specification: {0}")]
    InvalidSpec(String),
    #[error("configuration conflict: {0}")]
    ConfigConflict(String),
    #[error("corrupt corpus {} at line {line}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("document codec error: {0}")]
    Document(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Core(#[from] claimgen_core::Error),
}

impl GenerationError {
    /// True when a corpus load failed only because nothing was persisted yet.
    pub fn is_corpus_not_found(&self) -> bool {
        matches!(self, GenerationError::CorpusNotFound { .. })
    }

    pub(crate) fn no_match(entity: &'static str) -> Self {
        GenerationError::NoMatch { entity }
    }
}
