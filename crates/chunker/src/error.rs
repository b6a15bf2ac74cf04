use thiserror::Error;

/// Pipeline-level failures. Oracle and semantic-split failures are absorbed
/// by fallbacks and surface only in the report, never here.
#[derive(Error, Debug)]
pub enum ChunkerError {
    #[error("document text is blank — nothing to chunk")]
    EmptyInput,

    #[error("decision count mismatch: expected {expected} decisions for the chunk sequence, got {actual}")]
    MergeInconsistency { expected: usize, actual: usize },
}

impl ChunkerError {
    /// Stable machine-readable code for the output contract.
    pub fn code(&self) -> &'static str {
        match self {
            ChunkerError::EmptyInput => "empty_input",
            ChunkerError::MergeInconsistency { .. } => "merge_inconsistency",
        }
    }
}
