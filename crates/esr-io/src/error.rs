//! Errors raised while turning a raw source into canonical metrics.

use esr_core::error::EsrError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    /// The raw file (or directory of sheets) does not exist
    #[error("{source_name}: source not found at '{path}'")]
    MissingSource { source_name: String, path: String },

    /// No layout candidate satisfied the layout rule
    #[error("{source_name}: no usable layout; tried {}", tried.join(", "))]
    LayoutNotFound {
        source_name: String,
        tried: Vec<String>,
    },

    /// A required concept matched none of the available columns
    #[error("{source_name}: no column for '{concept}'; available columns: {available:?}")]
    SchemaMismatch {
        source_name: String,
        concept: String,
        available: Vec<String>,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SourceError> for EsrError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Io(io) => EsrError::Io(io),
            other => EsrError::Source(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_not_found_lists_candidates() {
        let err = SourceError::LayoutNotFound {
            source_name: "wholesale".into(),
            tried: vec!["#0 header 0".into(), "'Data' header 1".into()],
        };
        assert_eq!(
            err.to_string(),
            "wholesale: no usable layout; tried #0 header 0, 'Data' header 1"
        );
    }

    #[test]
    fn test_converts_into_source_variant() {
        let err: EsrError = SourceError::SchemaMismatch {
            source_name: "queue".into(),
            concept: "iso".into(),
            available: vec!["Project".into()],
        }
        .into();
        assert!(matches!(err, EsrError::Source(_)));
        assert!(err.to_string().contains("available columns"));
    }
}
