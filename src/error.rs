use thiserror::Error;

/// Errors raised while configuring or running the sampler.
#[derive(Debug, Error)]
pub enum Error {
    #[error("model definition requires at least one document")]
    NoDocuments,

    #[error("model definition requires a non-empty vocabulary")]
    NoTerms,

    #[error("{name} must be finite (got {value})")]
    NonFiniteHyperparameter { name: &'static str, value: f64 },

    #[error("corpus has {found} documents but the model expects {expected}")]
    DocumentCountMismatch { expected: usize, found: usize },

    #[error("word {word} at position {position} of document {document} is outside a vocabulary of size {vocabulary_size}")]
    WordOutOfRange {
        document: usize,
        position: usize,
        word: usize,
        vocabulary_size: usize,
    },

    #[error("invalid assignment: {0}")]
    InvalidAssignment(String),

    /// Bookkeeping went wrong. The sampler state can no longer be trusted.
    #[error("internal invariant violated: {0}")]
    Invariant(String),

    /// Weights were negative or not finite, typically from degenerate hyperparameters.
    #[error("numerical fault: {0}")]
    Numeric(String),

    #[error("malformed LDA-C input at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn is_invariant(&self) -> bool {
        matches!(self, Error::Invariant(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Error::Numeric(_))
    }

    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::NoDocuments
                | Error::NoTerms
                | Error::NonFiniteHyperparameter { .. }
                | Error::DocumentCountMismatch { .. }
                | Error::WordOutOfRange { .. }
                | Error::InvalidAssignment(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(Error::NoTerms.is_configuration());
        assert!(Error::Invariant("x".into()).is_invariant());
        assert!(!Error::Invariant("x".into()).is_numeric());
        assert!(Error::Numeric("x".into()).is_numeric());
        let e = Error::Parse {
            line: 3,
            reason: "bad".into(),
        };
        assert!(!e.is_configuration());
        assert_eq!(e.to_string(), "malformed LDA-C input at line 3: bad");
    }
}
