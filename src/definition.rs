use crate::error::{Error, Result};

/// Sizes of the problem: number of documents and vocabulary size.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ModelDefinition {
    n_documents: usize,
    vocabulary_size: usize,
}

impl ModelDefinition {
    pub fn new(n_documents: usize, vocabulary_size: usize) -> Result<Self> {
        if n_documents == 0 {
            return Err(Error::NoDocuments);
        }
        if vocabulary_size == 0 {
            return Err(Error::NoTerms);
        }
        Ok(Self {
            n_documents,
            vocabulary_size,
        })
    }

    pub fn n_documents(&self) -> usize {
        self.n_documents
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation() {
        assert!(matches!(ModelDefinition::new(0, 3), Err(Error::NoDocuments)));
        assert!(matches!(ModelDefinition::new(2, 0), Err(Error::NoTerms)));
        let def = ModelDefinition::new(2, 3).unwrap();
        assert_eq!(def.n_documents(), 2);
        assert_eq!(def.vocabulary_size(), 3);
    }
}
