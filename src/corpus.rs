// Documents as sequences of word ids

use crate::definition::ModelDefinition;
use crate::error::{Error, Result};

use std::io::BufRead;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corpus {
    documents: Vec<Vec<usize>>,
}

impl Corpus {
    pub fn new(documents: Vec<Vec<usize>>) -> Self {
        Self { documents }
    }

    /// Reads documents in LDA-C format, one per line:
    /// `M term_1:count_1 ... term_M:count_M`. Each term is expanded into
    /// `count` tokens, in the order the terms appear. Blank lines are skipped.
    pub fn from_ldac<R: BufRead>(reader: R) -> Result<Self> {
        let mut documents = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line_number = index + 1;
            let mut fields = line.split_whitespace();
            let declared = match fields.next() {
                Some(field) => parse_count(field, line_number)?,
                None => continue,
            };
            let mut document = Vec::new();
            let mut n_pairs = 0;
            for pair in fields {
                let (term, count) = pair.split_once(':').ok_or_else(|| Error::Parse {
                    line: line_number,
                    reason: format!("expected 'term:count', found '{}'", pair),
                })?;
                let term = parse_count(term, line_number)?;
                let count = parse_count(count, line_number)?;
                document.try_reserve(count).map_err(|_| Error::Parse {
                    line: line_number,
                    reason: format!("cannot hold {} tokens of term {}", count, term),
                })?;
                document.extend(std::iter::repeat(term).take(count));
                n_pairs += 1;
            }
            if n_pairs != declared {
                return Err(Error::Parse {
                    line: line_number,
                    reason: format!("declares {} unique terms but lists {}", declared, n_pairs),
                });
            }
            documents.push(document);
        }
        Ok(Self { documents })
    }

    pub fn n_documents(&self) -> usize {
        self.documents.len()
    }

    pub fn n_tokens(&self) -> usize {
        self.documents.iter().map(|d| d.len()).sum()
    }

    pub fn document(&self, j: usize) -> &[usize] {
        &self.documents[j]
    }

    pub fn documents(&self) -> &[Vec<usize>] {
        &self.documents
    }

    /// Smallest vocabulary size able to hold every word id in the corpus.
    pub fn num_terms(&self) -> usize {
        self.documents
            .iter()
            .flatten()
            .max()
            .map_or(0, |&v| v + 1)
    }

    pub fn check(&self, definition: &ModelDefinition) -> Result<()> {
        if self.documents.len() != definition.n_documents() {
            return Err(Error::DocumentCountMismatch {
                expected: definition.n_documents(),
                found: self.documents.len(),
            });
        }
        let vocabulary_size = definition.vocabulary_size();
        for (document, words) in self.documents.iter().enumerate() {
            if let Some(position) = words.iter().position(|&w| w >= vocabulary_size) {
                return Err(Error::WordOutOfRange {
                    document,
                    position,
                    word: words[position],
                    vocabulary_size,
                });
            }
        }
        Ok(())
    }
}

fn parse_count(field: &str, line: usize) -> Result<usize> {
    field.parse().map_err(|_| Error::Parse {
        line,
        reason: format!("'{}' is not a non-negative integer", field),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_ldac() {
        let input = "2 0:2 3:1\n\n1 1:3\n";
        let corpus = Corpus::from_ldac(input.as_bytes()).unwrap();
        assert_eq!(corpus.documents(), &[vec![0, 0, 3], vec![1, 1, 1]]);
        assert_eq!(corpus.num_terms(), 4);
        assert_eq!(corpus.n_tokens(), 6);
    }

    #[test]
    fn test_from_ldac_malformed() {
        match Corpus::from_ldac("1 0:2\n2 4:1\n".as_bytes()) {
            Err(Error::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected {:?}", other),
        }
        assert!(Corpus::from_ldac("1 0-2\n".as_bytes()).is_err());
        assert!(Corpus::from_ldac("x 0:2\n".as_bytes()).is_err());
        match Corpus::from_ldac("1 0:18446744073709551615\n".as_bytes()) {
            Err(Error::Parse { line, .. }) => assert_eq!(line, 1),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_check() {
        let corpus = Corpus::new(vec![vec![0, 0, 1], vec![1, 2, 2]]);
        assert!(corpus.check(&ModelDefinition::new(2, 3).unwrap()).is_ok());
        assert!(matches!(
            corpus.check(&ModelDefinition::new(3, 3).unwrap()),
            Err(Error::DocumentCountMismatch {
                expected: 3,
                found: 2
            })
        ));
        match corpus.check(&ModelDefinition::new(2, 2).unwrap()) {
            Err(Error::WordOutOfRange {
                document, position, ..
            }) => assert_eq!((document, position), (1, 1)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_num_terms_of_empty_corpus() {
        assert_eq!(Corpus::new(vec![vec![]]).num_terms(), 0);
    }
}
