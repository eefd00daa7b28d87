// Dish-level word counts with implicit Dirichlet pseudocounts

use crate::error::{Error, Result};

use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
struct Tally {
    total: usize,
    words: BTreeMap<usize, usize>,
}

/// Observed per-dish counts plus a symmetric smoothing baseline that is
/// never materialised: reads add `beta` to every dish x word count and
/// `V * beta` to every dish total. The sentinel dish `0` reports a raw
/// zero for word reads.
#[derive(Debug, Clone)]
pub struct PseudocountAccumulator {
    tallies: Vec<Tally>,
    word_baseline: f64,
    total_baseline: f64,
}

impl PseudocountAccumulator {
    pub fn new(vocabulary_size: usize, beta: f64) -> Self {
        Self {
            tallies: vec![Tally::default()],
            word_baseline: beta,
            total_baseline: beta * vocabulary_size as f64,
        }
    }

    pub fn total(&self, dish: usize) -> f64 {
        self.raw_total(dish) as f64 + self.total_baseline
    }

    pub fn word(&self, dish: usize, word: usize) -> f64 {
        if dish == 0 {
            0.0
        } else {
            self.raw_word(dish, word) as f64 + self.word_baseline
        }
    }

    pub fn raw_total(&self, dish: usize) -> usize {
        self.tallies.get(dish).map_or(0, |t| t.total)
    }

    pub fn raw_word(&self, dish: usize, word: usize) -> usize {
        self.tallies
            .get(dish)
            .and_then(|t| t.words.get(&word))
            .copied()
            .unwrap_or(0)
    }

    pub fn raw_words(&self, dish: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.tallies
            .get(dish)
            .into_iter()
            .flat_map(|t| t.words.iter().map(|(&w, &c)| (w, c)))
    }

    pub fn word_baseline(&self) -> f64 {
        self.word_baseline
    }

    pub fn total_baseline(&self) -> f64 {
        self.total_baseline
    }

    /// Adds `count` observations of `word` to both the dish x word entry
    /// and the dish total.
    pub fn increment(&mut self, dish: usize, word: usize, count: usize) -> Result<()> {
        if dish == 0 {
            return Err(Error::Invariant(
                "attempted to record words for the sentinel dish".into(),
            ));
        }
        if dish >= self.tallies.len() {
            self.tallies.resize_with(dish + 1, Tally::default);
        }
        let tally = &mut self.tallies[dish];
        tally.total += count;
        *tally.words.entry(word).or_insert(0) += count;
        Ok(())
    }

    pub fn decrement(&mut self, dish: usize, word: usize, count: usize) -> Result<()> {
        let underflow = || {
            Error::Invariant(format!(
                "count of word {} at dish {} would become negative",
                word, dish
            ))
        };
        let tally = self.tallies.get_mut(dish).ok_or_else(underflow)?;
        let n = tally.words.get_mut(&word).ok_or_else(underflow)?;
        if *n < count || tally.total < count {
            return Err(underflow());
        }
        *n -= count;
        if *n == 0 {
            tally.words.remove(&word);
        }
        tally.total -= count;
        Ok(())
    }

    pub fn reset(&mut self, dish: usize) {
        if let Some(tally) = self.tallies.get_mut(dish) {
            *tally = Tally::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_reads() {
        let acc = PseudocountAccumulator::new(4, 0.25);
        assert_eq!(acc.total(3), 1.0);
        assert_eq!(acc.word(3, 2), 0.25);
        assert_eq!(acc.word(0, 2), 0.0);
        assert_eq!(acc.total(0), 1.0);
    }

    #[test]
    fn test_increment_and_decrement() {
        let mut acc = PseudocountAccumulator::new(4, 0.5);
        acc.increment(2, 1, 3).unwrap();
        acc.increment(2, 3, 1).unwrap();
        assert_eq!(acc.total(2), 6.0);
        assert_eq!(acc.word(2, 1), 3.5);
        assert_eq!(acc.word(2, 0), 0.5);
        acc.decrement(2, 1, 3).unwrap();
        assert_eq!(acc.raw_words(2).collect::<Vec<_>>(), vec![(3, 1)]);
        assert_eq!(acc.total(2), 3.0);
        assert_eq!(acc.raw_word(2, 1), 0);
    }

    #[test]
    fn test_underflow_is_invariant_violation() {
        let mut acc = PseudocountAccumulator::new(4, 0.5);
        assert!(acc.decrement(1, 0, 1).unwrap_err().is_invariant());
        acc.increment(1, 0, 1).unwrap();
        assert!(acc.decrement(1, 0, 2).unwrap_err().is_invariant());
        assert!(acc.increment(0, 0, 1).unwrap_err().is_invariant());
    }

    #[test]
    fn test_reset() {
        let mut acc = PseudocountAccumulator::new(2, 1.0);
        acc.increment(1, 0, 5).unwrap();
        acc.reset(1);
        assert_eq!(acc.total(1), 2.0);
        assert_eq!(acc.word(1, 0), 1.0);
        assert_eq!(acc.raw_words(1).count(), 0);
    }
}
