// Chinese restaurant franchise state

use crate::corpus::Corpus;
use crate::definition::ModelDefinition;
use crate::error::{Error, Result};
use crate::ids::ActiveIds;
use crate::prelude::HdpParameters;
use crate::pseudo::PseudocountAccumulator;

use log::trace;
use std::collections::BTreeMap;

/// Tables of one document. Vectors are indexed by table id; slot `0`
/// belongs to the sentinel and stays empty.
#[derive(Debug, Clone)]
pub(crate) struct Restaurant {
    pub(crate) active_tables: ActiveIds,
    pub(crate) table_dish: Vec<usize>,
    pub(crate) table_word_count: Vec<usize>,
    pub(crate) table_word_histogram: Vec<BTreeMap<usize, usize>>,
}

impl Restaurant {
    fn new() -> Self {
        Self {
            active_tables: ActiveIds::new(),
            table_dish: vec![0],
            table_word_count: vec![0],
            table_word_histogram: vec![BTreeMap::new()],
        }
    }

    pub(crate) fn ensure_slot(&mut self, table: usize) {
        if table >= self.table_dish.len() {
            self.table_dish.resize(table + 1, 0);
            self.table_word_count.resize(table + 1, 0);
            self.table_word_histogram.resize_with(table + 1, BTreeMap::new);
        }
    }
}

/// Complete sampler state. Tokens are seated at tables within their
/// document, and every active table serves one globally shared dish.
#[derive(Debug, Clone)]
pub struct FranchiseState {
    pub(crate) definition: ModelDefinition,
    pub(crate) parameters: HdpParameters,
    pub(crate) corpus: Corpus,
    pub(crate) token_table: Vec<Vec<usize>>,
    pub(crate) restaurants: Vec<Restaurant>,
    pub(crate) active_dishes: ActiveIds,
    pub(crate) tables_per_dish: Vec<usize>,
    pub(crate) n_tables: usize,
    pub(crate) dish_counts: PseudocountAccumulator,
}

impl FranchiseState {
    pub fn initialize(
        definition: ModelDefinition,
        parameters: HdpParameters,
        corpus: Corpus,
    ) -> Result<Self> {
        corpus.check(&definition)?;
        let token_table = corpus.documents().iter().map(|d| vec![0; d.len()]).collect();
        let restaurants = (0..definition.n_documents())
            .map(|_| Restaurant::new())
            .collect();
        let dish_counts = PseudocountAccumulator::new(
            definition.vocabulary_size(),
            parameters.beta.value(),
        );
        Ok(Self {
            definition,
            parameters,
            corpus,
            token_table,
            restaurants,
            active_dishes: ActiveIds::new(),
            tables_per_dish: vec![0],
            n_tables: 0,
            dish_counts,
        })
    }

    pub fn definition(&self) -> &ModelDefinition {
        &self.definition
    }

    pub fn parameters(&self) -> &HdpParameters {
        &self.parameters
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn table_of(&self, j: usize, i: usize) -> usize {
        self.token_table[j][i]
    }

    pub fn dish_of(&self, j: usize, t: usize) -> usize {
        self.restaurants[j].table_dish.get(t).copied().unwrap_or(0)
    }

    pub fn active_tables(&self, j: usize) -> &[usize] {
        self.restaurants[j].active_tables.as_slice()
    }

    pub fn active_dishes(&self) -> &[usize] {
        self.active_dishes.as_slice()
    }

    pub fn tables_per_dish(&self, k: usize) -> usize {
        self.tables_per_dish.get(k).copied().unwrap_or(0)
    }

    pub fn n_tables(&self) -> usize {
        self.n_tables
    }

    pub fn table_word_count(&self, j: usize, t: usize) -> usize {
        self.restaurants[j].table_word_count.get(t).copied().unwrap_or(0)
    }

    pub fn dish_counts(&self) -> &PseudocountAccumulator {
        &self.dish_counts
    }

    pub(crate) fn vocabulary_size(&self) -> usize {
        self.definition.vocabulary_size()
    }

    pub(crate) fn word(&self, j: usize, i: usize) -> usize {
        self.corpus.document(j)[i]
    }

    pub(crate) fn add_dish(&mut self) -> usize {
        let k = self.active_dishes.allocate();
        if k >= self.tables_per_dish.len() {
            self.tables_per_dish.resize(k + 1, 0);
        }
        self.tables_per_dish[k] = 0;
        self.dish_counts.reset(k);
        trace!("created dish {}", k);
        k
    }

    // The dish's word counts are discarded with it; a reused id starts
    // again from the smoothing baseline.
    pub(crate) fn remove_dish(&mut self, k: usize) -> Result<()> {
        if !self.active_dishes.free(k) {
            return Err(Error::Invariant(format!(
                "dish {} is not in the active registry",
                k
            )));
        }
        self.dish_counts.reset(k);
        trace!("removed dish {}", k);
        Ok(())
    }

    pub(crate) fn add_table(&mut self, j: usize, k: usize) -> Result<usize> {
        if k == 0 || !self.active_dishes.contains(k) {
            return Err(Error::Invariant(format!(
                "cannot open a table serving inactive dish {}",
                k
            )));
        }
        let restaurant = &mut self.restaurants[j];
        let t = restaurant.active_tables.allocate();
        restaurant.ensure_slot(t);
        restaurant.table_word_count[t] = 0;
        restaurant.table_word_histogram[t].clear();
        restaurant.table_dish[t] = k;
        self.tables_per_dish[k] += 1;
        self.n_tables += 1;
        trace!("opened table {} of document {} serving dish {}", t, j, k);
        Ok(t)
    }

    pub(crate) fn remove_table(&mut self, j: usize, t: usize) -> Result<()> {
        let restaurant = &mut self.restaurants[j];
        if !restaurant.active_tables.free(t) {
            return Err(Error::Invariant(format!(
                "table {} of document {} is not active",
                t, j
            )));
        }
        let k = std::mem::replace(&mut restaurant.table_dish[t], 0);
        trace!("closed table {} of document {}", t, j);
        self.release_table(k)?;
        Ok(())
    }

    // Drops one table from dish `k`; returns whether the dish died.
    fn release_table(&mut self, k: usize) -> Result<bool> {
        match self.tables_per_dish.get_mut(k) {
            Some(n) if *n > 0 && k != 0 => {
                *n -= 1;
                self.n_tables -= 1;
                if *n == 0 {
                    self.remove_dish(k)?;
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            _ => Err(Error::Invariant(format!("dish {} serves no tables", k))),
        }
    }

    /// Removes token `i` of document `j` from its table, deleting the table
    /// (and possibly its dish) when it empties.
    pub(crate) fn leave_table(&mut self, j: usize, i: usize) -> Result<()> {
        let t = self.token_table[j][i];
        if t == 0 {
            return Ok(());
        }
        let v = self.word(j, i);
        let restaurant = &mut self.restaurants[j];
        let k = restaurant.table_dish[t];
        let n = &mut restaurant.table_word_count[t];
        if *n == 0 {
            return Err(Error::Invariant(format!(
                "table {} of document {} is already empty",
                t, j
            )));
        }
        *n -= 1;
        let emptied = *n == 0;
        decrement_histogram(&mut restaurant.table_word_histogram[t], v, 1)?;
        self.dish_counts.decrement(k, v, 1)?;
        self.token_table[j][i] = 0;
        if emptied {
            self.remove_table(j, t)?;
        }
        Ok(())
    }

    pub(crate) fn seat_at_table(&mut self, j: usize, i: usize, t: usize) -> Result<()> {
        if self.token_table[j][i] != 0 {
            return Err(Error::Invariant(format!(
                "token {} of document {} is already seated",
                i, j
            )));
        }
        let v = self.word(j, i);
        let restaurant = &mut self.restaurants[j];
        if t == 0 || !restaurant.active_tables.contains(t) {
            return Err(Error::Invariant(format!(
                "cannot seat at inactive table {} of document {}",
                t, j
            )));
        }
        self.token_table[j][i] = t;
        restaurant.table_word_count[t] += 1;
        *restaurant.table_word_histogram[t].entry(v).or_insert(0) += 1;
        let k = restaurant.table_dish[t];
        self.dish_counts.increment(k, v, 1)
    }

    /// Detaches table `t` of document `j` from its dish. The word counts
    /// stay with the old dish until the table is reseated, unless the dish
    /// dies, in which case the table is left unassigned.
    pub(crate) fn leave_dish(&mut self, j: usize, t: usize) -> Result<()> {
        let k = self.restaurants[j].table_dish[t];
        if self.release_table(k)? {
            self.restaurants[j].table_dish[t] = 0;
        }
        Ok(())
    }

    pub(crate) fn seat_at_dish(&mut self, j: usize, t: usize, k_new: usize) -> Result<()> {
        if k_new == 0 || !self.active_dishes.contains(k_new) {
            return Err(Error::Invariant(format!(
                "cannot serve inactive dish {}",
                k_new
            )));
        }
        self.n_tables += 1;
        self.tables_per_dish[k_new] += 1;
        let restaurant = &mut self.restaurants[j];
        let k_old = restaurant.table_dish[t];
        if k_new != k_old {
            restaurant.table_dish[t] = k_new;
            for (&v, &c) in &restaurant.table_word_histogram[t] {
                if k_old != 0 {
                    self.dish_counts.decrement(k_old, v, c)?;
                }
                self.dish_counts.increment(k_new, v, c)?;
            }
        }
        Ok(())
    }
}

fn decrement_histogram(
    histogram: &mut BTreeMap<usize, usize>,
    word: usize,
    count: usize,
) -> Result<()> {
    match histogram.get_mut(&word) {
        Some(n) if *n >= count => {
            *n -= count;
            if *n == 0 {
                histogram.remove(&word);
            }
            Ok(())
        }
        _ => Err(Error::Invariant(format!(
            "table count of word {} would become negative",
            word
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{assert_consistent, toy_state};

    #[test]
    fn test_initialize_leaves_tokens_unseated() {
        let state = toy_state();
        for j in 0..2 {
            for i in 0..3 {
                assert_eq!(state.table_of(j, i), 0);
            }
            assert_eq!(state.active_tables(j), &[0]);
        }
        assert_eq!(state.active_dishes(), &[0]);
        assert_eq!(state.n_tables(), 0);
        assert_consistent(&state);
    }

    #[test]
    fn test_initialize_rejects_bad_corpus() {
        let definition = ModelDefinition::new(2, 2).unwrap();
        let parameters = HdpParameters::new(1.0, 0.5, 1.0).unwrap();
        let corpus = Corpus::new(vec![vec![0, 0, 1], vec![1, 2, 2]]);
        let error = FranchiseState::initialize(definition, parameters, corpus).unwrap_err();
        assert!(error.is_configuration());
    }

    #[test]
    fn test_seat_and_leave() {
        let mut state = toy_state();
        let k = state.add_dish();
        let t = state.add_table(0, k).unwrap();
        state.seat_at_table(0, 0, t).unwrap();
        state.seat_at_table(0, 1, t).unwrap();
        assert_eq!(state.table_word_count(0, t), 2);
        assert_eq!(state.dish_counts().raw_word(k, 0), 2);
        assert_eq!(state.tables_per_dish(k), 1);
        assert_eq!(state.n_tables(), 1);
        assert_consistent(&state);

        state.leave_table(0, 0).unwrap();
        assert_eq!(state.table_of(0, 0), 0);
        assert_consistent(&state);
        state.leave_table(0, 1).unwrap();
        assert_eq!(state.active_tables(0), &[0]);
        assert_eq!(state.active_dishes(), &[0]);
        assert_eq!(state.n_tables(), 0);
        assert_consistent(&state);
    }

    #[test]
    fn test_dead_dish_id_is_reused() {
        let mut state = toy_state();
        let k1 = state.add_dish();
        let k2 = state.add_dish();
        let t1 = state.add_table(0, k1).unwrap();
        let t2 = state.add_table(1, k2).unwrap();
        state.seat_at_table(0, 0, t1).unwrap();
        state.seat_at_table(1, 0, t2).unwrap();
        state.leave_table(0, 0).unwrap();
        assert_eq!(state.active_dishes(), &[0, k2]);
        assert_eq!(state.add_dish(), k1);
        // the reused id starts from the smoothing baseline
        assert_eq!(state.dish_counts().raw_total(k1), 0);
    }

    #[test]
    fn test_move_table_between_dishes() {
        let mut state = toy_state();
        let k1 = state.add_dish();
        let k2 = state.add_dish();
        let t = state.add_table(1, k1).unwrap();
        let other = state.add_table(0, k2).unwrap();
        for i in 0..3 {
            state.seat_at_table(1, i, t).unwrap();
        }
        state.seat_at_table(0, 0, other).unwrap();
        state.leave_dish(1, t).unwrap();
        // k1 lost its only table, the table is unassigned
        assert_eq!(state.dish_of(1, t), 0);
        assert_eq!(state.active_dishes(), &[0, k2]);
        state.seat_at_dish(1, t, k2).unwrap();
        assert_eq!(state.dish_of(1, t), k2);
        assert_eq!(state.tables_per_dish(k2), 2);
        assert_eq!(state.dish_counts().raw_total(k2), 4);
        assert_eq!(state.dish_counts().raw_word(k2, 2), 2);
        assert_consistent(&state);
    }

    #[test]
    fn test_guards() {
        let mut state = toy_state();
        assert!(state.add_table(0, 3).unwrap_err().is_invariant());
        assert!(state.seat_at_table(0, 0, 1).unwrap_err().is_invariant());
        assert!(state.remove_dish(2).unwrap_err().is_invariant());
        assert!(state.seat_at_dish(0, 0, 0).unwrap_err().is_invariant());
    }
}
