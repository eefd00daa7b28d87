// Seating snapshots and reconstruction from explicit assignments

use crate::corpus::Corpus;
use crate::definition::ModelDefinition;
use crate::error::{Error, Result};
use crate::franchise::FranchiseState;
use crate::prelude::HdpParameters;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Table of every token, by document then position (`0` = unseated).
pub type TableAssignments = Vec<Vec<usize>>;

/// Dish of every active table, by document.
pub type DishAssignments = Vec<BTreeMap<usize, usize>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tables: TableAssignments,
    pub dishes: DishAssignments,
}

impl FranchiseState {
    pub fn table_assignments(&self) -> TableAssignments {
        self.token_table.clone()
    }

    pub fn dish_assignments(&self) -> DishAssignments {
        self.restaurants
            .iter()
            .map(|r| {
                r.active_tables
                    .allocated()
                    .map(|t| (t, r.table_dish[t]))
                    .collect()
            })
            .collect()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tables: self.table_assignments(),
            dishes: self.dish_assignments(),
        }
    }

    /// Rebuilds a state from explicit assignments, keeping their table and
    /// dish ids. Every table listed must seat at least one token and every
    /// seated token must sit at a listed table.
    pub fn from_assignments(
        definition: ModelDefinition,
        parameters: HdpParameters,
        corpus: Corpus,
        tables: &[Vec<usize>],
        dishes: &[BTreeMap<usize, usize>],
    ) -> Result<Self> {
        let mut state = Self::initialize(definition, parameters, corpus)?;
        let n = state.definition.n_documents();
        if tables.len() != n || dishes.len() != n {
            return Err(Error::InvalidAssignment(format!(
                "expected assignments for {} documents, found {} table and {} dish lists",
                n,
                tables.len(),
                dishes.len()
            )));
        }
        // Every listed table seats a token and every dish serves a table,
        // which bounds the ids a valid snapshot can use.
        let max_dish = dishes.iter().map(|d| d.len()).sum();
        for (j, restaurant_dishes) in dishes.iter().enumerate() {
            let max_table = state.token_table[j].len();
            for (&t, &k) in restaurant_dishes {
                if t > max_table || k > max_dish {
                    return Err(Error::InvalidAssignment(format!(
                        "table {} of document {} serving dish {} exceeds the ids this snapshot can use",
                        t, j, k
                    )));
                }
                state.insert_table(j, t, k)?;
            }
        }
        for (j, restaurant_tables) in tables.iter().enumerate() {
            if restaurant_tables.len() != state.token_table[j].len() {
                return Err(Error::InvalidAssignment(format!(
                    "document {} has {} tokens but {} table assignments",
                    j,
                    state.token_table[j].len(),
                    restaurant_tables.len()
                )));
            }
            for (i, &t) in restaurant_tables.iter().enumerate() {
                if t == 0 {
                    continue;
                }
                if !state.restaurants[j].active_tables.contains(t) {
                    return Err(Error::InvalidAssignment(format!(
                        "token {} of document {} sits at unlisted table {}",
                        i, j, t
                    )));
                }
                state.seat_at_table(j, i, t)?;
            }
        }
        for (j, restaurant) in state.restaurants.iter().enumerate() {
            if let Some(t) = restaurant
                .active_tables
                .allocated()
                .find(|&t| restaurant.table_word_count[t] == 0)
            {
                return Err(Error::InvalidAssignment(format!(
                    "table {} of document {} seats no tokens",
                    t, j
                )));
            }
        }
        state.validate_consistency()?;
        Ok(state)
    }

    pub fn from_snapshot(
        definition: ModelDefinition,
        parameters: HdpParameters,
        corpus: Corpus,
        snapshot: &Snapshot,
    ) -> Result<Self> {
        Self::from_assignments(
            definition,
            parameters,
            corpus,
            &snapshot.tables,
            &snapshot.dishes,
        )
    }

    fn insert_table(&mut self, j: usize, t: usize, k: usize) -> Result<()> {
        if t == 0 || k == 0 {
            return Err(Error::InvalidAssignment(format!(
                "table {} of document {} uses a reserved id",
                t, j
            )));
        }
        if self.active_dishes.insert(k) && k >= self.tables_per_dish.len() {
            self.tables_per_dish.resize(k + 1, 0);
        }
        let restaurant = &mut self.restaurants[j];
        if !restaurant.active_tables.insert(t) {
            return Err(Error::InvalidAssignment(format!(
                "table {} of document {} is listed twice",
                t, j
            )));
        }
        restaurant.ensure_slot(t);
        restaurant.table_dish[t] = k;
        self.tables_per_dish[k] += 1;
        self.n_tables += 1;
        Ok(())
    }
}
