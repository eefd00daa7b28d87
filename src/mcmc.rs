// Gibbs updates for the Chinese restaurant franchise

use crate::error::Result;
use crate::franchise::FranchiseState;
use crate::posterior::{
    dish_affinity, dish_posterior_for_table, dish_posterior_for_word, sample_categorical,
    table_posterior,
};

use log::{debug, info, log_enabled, Level};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// Random stream for one chain. Independent chains should use distinct seeds.
pub fn seeded_rng(seed: u64) -> Pcg64Mcg {
    Pcg64Mcg::seed_from_u64(seed)
}

impl FranchiseState {
    /// Reseats token `i` of document `j`, possibly at a new table serving
    /// a possibly new dish.
    pub fn sample_table<R: Rng + ?Sized>(&mut self, j: usize, i: usize, rng: &mut R) -> Result<()> {
        self.leave_table(j, i)?;
        let f = dish_affinity(self, self.word(j, i));
        let p_t = table_posterior(self, j, &f)?;
        let mut t = self.restaurants[j].active_tables[sample_categorical(&p_t, rng)?];
        if t == 0 {
            let p_k = dish_posterior_for_word(self, &f)?;
            let mut k = self.active_dishes[sample_categorical(&p_k, rng)?];
            if k == 0 {
                k = self.add_dish();
            }
            t = self.add_table(j, k)?;
        }
        self.seat_at_table(j, i, t)
    }

    /// Reassigns the dish of table `t` in document `j`, moving all of the
    /// table's tokens at once.
    pub fn sample_dish<R: Rng + ?Sized>(&mut self, j: usize, t: usize, rng: &mut R) -> Result<()> {
        self.leave_dish(j, t)?;
        let p_k = dish_posterior_for_table(self, j, t)?;
        let mut k = self.active_dishes[sample_categorical(&p_k, rng)?];
        if k == 0 {
            k = self.add_dish();
        }
        self.seat_at_dish(j, t, k)
    }

    /// One sweep: every token in corpus order, then every active table.
    pub fn inference<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        for j in 0..self.token_table.len() {
            for i in 0..self.token_table[j].len() {
                self.sample_table(j, i, rng)?;
            }
        }
        for j in 0..self.restaurants.len() {
            let tables: Vec<usize> = self.restaurants[j].active_tables.allocated().collect();
            for t in tables {
                self.sample_dish(j, t, rng)?;
            }
        }
        Ok(())
    }
}

/// Runs `n_sweeps` sweeps. Debug builds check every bookkeeping invariant
/// after each sweep.
pub fn run<R: Rng + ?Sized>(state: &mut FranchiseState, n_sweeps: usize, rng: &mut R) -> Result<()> {
    for sweep in 0..n_sweeps {
        state.inference(rng)?;
        if cfg!(debug_assertions) {
            state.validate_consistency()?;
        }
        if log_enabled!(Level::Debug) {
            debug!(
                "sweep {}: {} dishes, {} tables, perplexity {:.4}",
                sweep + 1,
                state.used_dishes(),
                state.n_tables(),
                state.perplexity()
            );
        }
    }
    info!(
        "finished {} sweeps with {} dishes over {} tables",
        n_sweeps,
        state.used_dishes(),
        state.n_tables()
    );
    Ok(())
}
