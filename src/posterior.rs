// Full conditionals for table and dish assignments

use crate::error::{Error, Result};
use crate::franchise::FranchiseState;

use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::Rng;
use statrs::function::gamma::ln_gamma;

/// Allowed deviation of a normalized probability vector's sum from one.
pub const TOLERANCE: f64 = 1e-4;

/// `f_k = n_kv / n_k` for every active dish, indexed by dish id. The
/// sentinel and inactive ids get `0`.
pub(crate) fn dish_affinity(state: &FranchiseState, word: usize) -> Vec<f64> {
    let counts = &state.dish_counts;
    let mut f = vec![0.0; state.active_dishes.max_id() + 1];
    for k in state.active_dishes.allocated() {
        f[k] = counts.word(k, word) / counts.total(k);
    }
    f
}

/// Probability of each active table of document `j` (in registry order)
/// for a token whose word has dish affinities `f`. The sentinel's weight
/// is the marginal probability of the word under a new table.
pub(crate) fn table_posterior(state: &FranchiseState, j: usize, f: &[f64]) -> Result<Vec<f64>> {
    let p = &state.parameters;
    let v = state.vocabulary_size() as f64;
    let restaurant = &state.restaurants[j];
    let mut marginal = p.gamma / v;
    for k in state.active_dishes.allocated() {
        marginal += state.tables_per_dish[k] as f64 * f[k];
    }
    let new_table = p.alpha * marginal / (p.gamma + state.n_tables as f64);
    let weights = restaurant
        .active_tables
        .iter()
        .map(|t| {
            if t == 0 {
                return Ok(new_table);
            }
            let k = restaurant.table_dish[t];
            if k == 0 || !state.active_dishes.contains(k) {
                return Err(Error::Invariant(format!(
                    "table {} of document {} serves inactive dish {}",
                    t, j, k
                )));
            }
            Ok(restaurant.table_word_count[t] as f64 * f[k])
        })
        .collect::<Result<Vec<_>>>()?;
    normalize(weights)
}

/// Probability of each active dish (in registry order) for a new table
/// holding a single word with dish affinities `f`.
pub(crate) fn dish_posterior_for_word(state: &FranchiseState, f: &[f64]) -> Result<Vec<f64>> {
    let p = &state.parameters;
    let v = state.vocabulary_size() as f64;
    let weights = state
        .active_dishes
        .iter()
        .map(|k| {
            if k == 0 {
                p.gamma / v
            } else {
                state.tables_per_dish[k] as f64 * f[k]
            }
        })
        .collect();
    normalize(weights)
}

/// Probability of each active dish (in registry order) for table `t` of
/// document `j`, which must already have left its dish. All of the
/// table's words move together, so each weight is a ratio of Dirichlet
/// multinomial normalizers rather than a single-word predictive.
pub(crate) fn dish_posterior_for_table(
    state: &FranchiseState,
    j: usize,
    t: usize,
) -> Result<Vec<f64>> {
    let p = &state.parameters;
    let counts = &state.dish_counts;
    let restaurant = &state.restaurants[j];
    let k_old = restaurant.table_dish[t];
    let n_t = restaurant.table_word_count[t] as f64;
    let histogram = &restaurant.table_word_histogram[t];
    let v_beta = counts.total_baseline();
    let beta = counts.word_baseline();

    let log_weights = state
        .active_dishes
        .iter()
        .map(|k| {
            if k == 0 {
                let mut lw = p.gamma.ln() + ln_gamma(v_beta) - ln_gamma(v_beta + n_t);
                for &c in histogram.values() {
                    let c = c as f64;
                    lw += ln_gamma(beta + c) - ln_gamma(beta);
                }
                return lw;
            }
            let own = k == k_old;
            let n_k = counts.total(k) - if own { n_t } else { 0.0 };
            let mut lw =
                (state.tables_per_dish[k] as f64).ln() + ln_gamma(n_k) - ln_gamma(n_k + n_t);
            for (&w, &c) in histogram {
                let c = c as f64;
                let n_kw = counts.word(k, w) - if own { c } else { 0.0 };
                lw += ln_gamma(n_kw + c) - ln_gamma(n_kw);
            }
            lw
        })
        .collect();
    normalize_log(log_weights)
}

pub fn normalize(mut weights: Vec<f64>) -> Result<Vec<f64>> {
    if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(Error::Numeric(format!(
            "weight {} is negative or not finite",
            w
        )));
    }
    let sum: f64 = weights.iter().sum();
    if !(sum > 0.0 && sum.is_finite()) {
        return Err(Error::Numeric(format!("weights sum to {}", sum)));
    }
    for w in weights.iter_mut() {
        *w /= sum;
    }
    check_probabilities(&weights)?;
    Ok(weights)
}

/// Exponentiates log weights relative to their maximum and normalizes.
pub fn normalize_log(log_weights: Vec<f64>) -> Result<Vec<f64>> {
    if let Some(lw) = log_weights.iter().find(|lw| !lw.is_finite()) {
        return Err(Error::Numeric(format!("log weight {} is not finite", lw)));
    }
    let max = log_weights.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    normalize(log_weights.into_iter().map(|lw| (lw - max).exp()).collect())
}

fn check_probabilities(p: &[f64]) -> Result<()> {
    let sum: f64 = p.iter().sum();
    if (sum - 1.0).abs() > TOLERANCE {
        return Err(Error::Invariant(format!(
            "probabilities sum to {} rather than one",
            sum
        )));
    }
    Ok(())
}

pub fn sample_categorical<R: Rng + ?Sized>(probabilities: &[f64], rng: &mut R) -> Result<usize> {
    let dist = WeightedIndex::<f64>::new(probabilities).map_err(|e| {
        Error::Invariant(format!(
            "cannot sample from {:?}: {}",
            probabilities, e
        ))
    })?;
    Ok(dist.sample(rng))
}
