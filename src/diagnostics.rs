// Summaries of the current state: topic distributions, perplexity and
// bookkeeping checks

use crate::error::{Error, Result};
use crate::franchise::FranchiseState;

impl FranchiseState {
    pub fn used_dishes(&self) -> usize {
        self.active_dishes.len() - 1
    }

    /// Smoothed word distribution of every active dish, in dish id order.
    pub fn word_distribution(&self) -> Vec<Vec<f64>> {
        self.active_dishes
            .allocated()
            .map(|k| self.dish_word_distribution(k))
            .collect()
    }

    fn dish_word_distribution(&self, k: usize) -> Vec<f64> {
        let counts = &self.dish_counts;
        let total = counts.total(k);
        (0..self.vocabulary_size())
            .map(|v| counts.word(k, v) / total)
            .collect()
    }

    /// Per document, a distribution over the active dishes (sentinel
    /// first). The franchise-level table counts, with `gamma` standing in
    /// for the sentinel, are scaled to total `alpha` and added to the
    /// document's own token counts per dish.
    pub fn document_distribution(&self) -> Vec<Vec<f64>> {
        let p = &self.parameters;
        let dishes = self.active_dishes.as_slice();
        let scale = p.alpha / (p.gamma + self.n_tables as f64);
        let prior: Vec<f64> = dishes
            .iter()
            .map(|&k| {
                if k == 0 {
                    scale * p.gamma.value()
                } else {
                    scale * self.tables_per_dish[k] as f64
                }
            })
            .collect();
        self.restaurants
            .iter()
            .map(|restaurant| {
                let mut theta = prior.clone();
                for t in restaurant.active_tables.allocated() {
                    let k = restaurant.table_dish[t];
                    if let Ok(position) = dishes.binary_search(&k) {
                        theta[position] += restaurant.table_word_count[t] as f64;
                    }
                }
                let sum: f64 = theta.iter().sum();
                theta.iter_mut().for_each(|x| *x /= sum);
                theta
            })
            .collect()
    }

    /// `exp` of the average negative log predictive probability of each
    /// token under the current document and dish distributions. A new dish
    /// predicts uniformly. An empty corpus has perplexity one.
    pub fn perplexity(&self) -> f64 {
        let uniform = vec![1.0 / self.vocabulary_size() as f64; self.vocabulary_size()];
        let mut phi = vec![uniform];
        phi.extend(self.word_distribution());
        let theta = self.document_distribution();
        let mut neg_log_likelihood = 0.0;
        let mut n_tokens = 0;
        for (words, theta_j) in self.corpus.documents().iter().zip(theta.iter()) {
            for &v in words {
                let p: f64 = theta_j
                    .iter()
                    .zip(phi.iter())
                    .map(|(theta_jk, phi_k)| theta_jk * phi_k[v])
                    .sum();
                neg_log_likelihood -= p.ln();
            }
            n_tokens += words.len();
        }
        if n_tokens == 0 {
            return 1.0;
        }
        (neg_log_likelihood / n_tokens as f64).exp()
    }

    pub fn validate_consistency(&self) -> Result<()> {
        let fail = |message: String| Err(Error::Invariant(message));
        if self.active_dishes.as_slice().first() != Some(&0) {
            return fail("sentinel dish is missing".into());
        }
        let n_slots = self.active_dishes.max_id() + 1;
        let mut expected_tables = vec![0; n_slots];
        let mut expected_words = vec![0; n_slots];

        for (j, restaurant) in self.restaurants.iter().enumerate() {
            if restaurant.active_tables.as_slice().first() != Some(&0) {
                return fail(format!("sentinel table is missing in document {}", j));
            }
            let mut seated = vec![0; restaurant.table_word_count.len()];
            for (i, &t) in self.token_table[j].iter().enumerate() {
                if t == 0 {
                    continue;
                }
                if !restaurant.active_tables.contains(t) {
                    return fail(format!(
                        "token {} of document {} sits at inactive table {}",
                        i, j, t
                    ));
                }
                seated[t] += 1;
            }
            for t in restaurant.active_tables.allocated() {
                let k = restaurant.table_dish[t];
                let n = restaurant.table_word_count[t];
                if k == 0 || !self.active_dishes.contains(k) || self.tables_per_dish[k] == 0 {
                    return fail(format!(
                        "table {} of document {} serves inactive dish {}",
                        t, j, k
                    ));
                }
                if n == 0 || n != seated[t] {
                    return fail(format!(
                        "table {} of document {} counts {} tokens but seats {}",
                        t, j, n, seated[t]
                    ));
                }
                if restaurant.table_word_histogram[t].values().sum::<usize>() != n {
                    return fail(format!(
                        "word histogram of table {} in document {} disagrees with its count",
                        t, j
                    ));
                }
                expected_tables[k] += 1;
                expected_words[k] += n;
            }
        }

        let counts = &self.dish_counts;
        let mut n_tables = 0;
        for k in self.active_dishes.allocated() {
            if self.tables_per_dish[k] != expected_tables[k] {
                return fail(format!(
                    "dish {} records {} tables but serves {}",
                    k, self.tables_per_dish[k], expected_tables[k]
                ));
            }
            if counts.raw_total(k) != expected_words[k] {
                return fail(format!(
                    "dish {} records {} words but its tables hold {}",
                    k,
                    counts.raw_total(k),
                    expected_words[k]
                ));
            }
            // sum over the vocabulary of smoothed word counts
            let observed: usize = counts.raw_words(k).map(|(_, c)| c).sum();
            let word_sum = observed as f64 + counts.total_baseline();
            let total = counts.total(k);
            if (word_sum - total).abs() > 1e-9 * total.abs().max(1.0) {
                return fail(format!(
                    "dish {} word counts sum to {} but its total is {}",
                    k, word_sum, total
                ));
            }
            n_tables += self.tables_per_dish[k];
        }
        if n_tables != self.n_tables {
            return fail(format!(
                "dishes serve {} tables but {} are recorded",
                n_tables, self.n_tables
            ));
        }
        Ok(())
    }
}
