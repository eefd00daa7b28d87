use crate::corpus::Corpus;
use crate::definition::ModelDefinition;
use crate::franchise::FranchiseState;
use crate::mcmc::seeded_rng;
use crate::posterior::TOLERANCE;
use crate::prelude::HdpParameters;

use rand::Rng;
use rand_distr::{Beta, Distribution};

pub fn toy_definition() -> ModelDefinition {
    ModelDefinition::new(2, 3).unwrap()
}

pub fn toy_parameters() -> HdpParameters {
    HdpParameters::new(1.0, 0.5, 1.0).unwrap()
}

/// Two documents, `[0, 0, 1]` and `[1, 2, 2]`, over a vocabulary of three.
pub fn toy_state() -> FranchiseState {
    let corpus = Corpus::new(vec![vec![0, 0, 1], vec![1, 2, 2]]);
    FranchiseState::initialize(toy_definition(), toy_parameters(), corpus).unwrap()
}

/// Documents mixing two topics with disjoint halves of a ten-word vocabulary.
/// Most documents lean heavily towards one topic.
pub fn synthetic_state(seed: u64) -> FranchiseState {
    let (n_documents, n_tokens, vocabulary_size) = (30, 40, 10);
    let half = vocabulary_size / 2;
    let mut rng = seeded_rng(seed);
    let mixing = Beta::new(0.2, 0.2).unwrap();
    let documents = (0..n_documents)
        .map(|_| {
            let p: f64 = mixing.sample(&mut rng);
            (0..n_tokens)
                .map(|_| {
                    let offset = if rng.random_bool(p) { 0 } else { half };
                    offset + rng.random_range(0..half)
                })
                .collect()
        })
        .collect();
    FranchiseState::initialize(
        ModelDefinition::new(n_documents, vocabulary_size).unwrap(),
        HdpParameters::new(1.0, 0.1, 1.0).unwrap(),
        Corpus::new(documents),
    )
    .unwrap()
}

pub fn assert_probability_vector(p: &[f64]) {
    assert!(
        p.iter().all(|x| x.is_finite() && *x >= 0.0),
        "Probabilities must be finite and non-negative: {:?}",
        p
    );
    let sum: f64 = p.iter().sum();
    assert!(
        (sum - 1.0).abs() <= TOLERANCE,
        "Total probability should be one, but is {}.",
        sum
    );
}

pub fn assert_consistent(state: &FranchiseState) {
    if let Err(e) = state.validate_consistency() {
        panic!("{}", e);
    }
}
