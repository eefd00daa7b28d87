pub mod assign;
pub mod corpus;
pub mod definition;
pub mod diagnostics;
pub mod error;
pub mod franchise;
pub mod ids;
pub mod mcmc;
pub mod posterior;
pub mod prelude;
pub mod pseudo;
#[cfg(test)]
mod testing;

pub use corpus::Corpus;
pub use definition::ModelDefinition;
pub use error::{Error, Result};
pub use franchise::FranchiseState;
pub use prelude::HdpParameters;
