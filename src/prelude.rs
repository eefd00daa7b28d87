use crate::error::{Error, Result};
use core::ops::{Add, Div, Mul};
use serde::{Deserialize, Serialize};

macro_rules! constrained_f64 {
    ( $name:ident, $closure:tt ) => {
        #[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $name(f64);

        impl $name {
            pub fn new(x: f64) -> Result<Self> {
                if ($closure)(x) {
                    Ok(Self(x))
                } else {
                    Err(Error::NonFiniteHyperparameter {
                        name: stringify!($name),
                        value: x,
                    })
                }
            }

            pub fn value(self) -> f64 {
                self.0
            }

            pub fn ln(self) -> f64 {
                self.0.ln()
            }
        }

        impl Add<f64> for $name {
            type Output = f64;

            fn add(self, other: f64) -> f64 {
                self.0 + other
            }
        }

        impl Add<$name> for f64 {
            type Output = f64;

            fn add(self, other: $name) -> f64 {
                self + other.0
            }
        }

        impl Mul<f64> for $name {
            type Output = f64;

            fn mul(self, other: f64) -> f64 {
                self.0 * other
            }
        }

        impl Mul<$name> for f64 {
            type Output = f64;

            fn mul(self, other: $name) -> f64 {
                self * other.0
            }
        }

        impl Div<f64> for $name {
            type Output = f64;

            fn div(self, other: f64) -> f64 {
                self.0 / other
            }
        }

        impl Div<$name> for f64 {
            type Output = f64;

            fn div(self, other: $name) -> f64 {
                self / other.0
            }
        }
    };
}

// Non-positive values are accepted here and surface as numerical faults
// once the sampler evaluates weights with them.
constrained_f64!(Concentration, (|x: f64| x.is_finite()));

constrained_f64!(Smoothing, (|x: f64| x.is_finite()));

/// Hyperparameters of the HDP: `alpha` is the table-level concentration,
/// `beta` the symmetric Dirichlet smoothing of each dish's word
/// distribution, and `gamma` the dish-level concentration.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct HdpParameters {
    pub alpha: Concentration,
    pub beta: Smoothing,
    pub gamma: Concentration,
}

impl HdpParameters {
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Result<Self> {
        Ok(Self::new_with(
            Concentration::new(alpha)?,
            Smoothing::new(beta)?,
            Concentration::new(gamma)?,
        ))
    }

    pub fn new_with(alpha: Concentration, beta: Smoothing, gamma: Concentration) -> Self {
        Self { alpha, beta, gamma }
    }
}
