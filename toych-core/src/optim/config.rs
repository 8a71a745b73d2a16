use super::{Adam, Optimizer, Sgd};
use crate::error::{Result, ToychError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Penalty applied to a parameter after its update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regularization {
    /// `p -= lr·λ·sign(p)`
    L1,
    /// `p -= lr·λ·p`
    L2,
}

impl FromStr for Regularization {
    type Err = ToychError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "l1" | "lasso" => Ok(Regularization::L1),
            "l2" | "ridge" => Ok(Regularization::L2),
            other => Err(ToychError::ConfigurationError(format!(
                "unknown regularization '{}'",
                other
            ))),
        }
    }
}

/// Settings shared by every optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    pub lr: f64,
    pub regularization: Option<Regularization>,
    /// Regularization strength λ.
    pub lambda: f64,
    /// Largest gradient magnitude allowed before the update; larger gradients are scaled down.
    pub grad_lim: Option<f64>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig {
            lr: 1e-3,
            regularization: None,
            lambda: 2e-3,
            grad_lim: None,
        }
    }
}

impl OptimizerConfig {
    pub fn with_lr(lr: f64) -> Self {
        OptimizerConfig {
            lr,
            ..OptimizerConfig::default()
        }
    }

    /// # Errors
    /// `ConfigurationError` for a non-positive learning rate or gradient limit, or a
    /// negative λ.
    pub fn validate(&self) -> Result<()> {
        if !(self.lr.is_finite() && self.lr > 0.0) {
            return Err(ToychError::ConfigurationError(format!(
                "learning rate must be positive, got {}",
                self.lr
            )));
        }
        if !(self.lambda.is_finite() && self.lambda >= 0.0) {
            return Err(ToychError::ConfigurationError(format!(
                "regularization lambda must be non-negative, got {}",
                self.lambda
            )));
        }
        if let Some(lim) = self.grad_lim {
            if !(lim.is_finite() && lim > 0.0) {
                return Err(ToychError::ConfigurationError(format!(
                    "gradient limit must be positive, got {}",
                    lim
                )));
            }
        }
        Ok(())
    }
}

/// Optimizer selected by name once, at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OptimizerKind {
    Sgd,
    #[default]
    Adam,
}

impl OptimizerKind {
    /// An optimizer of this kind with default rule hyperparameters.
    pub fn build(&self, config: OptimizerConfig) -> Result<Box<dyn Optimizer>> {
        Ok(match self {
            OptimizerKind::Sgd => Box::new(Sgd::new(config)?),
            OptimizerKind::Adam => Box::new(Adam::new(config)?),
        })
    }
}

impl FromStr for OptimizerKind {
    type Err = ToychError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sgd" => Ok(OptimizerKind::Sgd),
            "adam" => Ok(OptimizerKind::Adam),
            other => Err(ToychError::ConfigurationError(format!(
                "unknown optimizer '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OptimizerKind::Sgd => "sgd",
            OptimizerKind::Adam => "adam",
        })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
