//! Runtime configuration for derivative propagation.
//!
//! The defaults reproduce the plain recursive reverse pass. The builder lets
//! callers opt into the poison guard, the associative-chain rewrite and the
//! single-visit topological strategy.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::core::error::{AutodiffError, Result};

/// How the numeric reverse pass walks the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PropagationStrategy {
    /// Recurse from the output, revisiting shared nodes once per path.
    #[default]
    Recursive,
    /// Visit every reachable node once, parents before operands.
    Topological,
}

/// Configuration of a numeric derivative query.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PropagationConfig {
    /// Skip propagation entirely when the output value is poisoned.
    pub skip_poisoned: bool,
    /// Flatten associative chains of the output before propagating.
    pub rewrite_before: bool,
    /// Traversal strategy of the numeric pass.
    pub strategy: PropagationStrategy,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            skip_poisoned: false,
            rewrite_before: false,
            strategy: PropagationStrategy::Recursive,
        }
    }
}

impl PropagationConfig {
    /// Configuration used by training loops: guard against blown-up losses,
    /// flatten long sums and visit shared nodes once.
    pub fn training() -> Self {
        Self {
            skip_poisoned: true,
            rewrite_before: true,
            strategy: PropagationStrategy::Topological,
        }
    }

    /// Returns a builder starting from the default configuration.
    pub fn builder() -> PropagationConfigBuilder {
        PropagationConfigBuilder::new()
    }
}

/// Builder for creating a custom propagation configuration.
#[derive(Debug, Clone, Default)]
pub struct PropagationConfigBuilder {
    config: PropagationConfig,
}

impl PropagationConfigBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: PropagationConfig::default(),
        }
    }

    /// Enable or disable the poison guard.
    pub fn skip_poisoned(mut self, skip: bool) -> Self {
        self.config.skip_poisoned = skip;
        self
    }

    /// Enable or disable the rewrite pass before propagation.
    pub fn rewrite_before(mut self, rewrite: bool) -> Self {
        self.config.rewrite_before = rewrite;
        self
    }

    /// Select the traversal strategy.
    pub fn strategy(mut self, strategy: PropagationStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> PropagationConfig {
        self.config
    }
}

/// Configuration for finite-difference validation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ValidationConfig {
    /// Step size of the central difference.
    pub step: f64,
    /// Maximum accepted relative error.
    pub tolerance: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            step: 1e-6,
            tolerance: 1e-6,
        }
    }
}

impl ValidationConfig {
    /// Creates a validation configuration.
    pub fn new(step: f64, tolerance: f64) -> Self {
        Self { step, tolerance }
    }

    /// Checks that the step and tolerance are positive and finite.
    pub fn validate(&self) -> Result<()> {
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(AutodiffError::invalid_parameter(format!(
                "finite-difference step must be positive and finite, got {}",
                self.step
            )));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(AutodiffError::invalid_parameter(format!(
                "tolerance must be positive and finite, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}
