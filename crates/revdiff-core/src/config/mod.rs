//! Configuration of derivative queries and validation.

pub mod propagation;

// Re-export key items
pub use propagation::{
    PropagationConfig, PropagationConfigBuilder, PropagationStrategy, ValidationConfig,
};
