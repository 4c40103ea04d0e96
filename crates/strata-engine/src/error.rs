//! Configuration errors.
//!
//! These describe contract violations by the caller (bad layer index, missing
//! settings case, use before initialization). The engine surfaces them as
//! panics at its public boundary; they are typed here so resolvers can be
//! tested without unwinding.

/// A programming-time contract violation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("layer {index} has no settings case; add one before enqueueing work on it")]
    UnsupportedLayer { index: usize },

    #[error("layer index {index} is out of range (layer count is {count})")]
    LayerOutOfRange { index: usize, count: usize },

    #[error("render engine used before initialize()")]
    NotInitialized,
}
