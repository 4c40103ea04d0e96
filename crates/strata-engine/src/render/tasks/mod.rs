//! Render task implementations.

mod quad;

pub use quad::{Quad, QuadTask};
