//! Layer table types.
//!
//! Responsibilities:
//! - name the fixed set of layer slots (`LayerId`, `LAYER_COUNT`)
//! - store per-layer task sequences in insertion order (`Layer`)

mod id;
mod list;

pub use id::{LAYER_COUNT, LayerId, LayerRole};
pub use list::Layer;
