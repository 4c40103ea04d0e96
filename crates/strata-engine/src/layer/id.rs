use core::fmt;

use crate::error::ConfigError;

/// Number of layer slots. Fixed for the lifetime of the process.
pub const LAYER_COUNT: usize = 5;

/// Index into the engine's layer table.
///
/// Layers are composited bottom-to-top by index: lower indices flush first.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct LayerId(usize);

/// Projection semantics of a layer slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum LayerRole {
    /// World geometry seen through the camera.
    CameraView,
    /// Screen-facing elements anchored in world space (billboards, name tags).
    Pseudo2d,
    /// Screen-pixel overlay.
    Hud,
}

impl LayerId {
    pub const CAMERA_VIEW: Self = Self(0);
    pub const PSEUDO_2D: Self = Self(1);
    pub const HUD: Self = Self(2);

    /// Slots kept free for future layer roles. They have no settings case yet.
    pub const RESERVED: [Self; 2] = [Self(3), Self(4)];

    /// Wraps a raw index without validating it.
    ///
    /// Out-of-range ids are rejected when they reach the engine.
    #[inline]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Wraps a raw index, rejecting anything outside `0..LAYER_COUNT`.
    pub const fn checked(index: usize) -> Result<Self, ConfigError> {
        if index < LAYER_COUNT {
            Ok(Self(index))
        } else {
            Err(ConfigError::LayerOutOfRange {
                index,
                count: LAYER_COUNT,
            })
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }

    /// Returns the role of this slot, or `None` for reserved and out-of-range slots.
    pub const fn role(self) -> Option<LayerRole> {
        match self.0 {
            0 => Some(LayerRole::CameraView),
            1 => Some(LayerRole::Pseudo2d),
            2 => Some(LayerRole::Hud),
            _ => None,
        }
    }

    /// All slots in flush order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..LAYER_COUNT).map(Self)
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.role() {
            Some(role) => write!(f, "layer {} ({role:?})", self.0),
            None => write!(f, "layer {}", self.0),
        }
    }
}
