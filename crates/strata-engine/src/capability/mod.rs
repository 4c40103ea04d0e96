//! Backend capability negotiation.
//!
//! The graphics driver reports a version string once at startup. It is parsed
//! into a [`DriverVersion`] and mapped onto a [`CapabilityLevel`] tier that every
//! render task receives. Detection failures never abort startup; they degrade
//! to [`CapabilityLevel::Baseline`].

mod level;
mod version;

pub use level::CapabilityLevel;
pub use version::{DriverVersion, VersionParseError};
