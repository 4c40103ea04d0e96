use super::DriverVersion;

/// Backend feature tier negotiated from the driver version.
///
/// Ordered from least to most capable, so tasks can gate features with
/// `capability >= CapabilityLevel::Core`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub enum CapabilityLevel {
    /// Anything older than 2.1, or a driver we could not identify.
    #[default]
    Baseline,
    /// 2.1 and later 2.x: programmable shaders.
    Shader,
    /// 3.0 to 3.2: framebuffer objects, vertex array objects.
    Framebuffer,
    /// 3.3 to 4.2: core profile, instancing.
    Core,
    /// 4.3 and later: compute and storage buffers.
    Compute,
}

impl CapabilityLevel {
    /// Tier used when detection fails.
    pub const LOWEST: Self = Self::Baseline;

    pub const fn from_version(version: DriverVersion) -> Self {
        match (version.major, version.minor) {
            (0 | 1, _) | (2, 0) => Self::Baseline,
            (2, _) => Self::Shader,
            (3, 0..=2) => Self::Framebuffer,
            (3, _) | (4, 0..=2) => Self::Core,
            _ => Self::Compute,
        }
    }

    /// Maps the raw driver version string onto a tier.
    ///
    /// A missing or unparsable string is logged and yields [`Self::LOWEST`].
    pub fn negotiate(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            log::warn!("graphics driver reported no version; using {:?}", Self::LOWEST);
            return Self::LOWEST;
        };

        match DriverVersion::parse(raw) {
            Ok(version) => {
                let level = Self::from_version(version);
                log::info!("driver version {version} ({raw:?}) -> {level:?}");
                level
            }
            Err(err) => {
                log::warn!("{err}; using {:?}", Self::LOWEST);
                Self::LOWEST
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(major: u32, minor: u32) -> CapabilityLevel {
        CapabilityLevel::from_version(DriverVersion::new(major, minor))
    }

    #[test]
    fn tiers_follow_version_boundaries() {
        assert_eq!(level(1, 5), CapabilityLevel::Baseline);
        assert_eq!(level(2, 0), CapabilityLevel::Baseline);
        assert_eq!(level(2, 1), CapabilityLevel::Shader);
        assert_eq!(level(3, 0), CapabilityLevel::Framebuffer);
        assert_eq!(level(3, 2), CapabilityLevel::Framebuffer);
        assert_eq!(level(3, 3), CapabilityLevel::Core);
        assert_eq!(level(4, 2), CapabilityLevel::Core);
        assert_eq!(level(4, 3), CapabilityLevel::Compute);
        assert_eq!(level(4, 6), CapabilityLevel::Compute);
    }

    #[test]
    fn tiers_are_ordered() {
        assert!(CapabilityLevel::Baseline < CapabilityLevel::Shader);
        assert!(CapabilityLevel::Core < CapabilityLevel::Compute);
    }

    #[test]
    fn negotiate_parses_vendor_string() {
        assert_eq!(
            CapabilityLevel::negotiate(Some("4.6.0 NVIDIA 535.54.03")),
            CapabilityLevel::Compute
        );
    }

    #[test]
    fn negotiate_falls_back_when_absent() {
        assert_eq!(CapabilityLevel::negotiate(None), CapabilityLevel::LOWEST);
    }

    #[test]
    fn negotiate_falls_back_when_unparsable() {
        assert_eq!(CapabilityLevel::negotiate(Some("Mesa Intel(R) UHD")), CapabilityLevel::LOWEST);
        assert_eq!(CapabilityLevel::negotiate(Some("")), CapabilityLevel::LOWEST);
    }

    #[test]
    fn default_is_lowest() {
        assert_eq!(CapabilityLevel::default(), CapabilityLevel::LOWEST);
    }
}
