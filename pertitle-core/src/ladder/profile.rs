// ============================================================================
// pertitle-core/src/ladder/profile.rs
// ============================================================================
//
// ENCODING PROFILE: One Rendition Tier of the Ladder
//
// An encoding profile describes a single rendition: its resolution, the
// default (un-optimized) bitrate, the bitrate bounds an optimizer must stay
// within, and whether the tier may be dropped from an optimized ladder.
//
// The scale factor ("bitrate factor") relates the profile to the top tier of
// the ladder it is attached to. It is only meaningful after attachment and is
// recomputed every time the owning ladder is (re)assembled.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::media::Resolution;

/// A single rendition tier.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodingProfile {
    width: u32,
    height: u32,
    bitrate_default: u64,
    bitrate_min: u64,
    bitrate_max: u64,
    required: bool,
    bitrate_step: Option<u64>,
    scale_factor: Option<f64>,
}

impl EncodingProfile {
    /// Creates a profile.
    ///
    /// A `bitrate_min` above the default or a `bitrate_max` below it is
    /// clamped to `bitrate_default` instead of being rejected. Zero
    /// dimensions, a zero default bitrate or a zero step are configuration
    /// errors.
    pub fn new(
        width: u32,
        height: u32,
        bitrate_default: u64,
        bitrate_min: u64,
        bitrate_max: u64,
        required: bool,
        bitrate_step: Option<u64>,
    ) -> CoreResult<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::Configuration(format!(
                "Encoding profile resolution must be positive, got {width}x{height}"
            )));
        }
        if bitrate_default == 0 {
            return Err(CoreError::Configuration(format!(
                "Encoding profile {width}x{height} has a zero default bitrate"
            )));
        }
        if bitrate_step == Some(0) {
            return Err(CoreError::Configuration(format!(
                "Encoding profile {width}x{height} has a zero bitrate step"
            )));
        }

        Ok(Self {
            width,
            height,
            bitrate_default,
            bitrate_min: if bitrate_min <= bitrate_default { bitrate_min } else { bitrate_default },
            bitrate_max: if bitrate_max >= bitrate_default { bitrate_max } else { bitrate_default },
            required,
            bitrate_step,
            scale_factor: None,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    pub fn bitrate_default(&self) -> u64 {
        self.bitrate_default
    }

    pub fn bitrate_min(&self) -> u64 {
        self.bitrate_min
    }

    pub fn bitrate_max(&self) -> u64 {
        self.bitrate_max
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn bitrate_step(&self) -> Option<u64> {
        self.bitrate_step
    }

    /// `ladder_max_bitrate_default / bitrate_default`, or `None` before the
    /// profile has been attached to a ladder.
    pub fn scale_factor(&self) -> Option<f64> {
        self.scale_factor
    }

    /// Sets the scale factor from the maximum default bitrate of the ladder.
    pub fn set_scale_factor(&mut self, ladder_max_bitrate_default: u64) {
        self.scale_factor = Some(ladder_max_bitrate_default as f64 / self.bitrate_default as f64);
    }

    /// Clamps a bitrate into `[bitrate_min, bitrate_max]`.
    pub fn clamp(&self, bitrate: u64) -> u64 {
        bitrate.clamp(self.bitrate_min, self.bitrate_max)
    }
}

/// Serializable form of a profile, used for ladder configuration files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub width: u32,
    pub height: u32,
    pub bitrate_default: u64,
    pub bitrate_min: u64,
    pub bitrate_max: u64,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate_step: Option<u64>,
}

fn default_required() -> bool {
    true
}

impl TryFrom<&ProfileConfig> for EncodingProfile {
    type Error = CoreError;

    fn try_from(config: &ProfileConfig) -> CoreResult<Self> {
        EncodingProfile::new(
            config.width,
            config.height,
            config.bitrate_default,
            config.bitrate_min,
            config.bitrate_max,
            config.required,
            config.bitrate_step,
        )
    }
}

impl From<&EncodingProfile> for ProfileConfig {
    fn from(profile: &EncodingProfile) -> Self {
        Self {
            width: profile.width,
            height: profile.height,
            bitrate_default: profile.bitrate_default,
            bitrate_min: profile.bitrate_min,
            bitrate_max: profile.bitrate_max,
            required: profile.required,
            bitrate_step: profile.bitrate_step,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_clamped_to_default() {
        let profile = EncodingProfile::new(640, 360, 1_100_000, 2_000_000, 900_000, true, None).unwrap();
        assert_eq!(profile.bitrate_min(), 1_100_000);
        assert_eq!(profile.bitrate_max(), 1_100_000);
    }

    #[test]
    fn test_valid_bounds_are_kept() {
        let profile = EncodingProfile::new(640, 360, 1_100_000, 300_000, 3_000_000, false, Some(100_000)).unwrap();
        assert_eq!(profile.bitrate_min(), 300_000);
        assert_eq!(profile.bitrate_max(), 3_000_000);
        assert!(!profile.required());
        assert_eq!(profile.bitrate_step(), Some(100_000));
        assert_eq!(profile.scale_factor(), None);
    }

    #[test]
    fn test_invalid_profiles_are_rejected() {
        assert!(EncodingProfile::new(0, 360, 1_000, 1_000, 1_000, true, None).is_err());
        assert!(EncodingProfile::new(640, 360, 0, 0, 0, true, None).is_err());
        assert!(EncodingProfile::new(640, 360, 1_000, 1_000, 1_000, true, Some(0)).is_err());
    }

    #[test]
    fn test_scale_factor() {
        let mut profile = EncodingProfile::new(960, 540, 2_250_000, 600_000, 4_000_000, true, None).unwrap();
        profile.set_scale_factor(4_500_000);
        assert_eq!(profile.scale_factor(), Some(2.0));
    }

    #[test]
    fn test_profile_config_required_defaults_to_true() {
        let config: ProfileConfig = serde_json::from_str(
            r#"{"width":480,"height":270,"bitrate_default":750000,"bitrate_min":200000,"bitrate_max":2000000}"#,
        )
        .unwrap();
        assert!(config.required);
        assert_eq!(config.bitrate_step, None);
        let profile = EncodingProfile::try_from(&config).unwrap();
        assert_eq!(ProfileConfig::from(&profile), config);
    }
}
