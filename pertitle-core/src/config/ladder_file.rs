//! Ladder configuration files.
//!
//! A ladder file is a JSON document listing the rendition tiers:
//!
//! ```json
//! {
//!   "encoding_profiles": [
//!     {"width": 1920, "height": 1080, "bitrate_default": 4500000,
//!      "bitrate_min": 1000000, "bitrate_max": 6000000, "required": true,
//!      "bitrate_step": 100000}
//!   ]
//! }
//! ```
//!
//! `required` defaults to `true` and `bitrate_step` is optional.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::ladder::{EncodingLadder, EncodingProfile, ProfileConfig};

/// Serializable description of an encoding ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LadderConfig {
    pub encoding_profiles: Vec<ProfileConfig>,
}

impl LadderConfig {
    pub fn from_json(json: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a ladder configuration file.
    pub fn from_file(path: &Path) -> CoreResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Configuration(format!("Cannot read ladder file {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&contents).map_err(|e| {
            CoreError::Configuration(format!("Invalid ladder file {}: {}", path.display(), e))
        })
    }

    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validates every profile and assembles the ladder.
    pub fn build(&self) -> CoreResult<EncodingLadder> {
        let profiles = self
            .encoding_profiles
            .iter()
            .map(EncodingProfile::try_from)
            .collect::<CoreResult<Vec<_>>>()?;
        EncodingLadder::new(profiles)
    }
}

impl From<&EncodingLadder> for LadderConfig {
    fn from(ladder: &EncodingLadder) -> Self {
        Self {
            encoding_profiles: ladder.profiles().iter().map(ProfileConfig::from).collect(),
        }
    }
}

/// The built-in five-tier H.264 template ladder.
pub fn default_template_ladder() -> LadderConfig {
    // (width, height, default, min, max, required)
    const TIERS: [(u32, u32, u64, u64, u64, bool); 5] = [
        (1920, 1080, 4_500_000, 1_000_000, 6_000_000, true),
        (1280, 720, 3_400_000, 800_000, 5_000_000, true),
        (960, 540, 2_100_000, 600_000, 4_000_000, true),
        (640, 360, 1_100_000, 300_000, 3_000_000, true),
        (480, 270, 750_000, 200_000, 2_000_000, false),
    ];

    LadderConfig {
        encoding_profiles: TIERS
            .iter()
            .map(|&(width, height, bitrate_default, bitrate_min, bitrate_max, required)| ProfileConfig {
                width,
                height,
                bitrate_default,
                bitrate_min,
                bitrate_max,
                required,
                bitrate_step: Some(super::DEFAULT_BITRATE_STEP),
            })
            .collect(),
    }
}
