// ============================================================================
// pertitle-core/src/ladder/mod.rs
// ============================================================================
//
// ENCODING LADDER: Ordered Set of Rendition Tiers
//
// The ladder owns its profiles and keeps their scale factors consistent with
// the current top tier. Profile order is preserved for reporting and has no
// effect on the optimizers.
//
// KEY COMPONENTS:
// - EncodingLadder: attach/overall_bitrate/max_bitrate_default
// - EncodingProfile: one tier (see profile.rs)
// - LadderSnapshot: the template ladder as persisted in a session document

mod profile;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

pub use profile::{EncodingProfile, ProfileConfig};

/// An ordered, non-empty collection of encoding profiles.
///
/// `new` is the only constructor, so every ladder has at least one profile.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodingLadder {
    profiles: Vec<EncodingProfile>,
    max_bitrate_default: u64,
}

impl EncodingLadder {
    /// Builds a ladder from `profiles`. Fails when the list is empty.
    pub fn new(profiles: Vec<EncodingProfile>) -> CoreResult<Self> {
        let mut ladder = Self {
            profiles: Vec::new(),
            max_bitrate_default: 0,
        };
        ladder.attach(profiles)?;
        Ok(ladder)
    }

    /// Replaces the profile list and recomputes every scale factor from scratch.
    pub fn attach(&mut self, mut profiles: Vec<EncodingProfile>) -> CoreResult<()> {
        let max = profiles
            .iter()
            .map(EncodingProfile::bitrate_default)
            .max()
            .ok_or_else(|| CoreError::Configuration("Encoding ladder needs at least one profile".to_string()))?;

        for profile in &mut profiles {
            profile.set_scale_factor(max);
        }
        self.profiles = profiles;
        self.max_bitrate_default = max;
        Ok(())
    }

    pub fn profiles(&self) -> &[EncodingProfile] {
        &self.profiles
    }

    pub fn max_bitrate_default(&self) -> u64 {
        self.max_bitrate_default
    }

    /// Sum of the default bitrates of all profiles.
    pub fn overall_bitrate(&self) -> u64 {
        self.profiles.iter().map(EncodingProfile::bitrate_default).sum()
    }

    pub fn snapshot(&self) -> LadderSnapshot {
        LadderSnapshot {
            overall_bitrate_ladder: self.overall_bitrate(),
            encoding_profiles: self
                .profiles
                .iter()
                .map(|p| ProfileSnapshot {
                    width: p.width(),
                    height: p.height(),
                    bitrate: p.bitrate_default(),
                    constraints: ProfileConstraints {
                        bitrate_min: p.bitrate_min(),
                        bitrate_max: p.bitrate_max(),
                        bitrate_factor: p.scale_factor().unwrap_or(1.0),
                        required: p.required(),
                        bitrate_step: p.bitrate_step(),
                    },
                })
                .collect(),
        }
    }
}

/// Persisted view of the template ladder an analysis ran against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LadderSnapshot {
    pub overall_bitrate_ladder: u64,
    pub encoding_profiles: Vec<ProfileSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub width: u32,
    pub height: u32,
    pub bitrate: u64,
    pub constraints: ProfileConstraints,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileConstraints {
    pub bitrate_min: u64,
    pub bitrate_max: u64,
    pub bitrate_factor: f64,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate_step: Option<u64>,
}
