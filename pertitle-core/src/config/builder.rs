// ============================================================================
// pertitle-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for CoreConfig
//
// Fluent construction of CoreConfig with defaults for every field. The CLI
// maps its flags onto this builder; tests use it to switch on parallel
// measurement or a short deadline.

// ---- Standard library imports ----
use std::path::PathBuf;
use std::time::Duration;

// ---- Internal crate imports ----
use super::CoreConfig;

/// Builder for creating CoreConfig instances.
///
/// # Examples
///
/// ```rust
/// use pertitle_core::config::CoreConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = CoreConfigBuilder::new()
///     .temp_dir(PathBuf::from("/tmp/pertitle"))
///     .crf_preset("veryfast")
///     .default_bitrate_step(50_000)
///     .build();
/// assert_eq!(config.default_bitrate_step, 50_000);
/// ```
#[derive(Debug, Clone)]
pub struct CoreConfigBuilder {
    config: CoreConfig,
}

impl Default for CoreConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self {
            config: CoreConfig::default(),
        }
    }

    /// Sets the base directory for measurement artifacts.
    pub fn temp_dir(mut self, temp_dir: PathBuf) -> Self {
        self.config.temp_dir = Some(temp_dir);
        self
    }

    /// Sets the deadline for each external encode or score process.
    pub fn measurement_timeout(mut self, timeout: Duration) -> Self {
        self.config.measurement_timeout = Some(timeout);
        self
    }

    /// Enables or disables concurrent measurement.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    pub fn crf_preset(mut self, preset: &str) -> Self {
        self.config.crf_preset = preset.to_string();
        self
    }

    pub fn cbr_video_codec(mut self, codec: &str) -> Self {
        self.config.cbr_video_codec = codec.to_string();
        self
    }

    /// Sets the global metric-sweep bitrate step.
    pub fn default_bitrate_step(mut self, step: u64) -> Self {
        self.config.default_bitrate_step = step;
        self
    }

    /// Builds the CoreConfig.
    pub fn build(self) -> CoreConfig {
        self.config
    }
}
