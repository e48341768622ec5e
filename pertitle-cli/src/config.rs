// pertitle-cli/src/config.rs
//
// Default configuration constants for the `pertitle` command, mostly the
// analysis defaults shared with pertitle-core.

use std::path::{Path, PathBuf};

pub use pertitle_core::config::{
    DEFAULT_BITRATE_STEP, DEFAULT_CRF, DEFAULT_IDR_INTERVAL_SECS, DEFAULT_METRIC_THRESHOLD,
    DEFAULT_SEGMENTS,
};

/// Extension of session files written next to the input.
pub const SESSION_FILE_EXTENSION: &str = "pertitle.json";

/// Prefix of the temporary work directory holding measurement encodes.
pub const WORK_DIR_PREFIX: &str = "pertitle_";

/// `title.mp4` -> `title.pertitle.json`
pub fn default_session_path(input: &Path) -> PathBuf {
    input.with_extension(SESSION_FILE_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_session_path() {
        assert_eq!(
            default_session_path(Path::new("/media/title.mp4")),
            PathBuf::from("/media/title.pertitle.json")
        );
        assert_eq!(
            default_session_path(Path::new("clip")),
            PathBuf::from("clip.pertitle.json")
        );
    }
}
