//! Analysis session: the persisted document of a title's analyses.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::result::AnalysisResult;
use crate::error::CoreResult;
use crate::ladder::{EncodingLadder, LadderSnapshot};

/// Ordered history of analyses for one input and one template ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSession {
    pub input_file_path: PathBuf,
    pub template_encoding_ladder: LadderSnapshot,
    #[serde(default)]
    pub analyses: Vec<AnalysisResult>,
}

impl AnalysisSession {
    pub fn new(input_file_path: impl Into<PathBuf>, ladder: &EncodingLadder) -> Self {
        Self {
            input_file_path: input_file_path.into(),
            template_encoding_ladder: ladder.snapshot(),
            analyses: Vec::new(),
        }
    }

    /// Appends a finished result and returns a reference to the stored record.
    pub fn append(&mut self, result: AnalysisResult) -> &AnalysisResult {
        self.analyses.push(result);
        &self.analyses[self.analyses.len() - 1]
    }

    pub fn latest(&self) -> Option<&AnalysisResult> {
        self.analyses.last()
    }

    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Writes the session as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: &Path) -> CoreResult<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}
