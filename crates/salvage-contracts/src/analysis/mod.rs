mod category;
mod fallback;

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::recommendations::RecommendationSet;

pub use category::classify;
pub use fallback::FallbackTemplate;

/// Minimum length, in characters, for analysis text to count as usable.
pub const MIN_ANALYSIS_CHARS: usize = 50;

const HIGH_CONFIDENCE_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Furniture,
    Electronics,
    Clothing,
    Kitchen,
    Tools,
    General,
    /// Pipeline-level failure. Never produced by [`classify`].
    Error,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Furniture => "furniture",
            Category::Electronics => "electronics",
            Category::Clothing => "clothing",
            Category::Kitchen => "kitchen",
            Category::Tools => "tools",
            Category::General => "general",
            Category::Error => "error",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    pub width: u32,
    pub height: u32,
    pub color_mode: String,
    pub format: String,
    pub file_size_bytes: u64,
}

/// Terminal record of one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub analysis_text: String,
    pub category: Category,
    pub confidence: u8,
    pub recommendations: RecommendationSet,
    pub timestamp: String,
    pub original_image_path: PathBuf,
    pub processed_image_path: PathBuf,
    pub image_descriptor: Option<ImageDescriptor>,
}

impl AnalysisResult {
    /// Classifies the analysis text and scores confidence from its length.
    pub fn completed(
        analysis_text: String,
        recommendations: RecommendationSet,
        original_image_path: impl Into<PathBuf>,
        processed_image_path: impl Into<PathBuf>,
        image_descriptor: Option<ImageDescriptor>,
    ) -> Self {
        Self {
            category: classify(&analysis_text),
            confidence: confidence_for(&analysis_text),
            analysis_text,
            recommendations,
            timestamp: now_utc_iso(),
            original_image_path: original_image_path.into(),
            processed_image_path: processed_image_path.into(),
            image_descriptor,
        }
    }

    pub fn failed(original_image_path: &Path, reason: &str) -> Self {
        Self {
            analysis_text: format!("Analysis failed: {reason}"),
            category: Category::Error,
            confidence: 0,
            recommendations: RecommendationSet::empty(),
            timestamp: now_utc_iso(),
            original_image_path: original_image_path.to_path_buf(),
            processed_image_path: original_image_path.to_path_buf(),
            image_descriptor: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.category == Category::Error
    }
}

pub fn confidence_for(analysis_text: &str) -> u8 {
    if analysis_text.chars().count() > HIGH_CONFIDENCE_CHARS {
        90
    } else {
        60
    }
}

/// True when model output is long enough to ground further stages.
pub fn is_meaningful(text: &str) -> bool {
    text.trim().chars().count() >= MIN_ANALYSIS_CHARS
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
