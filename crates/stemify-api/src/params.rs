//! Separation request and parameter resolution
//!
//! Turns what the caller asked for (model, stem selection, quality tier)
//! into the exact parameters sent to the provider. Resolution is total:
//! unknown models and tiers pass through with permissive defaults.

use serde::{Deserialize, Serialize};

use crate::stems::is_known_stem;

/// Demucs model identifiers
pub mod models {
    /// Base four-stem model
    pub const HTDEMUCS: &str = "htdemucs";

    /// Fine-tuned four-stem model
    pub const HTDEMUCS_FT: &str = "htdemucs_ft";

    /// Six-stem model (adds guitar, piano)
    pub const HTDEMUCS_6S: &str = "htdemucs_6s";
}

/// Two-stem value meaning "separate every stem"
pub const TWO_STEMS_NONE: &str = "None";

/// Overlap forced by the pro tier
pub const PRO_OVERLAP: f64 = 0.25;

/// Shift count forced by the pro tier
pub const PRO_SHIFTS: u32 = 1;

/// Whether a two-stem value is the "no two-stem mode" sentinel
pub fn is_two_stem_disabled(two_stems: &str) -> bool {
    two_stems.is_empty() || two_stems.eq_ignore_ascii_case(TWO_STEMS_NONE)
}

/// Quality tier requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// Use the caller's overlap/shifts as sent
    #[default]
    Standard,
    /// Fixed high-quality settings
    Pro,
    /// Any tier this service does not know, treated like standard
    #[serde(other)]
    Other,
}

/// Body of `POST /separate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeparationRequest {
    pub audio_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_two_stems")]
    pub two_stems: String,
    #[serde(default = "default_overlap")]
    pub overlap: f64,
    #[serde(default)]
    pub shifts: u32,
    #[serde(default = "default_audio_format")]
    pub audio_format: String,
    #[serde(default)]
    pub selected_stems: Option<Vec<String>>,
    #[serde(default = "default_quality")]
    pub quality: Option<QualityTier>,
}

fn default_model() -> String {
    models::HTDEMUCS_FT.to_string()
}

fn default_two_stems() -> String {
    TWO_STEMS_NONE.to_string()
}

fn default_overlap() -> f64 {
    0.25
}

fn default_audio_format() -> String {
    "wav".to_string()
}

fn default_quality() -> Option<QualityTier> {
    Some(QualityTier::Standard)
}

impl SeparationRequest {
    /// Request for `audio_url` with every other field at its default
    pub fn new(audio_url: impl Into<String>) -> Self {
        Self {
            audio_url: audio_url.into(),
            model: default_model(),
            two_stems: default_two_stems(),
            overlap: default_overlap(),
            shifts: 0,
            audio_format: default_audio_format(),
            selected_stems: None,
            quality: default_quality(),
        }
    }

    fn is_pro(&self) -> bool {
        self.quality == Some(QualityTier::Pro)
    }
}

/// Parameters actually sent to the provider, echoed back in the response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedParameters {
    pub model: String,
    pub two_stems: String,
    pub overlap: f64,
    pub shifts: u32,
    pub audio_format: String,
}

/// Derive provider parameters from a request
///
/// Priority order:
/// 1. a single recognised selected stem switches on two-stem mode for it
/// 2. guitar or piano anywhere in the selection forces the six-stem model
/// 3. the pro tier pins overlap/shifts and upgrades the *base* model to
///    the fine-tuned one (never the six-stem model)
pub fn resolve(request: &SeparationRequest) -> ResolvedParameters {
    let mut model = request.model.clone();
    let mut two_stems = request.two_stems.clone();

    if let Some(selected) = &request.selected_stems {
        if let [single] = selected.as_slice() {
            if is_known_stem(single) {
                two_stems = single.clone();
            }
        }

        if selected.iter().any(|s| s == "guitar" || s == "piano") {
            model = models::HTDEMUCS_6S.to_string();
        }
    }

    let (overlap, shifts) = if request.is_pro() {
        if model == models::HTDEMUCS {
            model = models::HTDEMUCS_FT.to_string();
        }
        (PRO_OVERLAP, PRO_SHIFTS)
    } else {
        (request.overlap, request.shifts)
    };

    ResolvedParameters {
        model,
        two_stems,
        overlap,
        shifts,
        audio_format: request.audio_format.clone(),
    }
}
