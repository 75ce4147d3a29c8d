//! Stem naming
//!
//! The provider returns stems as a plain ordered list of files. Their
//! meaning comes from position alone:
//! - two-stem mode: `[target, no_target]`
//! - 4 stems (htdemucs, htdemucs_ft): vocals, drums, bass, other
//! - 6 stems (htdemucs_6s): + guitar, piano

use crate::params::{is_two_stem_disabled, models};

/// Output order of the four-stem model family
pub const STEMS_4: [&str; 4] = ["vocals", "drums", "bass", "other"];

/// Output order of the six-stem model family
pub const STEMS_6: [&str; 6] = ["vocals", "drums", "bass", "other", "guitar", "piano"];

/// Whether `name` is a stem any supported model can isolate
pub fn is_known_stem(name: &str) -> bool {
    STEMS_6.contains(&name)
}

/// Stem table for a model identifier
pub fn stem_table(model: &str) -> &'static [&'static str] {
    if model == models::HTDEMUCS_6S {
        &STEMS_6
    } else {
        &STEMS_4
    }
}

/// Label for the output file at `index`
///
/// Total over every index. Positions the table does not cover get
/// `stem_{index}`.
pub fn name_for(index: usize, two_stems: &str, model: &str) -> String {
    if !is_two_stem_disabled(two_stems) {
        return if index == 0 {
            two_stems.to_string()
        } else {
            format!("no_{two_stems}")
        };
    }

    stem_table(model)
        .get(index)
        .map(|name| (*name).to_string())
        .unwrap_or_else(|| format!("stem_{index}"))
}
