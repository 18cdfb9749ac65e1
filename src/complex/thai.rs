//! The Thai/Lao shaper (§4.9): no GSUB positional features: the PUA
//! reordering ICU-era fonts needed is obsolete, and above/below vowel signs
//! and tone marks position entirely through GPOS mark attachment. The one
//! wrinkle is that a SARA AM (U+0E33) decomposes to NIKHAHIT + AA for
//! shaping purposes in some fonts; left to the default composed-diacritics
//! normalization mode that already works correctly, so this shaper only
//! needs to request fallback mark positioning for fonts without GPOS.
use crate::ot::feature::feature;
use crate::ot::map::FeatureFlags;
use crate::ot::plan::ShapePlanner;

use super::ComplexShaper;

pub struct ThaiShaper;

impl ComplexShaper for ThaiShaper {
    fn collect_features(&self, planner: &mut ShapePlanner) {
        planner.ot_map.enable_feature(feature::GLYPH_COMPOSITION_DECOMPOSITION, FeatureFlags::empty(), 1);
    }

    fn fallback_position(&self) -> bool {
        true
    }
}
