//! The generic shaper (§4.9's template with every per-script hook a no-op):
//! Latin, Cyrillic, Greek, Han/Hiragana/Katakana/Bopomofo, and anything
//! `shaper_for_script` doesn't recognize.

use crate::ot::feature::feature;
use crate::ot::map::FeatureFlags;
use crate::ot::plan::ShapePlanner;

use super::ComplexShaper;

pub struct DefaultShaper;

impl ComplexShaper for DefaultShaper {
    fn collect_features(&self, planner: &mut ShapePlanner) {
        planner.ot_map.enable_feature(feature::GLYPH_COMPOSITION_DECOMPOSITION, FeatureFlags::empty(), 1);
    }

    fn fallback_position(&self) -> bool {
        true
    }
}
