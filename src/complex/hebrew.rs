//! The Hebrew shaper (§4.9): mostly the default template, but Hebrew points
//! (niqqud) reorder onto their base by canonical combining class the same
//! way any mark does, except the dagesh/mapiq (CCC 21) and a few vowel
//! points sort ahead of the generic combining-class order a naive ICU-style
//! sort would otherwise give them.

use crate::buffer::Buffer;
use crate::ot::feature::feature;
use crate::ot::map::FeatureFlags;
use crate::ot::plan::ShapePlanner;
use crate::unicode::CharExt;

use super::ComplexShaper;

pub struct HebrewShaper;

impl ComplexShaper for HebrewShaper {
    fn collect_features(&self, planner: &mut ShapePlanner) {
        planner.ot_map.enable_feature(feature::GLYPH_COMPOSITION_DECOMPOSITION, FeatureFlags::empty(), 1);
    }

    fn reorder_marks(&self) -> Option<fn(&mut Buffer, usize, usize)> {
        Some(reorder_marks)
    }

    fn fallback_position(&self) -> bool {
        true
    }
}

fn reorder_marks(buffer: &mut Buffer, start: usize, end: usize) {
    // Dagesh/mapiq/rafe sit visually at the same depth as most niqqud but
    // Unicode assigns them CCC 21/20, ahead of the vowel points they
    // co-occur with (CCC 17-28); swap the two back into reading order.
    const SIN_DOT: u32 = 0x05C1;
    const SHIN_DOT: u32 = 0x05C2;

    let mut i = start;
    while i + 1 < end {
        let a = buffer.info()[i].as_char();
        let b = buffer.info()[i + 1].as_char();
        if (a as u32 == SIN_DOT || a as u32 == SHIN_DOT)
            && b.modified_combining_class() < a.modified_combining_class()
        {
            buffer.info_mut().swap(i, i + 1);
            buffer.pos_mut().swap(i, i + 1);
        }
        i += 1;
    }
}
