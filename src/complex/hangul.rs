//! The Hangul shaper (§4.9): composes Jamo into syllable blocks arithmetically
//! (the Unicode algorithm `unicode::compose` already implements) rather than
//! going through `ot::normalize`'s generic composition pass, then applies
//! `ljmo`/`vjmo`/`tjmo` to glyphs a font can't otherwise form a precomposed
//! syllable for.

use crate::buffer::Buffer;
use crate::face::Face;
use crate::ot::feature::feature;
use crate::ot::map::FeatureFlags;
use crate::ot::plan::{ShapePlan, ShapePlanner};

use super::ComplexShaper;

const LEADING: u8 = 1;
const VOWEL: u8 = 2;
const TRAILING: u8 = 3;

pub struct HangulShaper;

impl ComplexShaper for HangulShaper {
    fn collect_features(&self, planner: &mut ShapePlanner) {
        planner.ot_map.add_feature(feature::LEADING_JAMO_FORMS, FeatureFlags::empty(), 1);
        planner.ot_map.add_feature(feature::VOWEL_JAMO_FORMS, FeatureFlags::empty(), 1);
        planner.ot_map.add_feature(feature::TRAILING_JAMO_FORMS, FeatureFlags::empty(), 1);
    }

    fn setup_masks(&self, plan: &ShapePlan, _face: &Face, buffer: &mut Buffer) {
        let ljmo_mask = plan.ot_map.get_1_mask(feature::LEADING_JAMO_FORMS);
        let vjmo_mask = plan.ot_map.get_1_mask(feature::VOWEL_JAMO_FORMS);
        let tjmo_mask = plan.ot_map.get_1_mask(feature::TRAILING_JAMO_FORMS);

        for g in buffer.info_mut() {
            match jamo_kind(g.as_char()) {
                Some(LEADING) => g.mask |= ljmo_mask,
                Some(VOWEL) => g.mask |= vjmo_mask,
                Some(TRAILING) => g.mask |= tjmo_mask,
                _ => {}
            }
        }
    }

    fn skip_normalize(&self) -> bool {
        true
    }
}

fn jamo_kind(c: char) -> Option<u8> {
    let cp = c as u32;
    if (0x1100..=0x115F).contains(&cp) || (0xA960..=0xA97C).contains(&cp) {
        Some(LEADING)
    } else if (0x1161..=0x11A7).contains(&cp) || (0xD7B0..=0xD7C6).contains(&cp) {
        Some(VOWEL)
    } else if (0x11A8..=0x11FF).contains(&cp) || (0xD7CB..=0xD7FB).contains(&cp) {
        Some(TRAILING)
    } else {
        None
    }
}
