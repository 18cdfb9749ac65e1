//! The Myanmar shaper (§4.9): syllabic template again, but Myanmar's medial
//! consonants (Ra, Ya, Wa, Ha) and the stacked "kinzi" prefix give it a
//! richer position set than Khmer while still fitting the shared engine.

use unicode_general_category::GeneralCategory as GC;

use crate::buffer::Buffer;
use crate::face::Face;
use crate::ot::feature::feature;
use crate::ot::map::FeatureFlags;
use crate::ot::plan::{MarkZeroing, ShapePlan, ShapePlanner};
use crate::unicode::CharExt;

use super::syllabic::{self, Position};
use super::ComplexShaper;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Category {
    Other = 0,
    Consonant = 1,
    Medial = 2,
    VowelDependent = 3,
    Anusvara = 4,
    Asat = 5,
    Sign = 6,
    /// VOWEL SIGN E (U+1031): unlike the other dependent vowels, it attaches
    /// visually before the consonant it modifies despite being encoded
    /// after it, the same pre-base-matra exception Indic's vowel sign I has.
    VowelDependentPreBase = 7,
}

/// Kinzi: a RA consonant + ASAT + VIRAMA sequence that Unicode encodes
/// *before* the base consonant it stacks above. The three codepoints, in
/// that exact order.
const KINZI_RA: u32 = 0x101B;
const KINZI_ASAT: u32 = 0x103A;
const KINZI_VIRAMA: u32 = 0x1039;

fn category_for(c: char) -> Category {
    match c as u32 {
        0x1031 => Category::VowelDependentPreBase,
        0x1000..=0x102A => Category::Consonant,
        0x103B..=0x103E => Category::Medial,
        0x102B..=0x1035 => Category::VowelDependent,
        0x1036 => Category::Anusvara,
        0x103A => Category::Asat,
        0x1037..=0x103F => Category::Sign,
        _ => match c.general_category() {
            GC::NonspacingMark | GC::SpacingMark => Category::Sign,
            _ => Category::Other,
        },
    }
}

fn starts_syllable(cat: Category) -> bool {
    matches!(cat, Category::Consonant | Category::Other)
}

fn position_for(cat: Category) -> Position {
    match cat {
        Category::Consonant | Category::Other => Position::Base,
        Category::VowelDependentPreBase => Position::PreM,
        Category::Medial => Position::AboveC,
        Category::VowelDependent => Position::AfterMain,
        Category::Asat => Position::AfterMain,
        Category::Anusvara | Category::Sign => Position::Smvd,
    }
}

/// §4.9 step 7's Myanmar-specific exception: a kinzi prefix keeps its three
/// glyphs contiguous and moves them to just after the base consonant
/// (`Position::AfterMain`, the same bucket Asat already sorts into), rather
/// than leaving them at the front where Unicode encodes them.
fn mark_kinzi(buffer: &mut Buffer, start: usize, end: usize) {
    if end - start < 4 {
        return;
    }
    let cp = |i: usize| buffer.info()[i].codepoint;
    if cp(start) == KINZI_RA && cp(start + 1) == KINZI_ASAT && cp(start + 2) == KINZI_VIRAMA {
        for i in start..start + 3 {
            buffer.info_mut()[i].myanmar_position = Position::AfterMain as u8;
        }
    }
}

const PAUSE_CLEAR_SYLLABLES: u8 = 0;

pub struct MyanmarShaper;

impl ComplexShaper for MyanmarShaper {
    fn collect_features(&self, planner: &mut ShapePlanner) {
        planner.ot_map.add_feature(feature::REPH_FORMS, FeatureFlags::empty(), 1);
        planner.ot_map.add_feature(feature::PRE_BASE_FORMS, FeatureFlags::empty(), 1);
        planner.ot_map.add_feature(feature::BELOW_BASE_FORMS, FeatureFlags::empty(), 1);
        planner.ot_map.add_feature(feature::ABOVE_BASE_FORMS, FeatureFlags::empty(), 1);
        planner.ot_map.add_feature(feature::POST_BASE_FORMS, FeatureFlags::empty(), 1);

        planner.ot_map.add_gsub_pause(PAUSE_CLEAR_SYLLABLES);

        planner.ot_map.enable_feature(feature::PRE_BASE_SUBSTITUTIONS, FeatureFlags::empty(), 1);
        planner.ot_map.enable_feature(feature::BELOW_BASE_SUBSTITUTIONS, FeatureFlags::empty(), 1);
        planner.ot_map.enable_feature(feature::POST_BASE_SUBSTITUTIONS, FeatureFlags::empty(), 1);
    }

    fn setup_masks(&self, plan: &ShapePlan, _face: &Face, buffer: &mut Buffer) {
        let len = buffer.len();
        for i in 0..len {
            let cat = category_for(buffer.info()[i].as_char());
            buffer.info_mut()[i].myanmar_category = cat as u8;
        }

        syllabic::find_syllables(buffer, |g| starts_syllable(category_from_u8(g.myanmar_category)));

        syllabic::for_each_syllable(buffer, |buffer, start, end| {
            for i in start..end {
                let pos = position_for(category_from_u8(buffer.info()[i].myanmar_category));
                buffer.info_mut()[i].myanmar_position = pos as u8;
            }
            mark_kinzi(buffer, start, end);
            syllabic::sort_by_position(buffer, start, end, |g| position_from_u8(g.myanmar_position));
        });

        let mask = plan.ot_map.get_1_mask(feature::REPH_FORMS)
            | plan.ot_map.get_1_mask(feature::PRE_BASE_FORMS)
            | plan.ot_map.get_1_mask(feature::BELOW_BASE_FORMS)
            | plan.ot_map.get_1_mask(feature::ABOVE_BASE_FORMS)
            | plan.ot_map.get_1_mask(feature::POST_BASE_FORMS);

        for i in 0..buffer.len() {
            if category_from_u8(buffer.info()[i].myanmar_category) != Category::Other {
                buffer.info_mut()[i].mask |= mask;
            }
        }
    }

    fn gsub_pause(&self, pause: u8, _plan: &ShapePlan, _face: &Face, buffer: &mut Buffer) {
        if pause == PAUSE_CLEAR_SYLLABLES {
            syllabic::clear_syllables(buffer);
        }
    }

    fn mark_zeroing(&self) -> MarkZeroing {
        MarkZeroing::Early
    }
}

fn category_from_u8(v: u8) -> Category {
    match v {
        1 => Category::Consonant,
        2 => Category::Medial,
        3 => Category::VowelDependent,
        4 => Category::Anusvara,
        5 => Category::Asat,
        6 => Category::Sign,
        7 => Category::VowelDependentPreBase,
        _ => Category::Other,
    }
}

fn position_from_u8(v: u8) -> Position {
    match v {
        2 => Position::PreM,
        4 => Position::Base,
        5 => Position::AfterMain,
        6 => Position::AboveC,
        13 => Position::Smvd,
        _ => Position::Start,
    }
}
