//! The Khmer shaper (§4.9): the same syllabic template as Indic, with its own
//! (much smaller, single-block) category table and a simpler coeng-based
//! below/post-base reordering since Khmer has no independent reph category.

use unicode_general_category::GeneralCategory as GC;

use crate::buffer::{Buffer, GlyphInfo};
use crate::face::Face;
use crate::ot::feature::feature;
use crate::ot::map::FeatureFlags;
use crate::ot::plan::{MarkZeroing, ShapePlan, ShapePlanner};
use crate::unicode::CharExt;

use super::syllabic::{self, Position};
use super::ComplexShaper;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Category {
    Other,
    Consonant,
    VowelIndependent,
    VowelDependent,
    Coeng,
    Robat,
    Sign,
}

fn category_for(c: char) -> Category {
    let cp = c as u32;
    match cp {
        0x1780..=0x17A2 => Category::VowelIndependent,
        0x17A3..=0x17B3 => Category::Consonant,
        0x17B4 | 0x17B5 => Category::Other, // inherent vowel markers, invisible
        0x17B6..=0x17C5 => Category::VowelDependent,
        0x17C6..=0x17D1 => Category::Sign,
        0x17C9 => Category::Robat,
        0x17D2 => Category::Coeng,
        _ => match c.general_category() {
            GC::NonspacingMark | GC::SpacingMark => Category::Sign,
            _ => Category::Other,
        },
    }
}

fn starts_syllable(cat: Category) -> bool {
    matches!(cat, Category::Consonant | Category::VowelIndependent | Category::Other)
}

fn position_for(cat: Category) -> Position {
    match cat {
        Category::Consonant | Category::VowelIndependent | Category::Other => Position::Base,
        Category::Coeng => Position::AfterMain,
        Category::Robat => Position::AfterMain,
        Category::VowelDependent => Position::PostC,
        Category::Sign => Position::Smvd,
    }
}

const PAUSE_CLEAR_SYLLABLES: u8 = 0;

pub struct KhmerShaper;

impl ComplexShaper for KhmerShaper {
    fn collect_features(&self, planner: &mut ShapePlanner) {
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
            buffer.info_mut()[i].indic_category = cat as u8;
        }

        syllabic::find_syllables(buffer, |g| starts_syllable(category_from_u8(g.indic_category)));

        syllabic::for_each_syllable(buffer, |buffer, start, end| {
            for i in start..end {
                let pos = position_for(category_from_u8(buffer.info()[i].indic_category));
                buffer.info_mut()[i].indic_position = pos as u8;
            }
            syllabic::sort_by_position(buffer, start, end, |g| position_from_u8(g.indic_position));
        });

        let mask = plan.ot_map.get_1_mask(feature::PRE_BASE_FORMS)
            | plan.ot_map.get_1_mask(feature::BELOW_BASE_FORMS)
            | plan.ot_map.get_1_mask(feature::ABOVE_BASE_FORMS)
            | plan.ot_map.get_1_mask(feature::POST_BASE_FORMS);

        for i in 0..buffer.len() {
            if category_from_u8(buffer.info()[i].indic_category) != Category::Other {
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

    fn compose_filter(&self) -> Option<fn(&GlyphInfo, &GlyphInfo) -> bool> {
        None
    }
}

fn category_from_u8(v: u8) -> Category {
    match v {
        1 => Category::Consonant,
        2 => Category::VowelIndependent,
        3 => Category::VowelDependent,
        4 => Category::Coeng,
        5 => Category::Robat,
        6 => Category::Sign,
        _ => Category::Other,
    }
}

fn position_from_u8(v: u8) -> Position {
    match v {
        4 => Position::Base,
        5 => Position::AfterMain,
        11 => Position::PostC,
        13 => Position::Smvd,
        _ => Position::Start,
    }
}
