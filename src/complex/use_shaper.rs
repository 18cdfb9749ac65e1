//! The Universal Shaping Engine (§4.9): Tibetan, Tai Tham, Javanese, Balinese,
//! Sundanese, Batak, Buginese, Tagalog, New Tai Lue, Cham, Kayah Li, Rejang,
//! Saurashtra, Syloti Nagri and Tifinagh run this one template rather than a
//! bespoke shaper each, on the same `OtherLetter`-is-a-consonant,
//! `Mark`-is-a-combining-sign split every one of them shares.

use crate::buffer::Buffer;
use crate::face::Face;
use crate::ot::feature::feature;
use crate::ot::map::FeatureFlags;
use crate::ot::plan::{MarkZeroing, ShapePlan, ShapePlanner};

use super::syllabic::{self, Position};
use super::ComplexShaper;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Category {
    Other = 0,
    Consonant = 1,
    VowelDependent = 2,
    Mark = 3,
    Virama = 4,
    Number = 5,
    ZeroWidthJoiner = 6,
}

impl Category {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Category::Consonant,
            2 => Category::VowelDependent,
            3 => Category::Mark,
            4 => Category::Virama,
            5 => Category::Number,
            6 => Category::ZeroWidthJoiner,
            _ => Category::Other,
        }
    }

    fn starts_syllable(self) -> bool {
        matches!(self, Category::Consonant | Category::Other)
    }

    fn position(self) -> Position {
        match self {
            Category::Consonant | Category::Other => Position::Base,
            Category::Virama => Position::AfterMain,
            Category::VowelDependent => Position::PostC,
            Category::Mark => Position::Smvd,
            Category::Number => Position::Start,
            Category::ZeroWidthJoiner => Position::End,
        }
    }
}

const PAUSE_CLEAR_SYLLABLES: u8 = 0;

pub struct UseShaper;

impl ComplexShaper for UseShaper {
    fn collect_features(&self, planner: &mut ShapePlanner) {
        planner.ot_map.add_feature(feature::REPH_FORMS, FeatureFlags::empty(), 1);
        planner.ot_map.add_feature(feature::PRE_BASE_FORMS, FeatureFlags::empty(), 1);
        planner.ot_map.add_feature(feature::BELOW_BASE_FORMS, FeatureFlags::empty(), 1);
        planner.ot_map.add_feature(feature::ABOVE_BASE_FORMS, FeatureFlags::empty(), 1);
        planner.ot_map.add_feature(feature::POST_BASE_FORMS, FeatureFlags::empty(), 1);
        planner.ot_map.add_feature(feature::HALANT_FORMS, FeatureFlags::empty(), 1);

        planner.ot_map.add_gsub_pause(PAUSE_CLEAR_SYLLABLES);

        planner.ot_map.enable_feature(feature::PRE_BASE_SUBSTITUTIONS, FeatureFlags::empty(), 1);
        planner.ot_map.enable_feature(feature::BELOW_BASE_SUBSTITUTIONS, FeatureFlags::empty(), 1);
        planner.ot_map.enable_feature(feature::POST_BASE_SUBSTITUTIONS, FeatureFlags::empty(), 1);
    }

    fn setup_masks(&self, plan: &ShapePlan, _face: &Face, buffer: &mut Buffer) {
        let len = buffer.len();
        for i in 0..len {
            let cat = super::use_table::category_for(buffer.info()[i].as_char());
            buffer.info_mut()[i].use_category = cat as u8;
        }

        syllabic::find_syllables(buffer, |g| Category::from_u8(g.use_category).starts_syllable());

        syllabic::for_each_syllable(buffer, |buffer, start, end| {
            for i in start..end {
                let pos = Category::from_u8(buffer.info()[i].use_category).position();
                buffer.info_mut()[i].indic_position = pos as u8;
            }
            syllabic::sort_by_position(buffer, start, end, |g| position_from_u8(g.indic_position));
        });

        let mask = plan.ot_map.get_1_mask(feature::REPH_FORMS)
            | plan.ot_map.get_1_mask(feature::PRE_BASE_FORMS)
            | plan.ot_map.get_1_mask(feature::BELOW_BASE_FORMS)
            | plan.ot_map.get_1_mask(feature::ABOVE_BASE_FORMS)
            | plan.ot_map.get_1_mask(feature::POST_BASE_FORMS)
            | plan.ot_map.get_1_mask(feature::HALANT_FORMS);

        for i in 0..buffer.len() {
            if Category::from_u8(buffer.info()[i].use_category) != Category::Other {
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

fn position_from_u8(v: u8) -> Position {
    match v {
        4 => Position::Base,
        5 => Position::AfterMain,
        11 => Position::PostC,
        13 => Position::Smvd,
        14 => Position::End,
        _ => Position::Start,
    }
}
