//! The Indic shaper (§4.9): Devanagari, Bengali, Gurmukhi, Gujarati, Oriya,
//! Tamil, Telugu, Kannada, Malayalam and Sinhala all run the same
//! category/syllable/reorder template, differing only in their category
//! table (`indic_table::category_for`) and a handful of script-specific GSUB
//! features a font may or may not carry.

use crate::buffer::{Buffer, GlyphInfo};
use crate::face::Face;
use crate::ot::feature::feature;
use crate::ot::map::FeatureFlags;
use crate::ot::normalize::NormalizationMode;
use crate::ot::plan::{MarkZeroing, ShapePlan, ShapePlanner};

use super::syllabic::{self, Position};
use super::ComplexShaper;

/// §4.9 step 4's per-codepoint classification for Indic scripts.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Category {
    Other = 0,
    Consonant = 1,
    Vowel = 2,
    VowelDependent = 3,
    VowelDependentPreBase = 4,
    Nukta = 5,
    Halant = 6,
    Bindu = 7,
    Visarga = 8,
    Avagraha = 9,
    ToneMark = 10,
    ZeroWidthJoiner = 11,
}

impl Category {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Category::Consonant,
            2 => Category::Vowel,
            3 => Category::VowelDependent,
            4 => Category::VowelDependentPreBase,
            5 => Category::Nukta,
            6 => Category::Halant,
            7 => Category::Bindu,
            8 => Category::Visarga,
            9 => Category::Avagraha,
            10 => Category::ToneMark,
            11 => Category::ZeroWidthJoiner,
            _ => Category::Other,
        }
    }

    fn starts_syllable(self) -> bool {
        matches!(self, Category::Consonant | Category::Vowel | Category::Avagraha | Category::Other)
    }

    fn position(self) -> Position {
        match self {
            Category::VowelDependentPreBase => Position::PreM,
            Category::Consonant | Category::Vowel | Category::Avagraha | Category::Other => Position::Base,
            Category::Nukta | Category::Halant => Position::AfterMain,
            Category::VowelDependent => Position::PostC,
            Category::Bindu | Category::Visarga | Category::ToneMark => Position::Smvd,
            Category::ZeroWidthJoiner => Position::End,
        }
    }
}

const PAUSE_CLEAR_SYLLABLES: u8 = 0;

pub struct IndicShaper;

impl ComplexShaper for IndicShaper {
    fn collect_features(&self, planner: &mut ShapePlanner) {
        // Stage A: per-syllable positional features (§4.9 step 8).
        planner.ot_map.add_feature(feature::NUKTA_FORMS, FeatureFlags::empty(), 1);
        planner.ot_map.add_feature(feature::AKHAND, FeatureFlags::empty(), 1);
        planner.ot_map.add_feature(feature::REPH_FORMS, FeatureFlags::HAS_FALLBACK, 1);
        planner.ot_map.add_feature(feature::PRE_BASE_FORMS, FeatureFlags::empty(), 1);
        planner.ot_map.add_feature(feature::BELOW_BASE_FORMS, FeatureFlags::empty(), 1);
        planner.ot_map.add_feature(feature::POST_BASE_FORMS, FeatureFlags::empty(), 1);
        planner.ot_map.add_feature(feature::HALF_FORMS, FeatureFlags::empty(), 1);
        planner.ot_map.add_feature(feature::VATTU_VARIANTS, FeatureFlags::empty(), 1);
        planner.ot_map.add_feature(feature::CONJUNCT_FORMS, FeatureFlags::empty(), 1);

        planner.ot_map.add_gsub_pause(PAUSE_CLEAR_SYLLABLES);

        // Stage B: syllable-final substitutions, then the shared globals
        // (liga/calt/clig/rclt/rlig are already enabled by `ShapePlan::new`).
        planner.ot_map.enable_feature(feature::PRE_BASE_SUBSTITUTIONS, FeatureFlags::empty(), 1);
        planner.ot_map.enable_feature(feature::ABOVE_BASE_SUBSTITUTIONS, FeatureFlags::empty(), 1);
        planner.ot_map.enable_feature(feature::BELOW_BASE_SUBSTITUTIONS, FeatureFlags::empty(), 1);
        planner.ot_map.enable_feature(feature::POST_BASE_SUBSTITUTIONS, FeatureFlags::empty(), 1);
        planner.ot_map.enable_feature(feature::HALANT_FORMS, FeatureFlags::empty(), 1);
    }

    fn setup_masks(&self, plan: &ShapePlan, _face: &Face, buffer: &mut Buffer) {
        let len = buffer.len();
        for i in 0..len {
            let c = super::indic_table::category_for(buffer.info()[i].as_char());
            buffer.info_mut()[i].indic_category = c as u8;
        }

        syllabic::find_syllables(buffer, |g| Category::from_u8(g.indic_category).starts_syllable());

        syllabic::for_each_syllable(buffer, |buffer, start, end| {
            for i in start..end {
                let pos = Category::from_u8(buffer.info()[i].indic_category).position();
                buffer.info_mut()[i].indic_position = pos as u8;
            }
            syllabic::sort_by_position(buffer, start, end, |g| position_from_u8(g.indic_position));
        });

        let stage_a_mask = plan.ot_map.get_1_mask(feature::NUKTA_FORMS)
            | plan.ot_map.get_1_mask(feature::AKHAND)
            | plan.ot_map.get_1_mask(feature::REPH_FORMS)
            | plan.ot_map.get_1_mask(feature::PRE_BASE_FORMS)
            | plan.ot_map.get_1_mask(feature::BELOW_BASE_FORMS)
            | plan.ot_map.get_1_mask(feature::POST_BASE_FORMS)
            | plan.ot_map.get_1_mask(feature::HALF_FORMS)
            | plan.ot_map.get_1_mask(feature::VATTU_VARIANTS)
            | plan.ot_map.get_1_mask(feature::CONJUNCT_FORMS);

        for i in 0..buffer.len() {
            if Category::from_u8(buffer.info()[i].indic_category) != Category::Other {
                buffer.info_mut()[i].mask |= stage_a_mask;
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

    fn normalization_mode(&self) -> NormalizationMode {
        NormalizationMode::ComposedDiacritics
    }

    fn compose_filter(&self) -> Option<fn(&GlyphInfo, &GlyphInfo) -> bool> {
        Some(|_a, b| {
            // Never recompose onto a nukta; fonts carry dedicated
            // nukta-bearing precomposed glyphs only for the common cases.
            Category::from_u8(b.indic_category) != Category::Nukta
        })
    }
}

fn position_from_u8(v: u8) -> Position {
    match v {
        0 => Position::Start,
        1 => Position::RaToBecomeReph,
        2 => Position::PreM,
        3 => Position::PreC,
        4 => Position::Base,
        5 => Position::AfterMain,
        6 => Position::AboveC,
        7 => Position::BeforeSub,
        8 => Position::BelowC,
        9 => Position::AfterSub,
        10 => Position::BeforePost,
        11 => Position::PostC,
        12 => Position::AfterPost,
        13 => Position::Smvd,
        _ => Position::End,
    }
}
