//! Feature tags and the `Feature` request type (§3).

use crate::Tag;

/// `{tag, value, start, end}` — a caller's request to enable/disable a
/// feature, optionally over a sub-range of the buffer. `value == 0` disables
/// the feature even if it is a default.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Feature {
    pub tag: Tag,
    pub value: u32,
    pub start: u32,
    pub end: u32,
}

impl Feature {
    pub const GLOBAL_START: u32 = 0;
    pub const GLOBAL_END: u32 = u32::MAX;

    pub fn new(tag: Tag, value: u32, range: impl Into<FeatureRange>) -> Self {
        let range = range.into();
        Feature { tag, value, start: range.0, end: range.1 }
    }

    pub fn is_global(&self) -> bool {
        self.start == Self::GLOBAL_START && self.end == Self::GLOBAL_END
    }
}

/// A `(start, end)` buffer range, with a blanket `From<RangeFull>` for the
/// common "whole buffer" case.
pub struct FeatureRange(pub u32, pub u32);

impl From<std::ops::RangeFull> for FeatureRange {
    fn from(_: std::ops::RangeFull) -> Self {
        FeatureRange(Feature::GLOBAL_START, Feature::GLOBAL_END)
    }
}

impl From<std::ops::Range<u32>> for FeatureRange {
    fn from(r: std::ops::Range<u32>) -> Self {
        FeatureRange(r.start, r.end)
    }
}

macro_rules! tags {
    ($($name:ident => $bytes:expr),* $(,)?) => {
        $(pub const $name: Tag = Tag::from_bytes($bytes);)*
    };
}

/// Standard OpenType feature tags this crate's shaper dispatch or OT map
/// names explicitly (§4.4–§4.9).
pub mod feature {
    use super::tags;
    use crate::Tag;

    tags! {
        // Normalization-adjacent / generic.
        GLYPH_COMPOSITION_DECOMPOSITION => b"ccmp",
        LOCALIZED_FORMS => b"locl",
        STANDARD_LIGATURES => b"liga",
        CONTEXTUAL_LIGATURES => b"clig",
        REQUIRED_LIGATURES => b"rlig",
        CONTEXTUAL_ALTERNATES => b"calt",
        REQUIRED_CONTEXTUAL_ALTERNATES => b"rclt",
        RANDOMIZE => b"rand",
        CONTEXTUAL_SWASH => b"cswh",
        STRETCHING_GLYPH_DECOMPOSITION => b"stch",
        KERNING => b"kern",
        MARK_POSITIONING => b"mark",
        MARK_TO_MARK_POSITIONING => b"mkmk",
        CURSIVE_POSITIONING => b"curs",
        DISTANCES => b"dist",
        ABOVE_BASE_MARK_POSITIONING => b"abvm",
        BELOW_BASE_MARK_POSITIONING => b"blwm",
        MARK_POSITIONING_VIA_SUBSTITUTION => b"mset",
        VERTICAL_ALTERNATES_AND_ROTATION => b"vert",

        // Arabic positional forms (§4.8).
        ISOLATED_FORMS => b"isol",
        TERMINAL_FORMS_1 => b"fina",
        TERMINAL_FORMS_2 => b"fin2",
        TERMINAL_FORMS_3 => b"fin3",
        MEDIAL_FORMS_1 => b"medi",
        MEDIAL_FORMS_2 => b"med2",
        INITIAL_FORMS => b"init",

        // Indic/USE/Khmer/Myanmar per-syllable features (§4.9).
        NUKTA_FORMS => b"nukt",
        AKHAND => b"akhn",
        REPH_FORMS => b"rphf",
        BELOW_BASE_FORMS => b"blwf",
        HALF_FORMS => b"half",
        POST_BASE_FORMS => b"pstf",
        VATTU_VARIANTS => b"vatu",
        CONJUNCT_FORMS => b"cjct",
        PRE_BASE_FORMS => b"pref",
        ABOVE_BASE_SUBSTITUTIONS => b"abvs",
        BELOW_BASE_SUBSTITUTIONS => b"blws",
        PRE_BASE_SUBSTITUTIONS => b"pres",
        POST_BASE_SUBSTITUTIONS => b"psts",
        HALANT_FORMS => b"haln",
        CONJUNCT_FORM_AFTER_RO => b"cfar",
        REORDERING_MARKS => b"rkrf",
        ABOVE_BASE_FORMS => b"abvf",

        // Hangul jamo forms.
        LEADING_JAMO_FORMS => b"ljmo",
        VOWEL_JAMO_FORMS => b"vjmo",
        TRAILING_JAMO_FORMS => b"tjmo",

        // Direction / presentation.
        LEFT_TO_RIGHT_ALTERNATES => b"ltra",
        LEFT_TO_RIGHT_MIRRORED_FORMS => b"ltrm",
        RIGHT_TO_LEFT_ALTERNATES => b"rtla",
        RIGHT_TO_LEFT_MIRRORED_FORMS => b"rtlm",
    }
}
