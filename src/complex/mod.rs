//! Script-specific shaper dispatch (C8, C9): the Arabic joining machine, the
//! syllabic template Indic/USE/Khmer/Myanmar share, and the handful of
//! scripts (Hangul, Thai, Hebrew) that only need a couple of hooks into
//! normalization and mask setup.

use crate::buffer::{Buffer, GlyphInfo};
use crate::common::{script, Script};
use crate::face::Face;
use crate::ot::normalize::NormalizationMode;
use crate::ot::plan::{MarkZeroing, ShapePlan, ShapePlanner};

mod arabic;
mod arabic_table;
mod default;
mod hangul;
mod hebrew;
mod indic;
mod indic_table;
mod khmer;
mod myanmar;
mod syllabic;
mod thai;
mod use_shaper;
mod use_table;

/// One script family's shaping behavior, resolved once per `ShapePlan` from
/// the buffer's script (§4.8, §4.9). Every hook has a no-op/default-flavored
/// default so a shaper only overrides what makes it different from the
/// generic default shaper.
pub trait ComplexShaper: Sync {
    /// Contributes this shaper's features to the OT map, in lookup order
    /// (§4.8/§4.9 "Feature order").
    fn collect_features(&self, planner: &mut ShapePlanner);

    /// Runs once per buffer, after `cmap`+GDEF-class assignment and before
    /// GSUB: joining, syllable segmentation, category/position assignment,
    /// reordering and positional-feature masks (§4.8, §4.9 steps 4-9). Takes
    /// the compiled plan so it can look up the masks its own features were
    /// assigned during `collect_features` (`plan.ot_map.get_1_mask`).
    fn setup_masks(&self, _plan: &ShapePlan, _face: &Face, _buffer: &mut Buffer) {}

    /// §4.7 "Mode selection": which normalization mode this script wants.
    fn normalization_mode(&self) -> NormalizationMode {
        NormalizationMode::Auto
    }

    /// Per-script override of normalize's mark-reordering phase (Hebrew,
    /// Arabic's modifier-mark exception).
    fn reorder_marks(&self) -> Option<fn(&mut Buffer, usize, usize)> {
        None
    }

    /// Per-script veto on an otherwise-acceptable recomposition.
    fn compose_filter(&self) -> Option<fn(&GlyphInfo, &GlyphInfo) -> bool> {
        None
    }

    /// §4.9 step 12: whether mark widths are zeroed before (`Early`,
    /// Indic/Myanmar) or after (`Late`, everyone else) the GPOS pass.
    fn mark_zeroing(&self) -> MarkZeroing {
        MarkZeroing::Late
    }

    /// §4.10: whether this shaper allows synthesizing mark positions from
    /// `glyf` extents when the font has no GPOS mark-attachment lookups.
    fn fallback_position(&self) -> bool {
        false
    }

    /// Runs after GPOS, before the attachment-offset propagator. Only
    /// Arabic uses this, to distribute STCH-marked glyphs (§4.8).
    fn postprocess_glyphs(&self, _plan: &ShapePlan, _face: &Face, _buffer: &mut Buffer) {}

    /// Fires mid-GSUB at a stage boundary this shaper registered via
    /// `Map::add_gsub_pause` (§4.6 "pause"); `pause` is the same opaque id it
    /// passed in, round-tripped back by the shaping pipeline. Arabic uses
    /// this for `record_stch` and the synthetic fallback-shape pass.
    fn gsub_pause(&self, _pause: u8, _plan: &ShapePlan, _face: &Face, _buffer: &mut Buffer) {}

    /// Whether this script decomposes/reorders arithmetically instead of
    /// going through `ot::normalize` at all (Hangul composes Jamo up front
    /// instead; Zawgyi is a visual encoding that skips normalization).
    fn skip_normalize(&self) -> bool {
        false
    }
}

/// Resolves a script to its shaper (§4.9's dispatch table). Anything not
/// named here gets the generic default shaper — the right behavior for
/// Latin/Cyrillic/Greek/Han/Hiragana/Katakana and any unrecognized script.
pub fn shaper_for_script(script: Script) -> &'static dyn ComplexShaper {
    if script == script::ARABIC
        || script == script::SYRIAC
        || script == script::NKO
        || script == script::MANDAIC
        || script == script::MONGOLIAN
    {
        return &arabic::ArabicShaper;
    }
    if script == script::HEBREW {
        return &hebrew::HebrewShaper;
    }
    if script == script::THAI || script == script::LAO {
        return &thai::ThaiShaper;
    }
    if script == script::HANGUL {
        return &hangul::HangulShaper;
    }
    if script == script::MYANMAR || script == script::MYANMAR_ZAWGYI {
        return &myanmar::MyanmarShaper;
    }
    if script == script::KHMER {
        return &khmer::KhmerShaper;
    }
    if is_indic(script) {
        return &indic::IndicShaper;
    }
    if is_use(script) {
        return &use_shaper::UseShaper;
    }
    &default::DefaultShaper
}

fn is_indic(s: Script) -> bool {
    s == script::DEVANAGARI
        || s == script::BENGALI
        || s == script::GURMUKHI
        || s == script::GUJARATI
        || s == script::ORIYA
        || s == script::TAMIL
        || s == script::TELUGU
        || s == script::KANNADA
        || s == script::MALAYALAM
        || s == script::SINHALA
}

fn is_use(s: Script) -> bool {
    s == script::TIBETAN
        || s == script::TAI_THAM
        || s == script::JAVANESE
        || s == script::BALINESE
        || s == script::SUNDANESE
        || s == script::BATAK
        || s == script::BUGINESE
        || s == script::TAGALOG
        || s == script::NEW_TAI_LUE
        || s == script::CHAM
        || s == script::KAYAH_LI
        || s == script::REJANG
        || s == script::SAURASHTRA
        || s == script::SYLOTI_NAGRI
        || s == script::TIFINAGH
}
