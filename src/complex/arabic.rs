//! The Arabic joining machine (§4.8): shared by Arabic, Syriac, N'Ko, Mandaic
//! and Mongolian, all of which join contextually via a small DFA over the
//! Unicode `ArabicShaping.txt` joining classes.

use unicode_general_category::GeneralCategory as GC;

use crate::buffer::{Buffer, BufferScratchFlags, GlyphInfo};
use crate::common::script;
use crate::face::Face;
use crate::ot::feature::feature;
use crate::ot::map::FeatureFlags;
use crate::ot::plan::{ShapePlan, ShapePlanner};
use crate::unicode::{modified_combining_class, CharExt};
use crate::Mask;

use super::ComplexShaper;

const ARABIC_HAS_STCH: BufferScratchFlags = BufferScratchFlags::COMPLEX0;

const ARABIC_FEATURES: &[crate::Tag] = &[
    feature::ISOLATED_FORMS,
    feature::TERMINAL_FORMS_1,
    feature::TERMINAL_FORMS_2,
    feature::TERMINAL_FORMS_3,
    feature::MEDIAL_FORMS_1,
    feature::MEDIAL_FORMS_2,
    feature::INITIAL_FORMS,
];

fn feature_is_syriac(tag: crate::Tag) -> bool {
    matches!(tag.to_bytes()[3], b'2' | b'3')
}

/// The pause id Arabic registers via `Map::add_gsub_pause` to record which
/// glyphs the `stch` feature multiplied, before anything later clobbers the
/// ligature-component numbering `record_stch` reads.
const PAUSE_RECORD_STCH: u8 = 0;
/// A no-op pause kept to match the feature order's documented gap between
/// `ccmp`/`locl` and the positional-forms features.
const PAUSE_PRE_POSITIONAL: u8 = 1;
/// A plain separator pause between each positional-forms feature.
const PAUSE_POSITIONAL: u8 = 2;
/// After `rlig`, where a C-interop HarfBuzz build hooks fallback
/// presentation-form substitution for fonts with no Arabic GSUB at all.
const PAUSE_FALLBACK_SHAPE: u8 = 3;
/// After `rclt`/`calt`.
const PAUSE_POST_CONTEXTUAL: u8 = 4;

#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Action {
    Isol = 0,
    Fina = 1,
    Fin2 = 2,
    Fin3 = 3,
    Medi = 4,
    Med2 = 5,
    Init = 6,
    None = 7,
    StretchingFixed = 8,
    StretchingRepeating = 9,
}

impl Action {
    fn is_stch(self) -> bool {
        matches!(self, Action::StretchingFixed | Action::StretchingRepeating)
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => Action::Isol,
            1 => Action::Fina,
            2 => Action::Fin2,
            3 => Action::Fin3,
            4 => Action::Medi,
            5 => Action::Med2,
            6 => Action::Init,
            8 => Action::StretchingFixed,
            9 => Action::StretchingRepeating,
            _ => Action::None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(super) enum JoiningType {
    U = 0,
    L = 1,
    R = 2,
    D = 3,
    GroupAlaph = 4,
    GroupDalathRish = 5,
    T = 7,
    X = 8,
}

#[rustfmt::skip]
const STATE_TABLE: &[[(Action, Action, u16); 6]] = &[
    // jt_U,             jt_L,             jt_R,
    // jt_D,             jg_ALAPH,         jg_DALATH_RISH

    // State 0: prev was U, not willing to join.
    [
        (Action::None, Action::None, 0), (Action::None, Action::Isol, 2), (Action::None, Action::Isol, 1),
        (Action::None, Action::Isol, 2), (Action::None, Action::Isol, 1), (Action::None, Action::Isol, 6),
    ],
    // State 1: prev was R or ISOL/ALAPH, not willing to join.
    [
        (Action::None, Action::None, 0), (Action::None, Action::Isol, 2), (Action::None, Action::Isol, 1),
        (Action::None, Action::Isol, 2), (Action::None, Action::Fin2, 5), (Action::None, Action::Isol, 6),
    ],
    // State 2: prev was D/L in ISOL form, willing to join.
    [
        (Action::None, Action::None, 0), (Action::None, Action::Isol, 2), (Action::Init, Action::Fina, 1),
        (Action::Init, Action::Fina, 3), (Action::Init, Action::Fina, 4), (Action::Init, Action::Fina, 6),
    ],
    // State 3: prev was D in FINA form, willing to join.
    [
        (Action::None, Action::None, 0), (Action::None, Action::Isol, 2), (Action::Medi, Action::Fina, 1),
        (Action::Medi, Action::Fina, 3), (Action::Medi, Action::Fina, 4), (Action::Medi, Action::Fina, 6),
    ],
    // State 4: prev was FINA ALAPH, not willing to join.
    [
        (Action::None, Action::None, 0), (Action::None, Action::Isol, 2), (Action::Med2, Action::Isol, 1),
        (Action::Med2, Action::Isol, 2), (Action::Med2, Action::Fin2, 5), (Action::Med2, Action::Isol, 6),
    ],
    // State 5: prev was FIN2/FIN3 ALAPH, not willing to join.
    [
        (Action::None, Action::None, 0), (Action::None, Action::Isol, 2), (Action::Isol, Action::Isol, 1),
        (Action::Isol, Action::Isol, 2), (Action::Isol, Action::Fin2, 5), (Action::Isol, Action::Isol, 6),
    ],
    // State 6: prev was DALATH/RISH, not willing to join.
    [
        (Action::None, Action::None, 0), (Action::None, Action::Isol, 2), (Action::None, Action::Isol, 1),
        (Action::None, Action::Isol, 2), (Action::None, Action::Fin3, 5), (Action::None, Action::Isol, 6),
    ],
];

// http://www.unicode.org/reports/tr53/
const MODIFIER_COMBINING_MARKS: &[u32] = &[
    0x0654, 0x0655, 0x0658, 0x06DC, 0x06E3, 0x06E7, 0x06E8, 0x08D3, 0x08F3,
];

pub struct ArabicShaper;

impl ComplexShaper for ArabicShaper {
    fn collect_features(&self, planner: &mut ShapePlanner) {
        planner.ot_map.enable_feature(feature::STRETCHING_GLYPH_DECOMPOSITION, FeatureFlags::empty(), 1);
        planner.ot_map.add_gsub_pause(PAUSE_RECORD_STCH);

        planner.ot_map.enable_feature(feature::GLYPH_COMPOSITION_DECOMPOSITION, FeatureFlags::empty(), 1);
        planner.ot_map.enable_feature(feature::LOCALIZED_FORMS, FeatureFlags::empty(), 1);

        planner.ot_map.add_gsub_pause(PAUSE_PRE_POSITIONAL);

        for &tag in ARABIC_FEATURES {
            let has_fallback = planner.script == script::ARABIC && !feature_is_syriac(tag);
            let flags = if has_fallback { FeatureFlags::HAS_FALLBACK } else { FeatureFlags::empty() };
            planner.ot_map.add_feature(tag, flags, 1);
            planner.ot_map.add_gsub_pause(PAUSE_POSITIONAL);
        }

        // Unicode says ZWNJ means "don't ligate"; Arabic additionally treats
        // ZWJ that way, so the main ligating features run as MANUAL_ZWJ.
        planner.ot_map.enable_feature(
            feature::REQUIRED_LIGATURES,
            FeatureFlags::MANUAL_ZWJ | FeatureFlags::HAS_FALLBACK,
            1,
        );

        if planner.script == script::ARABIC {
            planner.ot_map.add_gsub_pause(PAUSE_FALLBACK_SHAPE);
        }

        planner.ot_map.enable_feature(feature::REQUIRED_CONTEXTUAL_ALTERNATES, FeatureFlags::MANUAL_ZWJ, 1);
        planner.ot_map.enable_feature(feature::CONTEXTUAL_ALTERNATES, FeatureFlags::MANUAL_ZWJ, 1);
        planner.ot_map.add_gsub_pause(PAUSE_POST_CONTEXTUAL);

        planner.ot_map.enable_feature(feature::MARK_POSITIONING_VIA_SUBSTITUTION, FeatureFlags::empty(), 1);
    }

    fn setup_masks(&self, plan: &ShapePlan, _face: &Face, buffer: &mut Buffer) {
        arabic_joining(buffer);
        if plan.script == script::MONGOLIAN {
            mongolian_variation_selectors(buffer);
        }

        let masks: Vec<Mask> = ARABIC_FEATURES.iter().map(|&tag| plan.ot_map.get_1_mask(tag)).collect();

        let len = buffer.len();
        let info = buffer.info_mut();
        for i in 0..len {
            let action = Action::from_u8(info[i].arabic_shaping_action);
            if action != Action::None && (action as usize) < masks.len() {
                info[i].mask |= masks[action as usize];
            }
        }
    }

    fn gsub_pause(&self, pause: u8, plan: &ShapePlan, _face: &Face, buffer: &mut Buffer) {
        if pause == PAUSE_RECORD_STCH {
            record_stch(plan, buffer);
        }
        // PAUSE_FALLBACK_SHAPE is where a C-interop HarfBuzz build would
        // synthesize presentation-form substitutions for fonts lacking
        // Arabic GSUB lookups entirely; this pure-Rust shaper has no such
        // fallback renderer, so the pause is a no-op here.
    }

    fn postprocess_glyphs(&self, _plan: &ShapePlan, face: &Face, buffer: &mut Buffer) {
        apply_stch(face, buffer);
    }

    fn reorder_marks(&self) -> Option<fn(&mut Buffer, usize, usize)> {
        Some(reorder_marks)
    }
}

fn record_stch(plan: &ShapePlan, buffer: &mut Buffer) {
    if plan.ot_map.get_1_mask(feature::STRETCHING_GLYPH_DECOMPOSITION) == 0 {
        return;
    }

    let len = buffer.len();
    let info = buffer.info_mut();
    let mut has_stch = false;
    for i in 0..len {
        if info[i].is_multiplied() {
            let comp = if info[i].lig_comp() % 2 != 0 {
                Action::StretchingRepeating
            } else {
                Action::StretchingFixed
            };
            info[i].arabic_shaping_action = comp as u8;
            has_stch = true;
        }
    }

    if has_stch {
        buffer.set_scratch_flags(buffer.scratch_flags() | ARABIC_HAS_STCH);
    }
}

fn apply_stch(face: &Face, buffer: &mut Buffer) {
    if !buffer.scratch_flags().contains(ARABIC_HAS_STCH) {
        return;
    }

    // The Arabic shaper runs right-to-left, so stretched pieces are
    // positioned to the left of / before the glyphs they widen.
    //
    // Two passes: the first measures how many extra glyphs are needed, the
    // second writes the stretched sequence into the enlarged buffer. Both
    // passes rescan the same original `base_len` glyphs; only `ensure`'s
    // resize between them grows the buffer.
    let base_len = buffer.len();
    let mut extra_glyphs_needed: usize = 0;
    const MEASURE: usize = 0;
    const CUT: usize = 1;

    for step in 0..2 {
        let new_len = base_len + extra_glyphs_needed;
        let mut i = base_len;
        let mut j = new_len;
        while i != 0 {
            if !Action::from_u8(buffer.info()[i - 1].arabic_shaping_action).is_stch() {
                if step == CUT {
                    j -= 1;
                    buffer.info_mut()[j] = buffer.info()[i - 1];
                    buffer.pos_mut()[j] = buffer.pos()[i - 1];
                }
                i -= 1;
                continue;
            }

            let mut w_total = 0i32;
            let mut w_fixed = 0i32;
            let mut w_repeating = 0i32;
            let mut n_repeating: i32 = 0;

            let end = i;
            while i != 0 && Action::from_u8(buffer.info()[i - 1].arabic_shaping_action).is_stch() {
                i -= 1;
                let width = face.glyph_hor_advance(buffer.info()[i].glyph_id).unwrap_or(0) as i32;
                if Action::from_u8(buffer.info()[i].arabic_shaping_action) == Action::StretchingFixed {
                    w_fixed += width;
                } else {
                    w_repeating += width;
                    n_repeating += 1;
                }
            }

            let start = i;
            let mut context = i;
            while context != 0
                && !Action::from_u8(buffer.info()[context - 1].arabic_shaping_action).is_stch()
                && (buffer.info()[context - 1].is_default_ignorable()
                    || is_word_category(buffer.info()[context - 1].general_category()))
            {
                context -= 1;
                w_total += buffer.pos()[context].x_advance;
            }

            i += 1;

            let mut n_copies: i32 = 0;
            let w_remaining = w_total - w_fixed;
            if w_remaining > w_repeating && w_repeating > 0 {
                n_copies = w_remaining / w_repeating - 1;
            }

            let mut extra_repeat_overlap = 0;
            let shortfall = w_remaining - w_repeating * (n_copies + 1);
            if shortfall > 0 && n_repeating > 0 {
                n_copies += 1;
                let excess = (n_copies + 1) * w_repeating - w_remaining;
                if excess > 0 {
                    extra_repeat_overlap = excess / (n_copies * n_repeating);
                }
            }

            if step == MEASURE {
                extra_glyphs_needed += (n_copies * n_repeating) as usize;
            } else {
                buffer.unsafe_to_break(context, end);
                let mut x_offset = 0;
                for k in (start + 1..=end).rev() {
                    let width = face.glyph_hor_advance(buffer.info()[k - 1].glyph_id).unwrap_or(0) as i32;

                    let mut repeat = 1;
                    if Action::from_u8(buffer.info()[k - 1].arabic_shaping_action) == Action::StretchingRepeating {
                        repeat += n_copies;
                    }

                    for n in 0..repeat {
                        x_offset -= width;
                        if n > 0 {
                            x_offset += extra_repeat_overlap;
                        }

                        buffer.pos_mut()[k - 1].x_offset = x_offset;

                        j -= 1;
                        buffer.info_mut()[j] = buffer.info()[k - 1];
                        buffer.pos_mut()[j] = buffer.pos()[k - 1];
                    }
                }
            }

            i -= 1;
        }

        if step == MEASURE {
            buffer.ensure(base_len + extra_glyphs_needed);
        } else {
            debug_assert_eq!(j, 0);
            buffer.set_len(new_len);
        }
    }
}

// https://github.com/harfbuzz/harfbuzz/commit/6e6f82b6f3dde0fc6c3c7d991d9ec6cfff57823d#commitcomment-14248516
fn is_word_category(gc: GC) -> bool {
    matches!(
        gc,
        GC::Unassigned
            | GC::PrivateUse
            | GC::ModifierLetter
            | GC::OtherLetter
            | GC::SpacingMark
            | GC::EnclosingMark
            | GC::NonspacingMark
            | GC::DecimalNumber
            | GC::LetterNumber
            | GC::OtherNumber
            | GC::CurrencySymbol
            | GC::ModifierSymbol
            | GC::MathSymbol
            | GC::OtherSymbol
    )
}

fn arabic_joining(buffer: &mut Buffer) {
    let mut prev: Option<usize> = None;
    let mut state = 0usize;

    for i in 0..buffer.context_len(0) {
        let c = buffer.context(0, i);
        let this_type = get_joining_type(c, c.general_category());
        if this_type == JoiningType::T {
            continue;
        }
        state = STATE_TABLE[state][this_type as usize].2 as usize;
        break;
    }

    for i in 0..buffer.len() {
        let this_type = get_joining_type(buffer.info()[i].as_char(), buffer.info()[i].general_category());
        if this_type == JoiningType::T {
            buffer.info_mut()[i].arabic_shaping_action = Action::None as u8;
            continue;
        }

        let entry = &STATE_TABLE[state][this_type as usize];
        if entry.0 != Action::None {
            if let Some(prev) = prev {
                buffer.info_mut()[prev].arabic_shaping_action = entry.0 as u8;
                buffer.unsafe_to_break(prev, i + 1);
            }
        }

        buffer.info_mut()[i].arabic_shaping_action = entry.1 as u8;

        prev = Some(i);
        state = entry.2 as usize;
    }

    for i in 0..buffer.context_len(1) {
        let c = buffer.context(1, i);
        let this_type = get_joining_type(c, c.general_category());
        if this_type == JoiningType::T {
            continue;
        }

        let entry = &STATE_TABLE[state][this_type as usize];
        if entry.0 != Action::None {
            if let Some(prev) = prev {
                buffer.info_mut()[prev].arabic_shaping_action = entry.0 as u8;
            }
        }
        break;
    }
}

fn mongolian_variation_selectors(buffer: &mut Buffer) {
    let len = buffer.len();
    let info = buffer.info_mut();
    for i in 1..len {
        if (0x180B..=0x180D).contains(&info[i].codepoint) {
            info[i].arabic_shaping_action = info[i - 1].arabic_shaping_action;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined_actions(text: &str) -> Vec<Action> {
        let mut buffer = Buffer::new();
        buffer.push_str(text);
        arabic_joining(&mut buffer);
        buffer.info().iter().map(|g| Action::from_u8(g.arabic_shaping_action)).collect()
    }

    #[test]
    fn three_dual_joining_letters_get_init_medi_fina() {
        // BEH, HAH, MEEM: all dual-joining, so the middle glyph is medial
        // and the ends take the initial/final forms.
        assert_eq!(
            joined_actions("\u{0628}\u{062D}\u{0645}"),
            vec![Action::Init, Action::Medi, Action::Fina]
        );
    }

    #[test]
    fn isolated_right_joining_letter_stays_isol() {
        // ALEF on its own (no preceding joiner) takes its isolated form.
        assert_eq!(joined_actions("\u{0627}"), vec![Action::Isol]);
    }

    #[test]
    fn right_joining_letter_ends_a_run() {
        // LAM (dual-joining) followed by ALEF (right-joining only): LAM
        // takes an initial form, ALEF a final one, and nothing after ALEF
        // can join to it since R only accepts a join from its left.
        assert_eq!(joined_actions("\u{0644}\u{0627}"), vec![Action::Init, Action::Fina]);
    }

    #[test]
    fn non_joining_letter_breaks_the_chain() {
        // BEH, then a transparent combining mark, then another BEH: the
        // transparent glyph (type T) is skipped by the state machine and
        // does not interrupt the join between the two BEHs.
        let actions = joined_actions("\u{0628}\u{0610}\u{0628}");
        assert_eq!(actions[0], Action::Init);
        assert_eq!(actions[2], Action::Fina);
    }
}

fn get_joining_type(u: char, gc: unicode_general_category::GeneralCategory) -> JoiningType {
    let j_type = super::arabic_table::joining_type(u);
    if j_type != JoiningType::X {
        return j_type;
    }

    let transparent = matches!(gc, GC::NonspacingMark | GC::EnclosingMark | GC::Format);
    if transparent {
        JoiningType::T
    } else {
        JoiningType::U
    }
}

fn reorder_marks(buffer: &mut Buffer, mut start: usize, end: usize) {
    const MAX_COMBINING_MARKS: usize = 32;

    let mut i = start;
    for cc in [220u8, 230].iter().copied() {
        while i < end && buffer.info()[i].modified_combining_class() < cc {
            i += 1;
        }

        if i == end {
            break;
        }

        if buffer.info()[i].modified_combining_class() > cc {
            continue;
        }

        let mut j = i;
        while j < end
            && buffer.info()[j].modified_combining_class() == cc
            && MODIFIER_COMBINING_MARKS.contains(&buffer.info()[j].codepoint)
        {
            j += 1;
        }

        if i == j {
            continue;
        }

        let mut temp = [GlyphInfo::default(); MAX_COMBINING_MARKS];
        debug_assert!(j - i <= MAX_COMBINING_MARKS);
        buffer.merge_clusters(start, j);

        for k in 0..j - i {
            temp[k] = buffer.info()[k + i];
        }
        for k in (0..i - start).rev() {
            buffer.info_mut()[k + start + j - i] = buffer.info()[k + start];
        }
        for k in 0..j - i {
            buffer.info_mut()[k + start] = temp[k];
        }

        // Renumber so the reordered run stays sorted; 22/26 are smaller than
        // every Arabic class and fold back to 220/230 in fallback mark
        // positioning (§4.10), matching the normalizer's CGJ-handling
        // assumption that mark sequences are non-decreasing.
        let new_start = start + j - i;
        let new_cc = if cc == 220 { modified_combining_class::CCC22 } else { modified_combining_class::CCC26 };

        while start < new_start {
            buffer.info_mut()[start].set_modified_combining_class(new_cc);
            start += 1;
        }

        i = j;
    }
}
