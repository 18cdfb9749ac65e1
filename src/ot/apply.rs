//! The skippy iterator & apply context (C5): direction-aware glyph iteration
//! with `LookupFlag`/GDEF/mask filtering, and nested-lookup recursion.

use crate::buffer::{Buffer, GlyphClass, GlyphFlags, GlyphInfo};
use crate::face::Face;
use crate::ot::gdef::Gdef;
use crate::ot::layout::LookupFlag;
use crate::Mask;

/// Bounds nested-lookup recursion (§4.3 Recurse, §7 "recursion exhausted").
pub const MAX_NESTING_LEVEL: u8 = 6;
/// Bounds total subtable-application attempts per buffer, guarding against
/// pathological contextual-lookup cycles in adversarial font data.
pub const MAX_OPS_FACTOR: i32 = 64;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TableType {
    Gsub,
    Gpos,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MatchResult {
    Yes,
    Maybe,
    No,
}

/// The apply context threaded through one lookup's subtable application
/// (§4.3). Owns the skippy-matching configuration; the buffer and face are
/// borrowed for the duration of one `apply_lookup` call.
pub struct ApplyContext<'a> {
    pub face: &'a Face<'a>,
    pub gdef: Option<&'a Gdef<'a>>,
    pub table_type: TableType,
    pub lookup_flag: LookupFlag,
    pub mark_filtering_set: Option<u16>,
    pub feature_mask: Mask,
    /// The active feature's requested value (§4.4 type 3 Alternate).
    pub feature_value: u32,
    pub auto_zwnj: bool,
    pub auto_zwj: bool,
    pub per_syllable: bool,
    pub random: bool,
    pub nesting_level: u8,
    pub ops_budget: i32,
    last_base: Option<usize>,
    last_base_until: usize,
}

impl<'a> ApplyContext<'a> {
    pub fn new(face: &'a Face<'a>, gdef: Option<&'a Gdef<'a>>, table_type: TableType) -> Self {
        ApplyContext {
            face,
            gdef,
            table_type,
            lookup_flag: LookupFlag::empty(),
            mark_filtering_set: None,
            feature_mask: !0,
            feature_value: 0,
            auto_zwnj: true,
            auto_zwj: true,
            per_syllable: false,
            random: false,
            nesting_level: MAX_NESTING_LEVEL,
            ops_budget: 0,
            last_base: None,
            last_base_until: 0,
        }
    }

    fn class_of(&self, info: &GlyphInfo) -> GlyphClass {
        if let Some(gdef) = self.gdef {
            if !gdef.blocklisted {
                return gdef.glyph_class(info.glyph_id);
            }
        }
        info.glyph_class
    }

    fn mark_attachment_class(&self, info: &GlyphInfo) -> u8 {
        if let Some(gdef) = self.gdef {
            if !gdef.blocklisted {
                return gdef.mark_attachment_class(info.glyph_id);
            }
        }
        info.mark_attachment_class
    }

    /// §4.3 `may_skip`.
    pub fn may_skip(&self, info: &GlyphInfo, reference_syllable: Option<u8>, context_match: bool) -> MatchResult {
        let class = self.class_of(info);

        let class_excluded = match class {
            GlyphClass::Base => self.lookup_flag.contains(LookupFlag::IGNORE_BASE_GLYPHS),
            GlyphClass::Ligature => self.lookup_flag.contains(LookupFlag::IGNORE_LIGATURES),
            GlyphClass::Mark => self.lookup_flag.contains(LookupFlag::IGNORE_MARKS),
            _ => false,
        };
        if class_excluded {
            return MatchResult::Yes;
        }

        if class == GlyphClass::Mark {
            let wanted = self.lookup_flag.mark_attachment_type();
            if wanted != 0 && self.mark_attachment_class(info) != wanted {
                return MatchResult::Yes;
            }

            if self.lookup_flag.contains(LookupFlag::USE_MARK_FILTERING_SET) {
                let covers = self
                    .mark_filtering_set
                    .zip(self.gdef)
                    .map(|(set, gdef)| gdef.mark_set_covers(set, info.glyph_id))
                    .unwrap_or(true);
                if !covers {
                    return MatchResult::Yes;
                }
            }
        }

        if let Some(syllable) = reference_syllable {
            if self.per_syllable && info.syllable.0 != 0 && info.syllable.0 != syllable {
                return MatchResult::Yes;
            }
        }

        if self.table_type == TableType::Gsub {
            if info.is_zwnj() && self.auto_zwnj {
                return MatchResult::Yes;
            }
            if info.is_zwj() && self.auto_zwj {
                return MatchResult::Yes;
            }
        }

        if info.glyph_props.contains(GlyphFlags::DEFAULT_IGNORABLE) {
            return match self.table_type {
                // GPOS ignores all hidden ignorables outright.
                TableType::Gpos => MatchResult::Maybe,
                TableType::Gsub => {
                    if info.is_hidden() {
                        MatchResult::Maybe
                    } else if !context_match {
                        MatchResult::Maybe
                    } else {
                        MatchResult::No
                    }
                }
            };
        }

        MatchResult::No
    }

    /// Steps forward from `start` (exclusive), matching `want.len()` glyphs
    /// against `matches`, skipping glyphs per `may_skip`. Returns the skippy
    /// positions of the matched glyphs on success (§4.3).
    pub fn match_input(
        &self,
        buffer: &Buffer,
        start: usize,
        want: usize,
        reference_syllable: Option<u8>,
        mut matches: impl FnMut(usize, &GlyphInfo) -> bool,
    ) -> Option<Vec<usize>> {
        let mut positions = Vec::with_capacity(want);
        let mut i = start;
        let len = buffer.len();
        let mut budget = self.ops_budget.max(1) as i64 * 16;

        while positions.len() < want {
            if i >= len || budget <= 0 {
                return None;
            }
            budget -= 1;

            let info = &buffer.info()[i];
            if positions.is_empty() {
                // First glyph (buffer.idx()) is always consumed by the caller
                // before matching the rest; treat index 0 specially only if
                // want == 0 shouldn't happen.
            }

            let skip = self.may_skip(info, reference_syllable, true);
            if skip == MatchResult::Yes {
                i += 1;
                continue;
            }

            if matches(positions.len(), info) {
                positions.push(i);
                i += 1;
                continue;
            }

            if skip == MatchResult::Maybe {
                i += 1;
                continue;
            }

            return None;
        }

        Some(positions)
    }

    /// Backtrack match: reads `info[0..idx]` or, while GSUB output is
    /// staged, `out_info[0..out_len]` (invariant 7).
    pub fn match_backtrack(
        &self,
        buffer: &Buffer,
        want: usize,
        mut matches: impl FnMut(usize, &GlyphInfo) -> bool,
    ) -> bool {
        let backtrack = buffer.out_info();
        let mut i = backtrack.len();
        let mut matched = 0;
        let mut budget = self.ops_budget.max(1) as i64 * 16;

        while matched < want {
            if i == 0 || budget <= 0 {
                return false;
            }
            budget -= 1;
            i -= 1;

            let info = &backtrack[i];
            let skip = self.may_skip(info, None, true);
            if skip == MatchResult::Yes {
                continue;
            }

            if matches(matched, info) {
                matched += 1;
                continue;
            }

            if skip == MatchResult::Maybe {
                continue;
            }

            return false;
        }

        true
    }

    /// Lookahead match: reads `info[idx+1..]` (forward tail, never staged
    /// output — the tail hasn't been substituted yet).
    pub fn match_lookahead(
        &self,
        buffer: &Buffer,
        start: usize,
        want: usize,
        mut matches: impl FnMut(usize, &GlyphInfo) -> bool,
    ) -> bool {
        let mut i = start;
        let len = buffer.len();
        let mut matched = 0;
        let mut budget = self.ops_budget.max(1) as i64 * 16;

        while matched < want {
            if i >= len || budget <= 0 {
                return false;
            }
            budget -= 1;

            let info = &buffer.info()[i];
            let skip = self.may_skip(info, None, true);
            if skip == MatchResult::Yes {
                i += 1;
                continue;
            }

            if matches(matched, info) {
                matched += 1;
                i += 1;
                continue;
            }

            if skip == MatchResult::Maybe {
                i += 1;
                continue;
            }

            return false;
        }

        true
    }

    /// Finds the next glyph, searching backward from `before` (exclusive),
    /// that the current lookup flag would *not* skip and that `accept`
    /// approves — used by GPOS MarkBase/MarkLig/MarkMark and Cursive (§4.5),
    /// each of which rejects a different set of otherwise-unskipped glyphs
    /// (e.g. MarkBase rejects non-first members of a multiple-substitution
    /// sequence). Caches the search via `last_base`/`last_base_until` so a
    /// left-to-right sweep is amortized O(n) rather than O(n^2); callers with
    /// different `accept` predicates must call `invalidate_base_cache` first
    /// since the cache doesn't know which predicate produced it.
    pub fn find_base_backward(
        &mut self,
        buffer: &Buffer,
        before: usize,
        accept: impl Fn(&GlyphInfo) -> bool,
    ) -> Option<usize> {
        if self.last_base.is_some() && self.last_base_until == before {
            return self.last_base;
        }

        let mut i = before;
        let found = loop {
            if i == 0 {
                break None;
            }
            i -= 1;
            let info = &buffer.info()[i];
            if self.may_skip(info, None, false) == MatchResult::No && accept(info) {
                break Some(i);
            }
        };

        self.last_base = found;
        self.last_base_until = before;
        found
    }

    pub fn invalidate_base_cache(&mut self) {
        self.last_base = None;
        self.last_base_until = 0;
    }
}
