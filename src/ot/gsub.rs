//! GSUB subtables, types 1-8 (C3, §4.4), and the lookup-application loop
//! that drives them through the two-buffer protocol.

use crate::buffer::{Buffer, GlyphFlags, GlyphInfo, LigatureProps};
use crate::ot::apply::{ApplyContext, MatchResult, TableType};
use crate::ot::coverage::Coverage;
use crate::ot::gdef::resolve_extension;
use crate::ot::layout::{LookupList, LookupTable};
use crate::parser::{offset16, FromData, LazyArray, Stream};
use crate::GlyphId;

/// Type 1: either a `delta`-applied format or a direct substitute-array map.
enum SingleSubst<'a> {
    Delta { coverage: Coverage<'a>, delta: i16 },
    Map { coverage: Coverage<'a>, substitutes: LazyArray<'a, GlyphId> },
}

impl<'a> SingleSubst<'a> {
    fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let format: u16 = s.read()?;
        let coverage = offset16(data, 2).and_then(Coverage::parse)?;
        match format {
            1 => {
                let delta: i16 = Stream::read_at(data, 4)?;
                Some(SingleSubst::Delta { coverage, delta })
            }
            2 => {
                let mut s = Stream::new_at(data, 4)?;
                let substitutes = s.read_array16_counted()?;
                Some(SingleSubst::Map { coverage, substitutes })
            }
            _ => None,
        }
    }

    fn apply(&self, glyph: GlyphId) -> Option<GlyphId> {
        match self {
            SingleSubst::Delta { coverage, delta } => {
                coverage.get(glyph)?;
                Some(((glyph as i32 + *delta as i32) & 0xFFFF) as GlyphId)
            }
            SingleSubst::Map { coverage, substitutes } => {
                let index = coverage.get(glyph)?;
                substitutes.get(index)
            }
        }
    }
}

/// Type 2: one sequence of substitutes per covered glyph.
struct MultipleSubst<'a> {
    coverage: Coverage<'a>,
    data: &'a [u8],
    sequence_offsets: LazyArray<'a, u16>,
}

impl<'a> MultipleSubst<'a> {
    fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let _format: u16 = s.read()?;
        let coverage = offset16(data, 2).and_then(Coverage::parse)?;
        let mut s = Stream::new_at(data, 4)?;
        let sequence_offsets = s.read_array16_counted()?;
        Some(MultipleSubst { coverage, data, sequence_offsets })
    }

    fn sequence(&self, glyph: GlyphId) -> Option<LazyArray<'a, GlyphId>> {
        let index = self.coverage.get(glyph)?;
        let offset = self.sequence_offsets.get(index)?;
        let seq_data = self.data.get(usize::from(offset)..)?;
        let mut s = Stream::new(seq_data);
        s.read_array16_counted()
    }
}

/// Type 3: one alternate set per covered glyph.
struct AlternateSubst<'a> {
    coverage: Coverage<'a>,
    data: &'a [u8],
    set_offsets: LazyArray<'a, u16>,
}

impl<'a> AlternateSubst<'a> {
    fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let _format: u16 = s.read()?;
        let coverage = offset16(data, 2).and_then(Coverage::parse)?;
        let mut s = Stream::new_at(data, 4)?;
        let set_offsets = s.read_array16_counted()?;
        Some(AlternateSubst { coverage, data, set_offsets })
    }

    fn alternates(&self, glyph: GlyphId) -> Option<LazyArray<'a, GlyphId>> {
        let index = self.coverage.get(glyph)?;
        let offset = self.set_offsets.get(index)?;
        let set_data = self.data.get(usize::from(offset)..)?;
        let mut s = Stream::new(set_data);
        s.read_array16_counted()
    }
}

#[derive(Clone, Copy)]
struct LigatureRecord {
    ligature_glyph: GlyphId,
    component_count: u16,
    component_offset: usize,
}

/// Type 4: per first-glyph, a set of ligatures each matched against a
/// sequence of remaining component glyphs.
struct LigatureSubst<'a> {
    coverage: Coverage<'a>,
    data: &'a [u8],
    set_offsets: LazyArray<'a, u16>,
}

impl<'a> LigatureSubst<'a> {
    fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let _format: u16 = s.read()?;
        let coverage = offset16(data, 2).and_then(Coverage::parse)?;
        let mut s = Stream::new_at(data, 4)?;
        let set_offsets = s.read_array16_counted()?;
        Some(LigatureSubst { coverage, data, set_offsets })
    }

    fn ligature_set(&self, glyph: GlyphId) -> Option<&'a [u8]> {
        let index = self.coverage.get(glyph)?;
        let offset = self.set_offsets.get(index)?;
        self.data.get(usize::from(offset)..)
    }

    fn ligatures(set_data: &'a [u8]) -> Option<LazyArray<'a, u16>> {
        let mut s = Stream::new(set_data);
        s.read_array16_counted()
    }

    fn ligature(set_data: &'a [u8], offset: u16) -> Option<LigatureRecord> {
        let data = set_data.get(usize::from(offset)..)?;
        let mut s = Stream::new(data);
        let ligature_glyph: GlyphId = s.read()?;
        let component_count: u16 = s.read()?;
        Some(LigatureRecord { ligature_glyph, component_count, component_offset: s.offset() })
    }

    fn component(set_data: &'a [u8], rec: LigatureRecord, ligature_offset: u16, i: u16) -> Option<GlyphId> {
        // Components are stored relative to the ligature table start, one
        // fewer entry than `component_count` (the first component is the
        // covered glyph itself).
        let pos = usize::from(ligature_offset) + rec.component_offset + usize::from(i - 1) * 2;
        Stream::read_at(set_data, pos)
    }
}

enum GsubSubtable<'a> {
    Single(SingleSubst<'a>),
    Multiple(MultipleSubst<'a>),
    Alternate(AlternateSubst<'a>),
    Ligature(LigatureSubst<'a>),
    Context(crate::ot::context::ContextLookup<'a>),
    ChainContext(crate::ot::context::ChainContextLookup<'a>),
    ReverseChainSingle(ReverseChainSingleSubst<'a>),
}

/// Type 8: covered glyph + backtrack/lookahead coverage sequences + a
/// direct substitute array, applied backward without the output buffer.
struct ReverseChainSingleSubst<'a> {
    coverage: Coverage<'a>,
    backtrack: Vec<Coverage<'a>>,
    lookahead: Vec<Coverage<'a>>,
    substitutes: LazyArray<'a, GlyphId>,
}

impl<'a> ReverseChainSingleSubst<'a> {
    fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let _format: u16 = s.read()?;
        let coverage_offset: u16 = s.read()?;
        let coverage = data.get(usize::from(coverage_offset)..).and_then(Coverage::parse)?;

        let backtrack_count: u16 = s.read()?;
        let backtrack_offsets: LazyArray<u16> = s.read_array16(backtrack_count)?;
        let backtrack = backtrack_offsets
            .iter()
            .filter_map(|o| data.get(usize::from(o)..).and_then(Coverage::parse))
            .collect();

        let lookahead_count: u16 = s.read()?;
        let lookahead_offsets: LazyArray<u16> = s.read_array16(lookahead_count)?;
        let lookahead = lookahead_offsets
            .iter()
            .filter_map(|o| data.get(usize::from(o)..).and_then(Coverage::parse))
            .collect();

        let substitutes = s.read_array16_counted()?;
        Some(ReverseChainSingleSubst { coverage, backtrack, lookahead, substitutes })
    }
}

fn parse_subtable<'a>(lookup_type: u16, data: &'a [u8]) -> Option<GsubSubtable<'a>> {
    match lookup_type {
        1 => SingleSubst::parse(data).map(GsubSubtable::Single),
        2 => MultipleSubst::parse(data).map(GsubSubtable::Multiple),
        3 => AlternateSubst::parse(data).map(GsubSubtable::Alternate),
        4 => LigatureSubst::parse(data).map(GsubSubtable::Ligature),
        5 => crate::ot::context::ContextLookup::parse(data).map(GsubSubtable::Context),
        6 => crate::ot::context::ChainContextLookup::parse(data).map(GsubSubtable::ChainContext),
        7 => {
            let (inner_type, inner_data) = resolve_extension(data)?;
            parse_subtable(inner_type, inner_data)
        }
        8 => ReverseChainSingleSubst::parse(data).map(GsubSubtable::ReverseChainSingle),
        _ => None,
    }
}

/// One GSUB lookup: a parsed `LookupTable` header plus its subtables,
/// decoded lazily from the raw table bytes each time they're applied.
pub struct GsubLookup<'a> {
    table: LookupTable<'a>,
}

impl<'a> GsubLookup<'a> {
    pub fn new(table: LookupTable<'a>) -> Self {
        GsubLookup { table }
    }

    pub fn flag(&self) -> crate::ot::layout::LookupFlag {
        self.table.flag
    }

    pub fn mark_filtering_set(&self) -> Option<u16> {
        self.table.mark_filtering_set
    }

    fn subtables(&self) -> impl Iterator<Item = GsubSubtable<'a>> + '_ {
        (0..self.table.subtable_count()).filter_map(move |i| {
            self.table.subtable_data(i).and_then(|d| parse_subtable(self.table.lookup_type, d))
        })
    }

    /// Applies this lookup at `ctx.buffer.idx()` once, per the non-reverse
    /// apply protocol (§4.4): each subtable is tried left to right until one
    /// matches.
    pub fn apply_at_point(
        &self,
        ctx: &mut ApplyContext,
        lookups: &LookupList<'a>,
        buffer: &mut Buffer,
    ) -> bool {
        for subtable in self.subtables() {
            if apply_subtable(&subtable, ctx, lookups, buffer) {
                return true;
            }
        }
        false
    }

    /// Type 8 is always applied on its own, in reverse, with no output
    /// buffer (§4.4).
    pub fn apply_reverse(&self, ctx: &ApplyContext, buffer: &mut Buffer) {
        for subtable in self.subtables() {
            if let GsubSubtable::ReverseChainSingle(rev) = subtable {
                apply_reverse_chain(&rev, ctx, buffer);
            }
        }
    }

    pub fn is_reverse(&self) -> bool {
        self.table.lookup_type == 8
    }
}

fn apply_subtable<'a>(
    subtable: &GsubSubtable<'a>,
    ctx: &mut ApplyContext,
    lookups: &LookupList<'a>,
    buffer: &mut Buffer,
) -> bool {
    let idx = buffer.idx();
    let glyph = buffer.info()[idx].glyph_id;

    match subtable {
        GsubSubtable::Single(s) => match s.apply(glyph) {
            Some(sub) => {
                let mut info = buffer.output_glyph(sub);
                info.glyph_props |= GlyphFlags::SUBSTITUTED;
                let n = buffer.out_len();
                buffer.out_info_mut()[n - 1] = info;
                buffer.skip_glyph();
                true
            }
            None => false,
        },
        GsubSubtable::Multiple(m) => match m.sequence(glyph) {
            Some(seq) => {
                let ids: Vec<GlyphId> = seq.iter().collect();
                if ids.is_empty() {
                    // An empty sequence deletes the input glyph entirely.
                    buffer.skip_glyph();
                } else {
                    buffer.replace_glyphs(1, &ids);
                }
                true
            }
            None => false,
        },
        GsubSubtable::Alternate(a) => match a.alternates(glyph) {
            Some(alts) if alts.len() > 0 => {
                let requested = ctx.feature_value;
                let chosen = if ctx.random && requested == 0 {
                    let n = buffer.random_state.next();
                    alts.get((n % u32::from(alts.len())) as u16)
                } else if requested > 0 {
                    alts.get((requested - 1).min(u32::from(alts.len()) - 1) as u16)
                } else {
                    alts.get(0)
                };
                match chosen {
                    Some(sub) => {
                        let mut info = buffer.output_glyph(sub);
                        info.glyph_props |= GlyphFlags::SUBSTITUTED;
                        let n = buffer.out_len();
                        buffer.out_info_mut()[n - 1] = info;
                        buffer.skip_glyph();
                        true
                    }
                    None => false,
                }
            }
            _ => false,
        },
        GsubSubtable::Ligature(l) => apply_ligature(l, ctx, buffer),
        GsubSubtable::Context(c) => c.apply(ctx, lookups, buffer, apply_nested_gsub),
        GsubSubtable::ChainContext(c) => c.apply(ctx, lookups, buffer, apply_nested_gsub),
        GsubSubtable::ReverseChainSingle(_) => false,
    }
}

fn apply_ligature(l: &LigatureSubst, ctx: &mut ApplyContext, buffer: &mut Buffer) -> bool {
    let idx = buffer.idx();
    let glyph = buffer.info()[idx].glyph_id;
    let Some(set_data) = l.ligature_set(glyph) else { return false };
    let Some(offsets) = LigatureSubst::ligatures(set_data) else { return false };

    for i in 0..offsets.len() {
        let Some(offset) = offsets.get(i) else { continue };
        let Some(rec) = LigatureSubst::ligature(set_data, offset) else { continue };
        if rec.component_count == 0 {
            continue;
        }

        let want = usize::from(rec.component_count) - 1;
        let matched = ctx.match_input(buffer, idx + 1, want, None, |pos, info| {
            LigatureSubst::component(set_data, rec, offset, (pos + 1) as u16) == Some(info.glyph_id)
        });

        if let Some(positions) = matched {
            apply_ligature_match(buffer, idx, &positions, rec.ligature_glyph);
            return true;
        }
    }

    false
}

fn apply_ligature_match(buffer: &mut Buffer, first: usize, positions: &[usize], ligature: GlyphId) {
    let lig_id = buffer.allocate_lig_id();
    let end = *positions.last().unwrap_or(&first) + 1;
    buffer.merge_clusters(first, end);

    let mut base = buffer.cur(0);
    base.glyph_id = ligature;
    base.glyph_props |= GlyphFlags::LIGATED | GlyphFlags::SUBSTITUTED;
    base.lig_props = LigatureProps::new(lig_id, true, (positions.len() + 1) as u8);
    buffer.output_info(base);
    buffer.skip_glyph();

    // Anything skipped between `first+1` and the first matched component is
    // a mark: tag it with the ligature id, attached to "component 0" (the
    // base itself hasn't been consumed by anything yet).
    let mut prev_component = 0u8;
    let mut cursor = first + 1;
    for (component_index, &pos) in positions.iter().enumerate() {
        while cursor < pos {
            let mut mark = buffer.info()[cursor];
            mark.lig_props = LigatureProps::new(lig_id, false, prev_component);
            buffer.output_info(mark);
            buffer.skip_glyph();
            cursor += 1;
        }
        // The matched component itself is consumed without emitting output.
        buffer.skip_glyph();
        cursor = pos + 1;
        prev_component = (component_index + 1) as u8;
    }
}

fn apply_reverse_chain(rev: &ReverseChainSingleSubst, ctx: &ApplyContext, buffer: &mut Buffer) {
    let len = buffer.len();
    for i in (0..len).rev() {
        let glyph = buffer.info()[i].glyph_id;
        let Some(index) = rev.coverage.get(glyph) else { continue };

        let backtrack_ok = match_reverse_context(&rev.backtrack, &buffer.info()[..i], true);
        let lookahead_ok = match_reverse_context(&rev.lookahead, &buffer.info()[i + 1..], false);
        if !backtrack_ok || !lookahead_ok {
            continue;
        }

        if ctx.may_skip(&buffer.info()[i], None, false) == MatchResult::Yes {
            continue;
        }

        if let Some(sub) = rev.substitutes.get(index) {
            buffer.info_mut()[i].glyph_id = sub;
            buffer.info_mut()[i].glyph_props |= GlyphFlags::SUBSTITUTED;
        }
    }
}

fn match_reverse_context(coverages: &[Coverage], glyphs: &[GlyphInfo], backward: bool) -> bool {
    if coverages.len() > glyphs.len() {
        return false;
    }
    for (i, cov) in coverages.iter().enumerate() {
        let g = if backward {
            glyphs[glyphs.len() - 1 - i].glyph_id
        } else {
            glyphs[i].glyph_id
        };
        if !cov.contains(g) {
            return false;
        }
    }
    true
}

/// Dispatches a nested lookup index during context/chained-context
/// recursion (§4.4 type 5/6, §7's `recurse_func`). Bounded by
/// `ctx.nesting_level`.
fn apply_nested_gsub(ctx: &mut ApplyContext, lookups: &LookupList, buffer: &mut Buffer, lookup_index: u16) -> bool {
    if ctx.nesting_level == 0 {
        return false;
    }
    let Some(table) = lookups.get(lookup_index) else { return false };
    let lookup = GsubLookup::new(table);

    let saved_flag = ctx.lookup_flag;
    let saved_set = ctx.mark_filtering_set;
    ctx.lookup_flag = lookup.flag();
    ctx.mark_filtering_set = lookup.mark_filtering_set();
    ctx.nesting_level -= 1;

    let applied = lookup.apply_at_point(ctx, lookups, buffer);

    ctx.nesting_level += 1;
    ctx.lookup_flag = saved_flag;
    ctx.mark_filtering_set = saved_set;
    applied
}

/// Drives one GSUB lookup across the whole buffer (§4.4 apply protocol).
pub fn apply_lookup(ctx: &mut ApplyContext, lookups: &LookupList, lookup_index: u16, buffer: &mut Buffer) {
    let Some(table) = lookups.get(lookup_index) else { return };
    let lookup = GsubLookup::new(table);

    ctx.lookup_flag = lookup.flag();
    ctx.mark_filtering_set = lookup.mark_filtering_set();
    ctx.table_type = TableType::Gsub;

    if lookup.is_reverse() {
        lookup.apply_reverse(ctx, buffer);
        return;
    }

    buffer.clear_output();
    while buffer.idx() < buffer.len() {
        let info = buffer.info()[buffer.idx()];
        if info.mask & ctx.feature_mask == 0 {
            buffer.next_glyph();
            continue;
        }

        let skip = ctx.may_skip(&info, None, true);
        if skip == MatchResult::Yes {
            buffer.next_glyph();
            continue;
        }

        if !lookup.apply_at_point(ctx, lookups, buffer) {
            buffer.next_glyph();
        }
    }
    buffer.sync();
}
