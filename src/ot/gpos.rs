//! GPOS subtables, types 1-9 (C4, §4.5), and the lookup-application loop
//! that drives them. Unlike GSUB, GPOS never stages an output buffer: each
//! subtable adjusts `buffer.pos_mut()` in place, so the driving loop below
//! never calls `clear_output`/`sync` and `buffer.next_glyph()` degrades to a
//! plain index increment.

use crate::buffer::{AttachType, Buffer, GlyphClass, GlyphInfo};
use crate::ot::apply::{ApplyContext, MatchResult, TableType};
use crate::ot::classdef::ClassDef;
use crate::ot::coverage::Coverage;
use crate::ot::gdef::{resolve_extension, Anchor, ValueFormat, ValueRecord};
use crate::ot::layout::{LookupFlag, LookupList, LookupTable};
use crate::parser::{offset16, LazyArray, Stream};
use crate::GlyphId;

/// ValueRecords accumulate rather than overwrite: more than one lookup can
/// touch the same glyph (kerning plus a later mark adjustment, for
/// instance), each nudging the position its predecessor left behind.
fn apply_value(pos: &mut crate::buffer::GlyphPosition, v: ValueRecord) {
    pos.x_offset += i32::from(v.x_placement);
    pos.y_offset += i32::from(v.y_placement);
    pos.x_advance += i32::from(v.x_advance);
    pos.y_advance += i32::from(v.y_advance);
}

/// Type 1: either a uniform `ValueRecord` or one entry per covered glyph.
enum SinglePosKind<'a> {
    Delta(ValueRecord),
    Array { data: &'a [u8] },
}

struct SinglePos<'a> {
    coverage: Coverage<'a>,
    value_format: ValueFormat,
    kind: SinglePosKind<'a>,
}

impl<'a> SinglePos<'a> {
    fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let format: u16 = s.read()?;
        let coverage = offset16(data, 2).and_then(Coverage::parse)?;
        let value_format = ValueFormat::from_bits_truncate(Stream::read_at::<u16>(data, 4)?);
        match format {
            1 => {
                let mut vs = Stream::new_at(data, 6)?;
                let value = value_format.read(&mut vs)?;
                Some(SinglePos { coverage, value_format, kind: SinglePosKind::Delta(value) })
            }
            2 => {
                let array_data = data.get(8..)?;
                Some(SinglePos { coverage, value_format, kind: SinglePosKind::Array { data: array_data } })
            }
            _ => None,
        }
    }

    fn value_for(&self, glyph: GlyphId) -> Option<ValueRecord> {
        let index = self.coverage.get(glyph)?;
        match &self.kind {
            SinglePosKind::Delta(v) => Some(*v),
            SinglePosKind::Array { data } => {
                let pos = usize::from(index) * self.value_format.size();
                let mut s = Stream::new_at(data, pos)?;
                self.value_format.read(&mut s)
            }
        }
    }
}

/// Type 2: pairwise kerning, either by exact glyph pair (format 1) or by a
/// class1 x class2 matrix (format 2).
enum PairPosKind<'a> {
    Glyphs { pair_sets: LazyArray<'a, u16> },
    Class { class_def1: ClassDef<'a>, class_def2: ClassDef<'a>, class2_count: u16, matrix_offset: usize },
}

struct PairPos<'a> {
    coverage: Coverage<'a>,
    value_format1: ValueFormat,
    value_format2: ValueFormat,
    data: &'a [u8],
    kind: PairPosKind<'a>,
}

impl<'a> PairPos<'a> {
    fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let format: u16 = s.read()?;
        let coverage = offset16(data, 2).and_then(Coverage::parse)?;
        let value_format1 = ValueFormat::from_bits_truncate(Stream::read_at::<u16>(data, 4)?);
        let value_format2 = ValueFormat::from_bits_truncate(Stream::read_at::<u16>(data, 6)?);
        match format {
            1 => {
                let mut s2 = Stream::new_at(data, 8)?;
                let pair_sets = s2.read_array16_counted()?;
                Some(PairPos {
                    coverage,
                    value_format1,
                    value_format2,
                    data,
                    kind: PairPosKind::Glyphs { pair_sets },
                })
            }
            2 => {
                let class_def1 = offset16(data, 8).and_then(ClassDef::parse)?;
                let class_def2 = offset16(data, 10).and_then(ClassDef::parse)?;
                let class2_count: u16 = Stream::read_at(data, 14)?;
                Some(PairPos {
                    coverage,
                    value_format1,
                    value_format2,
                    data,
                    kind: PairPosKind::Class { class_def1, class_def2, class2_count, matrix_offset: 16 },
                })
            }
            _ => None,
        }
    }

    /// Returns `(value1, value2)`; `value2` is `None` when `value_format2`
    /// declares no fields, which the driving loop reads as "stop on the
    /// second glyph" rather than "advance past it" (§4.5).
    fn lookup(&self, first: GlyphId, second: GlyphId) -> Option<(ValueRecord, Option<ValueRecord>)> {
        match &self.kind {
            PairPosKind::Glyphs { pair_sets } => {
                let index = self.coverage.get(first)?;
                let offset = pair_sets.get(index)?;
                let set_data = self.data.get(usize::from(offset)..)?;
                let count: u16 = Stream::read_at(set_data, 0)?;
                let rec_size = 2 + self.value_format1.size() + self.value_format2.size();
                let records = set_data.get(2..2 + usize::from(count) * rec_size)?;

                let mut lo = 0i32;
                let mut hi = i32::from(count) - 1;
                while lo <= hi {
                    let mid = (lo + hi) / 2;
                    let pos = mid as usize * rec_size;
                    let g: GlyphId = Stream::read_at(records, pos)?;
                    match g.cmp(&second) {
                        std::cmp::Ordering::Equal => {
                            let mut vs = Stream::new_at(records, pos + 2)?;
                            let v1 = self.value_format1.read(&mut vs)?;
                            let v2 = if self.value_format2.is_empty() {
                                None
                            } else {
                                Some(self.value_format2.read(&mut vs)?)
                            };
                            return Some((v1, v2));
                        }
                        std::cmp::Ordering::Less => lo = mid + 1,
                        std::cmp::Ordering::Greater => hi = mid - 1,
                    }
                }
                None
            }
            PairPosKind::Class { class_def1, class_def2, class2_count, matrix_offset } => {
                self.coverage.get(first)?;
                let c1 = class_def1.get(first);
                let c2 = class_def2.get(second);
                let rec_size = self.value_format1.size() + self.value_format2.size();
                let pos = *matrix_offset + (usize::from(c1) * usize::from(*class2_count) + usize::from(c2)) * rec_size;
                let mut vs = Stream::new_at(self.data, pos)?;
                let v1 = self.value_format1.read(&mut vs)?;
                let v2 = if self.value_format2.is_empty() {
                    None
                } else {
                    Some(self.value_format2.read(&mut vs)?)
                };
                Some((v1, v2))
            }
        }
    }
}

/// Type 3: entry/exit anchor pairs, connecting the current glyph's entry to
/// the nearest earlier skippy glyph's exit.
struct CursivePos<'a> {
    coverage: Coverage<'a>,
    data: &'a [u8],
}

impl<'a> CursivePos<'a> {
    fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let _format: u16 = s.read()?;
        let coverage = offset16(data, 2).and_then(Coverage::parse)?;
        Some(CursivePos { coverage, data })
    }

    fn entry_exit(&self, index: u16) -> (Option<Anchor>, Option<Anchor>) {
        let pos = 6 + usize::from(index) * 4;
        let entry = offset16(self.data, pos).and_then(Anchor::parse);
        let exit = offset16(self.data, pos + 2).and_then(Anchor::parse);
        (entry, exit)
    }
}

/// §3 `MarkArray`: one `(mark_class, anchor)` per covered mark glyph, shared
/// by types 4-6.
fn mark_array_get(data: &[u8], index: u16) -> Option<(u16, Option<Anchor>)> {
    let record_pos = 2 + usize::from(index) * 4;
    let mark_class: u16 = Stream::read_at(data, record_pos)?;
    let anchor = offset16(data, record_pos + 2).and_then(Anchor::parse);
    Some((mark_class, anchor))
}

/// §3 `BaseArray`/`Mark2Array`: one anchor per `(base_index, mark_class)`
/// cell, shared by MarkBase (type 4) and MarkMark (type 6).
fn base_array_get(data: &[u8], base_index: u16, mark_class: u16, mark_class_count: u16) -> Option<Anchor> {
    let record_pos = 2 + usize::from(base_index) * usize::from(mark_class_count) * 2;
    let anchor_pos = record_pos + usize::from(mark_class) * 2;
    offset16(data, anchor_pos).and_then(Anchor::parse)
}

/// §3 `LigatureArray`: one `LigatureAttach` table per covered ligature,
/// each carrying one anchor per `(component, mark_class)` cell (type 5).
fn ligature_attach(data: &[u8], ligature_index: u16) -> Option<&[u8]> {
    let offset: u16 = Stream::read_at(data, 2 + usize::from(ligature_index) * 2)?;
    data.get(usize::from(offset)..)
}

fn ligature_attach_component_count(attach: &[u8]) -> Option<u16> {
    Stream::read_at(attach, 0)
}

fn ligature_attach_anchor(
    attach: &[u8],
    component_index: u16,
    mark_class: u16,
    mark_class_count: u16,
) -> Option<Anchor> {
    let record_pos = 2 + usize::from(component_index) * usize::from(mark_class_count) * 2;
    let anchor_pos = record_pos + usize::from(mark_class) * 2;
    offset16(attach, anchor_pos).and_then(Anchor::parse)
}

fn accept_mark_attach_base(info: &GlyphInfo) -> bool {
    // HarfBuzz's `accept()` rule: only the first component of a multiple
    // substitution can carry a base/ligature attachment; later components
    // (e.g. a compatibility-decomposition tail) are skipped as bases.
    !info.is_multiplied() || info.lig_comp() == 0
}

/// Two marks are in the same "ligature cell" (and so may mark-to-mark
/// attach) if they share a `lig_id`/`lig_comp`, neither belongs to a
/// ligature sequence, or either is itself classified as a ligature.
fn ligature_cell_match(a: &GlyphInfo, b: &GlyphInfo) -> bool {
    if a.glyph_class == GlyphClass::Ligature || b.glyph_class == GlyphClass::Ligature {
        return true;
    }
    (a.lig_id() == b.lig_id() && a.lig_comp() == b.lig_comp()) || (a.lig_id() == 0 && b.lig_id() == 0)
}

/// MarkMark's own backward search (§4.5 type 6): unlike MarkBase/MarkLig, it
/// skips only default-ignorables, never the lookup's base/ligature/mark
/// exclusions (the target is itself a mark, so those flags don't apply).
fn find_prev_mark(buffer: &Buffer, before: usize) -> Option<usize> {
    let mut i = before;
    while i > 0 {
        i -= 1;
        let info = &buffer.info()[i];
        if info.is_default_ignorable() {
            continue;
        }
        return Some(i);
    }
    None
}

/// Type 4: mark-to-base.
struct MarkBasePos<'a> {
    mark_coverage: Coverage<'a>,
    base_coverage: Coverage<'a>,
    mark_class_count: u16,
    mark_array: &'a [u8],
    base_array: &'a [u8],
}

impl<'a> MarkBasePos<'a> {
    fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let _format: u16 = s.read()?;
        let mark_coverage = offset16(data, 2).and_then(Coverage::parse)?;
        let base_coverage = offset16(data, 4).and_then(Coverage::parse)?;
        let mark_class_count: u16 = Stream::read_at(data, 6)?;
        let mark_array = offset16(data, 8)?;
        let base_array = offset16(data, 10)?;
        Some(MarkBasePos { mark_coverage, base_coverage, mark_class_count, mark_array, base_array })
    }

    fn apply(&self, ctx: &mut ApplyContext, buffer: &mut Buffer) -> bool {
        let idx = buffer.idx();
        (|| {
            let mark_glyph = buffer.info()[idx].glyph_id;
            let mark_index = self.mark_coverage.get(mark_glyph)?;
            let (mark_class, mark_anchor) = mark_array_get(self.mark_array, mark_index)?;
            let mark_anchor = mark_anchor?;

            let base_idx = ctx.find_base_backward(buffer, idx, accept_mark_attach_base)?;
            let base_glyph = buffer.info()[base_idx].glyph_id;
            let base_index = self.base_coverage.get(base_glyph)?;
            let base_anchor = base_array_get(self.base_array, base_index, mark_class, self.mark_class_count)?;

            let pos = &mut buffer.pos_mut()[idx];
            pos.x_offset += i32::from(base_anchor.x) - i32::from(mark_anchor.x);
            pos.y_offset += i32::from(base_anchor.y) - i32::from(mark_anchor.y);
            pos.attach_type = AttachType::Mark;
            pos.attach_chain = (base_idx as i32 - idx as i32) as i16;
            Some(())
        })()
        .is_some()
    }
}

/// Type 5: mark-to-ligature.
struct MarkLigPos<'a> {
    mark_coverage: Coverage<'a>,
    ligature_coverage: Coverage<'a>,
    mark_class_count: u16,
    mark_array: &'a [u8],
    ligature_array: &'a [u8],
}

impl<'a> MarkLigPos<'a> {
    fn parse(data: &'a [u8]) -> Option<Self> {
        let mark_coverage = offset16(data, 2).and_then(Coverage::parse)?;
        let ligature_coverage = offset16(data, 4).and_then(Coverage::parse)?;
        let mark_class_count: u16 = Stream::read_at(data, 6)?;
        let mark_array = offset16(data, 8)?;
        let ligature_array = offset16(data, 10)?;
        Some(MarkLigPos { mark_coverage, ligature_coverage, mark_class_count, mark_array, ligature_array })
    }

    fn apply(&self, ctx: &mut ApplyContext, buffer: &mut Buffer) -> bool {
        let idx = buffer.idx();
        (|| {
            let mark_info = buffer.info()[idx];
            let mark_index = self.mark_coverage.get(mark_info.glyph_id)?;
            let (mark_class, mark_anchor) = mark_array_get(self.mark_array, mark_index)?;
            let mark_anchor = mark_anchor?;

            let lig_idx = ctx.find_base_backward(buffer, idx, accept_mark_attach_base)?;
            let lig_info = buffer.info()[lig_idx];
            let lig_index = self.ligature_coverage.get(lig_info.glyph_id)?;
            let attach = ligature_attach(self.ligature_array, lig_index)?;
            let comp_count = ligature_attach_component_count(attach)?;
            if comp_count == 0 {
                return None;
            }

            // HarfBuzz's exact formula: the mark's own `lig_comp` selects a
            // component only when it shares the ligature's `lig_id`
            // (i.e. the mark was produced between this ligature's
            // components); otherwise it attaches to the ligature's last
            // component, as if freestanding.
            let comp_index = if mark_info.lig_id() != 0 && mark_info.lig_id() == lig_info.lig_id() {
                comp_count.min(mark_info.lig_comp().max(1) as u16) - 1
            } else {
                comp_count - 1
            };

            let lig_anchor = ligature_attach_anchor(attach, comp_index, mark_class, self.mark_class_count)?;

            let pos = &mut buffer.pos_mut()[idx];
            pos.x_offset += i32::from(lig_anchor.x) - i32::from(mark_anchor.x);
            pos.y_offset += i32::from(lig_anchor.y) - i32::from(mark_anchor.y);
            pos.attach_type = AttachType::Mark;
            pos.attach_chain = (lig_idx as i32 - idx as i32) as i16;
            Some(())
        })()
        .is_some()
    }
}

/// Type 6: mark-to-mark.
struct MarkMarkPos<'a> {
    mark1_coverage: Coverage<'a>,
    mark2_coverage: Coverage<'a>,
    mark_class_count: u16,
    mark1_array: &'a [u8],
    mark2_array: &'a [u8],
}

impl<'a> MarkMarkPos<'a> {
    fn parse(data: &'a [u8]) -> Option<Self> {
        let mark1_coverage = offset16(data, 2).and_then(Coverage::parse)?;
        let mark2_coverage = offset16(data, 4).and_then(Coverage::parse)?;
        let mark_class_count: u16 = Stream::read_at(data, 6)?;
        let mark1_array = offset16(data, 8)?;
        let mark2_array = offset16(data, 10)?;
        Some(MarkMarkPos { mark1_coverage, mark2_coverage, mark_class_count, mark1_array, mark2_array })
    }

    fn apply(&self, buffer: &mut Buffer) -> bool {
        let idx = buffer.idx();
        (|| {
            let mark1_info = buffer.info()[idx];
            let mark1_index = self.mark1_coverage.get(mark1_info.glyph_id)?;
            let (mark_class, mark1_anchor) = mark_array_get(self.mark1_array, mark1_index)?;
            let mark1_anchor = mark1_anchor?;

            let base_idx = find_prev_mark(buffer, idx)?;
            let mark2_info = buffer.info()[base_idx];
            if !ligature_cell_match(&mark1_info, &mark2_info) {
                return None;
            }
            let mark2_index = self.mark2_coverage.get(mark2_info.glyph_id)?;
            let mark2_anchor = base_array_get(self.mark2_array, mark2_index, mark_class, self.mark_class_count)?;

            let pos = &mut buffer.pos_mut()[idx];
            pos.x_offset += i32::from(mark2_anchor.x) - i32::from(mark1_anchor.x);
            pos.y_offset += i32::from(mark2_anchor.y) - i32::from(mark1_anchor.y);
            pos.attach_type = AttachType::Mark;
            pos.attach_chain = (base_idx as i32 - idx as i32) as i16;
            Some(())
        })()
        .is_some()
    }
}

impl<'a> CursivePos<'a> {
    /// Connects the current glyph's entry anchor to the nearest earlier
    /// skippy glyph's exit anchor. Records only the cross-axis (y, for
    /// horizontal text) offset and the `attach_chain`/`attach_type` link;
    /// the full parent-chain walk, including `RightToLeft`'s subtree
    /// re-parenting, happens in the attachment-offset propagator that runs
    /// after all GPOS lookups (C10), not here.
    fn apply(&self, ctx: &mut ApplyContext, buffer: &mut Buffer) -> bool {
        let idx = buffer.idx();
        (|| {
            let cur_glyph = buffer.info()[idx].glyph_id;
            let cur_index = self.coverage.get(cur_glyph)?;
            let (entry, _) = self.entry_exit(cur_index);
            let entry = entry?;

            let prev_idx = ctx.find_base_backward(buffer, idx, |_| true)?;
            let prev_glyph = buffer.info()[prev_idx].glyph_id;
            let prev_index = self.coverage.get(prev_glyph)?;
            let (_, exit) = self.entry_exit(prev_index);
            let exit = exit?;

            let rtl = ctx.lookup_flag.contains(LookupFlag::RIGHT_TO_LEFT);
            let (child_idx, parent_idx, child_anchor, parent_anchor) =
                if rtl { (prev_idx, idx, exit, entry) } else { (idx, prev_idx, entry, exit) };

            let pos = &mut buffer.pos_mut()[child_idx];
            pos.y_offset += i32::from(parent_anchor.y) - i32::from(child_anchor.y);
            pos.attach_type = AttachType::Cursive;
            pos.attach_chain = (parent_idx as i32 - child_idx as i32) as i16;
            Some(())
        })()
        .is_some()
    }
}

enum GposSubtable<'a> {
    Single(SinglePos<'a>),
    Pair(PairPos<'a>),
    Cursive(CursivePos<'a>),
    MarkBase(MarkBasePos<'a>),
    MarkLig(MarkLigPos<'a>),
    MarkMark(MarkMarkPos<'a>),
    Context(crate::ot::context::ContextLookup<'a>),
    ChainContext(crate::ot::context::ChainContextLookup<'a>),
}

/// GPOS's Extension subtable is lookup type **9** (GSUB's is 7 -- the two
/// tables' type numbering otherwise lines up one-to-one for 1-6/7-8).
fn parse_subtable<'a>(lookup_type: u16, data: &'a [u8]) -> Option<GposSubtable<'a>> {
    match lookup_type {
        1 => SinglePos::parse(data).map(GposSubtable::Single),
        2 => PairPos::parse(data).map(GposSubtable::Pair),
        3 => CursivePos::parse(data).map(GposSubtable::Cursive),
        4 => MarkBasePos::parse(data).map(GposSubtable::MarkBase),
        5 => MarkLigPos::parse(data).map(GposSubtable::MarkLig),
        6 => MarkMarkPos::parse(data).map(GposSubtable::MarkMark),
        7 => crate::ot::context::ContextLookup::parse(data).map(GposSubtable::Context),
        8 => crate::ot::context::ChainContextLookup::parse(data).map(GposSubtable::ChainContext),
        9 => {
            let (inner_type, inner_data) = resolve_extension(data)?;
            parse_subtable(inner_type, inner_data)
        }
        _ => None,
    }
}

/// One GPOS lookup: a parsed `LookupTable` header plus its subtables,
/// decoded lazily from the raw table bytes each time they're applied.
pub struct GposLookup<'a> {
    table: LookupTable<'a>,
}

impl<'a> GposLookup<'a> {
    pub fn new(table: LookupTable<'a>) -> Self {
        GposLookup { table }
    }

    pub fn flag(&self) -> LookupFlag {
        self.table.flag
    }

    pub fn mark_filtering_set(&self) -> Option<u16> {
        self.table.mark_filtering_set
    }

    fn subtables(&self) -> impl Iterator<Item = GposSubtable<'a>> + '_ {
        (0..self.table.subtable_count()).filter_map(move |i| {
            self.table.subtable_data(i).and_then(|d| parse_subtable(self.table.lookup_type, d))
        })
    }

    /// Applies this lookup at `ctx.buffer.idx()` once, per the in-place
    /// apply protocol (§4.5): each subtable is tried left to right until one
    /// matches.
    pub fn apply_at_point(&self, ctx: &mut ApplyContext, lookups: &LookupList<'a>, buffer: &mut Buffer) -> bool {
        for subtable in self.subtables() {
            if apply_subtable(&subtable, ctx, lookups, buffer) {
                return true;
            }
        }
        false
    }
}

fn apply_subtable<'a>(
    subtable: &GposSubtable<'a>,
    ctx: &mut ApplyContext,
    lookups: &LookupList<'a>,
    buffer: &mut Buffer,
) -> bool {
    let idx = buffer.idx();
    let glyph = buffer.info()[idx].glyph_id;

    match subtable {
        GposSubtable::Single(s) => match s.value_for(glyph) {
            Some(v) => {
                apply_value(&mut buffer.pos_mut()[idx], v);
                buffer.next_glyph();
                true
            }
            None => false,
        },
        GposSubtable::Pair(p) => {
            let Some(positions) = ctx.match_input(buffer, idx + 1, 1, None, |_, _| true) else { return false };
            let second_idx = positions[0];
            let second = buffer.info()[second_idx].glyph_id;
            match p.lookup(glyph, second) {
                Some((v1, v2)) => {
                    apply_value(&mut buffer.pos_mut()[idx], v1);
                    let advance_past_second = if let Some(v2) = v2 {
                        apply_value(&mut buffer.pos_mut()[second_idx], v2);
                        true
                    } else {
                        false
                    };
                    buffer.move_to(if advance_past_second { second_idx + 1 } else { second_idx });
                    true
                }
                None => false,
            }
        }
        GposSubtable::Cursive(c) => c.apply(ctx, buffer),
        GposSubtable::MarkBase(m) => m.apply(ctx, buffer),
        GposSubtable::MarkLig(m) => m.apply(ctx, buffer),
        GposSubtable::MarkMark(m) => m.apply(buffer),
        GposSubtable::Context(c) => c.apply(ctx, lookups, buffer, apply_nested_gpos),
        GposSubtable::ChainContext(c) => c.apply(ctx, lookups, buffer, apply_nested_gpos),
    }
}

/// Dispatches a nested lookup index during context/chained-context
/// recursion (§4.5 type 7/8, §7's `recurse_func`). Bounded by
/// `ctx.nesting_level`.
fn apply_nested_gpos(ctx: &mut ApplyContext, lookups: &LookupList, buffer: &mut Buffer, lookup_index: u16) -> bool {
    if ctx.nesting_level == 0 {
        return false;
    }
    let Some(table) = lookups.get(lookup_index) else { return false };
    let lookup = GposLookup::new(table);

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

/// Drives one GPOS lookup across the whole buffer (§4.5 apply protocol):
/// in place, with no output-buffer staging, and a fresh base-search cache
/// per lookup since `last_base`/`last_base_until` would otherwise leak a
/// stale match across unrelated mark/cursive lookups.
pub fn apply_lookup(ctx: &mut ApplyContext, lookups: &LookupList, lookup_index: u16, buffer: &mut Buffer) {
    let Some(table) = lookups.get(lookup_index) else { return };
    let lookup = GposLookup::new(table);

    ctx.lookup_flag = lookup.flag();
    ctx.mark_filtering_set = lookup.mark_filtering_set();
    ctx.table_type = TableType::Gpos;
    ctx.invalidate_base_cache();

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
}
