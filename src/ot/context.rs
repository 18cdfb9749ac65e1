//! Context and chained-context subtables (§4.4 type 5/6, reused verbatim by
//! GPOS type 7/8): glyph/class/coverage-based sequence matching followed by
//! nested-lookup recursion at positions into the matched sequence.

use crate::buffer::{Buffer, GlyphInfo};
use crate::ot::apply::ApplyContext;
use crate::ot::classdef::ClassDef;
use crate::ot::coverage::Coverage;
use crate::ot::layout::LookupList;
use crate::parser::{offset16, FromData, LazyArray, Stream};

/// A nested-lookup dispatcher — `gsub::apply_nested_gsub` or its GPOS
/// counterpart, recursing through `ApplyContext::nesting_level`.
pub type NestedApply = fn(&mut ApplyContext, &LookupList, &mut Buffer, u16) -> bool;

#[derive(Clone, Copy)]
pub struct SequenceLookupRecord {
    pub sequence_index: u16,
    pub lookup_list_index: u16,
}

impl FromData for SequenceLookupRecord {
    const SIZE: usize = 4;

    fn parse(data: &[u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        Some(SequenceLookupRecord { sequence_index: s.read()?, lookup_list_index: s.read()? })
    }
}

/// Applies nested lookups at the buffer positions they target, in ascending
/// `sequence_index` order (required so an earlier nested substitution's
/// output doesn't get re-walked by a later record targeting the same run).
fn run_records(
    ctx: &mut ApplyContext,
    lookups: &LookupList,
    buffer: &mut Buffer,
    match_positions: &[usize],
    records: &[SequenceLookupRecord],
    applier: NestedApply,
) {
    let mut recs: Vec<SequenceLookupRecord> = records.to_vec();
    recs.sort_by_key(|r| r.sequence_index);
    for rec in &recs {
        if let Some(&pos) = match_positions.get(usize::from(rec.sequence_index)) {
            buffer.move_to(pos);
            applier(ctx, lookups, buffer, rec.lookup_list_index);
        }
    }
    if let Some(&last) = match_positions.last() {
        buffer.move_to(last + 1);
    }
}

fn read_rule_set(set_data: &[u8]) -> Option<LazyArray<u16>> {
    let mut s = Stream::new(set_data);
    s.read_array16_counted()
}

/// One rule's `(input glyph ids/classes, lookup records)` — format 1 stores
/// glyph ids, format 2 stores class ids, both as a bare `u16` array.
struct SequenceRule<'a> {
    ids: LazyArray<'a, u16>,
    records: Vec<SequenceLookupRecord>,
}

fn read_sequence_rule(rule_data: &[u8]) -> Option<SequenceRule> {
    let mut s = Stream::new(rule_data);
    let glyph_count: u16 = s.read()?;
    let lookup_count: u16 = s.read()?;
    let ids = s.read_array16(glyph_count.saturating_sub(1))?;
    let records: LazyArray<SequenceLookupRecord> = s.read_array16(lookup_count)?;
    Some(SequenceRule { ids, records: records.iter().collect() })
}

pub enum ContextLookup<'a> {
    Glyph { coverage: Coverage<'a>, data: &'a [u8], rule_sets: LazyArray<'a, u16> },
    Class { coverage: Coverage<'a>, class_def: ClassDef<'a>, data: &'a [u8], rule_sets: LazyArray<'a, u16> },
    Coverage { coverages: Vec<Coverage<'a>>, records: Vec<SequenceLookupRecord> },
}

impl<'a> ContextLookup<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let format: u16 = s.read()?;
        match format {
            1 => {
                let coverage = offset16(data, 2).and_then(Coverage::parse)?;
                let mut s = Stream::new_at(data, 4)?;
                let rule_sets = s.read_array16_counted()?;
                Some(ContextLookup::Glyph { coverage, data, rule_sets })
            }
            2 => {
                let coverage = offset16(data, 2).and_then(Coverage::parse)?;
                let class_def = offset16(data, 4).and_then(ClassDef::parse)?;
                let mut s = Stream::new_at(data, 6)?;
                let rule_sets = s.read_array16_counted()?;
                Some(ContextLookup::Class { coverage, class_def, data, rule_sets })
            }
            3 => {
                let mut s = Stream::new_at(data, 2)?;
                let glyph_count: u16 = s.read()?;
                let lookup_count: u16 = s.read()?;
                let coverage_offsets: LazyArray<u16> = s.read_array16(glyph_count)?;
                let records: LazyArray<SequenceLookupRecord> = s.read_array16(lookup_count)?;
                let coverages = coverage_offsets
                    .iter()
                    .filter_map(|o| data.get(usize::from(o)..).and_then(Coverage::parse))
                    .collect();
                Some(ContextLookup::Coverage { coverages, records: records.iter().collect() })
            }
            _ => None,
        }
    }

    pub fn apply(&self, ctx: &mut ApplyContext, lookups: &LookupList, buffer: &mut Buffer, applier: NestedApply) -> bool {
        let idx = buffer.idx();
        let glyph = buffer.info()[idx].glyph_id;

        match self {
            ContextLookup::Glyph { coverage, data, rule_sets } => {
                let Some(index) = coverage.get(glyph) else { return false };
                let Some(offset) = rule_sets.get(index) else { return false };
                let Some(set_data) = data.get(usize::from(offset)..) else { return false };
                let Some(offsets) = read_rule_set(set_data) else { return false };

                for rule_offset in offsets.iter() {
                    let Some(rule_data) = set_data.get(usize::from(rule_offset)..) else { continue };
                    let Some(rule) = read_sequence_rule(rule_data) else { continue };
                    let want = rule.ids.len() as usize;
                    let matched = ctx.match_input(buffer, idx + 1, want, None, |pos, info| {
                        rule.ids.get(pos as u16) == Some(info.glyph_id)
                    });
                    if let Some(mut positions) = matched {
                        positions.insert(0, idx);
                        run_records(ctx, lookups, buffer, &positions, &rule.records, applier);
                        return true;
                    }
                }
                false
            }
            ContextLookup::Class { coverage, class_def, data, rule_sets } => {
                if coverage.get(glyph).is_none() {
                    return false;
                }
                let class = class_def.get(glyph);
                let Some(offset) = rule_sets.get(class) else { return false };
                if offset == 0 {
                    return false;
                }
                let Some(set_data) = data.get(usize::from(offset)..) else { return false };
                let Some(offsets) = read_rule_set(set_data) else { return false };

                for rule_offset in offsets.iter() {
                    let Some(rule_data) = set_data.get(usize::from(rule_offset)..) else { continue };
                    let Some(rule) = read_sequence_rule(rule_data) else { continue };
                    let want = rule.ids.len() as usize;
                    let matched = ctx.match_input(buffer, idx + 1, want, None, |pos, info| {
                        rule.ids.get(pos as u16) == Some(class_def.get(info.glyph_id))
                    });
                    if let Some(mut positions) = matched {
                        positions.insert(0, idx);
                        run_records(ctx, lookups, buffer, &positions, &rule.records, applier);
                        return true;
                    }
                }
                false
            }
            ContextLookup::Coverage { coverages, records } => {
                if coverages.is_empty() || !coverages[0].contains(glyph) {
                    return false;
                }
                let want = coverages.len() - 1;
                let matched = ctx.match_input(buffer, idx + 1, want, None, |pos, info| {
                    coverages[pos + 1].contains(info.glyph_id)
                });
                if let Some(mut positions) = matched {
                    positions.insert(0, idx);
                    run_records(ctx, lookups, buffer, &positions, records, applier);
                    true
                } else {
                    false
                }
            }
        }
    }
}

struct ChainSequenceRule<'a> {
    backtrack: LazyArray<'a, u16>,
    input: LazyArray<'a, u16>,
    lookahead: LazyArray<'a, u16>,
    records: Vec<SequenceLookupRecord>,
}

fn read_chain_rule(rule_data: &[u8]) -> Option<ChainSequenceRule> {
    let mut s = Stream::new(rule_data);
    let backtrack_count: u16 = s.read()?;
    let backtrack = s.read_array16(backtrack_count)?;
    let input_count: u16 = s.read()?;
    let input = s.read_array16(input_count.saturating_sub(1))?;
    let lookahead_count: u16 = s.read()?;
    let lookahead = s.read_array16(lookahead_count)?;
    let lookup_count: u16 = s.read()?;
    let records: LazyArray<SequenceLookupRecord> = s.read_array16(lookup_count)?;
    Some(ChainSequenceRule { backtrack, input, lookahead, records: records.iter().collect() })
}

/// Matches a chain rule's backtrack/input/lookahead against the buffer
/// around `idx`, returning `[idx, ...matched input positions]` on success.
fn try_chain_rule(
    ctx: &mut ApplyContext,
    buffer: &mut Buffer,
    idx: usize,
    backtrack: &LazyArray<u16>,
    input: &LazyArray<u16>,
    lookahead: &LazyArray<u16>,
    mut id_at: impl FnMut(&GlyphInfo, u16) -> bool,
) -> Option<Vec<usize>> {
    let want = input.len() as usize;
    let positions = ctx.match_input(buffer, idx + 1, want, None, |pos, info| {
        input.get(pos as u16).map(|id| id_at(info, id)).unwrap_or(false)
    })?;

    let backtrack_ok = ctx.match_backtrack(buffer, backtrack.len() as usize, |pos, info| {
        backtrack.get(pos as u16).map(|id| id_at(info, id)).unwrap_or(false)
    });
    if !backtrack_ok {
        return None;
    }

    let lookahead_start = *positions.last().unwrap_or(&idx) + 1;
    let lookahead_ok = ctx.match_lookahead(buffer, lookahead_start, lookahead.len() as usize, |pos, info| {
        lookahead.get(pos as u16).map(|id| id_at(info, id)).unwrap_or(false)
    });
    if !lookahead_ok {
        return None;
    }

    let mut all = vec![idx];
    all.extend(positions);
    Some(all)
}

pub enum ChainContextLookup<'a> {
    Glyph { coverage: Coverage<'a>, data: &'a [u8], rule_sets: LazyArray<'a, u16> },
    Class { coverage: Coverage<'a>, class_def: ClassDef<'a>, data: &'a [u8], rule_sets: LazyArray<'a, u16> },
    Coverage {
        backtrack: Vec<Coverage<'a>>,
        input: Vec<Coverage<'a>>,
        lookahead: Vec<Coverage<'a>>,
        records: Vec<SequenceLookupRecord>,
    },
}

impl<'a> ChainContextLookup<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let format: u16 = s.read()?;
        match format {
            1 => {
                let coverage = offset16(data, 2).and_then(Coverage::parse)?;
                let mut s = Stream::new_at(data, 4)?;
                let rule_sets = s.read_array16_counted()?;
                Some(ChainContextLookup::Glyph { coverage, data, rule_sets })
            }
            2 => {
                let coverage = offset16(data, 2).and_then(Coverage::parse)?;
                let class_def = offset16(data, 4).and_then(ClassDef::parse)?;
                let mut s = Stream::new_at(data, 6)?;
                let rule_sets = s.read_array16_counted()?;
                Some(ChainContextLookup::Class { coverage, class_def, data, rule_sets })
            }
            3 => {
                let mut s = Stream::new_at(data, 2)?;
                let backtrack_count: u16 = s.read()?;
                let backtrack_offsets: LazyArray<u16> = s.read_array16(backtrack_count)?;
                let input_count: u16 = s.read()?;
                let input_offsets: LazyArray<u16> = s.read_array16(input_count)?;
                let lookahead_count: u16 = s.read()?;
                let lookahead_offsets: LazyArray<u16> = s.read_array16(lookahead_count)?;
                let lookup_count: u16 = s.read()?;
                let records: LazyArray<SequenceLookupRecord> = s.read_array16(lookup_count)?;

                let resolve = |offs: LazyArray<u16>| -> Vec<Coverage<'a>> {
                    offs.iter().filter_map(|o| data.get(usize::from(o)..).and_then(Coverage::parse)).collect()
                };

                Some(ChainContextLookup::Coverage {
                    backtrack: resolve(backtrack_offsets),
                    input: resolve(input_offsets),
                    lookahead: resolve(lookahead_offsets),
                    records: records.iter().collect(),
                })
            }
            _ => None,
        }
    }

    pub fn apply(&self, ctx: &mut ApplyContext, lookups: &LookupList, buffer: &mut Buffer, applier: NestedApply) -> bool {
        let idx = buffer.idx();
        let glyph = buffer.info()[idx].glyph_id;

        match self {
            ChainContextLookup::Glyph { coverage, data, rule_sets } => {
                let Some(index) = coverage.get(glyph) else { return false };
                let Some(offset) = rule_sets.get(index) else { return false };
                let Some(set_data) = data.get(usize::from(offset)..) else { return false };
                let Some(offsets) = read_rule_set(set_data) else { return false };

                for rule_offset in offsets.iter() {
                    let Some(rule_data) = set_data.get(usize::from(rule_offset)..) else { continue };
                    let Some(rule) = read_chain_rule(rule_data) else { continue };
                    let positions = try_chain_rule(
                        ctx,
                        buffer,
                        idx,
                        &rule.backtrack,
                        &rule.input,
                        &rule.lookahead,
                        |info, id| info.glyph_id == id,
                    );
                    if let Some(positions) = positions {
                        run_records(ctx, lookups, buffer, &positions, &rule.records, applier);
                        return true;
                    }
                }
                false
            }
            ChainContextLookup::Class { coverage, class_def, data, rule_sets } => {
                if coverage.get(glyph).is_none() {
                    return false;
                }
                let class = class_def.get(glyph);
                let Some(offset) = rule_sets.get(class) else { return false };
                if offset == 0 {
                    return false;
                }
                let Some(set_data) = data.get(usize::from(offset)..) else { return false };
                let Some(offsets) = read_rule_set(set_data) else { return false };

                for rule_offset in offsets.iter() {
                    let Some(rule_data) = set_data.get(usize::from(rule_offset)..) else { continue };
                    let Some(rule) = read_chain_rule(rule_data) else { continue };
                    let positions = try_chain_rule(
                        ctx,
                        buffer,
                        idx,
                        &rule.backtrack,
                        &rule.input,
                        &rule.lookahead,
                        |info, class_id| class_def.get(info.glyph_id) == class_id,
                    );
                    if let Some(positions) = positions {
                        run_records(ctx, lookups, buffer, &positions, &rule.records, applier);
                        return true;
                    }
                }
                false
            }
            ChainContextLookup::Coverage { backtrack, input, lookahead, records } => {
                if input.is_empty() || !input[0].contains(glyph) {
                    return false;
                }
                let want = input.len() - 1;
                let Some(positions) = ctx.match_input(buffer, idx + 1, want, None, |pos, info| {
                    input[pos + 1].contains(info.glyph_id)
                }) else {
                    return false;
                };
                let backtrack_ok =
                    ctx.match_backtrack(buffer, backtrack.len(), |pos, info| backtrack[pos].contains(info.glyph_id));
                if !backtrack_ok {
                    return false;
                }
                let lookahead_start = *positions.last().unwrap_or(&idx) + 1;
                let lookahead_ok = ctx.match_lookahead(buffer, lookahead_start, lookahead.len(), |pos, info| {
                    lookahead[pos].contains(info.glyph_id)
                });
                if !lookahead_ok {
                    return false;
                }

                let mut all_positions = vec![idx];
                all_positions.extend(positions);
                run_records(ctx, lookups, buffer, &all_positions, records, applier);
                true
            }
        }
    }
}
