//! The top-level shaping pipeline (§2, §4.9 step list): wires together
//! codepoint→glyph mapping, normalization, the active complex shaper, the
//! GSUB/GPOS apply loops and the attachment-offset propagator into the two
//! public entry points, `shape` and `shape_with_plan`.

use log::trace;

use crate::buffer::{Buffer, BufferScratchFlags, GlyphBuffer, UnicodeBuffer};
use crate::face::Face;
use crate::fallback;
use crate::ot::apply::{ApplyContext, TableType};
use crate::ot::feature::Feature;
use crate::ot::map::LookupMap;
use crate::ot::normalize::{self, NormalizeContext};
use crate::ot::plan::{MarkZeroing, ShapePlan};
use crate::ot::{gpos, gsub};

/// Builds a fresh `ShapePlan` for this buffer's resolved script/language/
/// direction and runs it once. Prefer `shape_with_plan` when shaping many
/// buffers that share a (face, script, language, direction) combination —
/// plan compilation walks the whole GSUB/GPOS feature list and isn't free.
pub fn shape(face: &Face, buffer: UnicodeBuffer, features: &[Feature]) -> GlyphBuffer {
    let mut inner = buffer.0;
    inner.guess_segment_properties();

    let plan = ShapePlan::new(face, inner.direction, inner.script, inner.language, features);
    shape_inner(face, &plan, &mut inner);
    GlyphBuffer(inner)
}

/// §5's concurrency-model entry point: reuses an already-compiled, `Sync`
/// plan across any number of buffers.
pub fn shape_with_plan(face: &Face, plan: &ShapePlan, buffer: UnicodeBuffer) -> GlyphBuffer {
    let mut inner = buffer.0;
    inner.guess_segment_properties();
    shape_inner(face, plan, &mut inner);
    GlyphBuffer(inner)
}

fn shape_inner(face: &Face, plan: &ShapePlan, buffer: &mut Buffer) {
    if buffer.is_empty() {
        return;
    }

    map_to_glyphs(face, buffer);
    buffer.form_clusters();

    if !plan.shaper.skip_normalize() {
        let normalize_ctx = NormalizeContext {
            mode: plan.shaper.normalization_mode(),
            reorder_marks: plan.shaper.reorder_marks(),
            compose_filter: plan.shaper.compose_filter(),
            face,
        };
        normalize::normalize(&normalize_ctx, buffer);
    }

    plan.shaper.setup_masks(plan, face, buffer);

    run_gsub(face, plan, buffer);

    set_base_advances(face, buffer);

    if plan.mark_zeroing == MarkZeroing::Early {
        zero_mark_widths(buffer);
    }

    run_gpos(face, plan, buffer);

    if plan.mark_zeroing == MarkZeroing::Late {
        zero_mark_widths(buffer);
    }

    plan.shaper.postprocess_glyphs(plan, face, buffer);

    let direction = buffer.direction;
    fallback::propagate_attachment_offsets(buffer, direction);

    if !plan.has_gpos_mark && plan.shaper.fallback_position() {
        fallback::fallback_mark_positioning(face, buffer);
    }

    if buffer.direction.is_backward() {
        buffer.reverse();
    }

    if !buffer.flags.contains(crate::buffer::BufferFlags::PRESERVE_DEFAULT_IGNORABLES) {
        let remove_all = buffer.flags.contains(crate::buffer::BufferFlags::REMOVE_DEFAULT_IGNORABLES);
        buffer.delete_glyphs_inplace(|info| {
            info.is_default_ignorable() && (remove_all || !info.is_hidden())
        });
    }
}

/// §4.1/§4.2: resolves each codepoint to a glyph id (falling back to the
/// notdef-variation-selector glyph, or leaving `.notdef` if the font has
/// neither), then assigns the GDEF glyph class every lookup-flag check and
/// the complex shapers consult.
fn map_to_glyphs(face: &Face, buffer: &mut Buffer) {
    let gdef = face.gdef();
    let mut has_non_ascii = false;

    for i in 0..buffer.len() {
        let c = buffer.info()[i].as_char();
        if c as u32 > 0x7F {
            has_non_ascii = true;
        }

        let gid = face.glyph_index(c).unwrap_or(0);
        if gid == 0 && c as u32 != 0 {
            trace!("no cmap entry for U+{:04X}, using .notdef", c as u32);
        }
        buffer.info_mut()[i].glyph_id = gid;

        let class = gdef
            .map(|g| g.glyph_class(gid))
            .unwrap_or_default();
        buffer.info_mut()[i].glyph_class = class;
        buffer.info_mut()[i].mark_attachment_class =
            gdef.map(|g| g.mark_attachment_class(gid)).unwrap_or(0);
    }

    if has_non_ascii {
        buffer.set_scratch_flags(buffer.scratch_flags() | BufferScratchFlags::HAS_NON_ASCII);
    }
}

/// §2 pipeline's "set base advances (hmtx+HVAR/gvar)" step, run once GSUB
/// has settled the final glyph sequence: each glyph's pen advance starts
/// from its `hmtx`/`vmtx` value before GPOS lookups add kerning or
/// mark-attachment deltas on top.
fn set_base_advances(face: &Face, buffer: &mut Buffer) {
    let vertical = buffer.direction.is_vertical();
    for i in 0..buffer.len() {
        let gid = buffer.info()[i].glyph_id;
        let pos = &mut buffer.pos_mut()[i];
        if vertical {
            pos.y_advance = -i32::from(face.glyph_ver_advance(gid).unwrap_or(0));
        } else {
            pos.x_advance = i32::from(face.glyph_hor_advance(gid).unwrap_or(0));
        }
    }
}

/// §4.9 step 12 (early half): zeros the advance of every glyph GDEF (or the
/// shaper's own category table) marks as a combining mark, so its own pen
/// position doesn't budge before GPOS mark attachment repositions it.
fn zero_mark_widths(buffer: &mut Buffer) {
    use crate::buffer::GlyphClass;
    for i in 0..buffer.len() {
        if buffer.info()[i].glyph_class == GlyphClass::Mark {
            let pos = &mut buffer.pos_mut()[i];
            pos.x_advance = 0;
            pos.y_advance = 0;
        }
    }
}

/// Drives the compiled GSUB lookup list, firing `gsub_pause` at every
/// stage boundary the complex shaper registered (§4.6 "pause").
fn run_gsub(face: &Face, plan: &ShapePlan, buffer: &mut Buffer) {
    let Some(lookups) = face.gsub_lookup_list() else {
        return;
    };

    let gdef = face.gdef();
    let mut ctx = ApplyContext::new(face, gdef, TableType::Gsub);
    ctx.ops_budget = buffer.len() as i32 * crate::ot::apply::MAX_OPS_FACTOR;

    let entries = plan.ot_map.gsub_lookups();
    let stages = plan.ot_map.gsub_stages();
    let mut next_stage = 0;
    let mut done = 0;

    for entry in entries {
        apply_entry(&mut ctx, lookups, entry, buffer);
        done += 1;

        while next_stage < stages.len() && stages[next_stage].lookup_count == done {
            let pause = stages[next_stage].pause;
            plan.shaper.gsub_pause(pause, plan, face, buffer);
            next_stage += 1;
        }
    }

    while next_stage < stages.len() {
        let pause = stages[next_stage].pause;
        plan.shaper.gsub_pause(pause, plan, face, buffer);
        next_stage += 1;
    }
}

fn run_gpos(face: &Face, plan: &ShapePlan, buffer: &mut Buffer) {
    let Some(lookups) = face.gpos_lookup_list() else {
        return;
    };

    let gdef = face.gdef();
    let mut ctx = ApplyContext::new(face, gdef, TableType::Gpos);
    ctx.ops_budget = buffer.len() as i32 * crate::ot::apply::MAX_OPS_FACTOR;

    let entries = plan.ot_map.gpos_lookups();
    for entry in entries {
        apply_gpos_entry(&mut ctx, lookups, entry, buffer);
    }
}

fn apply_entry(
    ctx: &mut ApplyContext,
    lookups: &crate::ot::layout::LookupList,
    entry: &LookupMap,
    buffer: &mut Buffer,
) {
    ctx.feature_mask = entry.mask;
    ctx.feature_value = entry.value;
    ctx.auto_zwnj = entry.auto_zwnj;
    ctx.auto_zwj = entry.auto_zwj;
    ctx.random = entry.random;
    gsub::apply_lookup(ctx, lookups, entry.index, buffer);
}

fn apply_gpos_entry(
    ctx: &mut ApplyContext,
    lookups: &crate::ot::layout::LookupList,
    entry: &LookupMap,
    buffer: &mut Buffer,
) {
    ctx.feature_mask = entry.mask;
    ctx.feature_value = entry.value;
    ctx.auto_zwnj = entry.auto_zwnj;
    ctx.auto_zwj = entry.auto_zwj;
    ctx.random = entry.random;
    gpos::apply_lookup(ctx, lookups, entry.index, buffer);
}
