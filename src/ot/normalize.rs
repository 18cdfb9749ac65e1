//! Unicode normalization for shaping (C7, §4.7): decompose, reorder marks,
//! recompose — run once per buffer before the complex shaper's own
//! script-specific reordering takes over.

use crate::buffer::{Buffer, GlyphInfo};
use crate::face::Face;
use crate::unicode::{compose, decompose, CharExt};
use crate::GlyphId;

/// Selects how aggressively `recompose` fuses base+mark pairs back together
/// after decomposition (§4.7 "Mode selection").
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NormalizationMode {
    None,
    Auto,
    Composed,
    ComposedDiacritics,
}

/// Per-shaper hooks into the three phases, defaulting to the generic
/// canonical-decomposition behavior; Arabic/Hebrew override `reorder_marks`
/// and the mode, Hangul is handled entirely by its own complex shaper and
/// never reaches here (§4.9 Hangul decomposes arithmetically up front).
pub struct NormalizeContext<'a> {
    pub mode: NormalizationMode,
    pub reorder_marks: Option<fn(&mut Buffer, start: usize, end: usize)>,
    pub compose_filter: Option<fn(a: &GlyphInfo, b: &GlyphInfo) -> bool>,
    pub face: &'a Face<'a>,
}

fn has_glyph(face: &Face, c: char) -> Option<GlyphId> {
    face.glyph_index(c)
}

/// Phase 1 (§4.7 "Decompose"): replaces each glyph with its canonical
/// decomposition, preferring to keep a single codepoint the font already has
/// a glyph for, and otherwise splitting multi-codepoint results into
/// separate entries that inherit the parent's cluster and mask.
fn decompose_buffer(ctx: &NormalizeContext, buffer: &mut Buffer) {
    buffer.clear_output();

    while buffer.idx() < buffer.len() {
        let info = buffer.cur(0);
        let c = info.as_char();

        if has_glyph(ctx.face, c).is_some() {
            buffer.next_glyph();
            continue;
        }

        match decompose(c) {
            Some((a, None)) => {
                let mut out = info;
                if let Some(gid) = has_glyph(ctx.face, a) {
                    out.codepoint = u32::from(a);
                    out.glyph_id = gid;
                    out.modified_ccc = a.modified_combining_class();
                }
                buffer.output_info(out);
                buffer.skip_glyph();
            }
            Some((a, Some(b))) => {
                let mut first = info;
                first.codepoint = u32::from(a);
                first.glyph_id = has_glyph(ctx.face, a).unwrap_or(info.glyph_id);
                first.modified_ccc = a.modified_combining_class();
                buffer.output_info(first);

                let mut second = info;
                second.codepoint = u32::from(b);
                second.glyph_id = has_glyph(ctx.face, b).unwrap_or(info.glyph_id);
                second.modified_ccc = b.modified_combining_class();
                buffer.output_info(second);

                buffer.skip_glyph();
            }
            None => {
                buffer.next_glyph();
            }
        }
    }

    buffer.sync();
}

/// Phase 2 (§4.7 "Reorder marks"): stable-sorts each maximal run of
/// consecutive nonzero-CCC combining marks by `modified_ccc`, unless the
/// shaper supplies its own `reorder_marks` override for the run.
fn reorder_marks(ctx: &NormalizeContext, buffer: &mut Buffer) {
    let len = buffer.len();
    let mut i = 0;
    while i < len {
        if buffer.info()[i].modified_combining_class() == 0 {
            i += 1;
            continue;
        }

        let start = i;
        let mut end = i + 1;
        while end < len && buffer.info()[end].modified_combining_class() != 0 {
            end += 1;
        }

        if let Some(reorder) = ctx.reorder_marks {
            reorder(buffer, start, end);
        } else if end - start > 1 {
            buffer.info_mut()[start..end].sort_by_key(|gi| gi.modified_combining_class());
        }

        i = end;
    }
}

/// Phase 3 (§4.7 "Recompose"): fuses base+mark pairs the font has a precomposed
/// glyph for, walking backward so a chain of marks collapses onto the base
/// one step at a time, same as canonical `NFC` composition order.
fn recompose_buffer(ctx: &NormalizeContext, buffer: &mut Buffer) {
    if ctx.mode == NormalizationMode::None {
        return;
    }

    buffer.clear_output();

    if buffer.len() == 0 {
        buffer.sync();
        return;
    }

    buffer.next_glyph();

    while buffer.idx() < buffer.len() {
        let info = buffer.cur(0);
        let starter_is_candidate = info.modified_combining_class() != 0
            || ctx.mode == NormalizationMode::Composed
            || ctx.mode == NormalizationMode::ComposedDiacritics;

        if !starter_is_candidate {
            buffer.next_glyph();
            continue;
        }

        let out_len = buffer.out_len();
        if out_len == 0 {
            buffer.next_glyph();
            continue;
        }

        let base_idx = out_len - 1;
        let composed = {
            let bases = buffer.out_info();
            let base = bases[base_idx];
            compose(base.as_char(), info.as_char())
        };

        let accept = composed.and_then(|c| has_glyph(ctx.face, c).map(|gid| (c, gid)));

        let veto = ctx
            .compose_filter
            .map(|f| {
                let base = buffer.out_info()[base_idx];
                !f(&base, &info)
            })
            .unwrap_or(false);

        match accept {
            Some((c, gid)) if !veto => {
                let fused = {
                    let mut base = buffer.out_info()[base_idx];
                    base.codepoint = u32::from(c);
                    base.glyph_id = gid;
                    base
                };
                buffer.out_info_mut()[base_idx] = fused;
                buffer.skip_glyph();
            }
            _ => {
                buffer.next_glyph();
            }
        }
    }

    buffer.sync();
}

/// Runs all three phases in order (§4.7).
pub fn normalize(ctx: &NormalizeContext, buffer: &mut Buffer) {
    decompose_buffer(ctx, buffer);
    reorder_marks(ctx, buffer);
    recompose_buffer(ctx, buffer);
}
