//! The attachment-offset propagator and fallback mark positioner (§4.10):
//! runs once after the whole GPOS pass, resolving the `attach_chain` links
//! `ot::gpos`'s mark/cursive lookups left behind into absolute offsets, then
//! (only for fonts with no GPOS mark-attachment lookups at all, and only for
//! shapers that opt in) synthesizes mark placement from `glyf` extents.

use crate::buffer::{AttachType, Buffer, GlyphClass};
use crate::common::Direction;
use crate::face::Face;

const MAX_NESTING: u8 = 6;

/// Resolves every glyph's `attach_chain` into absolute x/y offsets, walking
/// parents first so a chain of stacked marks (mark-to-mark-to-base) each
/// inherit their parent's already-resolved offset before adding their own.
pub fn propagate_attachment_offsets(buffer: &mut Buffer, direction: Direction) {
    for i in 0..buffer.len() {
        propagate_one(buffer, i, direction, MAX_NESTING);
    }
}

fn propagate_one(buffer: &mut Buffer, i: usize, direction: Direction, nesting: u8) {
    if nesting == 0 {
        return;
    }

    let (chain, attach_type) = {
        let pos = buffer.pos()[i];
        (pos.attach_chain, pos.attach_type)
    };
    if chain == 0 {
        return;
    }

    buffer.pos_mut()[i].attach_chain = 0;

    let j = i as i32 + i32::from(chain);
    if j < 0 || j as usize >= buffer.len() {
        return;
    }
    let j = j as usize;

    propagate_one(buffer, j, direction, nesting - 1);

    let parent = buffer.pos()[j];

    match attach_type {
        AttachType::Cursive => {
            if direction.is_horizontal() {
                buffer.pos_mut()[i].y_offset += parent.y_offset;
            } else {
                buffer.pos_mut()[i].x_offset += parent.x_offset;
            }
        }
        AttachType::Mark => {
            buffer.pos_mut()[i].x_offset += parent.x_offset;
            buffer.pos_mut()[i].y_offset += parent.y_offset;

            // The anchor offsets above are relative to the parent's own pen
            // position; fold in every intervening glyph's advance so the
            // mark lands relative to *its own* pen position instead.
            if !direction.is_backward() {
                let (lo, hi) = (j, i);
                for k in lo..hi {
                    let adv = buffer.pos()[k];
                    buffer.pos_mut()[i].x_offset -= adv.x_advance;
                    buffer.pos_mut()[i].y_offset -= adv.y_advance;
                }
            } else {
                let (lo, hi) = (j + 1, i + 1);
                for k in lo..hi {
                    let adv = buffer.pos()[k];
                    buffer.pos_mut()[i].x_offset += adv.x_advance;
                    buffer.pos_mut()[i].y_offset += adv.y_advance;
                }
            }
        }
        AttachType::None => {}
    }
}

/// §4.10 fallback mark positioning: stacks a combining mark's bounding box
/// above the preceding base's, centered on it, when the font carries no
/// GPOS mark-attachment lookup for the pair at all. Only runs for shapers
/// that report `fallback_position() == true` and only for glyphs GPOS never
/// touched (`attach_type == None`).
pub fn fallback_mark_positioning(face: &Face, buffer: &mut Buffer) {
    let mut base_idx: Option<usize> = None;
    let mut base_box = None;

    for i in 0..buffer.len() {
        let info = buffer.info()[i];
        if info.glyph_class != GlyphClass::Mark {
            base_idx = Some(i);
            base_box = face.glyph_bounding_box(info.glyph_id);
            continue;
        }

        if buffer.pos()[i].attach_type != AttachType::None {
            continue;
        }

        let (Some(_base_i), Some(base)) = (base_idx, base_box) else { continue };
        let Some(mark_box) = face.glyph_bounding_box(info.glyph_id) else { continue };

        let base_center_x = (i32::from(base.x_min) + i32::from(base.x_max)) / 2;
        let mark_center_x = (i32::from(mark_box.x_min) + i32::from(mark_box.x_max)) / 2;

        let pos = &mut buffer.pos_mut()[i];
        pos.x_offset += base_center_x - mark_center_x;
        pos.y_offset += i32::from(base.y_max) - i32::from(mark_box.y_min);
        pos.x_advance = 0;
        pos.y_advance = 0;
    }
}
