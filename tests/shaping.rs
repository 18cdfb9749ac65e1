//! Black-box tests driving the public API against a synthetic in-memory
//! font, matching the teacher's own top-level `tests/tests.rs` layout.

mod common;

use glyphforge::{Direction, Face, UnicodeBuffer};

const ADVANCE: u16 = 500;

fn shape_text(font: &[u8], text: &str, direction: Option<Direction>) -> glyphforge::GlyphBuffer {
    let face = Face::from_slice(font, 0).expect("synthetic font should parse");
    let mut buffer = UnicodeBuffer::new();
    buffer.push_str(text);
    if let Some(direction) = direction {
        buffer.set_direction(direction);
    }
    glyphforge::shape(&face, buffer, &[])
}

#[test]
fn ltr_text_maps_codepoints_to_glyphs_in_logical_order() {
    let font = common::build_ascii_font(ADVANCE);
    let output = shape_text(&font, "abc", Some(Direction::LeftToRight));

    let infos = output.glyph_infos();
    assert_eq!(infos.len(), 3);
    assert_eq!(infos[0].glyph_id, common::glyph_for('a'));
    assert_eq!(infos[1].glyph_id, common::glyph_for('b'));
    assert_eq!(infos[2].glyph_id, common::glyph_for('c'));
    assert_eq!(infos.iter().map(|g| g.cluster).collect::<Vec<_>>(), vec![0, 1, 2]);

    for pos in output.glyph_positions() {
        assert_eq!(pos.x_advance, i32::from(ADVANCE));
    }
}

#[test]
fn rtl_text_is_reversed_exactly_once() {
    // Scenario E1/Testable Property 3: shaping an RTL run produces the
    // glyphs in visual (reversed) order, not logical order.
    let font = common::build_ascii_font(ADVANCE);
    let output = shape_text(&font, "abc", Some(Direction::RightToLeft));

    let infos = output.glyph_infos();
    assert_eq!(infos.len(), 3);
    assert_eq!(infos[0].glyph_id, common::glyph_for('c'));
    assert_eq!(infos[1].glyph_id, common::glyph_for('b'));
    assert_eq!(infos[2].glyph_id, common::glyph_for('a'));
}

#[test]
fn missing_glyphs_fall_back_to_notdef() {
    // The synthetic font only covers printable ASCII; anything outside
    // that range has no cmap entry and should come back as glyph 0.
    let font = common::build_ascii_font(ADVANCE);
    let output = shape_text(&font, "\u{1F600}", Some(Direction::LeftToRight));

    assert_eq!(output.glyph_infos()[0].glyph_id, 0);
}

#[test]
fn empty_buffer_shapes_to_nothing() {
    let font = common::build_ascii_font(ADVANCE);
    let output = shape_text(&font, "", Some(Direction::LeftToRight));
    assert!(output.is_empty());
}
