//! The syllable-segmentation / reorder template shared by Indic, Khmer and
//! the Universal Shaping Engine, and partially by Myanmar (§4.9 steps 4-9).
//! Each script module supplies its own category table and a `starts_syllable`
//! predicate; this module owns the generic machinery: serial assignment,
//! dotted-circle insertion for broken clusters, and the stable reorder sort.

use crate::buffer::{Buffer, GlyphInfo, SyllableInfo};

/// Within-syllable placement used by step 7's stable sort. Scripts map their
/// own category onto a subset of these; unused variants are harmless.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Position {
    Start = 0,
    RaToBecomeReph = 1,
    PreM = 2,
    PreC = 3,
    Base = 4,
    AfterMain = 5,
    AboveC = 6,
    BeforeSub = 7,
    BelowC = 8,
    AfterSub = 9,
    BeforePost = 10,
    PostC = 11,
    AfterPost = 12,
    Smvd = 13,
    End = 14,
}

/// What step 5's segmentation recognized a run as.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SyllableKind {
    Consonant = 0,
    Vowel = 1,
    Standalone = 2,
    Symbol = 3,
    Broken = 4,
    NonCluster = 5,
}

/// Cuts the buffer into syllables: a new syllable starts at every glyph for
/// which `starts_syllable` returns true. A run whose first glyph does *not*
/// itself start a syllable (a stray dependent vowel or mark with no base) is
/// tagged `Broken` per §4.9 step 6. Serial wraps 1..=15 as the packed
/// `SyllableInfo` only has 4 bits for it.
pub fn find_syllables<F: Fn(&GlyphInfo) -> bool>(buffer: &mut Buffer, starts_syllable: F) {
    let len = buffer.len();
    let mut serial = 1u8;
    let mut i = 0;
    while i < len {
        let start = i;
        let starts_clean = starts_syllable(&buffer.info()[i]);
        i += 1;
        while i < len && !starts_syllable(&buffer.info()[i]) {
            i += 1;
        }
        let end = i;

        let kind = if starts_clean { SyllableKind::Consonant } else { SyllableKind::Broken };
        for g in &mut buffer.info_mut()[start..end] {
            g.syllable = SyllableInfo::new(serial, kind as u8);
        }

        serial = if serial == 15 { 1 } else { serial + 1 };
    }
}

/// §4.9 step 6: insert a dotted circle (U+25CC) at the start of every
/// `Broken` syllable, copying cluster/mask/syllable from the glyph it's
/// inserted before. No-op if the font has no dotted-circle glyph.
pub fn insert_dotted_circles(buffer: &mut Buffer, dotted_circle_glyph: Option<crate::GlyphId>) {
    let Some(glyph_id) = dotted_circle_glyph else { return };

    let mut broken_starts = Vec::new();
    let mut i = 0;
    while i < buffer.len() {
        let start = i;
        let serial = buffer.info()[i].syllable.serial();
        while i < buffer.len() && buffer.info()[i].syllable.serial() == serial {
            i += 1;
        }
        if buffer.info()[start].syllable.kind() == SyllableKind::Broken as u8 {
            broken_starts.push(start);
        }
    }

    if broken_starts.is_empty() {
        return;
    }

    // Grow once for the whole pass, then insert back-to-front so earlier
    // indices in `broken_starts` stay valid as later ones shift the tail.
    let base_len = buffer.len();
    buffer.ensure(base_len + broken_starts.len());
    let mut len = base_len;
    for &start in broken_starts.iter().rev() {
        len += 1;
        buffer.info_mut().copy_within(start..len - 1, start + 1);
        buffer.pos_mut().copy_within(start..len - 1, start + 1);

        let mut dotted = buffer.info()[start + 1];
        dotted.codepoint = 0x25CC;
        dotted.glyph_id = glyph_id;
        dotted.glyph_class = crate::buffer::GlyphClass::Base;
        buffer.info_mut()[start] = dotted;
        buffer.pos_mut()[start] = Default::default();
    }
}

/// Stably reorders `buffer[start..end]` by `get_position`, keeping the
/// glyph-position array index-aligned with glyph info (§4.9 step 7).
pub fn sort_by_position<G: Fn(&GlyphInfo) -> Position>(buffer: &mut Buffer, start: usize, end: usize, get_position: G) {
    if end <= start + 1 {
        return;
    }

    let mut order: Vec<usize> = (start..end).collect();
    order.sort_by_key(|&i| get_position(&buffer.info()[i]));

    let info: Vec<GlyphInfo> = order.iter().map(|&i| buffer.info()[i]).collect();
    let pos: Vec<_> = order.iter().map(|&i| buffer.pos()[i]).collect();

    for (k, i) in (start..end).enumerate() {
        buffer.info_mut()[i] = info[k];
        buffer.pos_mut()[i] = pos[k];
    }
}

/// Runs `f` once per syllable (contiguous run sharing a serial), passing the
/// `[start, end)` range.
pub fn for_each_syllable<F: FnMut(&mut Buffer, usize, usize)>(buffer: &mut Buffer, mut f: F) {
    let mut i = 0;
    while i < buffer.len() {
        let serial = buffer.info()[i].syllable.serial();
        let start = i;
        while i < buffer.len() && buffer.info()[i].syllable.serial() == serial {
            i += 1;
        }
        f(buffer, start, i);
    }
}

/// §4.9 step 9: clears the serial (but not the type) once stage-A lookups
/// have run, so later global features aren't syllable-restricted.
pub fn clear_syllables(buffer: &mut Buffer) {
    for g in buffer.info_mut() {
        g.syllable = SyllableInfo::new(0, g.syllable.kind());
    }
}
