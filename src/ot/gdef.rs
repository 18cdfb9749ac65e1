//! The `GDEF` table (§6 consumed interface): glyph class, mark attachment
//! class, and mark-glyph-set membership.

use crate::buffer::GlyphClass;
use crate::ot::classdef::ClassDef;
use crate::ot::coverage::Coverage;
use crate::parser::{offset16, offset32, Stream};
use crate::GlyphId;

pub struct Gdef<'a> {
    glyph_class_def: Option<ClassDef<'a>>,
    mark_attach_class_def: Option<ClassDef<'a>>,
    mark_glyph_sets: Vec<Option<Coverage<'a>>>,
    /// Set when the font's GDEF is on the checksum blocklist (§7): treated as
    /// absent, with classes synthesized from Unicode general category
    /// instead by the caller.
    pub blocklisted: bool,
}

impl<'a> Gdef<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let major: u16 = s.read()?;
        let minor: u16 = s.read()?;
        if major != 1 {
            return None;
        }

        // Byte layout: major(2) minor(2) glyphClassDefOffset(6) attachListOffset(8)
        // ligCaretListOffset(10) markAttachClassDefOffset(12) [markGlyphSetsDefOffset(14) if minor>=2].
        let glyph_class_def = offset16(data, 4).and_then(ClassDef::parse);
        let mark_attach_class_def = offset16(data, 10).and_then(ClassDef::parse);

        let mut mark_glyph_sets = Vec::new();
        if minor >= 2 {
            if let Some(mgc_data) = offset16(data, 12) {
                let mut ms = Stream::new(mgc_data);
                let fmt: u16 = ms.read().unwrap_or(0);
                if fmt == 1 {
                    if let Some(array) = ms.read_array16_counted::<u32>() {
                        for off in array.iter() {
                            if off == 0 {
                                mark_glyph_sets.push(None);
                            } else {
                                mark_glyph_sets.push(
                                    mgc_data.get(off as usize..).and_then(Coverage::parse),
                                );
                            }
                        }
                    }
                }
            }
        }

        Some(Gdef {
            glyph_class_def,
            mark_attach_class_def,
            mark_glyph_sets,
            blocklisted: false,
        })
    }

    pub fn glyph_class(&self, glyph: GlyphId) -> GlyphClass {
        self.glyph_class_def
            .map(|cd| GlyphClass::from_raw(cd.get(glyph) as u8))
            .unwrap_or(GlyphClass::Unclassified)
    }

    pub fn mark_attachment_class(&self, glyph: GlyphId) -> u8 {
        self.mark_attach_class_def.map(|cd| cd.get(glyph) as u8).unwrap_or(0)
    }

    pub fn mark_set_covers(&self, set_index: u16, glyph: GlyphId) -> bool {
        self.mark_glyph_sets
            .get(set_index as usize)
            .and_then(|c| c.as_ref())
            .map(|c| c.contains(glyph))
            .unwrap_or(false)
    }
}

/// A device table (§3 `Anchor` format 3 / §4.5 ValueRecord): ignored at the
/// design-unit level per spec — "apply zero delta" — but parsed so its
/// presence doesn't corrupt offsets downstream.
#[derive(Clone, Copy, Debug, Default)]
pub struct Device;

impl Device {
    pub fn delta(&self, _ppem: u16) -> i32 {
        0
    }
}

/// §3 `Anchor`: `(x, y)` in design units, plus an optional contour-point
/// index (format 2) or device tables (format 3, ignored here).
#[derive(Clone, Copy, Debug, Default)]
pub struct Anchor {
    pub x: i16,
    pub y: i16,
    pub contour_point: Option<u16>,
}

impl Anchor {
    pub fn parse(data: &[u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let format: u16 = s.read()?;
        let x: i16 = s.read()?;
        let y: i16 = s.read()?;
        match format {
            1 => Some(Anchor { x, y, contour_point: None }),
            2 => {
                let point: u16 = s.read()?;
                Some(Anchor { x, y, contour_point: Some(point) })
            }
            3 => Some(Anchor { x, y, contour_point: None }),
            _ => None,
        }
    }
}

pub fn parse_anchor_offset(base: &[u8], pos: usize) -> Option<Anchor> {
    offset16(base, pos).and_then(Anchor::parse)
}

/// §4.5 ValueRecord, resolved against the `ValueFormat` mask at parse time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ValueRecord {
    pub x_placement: i16,
    pub y_placement: i16,
    pub x_advance: i16,
    pub y_advance: i16,
}

bitflags! {
    pub struct ValueFormat: u16 {
        const X_PLACEMENT = 0x0001;
        const Y_PLACEMENT = 0x0002;
        const X_ADVANCE   = 0x0004;
        const Y_ADVANCE   = 0x0008;
        const X_PLA_DEVICE = 0x0010;
        const Y_PLA_DEVICE = 0x0020;
        const X_ADV_DEVICE = 0x0040;
        const Y_ADV_DEVICE = 0x0080;
    }
}

impl ValueFormat {
    pub fn size(self) -> usize {
        2 * self.bits().count_ones() as usize
    }

    /// Reads a `ValueRecord` matching this format; device-table offsets are
    /// skipped over (their deltas are treated as zero, per §4.5).
    pub fn read(self, s: &mut Stream) -> Option<ValueRecord> {
        let mut v = ValueRecord::default();
        if self.contains(ValueFormat::X_PLACEMENT) {
            v.x_placement = s.read()?;
        }
        if self.contains(ValueFormat::Y_PLACEMENT) {
            v.y_placement = s.read()?;
        }
        if self.contains(ValueFormat::X_ADVANCE) {
            v.x_advance = s.read()?;
        }
        if self.contains(ValueFormat::Y_ADVANCE) {
            v.y_advance = s.read()?;
        }
        if self.contains(ValueFormat::X_PLA_DEVICE) {
            s.skip::<u16>();
        }
        if self.contains(ValueFormat::Y_PLA_DEVICE) {
            s.skip::<u16>();
        }
        if self.contains(ValueFormat::X_ADV_DEVICE) {
            s.skip::<u16>();
        }
        if self.contains(ValueFormat::Y_ADV_DEVICE) {
            s.skip::<u16>();
        }
        Some(v)
    }
}

/// Resolves a 32-bit extension offset, for GSUB/GPOS type 7 Extension
/// subtables (§4.4 type 7).
pub fn resolve_extension(data: &[u8]) -> Option<(u16, &[u8])> {
    let mut s = Stream::new(data);
    let _format: u16 = s.read()?;
    let ext_type: u16 = s.read()?;
    let ext_data = offset32(data, 4)?;
    Some((ext_type, ext_data))
}
