//! Class-definition tables (C2): `glyph_id → class`, `0` on miss.

use crate::parser::{FromData, LazyArray, Stream};
use crate::GlyphId;

#[derive(Clone, Copy, Debug)]
struct ClassRangeRecord {
    start: GlyphId,
    end: GlyphId,
    class: u16,
}

impl FromData for ClassRangeRecord {
    const SIZE: usize = 6;

    fn parse(data: &[u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        Some(ClassRangeRecord {
            start: s.read()?,
            end: s.read()?,
            class: s.read()?,
        })
    }
}

#[derive(Clone, Copy)]
enum Format<'a> {
    /// Format 1: a dense array of classes starting at `start_glyph`.
    Array { start_glyph: GlyphId, classes: LazyArray<'a, u16> },
    /// Format 2: sorted, non-overlapping glyph ranges.
    Ranges(LazyArray<'a, ClassRangeRecord>),
}

#[derive(Clone, Copy)]
pub struct ClassDef<'a> {
    format: Format<'a>,
}

impl<'a> ClassDef<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let format: u16 = s.read()?;
        match format {
            1 => {
                let start_glyph = s.read()?;
                let classes = s.read_array16_counted()?;
                Some(ClassDef { format: Format::Array { start_glyph, classes } })
            }
            2 => Some(ClassDef { format: Format::Ranges(s.read_array16_counted()?) }),
            _ => None,
        }
    }

    pub fn get(&self, glyph: GlyphId) -> u16 {
        match self.format {
            Format::Array { start_glyph, classes } => {
                if glyph < start_glyph {
                    return 0;
                }
                classes.get(glyph - start_glyph).unwrap_or(0)
            }
            Format::Ranges(array) => array
                .binary_search_by(|r| {
                    if glyph < r.start {
                        std::cmp::Ordering::Greater
                    } else if glyph > r.end {
                        std::cmp::Ordering::Less
                    } else {
                        std::cmp::Ordering::Equal
                    }
                })
                .map(|(_, r)| r.class)
                .unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn be16(v: u16) -> [u8; 2] {
        v.to_be_bytes()
    }

    #[test]
    fn format1_is_dense_from_start_glyph() {
        let mut data = Vec::new();
        data.extend_from_slice(&be16(1)); // format
        data.extend_from_slice(&be16(100)); // startGlyph
        data.extend_from_slice(&be16(3)); // glyphCount
        data.extend_from_slice(&be16(1));
        data.extend_from_slice(&be16(0));
        data.extend_from_slice(&be16(2));

        let cd = ClassDef::parse(&data).unwrap();
        assert_eq!(cd.get(99), 0); // below start_glyph: miss
        assert_eq!(cd.get(100), 1);
        assert_eq!(cd.get(101), 0);
        assert_eq!(cd.get(102), 2);
        assert_eq!(cd.get(103), 0); // past the array: miss
    }

    #[test]
    fn format2_resolves_ranges_and_defaults_to_zero() {
        let mut data = Vec::new();
        data.extend_from_slice(&be16(2)); // format
        data.extend_from_slice(&be16(2)); // rangeCount
        data.extend_from_slice(&be16(5));
        data.extend_from_slice(&be16(7));
        data.extend_from_slice(&be16(4));
        data.extend_from_slice(&be16(20));
        data.extend_from_slice(&be16(20));
        data.extend_from_slice(&be16(1));

        let cd = ClassDef::parse(&data).unwrap();
        assert_eq!(cd.get(5), 4);
        assert_eq!(cd.get(6), 4);
        assert_eq!(cd.get(7), 4);
        assert_eq!(cd.get(20), 1);
        assert_eq!(cd.get(8), 0);
        assert_eq!(cd.get(4), 0);
    }

    #[test]
    fn unknown_format_fails_to_parse() {
        let mut data = Vec::new();
        data.extend_from_slice(&be16(9));
        assert!(ClassDef::parse(&data).is_none());
    }
}
