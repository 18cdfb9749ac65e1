//! Coverage tables (C2): `glyph_id → coverage_index`, binary-searchable,
//! parsed lazily and never mutated.

use crate::parser::{LazyArray, Stream};
use crate::GlyphId;

pub const NOT_COVERED: u16 = 0xFFFF;

#[derive(Clone, Copy, Debug)]
struct RangeRecord {
    start: GlyphId,
    end: GlyphId,
    start_coverage_index: u16,
}

impl crate::parser::FromData for RangeRecord {
    const SIZE: usize = 6;

    fn parse(data: &[u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        Some(RangeRecord {
            start: s.read()?,
            end: s.read()?,
            start_coverage_index: s.read()?,
        })
    }
}

#[derive(Clone, Copy)]
enum Format<'a> {
    Glyphs(LazyArray<'a, GlyphId>),
    Ranges(LazyArray<'a, RangeRecord>),
}

/// A parsed `Coverage` table (format 1 = glyph list, format 2 = ranges).
#[derive(Clone, Copy)]
pub struct Coverage<'a> {
    format: Format<'a>,
}

impl<'a> Coverage<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let format: u16 = s.read()?;
        match format {
            1 => Some(Coverage { format: Format::Glyphs(s.read_array16_counted()?) }),
            2 => Some(Coverage { format: Format::Ranges(s.read_array16_counted()?) }),
            _ => None,
        }
    }

    /// Returns `NOT_COVERED` or the dense coverage index for `glyph`.
    pub fn get(&self, glyph: GlyphId) -> Option<u16> {
        match self.format {
            Format::Glyphs(array) => {
                array.binary_search_by(|g| g.cmp(&glyph)).map(|(i, _)| i)
            }
            Format::Ranges(array) => {
                array
                    .binary_search_by(|r| {
                        if glyph < r.start {
                            std::cmp::Ordering::Greater
                        } else if glyph > r.end {
                            std::cmp::Ordering::Less
                        } else {
                            std::cmp::Ordering::Equal
                        }
                    })
                    .map(|(_, r)| r.start_coverage_index + (glyph - r.start))
            }
        }
    }

    pub fn contains(&self, glyph: GlyphId) -> bool {
        self.get(glyph).is_some()
    }

    pub fn iter(&self) -> CoverageIter<'a> {
        match self.format {
            Format::Glyphs(array) => CoverageIter::Glyphs(array.iter()),
            Format::Ranges(array) => CoverageIter::Ranges(array.iter(), None),
        }
    }
}

pub enum CoverageIter<'a> {
    Glyphs(crate::parser::LazyArrayIter<'a, GlyphId>),
    Ranges(crate::parser::LazyArrayIter<'a, RangeRecord>, Option<(GlyphId, GlyphId)>),
}

impl Iterator for CoverageIter<'_> {
    type Item = GlyphId;

    fn next(&mut self) -> Option<GlyphId> {
        match self {
            CoverageIter::Glyphs(it) => it.next(),
            CoverageIter::Ranges(it, cur) => loop {
                if let Some((g, end)) = cur {
                    if *g <= *end {
                        let r = *g;
                        *g += 1;
                        return Some(r);
                    }
                    *cur = None;
                }

                let rec = it.next()?;
                *cur = Some((rec.start, rec.end));
            },
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
    fn format1_looks_up_listed_glyphs_in_order() {
        let mut data = Vec::new();
        data.extend_from_slice(&be16(1)); // format
        data.extend_from_slice(&be16(3)); // glyph count
        data.extend_from_slice(&be16(5));
        data.extend_from_slice(&be16(9));
        data.extend_from_slice(&be16(20));

        let cov = Coverage::parse(&data).unwrap();
        assert_eq!(cov.get(5), Some(0));
        assert_eq!(cov.get(9), Some(1));
        assert_eq!(cov.get(20), Some(2));
        assert_eq!(cov.get(6), None);
        assert!(cov.contains(9));
        assert!(!cov.contains(6));
    }

    #[test]
    fn format1_iter_yields_glyphs_in_listed_order() {
        let mut data = Vec::new();
        data.extend_from_slice(&be16(1));
        data.extend_from_slice(&be16(2));
        data.extend_from_slice(&be16(30));
        data.extend_from_slice(&be16(7));

        let cov = Coverage::parse(&data).unwrap();
        assert_eq!(cov.iter().collect::<Vec<_>>(), vec![30, 7]);
    }

    #[test]
    fn format2_resolves_ranges_by_binary_search() {
        let mut data = Vec::new();
        data.extend_from_slice(&be16(2)); // format
        data.extend_from_slice(&be16(2)); // range count
        // RangeRecord { start, end, start_coverage_index }
        data.extend_from_slice(&be16(10));
        data.extend_from_slice(&be16(12));
        data.extend_from_slice(&be16(0));
        data.extend_from_slice(&be16(50));
        data.extend_from_slice(&be16(52));
        data.extend_from_slice(&be16(3));

        let cov = Coverage::parse(&data).unwrap();
        assert_eq!(cov.get(10), Some(0));
        assert_eq!(cov.get(11), Some(1));
        assert_eq!(cov.get(12), Some(2));
        assert_eq!(cov.get(51), Some(4));
        assert_eq!(cov.get(13), None);
        assert_eq!(cov.get(49), None);
    }

    #[test]
    fn format2_iter_expands_ranges_in_order() {
        let mut data = Vec::new();
        data.extend_from_slice(&be16(2));
        data.extend_from_slice(&be16(2));
        data.extend_from_slice(&be16(10));
        data.extend_from_slice(&be16(12));
        data.extend_from_slice(&be16(0));
        data.extend_from_slice(&be16(50));
        data.extend_from_slice(&be16(51));
        data.extend_from_slice(&be16(3));

        let cov = Coverage::parse(&data).unwrap();
        assert_eq!(cov.iter().collect::<Vec<_>>(), vec![10, 11, 12, 50, 51]);
    }

    #[test]
    fn unknown_format_fails_to_parse() {
        let mut data = Vec::new();
        data.extend_from_slice(&be16(3));
        assert!(Coverage::parse(&data).is_none());
    }
}
