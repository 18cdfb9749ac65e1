//! Variable-font coordinate handling (C11, §4.11): `fvar`/`avar`
//! normalization and the OpenType script-tag table `ot::plan` resolves
//! `Script` values against.

use crate::common::{script, Script};
use crate::parser::{F2Dot14, FromData, LazyArray, Stream};
use crate::Tag;

/// Maps our internal `Script` enum to the four-letter OpenType script tag
/// used to index a font's `ScriptList` (§6 consumed interface). Scripts with
/// both an old- and new-style tag (e.g. Devanagari) prefer the new one, as
/// rustybuzz/HarfBuzz do, falling back to `DFLT` for anything unmapped.
pub fn script_tag(s: Script) -> Tag {
    match s {
        x if x == script::ARABIC => Tag::from_bytes(b"arab"),
        x if x == script::HEBREW => Tag::from_bytes(b"hebr"),
        x if x == script::THAI => Tag::from_bytes(b"thai"),
        x if x == script::HANGUL => Tag::from_bytes(b"hang"),
        x if x == script::DEVANAGARI => Tag::from_bytes(b"dev2"),
        x if x == script::BENGALI => Tag::from_bytes(b"bng2"),
        x if x == script::GURMUKHI => Tag::from_bytes(b"gur2"),
        x if x == script::GUJARATI => Tag::from_bytes(b"gjr2"),
        x if x == script::ORIYA => Tag::from_bytes(b"ory2"),
        x if x == script::TAMIL => Tag::from_bytes(b"tml2"),
        x if x == script::TELUGU => Tag::from_bytes(b"tel2"),
        x if x == script::KANNADA => Tag::from_bytes(b"knd2"),
        x if x == script::MALAYALAM => Tag::from_bytes(b"mlm2"),
        x if x == script::MYANMAR => Tag::from_bytes(b"mym2"),
        x if x == script::KHMER => Tag::from_bytes(b"khmr"),
        x if x == script::LATIN => Tag::from_bytes(b"latn"),
        x if x == script::CYRILLIC => Tag::from_bytes(b"cyrl"),
        x if x == script::GREEK => Tag::from_bytes(b"grek"),
        x if x == script::COMMON || x == script::INHERITED || x == script::UNKNOWN => {
            Tag::from_bytes(b"DFLT")
        }
        _ => Tag::from_bytes(b"DFLT"),
    }
}

#[derive(Clone, Copy)]
struct VarAxisRecord {
    tag: Tag,
    min_value: i32,
    default_value: i32,
    max_value: i32,
}

impl FromData for VarAxisRecord {
    const SIZE: usize = 20;

    fn parse(data: &[u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let tag = Tag(s.read()?);
        let min_value: i32 = s.read()?;
        let default_value: i32 = s.read()?;
        let max_value: i32 = s.read()?;
        let _flags: u16 = s.read()?;
        let _name_id: u16 = s.read()?;
        Some(VarAxisRecord { tag, min_value, default_value, max_value })
    }
}

/// The `fvar` table: the ordered axis list a `Variation` request is resolved
/// against (§4.11 "fvar gives axes").
pub struct Fvar<'a> {
    axes: LazyArray<'a, VarAxisRecord>,
}

impl<'a> Fvar<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let _major: u16 = s.read()?;
        let _minor: u16 = s.read()?;
        let axes_array_offset: u16 = s.read()?;
        let _reserved: u16 = s.read()?;
        let axis_count: u16 = s.read()?;
        let axis_size: u16 = s.read()?;
        if axis_size as usize != VarAxisRecord::SIZE {
            return None;
        }
        let axes_data = data.get(axes_array_offset as usize..)?;
        let needed = axis_count as usize * VarAxisRecord::SIZE;
        let axes_data = axes_data.get(..needed)?;
        let axes = LazyArray::new(axes_data);
        Some(Fvar { axes })
    }

    pub fn axis_count(&self) -> u16 {
        self.axes.len()
    }

    pub fn axis_tag(&self, index: u16) -> Option<Tag> {
        self.axes.get(index).map(|a| a.tag)
    }

    /// Converts a user-space coordinate on the axis named `tag` into a
    /// normalized `-1.0..=1.0` F2Dot14 value (prior to `avar` remapping),
    /// per the OpenType `fvar`/`avar` spec's piecewise-linear normalization.
    /// Returns the first matching axis at or after `from`, so a caller can
    /// loop over every axis sharing a tag (multi-axis-same-tag fonts).
    pub fn normalize_from(&self, from: u16, tag: Tag, user_value: f32) -> Option<(u16, i32)> {
        for i in from..self.axes.len() {
            let axis = self.axes.get(i)?;
            if axis.tag != tag {
                continue;
            }
            let v = user_value.clamp(axis.min_value as f32 / 65536.0, axis.max_value as f32 / 65536.0);
            let default = axis.default_value as f32 / 65536.0;
            let min = axis.min_value as f32 / 65536.0;
            let max = axis.max_value as f32 / 65536.0;

            let normalized = if v < default {
                if (default - min).abs() < f32::EPSILON {
                    0.0
                } else {
                    -(default - v) / (default - min)
                }
            } else if v > default {
                if (max - default).abs() < f32::EPSILON {
                    0.0
                } else {
                    (v - default) / (max - default)
                }
            } else {
                0.0
            };

            return Some((i, (normalized * 16384.0).round() as i32));
        }
        None
    }

    pub fn normalize(&self, tag: Tag, user_value: f32) -> Option<(u16, i32)> {
        self.normalize_from(0, tag, user_value)
    }
}

#[derive(Clone, Copy)]
struct AvarSegmentMap<'a> {
    pairs: LazyArray<'a, (F2Dot14, F2Dot14)>,
}

impl FromData for (F2Dot14, F2Dot14) {
    const SIZE: usize = 4;

    fn parse(data: &[u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        Some((s.read()?, s.read()?))
    }
}

/// The `avar` table: a piecewise-linear remapping of each axis' normalized
/// coordinate, applied after `Fvar::normalize` (§4.11 "avar maps normalized
/// coordinates non-linearly").
pub struct Avar<'a> {
    segment_maps: Vec<AvarSegmentMap<'a>>,
}

impl<'a> Avar<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let _major: u16 = s.read()?;
        let _minor: u16 = s.read()?;
        let _reserved: u16 = s.read()?;
        let axis_count: u16 = s.read()?;
        let mut segment_maps = Vec::with_capacity(axis_count as usize);
        for _ in 0..axis_count {
            let pos_count: u16 = s.read()?;
            let pairs: LazyArray<(F2Dot14, F2Dot14)> = s.read_array16(pos_count)?;
            segment_maps.push(AvarSegmentMap { pairs });
        }
        Some(Avar { segment_maps })
    }

    pub fn map(&self, axis_index: usize, value: i32) -> i32 {
        let Some(map) = self.segment_maps.get(axis_index) else { return value };
        if map.pairs.len() < 2 {
            return value;
        }

        let v = value as f32 / 16384.0;
        let mut lo = None;
        let mut hi = None;
        for i in 0..map.pairs.len() {
            let Some((from, to)) = map.pairs.get(i) else { continue };
            let from = from.to_f32();
            if from <= v {
                lo = Some((from, to.to_f32()));
            }
            if from >= v && hi.is_none() {
                hi = Some((from, to.to_f32()));
            }
        }

        match (lo, hi) {
            (Some((fl, tl)), Some((fh, th))) if (fh - fl).abs() > f32::EPSILON => {
                let t = (v - fl) / (fh - fl);
                (((tl + t * (th - tl)) * 16384.0).round() as i32).clamp(-16384, 16384)
            }
            (Some((_, t)), _) | (_, Some((_, t))) => (t * 16384.0).round() as i32,
            _ => value,
        }
    }
}

/// Resolved per-axis coordinates, normalized and `avar`-mapped, in the
/// F2Dot14 `-16384..=16384` integer domain `ot::layout::FeatureVariations`
/// and HVAR/gvar deltas consume.
#[derive(Clone, Debug, Default)]
pub struct NormalizedCoords(pub Vec<i32>);

impl NormalizedCoords {
    pub fn zero(axis_count: u16) -> Self {
        NormalizedCoords(vec![0; axis_count as usize])
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.0
    }
}
