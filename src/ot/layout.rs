//! Shared GSUB/GPOS structural layout: `ScriptList`/`FeatureList`/
//! `LookupList` and the `LookupFlag` bit enumeration (§3 `Lookup`, §4.6).

use crate::parser::{offset16, offset32, FromData, LazyArray, Stream};
use crate::Tag;

bitflags! {
    /// §3 `Lookup` flag bits.
    pub struct LookupFlag: u16 {
        const RIGHT_TO_LEFT = 0x0001;
        const IGNORE_BASE_GLYPHS = 0x0002;
        const IGNORE_LIGATURES = 0x0004;
        const IGNORE_MARKS = 0x0008;
        const USE_MARK_FILTERING_SET = 0x0010;
    }
}

impl LookupFlag {
    pub fn mark_attachment_type(self) -> u8 {
        (self.bits() >> 8) as u8
    }
}

#[derive(Clone, Copy)]
struct LangSysRecord {
    tag: Tag,
    offset: u16,
}

impl FromData for LangSysRecord {
    const SIZE: usize = 6;

    fn parse(data: &[u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        Some(LangSysRecord { tag: Tag(s.read()?), offset: s.read()? })
    }
}

/// A `LangSys` record: required feature plus the ordered feature indices
/// enabled under this script+language (§3 glossary `LangSys`).
#[derive(Clone, Copy)]
pub struct LangSys<'a> {
    pub required_feature_index: u16,
    feature_indices: LazyArray<'a, u16>,
}

impl<'a> LangSys<'a> {
    fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let _lookup_order: u16 = s.read()?;
        let required_feature_index: u16 = s.read()?;
        let feature_indices = s.read_array16_counted()?;
        Some(LangSys { required_feature_index, feature_indices })
    }

    pub fn feature_indices(&self) -> impl Iterator<Item = u16> + '_ {
        self.feature_indices.iter()
    }
}

#[derive(Clone, Copy)]
struct ScriptRecord {
    tag: Tag,
    offset: u16,
}

impl FromData for ScriptRecord {
    const SIZE: usize = 6;

    fn parse(data: &[u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        Some(ScriptRecord { tag: Tag(s.read()?), offset: s.read()? })
    }
}

pub struct ScriptTable<'a> {
    data: &'a [u8],
}

impl<'a> ScriptTable<'a> {
    pub fn default_lang_sys(&self) -> Option<LangSys<'a>> {
        offset16(self.data, 0).and_then(LangSys::parse)
    }

    pub fn find_lang_sys(&self, tag: Tag) -> Option<LangSys<'a>> {
        let mut s = Stream::new_at(self.data, 2)?;
        let records: LazyArray<LangSysRecord> = s.read_array16_counted()?;
        let (_, rec) = records.binary_search_by(|r| r.tag.as_u32().cmp(&tag.as_u32()))?;
        self.data.get(usize::from(rec.offset)..).and_then(LangSys::parse)
    }

    /// Resolves `(requested-language, requested-script) → dflt → None`, the
    /// fallback chain §4.6 step 4 describes.
    pub fn lang_sys_or_default(&self, tag: Option<Tag>) -> Option<LangSys<'a>> {
        if let Some(tag) = tag {
            if let Some(ls) = self.find_lang_sys(tag) {
                return Some(ls);
            }
        }
        self.default_lang_sys()
    }
}

/// The `ScriptList` table.
pub struct ScriptList<'a> {
    records: LazyArray<'a, ScriptRecord>,
    data: &'a [u8],
}

impl<'a> ScriptList<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let records = s.read_array16_counted()?;
        Some(ScriptList { records, data })
    }

    pub fn find(&self, tag: Tag) -> Option<ScriptTable<'a>> {
        let (_, rec) = self.records.binary_search_by(|r| r.tag.as_u32().cmp(&tag.as_u32()))?;
        let data = self.data.get(usize::from(rec.offset)..)?;
        Some(ScriptTable { data })
    }

    pub fn get_or_dflt(&self, tag: Tag) -> Option<ScriptTable<'a>> {
        self.find(tag).or_else(|| self.find(Tag::from_bytes(b"DFLT")))
            .or_else(|| self.find(Tag::from_bytes(b"dflt")))
    }
}

#[derive(Clone, Copy)]
struct FeatureRecord {
    tag: Tag,
    offset: u16,
}

impl FromData for FeatureRecord {
    const SIZE: usize = 6;

    fn parse(data: &[u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        Some(FeatureRecord { tag: Tag(s.read()?), offset: s.read()? })
    }
}

/// A parsed `Feature` table entry: its tag and the lookup indices it turns on.
pub struct FeatureTable<'a> {
    pub tag: Tag,
    lookup_list_indices: LazyArray<'a, u16>,
}

impl<'a> FeatureTable<'a> {
    pub fn lookup_indices(&self) -> impl Iterator<Item = u16> + '_ {
        self.lookup_list_indices.iter()
    }
}

pub struct FeatureList<'a> {
    records: LazyArray<'a, FeatureRecord>,
    data: &'a [u8],
}

impl<'a> FeatureList<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let records = s.read_array16_counted()?;
        Some(FeatureList { records, data })
    }

    pub fn get(&self, index: u16) -> Option<FeatureTable<'a>> {
        let rec = self.records.get(index)?;
        let data = self.data.get(usize::from(rec.offset)..)?;
        let mut s = Stream::new(data);
        let _feature_params: u16 = s.read()?;
        let lookup_list_indices = s.read_array16_counted()?;
        Some(FeatureTable { tag: rec.tag, lookup_list_indices })
    }

    pub fn len(&self) -> u16 {
        self.records.len()
    }
}

/// One `Lookup` table header: type, flag, and raw subtable byte slices. The
/// table-specific subtable enum (GSUB/GPOS) is parsed lazily by the caller
/// from `subtable_data(i)`, keeping this module table-agnostic.
pub struct LookupTable<'a> {
    pub lookup_type: u16,
    pub flag: LookupFlag,
    pub mark_filtering_set: Option<u16>,
    data: &'a [u8],
    subtable_offsets: LazyArray<'a, u16>,
}

impl<'a> LookupTable<'a> {
    fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let lookup_type: u16 = s.read()?;
        let flag_bits: u16 = s.read()?;
        let flag = LookupFlag::from_bits_truncate(flag_bits);
        let subtable_offsets = s.read_array16_counted()?;
        let mark_filtering_set = if flag.contains(LookupFlag::USE_MARK_FILTERING_SET) {
            Some(s.read()?)
        } else {
            None
        };

        Some(LookupTable { lookup_type, flag, mark_filtering_set, data, subtable_offsets })
    }

    pub fn subtable_count(&self) -> u16 {
        self.subtable_offsets.len()
    }

    pub fn subtable_data(&self, index: u16) -> Option<&'a [u8]> {
        let offset = self.subtable_offsets.get(index)?;
        self.data.get(usize::from(offset)..)
    }
}

pub struct LookupList<'a> {
    data: &'a [u8],
    offsets: LazyArray<'a, u16>,
}

impl<'a> LookupList<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let offsets = s.read_array16_counted()?;
        Some(LookupList { data, offsets })
    }

    pub fn len(&self) -> u16 {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn get(&self, index: u16) -> Option<LookupTable<'a>> {
        let offset = self.offsets.get(index)?;
        let data = self.data.get(usize::from(offset)..)?;
        LookupTable::parse(data)
    }
}

/// A condition set in a `FeatureVariations` table (§4.11): a binary-search
/// over normalized-coordinate ranges selecting a substitute `FeatureTable`.
pub struct FeatureVariations<'a> {
    data: &'a [u8],
    records_offset: usize,
    count: u32,
}

#[derive(Clone, Copy)]
struct ConditionSetRecord {
    condition_set_offset: u32,
    feature_table_substitution_offset: u32,
}

impl<'a> FeatureVariations<'a> {
    pub fn parse(data: &'a [u8]) -> Option<Self> {
        let mut s = Stream::new(data);
        let _major: u16 = s.read()?;
        let _minor: u16 = s.read()?;
        let count: u32 = s.read()?;
        Some(FeatureVariations { data, records_offset: s.offset(), count })
    }

    fn record(&self, index: u32) -> Option<ConditionSetRecord> {
        let pos = self.records_offset + index as usize * 8;
        let mut s = Stream::new_at(self.data, pos)?;
        Some(ConditionSetRecord {
            condition_set_offset: s.read()?,
            feature_table_substitution_offset: s.read()?,
        })
    }

    /// Evaluates every condition set against `coords` (normalized F2Dot14 in
    /// 16.16-scaled form, i.e. `-1.0..=1.0` as `i32` in 2.14 fixed point) and
    /// returns the first fully-matching record's index, per §4.11.
    pub fn find_match(&self, coords: &[i32]) -> Option<u32> {
        'outer: for i in 0..self.count {
            let rec = self.record(i)?;
            if rec.condition_set_offset == 0 {
                continue;
            }
            let cs_data = self.data.get(rec.condition_set_offset as usize..)?;
            let mut s = Stream::new(cs_data);
            let cond_count: u16 = s.read()?;
            for _ in 0..cond_count {
                let cond_offset: u32 = s.read()?;
                let cond_data = cs_data.get(cond_offset as usize..)?;
                let mut cs = Stream::new(cond_data);
                let format: u16 = cs.read()?;
                if format != 1 {
                    continue 'outer;
                }
                let axis_index: u16 = cs.read()?;
                let min: i16 = cs.read()?;
                let max: i16 = cs.read()?;
                let v = coords.get(axis_index as usize).copied().unwrap_or(0) as i16;
                if v < min || v > max {
                    continue 'outer;
                }
            }
            return Some(i);
        }
        None
    }

    pub fn substitution_for(&self, record_index: u32, feature_index: u16) -> Option<u32> {
        let rec = self.record(record_index)?;
        if rec.feature_table_substitution_offset == 0 {
            return None;
        }
        let data = self.data.get(rec.feature_table_substitution_offset as usize..)?;
        let mut s = Stream::new(data);
        let _major: u16 = s.read()?;
        let _minor: u16 = s.read()?;
        let count: u16 = s.read()?;
        for _ in 0..count {
            let idx: u16 = s.read()?;
            let feature_offset: u32 = s.read()?;
            if idx == feature_index {
                return Some(rec.feature_table_substitution_offset + feature_offset);
            }
        }
        None
    }
}

pub(crate) fn offset_data<'a>(data: &'a [u8], pos: usize) -> Option<&'a [u8]> {
    offset32(data, pos).or_else(|| offset16(data, pos))
}
