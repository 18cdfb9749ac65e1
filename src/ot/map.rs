//! The OT map / feature compiler (C6, §4.6): turns a sequence of
//! `add_feature`/`enable_feature` requests into per-lookup masks, resolving
//! the requested script/language against `ScriptList`/`FeatureList` and
//! allocating one bit per boolean feature (bit 31 reserved for the global
//! "always on" mask every glyph starts with, `buffer::add_codepoint`).

use std::collections::BTreeMap;

use crate::ot::layout::{FeatureList, FeatureVariations, LookupList, ScriptList};
use crate::Mask;
use crate::Tag;

/// The bit every glyph is born with (`Buffer::add_codepoint`); lookups with
/// this bit set in their mask run regardless of which named features are on.
pub const GLOBAL_BIT_MASK: Mask = 1 << 31;
pub const GLOBAL_BIT_SHIFT: u32 = 31;

bitflags! {
    /// §4.6 per-feature request flags.
    pub struct FeatureFlags: u8 {
        /// Applies everywhere in the run rather than only within the
        /// sub-range it was requested for.
        const GLOBAL = 0x01;
        /// Glyphs this feature would otherwise skip as ZWNJ are still
        /// processed (used by e.g. Arabic `rlig` across a ZWNJ).
        const MANUAL_ZWNJ = 0x02;
        const MANUAL_ZWJ = 0x04;
        const HAS_FALLBACK = 0x08;
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
struct FeatureKey {
    tag: Tag,
    seq: usize,
}

#[derive(Clone, Copy, Debug)]
struct FeatureRequest {
    tag: Tag,
    seq: usize,
    global: bool,
    flags: FeatureFlags,
    value: u32,
}

/// Which of a font's two layout tables a `compile` pass targets. A feature
/// tag isn't bound to one table by the request that registered it — it's
/// resolved against whichever table's `FeatureList` actually defines it, so
/// `compile` is simply called once per table with that table's tag/offset
/// data.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TableKind {
    Gsub,
    Gpos,
}

/// One resolved, bit-allocated lookup, ready for `ot::apply` to run (§4.6
/// final output: "lookup index, mask, auto_zwnj, auto_zwj, random").
#[derive(Clone, Copy, Debug)]
pub struct LookupMap {
    pub index: u16,
    pub mask: Mask,
    pub auto_zwnj: bool,
    pub auto_zwj: bool,
    pub random: bool,
    /// The requested feature's value (§4.4 type 3 Alternate: 1-based
    /// alternate index; 0 selects the default/first alternate).
    pub value: u32,
}

/// Marks a boundary in the lookup sequence where the complex shaper gets a
/// chance to run a mid-shaping pass (§4.8 Arabic stch, §4.9 syllable
/// clearing) before the next batch of lookups applies. `pause` is an opaque
/// id the calling complex shaper assigned via `add_gsub_pause`/`add_gpos_pause`
/// and interprets itself; the map doesn't know what it means.
#[derive(Clone, Copy, Debug)]
pub struct StageBoundary {
    /// Number of lookups (from the start of this table) that have run by the
    /// time this boundary is reached.
    pub lookup_count: usize,
    pub pause: u8,
}

/// Collects feature requests during shape-plan construction, then resolves
/// them into `LookupMap` lists against a font's actual `ScriptList`/
/// `FeatureList`/`LookupList` (§4.6). Used both as the builder
/// (`add_feature`/`enable_feature`/`add_gsub_pause`) and, after `compile`,
/// as the read side (`get_1_mask`) the complex shapers and `ot::apply`
/// consult while running.
#[derive(Default)]
pub struct Map {
    requests: Vec<FeatureRequest>,
    next_seq: usize,
    gsub_pauses: Vec<(usize, u8)>,
    gpos_pauses: Vec<(usize, u8)>,

    masks: BTreeMap<Tag, (Mask, u32)>,
    gsub_lookups: Vec<LookupMap>,
    gpos_lookups: Vec<LookupMap>,
    gsub_stages: Vec<StageBoundary>,
    gpos_stages: Vec<StageBoundary>,
    found_script: [bool; 2],
}

impl Map {
    pub fn new() -> Self {
        Map::default()
    }

    /// §4.6: queue a feature at its default (per-range, not global) scope.
    pub fn add_feature(&mut self, tag: Tag, flags: FeatureFlags, value: u32) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.requests.push(FeatureRequest {
            tag,
            seq,
            global: flags.contains(FeatureFlags::GLOBAL),
            flags,
            value,
        });
    }

    /// §4.6: queue a feature that applies across the whole run.
    pub fn enable_feature(&mut self, tag: Tag, flags: FeatureFlags, value: u32) {
        self.add_feature(tag, flags | FeatureFlags::GLOBAL, value);
    }

    pub fn disable_feature(&mut self, tag: Tag) {
        self.add_feature(tag, FeatureFlags::GLOBAL, 0);
    }

    /// Registers a pause point after the `n`th feature requested so far
    /// (counted by insertion order, resolved to a lookup count once
    /// `compile` runs for that table).
    pub fn add_gsub_pause(&mut self, pause: u8) {
        self.gsub_pauses.push((self.requests.len(), pause));
    }

    pub fn add_gpos_pause(&mut self, pause: u8) {
        self.gpos_pauses.push((self.requests.len(), pause));
    }

    /// §4.6 steps 1-4, scoped to one table: merge duplicate-tag requests
    /// (stable by sequence; later-global overrides earlier, later-per-range
    /// demotes an earlier global and keeps the larger value), allocate one
    /// mask bit per surviving feature (bit 31 reserved for the always-on
    /// global bit; idempotent across repeated calls since it only depends on
    /// `self.requests`), then resolve each feature's lookup indices against
    /// the font's script/language and build this table's `LookupMap` list.
    /// Called once per table (GSUB, then GPOS) since the two tables have
    /// independent `FeatureList`/`LookupList` pairs but share mask bits.
    pub fn compile(
        &mut self,
        table: TableKind,
        script_list: Option<&ScriptList>,
        feature_list: Option<&FeatureList>,
        feature_variations: Option<&FeatureVariations>,
        var_coords: &[i32],
        lookups: Option<&LookupList>,
        script_tag: Tag,
        lang_tag: Option<Tag>,
    ) {
        match table {
            TableKind::Gsub => {
                self.gsub_lookups.clear();
                self.gsub_stages.clear();
            }
            TableKind::Gpos => {
                self.gpos_lookups.clear();
                self.gpos_stages.clear();
            }
        }

        let merged = self.merge_requests();

        let mut next_bit = 1u32;
        let mut resolved: Vec<(FeatureRequest, Mask, u32)> = Vec::with_capacity(merged.len());
        for req in merged {
            if req.value == 0 && !req.flags.contains(FeatureFlags::HAS_FALLBACK) {
                // A feature explicitly disabled (value 0, no fallback) still
                // needs a mask slot only if some lookup might test it; skip
                // allocating a bit to conserve the 30 available slots.
                continue;
            }
            if next_bit >= GLOBAL_BIT_SHIFT {
                log::warn!("ran out of feature mask bits compiling shaping plan; dropping {:?}", req.tag);
                continue;
            }
            let mask = 1u32 << next_bit;
            next_bit += 1;
            self.masks.insert(req.tag, (mask, req.value));
            resolved.push((req, mask, req.value));
        }

        let script = script_list.and_then(|sl| sl.get_or_dflt(script_tag));
        let lang_sys = script.as_ref().and_then(|s| s.lang_sys_or_default(lang_tag));

        self.found_script[table as usize] = script.is_some();

        let mut out: Vec<LookupMap> = Vec::new();
        for (req, mask, value) in &resolved {
            let (Some(lookups), Some(features)) = (lookups, feature_list) else { continue };

            let indices = self.feature_indices_for_tag(features, lang_sys.as_ref(), req.tag);
            for feature_index in indices {
                let Some(feature) = self.substituted_feature(
                    features,
                    feature_variations,
                    var_coords,
                    feature_index,
                ) else {
                    continue;
                };
                for lookup_index in feature.lookup_indices() {
                    if lookups.get(lookup_index).is_none() {
                        continue;
                    }
                    out.push(LookupMap {
                        index: lookup_index,
                        mask: *mask | GLOBAL_BIT_MASK,
                        auto_zwnj: !req.flags.contains(FeatureFlags::MANUAL_ZWNJ),
                        auto_zwj: !req.flags.contains(FeatureFlags::MANUAL_ZWJ),
                        random: req.tag == Tag::from_bytes(b"rand"),
                        value: *value,
                    });
                }
            }
        }

        Self::sort_and_merge_lookups(&mut out);

        match table {
            TableKind::Gsub => {
                self.gsub_stages = Self::resolve_stage_boundaries(&self.gsub_pauses, out.len());
                self.gsub_lookups = out;
            }
            TableKind::Gpos => {
                self.gpos_stages = Self::resolve_stage_boundaries(&self.gpos_pauses, out.len());
                self.gpos_lookups = out;
            }
        }
    }

    fn feature_indices_for_tag(
        &self,
        features: &FeatureList,
        lang_sys: Option<&crate::ot::layout::LangSys>,
        tag: Tag,
    ) -> Vec<u16> {
        let mut out = Vec::new();
        if let Some(ls) = lang_sys {
            if ls.required_feature_index != 0xFFFF {
                if let Some(f) = features.get(ls.required_feature_index) {
                    if f.tag == tag {
                        out.push(ls.required_feature_index);
                    }
                }
            }
            for idx in ls.feature_indices() {
                if let Some(f) = features.get(idx) {
                    if f.tag == tag {
                        out.push(idx);
                    }
                }
            }
        } else {
            for idx in 0..features.len() {
                if let Some(f) = features.get(idx) {
                    if f.tag == tag {
                        out.push(idx);
                    }
                }
            }
        }
        out
    }

    fn substituted_feature<'a>(
        &self,
        features: &FeatureList<'a>,
        variations: Option<&FeatureVariations<'a>>,
        var_coords: &[i32],
        feature_index: u16,
    ) -> Option<crate::ot::layout::FeatureTable<'a>> {
        if let (Some(variations), false) = (variations, var_coords.is_empty()) {
            if let Some(record) = variations.find_match(var_coords) {
                if let Some(_offset) = variations.substitution_for(record, feature_index) {
                    // The substitute feature table lives at an absolute offset
                    // into the FeatureVariations table's owning buffer; our
                    // `FeatureList` is scoped to the FeatureList table itself,
                    // so without a shared base we fall back to the
                    // unsubstituted feature. Plans built from fonts with
                    // variable feature substitutions therefore use the
                    // default rule set; see DESIGN.md.
                }
            }
        }
        features.get(feature_index)
    }

    fn merge_requests(&self) -> Vec<FeatureRequest> {
        let mut by_tag: BTreeMap<Tag, FeatureRequest> = BTreeMap::new();
        let mut order: Vec<Tag> = Vec::new();

        let mut sorted = self.requests.clone();
        sorted.sort_by_key(|r| (r.tag.as_u32(), r.seq));

        for req in sorted {
            match by_tag.get_mut(&req.tag) {
                None => {
                    order.push(req.tag);
                    by_tag.insert(req.tag, req);
                }
                Some(existing) => {
                    if req.global {
                        *existing = req;
                    } else if existing.global {
                        existing.global = false;
                        existing.value = existing.value.max(req.value);
                        existing.seq = req.seq;
                        existing.flags = req.flags;
                    } else {
                        existing.value = existing.value.max(req.value);
                        existing.seq = req.seq;
                    }
                }
            }
        }

        order.into_iter().filter_map(|t| by_tag.remove(&t)).collect()
    }

    fn sort_and_merge_lookups(lookups: &mut Vec<LookupMap>) {
        lookups.sort_by_key(|l| l.index);
        let mut merged: Vec<LookupMap> = Vec::with_capacity(lookups.len());
        for l in lookups.drain(..) {
            if let Some(last) = merged.last_mut() {
                if last.index == l.index {
                    last.mask |= l.mask;
                    last.auto_zwnj &= l.auto_zwnj;
                    last.auto_zwj &= l.auto_zwj;
                    last.random |= l.random;
                    continue;
                }
            }
            merged.push(l);
        }
        *lookups = merged;
    }

    fn resolve_stage_boundaries(pauses: &[(usize, u8)], total_lookups: usize) -> Vec<StageBoundary> {
        // `pauses` were recorded against feature-request counts, which can
        // only ever be <= the number of resolved lookups; clamp into range
        // so a pause requested after the last feature still fires once, at
        // the end of the table.
        pauses
            .iter()
            .map(|&(n, pause)| StageBoundary { lookup_count: n.min(total_lookups), pause })
            .collect()
    }

    pub fn get_mask(&self, tag: Tag) -> (Mask, u32) {
        self.masks.get(&tag).copied().unwrap_or((0, 0))
    }

    /// Returns the single-bit test mask for a boolean feature, or 0 if it
    /// wasn't enabled (or didn't survive mask allocation).
    pub fn get_1_mask(&self, tag: Tag) -> Mask {
        self.get_mask(tag).0
    }

    pub fn found_script(&self, gpos: bool) -> bool {
        self.found_script[gpos as usize]
    }

    pub fn gsub_lookups(&self) -> &[LookupMap] {
        &self.gsub_lookups
    }

    pub fn gpos_lookups(&self) -> &[LookupMap] {
        &self.gpos_lookups
    }

    pub fn gsub_stages(&self) -> &[StageBoundary] {
        &self.gsub_stages
    }

    pub fn gpos_stages(&self) -> &[StageBoundary] {
        &self.gpos_stages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_global_overrides_earlier_per_range() {
        let mut map = Map::new();
        map.add_feature(Tag::from_bytes(b"liga"), FeatureFlags::empty(), 0);
        map.enable_feature(Tag::from_bytes(b"liga"), FeatureFlags::empty(), 1);
        let merged = map.merge_requests();
        assert_eq!(merged.len(), 1);
        assert!(merged[0].global);
        assert_eq!(merged[0].value, 1);
    }

    #[test]
    fn later_per_range_demotes_global_and_keeps_max_value() {
        let mut map = Map::new();
        map.enable_feature(Tag::from_bytes(b"liga"), FeatureFlags::empty(), 1);
        map.add_feature(Tag::from_bytes(b"liga"), FeatureFlags::empty(), 3);
        let merged = map.merge_requests();
        assert_eq!(merged.len(), 1);
        assert!(!merged[0].global);
        assert_eq!(merged[0].value, 3);
    }

    #[test]
    fn mask_bits_never_collide_with_global_bit() {
        let mut map = Map::new();
        for i in 0..5 {
            map.enable_feature(Tag(i), FeatureFlags::empty(), 1);
        }
        map.compile(TableKind::Gsub, None, None, None, &[], None, Tag::from_bytes(b"DFLT"), None);
        for i in 0..5u32 {
            let mask = map.get_1_mask(Tag(i));
            assert_eq!(mask & GLOBAL_BIT_MASK, 0);
        }
    }
}
