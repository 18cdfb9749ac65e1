//! The buffer & glyph-info model (C1) — a two-phase in/out array pair with
//! cluster bookkeeping and ligature-id allocation, implementing the
//! "HarfBuzz two-buffer protocol" described in §3.

use crate::common::{Direction, Language, Script, Tag};
use crate::unicode::CharExt;
use crate::{GlyphId, Mask};

bitflags! {
    /// Per-glyph flags (§3 `glyph_props`, extended with the scratch bits the
    /// buffer itself needs — `Preserve` names the subset that survives a
    /// substitution, per invariant 4).
    pub struct GlyphFlags: u16 {
        const SUBSTITUTED        = 0x0001;
        const LIGATED            = 0x0002;
        const MULTIPLIED         = 0x0004;
        const DEFAULT_IGNORABLE  = 0x0008;
        const ZWNJ               = 0x0010;
        const ZWJ                = 0x0020;
        const HIDDEN             = 0x0040;
        const UNSAFE_TO_BREAK    = 0x0080;

        const PRESERVE = Self::DEFAULT_IGNORABLE.bits | Self::ZWNJ.bits
            | Self::ZWJ.bits | Self::HIDDEN.bits | Self::UNSAFE_TO_BREAK.bits;
    }
}

/// GDEF glyph classes (§"Glossary": Base/Mark/Ligature = GDEF classes 1/3/2).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlyphClass {
    Unclassified = 0,
    Base = 1,
    Ligature = 2,
    Mark = 3,
    Component = 4,
}

impl Default for GlyphClass {
    fn default() -> Self {
        GlyphClass::Unclassified
    }
}

impl GlyphClass {
    pub fn from_raw(v: u8) -> Self {
        match v {
            1 => GlyphClass::Base,
            2 => GlyphClass::Ligature,
            3 => GlyphClass::Mark,
            4 => GlyphClass::Component,
            _ => GlyphClass::Unclassified,
        }
    }
}

/// `lig_props`: `(lig_id:3 | is_lig_base:1 | lig_comp:4)` — identifies
/// ligature membership so marks attach to the right component (invariant 3).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LigatureProps(pub u8);

impl LigatureProps {
    const IS_BASE_BIT: u8 = 0x10;

    pub fn lig_id(self) -> u8 {
        (self.0 >> 5) & 0x7
    }

    pub fn is_ligature_base(self) -> bool {
        self.0 & Self::IS_BASE_BIT != 0
    }

    pub fn lig_comp(self) -> u8 {
        self.0 & 0xF
    }

    pub fn new(lig_id: u8, is_base: bool, lig_comp: u8) -> Self {
        let mut v = (lig_id & 0x7) << 5;
        if is_base {
            v |= Self::IS_BASE_BIT;
        }
        v |= lig_comp & 0xF;
        LigatureProps(v)
    }
}

/// `syllable`: `(serial:4 | type:4)`, for complex-script syllable bookkeeping
/// (§4.9).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyllableInfo(pub u8);

impl SyllableInfo {
    pub fn serial(self) -> u8 {
        self.0 >> 4
    }

    pub fn kind(self) -> u8 {
        self.0 & 0xF
    }

    pub fn new(serial: u8, kind: u8) -> Self {
        SyllableInfo(((serial & 0xF) << 4) | (kind & 0xF))
    }
}

/// One glyph record, carried through the whole pipeline (§3 `GlyphInfo`).
#[derive(Clone, Copy, Debug, Default)]
pub struct GlyphInfo {
    pub codepoint: u32,
    pub glyph_id: GlyphId,
    pub cluster: u32,
    pub mask: Mask,
    pub glyph_props: GlyphFlags,
    pub glyph_class: GlyphClass,
    pub lig_props: LigatureProps,
    pub syllable: SyllableInfo,
    pub modified_ccc: u8,
    pub mark_attachment_class: u8,

    // Complex-shaper scratch slots (§3) — one small enum per shaper family,
    // all sharing the record rather than needing per-shaper side tables.
    pub indic_category: u8,
    pub indic_position: u8,
    pub myanmar_category: u8,
    pub myanmar_position: u8,
    pub use_category: u8,
    pub hangul_feature: u8,
    pub arabic_shaping_action: u8,
}

impl GlyphInfo {
    pub fn as_char(&self) -> char {
        char::from_u32(self.codepoint).unwrap_or('\u{FFFD}')
    }

    pub fn general_category(&self) -> unicode_general_category::GeneralCategory {
        self.as_char().general_category()
    }

    pub fn modified_combining_class(&self) -> u8 {
        self.modified_ccc
    }

    pub fn set_modified_combining_class(&mut self, ccc: u8) {
        self.modified_ccc = ccc;
    }

    pub fn is_default_ignorable(&self) -> bool {
        self.glyph_props.contains(GlyphFlags::DEFAULT_IGNORABLE)
            && !self.glyph_props.contains(GlyphFlags::HIDDEN)
    }

    pub fn is_zwnj(&self) -> bool {
        self.glyph_props.contains(GlyphFlags::ZWNJ)
    }

    pub fn is_zwj(&self) -> bool {
        self.glyph_props.contains(GlyphFlags::ZWJ)
    }

    pub fn is_hidden(&self) -> bool {
        self.glyph_props.contains(GlyphFlags::HIDDEN)
    }

    pub fn is_substituted(&self) -> bool {
        self.glyph_props.contains(GlyphFlags::SUBSTITUTED)
    }

    pub fn is_ligated(&self) -> bool {
        self.glyph_props.contains(GlyphFlags::LIGATED)
    }

    pub fn is_multiplied(&self) -> bool {
        self.glyph_props.contains(GlyphFlags::MULTIPLIED)
    }

    pub fn is_ligated_and_didnt_multiply(&self) -> bool {
        self.is_ligated() && !self.is_multiplied()
    }

    pub fn lig_id(&self) -> u8 {
        self.lig_props.lig_id()
    }

    pub fn lig_comp(&self) -> u8 {
        if self.is_ligated() {
            if self.lig_props.is_ligature_base() {
                0
            } else {
                self.lig_props.lig_comp()
            }
        } else {
            0
        }
    }

    pub fn lig_num_comps(&self) -> u8 {
        if (self.glyph_class == GlyphClass::Ligature || self.is_ligated())
            && self.lig_props.is_ligature_base()
        {
            self.lig_props.lig_comp()
        } else {
            1
        }
    }

    /// Returns whether `other`, immediately following `self` in the output,
    /// is still part of the same multiple-substitution sequence (§4.5 type 4
    /// MarkBase `accept()` rule): consecutive ids with no gap and no mark in
    /// between.
    pub fn is_multiply_sequence_continuation(&self, other: &GlyphInfo) -> bool {
        self.is_multiplied()
            && other.is_multiplied()
            && self.lig_id() == other.lig_id()
            && self.lig_comp() + 1 == other.lig_comp()
    }
}

/// One positioning record, parallel to `GlyphInfo` (§3 `GlyphPos`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GlyphPosition {
    pub x_advance: i32,
    pub y_advance: i32,
    pub x_offset: i32,
    pub y_offset: i32,
    pub attach_chain: i16,
    pub attach_type: AttachType,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachType {
    None,
    Mark,
    Cursive,
}

impl Default for AttachType {
    fn default() -> Self {
        AttachType::None
    }
}

bitflags! {
    /// Buffer-level configuration flags (§6 Configuration).
    pub struct BufferFlags: u32 {
        const BEGINNING_OF_TEXT           = 0x0001;
        const END_OF_TEXT                 = 0x0002;
        const PRESERVE_DEFAULT_IGNORABLES = 0x0004;
        const REMOVE_DEFAULT_IGNORABLES   = 0x0008;
        const DO_NOT_INSERT_DOTTED_CIRCLE = 0x0010;
    }
}

bitflags! {
    /// Internal per-run scratch flags — `COMPLEX0` et al. are free bits a
    /// complex shaper may use for its own bookkeeping (§4.8's Arabic stch
    /// flag is `COMPLEX0`).
    pub struct BufferScratchFlags: u32 {
        const HAS_NON_ASCII       = 0x0000_0001;
        const HAS_DEFAULT_IGNORABLES = 0x0000_0002;
        const HAS_SPACE_FALLBACK  = 0x0000_0004;
        const HAS_GPOS_ATTACHMENT = 0x0000_0008;
        const HAS_UNSAFE_TO_BREAK = 0x0000_0010;
        const COMPLEX0            = 0x0100_0000;
        const COMPLEX1            = 0x0200_0000;
        const COMPLEX2            = 0x0400_0000;
    }
}

/// Cluster-merge granularity (§6 `ClusterLevel`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferClusterLevel {
    MonotoneGraphemes,
    MonotoneCharacters,
    Characters,
    Graphemes,
}

impl Default for BufferClusterLevel {
    fn default() -> Self {
        BufferClusterLevel::MonotoneGraphemes
    }
}

impl BufferClusterLevel {
    fn is_non_monotone(self) -> bool {
        matches!(self, BufferClusterLevel::Characters | BufferClusterLevel::Graphemes)
    }

    fn is_graphemes(self) -> bool {
        matches!(self, BufferClusterLevel::MonotoneGraphemes | BufferClusterLevel::Graphemes)
    }
}

/// `minstd_rand`: `state * 48271 mod (2^31 - 1)`, used only by the GSUB
/// `rand` feature (§4.4 type 3 Alternate, §9 Design Notes).
#[derive(Clone, Copy, Debug)]
pub struct MinStdRand(u32);

impl MinStdRand {
    pub fn new() -> Self {
        MinStdRand(1)
    }

    pub fn next(&mut self) -> u32 {
        self.0 = ((self.0 as u64 * 48271) % 0x7FFF_FFFF) as u32;
        self.0
    }
}

impl Default for MinStdRand {
    fn default() -> Self {
        MinStdRand::new()
    }
}

/// The shaping buffer (§3 `Buffer`): an owned pair of vectors with a cursor,
/// plus an output staging vector implementing the two-buffer protocol.
#[derive(Default)]
pub struct Buffer {
    info: Vec<GlyphInfo>,
    pos: Vec<GlyphPosition>,
    pub(crate) idx: usize,

    out_info: Vec<GlyphInfo>,
    out_pos: Vec<GlyphPosition>,
    have_output: bool,

    pub direction: Direction,
    pub script: Option<Script>,
    pub language: Option<Language>,
    pub flags: BufferFlags,
    pub cluster_level: BufferClusterLevel,
    scratch_flags: BufferScratchFlags,

    pub pre_context: Vec<char>,
    pub post_context: Vec<char>,

    pub random_state: MinStdRand,
    pub not_found_vs_glyph: i32,

    pub max_ops: i32,
    next_lig_id: u8,
}

impl Buffer {
    pub fn new() -> Self {
        Buffer {
            not_found_vs_glyph: -1,
            max_ops: 0,
            ..Default::default()
        }
    }

    pub fn reset(&mut self) {
        let keep_info = std::mem::take(&mut self.info);
        let keep_pos = std::mem::take(&mut self.pos);
        *self = Buffer::new();
        // Reuse allocations (Lifecycles: "clears all fields except reusable
        // allocations").
        self.info = { let mut v = keep_info; v.clear(); v };
        self.pos = { let mut v = keep_pos; v.clear(); v };
    }

    pub fn len(&self) -> usize {
        self.info.len()
    }

    pub fn is_empty(&self) -> bool {
        self.info.is_empty()
    }

    pub fn info(&self) -> &[GlyphInfo] {
        &self.info
    }

    pub fn info_mut(&mut self) -> &mut [GlyphInfo] {
        &mut self.info
    }

    pub fn pos(&self) -> &[GlyphPosition] {
        &self.pos
    }

    pub fn pos_mut(&mut self) -> &mut [GlyphPosition] {
        &mut self.pos
    }

    pub fn idx(&self) -> usize {
        self.idx
    }

    /// Allocates the next ligature id (§3 `lig_props`' 3-bit `lig_id` field,
    /// wrapping through 1..=7 and skipping 0, which marks "not a ligature
    /// component").
    pub fn allocate_lig_id(&mut self) -> u8 {
        self.next_lig_id = if self.next_lig_id >= 7 { 1 } else { self.next_lig_id + 1 };
        self.next_lig_id
    }

    pub fn scratch_flags(&self) -> BufferScratchFlags {
        self.scratch_flags
    }

    pub fn set_scratch_flags(&mut self, flags: BufferScratchFlags) {
        self.scratch_flags = flags;
    }

    pub fn have_output(&self) -> bool {
        self.have_output
    }

    pub fn out_len(&self) -> usize {
        self.out_info.len()
    }

    /// Backtrack read helper (invariant 7): dispatches to `out_info` while
    /// output is staged, otherwise to the live `info` prefix.
    pub fn out_info(&self) -> &[GlyphInfo] {
        if self.have_output {
            &self.out_info
        } else {
            &self.info[..self.idx]
        }
    }

    /// Mutable access to the staged output, for passes (e.g. recompose) that
    /// revise an already-emitted entry in place rather than appending.
    pub fn out_info_mut(&mut self) -> &mut [GlyphInfo] {
        &mut self.out_info
    }

    /// §4.1 `add_codepoint`.
    pub fn add_codepoint(&mut self, cp: char, cluster: u32) {
        let mut props = GlyphFlags::empty();
        if cp.is_default_ignorable() {
            props |= GlyphFlags::DEFAULT_IGNORABLE;
        }
        if cp == '\u{200C}' {
            props |= GlyphFlags::ZWNJ;
        }
        if cp == '\u{200D}' {
            props |= GlyphFlags::ZWJ;
        }

        self.info.push(GlyphInfo {
            codepoint: u32::from(cp),
            cluster,
            mask: crate::ot::map::GLOBAL_BIT_MASK,
            glyph_props: props,
            modified_ccc: cp.modified_combining_class(),
            ..Default::default()
        });
        self.pos.push(GlyphPosition::default());
    }

    pub fn push_str(&mut self, text: &str) {
        for (i, c) in text.char_indices() {
            self.add_codepoint(c, i as u32);
        }
    }

    pub fn reverse(&mut self) {
        let len = self.len();
        self.reverse_range(0, len);
    }

    pub fn reverse_range(&mut self, start: usize, end: usize) {
        self.info[start..end].reverse();
        self.pos[start..end].reverse();
    }

    /// §4.1 `merge_clusters`: resolves the Open Question from §9 by treating
    /// non-monotone cluster levels as a true no-op.
    pub fn merge_clusters(&mut self, start: usize, end: usize) {
        if end - start < 2 {
            return;
        }

        if self.cluster_level.is_non_monotone() {
            return;
        }

        let mut start = start;
        let mut end = end;

        let mut cluster = self.info[start].cluster;
        for i in start + 1..end {
            cluster = cluster.min(self.info[i].cluster);
        }

        while start != 0 && self.info[start - 1].cluster == self.info[start].cluster {
            start -= 1;
        }
        while end < self.len() && self.info[end - 1].cluster == self.info[end].cluster {
            end += 1;
        }

        for i in start..end {
            self.info[i].cluster = cluster;
        }
    }

    /// Grapheme-aware cluster merge used by the mark-reorder / syllable
    /// machinery when `cluster_level` requests grapheme grouping.
    pub fn merge_out_clusters(&mut self, start: usize, end: usize) {
        if self.have_output {
            if end - start < 2 {
                return;
            }

            let mut cluster = self.out_info[start].cluster;
            for i in start + 1..end.min(self.out_info.len()) {
                cluster = cluster.min(self.out_info[i].cluster);
            }
            for i in start..end.min(self.out_info.len()) {
                self.out_info[i].cluster = cluster;
            }
        } else {
            self.merge_clusters(start, end);
        }
    }

    /// §4.1 cluster formation, called once before shaper dispatch.
    pub fn form_clusters(&mut self) {
        if self.len() < 2 {
            return;
        }

        if self.cluster_level.is_graphemes() {
            let mut i = 0;
            while i < self.len() - 1 {
                let continues = self.is_grapheme_continuation(i + 1);
                if continues {
                    let end = self.grapheme_run_end(i);
                    self.merge_clusters(i, end);
                    i = end;
                } else {
                    i += 1;
                }
            }
        }
    }

    fn is_grapheme_continuation(&self, i: usize) -> bool {
        use unicode_general_category::GeneralCategory as GC;
        let c = self.info[i].as_char();
        match c.general_category() {
            GC::NonspacingMark | GC::SpacingMark | GC::EnclosingMark => true,
            _ => {
                if i > 0 && self.info[i - 1].is_zwj() && c.is_emoji_extended_pictographic() {
                    true
                } else {
                    i > 0 && self.is_regional_indicator(i - 1) && self.is_regional_indicator(i)
                }
            }
        }
    }

    fn is_regional_indicator(&self, i: usize) -> bool {
        (0x1F1E6..=0x1F1FF).contains(&self.info[i].codepoint)
    }

    fn grapheme_run_end(&self, start: usize) -> usize {
        let mut end = start + 1;
        while end < self.len() && self.is_grapheme_continuation(end) {
            end += 1;
        }
        end
    }

    pub fn context_len(&self, side: usize) -> usize {
        if side == 0 {
            self.pre_context.len()
        } else {
            self.post_context.len()
        }
    }

    pub fn context(&self, side: usize, i: usize) -> char {
        if side == 0 {
            self.pre_context[i]
        } else {
            self.post_context[i]
        }
    }

    /// Marks `[start, end)` as not safe to split, e.g. across a ligature or
    /// Arabic joining boundary (used by justification/line-breaking
    /// collaborators, harmless no-op for this crate's own pipeline beyond
    /// bookkeeping).
    pub fn unsafe_to_break(&mut self, start: usize, end: usize) {
        if end <= start + 1 {
            return;
        }
        for i in start..end.min(self.len()) {
            self.info[i].glyph_props |= GlyphFlags::UNSAFE_TO_BREAK;
        }
        self.scratch_flags |= BufferScratchFlags::HAS_UNSAFE_TO_BREAK;
    }

    pub fn ensure(&mut self, size: usize) {
        if size > self.info.len() {
            self.info.resize(size, GlyphInfo::default());
            self.pos.resize(size, GlyphPosition::default());
        }
    }

    pub fn set_len(&mut self, size: usize) {
        self.info.truncate(size);
        self.pos.truncate(size);
        self.have_output = false;
        self.out_info.clear();
        self.out_pos.clear();
    }

    // --- GSUB two-buffer protocol (§3 Lifecycles, §4.4 apply protocol) ---

    pub fn clear_output(&mut self) {
        self.have_output = true;
        self.out_info.clear();
        self.out_pos.clear();
        self.idx = 0;
    }

    pub fn clear_positions(&mut self) {
        for p in &mut self.pos {
            *p = GlyphPosition::default();
        }
    }

    pub fn next_glyph(&mut self) {
        if self.have_output {
            self.out_info.push(self.info[self.idx]);
            self.out_pos.push(self.pos[self.idx]);
        }
        self.idx += 1;
    }

    pub fn skip_glyph(&mut self) {
        self.idx += 1;
    }

    /// §4.1 `output_glyph`: replace 0 inputs with 1 output inheriting the
    /// current glyph's properties, without advancing `idx`.
    pub fn output_glyph(&mut self, glyph_id: GlyphId) -> GlyphInfo {
        let mut info = self.cur(0);
        info.glyph_id = glyph_id;
        self.out_info.push(info);
        self.out_pos.push(GlyphPosition::default());
        info
    }

    pub fn output_info(&mut self, info: GlyphInfo) {
        self.out_info.push(info);
        self.out_pos.push(GlyphPosition::default());
    }

    pub fn replace_glyph(&mut self, glyph_id: GlyphId) {
        self.output_glyph(glyph_id);
        self.idx += 1;
    }

    /// §4.1 `replace_glyphs`: consumes `n_in` inputs, emits `n_out` outputs
    /// each inheriting from `info[idx]`.
    pub fn replace_glyphs(&mut self, n_in: usize, glyph_ids: &[GlyphId]) {
        self.merge_clusters(self.idx, self.idx + n_in);
        let base = self.cur(0);
        for (i, &gid) in glyph_ids.iter().enumerate() {
            let mut info = base;
            info.glyph_id = gid;
            if i != 0 {
                info.glyph_props |= GlyphFlags::MULTIPLIED;
                info.lig_props = LigatureProps::new(0, false, i as u8);
            }
            self.out_info.push(info);
            self.out_pos.push(GlyphPosition::default());
        }
        self.idx += n_in;
    }

    pub fn cur(&self, offset: isize) -> GlyphInfo {
        let i = (self.idx as isize + offset) as usize;
        self.info[i]
    }

    pub fn cur_mut(&mut self, offset: isize) -> &mut GlyphInfo {
        let i = (self.idx as isize + offset) as usize;
        &mut self.info[i]
    }

    /// §4.1 `move_to` (output-index): rewinds so a nested lookup can back up.
    pub fn move_to(&mut self, i: usize) {
        if !self.have_output {
            self.idx = i;
            return;
        }

        if i <= self.out_info.len() {
            // Shift the tail of `info` forward and pull entries back from
            // `out_info` until `out_info.len() == i`.
            while self.out_info.len() > i {
                let info = self.out_info.pop().unwrap();
                let pos = self.out_pos.pop().unwrap();
                self.idx -= 1;
                self.info[self.idx] = info;
                self.pos[self.idx] = pos;
            }
        } else {
            while self.out_info.len() < i {
                self.next_glyph();
            }
        }
    }

    /// §4.1 `sync`: replaces `info`/`pos` with the staged output.
    pub fn sync(&mut self) {
        if self.have_output {
            if self.idx < self.info.len() {
                self.out_info.extend_from_slice(&self.info[self.idx..]);
                self.out_pos.extend_from_slice(&self.pos[self.idx..]);
            }
            std::mem::swap(&mut self.info, &mut self.out_info);
            std::mem::swap(&mut self.pos, &mut self.out_pos);
        }

        self.out_info.clear();
        self.out_pos.clear();
        self.have_output = false;
        self.idx = 0;
    }

    /// §4.1 `delete_glyphs_inplace`: removes matching glyphs while preserving
    /// clusters by merging the deleted glyph's cluster forward or backward.
    pub fn delete_glyphs_inplace<F: Fn(&GlyphInfo) -> bool>(&mut self, filter: F) {
        let len = self.info.len();
        let mut j = 0;
        for i in 0..len {
            if filter(&self.info[i]) {
                // Merge into neighbor cluster: prefer the preceding glyph if
                // it shares this cluster, else the following one.
                if j > 0 && self.info[j - 1].cluster == self.info[i].cluster {
                    continue;
                }
                if i + 1 < len {
                    self.info[i + 1].cluster = self.info[i + 1].cluster.min(self.info[i].cluster);
                }
                continue;
            }

            if i != j {
                self.info[j] = self.info[i];
                self.pos[j] = self.pos[i];
            }
            j += 1;
        }

        self.info.truncate(j);
        self.pos.truncate(j);
    }

    pub fn normalize_glyphs(&mut self) {
        if self.direction.is_backward() {
            self.reverse();
        }
    }

    pub fn guess_segment_properties(&mut self) {
        if self.script.is_none() {
            let text: Vec<char> = self.info.iter().map(|i| i.as_char()).collect();
            self.script = Some(crate::unicode::guess_script(&text));
        }

        if self.direction == Direction::Invalid {
            self.direction = self
                .script
                .map(|s| s.horizontal_direction())
                .filter(|d| *d != Direction::Invalid)
                .unwrap_or(Direction::LeftToRight);
        }
    }
}

/// Serialization format flags for the `demos/shape.rs` harness' textual
/// glyph-buffer dump (ambient CLI stack, §1's "command-line harness" is an
/// external collaborator; this only controls the demo's own formatting).
bitflags! {
    pub struct SerializeFlags: u8 {
        const NO_CLUSTERS  = 0x0001;
        const NO_POSITIONS = 0x0002;
        const NO_GLYPH_NAMES = 0x0004;
        const GLYPH_EXTENTS = 0x0008;
    }
}

/// Pre-shape API state — matches rustybuzz's actual public split between a
/// buffer you fill with text and a buffer you read glyphs back out of, so a
/// caller cannot accidentally read positions before `shape()` runs.
pub struct UnicodeBuffer(pub(crate) Buffer);

impl UnicodeBuffer {
    pub fn new() -> Self {
        UnicodeBuffer(Buffer::new())
    }

    pub fn push_str(&mut self, text: &str) -> &mut Self {
        self.0.push_str(text);
        self
    }

    pub fn set_direction(&mut self, direction: Direction) -> &mut Self {
        self.0.direction = direction;
        self
    }

    pub fn set_script(&mut self, script: Script) -> &mut Self {
        self.0.script = Some(script);
        self
    }

    pub fn set_language(&mut self, language: Language) -> &mut Self {
        self.0.language = Some(language);
        self
    }

    pub fn set_cluster_level(&mut self, level: BufferClusterLevel) -> &mut Self {
        self.0.cluster_level = level;
        self
    }

    pub fn set_flags(&mut self, flags: BufferFlags) -> &mut Self {
        self.0.flags = flags;
        self
    }

    pub fn set_not_found_variation_selector_glyph(&mut self, glyph: i32) -> &mut Self {
        self.0.not_found_vs_glyph = glyph;
        self
    }

    pub fn clear(mut self) -> Self {
        self.0.reset();
        self
    }
}

impl Default for UnicodeBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Post-shape API state: read-only view over glyph ids, clusters and
/// positions (§6 Produced interface).
pub struct GlyphBuffer(pub(crate) Buffer);

impl GlyphBuffer {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn glyph_infos(&self) -> &[GlyphInfo] {
        self.0.info()
    }

    pub fn glyph_positions(&self) -> &[GlyphPosition] {
        self.0.pos()
    }

    pub fn direction(&self) -> Direction {
        self.0.direction
    }

    /// Releases the underlying allocations back into a fresh `UnicodeBuffer`
    /// for reuse, matching rustybuzz's `clear()` round-trip.
    pub fn clear(mut self) -> UnicodeBuffer {
        self.0.reset();
        UnicodeBuffer(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clusters(buf: &Buffer) -> Vec<u32> {
        buf.info().iter().map(|g| g.cluster).collect()
    }

    #[test]
    fn merge_clusters_takes_the_minimum_cluster_in_range() {
        let mut buffer = Buffer::new();
        buffer.push_str("abcd");
        assert_eq!(clusters(&buffer), vec![0, 1, 2, 3]);

        buffer.merge_clusters(1, 3);
        assert_eq!(clusters(&buffer), vec![0, 1, 1, 3]);
    }

    #[test]
    fn merge_clusters_expands_to_neighbors_sharing_the_old_cluster() {
        let mut buffer = Buffer::new();
        buffer.push_str("abcd");
        // Simulate two codepoints that already share a cluster (e.g. a
        // base + combining mark) before a ligature merges the next glyph in.
        buffer.info_mut()[1].cluster = 0;

        buffer.merge_clusters(1, 3);
        // The merge absorbs index 0 too, since it already matched index 1's
        // old cluster value.
        assert_eq!(clusters(&buffer), vec![0, 0, 0, 3]);
    }

    #[test]
    fn merge_clusters_is_a_no_op_below_two_glyphs() {
        let mut buffer = Buffer::new();
        buffer.push_str("ab");
        buffer.merge_clusters(0, 1);
        assert_eq!(clusters(&buffer), vec![0, 1]);
    }

    #[test]
    fn two_buffer_protocol_round_trips_unmodified_glyphs() {
        let mut buffer = Buffer::new();
        buffer.push_str("ab");

        buffer.clear_output();
        buffer.next_glyph();
        buffer.next_glyph();
        buffer.sync();

        assert_eq!(buffer.len(), 2);
        assert_eq!(clusters(&buffer), vec![0, 1]);
    }

    #[test]
    fn replace_glyph_substitutes_in_place_without_changing_length() {
        let mut buffer = Buffer::new();
        buffer.push_str("ab");

        buffer.clear_output();
        buffer.replace_glyph(7);
        buffer.next_glyph();
        buffer.sync();

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.info()[0].glyph_id, 7);
        assert_eq!(clusters(&buffer), vec![0, 1]);
    }

    #[test]
    fn replace_glyphs_expands_one_input_into_many_outputs() {
        let mut buffer = Buffer::new();
        buffer.push_str("ab");

        buffer.clear_output();
        buffer.replace_glyphs(1, &[10, 11]);
        buffer.next_glyph();
        buffer.sync();

        assert_eq!(buffer.len(), 3);
        let info = buffer.info();
        assert_eq!(info[0].glyph_id, 10);
        assert_eq!(info[1].glyph_id, 11);
        assert!(!info[0].is_multiplied());
        assert!(info[1].is_multiplied());
        // Both halves of the split inherit the consumed glyph's cluster.
        assert_eq!(info[0].cluster, 0);
        assert_eq!(info[1].cluster, 0);
        assert_eq!(info[2].cluster, 1);
    }

    #[test]
    fn reverse_flips_info_and_positions_together() {
        let mut buffer = Buffer::new();
        buffer.push_str("abc");
        buffer.reverse();
        assert_eq!(clusters(&buffer), vec![2, 1, 0]);
    }
}
