//! Unicode property access (C7's decompose/recompose groundwork, §4.7–§4.9).
//!
//! This module is the boundary named in §1's out-of-scope list: general
//! Unicode property tables (general category, combining class, script,
//! mirroring, default-ignorable, decomposition/composition) are sourced from
//! the same external crates our teacher depends on, never hand-rolled here.

pub use unicode_general_category::GeneralCategory;

use crate::common::script;
use crate::Script;

/// Rough glyph-width classes for the space-fallback path (§4.9/§4.10 post-pass).
///
/// Space estimates based on:
/// <https://unicode.org/charts/PDF/U2000.pdf>
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Space {
    SpaceEm = 1,
    SpaceEm2 = 2,
    SpaceEm3 = 3,
    SpaceEm4 = 4,
    SpaceEm5 = 5,
    SpaceEm6 = 6,
    SpaceEm16 = 16,
    Space4Em18,
    Space,
    SpaceFigure,
    SpacePunctuation,
    SpaceNarrow,
}

/// Canonical-combining-class remapping used by the normalizer's mark-reorder
/// pass (§4.7) and by script-specific `reorder_marks` callbacks (§4.8, Hebrew).
#[allow(dead_code)]
pub mod modified_combining_class {
    // Hebrew: permute the fixed-position classes 10-26 into SBL Hebrew order.
    pub const CCC10: u8 = 22; // sheva
    pub const CCC11: u8 = 15; // hataf segol
    pub const CCC12: u8 = 16; // hataf patah
    pub const CCC13: u8 = 17; // hataf qamats
    pub const CCC14: u8 = 23; // hiriq
    pub const CCC15: u8 = 18; // tsere
    pub const CCC16: u8 = 19; // segol
    pub const CCC17: u8 = 20; // patah
    pub const CCC18: u8 = 21; // qamats
    pub const CCC19: u8 = 14; // holam
    pub const CCC20: u8 = 24; // qubuts
    pub const CCC21: u8 = 12; // dagesh
    pub const CCC22: u8 = 25; // meteg
    pub const CCC23: u8 = 13; // rafe
    pub const CCC24: u8 = 10; // shin dot
    pub const CCC25: u8 = 11; // sin dot
    pub const CCC26: u8 = 26; // point varika

    // Arabic: move Shadda (ccc=33) before other marks.
    pub const CCC27: u8 = 28; // fathatan
    pub const CCC28: u8 = 29; // dammatan
    pub const CCC29: u8 = 30; // kasratan
    pub const CCC30: u8 = 31; // fatha
    pub const CCC31: u8 = 32; // damma
    pub const CCC32: u8 = 33; // kasra
    pub const CCC33: u8 = 27; // shadda
    pub const CCC34: u8 = 34; // sukun
    pub const CCC35: u8 = 35; // superscript alef

    pub const CCC36: u8 = 36; // Syriac superscript alaph

    // Telugu length marks are the only non-zero-ccc matras in the main Indic
    // range; zero them so they don't reorder against Halant (ccc=9).
    pub const CCC84: u8 = 0;
    pub const CCC91: u8 = 0;

    // Thai: reorder sara u/uu before Thanthakhat.
    pub const CCC103: u8 = 3;
    pub const CCC107: u8 = 107;

    pub const CCC118: u8 = 118;
    pub const CCC122: u8 = 122;

    // Tibetan: prefer vowel-sign-u before vowel-sign-i in multi-vowel runs.
    pub const CCC129: u8 = 129;
    pub const CCC130: u8 = 132;
    pub const CCC132: u8 = 131;
}

#[rustfmt::skip]
const MODIFIED_COMBINING_CLASS: [u8; 256] = build_table();

const fn build_table() -> [u8; 256] {
    use modified_combining_class::*;
    let mut t = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        t[i] = i as u8;
        i += 1;
    }
    t[10] = CCC10; t[11] = CCC11; t[12] = CCC12; t[13] = CCC13; t[14] = CCC14;
    t[15] = CCC15; t[16] = CCC16; t[17] = CCC17; t[18] = CCC18; t[19] = CCC19;
    t[20] = CCC20; t[21] = CCC21; t[22] = CCC22; t[23] = CCC23; t[24] = CCC24;
    t[25] = CCC25; t[26] = CCC26;
    t[27] = CCC27; t[28] = CCC28; t[29] = CCC29; t[30] = CCC30; t[31] = CCC31;
    t[32] = CCC32; t[33] = CCC33; t[34] = CCC34; t[35] = CCC35; t[36] = CCC36;
    t[84] = CCC84; t[91] = CCC91;
    t[103] = CCC103; t[107] = CCC107;
    t[118] = CCC118; t[122] = CCC122;
    t[129] = CCC129; t[130] = CCC130; t[132] = CCC132;
    t[255] = 255;
    t
}

/// Extension trait providing the Unicode property accessors shaping needs,
/// delegating to the crates our teacher already depends on.
pub trait CharExt {
    fn general_category(self) -> GeneralCategory;
    fn combining_class(self) -> u8;
    fn space_fallback(self) -> Option<Space>;
    fn modified_combining_class(self) -> u8;
    fn mirrored(self) -> Option<char>;
    fn is_emoji_extended_pictographic(self) -> bool;
    fn is_default_ignorable(self) -> bool;
    fn is_variation_selector(self) -> bool;
    fn script(self) -> Script;
}

impl CharExt for char {
    fn general_category(self) -> GeneralCategory {
        unicode_general_category::get_general_category(self)
    }

    fn combining_class(self) -> u8 {
        unicode_ccc::get_canonical_combining_class(self) as u8
    }

    fn space_fallback(self) -> Option<Space> {
        match self {
            '\u{0020}' => Some(Space::Space),
            '\u{00A0}' => Some(Space::Space),
            '\u{2000}' => Some(Space::SpaceEm2),
            '\u{2001}' => Some(Space::SpaceEm),
            '\u{2002}' => Some(Space::SpaceEm2),
            '\u{2003}' => Some(Space::SpaceEm),
            '\u{2004}' => Some(Space::SpaceEm3),
            '\u{2005}' => Some(Space::SpaceEm4),
            '\u{2006}' => Some(Space::SpaceEm6),
            '\u{2007}' => Some(Space::SpaceFigure),
            '\u{2008}' => Some(Space::SpacePunctuation),
            '\u{2009}' => Some(Space::SpaceEm5),
            '\u{200A}' => Some(Space::SpaceEm16),
            '\u{202F}' => Some(Space::SpaceNarrow),
            '\u{205F}' => Some(Space::Space4Em18),
            '\u{3000}' => Some(Space::SpaceEm),
            _ => None,
        }
    }

    fn modified_combining_class(self) -> u8 {
        let mut u = self;

        // Belongs to the Myanmar shaper: ASAT and VIRAMA share reorder rules.
        if u == '\u{1037}' {
            u = '\u{103A}';
        }

        // Belongs to the USE shaper (Tai Tham): SAKOT sorts after tone marks.
        if u == '\u{1A60}' {
            return 254;
        }

        // Belongs to the Tibetan shaper: PADMA sorts after vowel marks.
        if u == '\u{0FC6}' {
            return 254;
        }

        // TSA-PHRU sorts before U+0F74.
        if u == '\u{0F39}' {
            return 127;
        }

        let k = unicode_ccc::get_canonical_combining_class(u) as u8;
        MODIFIED_COMBINING_CLASS[k as usize]
    }

    fn mirrored(self) -> Option<char> {
        unicode_bidi_mirroring::get_mirrored(self)
    }

    fn is_emoji_extended_pictographic(self) -> bool {
        matches!(self as u32,
            0x00A9 | 0x00AE | 0x203C | 0x2049 | 0x2122 | 0x2139
            | 0x2194..=0x2199 | 0x21A9..=0x21AA | 0x231A..=0x231B
            | 0x2328 | 0x23CF | 0x23E9..=0x23FA | 0x24C2
            | 0x25AA..=0x25AB | 0x25B6 | 0x25C0 | 0x25FB..=0x25FE
            | 0x2600..=0x2605 | 0x2607..=0x2612 | 0x2614..=0x2685
            | 0x2690..=0x2705 | 0x2708..=0x2712 | 0x2714 | 0x2716
            | 0x271D | 0x2721 | 0x2728 | 0x2733..=0x2734 | 0x2744
            | 0x2747 | 0x274C | 0x274E | 0x2753..=0x2755 | 0x2757
            | 0x2763..=0x2767 | 0x2795..=0x2797 | 0x27A1 | 0x27B0
            | 0x27BF | 0x2934..=0x2935 | 0x2B05..=0x2B07
            | 0x2B1B..=0x2B1C | 0x2B50 | 0x2B55 | 0x3030 | 0x303D
            | 0x3297 | 0x3299
            | 0x1F000..=0x1FFFD
        )
    }

    /// Default_Ignorable codepoints, per DerivedCoreProperties.txt — excluding
    /// U+115F/U+1160/U+3164/U+FFA0 which fonts render with spacing glyphs, as
    /// our teacher excludes them to match Uniscribe behavior.
    fn is_default_ignorable(self) -> bool {
        let ch = u32::from(self);
        match ch >> 16 {
            0x00 => match ch >> 8 {
                0x00 => ch == 0x00AD,
                0x03 => ch == 0x034F,
                0x06 => ch == 0x061C,
                0x17 => (0x17B4..=0x17B5).contains(&ch),
                0x18 => (0x180B..=0x180E).contains(&ch),
                0x20 => {
                    (0x200B..=0x200F).contains(&ch)
                        || (0x202A..=0x202E).contains(&ch)
                        || (0x2060..=0x206F).contains(&ch)
                }
                0xFE => (0xFE00..=0xFE0F).contains(&ch) || ch == 0xFEFF,
                0xFF => (0xFFF0..=0xFFF8).contains(&ch),
                _ => false,
            },
            0x01 => (0x1D173..=0x1D17A).contains(&ch),
            0x0E => (0xE0000..=0xE0FFF).contains(&ch),
            _ => false,
        }
    }

    fn is_variation_selector(self) -> bool {
        // U+180B..180D are handled by the Arabic/Mongolian shaper instead.
        let ch = u32::from(self);
        (0x0FE00..=0x0FE0F).contains(&ch) || (0xE0100..=0xE01EF).contains(&ch)
    }

    fn script(self) -> Script {
        Script::from_char(self)
    }
}

/// Canonical decomposition, delegating to `unic-ucd-normal`. Hangul syllables
/// decompose arithmetically per the algorithm in §4.9 (Hangul).
pub fn decompose(c: char) -> Option<(char, Option<char>)> {
    if let Some((a, b)) = decompose_hangul(c) {
        return Some((a, Some(b)));
    }

    let chars = unic_ucd_normal::canonical_decomposition(c)?;
    match chars.len() {
        1 => Some((chars[0], None)),
        2 => Some((chars[0], Some(chars[1]))),
        _ => None,
    }
}

pub fn compose(a: char, b: char) -> Option<char> {
    if let Some(c) = compose_hangul(a, b) {
        return Some(c);
    }

    unic_ucd_normal::compose(a, b)
}

pub const HANGUL_S_BASE: u32 = 0xAC00;
pub const HANGUL_L_BASE: u32 = 0x1100;
pub const HANGUL_V_BASE: u32 = 0x1161;
pub const HANGUL_T_BASE: u32 = 0x11A7;
pub const HANGUL_L_COUNT: u32 = 19;
pub const HANGUL_V_COUNT: u32 = 21;
pub const HANGUL_T_COUNT: u32 = 28;
pub const HANGUL_N_COUNT: u32 = HANGUL_V_COUNT * HANGUL_T_COUNT;
pub const HANGUL_S_COUNT: u32 = HANGUL_L_COUNT * HANGUL_N_COUNT;

fn decompose_hangul(ab: char) -> Option<(char, char)> {
    let si = (ab as u32).wrapping_sub(HANGUL_S_BASE);
    if si >= HANGUL_S_COUNT {
        return None;
    }

    let (a, b) = if si % HANGUL_T_COUNT != 0 {
        (
            HANGUL_S_BASE + (si / HANGUL_T_COUNT) * HANGUL_T_COUNT,
            HANGUL_T_BASE + (si % HANGUL_T_COUNT),
        )
    } else {
        (
            HANGUL_L_BASE + (si / HANGUL_N_COUNT),
            HANGUL_V_BASE + (si % HANGUL_N_COUNT) / HANGUL_T_COUNT,
        )
    };

    Some((char::from_u32(a)?, char::from_u32(b)?))
}

fn compose_hangul(a: char, b: char) -> Option<char> {
    let a = a as u32;
    let b = b as u32;

    if (HANGUL_L_BASE..HANGUL_L_BASE + HANGUL_L_COUNT).contains(&a)
        && (HANGUL_V_BASE..HANGUL_V_BASE + HANGUL_V_COUNT).contains(&b)
    {
        let l_index = a - HANGUL_L_BASE;
        let v_index = b - HANGUL_V_BASE;
        let lv = HANGUL_S_BASE + (l_index * HANGUL_V_COUNT + v_index) * HANGUL_T_COUNT;
        return char::from_u32(lv);
    }

    if (HANGUL_S_BASE..HANGUL_S_BASE + HANGUL_S_COUNT).contains(&a)
        && (a - HANGUL_S_BASE) % HANGUL_T_COUNT == 0
        && (HANGUL_T_BASE + 1..HANGUL_T_BASE + HANGUL_T_COUNT).contains(&b)
    {
        return char::from_u32(a + (b - HANGUL_T_BASE));
    }

    None
}

/// The script mask used to decide whether direction is left-to-right or
/// right-to-left when guessing buffer properties from its text (§4 pipeline
/// step "guess direction/script").
pub fn guess_script(text: &[char]) -> Script {
    for &c in text {
        let s = c.script();
        if s != script::COMMON && s != script::INHERITED && s != script::UNKNOWN {
            return s;
        }
    }

    script::COMMON
}
