//! Per-codepoint Indic category table (§4.9 step 4). Devanagari (U+0900-097F)
//! is tabulated from `IndicSyllabicCategory.txt`'s broad classes; the other
//! nine scripts Indic shares this machinery with lay out consonants, vowels,
//! matras, virama and nukta at the same relative offsets within their own
//! block, so `category_for` maps any of them onto the Devanagari table by
//! block offset. This loses a handful of per-script exceptions (e.g.
//! Malayalam's chillu letters) but gets the overwhelming majority of text
//! right without ten separately hand-tabulated blocks.

use unicode_general_category::GeneralCategory as GC;

use crate::unicode::CharExt;

use super::indic::Category;

#[rustfmt::skip]
const DEVANAGARI: [Category; 0x80] = build_devanagari();

const fn build_devanagari() -> [Category; 0x80] {
    let mut t = [Category::Other; 0x80];

    // Bindu / visarga / candra.
    t[0x00] = Category::Bindu;   // CANDRABINDU
    t[0x01] = Category::Bindu;  // CANDRABINDU (Devanagari mark variants)
    t[0x02] = Category::Bindu;   // ANUSVARA
    t[0x03] = Category::Visarga; // VISARGA

    // Independent vowels.
    let mut i = 0x05;
    while i <= 0x14 {
        t[i] = Category::Vowel;
        i += 1;
    }

    // Consonants.
    let mut i = 0x15;
    while i <= 0x39 {
        t[i] = Category::Consonant;
        i += 1;
    }

    t[0x3C] = Category::Nukta;
    t[0x3D] = Category::Avagraha;

    // Dependent vowel signs (matras).
    let mut i = 0x3E;
    while i <= 0x4C {
        t[i] = Category::VowelDependent;
        i += 1;
    }

    // Vowel sign I sits at this offset in every script sharing this block
    // layout and, uniquely among matras, attaches visually *before* the
    // base consonant despite being encoded after it.
    t[0x3F] = Category::VowelDependentPreBase;

    t[0x4D] = Category::Halant;

    // Vedic tone/stress marks.
    let mut i = 0x51;
    while i <= 0x57 {
        t[i] = Category::ToneMark;
        i += 1;
    }

    t[0x62] = Category::VowelDependent; // VOCALIC L vowel sign
    t[0x63] = Category::VowelDependent; // VOCALIC LL vowel sign

    t
}

/// Indic scripts sharing this shaper, keyed by the base codepoint of their
/// block (all 0x80 wide, laid out in the same relative order).
const BLOCK_BASES: &[u32] = &[
    0x0900, // Devanagari
    0x0980, // Bengali
    0x0A00, // Gurmukhi
    0x0A80, // Gujarati
    0x0B00, // Oriya
    0x0B80, // Tamil
    0x0C00, // Telugu
    0x0C80, // Kannada
    0x0D00, // Malayalam
    0x0D80, // Sinhala
];

pub fn category_for(c: char) -> Category {
    let cp = c as u32;

    for &base in BLOCK_BASES {
        if cp >= base && cp < base + 0x80 {
            let entry = DEVANAGARI[(cp - base) as usize];
            if entry != Category::Other {
                return entry;
            }
            break;
        }
    }

    match c.general_category() {
        GC::NonspacingMark | GC::SpacingMark => Category::VowelDependent,
        GC::Format => Category::ZeroWidthJoiner,
        _ => Category::Other,
    }
}
