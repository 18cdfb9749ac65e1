//! Category table for the Universal Shaping Engine (§4.9): the fourteen
//! Brahmic-derived scripts that don't warrant their own bespoke shaper get a
//! single generic template driven almost entirely off Unicode's
//! `General_Category` plus the `Indic_Syllabic_Category`-style split between
//! a script's virama/killer character and its other combining signs. Each
//! script's virama is hand-listed since there's no generic way to derive it.

use unicode_general_category::GeneralCategory as GC;

use crate::unicode::CharExt;

use super::use_shaper::Category;

const VIRAMAS: &[u32] = &[
    0x0F84, // Tibetan MARK HALANTA
    0x1A60, // Tai Tham SIGN SAKOT
    0xA806, // Syloti Nagri SIGN HASANTA
    0xA8C4, // Saurashtra SIGN VIRAMA
    0xA953, // Rejang VIRAMA
    0x1B44, // Balinese ADEG ADEG
    0x1BAA, // Sundanese SIGN PAMAAEH
    0x1BF2, // Batak PANGOLAT
    0x1BF3, // Batak PANGOLAT (alternate form)
    0xA9C0, // Javanese PANGKON
];

pub fn category_for(c: char) -> Category {
    let cp = c as u32;

    if VIRAMAS.contains(&cp) {
        return Category::Virama;
    }

    match c.general_category() {
        GC::NonspacingMark => Category::Mark,
        GC::SpacingMark => Category::VowelDependent,
        GC::OtherLetter => Category::Consonant,
        GC::Format => Category::ZeroWidthJoiner,
        GC::DecimalNumber | GC::OtherNumber => Category::Number,
        _ => Category::Other,
    }
}
