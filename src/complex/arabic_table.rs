//! Unicode `ArabicShaping.txt` joining classes, covering the main Arabic
//! block (U+0621-064A), the Syriac ALAPH/DALATH_RISH joining groups, and the
//! letters Unicode assigns transparent joining behavior to outside those
//! blocks. Anything absent here falls back to a general-category guess in
//! `arabic::get_joining_type` (non-spacing/enclosing marks and formatting
//! controls are transparent, everything else is non-joining) — the same
//! fallback the Unicode data itself documents for unassigned code points.

use super::arabic::JoiningType;

pub fn joining_type(c: char) -> JoiningType {
    match c as u32 {
        // Arabic block.
        0x0621 => JoiningType::U, // HAMZA
        0x0622 => JoiningType::R, // ALEF WITH MADDA ABOVE
        0x0623 => JoiningType::R, // ALEF WITH HAMZA ABOVE
        0x0624 => JoiningType::R, // WAW WITH HAMZA ABOVE
        0x0625 => JoiningType::R, // ALEF WITH HAMZA BELOW
        0x0626 => JoiningType::D, // YEH WITH HAMZA ABOVE
        0x0627 => JoiningType::R, // ALEF
        0x0628 => JoiningType::D, // BEH
        0x0629 => JoiningType::R, // TEH MARBUTA
        0x062A => JoiningType::D, // TEH
        0x062B => JoiningType::D, // THEH
        0x062C => JoiningType::D, // JEEM
        0x062D => JoiningType::D, // HAH
        0x062E => JoiningType::D, // KHAH
        0x062F => JoiningType::R, // DAL
        0x0630 => JoiningType::R, // THAL
        0x0631 => JoiningType::R, // REH
        0x0632 => JoiningType::R, // ZAIN
        0x0633 => JoiningType::D, // SEEN
        0x0634 => JoiningType::D, // SHEEN
        0x0635 => JoiningType::D, // SAD
        0x0636 => JoiningType::D, // DAD
        0x0637 => JoiningType::D, // TAH
        0x0638 => JoiningType::D, // ZAH
        0x0639 => JoiningType::D, // AIN
        0x063A => JoiningType::D, // GHAIN
        0x0641 => JoiningType::D, // FEH
        0x0642 => JoiningType::D, // QAF
        0x0643 => JoiningType::D, // KAF
        0x0644 => JoiningType::D, // LAM
        0x0645 => JoiningType::D, // MEEM
        0x0646 => JoiningType::D, // NOON
        0x0647 => JoiningType::D, // HEH
        0x0648 => JoiningType::R, // WAW
        0x0649 => JoiningType::D, // ALEF MAKSURA
        0x064A => JoiningType::D, // YEH

        // Combining marks in the Arabic block are transparent.
        0x0610..=0x061A | 0x064B..=0x065F | 0x0670 => JoiningType::T,

        // Arabic Supplement (mostly extra dual-joining consonants).
        0x0750..=0x077F => JoiningType::D,

        // Arabic Extended-A.
        0x08A0..=0x08B4 => JoiningType::D,
        0x08E3..=0x08FF => JoiningType::T,

        // Syriac block.
        0x0710 => JoiningType::GroupAlaph,       // ALAPH
        0x0715 => JoiningType::GroupDalathRish,  // DALATH
        0x0716 => JoiningType::GroupDalathRish,  // RISH
        0x0712..=0x0714 => JoiningType::R,
        0x0717..=0x072C => JoiningType::D,
        0x072D..=0x072F => JoiningType::D,
        0x0730..=0x074A => JoiningType::T,

        // Mongolian variation selectors (§4.8 "copy the preceding glyph's
        // action"); classified U here so the joining DFA itself doesn't act
        // on them directly — `mongolian_variation_selectors` runs afterward.
        0x180B..=0x180D | 0x180F => JoiningType::U,

        _ => JoiningType::X,
    }
}
