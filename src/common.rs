//! Tags, scripts, languages and directions — the small value types shared
//! across the whole crate, the way rustybuzz's `common.rs` shares them.

use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

/// A 32-bit four-byte tag (`b"arab"` → a script/feature/language identifier).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub u32);

impl Tag {
    /// Creates a `Tag` from four bytes.
    pub const fn from_bytes(bytes: &[u8; 4]) -> Self {
        Tag(((bytes[0] as u32) << 24)
            | ((bytes[1] as u32) << 16)
            | ((bytes[2] as u32) << 8)
            | (bytes[3] as u32))
    }

    /// Creates a `Tag` from four bytes, space-padding anything shorter.
    pub fn from_bytes_lossy(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Tag::from_bytes(b"    ");
        }

        let mut buf = [b' '; 4];
        let len = bytes.len().min(4);
        buf[..len].copy_from_slice(&bytes[..len]);
        Tag::from_bytes(&buf)
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }

    pub const fn to_bytes(self) -> [u8; 4] {
        [
            (self.0 >> 24) as u8,
            (self.0 >> 16) as u8,
            (self.0 >> 8) as u8,
            self.0 as u8,
        ]
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Tag({:?})", std::str::from_utf8(&self.to_bytes()).unwrap_or("????"))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let bytes = self.to_bytes();
        for b in &bytes {
            write!(f, "{}", *b as char)?;
        }
        Ok(())
    }
}

impl FromStr for Tag {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.len() > 4 {
            return Err(());
        }

        Ok(Tag::from_bytes_lossy(s.as_bytes()))
    }
}

/// Text flow direction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Invalid,
    LeftToRight,
    RightToLeft,
    TopToBottom,
    BottomToTop,
}

impl Direction {
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::LeftToRight | Direction::RightToLeft)
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::TopToBottom | Direction::BottomToTop)
    }

    pub fn is_backward(self) -> bool {
        matches!(self, Direction::RightToLeft | Direction::BottomToTop)
    }

    pub fn reverse(self) -> Self {
        match self {
            Direction::LeftToRight => Direction::RightToLeft,
            Direction::RightToLeft => Direction::LeftToRight,
            Direction::TopToBottom => Direction::BottomToTop,
            Direction::BottomToTop => Direction::TopToBottom,
            Direction::Invalid => Direction::Invalid,
        }
    }
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Invalid
    }
}

/// An ISO 15924 script tag, wrapped so script dispatch can match on constants.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Script(pub(crate) Tag);

impl Script {
    pub const fn from_tag(tag: Tag) -> Self {
        Script(tag)
    }

    pub const fn tag(self) -> Tag {
        self.0
    }

    pub fn horizontal_direction(self) -> Direction {
        script::horizontal_direction(self)
    }

    /// Guesses the script for a character using `unicode-script`'s property data,
    /// the external Unicode-property collaborator named in §6.
    pub fn from_char(c: char) -> Self {
        use unicode_script::UnicodeScript;
        script::from_unicode_script(c.script())
    }
}

/// Well-known script constants, analogous to rustybuzz's `script` module.
///
/// This is not an exhaustive ISO 15924 registry: it covers every script this
/// crate's shaper dispatch (§4.9) or joining/normalization logic (§4.7, §4.8)
/// distinguishes by name. Anything else maps to [`UNKNOWN`] and is handled by
/// the default shaper.
pub mod script {
    use super::{Direction, Script, Tag};

    macro_rules! scripts {
        ($($name:ident => $tag:expr),* $(,)?) => {
            $(pub const $name: Script = Script(Tag::from_bytes($tag));)*
        };
    }

    scripts! {
        COMMON => b"Zyyy",
        INHERITED => b"Zinh",
        UNKNOWN => b"Zzzz",

        ARABIC => b"Arab",
        SYRIAC => b"Syrc",
        HEBREW => b"Hebr",
        THAANA => b"Thaa",
        NKO => b"Nkoo",
        MANDAIC => b"Mand",
        MONGOLIAN => b"Mong",

        LATIN => b"Latn",
        GREEK => b"Grek",
        CYRILLIC => b"Cyrl",
        ARMENIAN => b"Armn",
        GEORGIAN => b"Geor",

        THAI => b"Thai",
        LAO => b"Laoo",

        DEVANAGARI => b"Deva",
        BENGALI => b"Beng",
        GURMUKHI => b"Guru",
        GUJARATI => b"Gujr",
        ORIYA => b"Orya",
        TAMIL => b"Taml",
        TELUGU => b"Telu",
        KANNADA => b"Knda",
        MALAYALAM => b"Mlym",
        SINHALA => b"Sinh",

        MYANMAR => b"Mymr",
        KHMER => b"Khmr",
        TIBETAN => b"Tibt",
        TAI_THAM => b"Lana",
        JAVANESE => b"Java",
        BALINESE => b"Bali",
        SUNDANESE => b"Sund",
        BATAK => b"Batk",
        BUGINESE => b"Bugi",
        TAGALOG => b"Tglg",
        NEW_TAI_LUE => b"Talu",
        CHAM => b"Cham",
        KAYAH_LI => b"Kali",
        REJANG => b"Rjng",
        SAURASHTRA => b"Saur",
        SYLOTI_NAGRI => b"Sylo",
        TIFINAGH => b"Tfng",

        HANGUL => b"Hang",
        HAN => b"Hani",
        HIRAGANA => b"Hira",
        KATAKANA => b"Kana",
        BOPOMOFO => b"Bopo",

        // Zawgyi (the visual-order Myanmar encoding, handled by the Qaag shaper).
        MYANMAR_ZAWGYI => b"Qaag",
    }

    /// Horizontal direction for a script — `Invalid` is returned for
    /// vertical-only or direction-neutral scripts, matching the teacher's
    /// `hb_script_get_horizontal_direction`.
    pub fn horizontal_direction(script: Script) -> Direction {
        match script {
            ARABIC | HEBREW | SYRIAC | THAANA | NKO | MANDAIC | MONGOLIAN => Direction::RightToLeft,
            COMMON | INHERITED | UNKNOWN => Direction::Invalid,
            _ => Direction::LeftToRight,
        }
    }

    pub(super) fn from_unicode_script(s: unicode_script::Script) -> Script {
        use unicode_script::Script as US;
        match s {
            US::Common => COMMON,
            US::Inherited => INHERITED,
            US::Arabic => ARABIC,
            US::Syriac => SYRIAC,
            US::Hebrew => HEBREW,
            US::Thaana => THAANA,
            US::Nko => NKO,
            US::Mandaic => MANDAIC,
            US::Mongolian => MONGOLIAN,
            US::Latin => LATIN,
            US::Greek => GREEK,
            US::Cyrillic => CYRILLIC,
            US::Armenian => ARMENIAN,
            US::Georgian => GEORGIAN,
            US::Thai => THAI,
            US::Lao => LAO,
            US::Devanagari => DEVANAGARI,
            US::Bengali => BENGALI,
            US::Gurmukhi => GURMUKHI,
            US::Gujarati => GUJARATI,
            US::Oriya => ORIYA,
            US::Tamil => TAMIL,
            US::Telugu => TELUGU,
            US::Kannada => KANNADA,
            US::Malayalam => MALAYALAM,
            US::Sinhala => SINHALA,
            US::Myanmar => MYANMAR,
            US::Khmer => KHMER,
            US::Tibetan => TIBETAN,
            US::Tai_Tham => TAI_THAM,
            US::Javanese => JAVANESE,
            US::Balinese => BALINESE,
            US::Sundanese => SUNDANESE,
            US::Batak => BATAK,
            US::Buginese => BUGINESE,
            US::Tagalog => TAGALOG,
            US::New_Tai_Lue => NEW_TAI_LUE,
            US::Cham => CHAM,
            US::Kayah_Li => KAYAH_LI,
            US::Rejang => REJANG,
            US::Saurashtra => SAURASHTRA,
            US::Syloti_Nagri => SYLOTI_NAGRI,
            US::Tifinagh => TIFINAGH,
            US::Hangul => HANGUL,
            US::Han => HAN,
            US::Hiragana => HIRAGANA,
            US::Katakana => KATAKANA,
            US::Bopomofo => BOPOMOFO,
            _ => UNKNOWN,
        }
    }
}

/// A BCP-47 language tag, stored lowercase as rustybuzz does.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Language(String);

impl Language {
    pub fn from_str(s: &str) -> Option<Self> {
        if s.is_empty() {
            return None;
        }

        Some(Language(s.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A variable-font axis setting, `{tag, value}` as described in §6.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Variation {
    pub tag: Tag,
    pub value: f32,
}

impl TryFrom<&str> for Variation {
    type Error = ();

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let mut parts = s.splitn(2, '=');
        let tag = parts.next().ok_or(())?;
        let value = parts.next().ok_or(())?;
        Ok(Variation {
            tag: Tag::from_str(tag).map_err(|_| ())?,
            value: value.parse().map_err(|_| ())?,
        })
    }
}
