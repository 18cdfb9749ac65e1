//! `glyphforge` is an OpenType text shaping engine.
//!
//! It converts a sequence of Unicode codepoints plus a parsed font into a
//! sequence of positioned glyphs, honoring script-specific rules (Arabic
//! joining, Indic/USE/Khmer/Myanmar reordering, Hangul composition,
//! Hebrew/Thai mark handling) and the font's OpenType layout tables (GSUB
//! for substitution, GPOS for positioning, GDEF for glyph classification).
//!
//! # Glossary
//!
//! - **Base / Mark / Ligature**: GDEF glyph classes 1/3/2.
//! - **Cluster**: integer tying an output glyph to an input text position.
//! - **Default ignorable**: a Unicode character marked as visually optional
//!   (formatting controls, CGJ, most variation selectors).
//! - **Feature**: a four-byte tag enabling a coordinated set of OpenType
//!   lookups (e.g. `liga`, `kern`, `init`).
//! - **LangSys**: a language system record listing enabled feature indices
//!   under a script.
//! - **Lookup**: an ordered set of subtables of a given type.
//! - **Lookup flag**: a bit-set governing which glyph classes to skip during
//!   lookup matching.
//! - **Skippy iterator**: the abstraction that steps through the buffer,
//!   skipping glyphs per a lookup flag, GDEF state and ignorable rules.
//! - **Syllable**: a maximal contiguous run of glyphs recognized by a
//!   complex-script automaton as a shaping unit.
//! - **Two-buffer protocol**: staging GSUB outputs in a side vector while
//!   consuming inputs, then swapping at `sync`.

#![allow(clippy::upper_case_acronyms)]

#[macro_use]
extern crate bitflags;

mod common;
mod unicode;
mod parser;
mod buffer;
mod face;
mod fallback;
mod error;
mod shape;

pub mod ot;
pub mod complex;

pub use common::{Direction, Language, Script, Tag, Variation};
pub use buffer::{
    Buffer, BufferClusterLevel, BufferFlags, GlyphBuffer, GlyphInfo, GlyphPosition,
    SerializeFlags, UnicodeBuffer,
};
pub use error::ShapingError;
pub use face::Face;
pub use ot::feature::Feature;
pub use ot::plan::ShapePlan;
pub use shape::{shape, shape_with_plan};

/// A 16-bit font glyph index. `0` means `.notdef`.
pub type GlyphId = u16;

/// A feature-bit vector mask. Bit 31 is the always-on global bit.
pub type Mask = u32;
