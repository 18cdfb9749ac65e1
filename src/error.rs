//! Constructor-level failures (§7's last row: "No error is ever returned
//! from `Shape`; constructor-level failures ... produce a typed construction
//! error reported once").

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ShapingError {
    /// The font data could not be parsed by `ttf-parser` at all.
    #[error("font data is malformed")]
    MalformedFont,
    /// The font is missing a `cmap` table, which every code path needs to
    /// map text to glyphs.
    #[error("font has no cmap table")]
    MissingCmap,
    /// Neither `hmtx` nor `vmtx` was present, so no advances are obtainable.
    #[error("font has no hmtx/vmtx table")]
    MissingMetrics,
}
