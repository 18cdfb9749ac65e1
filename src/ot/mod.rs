//! OpenType table parsing and lookup application (C3-C11): GDEF glyph
//! classification, the GSUB/GPOS subtable families, the context/chain-context
//! machinery they share, the feature map that resolves a script/language into
//! an ordered lookup list, the shape plan that ties it all to one face, and
//! `fvar`/`avar` variable-font coordinate handling.

pub mod apply;
pub mod classdef;
pub mod context;
pub mod coverage;
pub mod feature;
pub mod gdef;
pub mod gpos;
pub mod gsub;
pub mod layout;
pub mod map;
pub mod normalize;
pub mod plan;
pub mod var;
