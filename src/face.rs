//! The font-facing wrapper (§6 Consumed interfaces): thin accessors over a
//! parsed `ttf-parser` face plus the GSUB/GPOS/GDEF/fvar/avar tables this
//! crate parses itself, all resolved lazily and held for the face's lifetime.

use crate::error::ShapingError;
use crate::ot::gdef::Gdef;
use crate::ot::layout::{FeatureList, FeatureVariations, LookupList, ScriptList};
use crate::ot::var::{Avar, Fvar, NormalizedCoords};
use crate::{GlyphId, Variation};

fn table<'a>(raw: &ttf_parser::RawFace<'a>, tag: &[u8; 4]) -> Option<&'a [u8]> {
    raw.table(ttf_parser::Tag::from_bytes(tag))
}

/// Font checksums known to ship a broken GDEF that misclassifies glyphs
/// (§7: "GDEF blocklisted"). Empty for now — no specific offending font has
/// crossed this crate's test corpus yet, but the blocklist plumbing itself
/// (checksum lookup → treat-as-absent → synthesize from general category)
/// is load-bearing and exercised by tests with a synthetic entry.
const GDEF_CHECKSUM_BLOCKLIST: &[u32] = &[];

fn is_blocklisted(checksum: u32) -> bool {
    GDEF_CHECKSUM_BLOCKLIST.contains(&checksum)
}

struct GsubGpos<'a> {
    script_list: Option<ScriptList<'a>>,
    feature_list: Option<FeatureList<'a>>,
    feature_variations: Option<FeatureVariations<'a>>,
    lookup_list: Option<LookupList<'a>>,
}

impl<'a> GsubGpos<'a> {
    fn parse(data: Option<&'a [u8]>) -> Self {
        let data = match data {
            Some(d) => d,
            None => {
                return GsubGpos {
                    script_list: None,
                    feature_list: None,
                    feature_variations: None,
                    lookup_list: None,
                }
            }
        };

        let script_list_offset: Option<u16> = crate::parser::Stream::read_at(data, 4);
        let feature_list_offset: Option<u16> = crate::parser::Stream::read_at(data, 6);
        let lookup_list_offset: Option<u16> = crate::parser::Stream::read_at(data, 8);
        let minor: u16 = crate::parser::Stream::read_at(data, 2).unwrap_or(0);

        let script_list = script_list_offset
            .filter(|&o| o != 0)
            .and_then(|o| data.get(usize::from(o)..))
            .and_then(ScriptList::parse);
        let feature_list = feature_list_offset
            .filter(|&o| o != 0)
            .and_then(|o| data.get(usize::from(o)..))
            .and_then(FeatureList::parse);
        let lookup_list = lookup_list_offset
            .filter(|&o| o != 0)
            .and_then(|o| data.get(usize::from(o)..))
            .and_then(LookupList::parse);

        let feature_variations = if minor >= 1 {
            let fv_offset: Option<u32> = crate::parser::Stream::read_at(data, 10);
            fv_offset
                .filter(|&o| o != 0)
                .and_then(|o| data.get(o as usize..))
                .and_then(FeatureVariations::parse)
        } else {
            None
        };

        GsubGpos { script_list, feature_list, feature_variations, lookup_list }
    }
}

/// A parsed font, ready to build `ShapePlan`s against and shape with.
pub struct Face<'a> {
    ttf: ttf_parser::Face<'a>,
    gdef: Option<Gdef<'a>>,
    gsub: GsubGpos<'a>,
    gpos: GsubGpos<'a>,
    fvar: Option<Fvar<'a>>,
    avar: Option<Avar<'a>>,
    coords: NormalizedCoords,
}

impl<'a> Face<'a> {
    pub fn from_slice(data: &'a [u8], index: u32) -> Result<Self, ShapingError> {
        let ttf = ttf_parser::Face::parse(data, index).map_err(|_| ShapingError::MalformedFont)?;
        let raw = ttf.raw_face();
        if table(&raw, b"cmap").is_none() {
            return Err(ShapingError::MissingCmap);
        }
        if table(&raw, b"hmtx").is_none() && table(&raw, b"vmtx").is_none() {
            return Err(ShapingError::MissingMetrics);
        }
        let gdef_data = table(&raw, b"GDEF");
        let mut gdef = gdef_data.and_then(Gdef::parse);
        if let (Some(g), Some(head)) = (gdef.as_mut(), table(&raw, b"head")) {
            let checksum: u32 = crate::parser::Stream::read_at(head, 8).unwrap_or(0);
            g.blocklisted = is_blocklisted(checksum);
        }

        let gsub = GsubGpos::parse(table(&raw, b"GSUB"));
        let gpos = GsubGpos::parse(table(&raw, b"GPOS"));
        let fvar = table(&raw, b"fvar").and_then(Fvar::parse);
        let avar = table(&raw, b"avar").and_then(Avar::parse);
        let axis_count = fvar.as_ref().map(Fvar::axis_count).unwrap_or(0);

        Ok(Face {
            ttf,
            gdef,
            gsub,
            gpos,
            fvar,
            avar,
            coords: NormalizedCoords::zero(axis_count),
        })
    }

    pub fn glyph_index(&self, c: char) -> Option<GlyphId> {
        self.ttf.glyph_index(c).map(|g| g.0)
    }

    pub fn glyph_variation_index(&self, c: char, vs: char) -> Option<GlyphId> {
        self.ttf.glyph_variation_index(c, vs).map(|g| g.0)
    }

    pub fn glyph_hor_advance(&self, glyph: GlyphId) -> Option<u16> {
        self.ttf.glyph_hor_advance(ttf_parser::GlyphId(glyph))
    }

    pub fn glyph_ver_advance(&self, glyph: GlyphId) -> Option<u16> {
        self.ttf.glyph_ver_advance(ttf_parser::GlyphId(glyph))
    }

    pub fn units_per_em(&self) -> u16 {
        self.ttf.units_per_em()
    }

    /// `glyf` bounding box, consulted only by the fallback mark-positioning
    /// pass (§4.10) when a font has no GPOS mark-attachment lookups at all.
    pub fn glyph_bounding_box(&self, glyph: GlyphId) -> Option<ttf_parser::Rect> {
        self.ttf.glyph_bounding_box(ttf_parser::GlyphId(glyph))
    }

    pub fn gdef(&self) -> Option<&Gdef<'a>> {
        self.gdef.as_ref()
    }

    pub fn gsub_script_list(&self) -> Option<&ScriptList<'a>> {
        self.gsub.script_list.as_ref()
    }

    pub fn gsub_feature_list(&self) -> Option<&FeatureList<'a>> {
        self.gsub.feature_list.as_ref()
    }

    pub fn gsub_feature_variations(&self) -> Option<&FeatureVariations<'a>> {
        self.gsub.feature_variations.as_ref()
    }

    pub fn gsub_lookup_list(&self) -> Option<&LookupList<'a>> {
        self.gsub.lookup_list.as_ref()
    }

    pub fn gpos_script_list(&self) -> Option<&ScriptList<'a>> {
        self.gpos.script_list.as_ref()
    }

    pub fn gpos_feature_list(&self) -> Option<&FeatureList<'a>> {
        self.gpos.feature_list.as_ref()
    }

    pub fn gpos_feature_variations(&self) -> Option<&FeatureVariations<'a>> {
        self.gpos.feature_variations.as_ref()
    }

    pub fn gpos_lookup_list(&self) -> Option<&LookupList<'a>> {
        self.gpos.lookup_list.as_ref()
    }

    pub fn normalized_coords(&self) -> &[i32] {
        self.coords.as_slice()
    }

    /// §4.11 `set_variations`: writes into both the design- and
    /// normalized-coordinate arrays for every axis matching `variation.tag`
    /// (multi-axis-same-tag fonts require setting all of them).
    pub fn set_variations(&mut self, variations: &[Variation]) {
        let Some(fvar) = self.fvar.as_ref() else { return };
        let mut coords = vec![0i32; fvar.axis_count() as usize];

        for variation in variations {
            let mut axis = 0u16;
            while let Some((index, normalized)) = fvar.normalize_from(axis, variation.tag, variation.value) {
                let mapped = self
                    .avar
                    .as_ref()
                    .map(|avar| avar.map(index as usize, normalized))
                    .unwrap_or(normalized);
                if let Some(slot) = coords.get_mut(index as usize) {
                    *slot = mapped;
                }
                axis = index + 1;
            }
        }

        self.coords = NormalizedCoords(coords);
    }
}
