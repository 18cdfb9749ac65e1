//! The shape plan (§4.6, §9): script/language/direction resolution plus a
//! compiled `Map`, built once per (face, script, language, direction,
//! features) tuple and reused across any number of `shape_with_plan` calls
//! (§5 concurrency model — a `ShapePlan` is read-only after construction, so
//! `Send + Sync`).

use crate::buffer::BufferClusterLevel;
use crate::common::{Direction, Language, Script, Tag};
use crate::complex::{self, ComplexShaper};
use crate::face::Face;
use crate::ot::map::{FeatureFlags, Map, TableKind};
use crate::ot::feature::{feature, Feature};
use crate::Mask;

/// Mark-zeroing timing (§4.9 step 12): Indic/Myanmar zero mark widths before
/// the attachment propagator runs, Arabic/Hebrew/default zero them after.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MarkZeroing {
    Early,
    Late,
}

/// A fully resolved, immutable recipe for shaping one (script, language,
/// direction) combination against one face.
pub struct ShapePlan {
    pub script: Script,
    pub direction: Direction,
    pub language: Option<Language>,
    pub ot_map: Map,
    pub shaper: &'static dyn ComplexShaper,
    pub mark_zeroing: MarkZeroing,
    pub has_gpos_mark: bool,
    pub rtlm_mask: Mask,
}

impl ShapePlan {
    /// §4.6 steps 1-5, run once: the complex shaper contributes its feature
    /// list via `collect_features`, then the map resolves lookup indices
    /// against the face's actual GSUB/GPOS script/feature/lookup lists.
    pub fn new(
        face: &Face,
        direction: Direction,
        script: Option<Script>,
        language: Option<Language>,
        user_features: &[Feature],
    ) -> Self {
        let script = script.unwrap_or(crate::common::script::COMMON);
        let shaper = complex::shaper_for_script(script);

        let mut ot_map = Map::new();
        ot_map.enable_feature(feature::ABOVE_BASE_MARK_POSITIONING, FeatureFlags::empty(), 1);
        ot_map.enable_feature(feature::BELOW_BASE_MARK_POSITIONING, FeatureFlags::empty(), 1);
        ot_map.enable_feature(feature::GLYPH_COMPOSITION_DECOMPOSITION, FeatureFlags::empty(), 1);
        ot_map.enable_feature(feature::LOCALIZED_FORMS, FeatureFlags::empty(), 1);
        ot_map.enable_feature(feature::MARK_POSITIONING, FeatureFlags::empty(), 1);
        ot_map.enable_feature(feature::MARK_TO_MARK_POSITIONING, FeatureFlags::empty(), 1);
        ot_map.enable_feature(feature::REQUIRED_LIGATURES, FeatureFlags::empty(), 1);
        ot_map.enable_feature(feature::CONTEXTUAL_ALTERNATES, FeatureFlags::empty(), 1);
        ot_map.enable_feature(feature::CONTEXTUAL_LIGATURES, FeatureFlags::empty(), 1);
        ot_map.enable_feature(feature::STANDARD_LIGATURES, FeatureFlags::empty(), 1);
        ot_map.enable_feature(feature::REQUIRED_CONTEXTUAL_ALTERNATES, FeatureFlags::empty(), 1);
        ot_map.enable_feature(feature::CURSIVE_POSITIONING, FeatureFlags::empty(), 1);
        ot_map.enable_feature(feature::KERNING, FeatureFlags::empty(), 1);
        ot_map.enable_feature(feature::DISTANCES, FeatureFlags::empty(), 1);

        if direction.is_horizontal() {
            let dir_feature = if direction == Direction::RightToLeft {
                feature::RIGHT_TO_LEFT_ALTERNATES
            } else {
                feature::LEFT_TO_RIGHT_ALTERNATES
            };
            ot_map.enable_feature(dir_feature, FeatureFlags::empty(), 1);
        }

        shaper.collect_features(&mut ShapePlanner { ot_map: &mut ot_map, script, direction });

        for feat in user_features {
            let flags = if feat.is_global() { FeatureFlags::GLOBAL } else { FeatureFlags::empty() };
            ot_map.add_feature(feat.tag, flags, feat.value.max(1));
        }

        let script_tag = crate::ot::var::script_tag(script);
        let lang_tag = language.map(|l| Tag::from_bytes_lossy(l.as_str().as_bytes()));
        let coords = face.normalized_coords();

        ot_map.compile(
            TableKind::Gsub,
            face.gsub_script_list(),
            face.gsub_feature_list(),
            face.gsub_feature_variations(),
            coords,
            face.gsub_lookup_list(),
            script_tag,
            lang_tag,
        );
        ot_map.compile(
            TableKind::Gpos,
            face.gpos_script_list(),
            face.gpos_feature_list(),
            face.gpos_feature_variations(),
            coords,
            face.gpos_lookup_list(),
            script_tag,
            lang_tag,
        );

        let rtlm_mask = ot_map.get_1_mask(feature::RIGHT_TO_LEFT_MIRRORED_FORMS);
        let has_gpos_mark =
            ot_map.get_1_mask(feature::MARK_POSITIONING) != 0 && ot_map.found_script(true);

        ShapePlan {
            script,
            direction,
            language,
            ot_map,
            shaper,
            mark_zeroing: shaper.mark_zeroing(),
            has_gpos_mark,
            rtlm_mask,
        }
    }

    pub fn cluster_level(&self) -> BufferClusterLevel {
        BufferClusterLevel::MonotoneGraphemes
    }
}

/// Passed to a complex shaper's `collect_features` — a thin handle onto the
/// in-progress map plus the script/direction it's being compiled for, so a
/// shaper can make direction-dependent feature choices (e.g. Arabic's
/// `rtla`/`ltra`) without the plan exposing its whole builder surface.
pub struct ShapePlanner<'a> {
    pub ot_map: &'a mut Map,
    pub script: Script,
    pub direction: Direction,
}
