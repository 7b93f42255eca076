//! Editor tuning, loadable from JSON. Missing fields take the defaults from
//! [`crate::geometry::tolerance`].

use crate::geometry::tolerance::{
    BASE_OFFSET, CLOSE_DISTANCE, MARKER_CLEARANCE, MAX_OFFSET, MIN_DRAG_SIZE, OFFSET_STEP,
    SNAP_DISTANCE,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub snap_distance: f32,
    pub close_distance: f32,
    pub min_drag_size: f32,
    pub history_limit: usize,
    pub arrows: ArrowConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            snap_distance: SNAP_DISTANCE,
            close_distance: CLOSE_DISTANCE,
            min_drag_size: MIN_DRAG_SIZE,
            history_limit: 100,
            arrows: ArrowConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrowConfig {
    pub base_offset: f32,
    pub offset_step: f32,
    pub max_offset: f32,
    pub marker_clearance: f32,
    pub stroke_width: f32,
    /// Bow applied to generated arrows, as a fraction of their lane offset.
    pub curve_factor: f32,
    pub palette: Vec<String>,
    pub fallback_color: String,
}

pub const DEFAULT_PALETTE: [&str; 8] = [
    "#e6194b", "#3cb44b", "#4363d8", "#f58231", "#911eb4", "#42d4f4", "#f032e6", "#bfef45",
];

impl Default for ArrowConfig {
    fn default() -> Self {
        ArrowConfig {
            base_offset: BASE_OFFSET,
            offset_step: OFFSET_STEP,
            max_offset: MAX_OFFSET,
            marker_clearance: MARKER_CLEARANCE,
            stroke_width: 3.0,
            curve_factor: 0.5,
            palette: DEFAULT_PALETTE.iter().map(|s| s.to_string()).collect(),
            fallback_color: "#333333".to_string(),
        }
    }
}

impl EditorConfig {
    pub fn from_json_str(s: &str) -> Result<Self, crate::MapError> {
        let mut cfg: EditorConfig = serde_json::from_str(s)?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// Clamp values the UI could have sent out of range.
    pub fn sanitize(&mut self) {
        let d = EditorConfig::default();
        if !self.snap_distance.is_finite() || self.snap_distance < 0.0 { self.snap_distance = d.snap_distance; }
        if !self.close_distance.is_finite() || self.close_distance < 0.0 { self.close_distance = d.close_distance; }
        if !self.min_drag_size.is_finite() || self.min_drag_size < 0.0 { self.min_drag_size = d.min_drag_size; }
        self.history_limit = self.history_limit.max(1);
        let a = &mut self.arrows;
        if !a.max_offset.is_finite() || a.max_offset < 0.0 { a.max_offset = d.arrows.max_offset; }
        if !a.base_offset.is_finite() { a.base_offset = d.arrows.base_offset; }
        if !a.offset_step.is_finite() { a.offset_step = d.arrows.offset_step; }
        if !crate::geometry::limits::in_width_bounds(a.stroke_width) { a.stroke_width = d.arrows.stroke_width; }
    }
}
