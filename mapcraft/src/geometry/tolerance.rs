// Tuning constants for interactive editing (screen pixels unless noted)

pub const EPS_LEN: f32 = 1e-6;            // zero-length vector threshold

pub const SNAP_DISTANCE: f32 = 10.0;      // connected-polygon edge snapping radius
pub const CLOSE_DISTANCE: f32 = 10.0;     // click this close to the first vertex closes a polygon
pub const MIN_DRAG_SIZE: f32 = 5.0;       // rect/ellipse commit threshold, per axis

pub const ELLIPSE_SEGMENTS: usize = 32;   // polygonal approximation used for ellipse edges

// Zombie arrow lanes
pub const BASE_OFFSET: f32 = 6.0;
pub const OFFSET_STEP: f32 = 10.0;
pub const MAX_OFFSET: f32 = 40.0;
pub const CONTROL_RATIO: f32 = 0.7;       // control point position along start->mid
pub const MARKER_CLEARANCE: f32 = 28.0;   // trimmed from each end of generated arrows

#[inline] pub fn clamp01(x: f32) -> f32 { x.max(0.0).min(1.0) }

#[inline]
pub fn norm2(mut x: f32, mut y: f32) -> ((f32,f32), f32) {
    let len = (x*x + y*y).sqrt();
    if len > EPS_LEN { x/=len; y/=len; ((x,y), len) } else { ((0.0,0.0), 0.0) }
}
