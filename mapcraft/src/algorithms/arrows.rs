use crate::config::ArrowConfig;
use crate::geometry::tolerance::{norm2, CONTROL_RATIO};
use crate::model::{Point, ZombieArrow};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ArrowSizes {
    pub pointer_length: f32,
    pub pointer_width: f32,
    /// Black outline drawn beneath the fill.
    pub outline_stroke_width: f32,
}

pub fn arrow_sizes(stroke_width: f32) -> ArrowSizes {
    ArrowSizes {
        pointer_length: (stroke_width * 3.0).max(16.0),
        pointer_width: (stroke_width * 2.2).max(12.0),
        outline_stroke_width: stroke_width + 2.0,
    }
}

/// Cubic Bezier controls for a symmetric bow of `curvature` px to the left of the chord.
pub fn control_points(x1: f32, y1: f32, x2: f32, y2: f32, curvature: f32) -> (Point, Point) {
    let mx = 0.5 * (x1 + x2);
    let my = 0.5 * (y1 + y2);
    let ((ux, uy), _) = norm2(x2 - x1, y2 - y1);
    let (nx, ny) = (-uy, ux);
    let c1 = Point {
        x: x1 + CONTROL_RATIO * (mx - x1) + curvature * nx,
        y: y1 + CONTROL_RATIO * (my - y1) + curvature * ny,
    };
    let c2 = Point {
        x: x2 + CONTROL_RATIO * (mx - x2) + curvature * nx,
        y: y2 + CONTROL_RATIO * (my - y2) + curvature * ny,
    };
    (c1, c2)
}

/// Signed perpendicular offset of lane `index`, capped at `max_offset`.
pub fn arrow_offset_with(index: i32, cfg: &ArrowConfig) -> f32 {
    if index == 0 {
        return 0.0;
    }
    let mag = (cfg.base_offset + index.unsigned_abs() as f32 * cfg.offset_step).min(cfg.max_offset);
    mag.copysign(index as f32)
}

pub fn arrow_offset(index: i32) -> f32 {
    arrow_offset_with(index, &ArrowConfig::default())
}

/// Endpoints as drawn: midpoint, length and rotation win over the stored x1..y2,
/// which only fix the base angle at creation time.
pub fn rendered_endpoints(a: &ZombieArrow) -> (Point, Point) {
    let base = (a.y2 - a.y1).atan2(a.x2 - a.x1);
    let ang = base + a.rotation.to_radians();
    let (hx, hy) = (0.5 * a.length * ang.cos(), 0.5 * a.length * ang.sin());
    (
        Point { x: a.mid_x - hx, y: a.mid_y - hy },
        Point { x: a.mid_x + hx, y: a.mid_y + hy },
    )
}

/// Everything the renderer needs for one arrow.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ArrowGeometry {
    pub start: Point,
    pub end: Point,
    pub c1: Point,
    pub c2: Point,
    pub head_end: [Point; 3],
    pub head_start: Option<[Point; 3]>,
    pub sizes: ArrowSizes,
}

pub fn arrow_geometry(a: &ZombieArrow) -> ArrowGeometry {
    let (start, end) = rendered_endpoints(a);
    let (c1, c2) = control_points(start.x, start.y, end.x, end.y, a.curvature);
    let sizes = arrow_sizes(a.stroke_width);
    // heads follow the curve tangent at each end
    let head_end = arrow_head(end, c2, &sizes);
    let head_start = a.bidirectional.then(|| arrow_head(start, c1, &sizes));
    ArrowGeometry { start, end, c1, c2, head_end, head_start, sizes }
}

/// Triangle `[tip, left, right]` pointing from `toward` into `tip`.
pub fn arrow_head(tip: Point, toward: Point, sizes: &ArrowSizes) -> [Point; 3] {
    let ((ux, uy), len) = norm2(tip.x - toward.x, tip.y - toward.y);
    if len == 0.0 {
        return [tip, tip, tip];
    }
    let bx = tip.x - ux * sizes.pointer_length;
    let by = tip.y - uy * sizes.pointer_length;
    let hw = 0.5 * sizes.pointer_width;
    [tip, Point { x: bx - uy * hw, y: by + ux * hw }, Point { x: bx + uy * hw, y: by - ux * hw }]
}
