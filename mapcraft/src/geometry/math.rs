use super::tolerance::{clamp01, EPS_LEN};
use crate::model::{Edge, Point};

/// Squared distance from `p` to segment `e`, with the clamped projection parameter.
pub fn seg_distance_sq(px: f32, py: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> (f32, f32) {
    let vx = x2 - x1; let vy = y2 - y1;
    let wx = px - x1; let wy = py - y1;
    let vv = vx*vx + vy*vy;
    let t = if vv > 0.0 { clamp01((wx*vx + wy*vy) / vv) } else { 0.0 };
    let projx = x1 + t * vx; let projy = y1 + t * vy;
    let dx = px - projx; let dy = py - projy;
    (dx*dx + dy*dy, t)
}

/// Closest point on `e` to `p` and its distance. `None` for zero-length edges.
pub fn closest_on_edge(e: &Edge, p: Point) -> Option<(Point, f32)> {
    if e.len_sq() <= EPS_LEN * EPS_LEN {
        return None;
    }
    let (d2, t) = seg_distance_sq(p.x, p.y, e.x1, e.y1, e.x2, e.y2);
    let q = Point { x: e.x1 + t * (e.x2 - e.x1), y: e.y1 + t * (e.y2 - e.y1) };
    Some((q, d2.sqrt()))
}

pub fn dist(a: Point, b: Point) -> f32 {
    let dx = b.x - a.x; let dy = b.y - a.y;
    (dx*dx + dy*dy).sqrt()
}
