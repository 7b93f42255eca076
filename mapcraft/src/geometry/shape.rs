use super::tolerance::ELLIPSE_SEGMENTS;
use crate::error::MapError;
use crate::model::{Edge, Point, Rect, Shape, Territory};

/// Bounding box of a flat `[x0, y0, x1, y1, ..]` list. A trailing odd coordinate is ignored.
pub fn bounds(points: &[f32]) -> Result<Rect, MapError> {
    let mut pairs = points.chunks_exact(2);
    let first = pairs.next().ok_or(MapError::EmptyInput)?;
    let (mut minx, mut miny, mut maxx, mut maxy) = (first[0], first[1], first[0], first[1]);
    for p in pairs {
        minx = minx.min(p[0]); maxx = maxx.max(p[0]);
        miny = miny.min(p[1]); maxy = maxy.max(p[1]);
    }
    Ok(Rect { x: minx, y: miny, width: maxx - minx, height: maxy - miny })
}

/// Area centroid by the shoelace formula. Zero area falls back to the first vertex.
pub fn centroid(points: &[f32]) -> Point {
    let n = points.len() / 2;
    if n == 0 {
        return Point::default();
    }
    // f64 accumulators; long freehand outlines lose too much in f32
    let (mut area2, mut cx, mut cy) = (0.0f64, 0.0f64, 0.0f64);
    for i in 0..n {
        let j = (i + 1) % n;
        let (xi, yi) = (points[2 * i] as f64, points[2 * i + 1] as f64);
        let (xj, yj) = (points[2 * j] as f64, points[2 * j + 1] as f64);
        let a = xi * yj - xj * yi;
        area2 += a;
        cx += (xi + xj) * a;
        cy += (yi + yj) * a;
    }
    if area2 == 0.0 {
        return Point { x: points[0], y: points[1] };
    }
    // area = area2 / 2, so 6 * area = 3 * area2
    Point { x: (cx / (3.0 * area2)) as f32, y: (cy / (3.0 * area2)) as f32 }
}

/// Boundary segments. Rect edges come out as top, right, bottom, left.
pub fn edges(shape: &Shape) -> Vec<Edge> {
    match shape {
        Shape::Polygon { points } | Shape::Freehand { points, .. } => polyline_ring(points),
        Shape::Rect { x, y, width, height } => {
            let (x, y, r, b) = (*x, *y, x + width, y + height);
            vec![
                Edge { x1: x, y1: y, x2: r, y2: y },
                Edge { x1: r, y1: y, x2: r, y2: b },
                Edge { x1: r, y1: b, x2: x, y2: b },
                Edge { x1: x, y1: b, x2: x, y2: y },
            ]
        }
        Shape::Ellipse { x, y, width, height } => {
            let c = Rect::new(*x, *y, *width, *height).center();
            let (rx, ry) = (width.abs() / 2.0, height.abs() / 2.0);
            let mut ring = Vec::with_capacity(ELLIPSE_SEGMENTS * 2);
            for i in 0..ELLIPSE_SEGMENTS {
                let a = std::f32::consts::TAU * i as f32 / ELLIPSE_SEGMENTS as f32;
                ring.push(c.x + rx * a.cos());
                ring.push(c.y + ry * a.sin());
            }
            polyline_ring(&ring)
        }
    }
}

fn polyline_ring(points: &[f32]) -> Vec<Edge> {
    let n = points.len() / 2;
    (0..n)
        .map(|i| {
            let j = (i + 1) % n;
            Edge { x1: points[2 * i], y1: points[2 * i + 1], x2: points[2 * j], y2: points[2 * j + 1] }
        })
        .collect()
}

/// Bounds used for hit-testing and marquee selection.
pub fn shape_bounds(shape: &Shape) -> Rect {
    match shape {
        Shape::Polygon { points } | Shape::Freehand { points, .. } => bounds(points).unwrap_or_default(),
        Shape::Rect { x, y, width, height } | Shape::Ellipse { x, y, width, height } => {
            Rect::new(*x, *y, *width, *height)
        }
    }
}

pub fn territory_center(t: &Territory) -> Point {
    match &t.shape {
        Shape::Polygon { points } | Shape::Freehand { points, .. } => centroid(points),
        Shape::Rect { .. } | Shape::Ellipse { .. } => shape_bounds(&t.shape).center(),
    }
}

/// Top-left anchor tracked as `Territory::position`.
pub fn anchor(shape: &Shape) -> Point {
    let b = normalize_box_rect(shape_bounds(shape));
    Point { x: b.x, y: b.y }
}

pub fn translate(shape: &Shape, dx: f32, dy: f32) -> Shape {
    fn shift(points: &[f32], dx: f32, dy: f32) -> Vec<f32> {
        points.iter().enumerate().map(|(i, v)| if i % 2 == 0 { v + dx } else { v + dy }).collect()
    }
    match shape {
        Shape::Polygon { points } => Shape::Polygon { points: shift(points, dx, dy) },
        Shape::Freehand { points, closed } => Shape::Freehand { points: shift(points, dx, dy), closed: *closed },
        Shape::Rect { x, y, width, height } => Shape::Rect { x: x + dx, y: y + dy, width: *width, height: *height },
        Shape::Ellipse { x, y, width, height } => {
            Shape::Ellipse { x: x + dx, y: y + dy, width: *width, height: *height }
        }
    }
}

/// Positive width/height with the origin moved to the top-left corner.
pub fn normalize_box(x: f32, y: f32, width: f32, height: f32) -> Rect {
    Rect {
        x: if width < 0.0 { x + width } else { x },
        y: if height < 0.0 { y + height } else { y },
        width: width.abs(),
        height: height.abs(),
    }
}

pub fn normalize_box_rect(r: Rect) -> Rect {
    normalize_box(r.x, r.y, r.width, r.height)
}
