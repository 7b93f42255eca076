use crate::geometry::math::closest_on_edge;
use crate::geometry::shape::{edges, normalize_box_rect, shape_bounds};
use crate::model::{Edge, Point, Rect, Territory};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EdgeHit {
    pub territory: u32,
    pub edge: Edge,
    pub point: Point,
    pub distance: f32,
}

/// Open-interval overlap: rectangles that only touch do not intersect.
pub fn rects_intersect(a: &Rect, b: &Rect) -> bool {
    a.x < b.x + b.width && a.x + a.width > b.x && a.y < b.y + b.height && a.y + a.height > b.y
}

/// Closest point on any territory edge, if within `snap_distance`. Linear scan over all edges.
pub fn nearest_edge<'a, I>(territories: I, p: Point, snap_distance: f32) -> Option<EdgeHit>
where
    I: IntoIterator<Item = &'a Territory>,
{
    let mut best: Option<EdgeHit> = None;
    for t in territories {
        for e in edges(&t.shape) {
            let Some((q, d)) = closest_on_edge(&e, p) else { continue };
            if best.map_or(true, |b| d < b.distance) {
                best = Some(EdgeHit { territory: t.id, edge: e, point: q, distance: d });
            }
        }
    }
    best.filter(|b| b.distance <= snap_distance)
}

/// Territories whose shape bounds overlap the marquee. The marquee may have been dragged in any direction.
pub fn marquee_select<'a, I>(territories: I, marquee: Rect) -> Vec<u32>
where
    I: IntoIterator<Item = &'a Territory>,
{
    let m = normalize_box_rect(marquee);
    territories
        .into_iter()
        .filter(|t| rects_intersect(&normalize_box_rect(shape_bounds(&t.shape)), &m))
        .map(|t| t.id)
        .collect()
}

/// First territory whose bounds contain `p`. Bounds, not exact outline.
pub fn territory_at<'a, I>(territories: I, p: Point) -> Option<u32>
where
    I: IntoIterator<Item = &'a Territory>,
{
    territories.into_iter().find(|t| shape_bounds(&t.shape).contains(p)).map(|t| t.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Shape;

    fn terr(id: u32, shape: Shape) -> Territory {
        Territory {
            id,
            name: format!("T{id}"),
            shape,
            continent_id: None,
            position: Point::default(),
            connections: vec![],
            text: Default::default(),
        }
    }

    #[test]
    fn intersect_open_interval() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rects_intersect(&a, &Rect::new(5.0, 5.0, 10.0, 10.0)));
        assert!(!rects_intersect(&a, &Rect::new(20.0, 20.0, 5.0, 5.0)));
        assert!(!rects_intersect(&a, &Rect::new(10.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn nearest_edge_snaps_to_top_of_square() {
        let ts = vec![terr(1, Shape::Rect { x: 0.0, y: 0.0, width: 10.0, height: 10.0 })];
        let hit = nearest_edge(&ts, Point::new(5.0, -2.0), 10.0).expect("hit");
        assert_eq!(hit.edge, Edge { x1: 0.0, y1: 0.0, x2: 10.0, y2: 0.0 });
        assert!((hit.distance - 2.0).abs() < 1e-4);
        assert_eq!(hit.point, Point::new(5.0, 0.0));
        assert!(nearest_edge(&ts, Point::new(5.0, -20.0), 10.0).is_none());
    }

    #[test]
    fn nearest_edge_skips_zero_length_edges() {
        let ts = vec![terr(1, Shape::Polygon { points: vec![3.0, 3.0, 3.0, 3.0] })];
        assert!(nearest_edge(&ts, Point::new(3.0, 3.0), 10.0).is_none());
    }

    #[test]
    fn nearest_edge_prefers_closer_territory() {
        let ts = vec![
            terr(1, Shape::Rect { x: 0.0, y: 0.0, width: 10.0, height: 10.0 }),
            terr(2, Shape::Rect { x: 14.0, y: 0.0, width: 10.0, height: 10.0 }),
        ];
        let hit = nearest_edge(&ts, Point::new(13.0, 5.0), 10.0).unwrap();
        assert_eq!(hit.territory, 2);
        assert!((hit.distance - 1.0).abs() < 1e-4);
    }

    #[test]
    fn marquee_uses_bounds_not_outline() {
        // L-shaped polygon; marquee sits in the empty notch but inside the bounds
        let l = terr(1, Shape::Polygon { points: vec![0.0, 0.0, 10.0, 0.0, 10.0, 2.0, 2.0, 2.0, 2.0, 10.0, 0.0, 10.0] });
        let far = terr(2, Shape::Ellipse { x: 50.0, y: 50.0, width: 10.0, height: 10.0 });
        let ts = vec![l, far];
        assert_eq!(marquee_select(&ts, Rect::new(6.0, 6.0, 2.0, 2.0)), vec![1]);
        // dragged up-left
        assert_eq!(marquee_select(&ts, Rect::new(65.0, 65.0, -10.0, -10.0)), vec![2]);
    }

    #[test]
    fn hit_test_by_bounds() {
        let ts = vec![terr(7, Shape::Rect { x: 10.0, y: 10.0, width: -5.0, height: 5.0 })];
        assert_eq!(territory_at(&ts, Point::new(7.0, 12.0)), Some(7));
        assert_eq!(territory_at(&ts, Point::new(11.0, 12.0)), None);
    }
}
