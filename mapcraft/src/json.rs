use crate::error::MapError;
use crate::geometry::limits::{self, in_coord_bounds};
use crate::model::{
    Connection, Continent, FreehandConnection, Shape, Territory, ZombieArrow, ZombieMarker,
};
use crate::MapState;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const DOC_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
#[serde(default)]
struct Doc {
    version: u32,
    territories: Vec<Territory>,
    continents: Vec<Continent>,
    connections: Vec<Connection>,
    freehand_connections: Vec<FreehandConnection>,
    markers: Vec<ZombieMarker>,
    arrows: Vec<ZombieArrow>,
    next_marker_value: i64,
}

impl Default for Doc {
    fn default() -> Self {
        Doc {
            version: DOC_VERSION,
            territories: Vec::new(),
            continents: Vec::new(),
            connections: Vec::new(),
            freehand_connections: Vec::new(),
            markers: Vec::new(),
            arrows: Vec::new(),
            next_marker_value: 1,
        }
    }
}

pub fn to_json_impl(s: &MapState) -> Value {
    let doc = Doc {
        version: DOC_VERSION,
        territories: s.territories.values().cloned().collect(),
        continents: s.continents.values().cloned().collect(),
        connections: s.connections.clone(),
        freehand_connections: s.freehand_connections.clone(),
        markers: s.markers.clone(),
        arrows: s.arrows.clone(),
        next_marker_value: s.next_marker_value,
    };
    serde_json::to_value(doc).unwrap_or(Value::Null)
}

fn cap(what: &'static str, n: usize, max: usize) -> Result<(), MapError> {
    if n > max { Err(MapError::Limit { what, max }) } else { Ok(()) }
}

fn check_coords(what: &'static str, vals: &[f32]) -> Result<(), MapError> {
    if vals.iter().all(|v| in_coord_bounds(*v)) { Ok(()) } else { Err(MapError::NonFinite(what)) }
}

fn check_shape(shape: &Shape) -> Result<(), MapError> {
    match shape {
        Shape::Polygon { points } | Shape::Freehand { points, .. } => {
            cap("shape points", points.len(), limits::MAX_POINTS_PER_SHAPE)?;
            if points.len() % 2 != 0 {
                return Err(MapError::InvalidDocument("odd point list".into()));
            }
            check_coords("points", points)
        }
        Shape::Rect { x, y, width, height } | Shape::Ellipse { x, y, width, height } => {
            check_coords("box", &[*x, *y, *width, *height])
        }
    }
}

/// Parse a map document. Missing fields fall back to defaults; dangling references are repaired.
pub fn from_json_impl(v: Value) -> Result<MapState, MapError> {
    if !v.is_object() {
        return Err(MapError::InvalidDocument("root must be an object".into()));
    }
    let doc: Doc = serde_json::from_value(v)?;
    if doc.version > DOC_VERSION {
        return Err(MapError::InvalidDocument(format!("unsupported version {}", doc.version)));
    }
    cap("territories", doc.territories.len(), limits::MAX_TERRITORIES)?;
    cap("continents", doc.continents.len(), limits::MAX_CONTINENTS)?;
    cap("markers", doc.markers.len(), limits::MAX_MARKERS)?;
    cap("arrows", doc.arrows.len(), limits::MAX_ARROWS)?;
    for t in &doc.territories {
        check_shape(&t.shape)?;
    }
    for f in &doc.freehand_connections {
        cap("freehand points", f.points.len(), limits::MAX_POINTS_PER_SHAPE)?;
        check_coords("freehand points", &f.points)?;
    }
    for m in &doc.markers {
        check_coords("marker", &[m.x, m.y])?;
        if m.value.unsigned_abs() > limits::MAX_MARKER_VALUE as u64 {
            return Err(MapError::Limit { what: "marker value", max: limits::MAX_MARKER_VALUE as usize });
        }
    }
    let ids = doc
        .territories
        .iter()
        .map(|t| t.id)
        .chain(doc.continents.iter().map(|c| c.id))
        .chain(doc.freehand_connections.iter().map(|f| f.id))
        .chain(doc.markers.iter().map(|m| m.id))
        .chain(doc.arrows.iter().map(|a| a.id));
    for id in ids {
        cap("entity id", id as usize, limits::MAX_ENTITY_ID as usize)?;
    }
    for a in &doc.arrows {
        check_coords("arrow", &[a.x1, a.y1, a.x2, a.y2, a.mid_x, a.mid_y, a.length, a.rotation, a.curvature])?;
    }

    let mut s = MapState::new();
    s.continents = doc.continents.into_iter().map(|c| (c.id, c)).collect();
    let mut territories: BTreeMap<u32, Territory> = BTreeMap::new();
    for mut t in doc.territories {
        if t.continent_id.is_some_and(|c| !s.continents.contains_key(&c)) {
            t.continent_id = None;
        }
        territories.insert(t.id, t);
    }
    s.territories = territories;

    let exists = |id: &u32| s.territories.contains_key(id);
    // (a, b) and (b, a) are the same connection; the first record wins
    let mut connections: Vec<Connection> = Vec::new();
    for c in doc.connections {
        if c.from != c.to && exists(&c.from) && exists(&c.to) && !connections.iter().any(|k| k.joins(c.from, c.to)) {
            connections.push(c);
        }
    }
    s.connections = connections;
    s.freehand_connections = doc
        .freehand_connections
        .into_iter()
        .filter(|f| f.from != f.to && exists(&f.from) && exists(&f.to))
        .collect();

    // Adjacency: union of stored lists and connection records, then made symmetric
    let mut pairs: Vec<(u32, u32)> = Vec::new();
    for t in s.territories.values() {
        pairs.extend(t.connections.iter().filter(|o| **o != t.id && exists(o)).map(|o| (t.id, *o)));
    }
    pairs.extend(s.connections.iter().map(|c| (c.from, c.to)));
    pairs.extend(s.freehand_connections.iter().map(|f| (f.from, f.to)));
    for t in s.territories.values_mut() {
        t.connections.clear();
    }
    for (a, b) in pairs {
        s.link(a, b);
    }

    let max_marker = doc.markers.iter().map(|m| m.value).max().unwrap_or(0);
    s.next_marker_value = doc.next_marker_value.min(limits::MAX_MARKER_VALUE + 1).max(max_marker + 1).max(1);
    s.markers = doc.markers;
    s.arrows = doc.arrows;

    let max_id = s
        .territories
        .keys()
        .chain(s.continents.keys())
        .copied()
        .chain(s.freehand_connections.iter().map(|f| f.id))
        .chain(s.markers.iter().map(|m| m.id))
        .chain(s.arrows.iter().map(|a| a.id))
        .max()
        .unwrap_or(0);
    s.next_id = max_id.saturating_add(1);
    Ok(s)
}

impl MapState {
    pub fn to_json_value(&self) -> Value {
        to_json_impl(self)
    }

    pub fn from_json_value(v: Value) -> Result<MapState, MapError> {
        from_json_impl(v)
    }

    pub fn from_json_str(s: &str) -> Result<MapState, MapError> {
        from_json_impl(serde_json::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn minimal_document_gets_defaults() {
        let s = MapState::from_json_value(json!({
            "territories": [{"id": 4, "shape": {"type": "rect", "x": 0, "y": 0, "width": 10, "height": 10}}]
        }))
        .unwrap();
        let t = s.territory(4).unwrap();
        assert_eq!(t.text.font_family, "Arial");
        assert!(t.connections.is_empty());
        assert_eq!(s.next_id, 5);
    }

    #[test]
    fn import_repairs_references() {
        let s = MapState::from_json_value(json!({
            "territories": [
                {"id": 1, "shape": {"type": "rect", "x": 0, "y": 0, "width": 10, "height": 10}, "connections": [2, 9], "continent_id": 77},
                {"id": 2, "shape": {"type": "polygon", "points": [20, 0, 30, 0, 30, 10]}}
            ],
            "connections": [{"from": 1, "to": 5, "from_point": {"x": 0, "y": 0}, "to_point": {"x": 0, "y": 0}}]
        }))
        .unwrap();
        assert_eq!(s.territory(1).unwrap().connections, vec![2]);
        assert_eq!(s.territory(2).unwrap().connections, vec![1]);
        assert!(s.connections().is_empty());
        assert_eq!(s.territory(1).unwrap().continent_id, None);
        s.check_invariants().unwrap();
    }

    #[test]
    fn rejects_bad_documents() {
        assert!(matches!(MapState::from_json_value(json!([1])), Err(MapError::InvalidDocument(_))));
        assert!(matches!(MapState::from_json_value(json!({"version": 99})), Err(MapError::InvalidDocument(_))));
        assert!(matches!(
            MapState::from_json_value(json!({"territories": [{"id": 1, "shape": {"type": "polygon", "points": [0, 0, 1e30, 0, 1, 1]}}]})),
            Err(MapError::NonFinite(_))
        ));
        assert!(matches!(MapState::from_json_str("{"), Err(MapError::Json(_))));
    }

    #[test]
    fn marker_counter_survives_round_trip() {
        let s = MapState::new().apply_all(&[
            crate::Intent::AddMarker { x: 1.0, y: 1.0 },
            crate::Intent::AddMarker { x: 2.0, y: 2.0 },
        ]);
        let back = MapState::from_json_value(s.to_json_value()).unwrap();
        let back = back.apply(&crate::Intent::AddMarker { x: 3.0, y: 3.0 });
        assert_eq!(back.markers().last().unwrap().value, 3);
    }

    fn rect_territory(id: u64) -> Value {
        json!({"id": id, "shape": {"type": "rect", "x": 0, "y": 0, "width": 10, "height": 10}})
    }

    #[test]
    fn ids_near_the_integer_edge_are_rejected() {
        let r = MapState::from_json_value(json!({"territories": [rect_territory(1), rect_territory(u32::MAX as u64)]}));
        assert!(matches!(r, Err(MapError::Limit { what: "entity id", .. })));

        // the largest accepted id still leaves room to allocate
        let s = MapState::from_json_value(json!({"territories": [rect_territory(limits::MAX_ENTITY_ID as u64)]})).unwrap();
        let s = s.apply(&crate::Intent::AddMarker { x: 0.0, y: 0.0 });
        assert_eq!(s.last_created(), Some(limits::MAX_ENTITY_ID + 1));
    }

    #[test]
    fn out_of_range_marker_values_are_rejected() {
        let r = MapState::from_json_value(json!({"markers": [{"id": 1, "value": i64::MAX, "x": 0, "y": 0}]}));
        assert!(matches!(r, Err(MapError::Limit { what: "marker value", .. })));
        let r = MapState::from_json_value(json!({"next_marker_value": i64::MAX}));
        assert_eq!(r.unwrap().next_marker_value, limits::MAX_MARKER_VALUE + 1);
    }

    #[test]
    fn longest_drawable_outline_survives_round_trip() {
        let stroke = |n: usize| -> Vec<f32> {
            (0..n / 2).flat_map(|i| { let a = i as f32 * 0.001; [a.cos() * 100.0, a.sin() * 100.0] }).collect()
        };
        let at_limit = crate::Intent::AddTerritory {
            shape: Shape::Freehand { points: stroke(limits::MAX_POINTS_PER_SHAPE), closed: true },
        };
        let s = MapState::new().apply(&at_limit);
        assert_eq!(s.territory_count(), 1);
        let back = MapState::from_json_value(s.to_json_value()).unwrap();
        assert_eq!(back.to_json_value(), s.to_json_value());

        let over = crate::Intent::AddTerritory {
            shape: Shape::Freehand { points: stroke(limits::MAX_POINTS_PER_SHAPE + 2), closed: true },
        };
        assert_eq!(s.apply(&over).territory_count(), 1);
    }

    #[test]
    fn reversed_duplicate_connections_collapse_on_import() {
        let link = |from: u32, to: u32| json!({"from": from, "to": to, "from_point": {"x": 1, "y": 1}, "to_point": {"x": 2, "y": 2}});
        let s = MapState::from_json_value(json!({
            "territories": [rect_territory(1), rect_territory(2)],
            "connections": [link(1, 2), link(2, 1)]
        }))
        .unwrap();
        assert_eq!(s.connections().len(), 1);
        assert_eq!((s.connections()[0].from, s.connections()[0].to), (1, 2));
        s.check_invariants().unwrap();
    }
}
