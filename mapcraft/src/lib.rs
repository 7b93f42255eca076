pub mod config;
pub mod error;
pub mod history;
pub mod interaction;
pub mod model;
pub mod geometry {
    pub mod limits;
    pub mod math;
    pub mod shape;
    pub mod tolerance;
}
pub mod algorithms {
    pub mod arrows;
    pub mod autopath;
    pub mod picking;
}
mod json;

pub use config::{ArrowConfig, EditorConfig};
pub use error::MapError;
pub use history::History;
pub use interaction::{ConnectMode, Interaction, PointerEvent, Preview, Tool, ToolContext, Viewport};

use geometry::shape::{anchor, normalize_box_rect, shape_bounds, translate};
use model::{
    Connection, Continent, FreehandConnection, Point, Shape, Territory, TextSettings, ZombieArrow,
    ZombieMarker, UNATTACHED,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Full editor document. Updated only through [`MapState::apply`], which returns a new value.
#[derive(Clone, Debug, PartialEq)]
pub struct MapState {
    pub(crate) territories: BTreeMap<u32, Territory>,
    pub(crate) continents: BTreeMap<u32, Continent>,
    pub(crate) connections: Vec<Connection>,
    pub(crate) freehand_connections: Vec<FreehandConnection>,
    pub(crate) markers: Vec<ZombieMarker>,
    pub(crate) arrows: Vec<ZombieArrow>,
    pub(crate) selection: Vec<u32>,
    pub(crate) next_id: u32,            // shared by every entity kind
    pub(crate) next_marker_value: i64,  // never reused within a session
    pub(crate) last_created: Option<u32>,
}

impl Default for MapState {
    fn default() -> Self {
        MapState {
            territories: BTreeMap::new(),
            continents: BTreeMap::new(),
            connections: Vec::new(),
            freehand_connections: Vec::new(),
            markers: Vec::new(),
            arrows: Vec::new(),
            selection: Vec::new(),
            next_id: 1,
            next_marker_value: 1,
            last_created: None,
        }
    }
}

/// Optional edits to a zombie arrow; `None` leaves the field alone.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrowPatch {
    pub rotation: Option<f32>,
    pub length: Option<f32>,
    pub curvature: Option<f32>,
    pub color: Option<String>,
    pub stroke_width: Option<f32>,
    pub bidirectional: Option<bool>,
}

/// Mutation intents. Anything referencing a missing id is a no-op.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    AddTerritory { shape: Shape },
    RenameTerritory { id: u32, name: String },
    SetTerritoryText { id: u32, text: TextSettings },
    MoveTerritory { id: u32, dx: f32, dy: f32 },
    ReshapeTerritory { id: u32, shape: Shape },
    DeleteTerritory { id: u32 },
    AssignContinent { territory: u32, continent: Option<u32> },
    AddContinent { name: String, bonus: i32, color: String },
    UpdateContinent {
        id: u32,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        bonus: Option<i32>,
        #[serde(default)]
        color: Option<String>,
    },
    DeleteContinent { id: u32 },
    AddConnection { from: u32, to: u32, from_point: Point, to_point: Point },
    RemoveConnection { a: u32, b: u32 },
    AddFreehandConnection { from: u32, to: u32, points: Vec<f32> },
    RemoveFreehandConnection { id: u32 },
    Select { ids: Vec<u32> },
    AddMarker { x: f32, y: f32 },
    MoveMarker { id: u32, x: f32, y: f32 },
    RemoveMarker { id: u32 },
    AddArrow { x1: f32, y1: f32, x2: f32, y2: f32, color: String, stroke_width: f32 },
    UpdateArrow { id: u32, patch: ArrowPatch },
    RemoveArrow { id: u32 },
    ReplaceArrows { arrows: Vec<ZombieArrow> },
    #[serde(skip)]
    ReplaceState { state: Box<MapState> },
}

impl Intent {
    /// Intents that do not touch the document proper and so are not undoable.
    pub fn is_transient(&self) -> bool {
        matches!(self, Intent::Select { .. })
    }
}

/// Outcome of [`MapState::apply_auto_path`]. An empty result is a warning, not an error.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AutoPathReport {
    pub arrows: usize,
    pub empty: bool,
}

fn finite_points(points: &[f32]) -> bool {
    points.iter().all(|v| geometry::limits::in_coord_bounds(*v))
}

fn shape_is_valid(shape: &Shape) -> bool {
    match shape {
        Shape::Polygon { points } | Shape::Freehand { points, .. } => {
            (6..=geometry::limits::MAX_POINTS_PER_SHAPE).contains(&points.len())
                && points.len() % 2 == 0
                && finite_points(points)
        }
        Shape::Rect { x, y, width, height } | Shape::Ellipse { x, y, width, height } => {
            finite_points(&[*x, *y, *width, *height])
        }
    }
}

impl MapState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn territory(&self, id: u32) -> Option<&Territory> {
        self.territories.get(&id)
    }
    pub fn territories(&self) -> impl Iterator<Item = &Territory> {
        self.territories.values()
    }
    pub fn territory_count(&self) -> usize {
        self.territories.len()
    }
    pub fn continent(&self, id: u32) -> Option<&Continent> {
        self.continents.get(&id)
    }
    pub fn continents(&self) -> impl Iterator<Item = &Continent> {
        self.continents.values()
    }
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }
    pub fn freehand_connections(&self) -> &[FreehandConnection] {
        &self.freehand_connections
    }
    pub fn markers(&self) -> &[ZombieMarker] {
        &self.markers
    }
    pub fn arrows(&self) -> &[ZombieArrow] {
        &self.arrows
    }
    pub fn selection(&self) -> &[u32] {
        &self.selection
    }
    /// Id of the entity created by the most recent intent, if it created one.
    pub fn last_created(&self) -> Option<u32> {
        self.last_created
    }

    /// Continent membership is not stored; it is a scan over territories.
    pub fn continent_members(&self, continent: u32) -> Vec<u32> {
        self.territories.values().filter(|t| t.continent_id == Some(continent)).map(|t| t.id).collect()
    }

    pub fn find_connection(&self, a: u32, b: u32) -> Option<&Connection> {
        self.connections.iter().find(|c| c.joins(a, b))
    }

    /// Connection endpoints in absolute coordinates, for the renderer.
    pub fn connection_endpoints(&self, c: &Connection) -> Option<(Point, Point)> {
        let a = normalize_box_rect(shape_bounds(&self.territories.get(&c.from)?.shape));
        let b = normalize_box_rect(shape_bounds(&self.territories.get(&c.to)?.shape));
        Some((
            Point { x: a.x + c.from_point.x, y: a.y + c.from_point.y },
            Point { x: b.x + c.to_point.x, y: b.y + c.to_point.y },
        ))
    }

    /// Copy-on-write update: `self` is never modified.
    pub fn apply(&self, intent: &Intent) -> MapState {
        let mut next = self.clone();
        next.last_created = None;
        next.reduce(intent);
        #[cfg(feature = "strict-invariants")]
        {
            if let Err(msg) = next.check_invariants() {
                log::error!("invariant broken after {intent:?}: {msg}");
            }
        }
        next
    }

    pub fn apply_all(&self, intents: &[Intent]) -> MapState {
        intents.iter().fold(self.clone(), |s, i| s.apply(i))
    }

    /// Parse `json`, lay out arrows against the placed markers and replace the arrow set.
    /// Malformed input leaves the state untouched.
    pub fn apply_auto_path(&self, json: &str, cfg: &ArrowConfig) -> Result<(MapState, AutoPathReport), MapError> {
        let adj = algorithms::autopath::parse_adjacency(json)?;
        let arrows = algorithms::autopath::generate(&self.markers, &adj, cfg);
        let report = AutoPathReport { arrows: arrows.len(), empty: arrows.is_empty() };
        Ok((self.apply(&Intent::ReplaceArrows { arrows }), report))
    }

    /// `None` once the id space is used up; the creating intent then does nothing.
    fn alloc_id(&mut self) -> Option<u32> {
        let id = self.next_id;
        let Some(next) = id.checked_add(1) else {
            log::warn!("id space exhausted at {id}");
            return None;
        };
        self.next_id = next;
        self.last_created = Some(id);
        Some(id)
    }

    fn reduce(&mut self, intent: &Intent) {
        match intent {
            Intent::AddTerritory { shape } => {
                if !shape_is_valid(shape) || self.territories.len() >= geometry::limits::MAX_TERRITORIES {
                    log::warn!("rejecting {} territory", shape.kind_name());
                    return;
                }
                let Some(id) = self.alloc_id() else { return };
                self.territories.insert(
                    id,
                    Territory {
                        id,
                        name: format!("Territory {id}"),
                        shape: shape.clone(),
                        continent_id: None,
                        position: anchor(shape),
                        connections: Vec::new(),
                        text: TextSettings::default(),
                    },
                );
            }
            Intent::RenameTerritory { id, name } => {
                if let Some(t) = self.territories.get_mut(id) {
                    t.name = name.clone();
                }
            }
            Intent::SetTerritoryText { id, text } => {
                if let Some(t) = self.territories.get_mut(id) {
                    t.text = text.clone();
                }
            }
            Intent::MoveTerritory { id, dx, dy } => self.move_territory(*id, *dx, *dy),
            Intent::ReshapeTerritory { id, shape } => self.reshape_territory(*id, shape),
            Intent::DeleteTerritory { id } => self.delete_territory(*id),
            Intent::AssignContinent { territory, continent } => {
                if continent.is_some_and(|c| !self.continents.contains_key(&c)) {
                    return;
                }
                if let Some(t) = self.territories.get_mut(territory) {
                    t.continent_id = *continent;
                }
            }
            Intent::AddContinent { name, bonus, color } => {
                if self.continents.len() >= geometry::limits::MAX_CONTINENTS {
                    return;
                }
                let Some(id) = self.alloc_id() else { return };
                self.continents.insert(id, Continent { id, name: name.clone(), bonus: *bonus, color: color.clone() });
            }
            Intent::UpdateContinent { id, name, bonus, color } => {
                if let Some(c) = self.continents.get_mut(id) {
                    if let Some(n) = name { c.name = n.clone(); }
                    if let Some(b) = bonus { c.bonus = *b; }
                    if let Some(col) = color { c.color = col.clone(); }
                }
            }
            Intent::DeleteContinent { id } => {
                if self.continents.remove(id).is_some() {
                    for t in self.territories.values_mut() {
                        if t.continent_id == Some(*id) {
                            t.continent_id = None;
                        }
                    }
                }
            }
            Intent::AddConnection { from, to, from_point, to_point } => {
                if from == to || !self.territories.contains_key(from) || !self.territories.contains_key(to) {
                    return;
                }
                if self.find_connection(*from, *to).is_some() {
                    return;
                }
                self.connections.push(Connection { from: *from, to: *to, from_point: *from_point, to_point: *to_point });
                self.link(*from, *to);
            }
            Intent::RemoveConnection { a, b } => {
                let before = self.connections.len();
                self.connections.retain(|c| !c.joins(*a, *b));
                if self.connections.len() != before {
                    self.relink(*a, *b);
                }
            }
            Intent::AddFreehandConnection { from, to, points } => {
                if from == to
                    || !(4..=geometry::limits::MAX_POINTS_PER_SHAPE).contains(&points.len())
                    || !finite_points(points)
                    || !self.territories.contains_key(from)
                    || !self.territories.contains_key(to)
                {
                    return;
                }
                let Some(id) = self.alloc_id() else { return };
                self.freehand_connections.push(FreehandConnection { id, from: *from, to: *to, points: points.clone() });
                self.link(*from, *to);
            }
            Intent::RemoveFreehandConnection { id } => {
                if let Some(ix) = self.freehand_connections.iter().position(|f| f.id == *id) {
                    let f = self.freehand_connections.remove(ix);
                    self.relink(f.from, f.to);
                }
            }
            Intent::Select { ids } => {
                self.selection = ids.iter().copied().filter(|id| self.territories.contains_key(id)).collect();
            }
            Intent::AddMarker { x, y } => {
                if !finite_points(&[*x, *y]) || self.markers.len() >= geometry::limits::MAX_MARKERS {
                    return;
                }
                let value = self.next_marker_value;
                let Some(next_value) = value.checked_add(1) else { return };
                let Some(id) = self.alloc_id() else { return };
                self.next_marker_value = next_value;
                self.markers.push(ZombieMarker {
                    id,
                    value,
                    x: *x,
                    y: *y,
                    font_size: 24.0,
                    font_family: "Arial".to_string(),
                    color: "#000000".to_string(),
                });
            }
            Intent::MoveMarker { id, x, y } => {
                if !finite_points(&[*x, *y]) {
                    return;
                }
                if let Some(m) = self.markers.iter_mut().find(|m| m.id == *id) {
                    m.x = *x;
                    m.y = *y;
                }
            }
            Intent::RemoveMarker { id } => self.markers.retain(|m| m.id != *id),
            Intent::AddArrow { x1, y1, x2, y2, color, stroke_width } => {
                if !finite_points(&[*x1, *y1, *x2, *y2]) || !geometry::limits::in_width_bounds(*stroke_width) {
                    return;
                }
                let mut a = ZombieArrow::between(
                    UNATTACHED,
                    UNATTACHED,
                    Point { x: *x1, y: *y1 },
                    Point { x: *x2, y: *y2 },
                    color,
                    *stroke_width,
                );
                let Some(id) = self.alloc_id() else { return };
                a.id = id;
                self.arrows.push(a);
            }
            Intent::UpdateArrow { id, patch } => {
                if let Some(a) = self.arrows.iter_mut().find(|a| a.id == *id) {
                    let in_range = |v: &f32| geometry::limits::in_coord_bounds(*v);
                    if let Some(r) = patch.rotation.filter(in_range) { a.rotation = r; }
                    if let Some(l) = patch.length.filter(|l| in_range(l) && *l >= 0.0) { a.length = l; }
                    if let Some(c) = patch.curvature.filter(in_range) { a.curvature = c; }
                    if let Some(c) = &patch.color { a.color = c.clone(); }
                    if let Some(w) = patch.stroke_width.filter(|w| geometry::limits::in_width_bounds(*w)) { a.stroke_width = w; }
                    if let Some(b) = patch.bidirectional { a.bidirectional = b; }
                }
            }
            Intent::RemoveArrow { id } => self.arrows.retain(|a| a.id != *id),
            Intent::ReplaceArrows { arrows } => {
                let n = arrows.len().min(geometry::limits::MAX_ARROWS);
                let Some(end) = self.next_id.checked_add(n as u32) else {
                    log::warn!("id space exhausted; keeping {} arrows", self.arrows.len());
                    return;
                };
                self.arrows = arrows
                    .iter()
                    .take(n)
                    .zip(self.next_id..end)
                    .map(|(a, id)| ZombieArrow { id, ..a.clone() })
                    .collect();
                self.next_id = end;
            }
            Intent::ReplaceState { state } => {
                *self = (**state).clone();
            }
        }
    }

    fn move_territory(&mut self, id: u32, dx: f32, dy: f32) {
        if !dx.is_finite() || !dy.is_finite() {
            return;
        }
        let Some(t) = self.territories.get_mut(&id) else { return };
        let moved = translate(&t.shape, dx, dy);
        if !shape_is_valid(&moved) {
            return;
        }
        t.shape = moved;
        t.position = Point { x: t.position.x + dx, y: t.position.y + dy };
        // straight anchors are bounds-relative and follow for free; freehand ones are absolute
        for f in &mut self.freehand_connections {
            let n = f.points.len();
            if n < 2 {
                continue;
            }
            if f.from == id {
                f.points[0] += dx;
                f.points[1] += dy;
            }
            if f.to == id {
                f.points[n - 2] += dx;
                f.points[n - 1] += dy;
            }
        }
    }

    fn reshape_territory(&mut self, id: u32, shape: &Shape) {
        if !shape_is_valid(shape) {
            return;
        }
        let Some(t) = self.territories.get_mut(&id) else { return };
        t.shape = shape.clone();
        t.position = anchor(shape);
        let b = normalize_box_rect(shape_bounds(shape));
        let clamp = |p: Point| Point { x: p.x.clamp(0.0, b.width), y: p.y.clamp(0.0, b.height) };
        for c in &mut self.connections {
            if c.from == id {
                c.from_point = clamp(c.from_point);
            }
            if c.to == id {
                c.to_point = clamp(c.to_point);
            }
        }
    }

    fn delete_territory(&mut self, id: u32) {
        if self.territories.remove(&id).is_none() {
            return;
        }
        for t in self.territories.values_mut() {
            t.connections.retain(|c| *c != id);
        }
        self.connections.retain(|c| !c.touches(id));
        self.freehand_connections.retain(|f| f.from != id && f.to != id);
        self.selection.retain(|s| *s != id);
    }

    fn link(&mut self, a: u32, b: u32) {
        for (x, y) in [(a, b), (b, a)] {
            if let Some(t) = self.territories.get_mut(&x) {
                if !t.connections.contains(&y) {
                    t.connections.push(y);
                }
            }
        }
    }

    /// Drop the adjacency between `a` and `b` unless another connection still joins them.
    fn relink(&mut self, a: u32, b: u32) {
        let still = self.connections.iter().any(|c| c.joins(a, b))
            || self.freehand_connections.iter().any(|f| (f.from == a && f.to == b) || (f.from == b && f.to == a));
        if still {
            return;
        }
        for (x, y) in [(a, b), (b, a)] {
            if let Some(t) = self.territories.get_mut(&x) {
                t.connections.retain(|c| *c != y);
            }
        }
    }

    /// Referential checks: symmetric adjacency, no dangling ids.
    pub fn check_invariants(&self) -> Result<(), String> {
        for t in self.territories.values() {
            if let Some(c) = t.continent_id {
                if !self.continents.contains_key(&c) {
                    return Err(format!("territory {} references missing continent {c}", t.id));
                }
            }
            for other in &t.connections {
                let Some(o) = self.territories.get(other) else {
                    return Err(format!("territory {} links missing territory {other}", t.id));
                };
                if !o.connections.contains(&t.id) {
                    return Err(format!("link {}->{other} is not symmetric", t.id));
                }
            }
        }
        for c in &self.connections {
            if c.from == c.to || !self.territories.contains_key(&c.from) || !self.territories.contains_key(&c.to) {
                return Err(format!("dangling connection {}-{}", c.from, c.to));
            }
        }
        for f in &self.freehand_connections {
            if !self.territories.contains_key(&f.from) || !self.territories.contains_key(&f.to) {
                return Err(format!("dangling freehand connection {}", f.id));
            }
        }
        Ok(())
    }
}
