//! Pointer-driven drawing, selection and connection tools.
//!
//! [`Interaction::handle`] is a pure step function: it takes the current gesture,
//! a read-only [`ToolContext`] and one [`PointerEvent`], and returns the next
//! gesture together with the [`Intent`]s to dispatch. Only one gesture is live at
//! a time; switching tools or sending [`PointerEvent::Cancel`] drops it without
//! touching the document.

use crate::algorithms::picking::{marquee_select, nearest_edge, territory_at};
use crate::config::EditorConfig;
use crate::geometry::math::dist;
use crate::geometry::shape::{normalize_box, normalize_box_rect, shape_bounds};
use crate::model::{Point, Rect, Shape};
use crate::{Intent, MapState};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectMode {
    Straight,
    Freehand,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    Select,
    /// Freehand territory outline.
    Draw,
    Polygon,
    Rect,
    Ellipse,
    /// Polygon whose vertices snap to existing territory edges.
    Connected,
    Connect(ConnectMode),
}

impl Tool {
    /// Parse the host's tool name; `mode` only matters for `connect`.
    pub fn from_name(name: &str, mode: Option<&str>) -> Option<Tool> {
        Some(match name {
            "select" => Tool::Select,
            "draw" | "freehand" => Tool::Draw,
            "polygon" => Tool::Polygon,
            "rect" => Tool::Rect,
            "ellipse" => Tool::Ellipse,
            "connected" => Tool::Connected,
            "connect" => match mode.unwrap_or("straight") {
                "straight" => Tool::Connect(ConnectMode::Straight),
                "freehand" => Tool::Connect(ConnectMode::Freehand),
                _ => return None,
            },
            _ => return None,
        })
    }
}

/// Pan/zoom of the stage. Events arrive in screen space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub scale: f32,
    pub x: f32,
    pub y: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport { scale: 1.0, x: 0.0, y: 0.0 }
    }
}

impl Viewport {
    pub fn to_canvas(&self, p: Point) -> Point {
        let s = if self.scale.is_finite() && self.scale > 0.0 { self.scale } else { 1.0 };
        Point { x: (p.x - self.x) / s, y: (p.y - self.y) / s }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    Down { x: f32, y: f32 },
    Move { x: f32, y: f32 },
    Up { x: f32, y: f32 },
    Click { x: f32, y: f32 },
    DoubleClick { x: f32, y: f32 },
    Cancel,
}

impl PointerEvent {
    fn point(&self) -> Option<Point> {
        match *self {
            PointerEvent::Down { x, y }
            | PointerEvent::Move { x, y }
            | PointerEvent::Up { x, y }
            | PointerEvent::Click { x, y }
            | PointerEvent::DoubleClick { x, y } => Some(Point { x, y }),
            PointerEvent::Cancel => None,
        }
    }
}

/// Read-only inputs for one step.
#[derive(Clone, Copy, Debug)]
pub struct ToolContext<'a> {
    pub state: &'a MapState,
    pub config: &'a EditorConfig,
    pub viewport: Viewport,
    pub tool: Tool,
}

#[derive(Clone, Debug, Default, PartialEq)]
enum Gesture {
    #[default]
    Idle,
    Marquee { start: Point, current: Point },
    Polygon { points: Vec<f32>, cursor: Option<Point> },
    Box { anchor: Point, width: f32, height: f32 },
    Stroke { points: Vec<f32> },
    PendingLink { from: u32, local: Point, at: Point },
    LinkStroke { from: u32, points: Vec<f32> },
}

/// Transient geometry for the renderer.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Preview {
    None,
    Marquee { rect: Rect },
    Polygon { points: Vec<f32>, segment: Option<(Point, Point)> },
    Shape { shape: Shape },
    Stroke { points: Vec<f32> },
    PendingConnection { from: u32, at: Point },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Interaction {
    tool: Tool,
    gesture: Gesture,
}

impl Default for Interaction {
    fn default() -> Self {
        Interaction::new(Tool::Select)
    }
}

impl Interaction {
    pub fn new(tool: Tool) -> Self {
        Interaction { tool, gesture: Gesture::Idle }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn is_idle(&self) -> bool {
        self.gesture == Gesture::Idle
    }

    pub fn handle(&self, ctx: &ToolContext<'_>, event: PointerEvent) -> (Interaction, Vec<Intent>) {
        let mut next = if ctx.tool == self.tool { self.clone() } else { Interaction::new(ctx.tool) };
        let intents = match event.point() {
            None => {
                next.gesture = Gesture::Idle;
                Vec::new()
            }
            Some(screen) => {
                let p = ctx.viewport.to_canvas(screen);
                if !p.x.is_finite() || !p.y.is_finite() {
                    return (next, Vec::new());
                }
                next.step(ctx, event, p)
            }
        };
        (next, intents)
    }

    fn step(&mut self, ctx: &ToolContext<'_>, event: PointerEvent, p: Point) -> Vec<Intent> {
        use PointerEvent as E;
        match self.tool {
            Tool::Select => self.select_step(ctx, event, p),
            Tool::Polygon | Tool::Connected => {
                let q = if self.tool == Tool::Connected { snap(ctx, p) } else { p };
                match event {
                    E::Click { .. } => self.polygon_click(ctx, q),
                    E::Move { .. } => {
                        if let Gesture::Polygon { cursor, .. } = &mut self.gesture {
                            *cursor = Some(q);
                        }
                        Vec::new()
                    }
                    E::DoubleClick { .. } => self.polygon_commit(),
                    _ => Vec::new(),
                }
            }
            Tool::Rect | Tool::Ellipse => match (event, &mut self.gesture) {
                (E::Down { .. }, _) => {
                    self.gesture = Gesture::Box { anchor: p, width: 0.0, height: 0.0 };
                    Vec::new()
                }
                (E::Move { .. }, Gesture::Box { anchor, width, height }) => {
                    *width = p.x - anchor.x;
                    *height = p.y - anchor.y;
                    Vec::new()
                }
                (E::Up { .. }, Gesture::Box { anchor, .. }) => {
                    let (w, h) = (p.x - anchor.x, p.y - anchor.y);
                    let anchor = *anchor;
                    self.gesture = Gesture::Idle;
                    let min = ctx.config.min_drag_size;
                    if w.abs() <= min || h.abs() <= min {
                        log::debug!("discarding {w}x{h} drag below {min}px");
                        return Vec::new();
                    }
                    let b = normalize_box(anchor.x, anchor.y, w, h);
                    let shape = if self.tool == Tool::Rect {
                        Shape::Rect { x: b.x, y: b.y, width: b.width, height: b.height }
                    } else {
                        Shape::Ellipse { x: b.x, y: b.y, width: b.width, height: b.height }
                    };
                    vec![Intent::AddTerritory { shape }]
                }
                _ => Vec::new(),
            },
            Tool::Draw => match (event, &mut self.gesture) {
                (E::Down { .. }, _) => {
                    self.gesture = Gesture::Stroke { points: vec![p.x, p.y] };
                    Vec::new()
                }
                (E::Move { .. }, Gesture::Stroke { points }) => {
                    points.extend([p.x, p.y]);
                    Vec::new()
                }
                (E::Up { .. }, Gesture::Stroke { points }) => {
                    let mut points = std::mem::take(points);
                    self.gesture = Gesture::Idle;
                    if points.len() < 6 {
                        return Vec::new();
                    }
                    points.extend([points[0], points[1]]);
                    log::debug!("freehand territory with {} points", points.len() / 2);
                    vec![Intent::AddTerritory { shape: Shape::Freehand { points, closed: true } }]
                }
                _ => Vec::new(),
            },
            Tool::Connect(ConnectMode::Straight) => match event {
                E::Click { .. } => self.straight_click(ctx, p),
                _ => Vec::new(),
            },
            Tool::Connect(ConnectMode::Freehand) => match (event, &mut self.gesture) {
                (E::Down { .. }, _) => {
                    self.gesture = match territory_at(ctx.state.territories(), p) {
                        Some(from) => Gesture::LinkStroke { from, points: vec![p.x, p.y] },
                        None => Gesture::Idle,
                    };
                    Vec::new()
                }
                (E::Move { .. }, Gesture::LinkStroke { points, .. }) => {
                    points.extend([p.x, p.y]);
                    Vec::new()
                }
                (E::Up { .. }, Gesture::LinkStroke { from, points }) => {
                    let (from, points) = (*from, std::mem::take(points));
                    self.gesture = Gesture::Idle;
                    match territory_at(ctx.state.territories(), p) {
                        Some(to) if to != from && points.len() >= 4 => {
                            vec![Intent::AddFreehandConnection { from, to, points }]
                        }
                        _ => Vec::new(),
                    }
                }
                _ => Vec::new(),
            },
        }
    }

    fn select_step(&mut self, ctx: &ToolContext<'_>, event: PointerEvent, p: Point) -> Vec<Intent> {
        match (event, &mut self.gesture) {
            (PointerEvent::Down { .. }, _) => {
                // a press on a shape belongs to the shape's own drag handling
                self.gesture = match territory_at(ctx.state.territories(), p) {
                    Some(_) => Gesture::Idle,
                    None => Gesture::Marquee { start: p, current: p },
                };
                Vec::new()
            }
            (PointerEvent::Move { .. }, Gesture::Marquee { current, .. }) => {
                *current = p;
                Vec::new()
            }
            (PointerEvent::Up { .. }, Gesture::Marquee { start, .. }) => {
                let rect = Rect::new(start.x, start.y, p.x - start.x, p.y - start.y);
                self.gesture = Gesture::Idle;
                vec![Intent::Select { ids: marquee_select(ctx.state.territories(), rect) }]
            }
            (PointerEvent::Click { .. }, Gesture::Idle) => match territory_at(ctx.state.territories(), p) {
                Some(id) => vec![Intent::Select { ids: vec![id] }],
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    fn polygon_click(&mut self, ctx: &ToolContext<'_>, q: Point) -> Vec<Intent> {
        match &mut self.gesture {
            Gesture::Polygon { points, cursor } => {
                let first = Point { x: points[0], y: points[1] };
                if points.len() >= 6 && dist(first, q) <= ctx.config.close_distance {
                    return self.polygon_commit();
                }
                points.extend([q.x, q.y]);
                *cursor = Some(q);
            }
            _ => self.gesture = Gesture::Polygon { points: vec![q.x, q.y], cursor: Some(q) },
        }
        Vec::new()
    }

    fn polygon_commit(&mut self) -> Vec<Intent> {
        let Gesture::Polygon { points, .. } = &self.gesture else { return Vec::new() };
        let points = collapse_duplicates(points);
        if points.len() < 6 {
            return Vec::new();
        }
        self.gesture = Gesture::Idle;
        log::debug!("polygon territory with {} vertices", points.len() / 2);
        vec![Intent::AddTerritory { shape: Shape::Polygon { points } }]
    }

    fn straight_click(&mut self, ctx: &ToolContext<'_>, p: Point) -> Vec<Intent> {
        let hit = territory_at(ctx.state.territories(), p);
        let local = |id: u32| {
            ctx.state.territory(id).map(|t| {
                let b = normalize_box_rect(shape_bounds(&t.shape));
                Point { x: p.x - b.x, y: p.y - b.y }
            })
        };
        match (&self.gesture, hit) {
            (Gesture::PendingLink { from, local: from_point, .. }, Some(to)) if to != *from => {
                let intent = local(to).map(|to_point| Intent::AddConnection {
                    from: *from,
                    to,
                    from_point: *from_point,
                    to_point,
                });
                self.gesture = Gesture::Idle;
                intent.into_iter().collect()
            }
            (Gesture::PendingLink { .. }, _) => {
                self.gesture = Gesture::Idle;
                Vec::new()
            }
            (_, Some(from)) => {
                if let Some(l) = local(from) {
                    self.gesture = Gesture::PendingLink { from, local: l, at: p };
                }
                Vec::new()
            }
            (_, None) => Vec::new(),
        }
    }

    pub fn preview(&self) -> Preview {
        match &self.gesture {
            Gesture::Idle => Preview::None,
            Gesture::Marquee { start, current } => Preview::Marquee {
                rect: normalize_box(start.x, start.y, current.x - start.x, current.y - start.y),
            },
            Gesture::Polygon { points, cursor } => {
                let n = points.len();
                let segment = cursor.map(|c| (Point { x: points[n - 2], y: points[n - 1] }, c));
                Preview::Polygon { points: points.clone(), segment }
            }
            Gesture::Box { anchor, width, height } => {
                let (x, y, width, height) = (anchor.x, anchor.y, *width, *height);
                Preview::Shape {
                    shape: if self.tool == Tool::Ellipse {
                        Shape::Ellipse { x, y, width, height }
                    } else {
                        Shape::Rect { x, y, width, height }
                    },
                }
            }
            Gesture::Stroke { points } | Gesture::LinkStroke { points, .. } => {
                Preview::Stroke { points: points.clone() }
            }
            Gesture::PendingLink { from, at, .. } => Preview::PendingConnection { from: *from, at: *at },
        }
    }
}

fn snap(ctx: &ToolContext<'_>, p: Point) -> Point {
    nearest_edge(ctx.state.territories(), p, ctx.config.snap_distance).map_or(p, |hit| hit.point)
}

/// Drop consecutive repeated vertices (double-click lands on the last click) and a closing repeat.
fn collapse_duplicates(points: &[f32]) -> Vec<f32> {
    let mut out: Vec<f32> = Vec::with_capacity(points.len());
    for p in points.chunks_exact(2) {
        let n = out.len();
        if n >= 2 && out[n - 2] == p[0] && out[n - 1] == p[1] {
            continue;
        }
        out.extend_from_slice(p);
    }
    let n = out.len();
    if n >= 4 && out[0] == out[n - 2] && out[1] == out[n - 1] {
        out.truncate(n - 2);
    }
    out
}
