use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Point { x, y }
    }
}

/// Axis-aligned box. Width/height are only guaranteed positive after normalization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Rect { x, y, width, height }
    }

    pub fn center(&self) -> Point {
        Point { x: self.x + self.width / 2.0, y: self.y + self.height / 2.0 }
    }

    /// Closed-interval containment, used for territory hit-testing.
    pub fn contains(&self, p: Point) -> bool {
        let n = crate::geometry::shape::normalize_box(self.x, self.y, self.width, self.height);
        p.x >= n.x && p.x <= n.x + n.width && p.y >= n.y && p.y <= n.y + n.height
    }
}

/// Territory outline. Polygon and freehand points are flat `[x0, y0, x1, y1, ..]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Polygon {
        points: Vec<f32>,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Ellipse {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Freehand {
        points: Vec<f32>,
        #[serde(default)]
        closed: bool,
    },
}

impl Shape {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Shape::Polygon { .. } => "polygon",
            Shape::Rect { .. } => "rect",
            Shape::Ellipse { .. } => "ellipse",
            Shape::Freehand { .. } => "freehand",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextSettings {
    pub font_family: String,
    pub font_size: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Default for TextSettings {
    fn default() -> Self {
        TextSettings { font_family: "Arial".to_string(), font_size: 14.0, offset_x: 0.0, offset_y: 0.0 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Territory {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    pub shape: Shape,
    #[serde(default)]
    pub continent_id: Option<u32>,
    #[serde(default)]
    pub position: Point,
    #[serde(default)]
    pub connections: Vec<u32>,
    #[serde(default)]
    pub text: TextSettings,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Continent {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bonus: i32,
    #[serde(default = "default_continent_color")]
    pub color: String,
}

fn default_continent_color() -> String {
    "#cccccc".to_string()
}

/// Straight connection. Anchors are relative to each endpoint's shape bounds origin.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub from: u32,
    pub to: u32,
    pub from_point: Point,
    pub to_point: Point,
}

impl Connection {
    /// Unordered pair comparison.
    pub fn joins(&self, a: u32, b: u32) -> bool {
        (self.from == a && self.to == b) || (self.from == b && self.to == a)
    }

    pub fn touches(&self, id: u32) -> bool {
        self.from == id || self.to == id
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FreehandConnection {
    pub id: u32,
    pub from: u32,
    pub to: u32,
    pub points: Vec<f32>, // absolute
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZombieMarker {
    pub id: u32,
    pub value: i64,
    pub x: f32,
    pub y: f32,
    #[serde(default = "default_marker_font_size")]
    pub font_size: f32,
    #[serde(default = "default_marker_font")]
    pub font_family: String,
    #[serde(default = "default_marker_color")]
    pub color: String,
}

fn default_marker_font_size() -> f32 {
    24.0
}
fn default_marker_font() -> String {
    "Arial".to_string()
}
fn default_marker_color() -> String {
    "#000000".to_string()
}

/// Marker value used by arrows that are not attached to markers.
pub const UNATTACHED: i64 = -1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZombieArrow {
    pub id: u32,
    pub from: i64,
    pub to: i64,
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub color: String,
    pub stroke_width: f32,
    #[serde(default)]
    pub bidirectional: bool,
    #[serde(default)]
    pub offset_index: i32,
    /// Degrees about the midpoint.
    #[serde(default)]
    pub rotation: f32,
    pub length: f32,
    pub mid_x: f32,
    pub mid_y: f32,
    #[serde(default)]
    pub curvature: f32,
}

impl ZombieArrow {
    /// Arrow between two points; length and midpoint derived from the endpoints.
    pub fn between(from: i64, to: i64, a: Point, b: Point, color: &str, stroke_width: f32) -> Self {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        ZombieArrow {
            id: 0,
            from,
            to,
            x1: a.x,
            y1: a.y,
            x2: b.x,
            y2: b.y,
            color: color.to_string(),
            stroke_width,
            bidirectional: false,
            offset_index: 0,
            rotation: 0.0,
            length: (dx * dx + dy * dy).sqrt(),
            mid_x: 0.5 * (a.x + b.x),
            mid_y: 0.5 * (a.y + b.y),
            curvature: 0.0,
        }
    }
}

/// One boundary segment, generated on demand.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Edge {
    pub fn len_sq(&self) -> f32 {
        let dx = self.x2 - self.x1;
        let dy = self.y2 - self.y1;
        dx * dx + dy * dy
    }
}
