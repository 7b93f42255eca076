use crate::interop::{coords, ids, obj, to_js};
use crate::{error, logger, Editor};
use js_sys::{Array, Float32Array};
use mapcraft::algorithms::{arrows, picking};
use mapcraft::geometry::shape;
use mapcraft::model::Point;
use mapcraft::{EditorConfig, Intent, MapState, PointerEvent, Tool, Viewport};
use wasm_bindgen::prelude::*;
type JsValue = wasm_bindgen::JsValue;

#[wasm_bindgen]
pub fn set_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Route `log` output to the browser console. `level` is one of off/error/warn/info/debug/trace.
#[wasm_bindgen]
pub fn init_logging(level: &str) -> bool {
    match logger::parse_level(level) {
        Some(l) => { logger::init(l); true }
        None => false,
    }
}

// Stateless geometry helpers

#[wasm_bindgen]
pub fn bounds_res(points: &Float32Array) -> JsValue {
    let pts = points.to_vec();
    if pts.iter().any(|v| !v.is_finite()) {
        return error::non_finite("points");
    }
    match shape::bounds(&pts) {
        Ok(r) => error::ok(to_js(&r)),
        Err(e) => error::from_map_error(&e),
    }
}

#[wasm_bindgen]
pub fn centroid(points: &Float32Array) -> Float32Array {
    let c = shape::centroid(&points.to_vec());
    coords(&[c.x, c.y])
}

#[wasm_bindgen]
pub fn arrow_offset(index: i32) -> f32 {
    arrows::arrow_offset(index)
}

/// `[c1x, c1y, c2x, c2y]` for a bowed arrow from (x1, y1) to (x2, y2).
#[wasm_bindgen]
pub fn control_points(x1: f32, y1: f32, x2: f32, y2: f32, curvature: f32) -> Float32Array {
    let (c1, c2) = arrows::control_points(x1, y1, x2, y2, curvature);
    coords(&[c1.x, c1.y, c2.x, c2.y])
}

/// `(kind, id)` of the first entity an intent refers to that does not exist.
fn missing_ref(s: &MapState, intent: &Intent) -> Option<(&'static str, u32)> {
    let territory = |id: u32| s.territory(id).is_none().then_some(("territory", id));
    let continent = |id: u32| s.continent(id).is_none().then_some(("continent", id));
    let marker = |id: u32| (!s.markers().iter().any(|m| m.id == id)).then_some(("marker", id));
    let arrow = |id: u32| (!s.arrows().iter().any(|a| a.id == id)).then_some(("arrow", id));
    match intent {
        Intent::RenameTerritory { id, .. }
        | Intent::SetTerritoryText { id, .. }
        | Intent::MoveTerritory { id, .. }
        | Intent::ReshapeTerritory { id, .. }
        | Intent::DeleteTerritory { id } => territory(*id),
        Intent::AssignContinent { territory: t, continent: c } => territory(*t).or_else(|| c.and_then(continent)),
        Intent::UpdateContinent { id, .. } | Intent::DeleteContinent { id } => continent(*id),
        Intent::AddConnection { from, to, .. } | Intent::AddFreehandConnection { from, to, .. } => {
            territory(*from).or_else(|| territory(*to))
        }
        Intent::RemoveConnection { a, b } => territory(*a).or_else(|| territory(*b)),
        Intent::RemoveFreehandConnection { id } => {
            (!s.freehand_connections().iter().any(|f| f.id == *id)).then_some(("freehand_connection", *id))
        }
        Intent::Select { ids } => ids.iter().find_map(|id| territory(*id)),
        Intent::MoveMarker { id, .. } | Intent::RemoveMarker { id } => marker(*id),
        Intent::UpdateArrow { id, .. } | Intent::RemoveArrow { id } => arrow(*id),
        _ => None,
    }
}

fn parse_intents(v: JsValue) -> Result<Vec<Intent>, JsValue> {
    let raw = serde_wasm_bindgen::from_value::<serde_json::Value>(v).map_err(|e| error::parse_error(e.to_string()))?;
    let parsed = if raw.is_array() {
        serde_json::from_value::<Vec<Intent>>(raw)
    } else {
        serde_json::from_value::<Intent>(raw).map(|i| vec![i])
    };
    parsed.map_err(|e| error::parse_error(e.to_string()))
}

fn tool_name(t: Tool) -> &'static str {
    match t {
        Tool::Select => "select",
        Tool::Draw => "draw",
        Tool::Polygon => "polygon",
        Tool::Rect => "rect",
        Tool::Ellipse => "ellipse",
        Tool::Connected => "connected",
        Tool::Connect(_) => "connect",
    }
}

#[wasm_bindgen]
impl Editor {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Editor {
        crate::Editor::rs_new()
    }

    // Tools and viewport
    pub fn set_tool(&mut self, name: &str, mode: Option<String>) -> bool {
        match Tool::from_name(name, mode.as_deref()) {
            Some(t) => { self.tool = t; true }
            None => false,
        }
    }
    pub fn set_tool_res(&mut self, name: &str, mode: Option<String>) -> JsValue {
        if self.set_tool(name, mode.clone()) {
            error::ok(JsValue::from_str(tool_name(self.tool)))
        } else {
            error::invalid_tool(name, mode.as_deref())
        }
    }
    pub fn tool(&self) -> String {
        tool_name(self.tool).to_string()
    }
    pub fn set_viewport(&mut self, scale: f32, x: f32, y: f32) -> bool {
        if !(scale.is_finite() && scale > 0.0 && x.is_finite() && y.is_finite()) {
            return false;
        }
        self.viewport = Viewport { scale, x, y };
        true
    }
    pub fn set_viewport_res(&mut self, scale: f32, x: f32, y: f32) -> JsValue {
        for (name, v) in [("scale", scale), ("x", x), ("y", y)] {
            if !v.is_finite() {
                return error::non_finite(name);
            }
        }
        if scale <= 0.0 {
            return error::out_of_range("scale", f32::MIN_POSITIVE, f32::MAX, scale);
        }
        error::ok(JsValue::from_bool(self.set_viewport(scale, x, y)))
    }

    // Pointer events. Each returns the intents the tool committed (usually none).
    pub fn pointer_down(&mut self, x: f32, y: f32) -> JsValue {
        to_js(&self.rs_pointer(PointerEvent::Down { x, y }))
    }
    pub fn pointer_move(&mut self, x: f32, y: f32) -> JsValue {
        to_js(&self.rs_pointer(PointerEvent::Move { x, y }))
    }
    pub fn pointer_up(&mut self, x: f32, y: f32) -> JsValue {
        to_js(&self.rs_pointer(PointerEvent::Up { x, y }))
    }
    pub fn click(&mut self, x: f32, y: f32) -> JsValue {
        to_js(&self.rs_pointer(PointerEvent::Click { x, y }))
    }
    pub fn double_click(&mut self, x: f32, y: f32) -> JsValue {
        to_js(&self.rs_pointer(PointerEvent::DoubleClick { x, y }))
    }
    pub fn cancel(&mut self) {
        self.rs_pointer(PointerEvent::Cancel);
    }
    pub fn pointer_event_res(&mut self, v: JsValue) -> JsValue {
        let ev = match serde_wasm_bindgen::from_value::<serde_json::Value>(v)
            .map_err(|e| e.to_string())
            .and_then(|raw| serde_json::from_value::<PointerEvent>(raw).map_err(|e| e.to_string()))
        {
            Ok(ev) => ev,
            Err(msg) => return error::parse_error(msg),
        };
        error::ok(to_js(&self.rs_pointer(ev)))
    }
    pub fn preview(&self) -> JsValue {
        to_js(&self.interaction.preview())
    }
    pub fn is_idle(&self) -> bool {
        self.interaction.is_idle()
    }

    // Intents and history
    pub fn dispatch(&mut self, v: JsValue) -> bool {
        match parse_intents(v) {
            Ok(intents) => self.history.dispatch(&intents),
            Err(_) => false,
        }
    }
    pub fn dispatch_res(&mut self, v: JsValue) -> JsValue {
        let intents = match parse_intents(v) {
            Ok(i) => i,
            Err(e) => return e,
        };
        // Validate against the state each intent will actually see
        let mut trial = self.history.present().clone();
        for intent in &intents {
            if let Some((kind, id)) = missing_ref(&trial, intent) {
                return error::invalid_id(kind, id);
            }
            trial = trial.apply(intent);
        }
        let recorded = self.history.dispatch(&intents);
        let created = self.history.present().last_created().map_or(JsValue::NULL, |id| JsValue::from_f64(id as f64));
        error::ok(obj(&[("recorded", recorded.into()), ("created", created)]))
    }
    pub fn undo(&mut self) -> bool {
        self.history.undo()
    }
    pub fn redo(&mut self) -> bool {
        self.history.redo()
    }
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // Document
    pub fn to_json(&self) -> JsValue {
        to_js(&self.state().to_json_value())
    }
    pub fn to_json_string(&self) -> String {
        self.state().to_json_value().to_string()
    }
    pub fn from_json_res(&mut self, v: JsValue) -> JsValue {
        match serde_wasm_bindgen::from_value::<serde_json::Value>(v) {
            Ok(raw) => self.load(MapState::from_json_value(raw)),
            Err(e) => error::parse_error(e.to_string()),
        }
    }
    pub fn from_json_str_res(&mut self, json: &str) -> JsValue {
        self.load(MapState::from_json_str(json))
    }
    pub fn clear(&mut self) {
        self.history.reset(MapState::new());
        self.interaction = mapcraft::Interaction::new(self.tool);
    }

    /// Replace every zombie arrow with the layout derived from `json`. An empty
    /// layout still succeeds, with `warning: "no_arrows"`.
    pub fn apply_auto_path_res(&mut self, json: &str) -> JsValue {
        match self.state().apply_auto_path(json, &self.config.arrows) {
            Ok((next, report)) => {
                self.history.dispatch(&[Intent::ReplaceState { state: Box::new(next) }]);
                let warning = if report.empty { JsValue::from_str("no_arrows") } else { JsValue::UNDEFINED };
                error::ok(obj(&[("arrows", (report.arrows as f64).into()), ("warning", warning)]))
            }
            Err(e) => error::from_map_error(&e),
        }
    }

    // Config
    pub fn config(&self) -> JsValue {
        to_js(&self.config)
    }
    pub fn set_config_json_res(&mut self, json: &str) -> JsValue {
        match EditorConfig::from_json_str(json) {
            Ok(cfg) => {
                self.history.set_limit(cfg.history_limit);
                self.config = cfg;
                error::ok(to_js(&self.config))
            }
            Err(e) => error::from_map_error(&e),
        }
    }

    // Read-only views for the renderer
    pub fn territories(&self) -> JsValue {
        to_js(&self.state().territories().collect::<Vec<_>>())
    }
    pub fn territory_res(&self, id: u32) -> JsValue {
        match self.state().territory(id) {
            Some(t) => error::ok(to_js(t)),
            None => error::invalid_id("territory", id),
        }
    }
    pub fn territory_count(&self) -> u32 {
        self.state().territory_count() as u32
    }
    pub fn continents(&self) -> JsValue {
        to_js(&self.state().continents().collect::<Vec<_>>())
    }
    pub fn continent_members_res(&self, id: u32) -> JsValue {
        if self.state().continent(id).is_none() {
            return error::invalid_id("continent", id);
        }
        error::ok(ids(&self.state().continent_members(id)).into())
    }
    pub fn connections(&self) -> JsValue {
        to_js(self.state().connections())
    }
    /// `[x1, y1, x2, y2]` per straight connection, in absolute coordinates.
    pub fn connection_segments(&self) -> Float32Array {
        let s = self.state();
        let flat: Vec<f32> = s
            .connections()
            .iter()
            .filter_map(|c| s.connection_endpoints(c))
            .flat_map(|(a, b)| [a.x, a.y, b.x, b.y])
            .collect();
        coords(&flat)
    }
    pub fn freehand_connections(&self) -> JsValue {
        to_js(self.state().freehand_connections())
    }
    pub fn markers(&self) -> JsValue {
        to_js(self.state().markers())
    }
    pub fn arrows(&self) -> JsValue {
        to_js(self.state().arrows())
    }
    pub fn selection(&self) -> js_sys::Uint32Array {
        ids(self.state().selection())
    }

    pub fn territory_center_res(&self, id: u32) -> JsValue {
        match self.state().territory(id) {
            Some(t) => {
                let c = shape::territory_center(t);
                error::ok(coords(&[c.x, c.y]).into())
            }
            None => error::invalid_id("territory", id),
        }
    }
    /// Flat `[x1, y1, x2, y2, ..]` edge list of a territory's outline.
    pub fn edges_res(&self, id: u32) -> JsValue {
        match self.state().territory(id) {
            Some(t) => {
                let flat: Vec<f32> = shape::edges(&t.shape).iter().flat_map(|e| [e.x1, e.y1, e.x2, e.y2]).collect();
                error::ok(coords(&flat).into())
            }
            None => error::invalid_id("territory", id),
        }
    }
    pub fn nearest_edge(&self, x: f32, y: f32) -> JsValue {
        let p = self.viewport.to_canvas(Point::new(x, y));
        to_js(&picking::nearest_edge(self.state().territories(), p, self.config.snap_distance))
    }
    pub fn nearest_edge_res(&self, x: f32, y: f32, snap: f32) -> JsValue {
        if !x.is_finite() { return error::non_finite("x"); }
        if !y.is_finite() { return error::non_finite("y"); }
        if !snap.is_finite() { return error::non_finite("snap"); }
        if snap < 0.0 {
            return error::out_of_range("snap", 0.0, f32::MAX, snap);
        }
        let p = self.viewport.to_canvas(Point::new(x, y));
        error::ok(to_js(&picking::nearest_edge(self.state().territories(), p, snap)))
    }
    pub fn territory_at(&self, x: f32, y: f32) -> Option<u32> {
        let p = self.viewport.to_canvas(Point::new(x, y));
        picking::territory_at(self.state().territories(), p)
    }
    pub fn arrow_geometry_res(&self, id: u32) -> JsValue {
        match self.state().arrows().iter().find(|a| a.id == id) {
            Some(a) => error::ok(to_js(&arrows::arrow_geometry(a))),
            None => error::invalid_id("arrow", id),
        }
    }
    pub fn arrow_geometries(&self) -> JsValue {
        let out = Array::new();
        for a in self.state().arrows() {
            out.push(&obj(&[("id", (a.id as f64).into()), ("geometry", to_js(&arrows::arrow_geometry(a)))]));
        }
        out.into()
    }
}

impl Editor {
    fn load(&mut self, parsed: Result<MapState, mapcraft::MapError>) -> JsValue {
        match parsed {
            Ok(state) => {
                log::info!("loaded map with {} territories", state.territory_count());
                self.history.reset(state);
                self.interaction = mapcraft::Interaction::new(self.tool);
                error::ok(JsValue::from_f64(self.state().territory_count() as f64))
            }
            Err(e) => {
                log::warn!("map load rejected: {e}");
                error::from_map_error(&e)
            }
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Editor::new()
    }
}
