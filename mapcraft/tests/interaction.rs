use mapcraft::model::{Point, Shape};
use mapcraft::{
    ConnectMode, EditorConfig, Intent, Interaction, MapState, PointerEvent, Preview, Tool, ToolContext,
    Viewport,
};

struct Session {
    state: MapState,
    config: EditorConfig,
    viewport: Viewport,
    tool: Tool,
    ix: Interaction,
    emitted: Vec<Intent>,
}

impl Session {
    fn new(tool: Tool) -> Self {
        Session {
            state: MapState::new(),
            config: EditorConfig::default(),
            viewport: Viewport::default(),
            tool,
            ix: Interaction::new(tool),
            emitted: Vec::new(),
        }
    }

    fn send(&mut self, ev: PointerEvent) -> Vec<Intent> {
        let ctx = ToolContext { state: &self.state, config: &self.config, viewport: self.viewport, tool: self.tool };
        let (ix, intents) = self.ix.handle(&ctx, ev);
        self.ix = ix;
        self.state = self.state.apply_all(&intents);
        self.emitted.extend(intents.iter().cloned());
        intents
    }

    fn down(&mut self, x: f32, y: f32) -> Vec<Intent> { self.send(PointerEvent::Down { x, y }) }
    fn mv(&mut self, x: f32, y: f32) -> Vec<Intent> { self.send(PointerEvent::Move { x, y }) }
    fn up(&mut self, x: f32, y: f32) -> Vec<Intent> { self.send(PointerEvent::Up { x, y }) }
    fn click(&mut self, x: f32, y: f32) -> Vec<Intent> { self.send(PointerEvent::Click { x, y }) }
    fn dbl(&mut self, x: f32, y: f32) -> Vec<Intent> { self.send(PointerEvent::DoubleClick { x, y }) }

    fn add(&mut self, shape: Shape) -> u32 {
        self.state = self.state.apply(&Intent::AddTerritory { shape });
        self.state.last_created().expect("territory")
    }
}

fn square(x: f32, y: f32, s: f32) -> Shape {
    Shape::Rect { x, y, width: s, height: s }
}

#[test]
fn rect_drag_commits_normalized_box() {
    let mut s = Session::new(Tool::Rect);
    s.down(100.0, 100.0);
    s.mv(80.0, 70.0);
    assert_eq!(
        s.ix.preview(),
        Preview::Shape { shape: Shape::Rect { x: 100.0, y: 100.0, width: -20.0, height: -30.0 } }
    );
    let out = s.up(60.0, 40.0);
    assert_eq!(out, vec![Intent::AddTerritory { shape: Shape::Rect { x: 60.0, y: 40.0, width: 40.0, height: 60.0 } }]);
    assert!(s.ix.is_idle());
}

#[test]
fn small_drags_are_discarded_on_either_axis() {
    let mut s = Session::new(Tool::Ellipse);
    s.down(0.0, 0.0);
    assert!(s.up(100.0, 5.0).is_empty());
    s.down(0.0, 0.0);
    assert!(s.up(4.0, 100.0).is_empty());
    s.down(0.0, 0.0);
    assert_eq!(s.up(6.0, 6.0).len(), 1);
    assert!(matches!(s.state.territories().next().unwrap().shape, Shape::Ellipse { .. }));
}

#[test]
fn freehand_needs_three_points_and_closes() {
    let mut s = Session::new(Tool::Draw);
    s.down(0.0, 0.0);
    s.mv(5.0, 0.0);
    assert!(s.up(5.0, 0.0).is_empty());

    s.down(0.0, 0.0);
    s.mv(10.0, 0.0);
    s.mv(10.0, 10.0);
    let out = s.up(10.0, 10.0);
    let expected = vec![0.0, 0.0, 10.0, 0.0, 10.0, 10.0, 0.0, 0.0];
    assert_eq!(out, vec![Intent::AddTerritory { shape: Shape::Freehand { points: expected, closed: true } }]);
}

#[test]
fn polygon_double_click_commits_with_three_vertices() {
    let mut s = Session::new(Tool::Polygon);
    s.click(0.0, 0.0);
    s.click(10.0, 0.0);
    s.mv(12.0, 8.0);
    match s.ix.preview() {
        Preview::Polygon { segment, .. } => assert_eq!(segment, Some((Point::new(10.0, 0.0), Point::new(12.0, 8.0)))),
        other => panic!("unexpected preview {other:?}"),
    }
    // not enough vertices yet: stays in progress
    assert!(s.dbl(10.0, 0.0).is_empty());
    assert!(!s.ix.is_idle());

    s.click(10.0, 10.0);
    s.click(10.0, 10.0); // the browser's clicks ahead of the dblclick
    let out = s.dbl(10.0, 10.0);
    assert_eq!(
        out,
        vec![Intent::AddTerritory { shape: Shape::Polygon { points: vec![0.0, 0.0, 10.0, 0.0, 10.0, 10.0] } }]
    );
}

#[test]
fn clicking_near_first_vertex_closes_polygon() {
    let mut s = Session::new(Tool::Polygon);
    s.click(0.0, 0.0);
    s.click(50.0, 0.0);
    s.click(50.0, 50.0);
    let out = s.click(3.0, 2.0);
    assert_eq!(out.len(), 1);
    assert_eq!(s.state.territory_count(), 1);
}

#[test]
fn connected_mode_snaps_vertices_to_edges() {
    let mut s = Session::new(Tool::Connected);
    s.add(square(0.0, 0.0, 100.0));
    s.click(104.0, 20.0); // snaps onto the right edge
    s.click(150.0, 20.0); // too far, raw position
    s.click(150.0, 80.0);
    s.click(97.0, 80.0); // inside, snaps outward to the right edge
    let out = s.dbl(97.0, 80.0);
    assert_eq!(
        out,
        vec![Intent::AddTerritory {
            shape: Shape::Polygon { points: vec![100.0, 20.0, 150.0, 20.0, 150.0, 80.0, 100.0, 80.0] }
        }]
    );
}

#[test]
fn marquee_selects_by_bounds_in_canvas_space() {
    let mut s = Session::new(Tool::Select);
    let a = s.add(square(0.0, 0.0, 10.0));
    let b = s.add(square(100.0, 100.0, 10.0));
    s.viewport = Viewport { scale: 2.0, x: 50.0, y: 50.0 };
    // screen (40, 40) is canvas (-5, -5); screen (90, 90) is canvas (20, 20)
    s.down(40.0, 40.0);
    s.mv(70.0, 70.0);
    assert_eq!(s.ix.preview(), Preview::Marquee { rect: mapcraft::model::Rect::new(-5.0, -5.0, 15.0, 15.0) });
    let out = s.up(90.0, 90.0);
    assert_eq!(out, vec![Intent::Select { ids: vec![a] }]);
    assert_eq!(s.state.selection(), &[a]);
    assert_ne!(a, b);
}

#[test]
fn pressing_on_a_shape_does_not_start_a_marquee() {
    let mut s = Session::new(Tool::Select);
    let a = s.add(square(0.0, 0.0, 10.0));
    s.down(5.0, 5.0);
    assert!(s.ix.is_idle());
    assert!(s.up(50.0, 50.0).is_empty());
    assert_eq!(s.click(5.0, 5.0), vec![Intent::Select { ids: vec![a] }]);
}

#[test]
fn straight_connect_two_clicks() {
    let mut s = Session::new(Tool::Connect(ConnectMode::Straight));
    let a = s.add(square(0.0, 0.0, 20.0));
    let b = s.add(square(50.0, 10.0, 20.0));
    assert!(s.click(15.0, 5.0).is_empty());
    assert_eq!(s.ix.preview(), Preview::PendingConnection { from: a, at: Point::new(15.0, 5.0) });
    let out = s.click(55.0, 20.0);
    assert_eq!(
        out,
        vec![Intent::AddConnection { from: a, to: b, from_point: Point::new(15.0, 5.0), to_point: Point::new(5.0, 10.0) }]
    );
    assert!(s.ix.is_idle());
    assert_eq!(s.state.territory(b).unwrap().connections, vec![a]);
}

#[test]
fn straight_connect_cancels_on_same_or_empty() {
    let mut s = Session::new(Tool::Connect(ConnectMode::Straight));
    s.add(square(0.0, 0.0, 20.0));
    s.add(square(50.0, 0.0, 20.0));
    s.click(5.0, 5.0);
    assert!(s.click(6.0, 6.0).is_empty());
    assert!(s.ix.is_idle());
    s.click(5.0, 5.0);
    assert!(s.click(200.0, 200.0).is_empty());
    assert!(s.ix.is_idle());
    assert!(s.state.connections().is_empty());
}

#[test]
fn freehand_connect_requires_different_target() {
    let mut s = Session::new(Tool::Connect(ConnectMode::Freehand));
    let a = s.add(square(0.0, 0.0, 20.0));
    let b = s.add(square(50.0, 0.0, 20.0));
    s.down(10.0, 10.0);
    s.mv(30.0, 12.0);
    assert!(s.up(15.0, 10.0).is_empty());

    s.down(10.0, 10.0);
    s.mv(30.0, 12.0);
    s.mv(55.0, 10.0);
    let out = s.up(55.0, 10.0);
    assert_eq!(out, vec![Intent::AddFreehandConnection { from: a, to: b, points: vec![10.0, 10.0, 30.0, 12.0, 55.0, 10.0] }]);

    // a single sample is not a stroke
    s.down(10.0, 10.0);
    assert!(s.up(55.0, 10.0).is_empty());
    assert_eq!(s.state.freehand_connections().len(), 1);
}

#[test]
fn tool_switch_and_cancel_discard_gesture() {
    let mut s = Session::new(Tool::Polygon);
    s.click(0.0, 0.0);
    s.click(10.0, 0.0);
    s.tool = Tool::Rect;
    s.mv(5.0, 5.0);
    assert!(s.ix.is_idle());
    assert_eq!(s.ix.tool(), Tool::Rect);

    s.down(0.0, 0.0);
    s.send(PointerEvent::Cancel);
    assert!(s.up(50.0, 50.0).is_empty());
    assert_eq!(s.state.territory_count(), 0);
    assert!(s.emitted.is_empty());
}
