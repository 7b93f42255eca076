use crate::{Intent, MapState};

/// Snapshot stack over [`MapState`]. One dispatched batch is one undo step.
#[derive(Clone, Debug)]
pub struct History {
    past: Vec<MapState>,
    present: MapState,
    future: Vec<MapState>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        History::new(MapState::new(), 100)
    }
}

impl History {
    pub fn new(present: MapState, limit: usize) -> Self {
        History { past: Vec::new(), present, future: Vec::new(), limit: limit.max(1) }
    }

    pub fn present(&self) -> &MapState {
        &self.present
    }

    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.max(1);
        self.trim();
    }

    /// Apply a batch. Returns false when nothing but the selection changed,
    /// in which case no undo step is recorded.
    pub fn dispatch(&mut self, intents: &[Intent]) -> bool {
        if intents.is_empty() {
            return false;
        }
        let next = self.present.apply_all(intents);
        let transient_only = intents.iter().all(Intent::is_transient);
        if transient_only || same_document(&next, &self.present) {
            self.present = next;
            return false;
        }
        let prev = std::mem::replace(&mut self.present, next);
        self.past.push(prev);
        self.future.clear();
        self.trim();
        true
    }

    pub fn undo(&mut self) -> bool {
        let Some(prev) = self.past.pop() else { return false };
        let cur = std::mem::replace(&mut self.present, prev);
        self.future.push(cur);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(next) = self.future.pop() else { return false };
        let cur = std::mem::replace(&mut self.present, next);
        self.past.push(cur);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Drop all history and start over from `state`.
    pub fn reset(&mut self, state: MapState) {
        self.past.clear();
        self.future.clear();
        self.present = state;
    }

    fn trim(&mut self) {
        if self.past.len() > self.limit {
            let excess = self.past.len() - self.limit;
            self.past.drain(..excess);
        }
    }
}

fn same_document(a: &MapState, b: &MapState) -> bool {
    a.territories == b.territories
        && a.continents == b.continents
        && a.connections == b.connections
        && a.freehand_connections == b.freehand_connections
        && a.markers == b.markers
        && a.arrows == b.arrows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Shape;

    fn add_rect() -> Intent {
        Intent::AddTerritory { shape: Shape::Rect { x: 0.0, y: 0.0, width: 10.0, height: 10.0 } }
    }

    #[test]
    fn undo_redo_walks_snapshots() {
        let mut h = History::default();
        assert!(h.dispatch(&[add_rect()]));
        assert!(h.dispatch(&[add_rect(), add_rect()]));
        assert_eq!(h.present().territory_count(), 3);
        assert!(h.undo());
        assert_eq!(h.present().territory_count(), 1);
        assert!(h.redo());
        assert_eq!(h.present().territory_count(), 3);
        assert!(!h.redo());
    }

    #[test]
    fn new_dispatch_clears_redo() {
        let mut h = History::default();
        h.dispatch(&[add_rect()]);
        h.undo();
        h.dispatch(&[add_rect()]);
        assert!(!h.can_redo());
    }

    #[test]
    fn no_op_and_selection_are_not_recorded() {
        let mut h = History::default();
        h.dispatch(&[add_rect()]);
        let id = h.present().last_created().unwrap();
        assert!(!h.dispatch(&[Intent::DeleteTerritory { id: 77 }]));
        assert!(!h.dispatch(&[Intent::Select { ids: vec![id] }]));
        assert_eq!(h.present().selection(), &[id]);
        assert!(h.undo());
        assert!(!h.can_undo());
    }

    #[test]
    fn limit_bounds_past() {
        let mut h = History::new(MapState::new(), 2);
        for _ in 0..5 {
            h.dispatch(&[add_rect()]);
        }
        assert!(h.undo() && h.undo());
        assert!(!h.undo());
        assert_eq!(h.present().territory_count(), 3);
    }
}
