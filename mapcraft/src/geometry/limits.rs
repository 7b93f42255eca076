// Ingestion limits applied to imported documents and adjacency files

pub const MAX_TERRITORIES: usize = 10_000;
pub const MAX_CONTINENTS: usize = 1_000;
pub const MAX_MARKERS: usize = 10_000;
pub const MAX_ARROWS: usize = 50_000;

pub const MAX_POINTS_PER_SHAPE: usize = 20_000; // coordinates, not vertices
pub const MAX_ADJACENCY_LINKS: usize = 100_000;

// Imported ids and marker values stay far enough from the integer edge that counters can advance
pub const MAX_ENTITY_ID: u32 = 1_000_000_000;
pub const MAX_MARKER_VALUE: i64 = 1_000_000_000;

pub const COORD_MIN: f32 = -10_000_000.0;
pub const COORD_MAX: f32 =  10_000_000.0;
pub const WIDTH_MAX: f32 = 1_000.0;

#[inline]
pub fn in_coord_bounds(x: f32) -> bool { x.is_finite() && x >= COORD_MIN && x <= COORD_MAX }

#[inline]
pub fn in_width_bounds(w: f32) -> bool { w.is_finite() && w > 0.0 && w <= WIDTH_MAX }
