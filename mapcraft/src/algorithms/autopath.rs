//! Zombie-mode auto-path: turns an adjacency file plus the placed number markers
//! into a deduplicated arrow list.
//!
//! Links are laid out in file order. Parallel links between the same two markers
//! (in either direction) get centered offset lanes, and a pair of opposite links
//! that ended up with the same color is merged into one bidirectional arrow.

use crate::algorithms::arrows::arrow_offset_with;
use crate::config::ArrowConfig;
use crate::error::MapError;
use crate::geometry::limits::MAX_ADJACENCY_LINKS;
use crate::geometry::tolerance::norm2;
use crate::model::{Point, ZombieArrow, ZombieMarker};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Outgoing links per source marker value, in file order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Adjacency {
    pub entries: Vec<(i64, Vec<i64>)>,
}

impl Adjacency {
    pub fn link_count(&self) -> usize {
        self.entries.iter().map(|(_, l)| l.len()).sum()
    }
}

/// Parse `{ "<value>": { "links": { "<value>": "<name>", .. } }, .. }`.
/// Keys that are not integers and entries without a `links` object are skipped.
pub fn parse_adjacency(json: &str) -> Result<Adjacency, MapError> {
    let root = match serde_json::from_str::<Value>(json)? {
        Value::Object(m) => m,
        _ => return Err(MapError::InvalidAdjacency),
    };
    let mut adj = Adjacency::default();
    let mut total = 0usize;
    for (key, entry) in root {
        let Ok(from) = key.trim().parse::<i64>() else {
            log::debug!("autopath: ignoring non-numeric key {key:?}");
            continue;
        };
        let Some(links) = entry.get("links").and_then(Value::as_object) else { continue };
        let targets: Vec<i64> = links.keys().filter_map(|k| k.trim().parse::<i64>().ok()).collect();
        total += targets.len();
        if total > MAX_ADJACENCY_LINKS {
            return Err(MapError::Limit { what: "adjacency links", max: MAX_ADJACENCY_LINKS });
        }
        adj.entries.push((from, targets));
    }
    Ok(adj)
}

type LinkKey = (i64, i64, String);

/// Lane of the `rank`-th (1-based) of `total` links between one pair, centered on zero.
pub fn lane_index(rank: usize, total: usize) -> i32 {
    rank as i32 - total.div_ceil(2) as i32
}

/// Lay out arrows for every link whose endpoints are both placed markers.
/// Returned arrows carry id 0; ids are assigned when they are stored.
pub fn generate<'a, I>(markers: I, adj: &Adjacency, cfg: &ArrowConfig) -> Vec<ZombieArrow>
where
    I: IntoIterator<Item = &'a ZombieMarker>,
{
    let mut placed: HashMap<i64, Point> = HashMap::new();
    for m in markers {
        placed.entry(m.value).or_insert(Point { x: m.x, y: m.y });
    }

    // Resolve once so both passes see the same link sequence. The color index is the
    // link's position in its source entry, counting links that did not resolve.
    let resolved: Vec<Vec<(usize, i64, i64)>> = adj
        .entries
        .iter()
        .map(|&(from, ref targets)| {
            targets
                .iter()
                .copied()
                .enumerate()
                .filter(|&(_, to)| {
                    let keep = to != from && placed.contains_key(&from) && placed.contains_key(&to);
                    if !keep {
                        log::debug!("autopath: dropping link {from}->{to}");
                    }
                    keep
                })
                .map(|(ix, to)| (ix, from, to))
                .collect()
        })
        .collect();

    let pair = |a: i64, b: i64| (a.min(b), a.max(b));
    let mut totals: HashMap<(i64, i64), usize> = HashMap::new();
    for &(_, a, b) in resolved.iter().flatten() {
        *totals.entry(pair(a, b)).or_default() += 1;
    }

    let mut laid: IndexMap<LinkKey, ZombieArrow> = IndexMap::new();
    let mut seen: HashMap<(i64, i64), usize> = HashMap::new();
    for &(color_ix, from, to) in resolved.iter().flatten() {
        let key = pair(from, to);
        let rank = {
            let r = seen.entry(key).or_default();
            *r += 1;
            *r
        };
        let total = totals.get(&key).copied().unwrap_or(1);
        let lane = lane_index(rank, total);
        let offset = arrow_offset_with(lane, cfg);

        let a = placed[&from];
        let b = placed[&to];
        let ((ux, uy), len) = norm2(b.x - a.x, b.y - a.y);
        let (px, py) = (-uy * offset, ux * offset);
        let mut start = Point { x: a.x + px, y: a.y + py };
        let mut end = Point { x: b.x + px, y: b.y + py };
        if len > 2.0 * cfg.marker_clearance {
            let c = cfg.marker_clearance;
            start = Point { x: start.x + ux * c, y: start.y + uy * c };
            end = Point { x: end.x - ux * c, y: end.y - uy * c };
        }

        let color = cfg.palette.get(color_ix).unwrap_or(&cfg.fallback_color).clone();
        let mut arrow = ZombieArrow::between(from, to, start, end, &color, cfg.stroke_width);
        arrow.offset_index = lane;
        arrow.curvature = offset * cfg.curve_factor;
        // same (from, to, color) collapses onto one lane; last write wins
        laid.insert((from, to, color), arrow);
    }

    let mut consumed: HashSet<&LinkKey> = HashSet::new();
    let mut out = Vec::with_capacity(laid.len());
    for (key, arrow) in &laid {
        if consumed.contains(key) {
            continue;
        }
        consumed.insert(key);
        let rev = (key.1, key.0, key.2.clone());
        let mut arrow = arrow.clone();
        if let Some((rev_key, _)) = laid.get_key_value(&rev) {
            consumed.insert(rev_key);
            arrow.bidirectional = true;
        }
        out.push(arrow);
    }
    if out.is_empty() {
        log::warn!("autopath: no arrows generated from {} links", adj.link_count());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PALETTE;

    fn marker(value: i64, x: f32, y: f32) -> ZombieMarker {
        ZombieMarker {
            id: value as u32,
            value,
            x,
            y,
            font_size: 24.0,
            font_family: "Arial".into(),
            color: "#000".into(),
        }
    }

    fn run(markers: &[ZombieMarker], json: &str) -> Vec<ZombieArrow> {
        generate(markers, &parse_adjacency(json).unwrap(), &ArrowConfig::default())
    }

    #[test]
    fn parse_keeps_file_order_and_skips_junk() {
        let adj = parse_adjacency(r#"{"5":{"links":{"1":"a","x":"b"}},"abc":{"links":{}},"2":{"nolinks":1},"1":{"links":{"5":""}}}"#).unwrap();
        assert_eq!(adj.entries, vec![(5, vec![1]), (1, vec![5])]);
    }

    #[test]
    fn parse_errors() {
        assert!(matches!(parse_adjacency("{not json"), Err(MapError::Json(_))));
        assert!(matches!(parse_adjacency("[1,2]"), Err(MapError::InvalidAdjacency)));
    }

    #[test]
    fn opposite_links_with_same_color_merge() {
        let ms = [marker(1, 0.0, 0.0), marker(2, 200.0, 0.0)];
        let arrows = run(&ms, r#"{"1":{"links":{"2":""}},"2":{"links":{"1":""}}}"#);
        assert_eq!(arrows.len(), 1);
        assert!(arrows[0].bidirectional);
        assert_eq!((arrows[0].from, arrows[0].to), (1, 2));
        assert_eq!(arrows[0].color, DEFAULT_PALETTE[0]);
    }

    #[test]
    fn opposite_links_with_different_colors_stay_apart() {
        let ms = [marker(1, 0.0, 0.0), marker(2, 200.0, 0.0), marker(3, 0.0, 200.0)];
        let arrows = run(&ms, r#"{"1":{"links":{"2":"","3":""}},"2":{"links":{"3":"","1":""}}}"#);
        let one_two: Vec<_> = arrows.iter().filter(|a| (a.from, a.to) == (1, 2) || (a.from, a.to) == (2, 1)).collect();
        assert_eq!(one_two.len(), 2);
        assert!(one_two.iter().all(|a| !a.bidirectional));
        assert_ne!(one_two[0].color, one_two[1].color);
    }

    #[test]
    fn unplaced_markers_and_self_loops_are_dropped() {
        let ms = [marker(1, 0.0, 0.0), marker(2, 100.0, 0.0)];
        let arrows = run(&ms, r#"{"1":{"links":{"1":"","9":"","2":""}}}"#);
        assert_eq!(arrows.len(), 1);
        // 1->1 and 1->9 resolve to nothing but still hold palette slots 0 and 1
        assert_eq!(arrows[0].color, DEFAULT_PALETTE[2]);
        assert!(run(&ms, r#"{"7":{"links":{"8":""}}}"#).is_empty());
    }

    #[test]
    fn unplaced_target_shifts_color_and_blocks_merge() {
        let ms = [marker(1, 0.0, 0.0), marker(2, 200.0, 0.0)];
        let arrows = run(&ms, r#"{"1":{"links":{"9":"","2":""}},"2":{"links":{"1":""}}}"#);
        assert_eq!(arrows.len(), 2);
        assert!(arrows.iter().all(|a| !a.bidirectional));
        assert_eq!(arrows[0].color, DEFAULT_PALETTE[1]);
        assert_eq!(arrows[1].color, DEFAULT_PALETTE[0]);
    }

    #[test]
    fn same_key_collision_keeps_the_later_lane() {
        // " 1" and "1" are distinct JSON keys that parse to the same marker value
        let ms = [marker(1, 0.0, 0.0), marker(2, 200.0, 0.0)];
        let arrows = run(&ms, r#"{"1":{"links":{"2":""}}," 1":{"links":{"2":""}}}"#);
        assert_eq!(arrows.len(), 1);
        let a = &arrows[0];
        assert_eq!((a.from, a.to, a.offset_index), (1, 2, 1));
        assert_eq!(a.curvature, arrow_offset_with(1, &ArrowConfig::default()) * 0.5);
        // lane 1 sits on the left of 1->2 (+y for a chord along +x)
        assert_eq!(a.y1, arrow_offset_with(1, &ArrowConfig::default()));
    }

    #[test]
    fn long_arrows_are_trimmed_short_ones_are_not() {
        let ms = [marker(1, 0.0, 0.0), marker(2, 100.0, 0.0), marker(3, 0.0, 40.0)];
        let arrows = run(&ms, r#"{"1":{"links":{"2":""}},"3":{"links":{"1":""}}}"#);
        let long = &arrows[0];
        assert_eq!((long.x1, long.x2), (28.0, 72.0));
        assert!((long.length - 44.0).abs() < 1e-4);
        let short = &arrows[1];
        assert_eq!((short.y1, short.y2), (40.0, 0.0));
    }

    #[test]
    fn parallel_links_fan_out_into_centered_lanes() {
        let ms = [marker(1, 0.0, 0.0), marker(2, 200.0, 0.0), marker(3, 0.0, 300.0)];
        // three 1<->2 links with distinct colors (different outgoing positions)
        let json = r#"{"1":{"links":{"2":"","3":""}},"2":{"links":{"3":"","1":""}},"3":{"links":{"1":"","2":""}}}"#;
        let arrows = run(&ms, json);
        assert!(arrows.iter().all(|a| a.curvature.abs() <= ArrowConfig::default().max_offset));
        let lanes: Vec<i32> = arrows
            .iter()
            .filter(|a| a.from.min(a.to) == 1 && a.from.max(a.to) == 2)
            .map(|a| a.offset_index)
            .collect();
        assert_eq!(lanes, vec![0, 1]);
    }

    #[test]
    fn lanes_are_centered() {
        let five: Vec<i32> = (1..=5).map(|r| lane_index(r, 5)).collect();
        assert_eq!(five, vec![-2, -1, 0, 1, 2]);
        assert_eq!(lane_index(1, 1), 0);
        assert_eq!((lane_index(1, 2), lane_index(2, 2)), (0, 1));
    }

    #[test]
    fn generation_is_deterministic() {
        let ms = [marker(1, 0.0, 0.0), marker(2, 120.0, 30.0), marker(3, -40.0, 90.0)];
        let json = r#"{"1":{"links":{"2":"","3":""}},"2":{"links":{"1":"","3":""}},"3":{"links":{"2":""}}}"#;
        assert_eq!(run(&ms, json), run(&ms, json));
    }
}
