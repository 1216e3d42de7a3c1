//! Swept-segment gather detection.
//!
//! Each gatherer sweeps a segment from its start to its end position during
//! one tick. An item is gathered when its projection onto that segment falls
//! within `[0, 1]` and its perpendicular distance is within the sum of both
//! radii. All comparisons are on squared distances.

use std::cmp::Ordering;

use crate::geometry::Vec2;

/// A stationary point that can be gathered: loot or an office.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Item {
    pub id: u64,
    pub position: Vec2,
    pub radius: f64,
    pub is_office: bool,
}

/// A dog's swept path over one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gatherer {
    pub id: u64,
    pub start: Vec2,
    pub end: Vec2,
    pub radius: f64,
}

/// Closest approach of a point to a swept segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollectionResult {
    pub sq_distance: f64,
    pub proj_ratio: f64,
}

impl CollectionResult {
    pub fn is_collected(&self, collect_radius: f64) -> bool {
        self.proj_ratio >= 0.0
            && self.proj_ratio <= 1.0
            && self.sq_distance <= collect_radius * collect_radius
    }
}

/// A detected overlap between a gatherer and an item.
///
/// `item` and `gatherer` are indices into the slices passed to
/// [`find_gather_events`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GatheringEvent {
    pub item: usize,
    pub gatherer: usize,
    pub sq_distance: f64,
    pub time: f64,
}

/// Project `c` onto the segment `a → b`.
///
/// Returns `None` for a zero-length segment, where the ratio is undefined.
pub fn try_collect_point(a: Vec2, b: Vec2, c: Vec2) -> Option<CollectionResult> {
    let v = b - a;
    let v_len2 = v.length_squared();
    if v_len2 == 0.0 {
        return None;
    }
    let u = c - a;
    let u_dot_v = u.dot(&v);
    Some(CollectionResult {
        sq_distance: u.length_squared() - (u_dot_v * u_dot_v) / v_len2,
        proj_ratio: u_dot_v / v_len2,
    })
}

/// All gather events for one tick, ordered by time, then by distance.
///
/// A gatherer that did not move only collides with an item lying exactly on
/// its position, at time zero.
pub fn find_gather_events(items: &[Item], gatherers: &[Gatherer]) -> Vec<GatheringEvent> {
    let mut events = Vec::new();

    for (gi, g) in gatherers.iter().enumerate() {
        for (ii, item) in items.iter().enumerate() {
            match try_collect_point(g.start, g.end, item.position) {
                Some(res) => {
                    if res.is_collected(g.radius + item.radius) {
                        events.push(GatheringEvent {
                            item: ii,
                            gatherer: gi,
                            sq_distance: res.sq_distance,
                            time: res.proj_ratio,
                        });
                    }
                }
                None => {
                    if g.start == item.position {
                        events.push(GatheringEvent {
                            item: ii,
                            gatherer: gi,
                            sq_distance: 0.0,
                            time: 0.0,
                        });
                    }
                }
            }
        }
    }

    events.sort_by(|a, b| {
        a.time
            .partial_cmp(&b.time)
            .unwrap_or(Ordering::Equal)
            .then(
                a.sq_distance
                    .partial_cmp(&b.sq_distance)
                    .unwrap_or(Ordering::Equal),
            )
    });
    events
}
