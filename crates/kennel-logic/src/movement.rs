//! Per-tick movement on the road network.
//!
//! Algorithm: "integrate then clamp"
//! 1. Advance the position along the facing axis by `velocity * dt`
//! 2. If the candidate is still on any road, accept it
//! 3. Otherwise look up the road(s) under the *old* position and clamp to the
//!    edge of the one that continues along the travel axis, then stop

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geometry::{roads_containing, Road, Vec2};

/// Cardinal facing. `Up` is towards negative y.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'U' => Some(Direction::Up),
            'D' => Some(Direction::Down),
            'L' => Some(Direction::Left),
            'R' => Some(Direction::Right),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Direction::Up => 'U',
            Direction::Down => 'D',
            Direction::Left => 'L',
            Direction::Right => 'R',
        }
    }

    pub fn is_horizontal(&self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    pub fn is_vertical(&self) -> bool {
        !self.is_horizontal()
    }
}

/// A movement command from a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Move(Direction),
    Stop,
}

impl Action {
    /// Parse the wire form: `"U" | "D" | "L" | "R"` or `""` for stop.
    pub fn parse(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (None, _) => Some(Action::Stop),
            (Some(c), None) => Direction::from_char(c).map(Action::Move),
            _ => None,
        }
    }
}

/// Velocity for a freshly commanded direction.
///
/// The result is always axis-aligned: the commanded axis gets `±speed`, the
/// other axis is zero.
pub fn velocity_for(direction: Direction, speed: f64) -> Vec2 {
    match direction {
        Direction::Up => Vec2::new(0.0, -speed),
        Direction::Down => Vec2::new(0.0, speed),
        Direction::Left => Vec2::new(-speed, 0.0),
        Direction::Right => Vec2::new(speed, 0.0),
    }
}

/// Candidate position after `dt`, displaced only along the facing axis.
pub fn integrate(position: Vec2, velocity: Vec2, facing: Direction, dt: Duration) -> Vec2 {
    let t = dt.as_secs_f64();
    if facing.is_horizontal() {
        Vec2::new(position.x + velocity.x * t, position.y)
    } else {
        Vec2::new(position.x, position.y + velocity.y * t)
    }
}

/// Outcome of resolving one dog's movement for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveResult {
    /// Candidate stayed on the road network.
    Free { position: Vec2 },
    /// Left the network; clamped to a road edge and stopped.
    Clamped { position: Vec2 },
    /// The old position was on no road at all; stays put and stops.
    Stranded { position: Vec2 },
}

impl MoveResult {
    pub fn position(&self) -> Vec2 {
        match *self {
            MoveResult::Free { position }
            | MoveResult::Clamped { position }
            | MoveResult::Stranded { position } => position,
        }
    }

    /// Whether the dog must have its velocity zeroed.
    pub fn stops(&self) -> bool {
        !matches!(self, MoveResult::Free { .. })
    }
}

/// Resolve one dog's movement against the road network.
pub fn resolve_move(
    roads: &[Road],
    position: Vec2,
    velocity: Vec2,
    facing: Direction,
    dt: Duration,
) -> MoveResult {
    let candidate = integrate(position, velocity, facing, dt);
    if roads.iter().any(|r| r.contains(candidate)) {
        return MoveResult::Free {
            position: candidate,
        };
    }

    let under = roads_containing(roads, position);
    let Some(road) = continuing_road(&under, facing) else {
        return MoveResult::Stranded { position };
    };

    let edges = road.edge_bounds();
    let mut clamped = candidate;
    match facing {
        Direction::Up => clamped.y = edges.y.min,
        Direction::Down => clamped.y = edges.y.max,
        Direction::Left => clamped.x = edges.x.min,
        Direction::Right => clamped.x = edges.x.max,
    }
    MoveResult::Clamped { position: clamped }
}

/// Pick the road to clamp against among the roads under the old position.
///
/// Roads running along the travel axis are preferred; if there are none,
/// every road under the dog is a candidate. Among the candidates the one
/// reaching furthest in the travel direction wins, so chained roads clamp
/// at the far end of the chain's next segment.
fn continuing_road<'a>(under: &[&'a Road], facing: Direction) -> Option<&'a Road> {
    let along: Vec<&'a Road> = under
        .iter()
        .copied()
        .filter(|r| {
            if facing.is_vertical() {
                r.is_vertical()
            } else {
                r.is_horizontal()
            }
        })
        .collect();
    let candidates = if along.is_empty() { under } else { &along[..] };

    let reach = |r: &Road| {
        let e = r.edge_bounds();
        match facing {
            Direction::Up => -e.y.min,
            Direction::Down => e.y.max,
            Direction::Left => -e.x.min,
            Direction::Right => e.x.max,
        }
    };
    candidates
        .iter()
        .copied()
        .max_by(|a, b| reach(a).total_cmp(&reach(b)))
}
