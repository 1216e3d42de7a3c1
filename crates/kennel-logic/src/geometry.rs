//! Road network geometry.
//!
//! Maps are authored on an integer grid; live positions are `f64` pairs.
//! Every road is an axis-aligned segment widened by [`HALF_ROAD_WIDTH`] on
//! all sides, and that widened rectangle is what membership and clamping use.

use serde::{Deserialize, Serialize};

/// Half-width of a road's occupancy rectangle.
pub const HALF_ROAD_WIDTH: f64 = 0.4;
/// Collection radius of a dog.
pub const HALF_DOG_WIDTH: f64 = 0.3;
/// Detection radius of an office.
pub const HALF_OFFICE_WIDTH: f64 = 0.25;
/// Detection radius of a loot item.
pub const LOOT_WIDTH: f64 = 0.0;

/// Integer grid coordinate used for map authoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x as f64, self.y as f64)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rectangle {
    pub position: Point,
    pub size: Size,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offset {
    pub dx: i32,
    pub dy: i32,
}

/// Floating-point position or velocity on the map plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn length_squared(&self) -> f64 {
        self.dot(self)
    }

    pub fn distance_squared(&self, other: &Self) -> f64 {
        (*self - *other).length_squared()
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Exact bit pattern, usable as a hash/ordering key for positions.
    pub fn to_bits(self) -> (u64, u64) {
        (self.x.to_bits(), self.y.to_bits())
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl std::ops::Mul<f64> for Vec2 {
    type Output = Self;
    fn mul(self, scalar: f64) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

/// Closed interval, always stored with `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f64,
    pub max: f64,
}

impl Span {
    /// Build a span from two ends given in any order.
    pub fn between(a: f64, b: f64) -> Self {
        if a <= b {
            Self { min: a, max: b }
        } else {
            Self { min: b, max: a }
        }
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }

    pub fn widened(&self, by: f64) -> Self {
        Self {
            min: self.min - by,
            max: self.max + by,
        }
    }
}

/// A road's occupancy rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeBounds {
    pub x: Span,
    pub y: Span,
}

impl EdgeBounds {
    /// Inclusive on every side.
    pub fn contains(&self, pos: Vec2) -> bool {
        self.x.contains(pos.x) && self.y.contains(pos.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// An axis-aligned road segment.
///
/// Orientation is fixed at construction, so a road is horizontal or vertical
/// but never both, even when both endpoints coincide.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Road {
    start: Point,
    end: Point,
    orientation: Orientation,
    edges: EdgeBounds,
}

impl Road {
    pub fn horizontal(start: Point, end_x: i32) -> Self {
        Self::build(start, Point::new(end_x, start.y), Orientation::Horizontal)
    }

    pub fn vertical(start: Point, end_y: i32) -> Self {
        Self::build(start, Point::new(start.x, end_y), Orientation::Vertical)
    }

    fn build(start: Point, end: Point, orientation: Orientation) -> Self {
        let edges = EdgeBounds {
            x: Span::between(start.x as f64, end.x as f64).widened(HALF_ROAD_WIDTH),
            y: Span::between(start.y as f64, end.y as f64).widened(HALF_ROAD_WIDTH),
        };
        Self {
            start,
            end,
            orientation,
            edges,
        }
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn end(&self) -> Point {
        self.end
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn is_horizontal(&self) -> bool {
        self.orientation == Orientation::Horizontal
    }

    pub fn is_vertical(&self) -> bool {
        self.orientation == Orientation::Vertical
    }

    /// Occupancy rectangle, with `min <= max` on both axes regardless of
    /// which endpoint was authored first.
    pub fn edge_bounds(&self) -> EdgeBounds {
        self.edges
    }

    pub fn contains(&self, pos: Vec2) -> bool {
        self.edges.contains(pos)
    }
}

/// Every road whose occupancy rectangle contains `pos`.
pub fn roads_containing(roads: &[Road], pos: Vec2) -> Vec<&Road> {
    roads.iter().filter(|r| r.contains(pos)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub bounds: Rectangle,
}

/// Loot drop-off point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Office {
    pub id: String,
    pub position: Point,
    pub offset: Offset,
}
