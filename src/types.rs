use nalgebra::{Point3, Vector3};

use crate::geometry;

/// Scalar used for every world-space quantity, in metres.
pub type Value = f64;

/// A world-space point in metres.
pub type Point = Point3<Value>;

/// A world-space vector in metres.
pub type Vector = Vector3<Value>;

/// An ordered pair of points produced by the measurement session.
///
/// `directed` segments are drawn with a single endpoint marker (at `start`);
/// undirected segments mark both ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
    pub directed: bool,
}

impl Segment {
    pub fn new(start: Point, end: Point, directed: bool) -> Self {
        Self {
            start,
            end,
            directed,
        }
    }

    /// Euclidean length in metres. Zero for degenerate segments.
    pub fn length(&self) -> Value {
        geometry::distance(&self.start, &self.end)
    }

    pub fn midpoint(&self) -> Point {
        geometry::midpoint(&self.start, &self.end)
    }

    /// Unit direction from `start` to `end`, or `None` when both ends coincide.
    pub fn direction(&self) -> Option<Vector> {
        (self.end - self.start).try_normalize(Value::EPSILON)
    }
}

/// Which side of the rectangle a committed edge measured.
///
/// The first committed edge is the height, the second the width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Height,
    Width,
}
