//! Normalized point and frame value types.
//!
//! Coordinates are normalized: X and Y span `[-1.0, 1.0]`, colors span
//! `[0.0, 1.0]`. The codec maps them onto the configured sample widths.

/// One laser point: position plus color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Point {
    /// Create a point with explicit color.
    pub fn new(x: f32, y: f32, r: f32, g: f32, b: f32) -> Self {
        Self { x, y, r, g, b }
    }

    /// Create a blanked (invisible) point, used for travel moves.
    pub fn blanked(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            r: 0.0,
            g: 0.0,
            b: 0.0,
        }
    }
}

/// An ordered sequence of points, scanned top to bottom by the DAC.
///
/// Frames are produced on demand by a frame provider and are immutable
/// once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    points: Vec<Point>,
}

impl Frame {
    /// Create a frame from a point list.
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// An empty frame (blanks the output when scanned).
    pub fn empty() -> Self {
        Self::default()
    }

    /// The points in scan order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Number of points in the frame.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the frame holds no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl From<Vec<Point>> for Frame {
    fn from(points: Vec<Point>) -> Self {
        Self::new(points)
    }
}

impl FromIterator<Point> for Frame {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
