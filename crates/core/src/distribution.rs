use serde::{Deserialize, Serialize};

/// Process identifier of a distribution (an instrument bin id such as
/// `D20240101T000000_IFCB123`).
pub type Pid = String;

/// A single detected point. Serialized as an `[x, y]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Ordered points of one distribution. May be empty.
pub type PointCloud = Vec<Point>;

/// One distribution as produced by the loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadResult {
    pub pid: Pid,
    pub points: PointCloud,
}

impl LoadResult {
    pub fn new(pid: impl Into<Pid>, points: impl IntoIterator<Item = Point>) -> Self {
        Self {
            pid: pid.into(),
            points: points.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
