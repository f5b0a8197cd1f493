use crate::{EdgeId, Located, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NavPath {
    pub points: Vec<Vec3>,
}

impl NavPath {
    pub fn new(points: Vec<Vec3>) -> Self {
        Self { points }
    }

    /// Sum of segment lengths.
    pub fn length(&self) -> f32 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }
}

/// Raw search result: the navigation edges crossed between two located points.
///
/// `edges` is empty when both points resolve to the same triangle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EdgePath {
    pub start: Located,
    pub end: Located,
    pub edges: Vec<EdgeId>,
    /// Length of `start -> edge midpoints -> end`, i.e. the best `g` of the terminating edge plus
    /// its distance to `end`.
    pub cost: f32,
}
