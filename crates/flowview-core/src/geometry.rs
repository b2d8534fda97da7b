use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Position and size written back by the external geometry solver for a
/// node or container. Stored, never interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeLayout {
    pub position: Vec2,
    pub size: Vec2,
}

/// One routed segment of an edge, in the solver's section shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeSection {
    pub start: Vec2,
    pub end: Vec2,
    #[serde(default)]
    pub bend_points: Vec<Vec2>,
}

/// Routing written back by the external geometry solver for an edge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeLayout {
    pub sections: Vec<EdgeSection>,
}
