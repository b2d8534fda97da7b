use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod description;
pub mod emphasis;
pub mod geometry;

pub use description::{
    EdgeSpec, GraphDescription, GraphFormatError, HierarchyChoice, HierarchyNode, NodeDataSpec,
    NodeSpec,
};
pub use emphasis::EdgeEmphasis;
pub use geometry::{EdgeLayout, EdgeSection, NodeLayout, Vec2};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl EdgeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for EdgeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EdgeId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for EdgeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(pub String);

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ContainerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ContainerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ContainerId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ContainerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier of a synthesized hyperedge. Always derived from the pair of
/// visible endpoints it connects, so the same pair in the same direction
/// maps to the same id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HyperEdgeId(pub String);

impl fmt::Display for HyperEdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl HyperEdgeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build the direction-encoded id for a visible endpoint pair.
    pub fn between(source: &ElementId, target: &ElementId) -> Self {
        Self(format!("hyper_{}_to_{}", source, target))
    }
}

impl Borrow<str> for HyperEdgeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A reference to either a node or a container. Container children and
/// hyperedge endpoints are drawn from this mixed namespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ElementId {
    Node(NodeId),
    Container(ContainerId),
}

impl ElementId {
    pub fn node(id: &str) -> Self {
        ElementId::Node(NodeId::from(id))
    }

    pub fn container(id: &str) -> Self {
        ElementId::Container(ContainerId::from(id))
    }

    pub fn as_str(&self) -> &str {
        match self {
            ElementId::Node(id) => id.as_str(),
            ElementId::Container(id) => id.as_str(),
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, ElementId::Container(_))
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<NodeId> for ElementId {
    fn from(id: NodeId) -> Self {
        ElementId::Node(id)
    }
}

impl From<ContainerId> for ElementId {
    fn from(id: ContainerId) -> Self {
        ElementId::Container(id)
    }
}

/// Classification of a dataflow operator, used by the render consumer to
/// pick node styling and legend entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum NodeType {
    Source,
    #[default]
    Transform,
    Aggregation,
    Join,
    Tee,
    Network,
    Sink,
}

/// Error type for classification parse failures
#[derive(Error, Debug, Clone)]
pub enum ClassificationError {
    #[error("Invalid node type `{0}`")]
    InvalidNodeType(String),
    #[error("Invalid edge emphasis `{0}`")]
    InvalidEdgeEmphasis(String),
}

impl std::str::FromStr for NodeType {
    type Err = ClassificationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Source" => Ok(NodeType::Source),
            "Transform" => Ok(NodeType::Transform),
            "Aggregation" => Ok(NodeType::Aggregation),
            "Join" => Ok(NodeType::Join),
            "Tee" => Ok(NodeType::Tee),
            "Network" => Ok(NodeType::Network),
            "Sink" => Ok(NodeType::Sink),
            _ => Err(ClassificationError::InvalidNodeType(value.to_owned())),
        }
    }
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Source => "Source",
            NodeType::Transform => "Transform",
            NodeType::Aggregation => "Aggregation",
            NodeType::Join => "Join",
            NodeType::Tee => "Tee",
            NodeType::Network => "Network",
            NodeType::Sink => "Sink",
        }
    }
}

/// Optional display attributes attached to a node by the ingestion
/// collaborator. Closed schema rather than an open map so downstream
/// consumers can match exhaustively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAttrs {
    pub full_label: Option<String>,
    pub short_label: Option<String>,
    pub location_key: Option<String>,
    pub location_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_id_str_lookup() {
        let mut map: HashMap<NodeId, u32> = HashMap::new();
        map.insert(NodeId::from("n1"), 7);
        assert_eq!(map.get("n1"), Some(&7));
        assert_eq!(map.get("n2"), None);
    }

    #[test]
    fn test_hyper_edge_id_encodes_direction() {
        let container = ElementId::Container(ContainerId::from("c1"));
        let node = ElementId::Node(NodeId::from("n4"));
        assert_eq!(
            HyperEdgeId::between(&node, &container).as_str(),
            "hyper_n4_to_c1"
        );
        assert_eq!(
            HyperEdgeId::between(&container, &node).as_str(),
            "hyper_c1_to_n4"
        );
    }

    #[test]
    fn test_node_type_round_trip() {
        for ty in [
            NodeType::Source,
            NodeType::Transform,
            NodeType::Aggregation,
            NodeType::Join,
            NodeType::Tee,
            NodeType::Network,
            NodeType::Sink,
        ] {
            assert_eq!(ty.as_str().parse::<NodeType>().unwrap(), ty);
        }
        assert!("Widget".parse::<NodeType>().is_err());
    }
}
