//! Boundary shapes handed over by the ingestion collaborator.
//!
//! The collaborator owns reading and parsing the graph text; these types are
//! the already-parsed form it passes across the boundary. Field names follow
//! the wire format the dataflow compiler emits, hence the camelCase renames.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A complete graph description: nodes, edges, and zero or more hierarchy
/// choices, each with its own node-to-container assignment map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDescription {
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
    #[serde(default)]
    pub hierarchy_choices: Vec<HierarchyChoice>,
    /// choice id -> (node id -> container id)
    #[serde(default)]
    pub node_assignments: HashMap<String, HashMap<String, String>>,
    #[serde(default)]
    pub selected_hierarchy: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    pub id: String,
    #[serde(default)]
    pub node_type: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub full_label: Option<String>,
    #[serde(default)]
    pub short_label: Option<String>,
    #[serde(default)]
    pub data: Option<NodeDataSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDataSpec {
    #[serde(default)]
    pub location_key: Option<String>,
    #[serde(default)]
    pub location_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeSpec {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub semantic_tags: Vec<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
}

/// One way of grouping nodes into containers, e.g. by location or by
/// originating call stack. The children form a recursive container tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HierarchyChoice {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub children: Vec<HierarchyNode>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HierarchyNode {
    // Some producers emit `key` instead of `id` for container tree entries.
    #[serde(alias = "key")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub children: Vec<HierarchyNode>,
}

/// Structural validation failure in a graph description. Raised before any
/// engine state is constructed, so a failed ingest leaves nothing behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphFormatError {
    #[error("duplicate node id `{0}`")]
    DuplicateNode(String),
    #[error("duplicate edge id `{0}`")]
    DuplicateEdge(String),
    #[error("edge `{edge}` references unknown node `{node}`")]
    UnknownEndpoint { edge: String, node: String },
    #[error("unknown hierarchy choice `{0}`")]
    UnknownHierarchy(String),
    #[error("duplicate container id `{container}` in hierarchy `{hierarchy}`")]
    DuplicateContainer { container: String, hierarchy: String },
    #[error("container id `{0}` collides with a node id")]
    ContainerShadowsNode(String),
    #[error("assignment references unknown node `{0}`")]
    UnknownAssignedNode(String),
    #[error("node `{node}` is assigned to unknown container `{container}`")]
    UnknownAssignedContainer { node: String, container: String },
}
