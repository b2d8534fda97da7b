//! Turns a parsed graph description into a populated engine.
//!
//! Validation happens up front, against the description alone: by the time
//! the first entity is stored, every cross-reference is known to resolve.
//! A failed ingest therefore returns an error and nothing else; the engine
//! never observes a partially-invalid graph.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use flowview_core::{
    EdgeEmphasis, ElementId, GraphDescription, GraphFormatError, HierarchyNode, NodeAttrs,
    NodeType,
};

use crate::state::{Container, GraphEdge, GraphNode, VisualizationState};

struct FlatContainer {
    id: String,
    label: String,
    parent: Option<String>,
}

/// Build a fresh [`VisualizationState`] from a description, grouping nodes
/// by the named hierarchy choice (falling back to the description's
/// selected choice, then to its first choice; no choice means a flat
/// graph with no containers).
pub fn build_state(
    description: &GraphDescription,
    hierarchy: Option<&str>,
) -> Result<VisualizationState, GraphFormatError> {
    let mut node_ids: HashSet<&str> = HashSet::new();
    for node in &description.nodes {
        if !node_ids.insert(node.id.as_str()) {
            return Err(GraphFormatError::DuplicateNode(node.id.clone()));
        }
    }
    let mut edge_ids: HashSet<&str> = HashSet::new();
    for edge in &description.edges {
        if !edge_ids.insert(edge.id.as_str()) {
            return Err(GraphFormatError::DuplicateEdge(edge.id.clone()));
        }
        for endpoint in [&edge.source, &edge.target] {
            if !node_ids.contains(endpoint.as_str()) {
                return Err(GraphFormatError::UnknownEndpoint {
                    edge: edge.id.clone(),
                    node: endpoint.clone(),
                });
            }
        }
    }

    let choice = match hierarchy.or(description.selected_hierarchy.as_deref()) {
        Some(wanted) => Some(
            description
                .hierarchy_choices
                .iter()
                .find(|choice| choice.id == wanted)
                .ok_or_else(|| GraphFormatError::UnknownHierarchy(wanted.to_owned()))?,
        ),
        None => description.hierarchy_choices.first(),
    };

    let mut flat: Vec<FlatContainer> = Vec::new();
    if let Some(choice) = choice {
        let mut seen: HashSet<String> = HashSet::new();
        flatten_tree(&choice.children, None, &choice.id, &mut flat, &mut seen)?;
    }
    for container in &flat {
        if node_ids.contains(container.id.as_str()) {
            return Err(GraphFormatError::ContainerShadowsNode(container.id.clone()));
        }
    }

    let container_ids: HashSet<&str> = flat.iter().map(|c| c.id.as_str()).collect();
    let empty = HashMap::new();
    let assignments = choice
        .and_then(|choice| description.node_assignments.get(&choice.id))
        .unwrap_or(&empty);
    for (node, container) in assignments {
        if !node_ids.contains(node.as_str()) {
            return Err(GraphFormatError::UnknownAssignedNode(node.clone()));
        }
        if !container_ids.contains(container.as_str()) {
            return Err(GraphFormatError::UnknownAssignedContainer {
                node: node.clone(),
                container: container.clone(),
            });
        }
    }

    // Everything resolves; build the state.
    let mut state = VisualizationState::new();
    for spec in &description.nodes {
        let label = spec
            .label
            .clone()
            .or_else(|| spec.short_label.clone())
            .unwrap_or_else(|| spec.id.clone());
        let node_type = match spec.node_type.as_deref() {
            Some(name) => name.parse().unwrap_or_else(|_| {
                tracing::warn!(
                    node = %spec.id,
                    node_type = name,
                    "Unknown node type, falling back to Transform"
                );
                NodeType::Transform
            }),
            None => NodeType::Transform,
        };
        let attrs = NodeAttrs {
            full_label: spec.full_label.clone(),
            short_label: spec.short_label.clone(),
            location_key: spec.data.as_ref().and_then(|data| data.location_key.clone()),
            location_type: spec.data.as_ref().and_then(|data| data.location_type.clone()),
        };
        state.set_graph_node(
            GraphNode::new(spec.id.as_str(), label)
                .with_node_type(node_type)
                .with_attrs(attrs),
        );
    }
    for spec in &description.edges {
        let emphasis = match spec.style.as_deref() {
            Some(name) => name.parse().unwrap_or_else(|_| {
                tracing::warn!(
                    edge = %spec.id,
                    style = name,
                    "Unknown edge style, falling back to plain"
                );
                EdgeEmphasis::Plain
            }),
            None => EdgeEmphasis::Plain,
        };
        let mut edge = GraphEdge::new(spec.id.as_str(), spec.source.as_str(), spec.target.as_str())
            .with_emphasis(emphasis);
        edge.semantic_tags = spec.semantic_tags.clone();
        edge.label = spec.label.clone();
        state.set_graph_edge(edge);
    }

    let mut children: BTreeMap<&str, BTreeSet<ElementId>> = flat
        .iter()
        .map(|container| (container.id.as_str(), BTreeSet::new()))
        .collect();
    for container in &flat {
        if let Some(parent) = &container.parent
            && let Some(set) = children.get_mut(parent.as_str())
        {
            set.insert(ElementId::container(&container.id));
        }
    }
    for (node, container) in assignments {
        if let Some(set) = children.get_mut(container.as_str()) {
            set.insert(ElementId::node(node));
        }
    }
    // `flat` lists parents before children, so nesting links are in place
    // by the time a child container is stored.
    for container in &flat {
        let members = children.remove(container.id.as_str()).unwrap_or_default();
        state.set_container(
            Container::new(container.id.as_str(), container.label.as_str())
                .with_children(members),
        );
    }

    tracing::debug!(
        nodes = state.node_count(),
        edges = state.edge_count(),
        containers = state.container_count(),
        "Built visualization state from description"
    );
    Ok(state)
}

fn flatten_tree(
    children: &[HierarchyNode],
    parent: Option<&str>,
    hierarchy_id: &str,
    out: &mut Vec<FlatContainer>,
    seen: &mut HashSet<String>,
) -> Result<(), GraphFormatError> {
    for child in children {
        if !seen.insert(child.id.clone()) {
            return Err(GraphFormatError::DuplicateContainer {
                container: child.id.clone(),
                hierarchy: hierarchy_id.to_owned(),
            });
        }
        out.push(FlatContainer {
            id: child.id.clone(),
            label: child.name.clone(),
            parent: parent.map(str::to_owned),
        });
        flatten_tree(&child.children, Some(&child.id), hierarchy_id, out, seen)?;
    }
    Ok(())
}
