//! Collapse/expand state machine.
//!
//! Collapsing a container hides its whole descendant subtree and reroutes
//! every boundary edge into a synthesized hyperedge ending at the nearest
//! visible ancestor on each side. Expanding reverses the operation exactly:
//! a collapse followed by the matching expand restores the prior state
//! bit-for-bit, in any interleaving with sibling or ancestor toggles.
//!
//! Hidden flags are maintained incrementally over the affected subtree (via
//! the adjacency index, so the cost is proportional to the subtree and the
//! edges touching it). The hyperedge map is rebuilt from its defining
//! derivation after every transition: the set implied by the collapsed
//! containers, the live edges, and the containment forest. Deriving instead
//! of patching keeps the map exact under nested and chained collapses,
//! where one container's boundary edges re-root onto another's proxy.

use std::collections::{BTreeSet, HashMap, HashSet};

use flowview_core::{ContainerId, EdgeId, ElementId, HyperEdgeId, NodeId};

use crate::state::{HyperEdge, VisualizationState};
use crate::style::aggregate_emphasis;

pub(crate) struct Subtree {
    pub(crate) nodes: BTreeSet<NodeId>,
    pub(crate) containers: BTreeSet<ContainerId>,
}

impl VisualizationState {
    /// Collapse a container: hide its descendants and replace boundary
    /// edges with hyperedges. Idempotent; unknown ids are ignored.
    pub fn collapse_container(&mut self, id: &str) {
        let Some(container) = self.containers.get(id) else {
            tracing::debug!(container = id, "Ignoring collapse of unknown container");
            return;
        };
        if container.collapsed {
            return;
        }
        let container_id = container.id.clone();
        self.collapsed.insert(container_id.clone());
        if let Some(container) = self.containers.get_mut(&container_id) {
            container.collapsed = true;
        }
        let subtree = self.subtree(&container_id);
        for node_id in &subtree.nodes {
            if let Some(node) = self.nodes.get_mut(node_id) {
                node.hidden = true;
            }
        }
        for child_id in &subtree.containers {
            if let Some(child) = self.containers.get_mut(child_id) {
                child.hidden = true;
            }
        }
        self.refresh_edges_touching(&subtree.nodes);
        self.rebuild_hyper_edges();
        tracing::debug!(
            container = %container_id,
            hidden_nodes = subtree.nodes.len(),
            hyper_edges = self.hyper_edges.len(),
            "Collapsed container"
        );
    }

    /// Expand a collapsed container: the exact inverse of
    /// [`collapse_container`](Self::collapse_container). A descendant stays
    /// hidden if some other ancestor above it is still collapsed.
    pub fn expand_container(&mut self, id: &str) {
        let Some(container) = self.containers.get(id) else {
            tracing::debug!(container = id, "Ignoring expand of unknown container");
            return;
        };
        if !container.collapsed {
            return;
        }
        let container_id = container.id.clone();
        self.collapsed.remove(container_id.as_str());
        if let Some(container) = self.containers.get_mut(&container_id) {
            container.collapsed = false;
        }
        let subtree = self.subtree(&container_id);
        for node_id in &subtree.nodes {
            let hidden = self.node_is_covered(node_id);
            if let Some(node) = self.nodes.get_mut(node_id) {
                node.hidden = hidden;
            }
        }
        for child_id in &subtree.containers {
            let hidden = self.container_is_covered(child_id);
            if let Some(child) = self.containers.get_mut(child_id) {
                child.hidden = hidden;
            }
        }
        self.refresh_edges_touching(&subtree.nodes);
        self.rebuild_hyper_edges();
        tracing::debug!(
            container = %container_id,
            hyper_edges = self.hyper_edges.len(),
            "Expanded container"
        );
    }

    /// The render consumer's container toggle intent, mapped 1:1.
    pub fn toggle_container(&mut self, id: &str) {
        match self.containers.get(id) {
            Some(container) if container.collapsed => self.expand_container(id),
            Some(_) => self.collapse_container(id),
            None => {}
        }
    }

    pub fn collapse_all(&mut self) {
        for id in self.sorted_container_ids() {
            self.collapse_container(id.as_str());
        }
    }

    pub fn expand_all(&mut self) {
        for id in self.sorted_container_ids() {
            self.expand_container(id.as_str());
        }
    }

    fn sorted_container_ids(&self) -> Vec<ContainerId> {
        let mut ids: Vec<ContainerId> = self.containers.keys().cloned().collect();
        ids.sort();
        ids
    }

    // ------------------------------------------------------------------
    // Containment walks
    // ------------------------------------------------------------------

    /// All descendants of a container, via an explicit worklist over the
    /// containment index. The root itself is not included.
    pub(crate) fn subtree(&self, root: &ContainerId) -> Subtree {
        let mut nodes = BTreeSet::new();
        let mut containers = BTreeSet::new();
        let mut seen: HashSet<ContainerId> = HashSet::new();
        seen.insert(root.clone());
        let mut stack = vec![root.clone()];
        while let Some(current) = stack.pop() {
            let Some(container) = self.containers.get(&current) else {
                continue;
            };
            for child in &container.children {
                match child {
                    ElementId::Node(node_id) => {
                        nodes.insert(node_id.clone());
                    }
                    ElementId::Container(child_id) => {
                        if seen.insert(child_id.clone()) {
                            containers.insert(child_id.clone());
                            stack.push(child_id.clone());
                        }
                    }
                }
            }
        }
        Subtree { nodes, containers }
    }

    /// True if some container in the chain starting at `start` (inclusive)
    /// is collapsed.
    fn chain_has_collapsed(&self, start: &ContainerId) -> bool {
        let mut seen: HashSet<ContainerId> = HashSet::new();
        let mut current = Some(start);
        while let Some(container_id) = current {
            if !seen.insert(container_id.clone()) {
                // Fallback for malformed cyclic parent chains.
                return false;
            }
            if self.collapsed.contains(container_id.as_str()) {
                return true;
            }
            current = self.container_parent.get(container_id.as_str());
        }
        false
    }

    /// A node is covered while any ancestor container is collapsed.
    pub(crate) fn node_is_covered(&self, id: &NodeId) -> bool {
        match self.node_parent.get(id.as_str()) {
            Some(parent) => self.chain_has_collapsed(parent),
            None => false,
        }
    }

    /// A container is covered while any *strict* ancestor is collapsed;
    /// a collapsed container is itself the visible proxy for its subtree.
    pub(crate) fn container_is_covered(&self, id: &ContainerId) -> bool {
        match self.container_parent.get(id.as_str()) {
            Some(parent) => self.chain_has_collapsed(parent),
            None => false,
        }
    }

    /// Resolve a node to its visible stand-in: the outermost collapsed
    /// ancestor if one exists, otherwise the node itself.
    pub(crate) fn resolve_node(&self, id: &NodeId) -> ElementId {
        let mut proxy: Option<ContainerId> = None;
        let mut seen: HashSet<ContainerId> = HashSet::new();
        let mut current = self.node_parent.get(id.as_str());
        while let Some(container_id) = current {
            if !seen.insert(container_id.clone()) {
                break;
            }
            if self.collapsed.contains(container_id.as_str()) {
                proxy = Some(container_id.clone());
            }
            current = self.container_parent.get(container_id.as_str());
        }
        match proxy {
            Some(container_id) => ElementId::Container(container_id),
            None => ElementId::Node(id.clone()),
        }
    }

    // ------------------------------------------------------------------
    // Visibility maintenance
    // ------------------------------------------------------------------

    /// Recompute hidden flags for the edges touching the given nodes, via
    /// the adjacency index.
    fn refresh_edges_touching(&mut self, nodes: &BTreeSet<NodeId>) {
        let touching: BTreeSet<EdgeId> = nodes
            .iter()
            .flat_map(|node_id| self.node_edges(node_id.as_str()).cloned())
            .collect();
        for edge_id in touching {
            let endpoints = self
                .edges
                .get(&edge_id)
                .map(|edge| (edge.source.clone(), edge.target.clone()));
            if let Some((source, target)) = endpoints {
                let hidden = self.node_is_covered(&source) || self.node_is_covered(&target);
                if let Some(edge) = self.edges.get_mut(&edge_id) {
                    edge.hidden = hidden;
                }
            }
        }
    }

    /// Recompute every hidden flag from the containment chain rule. Used
    /// after structural mutations (container replacement or removal) where
    /// the affected set is not a single subtree.
    pub(crate) fn refresh_visibility(&mut self) {
        let node_ids: Vec<NodeId> = self.nodes.keys().cloned().collect();
        for node_id in node_ids {
            let hidden = self.node_is_covered(&node_id);
            if let Some(node) = self.nodes.get_mut(&node_id) {
                node.hidden = hidden;
            }
        }
        let container_ids: Vec<ContainerId> = self.containers.keys().cloned().collect();
        for container_id in container_ids {
            let hidden = self.container_is_covered(&container_id);
            if let Some(container) = self.containers.get_mut(&container_id) {
                container.hidden = hidden;
            }
        }
        let edge_ids: Vec<EdgeId> = self.edges.keys().cloned().collect();
        for edge_id in edge_ids {
            let endpoints = self
                .edges
                .get(&edge_id)
                .map(|edge| (edge.source.clone(), edge.target.clone()));
            if let Some((source, target)) = endpoints {
                let hidden = self.node_is_covered(&source) || self.node_is_covered(&target);
                if let Some(edge) = self.edges.get_mut(&edge_id) {
                    edge.hidden = hidden;
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Hyperedge derivation
    // ------------------------------------------------------------------

    /// Rebuild the hyperedge map from its defining derivation. For every
    /// live edge, resolve both endpoints to their visible stand-ins; an
    /// edge whose endpoints resolve to two different elements, at least one
    /// of them a collapsed container, contributes to the hyperedge for that
    /// directed pair. Edges are visited in id order so contributor lists
    /// and cached internal endpoints come out deterministic.
    pub(crate) fn rebuild_hyper_edges(&mut self) {
        if self.collapsed.is_empty() {
            self.hyper_edges.clear();
            self.prune_stale_edge_layouts();
            return;
        }
        let mut edge_ids: Vec<EdgeId> = self.edges.keys().cloned().collect();
        edge_ids.sort();
        let mut rebuilt: HashMap<HyperEdgeId, HyperEdge> = HashMap::new();
        for edge_id in edge_ids {
            let Some(edge) = self.edges.get(&edge_id) else {
                continue;
            };
            let source = self.resolve_node(&edge.source);
            let target = self.resolve_node(&edge.target);
            if !source.is_container() && !target.is_container() {
                // Both endpoints visible: the edge renders as itself.
                continue;
            }
            if source == target {
                // Fully internal to one collapsed proxy: no representation.
                continue;
            }
            let internal_endpoint = if source.is_container() {
                edge.source.clone()
            } else {
                edge.target.clone()
            };
            let id = HyperEdgeId::between(&source, &target);
            let entry = rebuilt.entry(id.clone()).or_insert_with(|| HyperEdge {
                id,
                source: source.clone(),
                target: target.clone(),
                original_edges: Vec::new(),
                internal_endpoint,
                emphasis: edge.emphasis,
            });
            entry.original_edges.push(edge.id.clone());
        }
        for hyper_edge in rebuilt.values_mut() {
            hyper_edge.emphasis = aggregate_emphasis(
                hyper_edge
                    .original_edges
                    .iter()
                    .filter_map(|edge_id| self.edges.get(edge_id.as_str()))
                    .map(|edge| edge.emphasis),
            );
        }
        self.hyper_edges = rebuilt;
        self.prune_stale_edge_layouts();
    }

    /// Re-aggregate hyperedge styles from their contributors, without
    /// touching membership. Used when a hidden edge changes emphasis.
    pub(crate) fn restyle_hyper_edges(&mut self) {
        let ids: Vec<HyperEdgeId> = self.hyper_edges.keys().cloned().collect();
        for id in ids {
            let emphasis = self.hyper_edges.get(&id).map(|hyper_edge| {
                aggregate_emphasis(
                    hyper_edge
                        .original_edges
                        .iter()
                        .filter_map(|edge_id| self.edges.get(edge_id.as_str()))
                        .map(|edge| edge.emphasis),
                )
            });
            if let (Some(emphasis), Some(hyper_edge)) = (emphasis, self.hyper_edges.get_mut(&id)) {
                hyper_edge.emphasis = emphasis;
            }
        }
    }
}
