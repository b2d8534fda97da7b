//! Side channel for the external geometry solver.
//!
//! The layout engine reads the visible projections, solves geometry, and
//! writes positions, sizes, and edge routing back through these methods.
//! The engine stores the results verbatim and never interprets them;
//! removal cascades drop the entries along with their entities.

use std::collections::HashMap;

use flowview_core::{EdgeLayout, NodeLayout};
use serde::{Deserialize, Serialize};

use crate::state::VisualizationState;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct LayoutStore {
    /// Keyed by node or container id; the solver treats both as boxes.
    pub(crate) node_layouts: HashMap<String, NodeLayout>,
    /// Keyed by edge or hyperedge id.
    pub(crate) edge_layouts: HashMap<String, EdgeLayout>,
}

impl VisualizationState {
    /// Store solved geometry for a node or container. Unknown ids are
    /// ignored so stale solver output cannot leak entries into the store.
    pub fn set_node_layout(&mut self, id: &str, layout: NodeLayout) {
        if self.nodes.contains_key(id) || self.containers.contains_key(id) {
            self.layout.node_layouts.insert(id.to_owned(), layout);
        } else {
            tracing::debug!(id, "Ignoring layout for unknown node or container");
        }
    }

    pub fn get_node_layout(&self, id: &str) -> Option<&NodeLayout> {
        self.layout.node_layouts.get(id)
    }

    /// Store solved routing for an edge or hyperedge.
    pub fn set_edge_layout(&mut self, id: &str, layout: EdgeLayout) {
        if self.edges.contains_key(id) || self.hyper_edges.contains_key(id) {
            self.layout.edge_layouts.insert(id.to_owned(), layout);
        } else {
            tracing::debug!(id, "Ignoring layout for unknown edge");
        }
    }

    pub fn get_edge_layout(&self, id: &str) -> Option<&EdgeLayout> {
        self.layout.edge_layouts.get(id)
    }

    /// Drop routing entries whose edge or hyperedge no longer exists.
    /// Hyperedges come and go with collapse state, so this runs after
    /// every hyperedge rebuild.
    pub(crate) fn prune_stale_edge_layouts(&mut self) {
        let edges = &self.edges;
        let hyper_edges = &self.hyper_edges;
        self.layout
            .edge_layouts
            .retain(|id, _| edges.contains_key(id.as_str()) || hyper_edges.contains_key(id.as_str()));
    }
}
