pub mod collapse;
pub mod ingest;
pub mod layout;
pub mod projection;
pub mod state;
pub mod style;

pub use ingest::build_state;
pub use state::{
    Container, EdgeUpdate, GraphEdge, GraphNode, HyperEdge, NodeUpdate, VisualizationState,
};
pub use style::aggregate_emphasis;
