mod component;
pub mod interaction;
pub mod layout;
mod render;
mod state;
mod types;
pub mod visual;

pub use component::ForceGraphCanvas;
pub use interaction::{InteractionLayer, NodeFilter, Tooltip};
pub use layout::LayoutSettings;
pub use types::{LayoutEdge, LayoutGraph, LayoutNode};
pub use visual::ColorMode;
