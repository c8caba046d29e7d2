pub mod force_graph;
pub mod knowledge_graph;
