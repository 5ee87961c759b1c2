pub mod config;
pub mod tree_node;
