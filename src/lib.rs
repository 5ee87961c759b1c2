//! Stack-free in-order traversal of binary trees (Morris traversal).
//!
//! ```
//! use morris::{inorder, BinaryTree};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut tree = BinaryTree::new();
//! let root = tree.insert_root(2)?;
//! tree.insert_left(root, 1)?;
//! tree.insert_right(root, 3)?;
//! assert_eq!(inorder(&mut tree), vec![1, 2, 3]);
//! # Ok(())
//! # }
//! ```

pub mod common;
pub mod error;
pub mod morris;
pub mod tree;

pub use common::config::{ConfigOptions, TraversalOptions};
pub use common::tree_node::{InorderVisitor, VisitRecursion};
pub use error::TreeError;
pub use morris::{inorder, inorder_linked, try_inorder, try_inorder_linked, MorrisCursor, ThreadLinks};
pub use tree::linked::{NodeRef, TreeNode};
pub use tree::{BinaryTree, Links, NodeId};
