use anyhow::Result;

use crate::tree::NodeId;

/// Tells the traversal whether to keep emitting nodes.
///
/// In-order visiting has no notion of skipping a subtree once its root is
/// reached (the left subtree has already been emitted), so unlike a pre-order
/// walk there is no `Skip`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitRecursion {
    Continue,
    Stop,
}

/// Receives nodes in in-order sequence during
/// [`BinaryTree::visit_inorder`](crate::tree::BinaryTree::visit_inorder).
///
/// Returning `Stop` or an error ends the walk early; the tree is put back
/// into its original shape before control returns to the caller either way.
pub trait InorderVisitor<T> {
    fn visit(&mut self, id: NodeId, value: &T) -> Result<VisitRecursion>;
}

impl<T, F> InorderVisitor<T> for F
where
    F: FnMut(NodeId, &T) -> Result<VisitRecursion>,
{
    fn visit(&mut self, id: NodeId, value: &T) -> Result<VisitRecursion> {
        self(id, value)
    }
}
