//! Binary tree representations the Morris engine runs on.
//!
//! [`BinaryTree`] keeps its nodes in an arena and links them by [`NodeId`].
//! Values and links live in separate vectors so a traversal can lend out
//! `&T` while it is rewriting links. The [`linked`] module holds the
//! `Rc<RefCell<..>>` node form.

pub mod linked;

use anyhow::Result;
use tracing::debug;

use crate::common::config::TraversalOptions;
use crate::common::tree_node::{InorderVisitor, VisitRecursion};
use crate::error::TreeError;
use crate::morris::{InorderIds, InorderIter, MorrisCursor, ThreadLinks};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Child slots of one node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Links {
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
}

impl Links {
    pub fn left(&self) -> Option<NodeId> {
        self.left
    }

    pub fn right(&self) -> Option<NodeId> {
        self.right
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

impl ThreadLinks for [Links] {
    type Handle = NodeId;

    const ACYCLIC: bool = true;

    fn left(&self, node: &NodeId) -> Option<NodeId> {
        self[node.0].left
    }

    fn right(&self, node: &NodeId) -> Option<NodeId> {
        self[node.0].right
    }

    fn set_right(&mut self, node: &NodeId, right: Option<NodeId>) {
        self[node.0].right = right;
    }

    fn same(&self, a: &NodeId, b: &NodeId) -> bool {
        a == b
    }
}

/// An arena-allocated binary tree.
///
/// Nodes are only ever created beneath an existing node (or as the root), so
/// every `BinaryTree` is a well-formed tree: one parent per node, no cycles.
#[derive(Debug, Clone)]
pub struct BinaryTree<T> {
    values: Vec<T>,
    links: Vec<Links>,
    root: Option<NodeId>,
}

impl<T> Default for BinaryTree<T> {
    fn default() -> Self {
        Self {
            values: vec![],
            links: vec![],
            root: None,
        }
    }
}

impl<T> BinaryTree<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value(&self, id: NodeId) -> Option<&T> {
        self.values.get(id.0)
    }

    pub fn value_mut(&mut self, id: NodeId) -> Option<&mut T> {
        self.values.get_mut(id.0)
    }

    pub fn links(&self, id: NodeId) -> Option<Links> {
        self.links.get(id.0).copied()
    }

    pub fn left(&self, id: NodeId) -> Option<NodeId> {
        self.links.get(id.0).and_then(|l| l.left)
    }

    pub fn right(&self, id: NodeId) -> Option<NodeId> {
        self.links.get(id.0).and_then(|l| l.right)
    }

    /// Snapshot of every node's links, indexed by `NodeId::index`.
    pub fn shape(&self) -> Vec<Links> {
        self.links.clone()
    }

    pub fn insert_root(&mut self, value: T) -> Result<NodeId> {
        if self.root.is_some() {
            return Err(TreeError::RootAlreadySet.into());
        }
        let id = self.push(value);
        self.root = Some(id);
        Ok(id)
    }

    pub fn insert_left(&mut self, parent: NodeId, value: T) -> Result<NodeId> {
        self.check_slot(parent, self.left(parent), "left")?;
        let id = self.push(value);
        self.links[parent.0].left = Some(id);
        Ok(id)
    }

    pub fn insert_right(&mut self, parent: NodeId, value: T) -> Result<NodeId> {
        self.check_slot(parent, self.right(parent), "right")?;
        let id = self.push(value);
        self.links[parent.0].right = Some(id);
        Ok(id)
    }

    fn check_slot(&self, parent: NodeId, slot: Option<NodeId>, side: &'static str) -> Result<()> {
        if parent.0 >= self.links.len() {
            return Err(TreeError::NodeNotFound(parent.0).into());
        }
        if slot.is_some() {
            return Err(TreeError::SlotOccupied(parent.0, side).into());
        }
        Ok(())
    }

    fn push(&mut self, value: T) -> NodeId {
        let id = NodeId(self.values.len());
        self.values.push(value);
        self.links.push(Links::default());
        id
    }

    /// Lazily yields values in in-order sequence.
    ///
    /// The tree is threaded while the iterator is alive and restored when it
    /// is exhausted or dropped.
    pub fn iter_inorder(&mut self) -> InorderIter<'_, T> {
        let cursor = MorrisCursor::new(self.links.as_mut_slice(), self.root, None);
        InorderIter::new(&self.values, cursor)
    }

    /// Like [`iter_inorder`](Self::iter_inorder) but yields node ids, so nodes
    /// holding equal values stay distinguishable.
    pub fn inorder_ids(&mut self) -> InorderIds<'_> {
        InorderIds::new(MorrisCursor::new(self.links.as_mut_slice(), self.root, None))
    }

    /// Hands every node to `visitor` in in-order sequence.
    ///
    /// Returns `Stop` if the visitor stopped the walk, `Continue` otherwise.
    /// The tree is restored before returning, including when the visitor
    /// fails or `step_limit` is exceeded.
    pub fn visit_inorder<V>(&mut self, visitor: &mut V, options: &TraversalOptions) -> Result<VisitRecursion>
    where
        V: InorderVisitor<T>,
    {
        let values = &self.values;
        let mut cursor = MorrisCursor::new(self.links.as_mut_slice(), self.root, options.limit())
            .log_threads(options.log_threads);
        while let Some(id) = cursor.advance() {
            match visitor.visit(id, &values[id.0])? {
                VisitRecursion::Continue => {}
                VisitRecursion::Stop => {
                    debug!("visitor stopped after {} steps", cursor.steps());
                    return Ok(VisitRecursion::Stop);
                }
            }
        }
        cursor.finish()?;
        Ok(VisitRecursion::Continue)
    }
}
