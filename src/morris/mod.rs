//! Morris in-order traversal.
//!
//! The engine walks a tree with O(1) extra space. Before descending into a
//! node's left subtree it points the right link of that subtree's rightmost
//! node (the predecessor) back at the node. Reaching the predecessor later
//! follows that thread back up, which is how the walk returns without a stack.
//! Finding the thread a second time means the left subtree is done, so the
//! thread is removed and the node is emitted.
//!
//! The algorithm is written once against [`ThreadLinks`] and runs on both the
//! arena [`BinaryTree`] and linked [`TreeNode`](crate::tree::linked::TreeNode)s.

mod iter;

pub use iter::{InorderIds, InorderIter};

use anyhow::Result;
use tracing::{debug, trace, warn};

use crate::common::config::TraversalOptions;
use crate::common::tree_node::VisitRecursion;
use crate::error::TreeError;
use crate::tree::linked::{NodeRef, RcLinks};
use crate::tree::{BinaryTree, NodeId};

/// Link access the traversal needs from a tree representation.
///
/// Only right links are ever written, and every write made during a complete
/// traversal is undone before it finishes.
pub trait ThreadLinks {
    type Handle: Clone;

    /// Set when every tree reachable through these links is well formed by
    /// construction. A cursor over such links that trips its step limit still
    /// finishes the walk (without the limit) so no thread is left behind.
    const ACYCLIC: bool = false;

    fn left(&self, node: &Self::Handle) -> Option<Self::Handle>;
    fn right(&self, node: &Self::Handle) -> Option<Self::Handle>;
    fn set_right(&mut self, node: &Self::Handle, right: Option<Self::Handle>);
    /// Node identity, never value equality.
    fn same(&self, a: &Self::Handle, b: &Self::Handle) -> bool;
}

/// Resumable Morris traversal state.
///
/// Each [`advance`](Self::advance) runs the state machine until the next node
/// is emitted. Dropping the cursor before the walk is complete finishes the
/// walk silently so that no thread is left in the tree.
pub struct MorrisCursor<'a, L: ThreadLinks + ?Sized> {
    links: &'a mut L,
    current: Option<L::Handle>,
    steps: usize,
    limit: Option<usize>,
    tripped: bool,
    log_threads: bool,
}

impl<'a, L: ThreadLinks + ?Sized> MorrisCursor<'a, L> {
    /// Starts a walk at `root`, which must be a node of `links`.
    ///
    /// # Panics
    ///
    /// `advance` panics if `root` does not belong to `links`, e.g. a
    /// [`NodeId`] from a different, larger `BinaryTree`.
    pub fn new(links: &'a mut L, root: Option<L::Handle>, limit: Option<usize>) -> Self {
        Self {
            links,
            current: root,
            steps: 0,
            limit,
            tripped: false,
            log_threads: false,
        }
    }

    pub fn log_threads(mut self, log_threads: bool) -> Self {
        self.log_threads = log_threads;
        self
    }

    /// Steps taken so far: loop iterations plus predecessor links followed.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn is_done(&self) -> bool {
        self.tripped || self.current.is_none()
    }

    /// Reports whether the walk was cut short by the step limit.
    pub fn finish(&self) -> Result<()> {
        match (self.tripped, self.limit) {
            (true, Some(limit)) => Err(TreeError::StepLimitExceeded(limit).into()),
            _ => Ok(()),
        }
    }

    /// Returns the next node in in-order sequence, or `None` once the walk is
    /// complete or the step limit has been hit.
    pub fn advance(&mut self) -> Option<L::Handle> {
        if self.tripped {
            return None;
        }
        self.step()
    }

    fn step(&mut self) -> Option<L::Handle> {
        while let Some(current) = self.current.take() {
            if !self.charge() {
                self.park(current);
                return None;
            }
            let left = match self.links.left(&current) {
                Some(left) => left,
                None => {
                    self.current = self.links.right(&current);
                    return Some(current);
                }
            };

            // rightmost node of the left subtree, stopping early at our own thread
            let mut pred = left.clone();
            loop {
                match self.links.right(&pred) {
                    Some(next) if !self.links.same(&next, &current) => {
                        if !self.charge() {
                            // no link has been written for this node yet
                            self.park(current);
                            return None;
                        }
                        pred = next;
                    }
                    _ => break,
                }
            }

            if self.links.right(&pred).is_none() {
                self.links.set_right(&pred, Some(current.clone()));
                if self.log_threads {
                    trace!(step = self.steps, "thread created");
                }
                self.current = Some(left);
            } else {
                self.links.set_right(&pred, None);
                if self.log_threads {
                    trace!(step = self.steps, "thread removed");
                }
                self.current = self.links.right(&current);
                return Some(current);
            }
        }
        None
    }

    /// Counts one step. Returns false the first time the limit is exceeded;
    /// after that the limit no longer applies.
    fn charge(&mut self) -> bool {
        self.steps += 1;
        match self.limit {
            Some(limit) if !self.tripped && self.steps > limit => {
                warn!(limit, "morris traversal exceeded its step limit");
                self.tripped = true;
                false
            }
            _ => true,
        }
    }

    /// Keeps the node a tripped walk stopped at when the links allow the walk
    /// to be finished later; otherwise the walk is abandoned where it stands.
    fn park(&mut self, current: L::Handle) {
        if L::ACYCLIC {
            self.current = Some(current);
        }
    }
}

impl<'a, L: ThreadLinks + ?Sized> Drop for MorrisCursor<'a, L> {
    fn drop(&mut self) {
        if self.current.is_none() {
            return;
        }
        let mut skipped = 0usize;
        while self.step().is_some() {
            skipped += 1;
        }
        trace!(skipped, steps = self.steps, "drained unfinished traversal");
    }
}

/// In-order values of `tree`. The tree is left exactly as it was found.
pub fn inorder<T: Clone>(tree: &mut BinaryTree<T>) -> Vec<T> {
    debug!("morris traversal of {} nodes", tree.len());
    let mut out = Vec::with_capacity(tree.len());
    out.extend(tree.iter_inorder().cloned());
    out
}

/// [`inorder`] with `options` applied.
pub fn try_inorder<T: Clone>(tree: &mut BinaryTree<T>, options: &TraversalOptions) -> Result<Vec<T>> {
    debug!("morris traversal of {} nodes, options {:?}", tree.len(), options);
    let mut out = Vec::with_capacity(tree.len());
    let mut collect = |_: NodeId, value: &T| -> Result<VisitRecursion> {
        out.push(value.clone());
        Ok(VisitRecursion::Continue)
    };
    tree.visit_inorder(&mut collect, options)?;
    Ok(out)
}

/// In-order values of a linked tree rooted at `root`.
///
/// The nodes must not be reachable from anywhere else while this runs: a
/// shared node or a cycle breaks the thread detection and the walk may never
/// end. Use [`try_inorder_linked`] with a step limit for untrusted trees.
pub fn inorder_linked<T: Clone>(root: Option<NodeRef<T>>) -> Vec<T> {
    let mut links = RcLinks::new();
    let mut cursor = MorrisCursor::new(&mut links, root, None);
    let mut out = vec![];
    while let Some(node) = cursor.advance() {
        out.push(node.borrow().val.clone());
    }
    debug!("linked morris traversal emitted {} nodes in {} steps", out.len(), cursor.steps());
    out
}

/// [`inorder_linked`] with `options` applied. Fails with
/// [`TreeError::StepLimitExceeded`] when the walk outruns `step_limit`.
pub fn try_inorder_linked<T: Clone>(root: Option<NodeRef<T>>, options: &TraversalOptions) -> Result<Vec<T>> {
    let mut links = RcLinks::new();
    let mut cursor = MorrisCursor::new(&mut links, root, options.limit()).log_threads(options.log_threads);
    let mut out = vec![];
    while let Some(node) = cursor.advance() {
        out.push(node.borrow().val.clone());
    }
    cursor.finish()?;
    debug!("linked morris traversal emitted {} nodes in {} steps", out.len(), cursor.steps());
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::common::tree_node::InorderVisitor;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    /// 1(left=2(left=4,right=5), right=3(left=6))
    fn sample_tree() -> Result<BinaryTree<i32>> {
        let mut tree = BinaryTree::new();
        let n1 = tree.insert_root(1)?;
        let n2 = tree.insert_left(n1, 2)?;
        let n3 = tree.insert_right(n1, 3)?;
        tree.insert_left(n2, 4)?;
        tree.insert_right(n2, 5)?;
        tree.insert_left(n3, 6)?;
        Ok(tree)
    }

    fn left_chain(n: usize) -> Result<BinaryTree<usize>> {
        let mut tree = BinaryTree::new();
        let mut node = tree.insert_root(n)?;
        for v in (0..n).rev() {
            node = tree.insert_left(node, v)?;
        }
        Ok(tree)
    }

    fn right_chain(n: usize) -> Result<BinaryTree<usize>> {
        let mut tree = BinaryTree::new();
        let mut node = tree.insert_root(0)?;
        for v in 1..=n {
            node = tree.insert_right(node, v)?;
        }
        Ok(tree)
    }

    /// complete tree of n nodes in heap layout, each value is its heap index
    fn complete_tree(n: usize) -> Result<BinaryTree<usize>> {
        fn build(tree: &mut BinaryTree<usize>, parent: NodeId, heap: usize, n: usize) -> Result<()> {
            let l = heap * 2 + 1;
            let r = heap * 2 + 2;
            if l < n {
                let id = tree.insert_left(parent, l)?;
                build(tree, id, l, n)?;
            }
            if r < n {
                let id = tree.insert_right(parent, r)?;
                build(tree, id, r, n)?;
            }
            Ok(())
        }
        let mut tree = BinaryTree::new();
        if n > 0 {
            let root = tree.insert_root(0)?;
            build(&mut tree, root, 0, n)?;
        }
        Ok(tree)
    }

    fn recursive_inorder<T: Clone>(tree: &BinaryTree<T>, node: Option<NodeId>, out: &mut Vec<T>) {
        if let Some(id) = node {
            recursive_inorder(tree, tree.left(id), out);
            out.push(tree.value(id).unwrap().clone());
            recursive_inorder(tree, tree.right(id), out);
        }
    }

    #[test]
    fn test_empty_tree() {
        let mut tree: BinaryTree<i32> = BinaryTree::new();
        assert!(inorder(&mut tree).is_empty());
        assert_eq!(tree.iter_inorder().count(), 0);
    }

    #[test]
    fn test_single_node() -> Result<()> {
        let mut tree = BinaryTree::new();
        tree.insert_root("v")?;
        assert_eq!(inorder(&mut tree), vec!["v"]);
        Ok(())
    }

    #[test]
    fn test_sample_order() -> Result<()> {
        let mut tree = sample_tree()?;
        assert_eq!(inorder(&mut tree), vec![4, 2, 5, 1, 6, 3]);
        Ok(())
    }

    #[test]
    fn test_shape_restored() -> Result<()> {
        let mut tree = sample_tree()?;
        let before = tree.shape();
        inorder(&mut tree);
        assert_eq!(tree.shape(), before);
        Ok(())
    }

    #[test]
    fn test_idempotent() -> Result<()> {
        let mut tree = complete_tree(37)?;
        let first = inorder(&mut tree);
        let second = inorder(&mut tree);
        assert_eq!(first, second);
        assert_eq!(first.len(), 37);
        Ok(())
    }

    #[test]
    fn test_matches_recursive_walk() -> Result<()> {
        for n in 0..64 {
            let mut tree = complete_tree(n)?;
            let before = tree.shape();
            let mut expected = vec![];
            recursive_inorder(&tree, tree.root(), &mut expected);
            assert_eq!(inorder(&mut tree), expected);
            assert_eq!(tree.shape(), before);
        }
        Ok(())
    }

    #[test]
    fn test_left_chain() -> Result<()> {
        let n = 100_000;
        let mut tree = left_chain(n)?;
        let before = tree.shape();
        let out = inorder(&mut tree);
        assert_eq!(out.len(), n + 1);
        assert!(out.iter().copied().eq(0..=n));
        assert_eq!(tree.shape(), before);
        Ok(())
    }

    #[test]
    fn test_right_chain() -> Result<()> {
        let n = 100_000;
        let mut tree = right_chain(n)?;
        let before = tree.shape();
        let out = inorder(&mut tree);
        assert!(out.iter().copied().eq(0..=n));
        assert_eq!(tree.shape(), before);
        Ok(())
    }

    #[test]
    fn test_linear_steps() -> Result<()> {
        for mut tree in [complete_tree(1000)?, left_chain(999)?, right_chain(999)?] {
            let n = tree.len();
            let limit = 4 * n;
            let options = TraversalOptions::default().with_step_limit(limit);
            assert_eq!(try_inorder(&mut tree, &options)?.len(), n);

            let mut iter = tree.iter_inorder();
            let emitted = iter.by_ref().count();
            assert_eq!(emitted, n);
            assert!(iter.steps() < limit);
        }
        Ok(())
    }

    #[test]
    fn test_step_limit_too_small() -> Result<()> {
        let mut tree = sample_tree()?;
        let options = TraversalOptions::default().with_step_limit(3);
        let before = tree.shape();
        let err = try_inorder(&mut tree, &options).unwrap_err();
        assert_eq!(err.downcast_ref::<TreeError>(), Some(&TreeError::StepLimitExceeded(3)));
        // an arena tree is finished off even though the limit tripped
        assert_eq!(tree.shape(), before);
        assert_eq!(inorder(&mut tree), vec![4, 2, 5, 1, 6, 3]);
        Ok(())
    }

    #[test]
    fn test_step_limit_trips_mid_spine() -> Result<()> {
        // every limit below the full cost trips at a different point of the walk
        for limit in 1..20 {
            let mut tree = complete_tree(15)?;
            let before = tree.shape();
            let expected = {
                let mut out = vec![];
                recursive_inorder(&tree, tree.root(), &mut out);
                out
            };
            let options = TraversalOptions::default().with_step_limit(limit);
            assert!(try_inorder(&mut tree, &options).is_err());
            assert_eq!(tree.shape(), before);
            assert_eq!(inorder(&mut tree), expected);
        }
        Ok(())
    }

    #[test]
    fn test_repeated_values() -> Result<()> {
        let mut tree = BinaryTree::new();
        let root = tree.insert_root(7)?;
        let a = tree.insert_left(root, 7)?;
        let b = tree.insert_right(root, 7)?;
        let c = tree.insert_left(a, 7)?;
        let d = tree.insert_right(a, 7)?;
        assert_eq!(inorder(&mut tree), vec![7; 5]);
        let ids: Vec<NodeId> = tree.inorder_ids().collect();
        assert_eq!(ids, vec![c, a, d, root, b]);
        Ok(())
    }

    #[test]
    fn test_early_drop_restores() -> Result<()> {
        let mut tree = sample_tree()?;
        let before = tree.shape();
        {
            let mut iter = tree.iter_inorder();
            assert_eq!(iter.next(), Some(&4));
            assert_eq!(iter.next(), Some(&2));
        }
        assert_eq!(tree.shape(), before);
        let first_two: Vec<i32> = tree.iter_inorder().take(2).copied().collect();
        assert_eq!(first_two, vec![4, 2]);
        assert_eq!(tree.shape(), before);
        assert_eq!(inorder(&mut tree), vec![4, 2, 5, 1, 6, 3]);
        Ok(())
    }

    #[test]
    fn test_visitor_stop() -> Result<()> {
        let mut tree = sample_tree()?;
        let before = tree.shape();
        let mut seen = vec![];
        let mut visitor = |_: NodeId, v: &i32| -> Result<VisitRecursion> {
            seen.push(*v);
            if *v == 5 {
                Ok(VisitRecursion::Stop)
            } else {
                Ok(VisitRecursion::Continue)
            }
        };
        let res = tree.visit_inorder(&mut visitor, &TraversalOptions::default())?;
        assert_eq!(res, VisitRecursion::Stop);
        assert_eq!(seen, vec![4, 2, 5]);
        assert_eq!(tree.shape(), before);
        Ok(())
    }

    #[test]
    fn test_visitor_error() -> Result<()> {
        struct FailAt(i32);
        impl InorderVisitor<i32> for FailAt {
            fn visit(&mut self, _id: NodeId, value: &i32) -> Result<VisitRecursion> {
                if *value == self.0 {
                    anyhow::bail!("refusing {}", value);
                }
                Ok(VisitRecursion::Continue)
            }
        }

        let mut tree = sample_tree()?;
        let before = tree.shape();
        let err = tree
            .visit_inorder(&mut FailAt(1), &TraversalOptions::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "refusing 1");
        assert_eq!(tree.shape(), before);
        Ok(())
    }

    #[test]
    fn test_logged_traversal() -> Result<()> {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace"));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(env_filter)
            .with_test_writer()
            .finish();
        tracing::subscriber::with_default(subscriber, || -> Result<()> {
            let mut tree = sample_tree()?;
            let options = TraversalOptions::default().with_log_threads(true);
            assert_eq!(try_inorder(&mut tree, &options)?, vec![4, 2, 5, 1, 6, 3]);
            Ok(())
        })
    }
}
