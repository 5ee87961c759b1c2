use std::{cell::RefCell, marker::PhantomData, rc::Rc};

use crate::morris::ThreadLinks;

pub type NodeRef<T> = Rc<RefCell<TreeNode<T>>>;

/// A heap node owning its children through `Rc<RefCell<..>>`.
///
/// Nothing stops a caller from linking one node under two parents or building
/// a cycle. Such shapes are not trees and the Morris walk is undefined on
/// them.
#[derive(Debug, PartialEq, Eq)]
pub struct TreeNode<T> {
    pub val: T,
    pub left: Option<NodeRef<T>>,
    pub right: Option<NodeRef<T>>,
}

impl<T> TreeNode<T> {
    pub fn new(val: T) -> Self {
        Self {
            val,
            left: None,
            right: None,
        }
    }

    pub fn leaf(val: T) -> NodeRef<T> {
        Rc::new(RefCell::new(Self::new(val)))
    }

    pub fn branch(val: T, left: Option<NodeRef<T>>, right: Option<NodeRef<T>>) -> NodeRef<T> {
        Rc::new(RefCell::new(Self { val, left, right }))
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

// The derived drop would recurse once per level. Instead children are torn
// down in a loop: a node with a left child is rotated right until the front
// node has none, then it is freed and the walk moves to its right child.
impl<T> Drop for TreeNode<T> {
    fn drop(&mut self) {
        unlink(self.left.take());
        unlink(self.right.take());
    }
}

fn unlink<T>(mut next: Option<NodeRef<T>>) {
    while let Some(node) = next.take() {
        // still owned elsewhere, whoever holds it frees the rest
        if Rc::strong_count(&node) > 1 {
            return;
        }
        let mut inner = node.borrow_mut();
        match inner.left.take() {
            Some(left) => {
                inner.left = left.borrow_mut().right.take();
                drop(inner);
                left.borrow_mut().right = Some(node);
                next = Some(left);
            }
            None => next = inner.right.take(),
        }
    }
}

/// [`ThreadLinks`] over `Rc` nodes. Stateless: the links live in the nodes.
pub struct RcLinks<T>(PhantomData<T>);

impl<T> RcLinks<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for RcLinks<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ThreadLinks for RcLinks<T> {
    type Handle = NodeRef<T>;

    fn left(&self, node: &NodeRef<T>) -> Option<NodeRef<T>> {
        node.borrow().left.clone()
    }

    fn right(&self, node: &NodeRef<T>) -> Option<NodeRef<T>> {
        node.borrow().right.clone()
    }

    fn set_right(&mut self, node: &NodeRef<T>, right: Option<NodeRef<T>>) {
        node.borrow_mut().right = right;
    }

    fn same(&self, a: &NodeRef<T>, b: &NodeRef<T>) -> bool {
        Rc::ptr_eq(a, b)
    }
}
