use std::iter::FusedIterator;

use super::MorrisCursor;
use crate::tree::{Links, NodeId};

/// Values of a [`BinaryTree`](crate::tree::BinaryTree) in in-order sequence.
pub struct InorderIter<'a, T> {
    values: &'a [T],
    cursor: MorrisCursor<'a, [Links]>,
}

impl<'a, T> InorderIter<'a, T> {
    pub(crate) fn new(values: &'a [T], cursor: MorrisCursor<'a, [Links]>) -> Self {
        Self { values, cursor }
    }

    pub fn steps(&self) -> usize {
        self.cursor.steps()
    }
}

impl<'a, T> Iterator for InorderIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let values = self.values;
        self.cursor.advance().map(|id| &values[id.index()])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.cursor.is_done() {
            (0, Some(0))
        } else {
            (1, Some(self.values.len()))
        }
    }
}

impl<'a, T> FusedIterator for InorderIter<'a, T> {}

/// Node ids of a [`BinaryTree`](crate::tree::BinaryTree) in in-order sequence.
pub struct InorderIds<'a> {
    cursor: MorrisCursor<'a, [Links]>,
}

impl<'a> InorderIds<'a> {
    pub(crate) fn new(cursor: MorrisCursor<'a, [Links]>) -> Self {
        Self { cursor }
    }
}

impl<'a> Iterator for InorderIds<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        self.cursor.advance()
    }
}

impl<'a> FusedIterator for InorderIds<'a> {}
