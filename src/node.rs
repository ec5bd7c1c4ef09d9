//! Tree vertices stored in the slot arena.

use crate::bucket::Bucket;

slotmap::new_key_type! {
    /// Generational index of a node in the arena.
    pub(crate) struct NodeKey;
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Color {
    Red,
    Black,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    #[inline]
    pub(crate) fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// A child link of `None` is the black sentinel leaf.
#[derive(Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) color: Color,
    pub(crate) hash: i64,
    pub(crate) bucket: Bucket<K, V>,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) left: Option<NodeKey>,
    pub(crate) right: Option<NodeKey>,
}

impl<K, V> Node<K, V> {
    /// A fresh red node with sentinel children.
    pub(crate) fn red(hash: i64, bucket: Bucket<K, V>, parent: Option<NodeKey>) -> Self {
        Self {
            color: Color::Red,
            hash,
            bucket,
            parent,
            left: None,
            right: None,
        }
    }

    #[inline]
    pub(crate) fn child(&self, side: Side) -> Option<NodeKey> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    #[inline]
    pub(crate) fn child_mut(&mut self, side: Side) -> &mut Option<NodeKey> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}
