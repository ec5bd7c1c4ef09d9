//! Balancing engine: a red-black tree of hash-ordered nodes.
//!
//! Nodes live in a `SlotMap`; parent and child links are `NodeKey`s and a
//! `None` child is the black sentinel leaf. This layer never looks at keys:
//! it orders by the `i64` hash alone and treats each node's bucket as opaque
//! payload. That keeps user code (`K: Eq`, `K: Hash`) out of every rotation.

use crate::bucket::Bucket;
use crate::node::{Color, Node, NodeKey, Side};
use core::cmp::Ordering;
use slotmap::SlotMap;

/// Where a hash sits relative to the tree.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Probe {
    /// A node already carries this hash.
    Occupied(NodeKey),
    /// No node carries this hash; a new node belongs under `parent` on
    /// `side`. `parent` is `None` only when the tree is empty.
    Vacant {
        parent: Option<NodeKey>,
        side: Side,
    },
}

#[derive(Debug)]
pub(crate) struct RawTree<K, V> {
    slots: SlotMap<NodeKey, Node<K, V>>,
    root: Option<NodeKey>,
}

impl<K, V> RawTree<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            root: None,
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: SlotMap::with_capacity_and_key(capacity),
            root: None,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.root = None;
    }

    pub(crate) fn root(&self) -> Option<NodeKey> {
        self.root
    }

    pub(crate) fn node_count(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn node(&self, key: NodeKey) -> &Node<K, V> {
        &self.slots[key]
    }

    pub(crate) fn bucket_mut(&mut self, key: NodeKey) -> &mut Bucket<K, V> {
        &mut self.slots[key].bucket
    }

    /// Descend by hash until a node with `hash` or a sentinel is reached.
    pub(crate) fn probe(&self, hash: i64) -> Probe {
        let Some(mut cur) = self.root else {
            return Probe::Vacant {
                parent: None,
                side: Side::Left,
            };
        };
        loop {
            let node = &self.slots[cur];
            let side = match hash.cmp(&node.hash) {
                Ordering::Equal => return Probe::Occupied(cur),
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
            };
            match node.child(side) {
                Some(next) => cur = next,
                None => {
                    return Probe::Vacant {
                        parent: Some(cur),
                        side,
                    }
                }
            }
        }
    }

    pub(crate) fn find(&self, hash: i64) -> Option<NodeKey> {
        match self.probe(hash) {
            Probe::Occupied(key) => Some(key),
            Probe::Vacant { .. } => None,
        }
    }

    /// Hang a new red node at a vacant position reported by `probe` and
    /// restore the red-black invariants.
    pub(crate) fn attach(
        &mut self,
        parent: Option<NodeKey>,
        side: Side,
        hash: i64,
        bucket: Bucket<K, V>,
    ) -> NodeKey {
        let key = self.slots.insert(Node::red(hash, bucket, parent));
        match parent {
            Some(p) => {
                debug_assert!(self.slots[p].child(side).is_none());
                *self.slots[p].child_mut(side) = Some(key);
            }
            None => {
                debug_assert!(self.root.is_none());
                self.root = Some(key);
            }
        }
        self.insert_fixup(key);
        key
    }

    /// Physically remove `target` from the tree and return its bucket.
    ///
    /// The in-order neighbour (or `target` itself when it has no real
    /// children) is the node actually spliced out; its hash and bucket move
    /// into `target`'s slot first.
    pub(crate) fn unlink(&mut self, target: NodeKey) -> Bucket<K, V> {
        let rep = self.replacement(target);
        let (parent, color, child) = {
            let n = &self.slots[rep];
            (n.parent, n.color, n.right.or(n.left))
        };

        if let Some(c) = child {
            self.slots[c].parent = parent;
        }
        self.replace_child(parent, rep, child);

        let removed = self
            .slots
            .remove(rep)
            .expect("replacement node must be live while it is spliced out");
        let bucket = if rep == target {
            removed.bucket
        } else {
            let t = &mut self.slots[target];
            t.hash = removed.hash;
            core::mem::replace(&mut t.bucket, removed.bucket)
        };

        if color == Color::Black {
            match child {
                Some(c) if self.slots[c].color == Color::Red => {
                    self.slots[c].color = Color::Black;
                }
                _ => self.delete_fixup(child, parent),
            }
        }
        bucket
    }

    fn replacement(&self, node: NodeKey) -> NodeKey {
        let n = &self.slots[node];
        if let Some(right) = n.right {
            self.outermost(right, Side::Left)
        } else if let Some(left) = n.left {
            self.outermost(left, Side::Right)
        } else {
            node
        }
    }

    fn outermost(&self, mut node: NodeKey, side: Side) -> NodeKey {
        while let Some(next) = self.slots[node].child(side) {
            node = next;
        }
        node
    }

    #[inline]
    fn color_of(&self, node: Option<NodeKey>) -> Color {
        node.map_or(Color::Black, |k| self.slots[k].color)
    }

    /// Which side of `parent` holds `child`.
    #[inline]
    fn side_in(&self, parent: NodeKey, child: Option<NodeKey>) -> Side {
        if self.slots[parent].left == child {
            Side::Left
        } else {
            Side::Right
        }
    }

    fn replace_child(&mut self, parent: Option<NodeKey>, old: NodeKey, new: Option<NodeKey>) {
        match parent {
            Some(p) => {
                let side = self.side_in(p, Some(old));
                *self.slots[p].child_mut(side) = new;
            }
            None => self.root = new,
        }
    }

    /// Rotate `node` down toward `dir`: its child on the other side becomes
    /// the pivot and takes `node`'s place. A sentinel pivot makes this a
    /// no-op.
    fn rotate(&mut self, node: NodeKey, dir: Side) {
        let Some(pivot) = self.slots[node].child(dir.opposite()) else {
            return;
        };
        let inner = self.slots[pivot].child(dir);
        let parent = self.slots[node].parent;

        *self.slots[node].child_mut(dir.opposite()) = inner;
        if let Some(i) = inner {
            self.slots[i].parent = Some(node);
        }
        *self.slots[pivot].child_mut(dir) = Some(node);
        self.slots[node].parent = Some(pivot);
        self.slots[pivot].parent = parent;
        self.replace_child(parent, node, Some(pivot));
    }

    fn insert_fixup(&mut self, mut node: NodeKey) {
        loop {
            // Case 1: the root.
            let Some(mut parent) = self.slots[node].parent else {
                self.slots[node].color = Color::Black;
                return;
            };
            // Case 2
            if self.slots[parent].color == Color::Black {
                return;
            }
            let grand = self.slots[parent]
                .parent
                .expect("a red node is never the root");
            let parent_side = self.side_in(grand, Some(parent));
            let uncle = self.slots[grand].child(parent_side.opposite());

            // Case 3: red uncle, push the violation up.
            if self.color_of(uncle) == Color::Red {
                self.slots[parent].color = Color::Black;
                if let Some(u) = uncle {
                    self.slots[u].color = Color::Black;
                }
                self.slots[grand].color = Color::Red;
                node = grand;
                continue;
            }

            // Case 4: zig-zag becomes zig-zig.
            if self.side_in(parent, Some(node)) != parent_side {
                self.rotate(parent, parent_side);
                parent = node;
            }

            // Case 5
            self.slots[parent].color = Color::Black;
            self.slots[grand].color = Color::Red;
            self.rotate(grand, parent_side.opposite());
            return;
        }
    }

    /// Resolve a black-height deficit at `node`, which may be the sentinel
    /// and so carries its `parent` explicitly.
    fn delete_fixup(&mut self, mut node: Option<NodeKey>, mut parent: Option<NodeKey>) {
        loop {
            // Case 1: the deficit reached the root.
            let Some(p) = parent else {
                return;
            };
            let side = self.side_in(p, node);
            let far = side.opposite();

            // Case 2: red sibling.
            let mut sibling = self.slots[p].child(far);
            if self.color_of(sibling) == Color::Red {
                self.slots[p].color = Color::Red;
                if let Some(s) = sibling {
                    self.slots[s].color = Color::Black;
                }
                self.rotate(p, side);
                sibling = self.slots[p].child(far);
            }
            let mut sib = sibling.expect("a node short one black always has a real sibling");

            let near_nephew = self.slots[sib].child(side);
            let far_nephew = self.slots[sib].child(far);
            let sib_black = self.slots[sib].color == Color::Black;
            let nephews_black = self.color_of(near_nephew) == Color::Black
                && self.color_of(far_nephew) == Color::Black;

            // Case 3
            if self.slots[p].color == Color::Black && sib_black && nephews_black {
                self.slots[sib].color = Color::Red;
                node = Some(p);
                parent = self.slots[p].parent;
                continue;
            }

            // Case 4
            if self.slots[p].color == Color::Red && sib_black && nephews_black {
                self.slots[sib].color = Color::Red;
                self.slots[p].color = Color::Black;
                return;
            }

            // Case 5: near nephew red, far nephew black.
            if sib_black
                && self.color_of(near_nephew) == Color::Red
                && self.color_of(far_nephew) == Color::Black
            {
                self.slots[sib].color = Color::Red;
                if let Some(n) = near_nephew {
                    self.slots[n].color = Color::Black;
                }
                self.rotate(sib, far);
                sib = self.slots[p]
                    .child(far)
                    .expect("rotation lifted the near nephew into the sibling slot");
            }

            // Case 6
            let parent_color = self.slots[p].color;
            self.slots[sib].color = parent_color;
            self.slots[p].color = Color::Black;
            if let Some(f) = self.slots[sib].child(far) {
                self.slots[f].color = Color::Black;
            }
            self.rotate(p, side);
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::check_tree;

    fn put(t: &mut RawTree<i64, ()>, h: i64) {
        match t.probe(h) {
            Probe::Vacant { parent, side } => {
                t.attach(parent, side, h, Bucket::new(h, ()));
            }
            Probe::Occupied(_) => panic!("hash {h} already present"),
        }
    }

    fn take(t: &mut RawTree<i64, ()>, h: i64) {
        let k = t.find(h).expect("hash present");
        let (key, ()) = t.unlink(k).into_entry();
        assert_eq!(key, h);
    }

    fn hashes_in_order(t: &RawTree<i64, ()>) -> Vec<i64> {
        fn walk(t: &RawTree<i64, ()>, n: Option<NodeKey>, out: &mut Vec<i64>) {
            if let Some(k) = n {
                walk(t, t.node(k).left, out);
                out.push(t.node(k).hash);
                walk(t, t.node(k).right, out);
            }
        }
        let mut out = Vec::new();
        walk(t, t.root(), &mut out);
        out
    }

    fn check(t: &RawTree<i64, ()>) -> usize {
        check_tree(t, &|k: &i64| *k).expect("red-black invariants hold")
    }

    /// Invariant: the first node becomes a black root with sentinel children.
    #[test]
    fn first_node_is_black_root() {
        let mut t = RawTree::new();
        put(&mut t, 7);
        let root = t.root().unwrap();
        assert_eq!(t.node(root).color, Color::Black);
        assert_eq!(t.node(root).left, None);
        assert_eq!(t.node(root).right, None);
        assert_eq!(t.node(root).parent, None);
    }

    /// Invariant: ascending inserts trigger rotations that keep the tree
    /// balanced and retarget the root.
    #[test]
    fn ascending_inserts_rotate_root() {
        let mut t = RawTree::new();
        for h in 1..=3 {
            put(&mut t, h);
        }
        let root = t.root().unwrap();
        assert_eq!(t.node(root).hash, 2);
        assert_eq!(t.node(root).color, Color::Black);
        for h in 4..=64 {
            put(&mut t, h);
            check(&t);
        }
        assert_eq!(hashes_in_order(&t), (1..=64).collect::<Vec<_>>());
    }

    /// Invariant: probing reports the parent and side a new hash belongs on.
    #[test]
    fn probe_reports_insertion_point() {
        let mut t = RawTree::new();
        assert_eq!(
            t.probe(5),
            Probe::Vacant {
                parent: None,
                side: Side::Left
            }
        );
        put(&mut t, 10);
        let root = t.root().unwrap();
        assert_eq!(t.probe(10), Probe::Occupied(root));
        assert_eq!(
            t.probe(3),
            Probe::Vacant {
                parent: Some(root),
                side: Side::Left
            }
        );
        assert_eq!(
            t.probe(i64::MAX),
            Probe::Vacant {
                parent: Some(root),
                side: Side::Right
            }
        );
    }

    /// Invariant: rotating around a sentinel pivot leaves the tree untouched.
    #[test]
    fn rotate_with_sentinel_pivot_is_noop() {
        let mut t = RawTree::new();
        put(&mut t, 10);
        put(&mut t, 5);
        let root = t.root().unwrap();
        t.rotate(root, Side::Left);
        assert_eq!(t.root(), Some(root));
        assert_eq!(t.node(root).right, None);
        assert_eq!(hashes_in_order(&t), vec![5, 10]);
        check(&t);
    }

    /// Invariant: a rotation and its mirror restore the original shape.
    #[test]
    fn rotate_roundtrip() {
        let mut t = RawTree::new();
        for h in [20, 10, 30, 5, 15] {
            put(&mut t, h);
        }
        let root = t.root().unwrap();
        let left = t.node(root).left.unwrap();
        t.rotate(root, Side::Right);
        assert_eq!(t.root(), Some(left));
        assert_eq!(t.node(root).parent, Some(left));
        assert_eq!(hashes_in_order(&t), vec![5, 10, 15, 20, 30]);
        t.rotate(left, Side::Left);
        assert_eq!(t.root(), Some(root));
        assert_eq!(t.node(left).parent, Some(root));
        assert_eq!(hashes_in_order(&t), vec![5, 10, 15, 20, 30]);
    }

    /// Invariant: removing a node with two children moves the successor's
    /// content into it and frees exactly one arena slot.
    #[test]
    fn unlink_two_children_promotes_successor() {
        let mut t = RawTree::new();
        for h in [20, 10, 30, 5, 15, 25, 35] {
            put(&mut t, h);
        }
        let root = t.root().unwrap();
        assert_eq!(t.node(root).hash, 20);
        take(&mut t, 20);
        assert_eq!(t.root(), Some(root));
        assert_eq!(t.node(root).hash, 25);
        assert_eq!(t.node_count(), 6);
        assert_eq!(check(&t), 6);
        assert_eq!(hashes_in_order(&t), vec![5, 10, 15, 25, 30, 35]);
    }

    /// Invariant: deleting every node, in either direction, keeps the tree
    /// valid at each step and leaves no root.
    #[test]
    fn drain_in_both_directions() {
        for reverse in [false, true] {
            let mut t = RawTree::new();
            for h in 0..200 {
                put(&mut t, (h * 37) % 211);
            }
            let mut order: Vec<i64> = (0..200).map(|h| (h * 37) % 211).collect();
            order.sort();
            if reverse {
                order.reverse();
            }
            for (i, h) in order.iter().enumerate() {
                take(&mut t, *h);
                assert_eq!(check(&t), 199 - i);
            }
            assert_eq!(t.root(), None);
            assert_eq!(t.node_count(), 0);
        }
    }

    /// Invariant: the lone root can be removed, leaving an empty tree that
    /// accepts new nodes.
    #[test]
    fn remove_root_then_reuse() {
        let mut t = RawTree::new();
        put(&mut t, 1);
        take(&mut t, 1);
        assert_eq!(t.root(), None);
        put(&mut t, 2);
        assert_eq!(check(&t), 1);
    }
}
