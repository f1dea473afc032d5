//! Orthant-split spatial index over boxed items
//!
//! Each node covers the region `origin ± grid` and splits it into `2^N`
//! equal orthants. A node keeps in its own list the items that are too
//! large to push deeper; the rest live in every child orthant they touch,
//! so the same item may appear in several lists. Queries dedupe by id.
//!
//! Items are stored in a slab and referred to by `ItemId`. Ids stay valid
//! until the item is removed, including across `relocate`.

use std::cell::OnceCell;

use crate::geom::{Aabb, Edge, Intersect, Line, Pos};

/// Split threshold for a node's own list
pub const MAX_ENTRIES: usize = 8;
/// Nodes at or below `2^GRID_EXP_MIN` never split
pub const GRID_EXP_MIN: u32 = 2;
/// Half-side of a fresh root, as a power of two
pub const GRID_EXP_MAX: u32 = 10;

/// Anything with an axis-aligned extent
pub trait Bounded<const N: usize> {
    fn bbox(&self) -> Aabb<N>;
}

impl<const N: usize> Bounded<N> for Aabb<N> {
    fn bbox(&self) -> Aabb<N> {
        *self
    }
}

impl<const N: usize> Bounded<N> for Edge<N> {
    fn bbox(&self) -> Aabb<N> {
        self.bbox
    }
}

/// Stable handle to an item in an `RTree`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(u32);

impl ItemId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
struct Node<const N: usize> {
    origin: Pos<N>,
    grid: i64,
    list: Vec<ItemId>,
    /// Either empty (leaf) or exactly `2^N` slots indexed by orthant code
    children: Vec<Option<Box<Node<N>>>>,
}

impl<const N: usize> Node<N> {
    fn new(origin: Pos<N>, grid: i64) -> Self {
        Self {
            origin,
            grid,
            list: Vec::new(),
            children: Vec::new(),
        }
    }

    fn region(&self) -> Aabb<N> {
        Aabb::new(
            self.origin - Pos::splat(self.grid),
            self.origin + Pos::splat(self.grid),
        )
    }

    fn child_origin(&self, code: usize) -> Pos<N> {
        let half = self.grid / 2;
        let mut o = self.origin;
        for d in 0..N {
            o[d] += if code & (1 << d) != 0 { half } else { -half };
        }
        o
    }

    fn child_region(&self, code: usize) -> Aabb<N> {
        let half = self.grid / 2;
        let o = self.child_origin(code);
        Aabb::new(o - Pos::splat(half), o + Pos::splat(half))
    }

    fn child_mut(&mut self, code: usize) -> &mut Node<N> {
        if self.children.is_empty() {
            self.children = (0..1usize << N).map(|_| None).collect();
        }
        let origin = self.child_origin(code);
        let grid = self.grid / 2;
        self.children[code].get_or_insert_with(|| Box::new(Node::new(origin, grid)))
    }

    fn is_vacant(&self) -> bool {
        self.list.is_empty() && self.children.iter().all(Option::is_none)
    }

    fn depth(&self) -> usize {
        1 + self
            .children
            .iter()
            .flatten()
            .map(|c| c.depth())
            .max()
            .unwrap_or(0)
    }
}

/// Spatial index over items exposing a bounding box
#[derive(Debug, Clone)]
pub struct RTree<const N: usize, T> {
    root: Box<Node<N>>,
    slots: Vec<Option<T>>,
    free: Vec<u32>,
    len: usize,
    bounds: OnceCell<Option<Aabb<N>>>,
}

impl<const N: usize, T: Bounded<N>> Default for RTree<N, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize, T: Bounded<N>> RTree<N, T> {
    pub fn new() -> Self {
        Self {
            root: Box::new(Node::new(Pos::ZERO, 1 << GRID_EXP_MAX)),
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
            bounds: OnceCell::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn get(&self, id: ItemId) -> Option<&T> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    /// Mutable access to an item
    ///
    /// If the change moves the item's box, call `relocate` with the old box.
    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut T> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.get(id).is_some()
    }

    /// Live items in slot order
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|item| (ItemId(i as u32), item)))
    }

    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.iter().map(|(id, _)| id)
    }

    /// Number of node levels below and including the root
    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    /// Union of every non-empty item box
    pub fn bbox(&self) -> Option<Aabb<N>> {
        *self.bounds.get_or_init(|| {
            self.iter()
                .map(|(_, item)| item.bbox())
                .filter(|b| !b.is_empty())
                .reduce(|a, b| a.union(&b))
        })
    }

    pub fn insert(&mut self, item: T) -> ItemId {
        let bbox = item.bbox();
        let id = match self.free.pop() {
            Some(index) => {
                self.slots[index as usize] = Some(item);
                ItemId(index)
            }
            None => {
                self.slots.push(Some(item));
                ItemId((self.slots.len() - 1) as u32)
            }
        };
        self.len += 1;
        self.link(id, &bbox);
        id
    }

    /// Remove an item whose box has not changed since it was indexed
    pub fn remove(&mut self, id: ItemId) -> Option<T> {
        let bbox = self.get(id)?.bbox();
        self.remove_over(id, &bbox, true)
    }

    /// Unlink `id` from every node overlapping `prev`
    ///
    /// With `take` the item leaves the tree and is returned; without it the
    /// slot is kept so the caller can relink it.
    pub fn remove_over(&mut self, id: ItemId, prev: &Aabb<N>, take: bool) -> Option<T> {
        if !self.contains(id) {
            return None;
        }
        unlink(&mut self.root, id, prev);
        self.bounds = OnceCell::new();
        if !take {
            return None;
        }
        self.len -= 1;
        self.free.push(id.0);
        self.slots[id.index()].take()
    }

    /// Reindex an item whose box changed from `prev`
    pub fn relocate(&mut self, id: ItemId, prev: &Aabb<N>) {
        let Some(bbox) = self.get(id).map(Bounded::bbox) else {
            return;
        };
        self.remove_over(id, prev, false);
        self.link(id, &bbox);
    }

    pub fn remove_all(&mut self, ids: impl IntoIterator<Item = ItemId>) -> Vec<T> {
        ids.into_iter().filter_map(|id| self.remove(id)).collect()
    }

    /// Every item overlapping `bbox`, each once, in id order
    pub fn query(&self, bbox: &Aabb<N>) -> Vec<ItemId> {
        let mut out = Vec::new();
        self.collect(&self.root, bbox, &mut out);
        // an item split across children is listed once per child
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Like `query` but yielding the items too
    pub fn within(
        &self,
        bbox: &Aabb<N>,
    ) -> impl Iterator<Item = (ItemId, &T)> + use<'_, N, T> {
        self.query(bbox)
            .into_iter()
            .filter_map(move |id| self.get(id).map(|item| (id, item)))
    }

    /// Items covering a single cell
    pub fn at(&self, pos: Pos<N>) -> Vec<ItemId> {
        self.query(&Aabb::unit(pos))
    }

    /// Any one item overlapping `bbox`
    pub fn first(&self, bbox: &Aabb<N>) -> Option<ItemId> {
        self.find(&self.root, bbox)
    }

    /// Nearest item hit by a segment
    pub fn first_hit(&self, line: &Line<N>) -> Option<(ItemId, Intersect<N>)> {
        let mut best: Option<(ItemId, Intersect<N>)> = None;
        for id in self.query(&line.cell_bounds()) {
            let Some(item) = self.get(id) else { continue };
            let Some(hit) = line.intersect(&item.bbox()) else {
                continue;
            };
            if best.as_ref().is_none_or(|(_, b)| hit.distance < b.distance) {
                best = Some((id, hit));
            }
        }
        best
    }

    fn link(&mut self, id: ItemId, bbox: &Aabb<N>) {
        self.grow_to(bbox);
        self.root.list.push(id);
        balance(&mut self.root, &self.slots);
        self.bounds = OnceCell::new();
    }

    /// Double the root until it covers `bbox`
    fn grow_to(&mut self, bbox: &Aabb<N>) {
        let reach = bbox.min().max_abs().max(bbox.end().max_abs()).max(1) as u64;
        let needed = reach.next_power_of_two() as i64;
        while self.root.grid < needed {
            self.grow();
        }
    }

    /// Wrap the root in one twice its size
    ///
    /// Each old child moves under a new intermediate node in the matching
    /// orthant, on the side facing the origin, so nothing is reinserted.
    fn grow(&mut self) {
        let grid = self.root.grid;
        let old = std::mem::replace(&mut self.root, Box::new(Node::new(Pos::ZERO, grid * 2)));
        let Node { list, children, .. } = *old;
        self.root.list = list;
        let mask = (1usize << N) - 1;
        for (code, child) in children.into_iter().enumerate() {
            if let Some(child) = child {
                let mid = self.root.child_mut(code);
                let inner = !code & mask;
                mid.child_mut(inner);
                mid.children[inner] = Some(child);
            }
        }
        log::trace!("rtree root grown to grid {}", grid * 2);
    }

    fn collect(&self, node: &Node<N>, bbox: &Aabb<N>, out: &mut Vec<ItemId>) {
        if !node.region().overlaps(bbox) {
            return;
        }
        out.extend(
            node.list
                .iter()
                .copied()
                .filter(|&id| self.get(id).is_some_and(|item| item.bbox().overlaps(bbox))),
        );
        for child in node.children.iter().flatten() {
            self.collect(child, bbox, out);
        }
    }

    fn find(&self, node: &Node<N>, bbox: &Aabb<N>) -> Option<ItemId> {
        if !node.region().overlaps(bbox) {
            return None;
        }
        let hit = node
            .list
            .iter()
            .copied()
            .find(|&id| self.get(id).is_some_and(|item| item.bbox().overlaps(bbox)));
        if hit.is_some() {
            return hit;
        }
        node.children
            .iter()
            .flatten()
            .find_map(|child| self.find(child, bbox))
    }
}

/// Push small items of an overfull node down into its orthants
fn balance<const N: usize, T: Bounded<N>>(node: &mut Node<N>, slots: &[Option<T>]) {
    if node.list.len() <= MAX_ENTRIES || node.grid <= 1 << GRID_EXP_MIN {
        return;
    }
    let grid = node.grid;
    let mut keep = Vec::new();
    let mut touched = vec![false; 1 << N];
    for id in std::mem::take(&mut node.list) {
        let Some(bbox) = slots[id.index()].as_ref().map(Bounded::bbox) else {
            continue;
        };
        if bbox.is_empty() || bbox.min_side() >= grid {
            keep.push(id);
            continue;
        }
        for (code, hit) in touched.iter_mut().enumerate() {
            if node.child_region(code).overlaps(&bbox) {
                node.child_mut(code).list.push(id);
                *hit = true;
            }
        }
    }
    node.list = keep;
    for (code, hit) in touched.into_iter().enumerate() {
        if hit && let Some(child) = node.children[code].as_deref_mut() {
            balance(child, slots);
        }
    }
}

/// Drop `id` from every node overlapping `bbox`, pruning nodes left empty
fn unlink<const N: usize>(node: &mut Node<N>, id: ItemId, bbox: &Aabb<N>) {
    node.list.retain(|&x| x != id);
    for slot in node.children.iter_mut() {
        let Some(child) = slot.as_deref_mut() else {
            continue;
        };
        if !child.region().overlaps(bbox) {
            continue;
        }
        unlink(child, id, bbox);
        if child.is_vacant() {
            *slot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn b2(min: [i64; 2], end: [i64; 2]) -> Aabb<2> {
        Aabb::new(Pos(min), Pos(end))
    }

    fn brute<const N: usize>(tree: &RTree<N, Aabb<N>>, q: &Aabb<N>) -> BTreeSet<ItemId> {
        tree.iter()
            .filter(|(_, b)| b.overlaps(q))
            .map(|(id, _)| id)
            .collect()
    }

    #[test]
    fn test_insert_query_remove() {
        let mut tree = RTree::<2, Aabb<2>>::new();
        let a = tree.insert(b2([0, 0], [10, 10]));
        let b = tree.insert(b2([20, 0], [30, 10]));
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.query(&b2([5, 5], [25, 6])), vec![a, b]);
        assert_eq!(tree.at(Pos([25, 5])), vec![b]);
        assert_eq!(tree.first(&b2([9, 9], [11, 11])), Some(a));
        assert_eq!(tree.remove(a), Some(b2([0, 0], [10, 10])));
        assert!(tree.query(&b2([0, 0], [10, 10])).is_empty());
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.bbox(), Some(b2([20, 0], [30, 10])));
    }

    #[test]
    fn test_many_items_split_and_dedupe() {
        let mut tree = RTree::<2, Aabb<2>>::new();
        let mut ids = Vec::new();
        for x in 0..40 {
            for y in 0..5 {
                ids.push(tree.insert(Aabb::unit(Pos([x * 3 - 60, y * 3 - 7]))));
            }
        }
        // Long bar straddles many orthants
        let bar = tree.insert(b2([-100, 0], [100, 2]));
        assert!(tree.depth() > 1);
        let q = b2([-200, -200], [200, 200]);
        let found = tree.query(&q);
        assert_eq!(found.len(), tree.len());
        assert_eq!(found.iter().filter(|&&id| id == bar).count(), 1);
        ids.push(bar);
        assert_eq!(found, ids);
        let near_bar = tree.query(&b2([-2, 1], [2, 2]));
        assert_eq!(near_bar, vec![bar]);
    }

    #[test]
    fn test_root_grows_without_losing_items() {
        let mut tree = RTree::<3, Aabb<3>>::new();
        let near = tree.insert(Aabb::unit(Pos([1, 1, 1])));
        for i in 0..20 {
            tree.insert(Aabb::unit(Pos([i, -i, 2])));
        }
        let far = tree.insert(Aabb::unit(Pos([50_000, -3, 7])));
        assert_eq!(tree.at(Pos([1, 1, 1])), vec![near]);
        assert_eq!(tree.at(Pos([50_000, -3, 7])), vec![far]);
        assert_eq!(tree.len(), 22);
    }

    #[test]
    fn test_relocate_keeps_id() {
        let mut tree = RTree::<2, Aabb<2>>::new();
        let id = tree.insert(b2([0, 0], [2, 2]));
        let prev = *tree.get(id).unwrap();
        *tree.get_mut(id).unwrap() = prev + Pos([500, 0]);
        tree.relocate(id, &prev);
        assert!(tree.at(Pos([0, 0])).is_empty());
        assert_eq!(tree.at(Pos([501, 1])), vec![id]);
    }

    #[test]
    fn test_first_hit_picks_nearest() {
        let mut tree = RTree::<2, Aabb<2>>::new();
        let far = tree.insert(b2([50, -5], [60, 5]));
        let near = tree.insert(b2([20, -5], [30, 5]));
        let (id, hit) = tree.first_hit(&Line::new([0.0, 0.0], [100.0, 0.0])).unwrap();
        assert_eq!(id, near);
        assert_eq!(hit.point, [20.0, 0.0]);
        tree.remove(near);
        assert_eq!(tree.first_hit(&Line::new([0.0, 0.0], [100.0, 0.0])).unwrap().0, far);
        assert!(tree.first_hit(&Line::new([0.0, 10.0], [100.0, 10.0])).is_none());
    }

    #[test]
    fn test_empty_items_survive_balancing() {
        let mut tree = RTree::<2, Aabb<2>>::new();
        let empty = tree.insert(Aabb::empty_at(Pos([3, 3])));
        for i in 0..30 {
            tree.insert(Aabb::unit(Pos([i, 0])));
        }
        assert!(tree.contains(empty));
        assert_eq!(tree.remove(empty), Some(Aabb::empty_at(Pos([3, 3]))));
        assert_eq!(tree.len(), 30);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert([i64; 2], [i64; 2]),
        Remove(usize),
        Move(usize, [i64; 2]),
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (prop::array::uniform2(-300i64..300), prop::array::uniform2(1i64..40))
                .prop_map(|(min, shape)| Op::Insert(min, shape)),
            (0usize..64).prop_map(Op::Remove),
            ((0usize..64), prop::array::uniform2(-100i64..100)).prop_map(|(i, d)| Op::Move(i, d)),
        ]
    }

    proptest! {
        #[test]
        fn query_matches_brute_force(
            ops in prop::collection::vec(arb_op(), 1..120),
            q_min in prop::array::uniform2(-400i64..400),
            q_shape in prop::array::uniform2(0i64..300),
        ) {
            let mut tree = RTree::<2, Aabb<2>>::new();
            let mut live: Vec<ItemId> = Vec::new();
            for op in ops {
                match op {
                    Op::Insert(min, shape) => live.push(tree.insert(Aabb::sized(Pos(min), Pos(shape)))),
                    Op::Remove(i) if !live.is_empty() => {
                        let id = live.remove(i % live.len());
                        prop_assert!(tree.remove(id).is_some());
                    }
                    Op::Move(i, d) if !live.is_empty() => {
                        let id = live[i % live.len()];
                        let prev = *tree.get(id).unwrap();
                        *tree.get_mut(id).unwrap() = prev + Pos(d);
                        tree.relocate(id, &prev);
                    }
                    _ => {}
                }
            }
            prop_assert_eq!(tree.len(), live.len());
            let q = Aabb::sized(Pos(q_min), Pos(q_shape));
            let found = tree.query(&q);
            let unique: BTreeSet<ItemId> = found.iter().copied().collect();
            prop_assert_eq!(unique.len(), found.len());
            prop_assert_eq!(unique, brute(&tree, &q));
        }
    }
}
