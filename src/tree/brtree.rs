//! R-Tree with a movable origin and a lazily built border index
//!
//! Items keep their boxes in the tree's local frame. Every query takes and
//! returns world coordinates: the wrapper subtracts `loc` on the way in and
//! adds it on the way out, so moving a whole body is a single assignment.

use std::cell::OnceCell;

use super::rtree::{Bounded, ItemId, RTree};
use crate::geom::{Aabb, Edge, Intersect, Line, Pos, Vector};

/// Bordered R-Tree
#[derive(Debug, Clone)]
pub struct BRTree<const N: usize, T> {
    tree: RTree<N, T>,
    loc: Pos<N>,
    /// Outward perimeter of the union of items, local frame
    borders: OnceCell<RTree<N, Edge<N>>>,
}

impl<const N: usize, T: Bounded<N>> Default for BRTree<N, T> {
    fn default() -> Self {
        Self::new(Pos::ZERO)
    }
}

impl<const N: usize, T: Bounded<N>> BRTree<N, T> {
    pub fn new(loc: Pos<N>) -> Self {
        Self {
            tree: RTree::new(),
            loc,
            borders: OnceCell::new(),
        }
    }

    #[inline]
    pub fn loc(&self) -> Pos<N> {
        self.loc
    }

    pub fn set_loc(&mut self, loc: Pos<N>) {
        self.loc = loc;
    }

    pub fn shift(&mut self, delta: Vector<N>) {
        self.loc += delta;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn get(&self, id: ItemId) -> Option<&T> {
        self.tree.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &T)> {
        self.tree.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.tree.ids()
    }

    /// Insert an item whose box is already in the local frame
    pub fn insert(&mut self, item: T) -> ItemId {
        self.borders.take();
        self.tree.insert(item)
    }

    pub fn remove(&mut self, id: ItemId) -> Option<T> {
        self.borders.take();
        self.tree.remove(id)
    }

    pub fn remove_all(&mut self, ids: impl IntoIterator<Item = ItemId>) -> Vec<T> {
        self.borders.take();
        self.tree.remove_all(ids)
    }

    /// World box of an item
    pub fn global(&self, item: &T) -> Aabb<N> {
        item.bbox().translate(self.loc)
    }

    /// Union of item boxes in world coordinates
    pub fn bbox(&self) -> Option<Aabb<N>> {
        self.tree.bbox().map(|b| b.translate(self.loc))
    }

    /// Extent of the union; independent of `loc`
    pub fn shape(&self) -> Option<Vector<N>> {
        self.tree.bbox().map(|b| b.shape())
    }

    pub fn query(&self, bbox: &Aabb<N>) -> Vec<ItemId> {
        self.tree.query(&bbox.translate(-self.loc))
    }

    pub fn within(
        &self,
        bbox: &Aabb<N>,
    ) -> impl Iterator<Item = (ItemId, &T)> + use<'_, N, T> {
        self.tree.within(&bbox.translate(-self.loc))
    }

    pub fn at(&self, pos: Pos<N>) -> Vec<ItemId> {
        self.tree.at(pos - self.loc)
    }

    pub fn first(&self, bbox: &Aabb<N>) -> Option<ItemId> {
        self.tree.first(&bbox.translate(-self.loc))
    }

    pub fn first_hit(&self, line: &Line<N>) -> Option<(ItemId, Intersect<N>)> {
        self.tree
            .first_hit(&line.translate(-self.loc))
            .map(|(id, hit)| (id, hit.translate(self.loc)))
    }

    pub fn components(&self) -> Vec<Vec<ItemId>> {
        self.tree.components()
    }

    /// Border index in the local frame, rebuilt on first use after a mutation
    pub fn local_borders(&self) -> &RTree<N, Edge<N>> {
        self.borders.get_or_init(|| compute_borders(&self.tree))
    }

    /// Every border edge in world coordinates
    pub fn borders(&self) -> impl Iterator<Item = Edge<N>> + '_ {
        let loc = self.loc;
        self.local_borders()
            .iter()
            .map(move |(_, e)| e.translate(loc))
    }

    /// Border edges overlapping a world box
    pub fn borders_in(&self, bbox: &Aabb<N>) -> Vec<Edge<N>> {
        let borders = self.local_borders();
        borders
            .within(&bbox.translate(-self.loc))
            .map(|(_, e)| e.translate(self.loc))
            .collect()
    }
}

/// For every item face, the one-cell band outside it minus all other items
fn compute_borders<const N: usize, T: Bounded<N>>(tree: &RTree<N, T>) -> RTree<N, Edge<N>> {
    let mut out = RTree::new();
    for (_, item) in tree.iter() {
        let bbox = item.bbox();
        if bbox.is_empty() {
            continue;
        }
        for edge in bbox.edges(1) {
            let mut pieces = vec![edge.bbox];
            for (_, other) in tree.within(&edge.bbox) {
                let cover = other.bbox();
                pieces = pieces.into_iter().flat_map(|p| p.diff(&cover)).collect();
                if pieces.is_empty() {
                    break;
                }
            }
            for piece in pieces {
                out.insert(Edge::new(edge.face, piece));
            }
        }
    }
    log::trace!("rebuilt {} border edges over {} items", out.len(), tree.len());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{Dir, Face};
    use proptest::prelude::*;

    fn b2(min: [i64; 2], end: [i64; 2]) -> Aabb<2> {
        Aabb::new(Pos(min), Pos(end))
    }

    #[test]
    fn test_global_queries_follow_loc() {
        let mut tree = BRTree::<2, Aabb<2>>::new(Pos([100, 0]));
        let id = tree.insert(b2([0, 0], [10, 10]));
        assert_eq!(tree.bbox(), Some(b2([100, 0], [110, 10])));
        assert_eq!(tree.at(Pos([105, 5])), vec![id]);
        assert!(tree.at(Pos([5, 5])).is_empty());
        tree.shift(Pos([-100, 20]));
        assert_eq!(tree.at(Pos([5, 25])), vec![id]);
        assert_eq!(tree.shape(), Some(Pos([10, 10])));
    }

    #[test]
    fn test_borders_skip_shared_faces() {
        let mut tree = BRTree::<2, Aabb<2>>::new(Pos::ZERO);
        tree.insert(b2([0, 0], [2, 1]));
        tree.insert(b2([2, 0], [4, 1]));
        let edges: Vec<Edge<2>> = tree.borders().collect();
        // Left, right, and split top and bottom bands; no band on the shared face
        assert_eq!(edges.len(), 6);
        let cells: i64 = edges.iter().map(|e| e.bbox.volume()).sum();
        assert_eq!(cells, 1 + 1 + 4 + 4);
        assert!(edges.iter().all(|e| !e.bbox.overlaps(&b2([0, 0], [4, 1]))));
        let down: Vec<_> = edges.iter().filter(|e| e.face == Face::new(Dir::Pos, 1)).collect();
        assert_eq!(down.len(), 2);
    }

    #[test]
    fn test_borders_invalidate_on_mutation() {
        let mut tree = BRTree::<2, Aabb<2>>::new(Pos::ZERO);
        let a = tree.insert(b2([0, 0], [1, 1]));
        assert_eq!(tree.borders().count(), 4);
        tree.insert(b2([0, 1], [1, 2]));
        assert_eq!(tree.borders().count(), 6);
        tree.remove(a);
        assert_eq!(tree.borders().count(), 4);
        assert_eq!(tree.borders_in(&b2([0, 2], [1, 3])).len(), 1);
    }

    #[test]
    fn test_first_hit_in_world_frame() {
        let mut tree = BRTree::<3, Aabb<3>>::new(Pos([40, 0, 0]));
        tree.insert(Aabb::new(Pos([0, -5, -5]), Pos([20, 5, 5])));
        let (_, hit) = tree
            .first_hit(&Line::new([0.0, 0.0, 0.0], [100.0, 0.0, 0.0]))
            .unwrap();
        assert_eq!(hit.point, [40.0, 0.0, 0.0]);
        assert_eq!(hit.face, Some(Face::new(Dir::Neg, 0)));
    }

    proptest! {
        #[test]
        fn offset_invariance(
            boxes in prop::collection::vec((prop::array::uniform2(-50i64..50), prop::array::uniform2(1i64..20)), 1..20),
            delta in prop::array::uniform2(-1000i64..1000),
            q_min in prop::array::uniform2(-80i64..80),
            q_shape in prop::array::uniform2(1i64..60),
        ) {
            let mut tree = BRTree::<2, Aabb<2>>::new(Pos::ZERO);
            for (min, shape) in &boxes {
                tree.insert(Aabb::sized(Pos(*min), Pos(*shape)));
            }
            let q = Aabb::sized(Pos(q_min), Pos(q_shape));
            let before = tree.query(&q);
            let bbox = tree.bbox();
            let shape = tree.shape();
            let borders: Vec<Edge<2>> = tree.borders().collect();

            let delta = Pos(delta);
            tree.shift(delta);
            prop_assert_eq!(tree.query(&(q + delta)), before);
            prop_assert_eq!(tree.bbox(), bbox.map(|b| b + delta));
            prop_assert_eq!(tree.shape(), shape);
            let moved: Vec<Edge<2>> = tree.borders().collect();
            let expected: Vec<Edge<2>> = borders.iter().map(|e| e.translate(delta)).collect();
            prop_assert_eq!(moved, expected);
        }
    }
}
