//! Connected components of face-adjacent items

use std::collections::BTreeMap;

use super::rtree::{Bounded, ItemId, RTree};

/// Disjoint-set forest with path halving and union by size
#[derive(Debug, Clone)]
pub struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Merge the sets holding `a` and `b`; true if they were separate
    pub fn union(&mut self, a: usize, b: usize) -> bool {
        let (mut ra, mut rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        if self.size[ra] < self.size[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        self.size[ra] += self.size[rb];
        true
    }
}

impl<const N: usize, T: Bounded<N>> RTree<N, T> {
    /// Partition items into groups linked by shared faces
    ///
    /// Two items are adjacent when one's one-cell edge band overlaps the
    /// other. Corner contact does not connect. Each group is sorted by id
    /// and groups are ordered by their smallest id.
    pub fn components(&self) -> Vec<Vec<ItemId>> {
        let capacity = self.ids().map(|id| id.index() + 1).max().unwrap_or(0);
        let mut sets = UnionFind::new(capacity);
        for (id, item) in self.iter() {
            for edge in item.bbox().edges(1) {
                for other in self.query(&edge.bbox) {
                    sets.union(id.index(), other.index());
                }
            }
        }
        let mut groups: BTreeMap<usize, Vec<ItemId>> = BTreeMap::new();
        for id in self.ids() {
            groups.entry(sets.find(id.index())).or_default().push(id);
        }
        let mut out: Vec<Vec<ItemId>> = groups.into_values().collect();
        out.sort_by_key(|g| g[0]);
        out
    }
}
