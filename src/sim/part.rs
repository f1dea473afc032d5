//! Indivisible pieces of an entity

use crate::geom::{Aabb, Vector};
use crate::sim::material::{Health, Material};
use crate::tree::Bounded;

/// A box of one material with its remaining health
#[derive(Debug, Clone, PartialEq)]
pub struct Part<const N: usize> {
    bbox: Aabb<N>,
    material: Material,
    health: Health,
}

impl<const N: usize> Bounded<N> for Part<N> {
    fn bbox(&self) -> Aabb<N> {
        self.bbox
    }
}

impl<const N: usize> Part<N> {
    /// Fresh part at full durability
    pub fn new(bbox: Aabb<N>, material: Material) -> Self {
        let health = material.durability();
        Self {
            bbox,
            material,
            health,
        }
    }

    pub fn with_health(bbox: Aabb<N>, material: Material, health: Health) -> Self {
        Self {
            bbox,
            material,
            health,
        }
    }

    #[inline]
    pub fn material(&self) -> &Material {
        &self.material
    }

    #[inline]
    pub fn health(&self) -> Health {
        self.health
    }

    pub fn translate(&self, delta: Vector<N>) -> Self {
        Self {
            bbox: self.bbox.translate(delta),
            material: self.material.clone(),
            health: self.health,
        }
    }

    /// Pieces left after a hit of `strength` over `area`
    ///
    /// The region under the hit survives, weakened, only while health
    /// exceeds the strength. Everything outside the hit keeps the original
    /// health. A hit that misses returns the part unchanged.
    pub fn hit(&self, area: &Aabb<N>, strength: Health) -> Vec<Part<N>> {
        let Some(dent) = self.bbox.intersect(area) else {
            return vec![self.clone()];
        };
        let mut out = Vec::with_capacity(2 * N + 1);
        if self.health > strength {
            out.push(Self::with_health(
                dent,
                self.material.clone(),
                self.health - strength,
            ));
        }
        out.extend(
            self.bbox
                .diff(area)
                .into_iter()
                .map(|b| Self::with_health(b, self.material.clone(), self.health)),
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Pos;
    use crate::sim::material::Color;

    fn b2(min: [i64; 2], end: [i64; 2]) -> Aabb<2> {
        Aabb::new(Pos(min), Pos(end))
    }

    #[test]
    fn test_health_starts_at_durability() {
        let p = Part::new(b2([0, 0], [1, 1]), Material::solid(Color::GRAY, 9));
        assert_eq!(p.health(), 9);
    }

    #[test]
    fn test_strong_hit_carves_hole() {
        let mat = Material::solid(Color::GRAY, 2);
        let p = Part::new(b2([0, 0], [50, 10]), mat.clone());
        let mut pieces: Vec<Aabb<2>> = p.hit(&b2([20, 0], [30, 10]), 2).iter().map(Part::bbox).collect();
        pieces.sort_by_key(|b| (b.min(), b.end()));
        assert_eq!(pieces, vec![b2([0, 0], [20, 10]), b2([30, 0], [50, 10])]);
    }

    #[test]
    fn test_weak_hit_dents() {
        let mat = Material::solid(Color::GRAY, 5);
        let p = Part::new(b2([0, 0], [4, 4]), mat.clone());
        let pieces = p.hit(&b2([1, 1], [2, 2]), 2);
        assert_eq!(pieces.len(), 5);
        assert_eq!(pieces[0].bbox(), b2([1, 1], [2, 2]));
        assert_eq!(pieces[0].health(), 3);
        assert!(pieces[1..].iter().all(|q| q.health() == 5 && q.material() == &mat));
        let cells: i64 = pieces.iter().map(|q| q.bbox().volume()).sum();
        assert_eq!(cells, 16);
    }

    #[test]
    fn test_miss_is_identity() {
        let p = Part::new(b2([0, 0], [2, 2]), Material::solid(Color::GRAY, 1));
        assert_eq!(p.hit(&b2([5, 5], [6, 6]), 100), vec![p.clone()]);
    }
}
