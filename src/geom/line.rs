//! Line segments in real coordinates and their intersection with boxes
//!
//! Boxes are treated as closed real volumes `[min, end]` when intersected by
//! a segment, so a segment grazing a face counts as a hit on that face.

use std::cell::OnceCell;

use super::aabb::Aabb;
use super::face::{Dir, Face};
use super::pos::{Pos, Vector};

/// Segment from `a` to `b`
#[derive(Debug, Clone)]
pub struct Line<const N: usize> {
    a: [f64; N],
    b: [f64; N],
    length: OnceCell<f64>,
    slope: OnceCell<[f64; N]>,
}

impl<const N: usize> PartialEq for Line<N> {
    fn eq(&self, other: &Self) -> bool {
        self.a == other.a && self.b == other.b
    }
}

/// Where a segment first meets a volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersect<const N: usize> {
    pub point: [f64; N],
    /// Face that was crossed; `None` when the segment starts inside
    pub face: Option<Face>,
    /// Distance along the segment from its start
    pub distance: f64,
}

impl<const N: usize> Intersect<N> {
    pub fn translate(mut self, delta: Vector<N>) -> Self {
        for i in 0..N {
            self.point[i] += delta[i] as f64;
        }
        self
    }

    /// Keep whichever of two optional hits is nearer
    pub fn nearest(a: Option<Self>, b: Option<Self>) -> Option<Self> {
        match (a, b) {
            (Some(x), Some(y)) => Some(if y.distance < x.distance { y } else { x }),
            (x, None) => x,
            (None, y) => y,
        }
    }
}

impl<const N: usize> Line<N> {
    pub fn new(a: [f64; N], b: [f64; N]) -> Self {
        Self {
            a,
            b,
            length: OnceCell::new(),
            slope: OnceCell::new(),
        }
    }

    pub fn between(a: Pos<N>, b: Pos<N>) -> Self {
        Self::new(a.to_f64(), b.to_f64())
    }

    #[inline]
    pub fn a(&self) -> [f64; N] {
        self.a
    }

    #[inline]
    pub fn b(&self) -> [f64; N] {
        self.b
    }

    pub fn delta(&self) -> [f64; N] {
        let mut d = [0.0; N];
        for (i, v) in d.iter_mut().enumerate() {
            *v = self.b[i] - self.a[i];
        }
        d
    }

    pub fn length(&self) -> f64 {
        *self
            .length
            .get_or_init(|| self.delta().iter().map(|c| c * c).sum::<f64>().sqrt())
    }

    /// Unit direction (all zeros for a degenerate segment)
    pub fn slope(&self) -> [f64; N] {
        *self.slope.get_or_init(|| {
            let len = self.length();
            let mut d = self.delta();
            if len > 0.0 {
                for c in d.iter_mut() {
                    *c /= len;
                }
            }
            d
        })
    }

    /// Point at parameter `t` in `[0, 1]`
    pub fn at(&self, t: f64) -> [f64; N] {
        let d = self.delta();
        let mut p = self.a;
        for i in 0..N {
            p[i] += d[i] * t;
        }
        p
    }

    pub fn translate(&self, delta: Vector<N>) -> Self {
        let mut a = self.a;
        let mut b = self.b;
        for i in 0..N {
            a[i] += delta[i] as f64;
            b[i] += delta[i] as f64;
        }
        Self::new(a, b)
    }

    /// Integer cells that can hold anything the segment touches
    pub fn cell_bounds(&self) -> Aabb<N> {
        let mut lo = self.a;
        let mut hi = self.b;
        for i in 0..N {
            if lo[i] > hi[i] {
                std::mem::swap(&mut lo[i], &mut hi[i]);
            }
        }
        // One cell of slack: a closed face at `end` belongs to the cell before it
        Aabb::from_max(Pos::floor(lo) - Pos::splat(1), Pos::floor(hi) + Pos::splat(1))
    }

    /// First point where the segment meets `bbox`
    pub fn intersect(&self, bbox: &Aabb<N>) -> Option<Intersect<N>> {
        let lo = bbox.min().to_f64();
        let hi = bbox.end().to_f64();

        if (0..N).all(|i| lo[i] <= self.a[i] && self.a[i] <= hi[i]) {
            return Some(Intersect {
                point: self.a,
                face: None,
                distance: 0.0,
            });
        }

        let d = self.delta();
        let mut enter = f64::NEG_INFINITY;
        let mut exit = f64::INFINITY;
        let mut face = None;
        for i in 0..N {
            if d[i] == 0.0 {
                if self.a[i] < lo[i] || self.a[i] > hi[i] {
                    return None;
                }
                continue;
            }
            let (t_lo, t_hi) = ((lo[i] - self.a[i]) / d[i], (hi[i] - self.a[i]) / d[i]);
            let (near, far, side) = if d[i] > 0.0 {
                (t_lo, t_hi, Dir::Neg)
            } else {
                (t_hi, t_lo, Dir::Pos)
            };
            if near > enter {
                enter = near;
                face = Some(Face::new(side, i));
            }
            exit = exit.min(far);
        }

        if face.is_none() || enter > exit || !(0.0..=1.0).contains(&enter) {
            return None;
        }

        let mut point = self.at(enter);
        // Pin the crossed coordinate exactly onto the face
        if let Some(f) = face {
            point[f.dim] = match f.dir {
                Dir::Neg => lo[f.dim],
                Dir::Pos => hi[f.dim],
            };
        }
        Some(Intersect {
            point,
            face,
            distance: enter * self.length(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ray_hits_near_face() {
        let line = Line::new([0.0, 0.0, 0.0], [100.0, 0.0, 0.0]);
        let bbox = Aabb::new(Pos([40, -5, -5]), Pos([60, 5, 5]));
        let hit = line.intersect(&bbox).unwrap();
        assert_eq!(hit.point, [40.0, 0.0, 0.0]);
        assert_eq!(hit.face, Some(Face::new(Dir::Neg, 0)));
        assert!((hit.distance - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_ray_reversed_hits_far_face() {
        let line = Line::new([100.0, 0.0], [0.0, 0.0]);
        let bbox = Aabb::new(Pos([40, -5]), Pos([60, 5]));
        let hit = line.intersect(&bbox).unwrap();
        assert_eq!(hit.point, [60.0, 0.0]);
        assert_eq!(hit.face, Some(Face::new(Dir::Pos, 0)));
        assert!((hit.distance - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_start_inside() {
        let line = Line::new([1.5, 1.5], [30.0, 2.0]);
        let bbox = Aabb::new(Pos([0, 0]), Pos([4, 4]));
        let hit = line.intersect(&bbox).unwrap();
        assert_eq!(hit.point, [1.5, 1.5]);
        assert_eq!(hit.face, None);
        assert_eq!(hit.distance, 0.0);
    }

    #[test]
    fn test_short_and_parallel_misses() {
        let bbox = Aabb::new(Pos([10, 10]), Pos([20, 20]));
        assert!(Line::new([0.0, 15.0], [5.0, 15.0]).intersect(&bbox).is_none());
        assert!(Line::new([0.0, 25.0], [50.0, 25.0]).intersect(&bbox).is_none());
        assert!(Line::new([30.0, 15.0], [40.0, 15.0]).intersect(&bbox).is_none());
    }

    #[test]
    fn test_length_and_slope() {
        let line = Line::new([0.0, 0.0], [3.0, 4.0]);
        assert_eq!(line.length(), 5.0);
        assert_eq!(line.slope(), [0.6, 0.8]);
        let shifted = line.translate(Pos([1, 1]));
        assert_eq!(shifted.a(), [1.0, 1.0]);
        assert!(line.cell_bounds().contains(&Pos([3, 4])));
    }

    fn strictly_inside<const N: usize>(p: &[f64; N], bbox: &Aabb<N>) -> bool {
        (0..N).all(|i| bbox.min()[i] as f64 + 1e-6 < p[i] && p[i] < bbox.end()[i] as f64 - 1e-6)
    }

    fn check_ray<const N: usize>(a: [f64; N], b: [f64; N], lo: [i64; N], hi: [i64; N]) -> Result<(), TestCaseError> {
        let bbox = Aabb::new(Pos(lo).min(Pos(hi)), Pos(lo).max(Pos(hi)));
        let line = Line::new(a, b);
        match line.intersect(&bbox) {
            Some(hit) => {
                let t = if line.length() > 0.0 { hit.distance / line.length() } else { 0.0 };
                let on_line = line.at(t);
                for i in 0..N {
                    prop_assert!((on_line[i] - hit.point[i]).abs() < 1e-6);
                }
                match hit.face {
                    None => {
                        prop_assert_eq!(hit.distance, 0.0);
                        prop_assert_eq!(hit.point, a);
                    }
                    Some(f) => {
                        let plane = match f.dir {
                            Dir::Neg => bbox.min()[f.dim],
                            Dir::Pos => bbox.end()[f.dim],
                        } as f64;
                        prop_assert!((hit.point[f.dim] - plane).abs() < 1e-6);
                        for i in 0..N {
                            prop_assert!(bbox.min()[i] as f64 - 1e-6 <= hit.point[i]);
                            prop_assert!(hit.point[i] <= bbox.end()[i] as f64 + 1e-6);
                        }
                    }
                }
            }
            None => {
                for step in 0..=200 {
                    let p = line.at(step as f64 / 200.0);
                    prop_assert!(!strictly_inside(&p, &bbox));
                }
            }
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn ray_query_2d(
            a in prop::array::uniform2(-20.0f64..20.0),
            b in prop::array::uniform2(-20.0f64..20.0),
            lo in prop::array::uniform2(-15i64..=15),
            hi in prop::array::uniform2(-15i64..=15),
        ) {
            check_ray(a, b, lo, hi)?;
        }

        #[test]
        fn ray_query_3d(
            a in prop::array::uniform3(-20.0f64..20.0),
            b in prop::array::uniform3(-20.0f64..20.0),
            lo in prop::array::uniform3(-15i64..=15),
            hi in prop::array::uniform3(-15i64..=15),
        ) {
            check_ray(a, b, lo, hi)?;
        }
    }
}
