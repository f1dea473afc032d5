//! Axis-aligned integer boxes
//!
//! A box covers the cells `min <= p < end`. `max()` is the inclusive last
//! cell (`end - 1`). A box whose extent is zero along any axis is empty; it
//! still has a position and is used for faces.

use std::ops::{Add, Sub};

use super::face::{Dir, Edge, Face};
use super::pos::{Pos, Vector};

/// Axis-aligned bounding box with inclusive `min` and exclusive `end`
///
/// Invariant: `min <= end` componentwise. Constructors panic otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Aabb<const N: usize> {
    min: Pos<N>,
    end: Pos<N>,
}

impl<const N: usize> Default for Aabb<N> {
    fn default() -> Self {
        Self::empty_at(Pos::ZERO)
    }
}

impl<const N: usize> Aabb<N> {
    /// Box from inclusive `min` and exclusive `end`
    ///
    /// # Panics
    /// Panics if any component of `min` exceeds its counterpart in `end`.
    pub fn new(min: Pos<N>, end: Pos<N>) -> Self {
        assert!(min.all_le(&end), "invalid box: min {min:?} > end {end:?}");
        Self { min, end }
    }

    /// Box from inclusive corners
    pub fn from_max(min: Pos<N>, max: Pos<N>) -> Self {
        Self::new(min, max + Pos::splat(1))
    }

    /// Box at `min` with extent `shape`
    pub fn sized(min: Pos<N>, shape: Vector<N>) -> Self {
        Self::new(min, min + shape)
    }

    /// The single cell at `pos`
    pub fn unit(pos: Pos<N>) -> Self {
        Self {
            min: pos,
            end: pos + Pos::splat(1),
        }
    }

    /// Zero-volume box at `pos`
    pub fn empty_at(pos: Pos<N>) -> Self {
        Self { min: pos, end: pos }
    }

    #[inline]
    pub fn min(&self) -> Pos<N> {
        self.min
    }

    #[inline]
    pub fn end(&self) -> Pos<N> {
        self.end
    }

    /// Inclusive last cell
    #[inline]
    pub fn max(&self) -> Pos<N> {
        self.end - Pos::splat(1)
    }

    /// Extent along each axis
    #[inline]
    pub fn shape(&self) -> Vector<N> {
        self.end - self.min
    }

    /// Shortest side
    pub fn min_side(&self) -> i64 {
        self.shape().0.into_iter().min().unwrap_or(0)
    }

    /// Number of cells covered
    pub fn volume(&self) -> i64 {
        self.shape().0.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        (0..N).any(|i| self.min[i] >= self.end[i])
    }

    /// Center in real coordinates
    pub fn center(&self) -> [f64; N] {
        let mut c = [0.0; N];
        for (i, v) in c.iter_mut().enumerate() {
            *v = (self.min[i] + self.end[i]) as f64 / 2.0;
        }
        c
    }

    pub fn translate(&self, delta: Vector<N>) -> Self {
        Self {
            min: self.min + delta,
            end: self.end + delta,
        }
    }

    /// Shared cells, or `None` when the boxes are disjoint
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let min = self.min.max(other.min);
        let end = self.end.min(other.end);
        if min.all_lt(&end) {
            Some(Self { min, end })
        } else {
            None
        }
    }

    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        (0..N).all(|i| self.min[i].max(other.min[i]) < self.end[i].min(other.end[i]))
    }

    pub fn contains(&self, pos: &Pos<N>) -> bool {
        self.min.all_le(pos) && pos.all_lt(&self.end)
    }

    pub fn contains_box(&self, other: &Self) -> bool {
        self.min.all_le(&other.min) && other.end.all_le(&self.end)
    }

    /// Smallest box covering both
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            end: self.end.max(other.end),
        }
    }

    /// Grow by `d` cells on every side
    pub fn widen(&self, d: i64) -> Self {
        Self::new(self.min - Pos::splat(d), self.end + Pos::splat(d))
    }

    /// Sweep along `dim` by a signed `delta`, keeping the original cells
    pub fn extend(&self, dim: usize, delta: i64) -> Self {
        let mut out = *self;
        if delta > 0 {
            out.end[dim] += delta;
        } else {
            out.min[dim] += delta;
        }
        out
    }

    /// Expand outward to whole grid cells of size `grid`
    pub fn snap(&self, grid: i64) -> Self {
        if self.is_empty() {
            return *self;
        }
        Self::from_max(self.min.snap_down(grid), self.max().snap_up(grid))
    }

    /// Set difference `self \ other` as at most `2N` disjoint boxes
    ///
    /// Built face by face: along each axis peel off the slab below and the
    /// slab above `other`, then narrow the remainder to `other`'s extent.
    pub fn diff(&self, other: &Self) -> Vec<Self> {
        if !self.overlaps(other) {
            return if self.is_empty() { Vec::new() } else { vec![*self] };
        }
        let mut out = Vec::with_capacity(2 * N);
        let mut rest = *self;
        for d in 0..N {
            if other.min[d] > rest.min[d] {
                let mut below = rest;
                below.end[d] = other.min[d];
                out.push(below);
                rest.min[d] = other.min[d];
            }
            if other.end[d] < rest.end[d] {
                let mut above = rest;
                above.min[d] = other.end[d];
                out.push(above);
                rest.end[d] = other.end[d];
            }
        }
        out
    }

    /// Zero-thickness box lying on `face`
    pub fn face(&self, face: Face) -> Self {
        let mut out = *self;
        match face.dir {
            Dir::Neg => out.end[face.dim] = self.min[face.dim],
            Dir::Pos => out.min[face.dim] = self.end[face.dim],
        }
        out
    }

    /// All `2N` zero-thickness faces
    pub fn faces(&self) -> Vec<(Face, Self)> {
        Face::all::<N>().map(|f| (f, self.face(f))).collect()
    }

    /// Band of thickness `dist` just outside `face`
    pub fn edge(&self, face: Face, dist: i64) -> Edge<N> {
        let mut band = *self;
        let d = face.dim;
        match face.dir {
            Dir::Neg => {
                band.min[d] = self.min[d] - dist;
                band.end[d] = self.min[d];
            }
            Dir::Pos => {
                band.min[d] = self.end[d];
                band.end[d] = self.end[d] + dist;
            }
        }
        Edge::new(face, band)
    }

    /// All `2N` outward bands of thickness `dist`
    pub fn edges(&self, dist: i64) -> Vec<Edge<N>> {
        Face::all::<N>().map(|f| self.edge(f, dist)).collect()
    }

    /// Every cell in the box, last axis varying slowest
    pub fn points(&self) -> Points<N> {
        Points {
            bbox: *self,
            next: if self.is_empty() { None } else { Some(self.min) },
        }
    }

    /// Tile with sub-boxes of `step`; boxes on the far sides are clipped
    ///
    /// # Panics
    /// Panics if any step component is not positive.
    pub fn tiles(&self, step: Vector<N>) -> Vec<Self> {
        assert!(
            step.0.iter().all(|&s| s > 0),
            "tiles: step must be positive, got {step:?}"
        );
        let counts = self
            .shape()
            .zip_with(step, |len, s| (len + s - 1).div_euclid(s));
        let grid = Aabb::new(Pos::ZERO, counts);
        grid.points()
            .map(|cell| {
                let min = self.min + cell.zip_with(step, |c, s| c * s);
                let end = (min + step).min(self.end);
                Self { min, end }
            })
            .collect()
    }

    /// Copy the first `min(N, M)` axes into an M-dimensional box, zero-filling the rest
    pub fn resize<const M: usize>(&self) -> Aabb<M> {
        let mut min = Pos::<M>::ZERO;
        let mut end = Pos::<M>::ZERO;
        for i in 0..N.min(M) {
            min[i] = self.min[i];
            end[i] = self.end[i];
        }
        Aabb { min, end }
    }
}

impl<const N: usize> Add<Vector<N>> for Aabb<N> {
    type Output = Self;

    fn add(self, delta: Vector<N>) -> Self {
        self.translate(delta)
    }
}

impl<const N: usize> Sub<Vector<N>> for Aabb<N> {
    type Output = Self;

    fn sub(self, delta: Vector<N>) -> Self {
        self.translate(-delta)
    }
}

/// Iterator over the cells of a box
#[derive(Debug, Clone)]
pub struct Points<const N: usize> {
    bbox: Aabb<N>,
    next: Option<Pos<N>>,
}

impl<const N: usize> Iterator for Points<N> {
    type Item = Pos<N>;

    fn next(&mut self) -> Option<Pos<N>> {
        let current = self.next?;
        let mut succ = current;
        let mut carried = true;
        for d in 0..N {
            succ[d] += 1;
            if succ[d] < self.bbox.end[d] {
                carried = false;
                break;
            }
            succ[d] = self.bbox.min[d];
        }
        self.next = if carried { None } else { Some(succ) };
        Some(current)
    }
}
