//! Integer points and vectors in N-dimensional space
//!
//! Coordinates are signed 64-bit pixels. `Vector` is the same type as `Pos`;
//! the alias only documents intent at call sites.

use std::ops::{Add, AddAssign, Index, IndexMut, Mul, Neg, Sub, SubAssign};

/// A point on the integer grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos<const N: usize>(pub [i64; N]);

/// A displacement between two points
pub type Vector<const N: usize> = Pos<N>;

impl<const N: usize> Default for Pos<N> {
    fn default() -> Self {
        Self::ZERO
    }
}

impl<const N: usize> From<[i64; N]> for Pos<N> {
    fn from(coords: [i64; N]) -> Self {
        Self(coords)
    }
}

impl<const N: usize> Pos<N> {
    pub const ZERO: Self = Self([0; N]);

    pub const fn new(coords: [i64; N]) -> Self {
        Self(coords)
    }

    /// Every component set to `v`
    pub const fn splat(v: i64) -> Self {
        Self([v; N])
    }

    /// Unit vector along `dim`
    pub fn unit(dim: usize) -> Self {
        assert!(dim < N, "unit: dimension {dim} out of range for N={N}");
        let mut p = Self::ZERO;
        p.0[dim] = 1;
        p
    }

    /// Component `i`, or `None` when `i` is out of range
    #[inline]
    pub fn get(&self, i: usize) -> Option<i64> {
        self.0.get(i).copied()
    }

    #[inline]
    pub fn coords(&self) -> [i64; N] {
        self.0
    }

    /// Copy of `self` with component `dim` replaced
    pub fn with(mut self, dim: usize, value: i64) -> Self {
        self.0[dim] = value;
        self
    }

    pub fn map(self, mut f: impl FnMut(i64) -> i64) -> Self {
        Self(self.0.map(&mut f))
    }

    pub fn zip_with(self, other: Self, mut f: impl FnMut(i64, i64) -> i64) -> Self {
        let mut out = self;
        for i in 0..N {
            out.0[i] = f(self.0[i], other.0[i]);
        }
        out
    }

    /// Componentwise minimum
    pub fn min(self, other: Self) -> Self {
        self.zip_with(other, i64::min)
    }

    /// Componentwise maximum
    pub fn max(self, other: Self) -> Self {
        self.zip_with(other, i64::max)
    }

    pub fn abs(self) -> Self {
        self.map(i64::abs)
    }

    pub fn dot(self, other: Self) -> i64 {
        self.0.iter().zip(other.0.iter()).map(|(a, b)| a * b).sum()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&c| c == 0)
    }

    /// True when every component of `self` is `<=` the matching one in `other`
    pub fn all_le(&self, other: &Self) -> bool {
        self.0.iter().zip(other.0.iter()).all(|(a, b)| a <= b)
    }

    /// True when every component of `self` is `<` the matching one in `other`
    pub fn all_lt(&self, other: &Self) -> bool {
        self.0.iter().zip(other.0.iter()).all(|(a, b)| a < b)
    }

    /// Largest absolute component
    pub fn max_abs(&self) -> i64 {
        self.0.iter().map(|c| c.abs()).max().unwrap_or(0)
    }

    /// Snap each component down to a multiple of `grid`
    pub fn snap_down(self, grid: i64) -> Self {
        self.map(|x| snap_down(x, grid))
    }

    /// Snap each component up to the last cell of its grid cell
    pub fn snap_up(self, grid: i64) -> Self {
        self.map(|x| snap_up(x, grid))
    }

    pub fn to_f64(self) -> [f64; N] {
        self.0.map(|c| c as f64)
    }

    /// Largest integer point not above `p`
    pub fn floor(p: [f64; N]) -> Self {
        Self(p.map(|c| c.floor() as i64))
    }

    /// Smallest integer point not below `p`
    pub fn ceil(p: [f64; N]) -> Self {
        Self(p.map(|c| c.ceil() as i64))
    }
}

/// `floor(x / g) * g`
#[inline]
pub fn snap_down(x: i64, grid: i64) -> i64 {
    assert!(grid > 0, "snap_down: grid must be positive, got {grid}");
    x.div_euclid(grid) * grid
}

/// `ceil((x + 1) / g) * g - 1`; zero sits on a grid boundary
#[inline]
pub fn snap_up(x: i64, grid: i64) -> i64 {
    assert!(grid > 0, "snap_up: grid must be positive, got {grid}");
    let cells = -(-(x + 1)).div_euclid(grid);
    cells * grid - 1
}

impl<const N: usize> Index<usize> for Pos<N> {
    type Output = i64;

    fn index(&self, i: usize) -> &i64 {
        &self.0[i]
    }
}

impl<const N: usize> IndexMut<usize> for Pos<N> {
    fn index_mut(&mut self, i: usize) -> &mut i64 {
        &mut self.0[i]
    }
}

impl<const N: usize> Add for Pos<N> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl<const N: usize> Sub for Pos<N> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.zip_with(rhs, |a, b| a - b)
    }
}

impl<const N: usize> AddAssign for Pos<N> {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<const N: usize> SubAssign for Pos<N> {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl<const N: usize> Neg for Pos<N> {
    type Output = Self;

    fn neg(self) -> Self {
        self.map(|c| -c)
    }
}

impl<const N: usize> Mul<i64> for Pos<N> {
    type Output = Self;

    fn mul(self, k: i64) -> Self {
        self.map(|c| c * k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_unit_and_get() {
        let p = Pos::<3>::unit(1);
        assert_eq!(p, Pos::new([0, 1, 0]));
        assert_eq!(p.get(1), Some(1));
        assert_eq!(p.get(3), None);
    }

    #[test]
    #[should_panic]
    fn test_unit_out_of_range() {
        let _ = Pos::<2>::unit(2);
    }

    #[test]
    fn test_snapping() {
        assert_eq!(snap_down(0, 4), 0);
        assert_eq!(snap_down(3, 4), 0);
        assert_eq!(snap_down(-1, 4), -4);
        assert_eq!(snap_up(0, 4), 3);
        assert_eq!(snap_up(3, 4), 3);
        assert_eq!(snap_up(4, 4), 7);
        assert_eq!(snap_up(-1, 4), -1);
        assert_eq!(snap_up(-5, 4), -5);
        assert_eq!(Pos::new([5, -5]).snap_down(4), Pos::new([4, -8]));
    }

    proptest! {
        #[test]
        fn add_sub_roundtrip(a in prop::array::uniform3(-1000i64..1000), b in prop::array::uniform3(-1000i64..1000)) {
            let (a, b) = (Pos(a), Pos(b));
            prop_assert_eq!(a + b - b, a);
        }

        #[test]
        fn min_max_bracket(a in prop::array::uniform2(-1000i64..1000), b in prop::array::uniform2(-1000i64..1000)) {
            let (a, b) = (Pos(a), Pos(b));
            let lo = a.min(b);
            let hi = a.max(b);
            prop_assert!(lo.all_le(&a) && lo.all_le(&b));
            prop_assert!(a.all_le(&hi) && b.all_le(&hi));
        }

        #[test]
        fn snap_brackets_value(x in -500i64..500, g in 1i64..32) {
            let lo = snap_down(x, g);
            let hi = snap_up(x, g);
            prop_assert!(lo <= x && x <= hi);
            prop_assert_eq!(hi - lo + 1, g);
        }
    }
}
