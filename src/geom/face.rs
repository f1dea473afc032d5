//! Faces and edge bands of axis-aligned volumes

use super::aabb::Aabb;
use super::pos::Vector;
use crate::consts::VERTICAL;

/// Which side of an axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dir {
    Neg,
    Pos,
}

impl Dir {
    pub const ALL: [Dir; 2] = [Dir::Neg, Dir::Pos];

    #[inline]
    pub fn sign(self) -> i64 {
        match self {
            Dir::Neg => -1,
            Dir::Pos => 1,
        }
    }

    pub fn flip(self) -> Self {
        match self {
            Dir::Neg => Dir::Pos,
            Dir::Pos => Dir::Neg,
        }
    }

    /// Direction of travel for a signed component (`None` for zero)
    pub fn of(value: i64) -> Option<Self> {
        match value.signum() {
            -1 => Some(Dir::Neg),
            1 => Some(Dir::Pos),
            _ => None,
        }
    }
}

/// One of the `2N` sides of a volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Face {
    pub dir: Dir,
    pub dim: usize,
}

impl Face {
    pub const fn new(dir: Dir, dim: usize) -> Self {
        Self { dir, dim }
    }

    /// Upward face (y grows downward, so up is `-y`)
    pub const UP: Face = Face::new(Dir::Neg, VERTICAL);
    pub const DOWN: Face = Face::new(Dir::Pos, VERTICAL);

    /// All faces of an N-dimensional volume, ordered by dimension then `Neg` before `Pos`
    pub fn all<const N: usize>() -> impl Iterator<Item = Face> {
        (0..N).flat_map(|dim| Dir::ALL.into_iter().map(move |dir| Face { dir, dim }))
    }

    #[inline]
    pub fn is_up(&self) -> bool {
        is_up(self.dim, self.dir)
    }

    #[inline]
    pub fn is_down(&self) -> bool {
        is_down(self.dim, self.dir)
    }

    pub fn opposite(self) -> Self {
        Self {
            dir: self.dir.flip(),
            dim: self.dim,
        }
    }

    /// Outward unit normal
    pub fn normal<const N: usize>(&self) -> Vector<N> {
        Vector::<N>::unit(self.dim) * self.dir.sign()
    }
}

#[inline]
pub fn is_up(dim: usize, dir: Dir) -> bool {
    dim == VERTICAL && dir == Dir::Neg
}

#[inline]
pub fn is_down(dim: usize, dir: Dir) -> bool {
    dim == VERTICAL && dir == Dir::Pos
}

/// An outward band lying against one face of a volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge<const N: usize> {
    pub face: Face,
    pub bbox: Aabb<N>,
}

impl<const N: usize> Edge<N> {
    pub fn new(face: Face, bbox: Aabb<N>) -> Self {
        Self { face, bbox }
    }

    #[inline]
    pub fn dir(&self) -> Dir {
        self.face.dir
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.face.dim
    }

    pub fn translate(&self, delta: Vector<N>) -> Self {
        Self {
            face: self.face,
            bbox: self.bbox.translate(delta),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_enumeration() {
        let faces: Vec<Face> = Face::all::<3>().collect();
        assert_eq!(faces.len(), 6);
        assert_eq!(faces[0], Face::new(Dir::Neg, 0));
        assert_eq!(faces[5], Face::new(Dir::Pos, 2));
    }

    #[test]
    fn test_vertical_convention() {
        assert!(Face::UP.is_up());
        assert!(Face::DOWN.is_down());
        assert!(!Face::new(Dir::Neg, 0).is_up());
        assert_eq!(Face::DOWN.normal::<2>(), Vector::new([0, 1]));
        assert_eq!(Face::UP.opposite(), Face::DOWN);
    }
}
