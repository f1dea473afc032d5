//! Interned material descriptors
//!
//! `Material::get` returns the same handle for equal kinds for the life of
//! the process, so two materials are equal exactly when they share the
//! interned descriptor.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use rand::Rng;

/// Hit points of a part and strength of a hit
pub type Health = u32;

/// RGBA colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const GRAY: Color = Color::rgb(128, 128, 128);
    pub const STONE: Color = Color::rgb(112, 104, 96);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque colour with random channels
    pub fn random(rng: &mut impl Rng) -> Self {
        Self::rgb(rng.random(), rng.random(), rng.random())
    }

    /// Scale RGB by `factor` (alpha untouched), saturating
    pub fn shade(self, factor: f32) -> Self {
        let scale = |c: u8| (c as f32 * factor).round().clamp(0.0, 255.0) as u8;
        Self::rgba(scale(self.r), scale(self.g), scale(self.b), self.a)
    }

    /// Packed `0xRRGGBBAA`
    pub fn to_u32(self) -> u32 {
        u32::from_be_bytes([self.r, self.g, self.b, self.a])
    }
}

/// Material type plus its constructor arguments; the interning key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialKind {
    /// Falls and draws an outline
    Solid { color: Color, durability: Health },
    /// Never falls
    Fixed { color: Color, durability: Health },
    /// Falls, drawn without an outline
    Seamless { color: Color, durability: Health },
}

/// The interned descriptor behind a `Material` handle
#[derive(Debug, PartialEq, Eq)]
pub struct MaterialDesc {
    pub kind: MaterialKind,
    pub color: Color,
    pub durability: Health,
    pub falls: bool,
    pub outline: bool,
}

impl From<MaterialKind> for MaterialDesc {
    fn from(kind: MaterialKind) -> Self {
        let (color, durability, falls, outline) = match kind {
            MaterialKind::Solid { color, durability } => (color, durability, true, true),
            MaterialKind::Fixed { color, durability } => (color, durability, false, true),
            MaterialKind::Seamless { color, durability } => (color, durability, true, false),
        };
        Self {
            kind,
            color,
            durability,
            falls,
            outline,
        }
    }
}

/// Shared handle to an interned material
#[derive(Debug, Clone)]
pub struct Material(Arc<MaterialDesc>);

impl PartialEq for Material {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Material {}

impl Hash for Material {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}

fn registry() -> &'static Mutex<HashMap<MaterialKind, Material>> {
    static REGISTRY: OnceLock<Mutex<HashMap<MaterialKind, Material>>> = OnceLock::new();
    REGISTRY.get_or_init(Default::default)
}

impl Material {
    /// Interned material for `kind`
    pub fn get(kind: MaterialKind) -> Self {
        let mut map = registry().lock().unwrap_or_else(PoisonError::into_inner);
        map.entry(kind)
            .or_insert_with(|| {
                log::debug!("interning material {kind:?}");
                Material(Arc::new(MaterialDesc::from(kind)))
            })
            .clone()
    }

    pub fn solid(color: Color, durability: Health) -> Self {
        Self::get(MaterialKind::Solid { color, durability })
    }

    pub fn fixed(color: Color, durability: Health) -> Self {
        Self::get(MaterialKind::Fixed { color, durability })
    }

    pub fn seamless(color: Color, durability: Health) -> Self {
        Self::get(MaterialKind::Seamless { color, durability })
    }

    /// Number of distinct materials interned so far
    pub fn interned() -> usize {
        registry()
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[inline]
    pub fn kind(&self) -> MaterialKind {
        self.0.kind
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.0.color
    }

    #[inline]
    pub fn durability(&self) -> Health {
        self.0.durability
    }

    #[inline]
    pub fn falls(&self) -> bool {
        self.0.falls
    }

    #[inline]
    pub fn outline(&self) -> bool {
        self.0.outline
    }
}
