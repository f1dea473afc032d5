//! Plain entity types: falling blocks and fixed bulwarks

use crate::geom::Aabb;
use crate::sim::entity::{Body, Entity, Status, spawn_fragments};
use crate::sim::material::Material;
use crate::sim::part::Part;
use crate::sim::world::World;

/// A body with the standard behaviour; breaks into more blocks
#[derive(Debug, Clone)]
pub struct Block<const N: usize> {
    body: Body<N>,
}

impl<const N: usize> Block<N> {
    /// One part of `material` covering `bbox` (world coordinates)
    pub fn new(bbox: Aabb<N>, material: Material) -> Self {
        Self::from_body(Body::from_box(bbox, material))
    }

    pub fn from_body(body: Body<N>) -> Self {
        Self { body }
    }
}

impl<const N: usize> Entity<N> for Block<N> {
    fn body(&self) -> &Body<N> {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body<N> {
        &mut self.body
    }
}

/// Immovable terrain; never falls and its fragments stay put
#[derive(Debug, Clone)]
pub struct Bulwark<const N: usize> {
    body: Body<N>,
}

impl<const N: usize> Bulwark<N> {
    pub fn new(bbox: Aabb<N>, material: Material) -> Self {
        Self::from_body(Body::from_box(bbox, material))
    }

    pub fn from_body(body: Body<N>) -> Self {
        Self { body }
    }
}

impl<const N: usize> Entity<N> for Bulwark<N> {
    fn body(&self) -> &Body<N> {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body<N> {
        &mut self.body
    }

    fn falls(&self) -> bool {
        false
    }

    fn broken(&mut self, components: Vec<Vec<Part<N>>>, world: &mut World<N>) -> Status {
        spawn_fragments(&self.body, components, world, |body| {
            Box::new(Bulwark::from_body(body)) as Box<dyn Entity<N>>
        });
        Status::Died
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::geom::Pos;
    use crate::sim::material::Color;
    use crate::sim::message::Message;

    fn b2(min: [i64; 2], end: [i64; 2]) -> Aabb<2> {
        Aabb::new(Pos(min), Pos(end))
    }

    #[test]
    fn test_bulwark_ignores_gravity() {
        let mut world = World::<2>::new(WorldConfig::default());
        let base = world.spawn(Bulwark::new(b2([0, 0], [10, 10]), Material::solid(Color::GRAY, 1)));
        for _ in 0..5 {
            world.tick();
        }
        assert_eq!(world.entity(base).unwrap().bbox(), b2([0, 0], [10, 10]));
    }

    #[test]
    fn test_bulwark_fragments_are_bulwarks() {
        let mut world = World::<2>::new(WorldConfig::default());
        let base = world.spawn(Bulwark::new(b2([0, 0], [30, 10]), Material::solid(Color::GRAY, 1)));
        world.send(None, base, Message::hit(b2([10, 0], [20, 10]), 5));
        world.tick();
        assert!(!world.is_alive(base));
        assert_eq!(world.len(), 2);
        let pieces: Vec<_> = world.iter().collect();
        assert!(pieces.iter().all(|(actor, _)| world.entity_as::<Bulwark<2>>(*actor).is_some()));
        for _ in 0..5 {
            world.tick();
        }
        let mut boxes: Vec<_> = world.iter().map(|(_, e)| e.bbox()).collect();
        boxes.sort_by_key(|b| (b.min(), b.end()));
        assert_eq!(boxes, vec![b2([0, 0], [10, 10]), b2([20, 0], [30, 10])]);
    }
}
