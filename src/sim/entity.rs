//! Entity bodies and the per-tick protocol
//!
//! An entity is anything the world can tick. Its state lives in a `Body`:
//! parts in a bordered tree whose origin is the entity's position, plus
//! velocity and a user acceleration. The trait supplies the standard
//! behaviour (drain messages, apply hits, fracture, fall, move) and entity
//! types override the hooks they care about.

use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;

use crate::consts::VERTICAL;
use crate::geom::{Aabb, Intersect, Line, Pos, Vector};
use crate::screen::{Window, fill_volume};
use crate::sim::block::Block;
use crate::sim::material::Material;
use crate::sim::message::{Envelope, Message, NotifyCause};
use crate::sim::part::Part;
use crate::sim::world::{Actor, World};
use crate::tree::{BRTree, ItemId};

/// Result of one tick or one received message
///
/// Ordered so folding messages with `max` keeps the most severe outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Status {
    #[default]
    None,
    /// At rest; the world stops ticking it until a message arrives
    Idle,
    /// Moved this tick
    Move,
    /// Remove at the end of this tick
    Died,
}

/// Physical state shared by every entity type
#[derive(Debug, Clone, Default)]
pub struct Body<const N: usize> {
    parts: BRTree<N, Part<N>>,
    vel: Vector<N>,
    accel: Vector<N>,
    actor: Option<Actor>,
}

impl<const N: usize> Body<N> {
    /// Empty body positioned at `loc`
    pub fn new(loc: Pos<N>) -> Self {
        Self {
            parts: BRTree::new(loc),
            vel: Vector::ZERO,
            accel: Vector::ZERO,
            actor: None,
        }
    }

    /// Body at `loc` holding `parts`, whose boxes are relative to `loc`
    pub fn from_parts(loc: Pos<N>, parts: impl IntoIterator<Item = Part<N>>) -> Self {
        let mut body = Self::new(loc);
        for part in parts {
            body.parts.insert(part);
        }
        body
    }

    /// Body whose single part covers `bbox` in world coordinates
    pub fn from_box(bbox: Aabb<N>, material: Material) -> Self {
        let local = Aabb::sized(Pos::ZERO, bbox.shape());
        Self::from_parts(bbox.min(), [Part::new(local, material)])
    }

    pub fn with_velocity(mut self, vel: Vector<N>) -> Self {
        self.vel = vel;
        self
    }

    #[inline]
    pub fn actor(&self) -> Option<Actor> {
        self.actor
    }

    pub(crate) fn bind(&mut self, actor: Actor) {
        self.actor = Some(actor);
    }

    #[inline]
    pub fn loc(&self) -> Pos<N> {
        self.parts.loc()
    }

    pub fn set_loc(&mut self, loc: Pos<N>) {
        self.parts.set_loc(loc);
    }

    #[inline]
    pub fn parts(&self) -> &BRTree<N, Part<N>> {
        &self.parts
    }

    pub fn parts_mut(&mut self) -> &mut BRTree<N, Part<N>> {
        &mut self.parts
    }

    #[inline]
    pub fn vel(&self) -> Vector<N> {
        self.vel
    }

    pub fn set_vel(&mut self, vel: Vector<N>) {
        self.vel = vel;
    }

    #[inline]
    pub fn accel(&self) -> Vector<N> {
        self.accel
    }

    pub fn set_accel(&mut self, accel: Vector<N>) {
        self.accel = accel;
    }

    /// World box of all parts; empty at `loc` when there are none
    pub fn bbox(&self) -> Aabb<N> {
        self.parts
            .bbox()
            .unwrap_or_else(|| Aabb::empty_at(self.loc()))
    }

    /// Parts overlapping a world box, with their world boxes
    pub fn parts_in(
        &self,
        bbox: &Aabb<N>,
    ) -> impl Iterator<Item = (Aabb<N>, &Part<N>)> + use<'_, N> {
        self.parts
            .within(bbox)
            .map(|(_, part)| (self.parts.global(part), part))
    }

    /// Parts covering a world cell
    pub fn parts_at(&self, pos: Pos<N>) -> impl Iterator<Item = &Part<N>> {
        self.parts
            .at(pos)
            .into_iter()
            .filter_map(|id| self.parts.get(id))
    }

    /// Any part overlapping a world box
    pub fn touches(&self, bbox: &Aabb<N>) -> bool {
        self.parts.first(bbox).is_some()
    }

    /// Closest part the segment enters, in world coordinates
    pub fn first(&self, line: &Line<N>) -> Option<Intersect<N>> {
        self.parts.first_hit(line).map(|(_, hit)| hit)
    }

    /// Every part falls
    pub fn falls(&self) -> bool {
        !self.parts.is_empty() && self.parts.iter().all(|(_, p)| p.material().falls())
    }

    /// Some other entity touches a downward-facing border
    pub fn has_below(&self, world: &World<N>) -> bool {
        self.parts
            .borders()
            .filter(|edge| edge.face.is_down())
            .any(|edge| {
                world
                    .others(&edge.bbox, self.actor)
                    .any(|(_, other)| other.body().touches(&edge.bbox))
            })
    }

    /// Entities resting against an upward-facing border
    pub fn above(&self, world: &World<N>) -> BTreeSet<Actor> {
        let mut out = BTreeSet::new();
        for edge in self.parts.borders().filter(|edge| edge.face.is_up()) {
            out.extend(
                world
                    .others(&edge.bbox, self.actor)
                    .filter(|(_, other)| other.body().touches(&edge.bbox))
                    .map(|(actor, _)| actor),
            );
        }
        out
    }

    /// Entities whose parts touch any of `parts` (world boxes) or lie one cell away
    fn neighbours(&self, boxes: &[Aabb<N>], world: &World<N>) -> BTreeSet<Actor> {
        let mut out = BTreeSet::new();
        for bbox in boxes {
            let near = bbox.widen(1);
            out.extend(
                world
                    .others(&near, self.actor)
                    .filter(|(_, other)| other.body().touches(&near))
                    .map(|(actor, _)| actor),
            );
        }
        out
    }

    /// Apply every hit, returning whether any landed and who was nearby
    fn apply_hits(
        &mut self,
        hits: &[Envelope<N>],
        world: &World<N>,
    ) -> (bool, BTreeSet<Actor>) {
        let mut landed = false;
        let mut neighbours = BTreeSet::new();
        for envelope in hits {
            let Message::Hit { area, strength } = &envelope.message else {
                continue;
            };
            let affected: Vec<ItemId> = self.parts.query(area);
            if affected.is_empty() {
                continue;
            }
            landed = true;
            let boxes: Vec<Aabb<N>> = affected
                .iter()
                .filter_map(|&id| self.parts.get(id))
                .map(|p| self.parts.global(p))
                .collect();
            neighbours.extend(self.neighbours(&boxes, world));

            let local = area.translate(-self.loc());
            let pieces: Vec<Part<N>> = self
                .parts
                .remove_all(affected)
                .iter()
                .flat_map(|p| p.hit(&local, *strength))
                .collect();
            for piece in pieces {
                self.parts.insert(piece);
            }
        }
        (landed, neighbours)
    }

    /// Parts grouped by face-adjacency
    pub fn components(&self) -> Vec<Vec<Part<N>>> {
        self.parts
            .components()
            .into_iter()
            .map(|group| {
                group
                    .into_iter()
                    .filter_map(|id| self.parts.get(id).cloned())
                    .collect()
            })
            .collect()
    }

    /// Velocity for the next step, limited so no part passes through another entity
    ///
    /// Each axis is handled on its own: the part is swept along that axis
    /// only and the speed is cut to the gap to the nearest obstacle ahead.
    pub fn next_velocity(&self, falls: bool, world: &World<N>) -> Vector<N> {
        let mut accel = self.accel;
        if falls && !self.has_below(world) {
            accel += world.gravity();
        }
        let max = world.max_velocity();
        let mut v = (self.vel + accel).map(|c| c.clamp(-max, max));
        for dim in 0..N {
            for (_, part) in self.parts.iter() {
                if v[dim] == 0 {
                    break;
                }
                let from = self.parts.global(part);
                let swept = from.extend(dim, v[dim]);
                for (_, other) in world.others(&swept, self.actor) {
                    for (obstacle, _) in other.body().parts_in(&swept) {
                        if v[dim] > 0 && obstacle.min()[dim] >= from.end()[dim] {
                            v[dim] = v[dim].min(obstacle.min()[dim] - from.end()[dim]);
                        } else if v[dim] < 0 && obstacle.end()[dim] <= from.min()[dim] {
                            v[dim] = v[dim].max(obstacle.end()[dim] - from.min()[dim]);
                        }
                    }
                }
            }
        }
        if v != self.vel + accel {
            log::trace!("{:?} velocity limited to {v:?}", self.actor);
        }
        v
    }

    /// Standing on something and not moving vertically
    pub fn grounded(&self, world: &World<N>) -> bool {
        self.vel[VERTICAL] == 0 && self.has_below(world)
    }
}

/// Something that lives in a `World`
///
/// Only `body`/`body_mut` are required. The remaining methods carry the
/// standard behaviour and are the extension points for entity types.
pub trait Entity<const N: usize>: Any + fmt::Debug {
    fn body(&self) -> &Body<N>;

    fn body_mut(&mut self) -> &mut Body<N>;

    fn bbox(&self) -> Aabb<N> {
        self.body().bbox()
    }

    /// Whether gravity applies
    fn falls(&self) -> bool {
        self.body().falls()
    }

    /// React to one non-hit message
    fn receive(&mut self, envelope: &Envelope<N>, world: &mut World<N>) -> Status {
        let _ = world;
        receive_default(envelope)
    }

    /// Split into `components` after a hit; the default respawns each as a `Block`
    fn broken(&mut self, components: Vec<Vec<Part<N>>>, world: &mut World<N>) -> Status {
        spawn_fragments(self.body(), components, world, |body| {
            Box::new(Block::from_body(body)) as Box<dyn Entity<N>>
        });
        Status::Died
    }

    fn tick(&mut self, messages: Vec<Envelope<N>>, world: &mut World<N>) -> Status {
        tick_entity(self, messages, world)
    }

    fn draw(&self, window: &mut dyn Window) {
        draw_body(self.body(), window);
    }
}

/// `Destroy` kills; everything else is ignored
pub fn receive_default<const N: usize>(envelope: &Envelope<N>) -> Status {
    match envelope.message {
        Message::Destroy(_) => Status::Died,
        _ => Status::None,
    }
}

/// Spawn one entity per component at the body's position, keeping its velocity
pub fn spawn_fragments<const N: usize>(
    body: &Body<N>,
    components: Vec<Vec<Part<N>>>,
    world: &mut World<N>,
    make: impl Fn(Body<N>) -> Box<dyn Entity<N>>,
) -> Vec<Actor> {
    log::debug!(
        "{:?} broke into {} pieces",
        body.actor(),
        components.len()
    );
    components
        .into_iter()
        .map(|parts| {
            let fragment = Body::from_parts(body.loc(), parts).with_velocity(body.vel());
            world.spawn_boxed_by(body.actor(), make(fragment))
        })
        .collect()
}

/// The standard tick: messages, hits, fracture, velocity, move
pub fn tick_entity<const N: usize, E: Entity<N> + ?Sized>(
    entity: &mut E,
    messages: Vec<Envelope<N>>,
    world: &mut World<N>,
) -> Status {
    let Some(me) = entity.body().actor() else {
        return Status::None;
    };
    let was_still = entity.body().vel().is_zero();
    let (hits, others): (Vec<_>, Vec<_>) = messages.into_iter().partition(|m| m.message.is_hit());

    let mut status = Status::None;
    for envelope in &others {
        status = status.max(entity.receive(envelope, world));
        if status == Status::Died {
            let above = entity.body().above(world);
            world.send_all(Some(me), above, Message::Notify(NotifyCause::Died));
            return Status::Died;
        }
    }

    if !hits.is_empty() {
        let (landed, neighbours) = entity.body_mut().apply_hits(&hits, world);
        if landed {
            let components = entity.body().components();
            match components.len() {
                0 => {
                    debug_assert!(entity.body().parts().is_empty(), "parts without components");
                    log::debug!("{me:?} destroyed by hit");
                    world.send_all(Some(me), neighbours, Message::Notify(NotifyCause::Died));
                    return Status::Died;
                }
                1 => {
                    world.send_all(Some(me), neighbours, Message::Notify(NotifyCause::Changed));
                }
                _ => {
                    world.send_all(Some(me), neighbours, Message::Notify(NotifyCause::Broken));
                    return entity.broken(components, world);
                }
            }
        }
    }

    let falls = entity.falls();
    let next = entity.body().next_velocity(falls, world);
    entity.body_mut().set_vel(next);
    if next.is_zero() {
        return Status::Idle;
    }
    if was_still {
        let above = entity.body().above(world);
        world.send_all(Some(me), above, Message::Notify(NotifyCause::Moved));
    }
    entity.body_mut().parts_mut().shift(next);
    Status::Move
}

/// Fill every part, then darken the inner rim of outlined materials
pub fn draw_body<const N: usize>(body: &Body<N>, window: &mut dyn Window) {
    let parts = body.parts();
    for (_, part) in parts.iter() {
        fill_volume(window, &parts.global(part), part.material().color());
    }
    for edge in parts.borders() {
        let rim = edge.bbox.translate(-edge.face.normal::<N>());
        for (bbox, part) in body.parts_in(&rim) {
            if part.material().outline()
                && let Some(band) = bbox.intersect(&rim)
            {
                fill_volume(window, &band, part.material().color().shade(0.6));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::sim::material::Color;

    fn b2(min: [i64; 2], end: [i64; 2]) -> Aabb<2> {
        Aabb::new(Pos(min), Pos(end))
    }

    #[test]
    fn test_status_order() {
        assert!(Status::None < Status::Idle);
        assert!(Status::Idle < Status::Move);
        assert!(Status::Move < Status::Died);
        assert_eq!([Status::Idle, Status::Died, Status::Move].into_iter().max(), Some(Status::Died));
    }

    #[test]
    fn test_body_bbox_follows_loc() {
        let mut body = Body::from_box(b2([10, 20], [15, 30]), Material::solid(Color::GRAY, 1));
        assert_eq!(body.loc(), Pos([10, 20]));
        assert_eq!(body.bbox(), b2([10, 20], [15, 30]));
        body.parts_mut().shift(Pos([1, -1]));
        assert_eq!(body.bbox(), b2([11, 19], [16, 29]));
        assert!(body.touches(&b2([15, 28], [16, 29])));
        assert!(!body.touches(&b2([16, 28], [17, 29])));
    }

    #[test]
    fn test_falls_needs_every_part() {
        let solid = Material::solid(Color::GRAY, 1);
        let fixed = Material::fixed(Color::STONE, 1);
        let mixed = Body::from_parts(
            Pos([0, 0]),
            [Part::new(b2([0, 0], [1, 1]), solid.clone()), Part::new(b2([1, 0], [2, 1]), fixed)],
        );
        assert!(!mixed.falls());
        let falling = Body::from_parts(Pos([0, 0]), [Part::new(b2([0, 0], [1, 1]), solid)]);
        assert!(falling.falls());
        assert!(!Body::<2>::new(Pos::ZERO).falls());
    }

    #[test]
    fn test_unbound_entity_does_nothing() {
        let mut world = World::<2>::new(WorldConfig::default());
        let mut block = Block::new(b2([0, 0], [1, 1]), Material::solid(Color::GRAY, 1));
        assert_eq!(block.tick(Vec::new(), &mut world), Status::None);
        assert_eq!(block.body().vel(), Vector::ZERO);
    }

    #[test]
    fn test_velocity_stops_at_obstacle() {
        let config = WorldConfig {
            gravity_accel: 0.0,
            ..Default::default()
        };
        let mut world = World::<2>::new(config);
        world.spawn(Block::new(b2([20, 0], [30, 10]), Material::fixed(Color::STONE, 1)));
        let body = Body::from_box(b2([0, 0], [10, 10]), Material::solid(Color::GRAY, 1))
            .with_velocity(Pos([50, 0]));
        assert_eq!(body.next_velocity(true, &world), Pos([10, 0]));
        let away = body.clone().with_velocity(Pos([-50, 0]));
        assert_eq!(away.next_velocity(true, &world), Pos([-50, 0]));
    }

    #[test]
    fn test_has_below_and_above() {
        let mut world = World::<2>::new(WorldConfig::default());
        let floor = world.spawn(Block::new(b2([0, 10], [100, 20]), Material::fixed(Color::STONE, 1)));
        let top = world.spawn(Block::new(b2([40, 0], [50, 10]), Material::solid(Color::GRAY, 1)));
        let floor_body = world.entity(floor).unwrap().body();
        let top_body = world.entity(top).unwrap().body();
        assert!(top_body.has_below(&world));
        assert!(!floor_body.has_below(&world));
        assert_eq!(floor_body.above(&world), BTreeSet::from([top]));
        assert!(top_body.above(&world).is_empty());
    }
}
