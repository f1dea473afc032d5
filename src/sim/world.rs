//! The world: owns every entity, runs the tick loop, delivers messages
//!
//! Entities sit in an R-Tree keyed by their world box. Each tick only the
//! awake set is visited, in actor order, so two worlds fed the same inputs
//! evolve identically.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::mem;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::config::WorldConfig;
use crate::consts::VERTICAL;
use crate::error::Result;
use crate::geom::{Aabb, Intersect, Line, Pos, Vector};
use crate::screen::Window;
use crate::sim::entity::{Entity, Status};
use crate::sim::material::Color;
use crate::sim::message::{DestroyCause, Envelope, Message};
use crate::tree::{Bounded, ItemId, RTree};
use crate::view::ViewOffset;

/// Identity of an entity; never reused within a world
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Actor(u64);

impl Actor {
    #[inline]
    pub fn id(self) -> u64 {
        self.0
    }
}

/// An index slot: the entity plus the box it is filed under
///
/// `entity` is `None` only while that entity is running its own tick.
#[derive(Debug)]
struct Occupant<const N: usize> {
    actor: Actor,
    bbox: Aabb<N>,
    entity: Option<Box<dyn Entity<N>>>,
}

impl<const N: usize> Bounded<N> for Occupant<N> {
    fn bbox(&self) -> Aabb<N> {
        self.bbox
    }
}

#[derive(Debug)]
pub struct World<const N: usize> {
    config: WorldConfig,
    entities: RTree<N, Occupant<N>>,
    actors: BTreeMap<Actor, ItemId>,
    awake: BTreeSet<Actor>,
    died: BTreeSet<Actor>,
    pending: BTreeMap<Actor, Vec<Envelope<N>>>,
    view: ViewOffset,
    random: Pcg32,
    /// Pixels/tick², pointing down
    gravity: Vector<N>,
    /// Pixels/tick, per axis
    max_velocity: i64,
    maximum_y: i64,
    ticks: u64,
    msgs_last: usize,
    next_actor: u64,
}

impl<const N: usize> World<N> {
    pub fn new(config: WorldConfig) -> Self {
        assert!(N > VERTICAL, "worlds need a vertical axis");
        let gravity = Vector::<N>::unit(VERTICAL) * config.gravity_per_tick();
        let max_velocity = config.max_velocity_per_tick();
        log::info!(
            "World<{N}> created: gravity {} px/tick², max velocity {max_velocity} px/tick, seed {}",
            gravity[VERTICAL],
            config.seed
        );
        Self {
            entities: RTree::new(),
            actors: BTreeMap::new(),
            awake: BTreeSet::new(),
            died: BTreeSet::new(),
            pending: BTreeMap::new(),
            view: ViewOffset::for_dims(N),
            random: Pcg32::seed_from_u64(config.seed),
            gravity,
            max_velocity,
            maximum_y: config.maximum_y,
            ticks: 0,
            msgs_last: 0,
            next_actor: 0,
            config,
        }
    }

    /// Like `new`, rejecting unusable settings
    pub fn try_new(config: WorldConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    #[inline]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    #[inline]
    pub fn gravity(&self) -> Vector<N> {
        self.gravity
    }

    #[inline]
    pub fn max_velocity(&self) -> i64 {
        self.max_velocity
    }

    #[inline]
    pub fn maximum_y(&self) -> i64 {
        self.maximum_y
    }

    /// Ticks run so far
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Messages delivered during the last tick
    #[inline]
    pub fn msgs_last(&self) -> usize {
        self.msgs_last
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn is_alive(&self, actor: Actor) -> bool {
        self.actors.contains_key(&actor)
    }

    pub fn is_awake(&self, actor: Actor) -> bool {
        self.awake.contains(&actor)
    }

    pub fn view(&self) -> &ViewOffset {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewOffset {
        &mut self.view
    }

    /// The world's generator; every random draw goes through it
    pub fn random(&mut self) -> &mut Pcg32 {
        &mut self.random
    }

    pub fn random_color(&mut self) -> Color {
        Color::random(&mut self.random)
    }

    /// Box inside `bounds` with each side in `1..=max_shape`
    ///
    /// # Panics
    /// If `max_shape` is not positive or does not fit in `bounds`.
    pub fn random_box(&mut self, bounds: &Aabb<N>, max_shape: Vector<N>) -> Aabb<N> {
        assert!(
            max_shape.all_le(&bounds.shape()) && Pos::splat(1).all_le(&max_shape),
            "random box of up to {max_shape:?} does not fit in {bounds:?}"
        );
        let mut min = Pos::ZERO;
        let mut shape = Pos::ZERO;
        for d in 0..N {
            shape[d] = self.random.random_range(1..=max_shape[d]);
            min[d] = self
                .random
                .random_range(bounds.min()[d]..=bounds.end()[d] - shape[d]);
        }
        Aabb::sized(min, shape)
    }

    /// Add an entity, bind it to a fresh actor and wake it
    pub fn spawn<E: Entity<N>>(&mut self, entity: E) -> Actor {
        self.spawn_boxed(Box::new(entity))
    }

    pub fn spawn_boxed(&mut self, mut entity: Box<dyn Entity<N>>) -> Actor {
        let actor = Actor(self.next_actor);
        self.next_actor += 1;
        entity.body_mut().bind(actor);
        let bbox = entity.bbox();
        let item = self.entities.insert(Occupant {
            actor,
            bbox,
            entity: Some(entity),
        });
        self.actors.insert(actor, item);
        self.awake.insert(actor);
        log::debug!("spawned {actor:?} at {bbox:?}");
        actor
    }

    /// Spawn and send `Created` from `src`
    pub fn spawn_by<E: Entity<N>>(&mut self, src: Option<Actor>, entity: E) -> Actor {
        self.spawn_boxed_by(src, Box::new(entity))
    }

    pub fn spawn_boxed_by(&mut self, src: Option<Actor>, entity: Box<dyn Entity<N>>) -> Actor {
        let actor = self.spawn_boxed(entity);
        self.send(src, actor, Message::Created);
        actor
    }

    /// Queue a message for `dst`'s next tick; dropped if `dst` is gone
    pub fn send(&mut self, src: Option<Actor>, dst: Actor, message: Message<N>) -> bool {
        if !self.is_alive(dst) {
            log::trace!("dropping {message:?} for dead {dst:?}");
            return false;
        }
        self.pending
            .entry(dst)
            .or_default()
            .push(Envelope::new(src, message));
        true
    }

    pub fn send_all(
        &mut self,
        src: Option<Actor>,
        dsts: impl IntoIterator<Item = Actor>,
        message: Message<N>,
    ) {
        for dst in dsts {
            self.send(src, dst, message.clone());
        }
    }

    /// Ask an actor to remove itself next tick
    pub fn kill(&mut self, actor: Actor) -> bool {
        self.send(None, actor, Message::Destroy(DestroyCause::Removed))
    }

    pub fn entity(&self, actor: Actor) -> Option<&(dyn Entity<N> + 'static)> {
        let item = *self.actors.get(&actor)?;
        self.entities.get(item)?.entity.as_deref()
    }

    pub fn entity_mut(&mut self, actor: Actor) -> Option<&mut (dyn Entity<N> + 'static)> {
        let item = *self.actors.get(&actor)?;
        self.entities.get_mut(item)?.entity.as_deref_mut()
    }

    /// The entity behind `actor` if it is a `T`
    pub fn entity_as<T: Entity<N>>(&self, actor: Actor) -> Option<&T> {
        let entity: &(dyn Any + 'static) = self.entity(actor)?;
        entity.downcast_ref::<T>()
    }

    pub fn entity_as_mut<T: Entity<N>>(&mut self, actor: Actor) -> Option<&mut T> {
        let entity: &mut (dyn Any + 'static) = self.entity_mut(actor)?;
        entity.downcast_mut::<T>()
    }

    /// Every entity, in actor order
    pub fn iter(&self) -> impl Iterator<Item = (Actor, &dyn Entity<N>)> {
        self.actors
            .keys()
            .filter_map(|&actor| Some((actor, self.entity(actor)?)))
    }

    /// Entities whose box overlaps `bbox`, in actor order
    pub fn entities_in(
        &self,
        bbox: &Aabb<N>,
    ) -> impl Iterator<Item = (Actor, &dyn Entity<N>)> + use<'_, N> {
        let mut found: Vec<(Actor, &dyn Entity<N>)> = self
            .entities
            .within(bbox)
            .filter_map(|(_, o)| Some((o.actor, o.entity.as_deref()?)))
            .collect();
        found.sort_by_key(|(actor, _)| *actor);
        found.into_iter()
    }

    /// Entities with a part covering `pos`
    pub fn entities_at(&self, pos: Pos<N>) -> impl Iterator<Item = (Actor, &dyn Entity<N>)> {
        self.entities_in(&Aabb::unit(pos))
            .filter(move |(_, e)| e.body().parts_at(pos).next().is_some())
    }

    /// `entities_in` without `except`
    pub fn others(
        &self,
        bbox: &Aabb<N>,
        except: Option<Actor>,
    ) -> impl Iterator<Item = (Actor, &dyn Entity<N>)> + use<'_, N> {
        self.entities_in(bbox)
            .filter(move |(actor, _)| Some(*actor) != except)
    }

    /// Nearest entity the segment enters
    pub fn first(&self, line: &Line<N>) -> Option<(Actor, Intersect<N>)> {
        self.first_except(line, None)
    }

    pub fn first_except(&self, line: &Line<N>, except: Option<Actor>) -> Option<(Actor, Intersect<N>)> {
        let mut best: Option<(Actor, Intersect<N>)> = None;
        for (actor, entity) in self.others(&line.cell_bounds(), except) {
            let Some(hit) = entity.body().first(line) else {
                continue;
            };
            if best.as_ref().is_none_or(|(_, b)| hit.distance < b.distance) {
                best = Some((actor, hit));
            }
        }
        best
    }

    /// Advance one step
    ///
    /// Messages queued before the call are delivered now; anything sent
    /// while ticking waits for the next call.
    pub fn tick(&mut self) {
        self.msgs_last = 0;
        self.ticks += 1;

        let mut inboxes = mem::take(&mut self.pending);
        for &actor in inboxes.keys() {
            if self.is_alive(actor) {
                self.awake.insert(actor);
            } else {
                self.died.insert(actor);
            }
        }

        let awake: Vec<Actor> = self.awake.iter().copied().collect();
        let mut idled = Vec::new();
        for actor in awake {
            let Some(&item) = self.actors.get(&actor) else {
                continue;
            };
            let Some(occupant) = self.entities.get_mut(item) else {
                continue;
            };
            let prev = occupant.bbox;
            let Some(mut entity) = occupant.entity.take() else {
                continue;
            };

            let messages = inboxes.remove(&actor).unwrap_or_default();
            self.msgs_last += messages.len();
            let status = entity.tick(messages, self);
            let bbox = entity.bbox();
            if let Some(occupant) = self.entities.get_mut(item) {
                occupant.entity = Some(entity);
                occupant.bbox = bbox;
            }
            if bbox != prev {
                self.entities.relocate(item, &prev);
            }

            match status {
                Status::Died => {
                    self.died.insert(actor);
                    continue;
                }
                Status::Idle => idled.push(actor),
                Status::None | Status::Move => {}
            }
            if bbox.min()[VERTICAL] > self.maximum_y {
                log::debug!("{actor:?} fell out of the world at {bbox:?}");
                self.send(None, actor, Message::Destroy(DestroyCause::OutOfBounds));
            }
        }

        for actor in idled {
            self.awake.remove(&actor);
        }
        for actor in mem::take(&mut self.died) {
            self.awake.remove(&actor);
            self.pending.remove(&actor);
            if let Some(item) = self.actors.remove(&actor) {
                self.entities.remove(item);
                log::debug!("{actor:?} died");
            }
        }
        log::trace!(
            "tick {}: {} messages, {} awake, {} alive",
            self.ticks,
            self.msgs_last,
            self.awake.len(),
            self.actors.len()
        );
    }

    /// Draw every entity in actor order
    pub fn draw(&self, window: &mut dyn Window) {
        for (_, entity) in self.iter() {
            entity.draw(window);
        }
    }
}
