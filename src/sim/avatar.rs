//! A player-controlled entity driven by `Action` messages

use crate::consts::VERTICAL;
use crate::geom::{Aabb, Vector};
use crate::sim::entity::{Body, Entity, Status, receive_default};
use crate::sim::material::Material;
use crate::sim::message::{Action, Envelope, Message};
use crate::sim::world::World;

#[derive(Debug, Clone)]
pub struct Avatar<const N: usize> {
    body: Body<N>,
    /// Dig actions performed so far
    digs: u64,
}

impl<const N: usize> Avatar<N> {
    pub fn new(bbox: Aabb<N>, material: Material) -> Self {
        Self {
            body: Body::from_box(bbox, material),
            digs: 0,
        }
    }

    pub fn digs(&self) -> u64 {
        self.digs
    }

    fn act(&mut self, action: &Action<N>, world: &mut World<N>) -> Status {
        match *action {
            Action::Jump { speed } => {
                if self.body.grounded(world) {
                    let mut vel = self.body.vel();
                    vel[VERTICAL] = -speed;
                    self.body.set_vel(vel);
                }
            }
            Action::Walk { dim, speed } => {
                if dim >= N || dim == VERTICAL {
                    log::warn!("ignoring walk along axis {dim}");
                } else {
                    let mut vel = self.body.vel();
                    vel[dim] = speed;
                    self.body.set_vel(vel);
                }
            }
            Action::Brake => {
                let vertical = self.body.vel()[VERTICAL];
                self.body.set_vel(Vector::ZERO.with(VERTICAL, vertical));
            }
            Action::Dig {
                face,
                reach,
                strength,
            } => {
                let area = self.body.bbox().edge(face, reach).bbox;
                let me = self.body.actor();
                let targets: Vec<_> = world.others(&area, me).map(|(actor, _)| actor).collect();
                log::trace!("{me:?} digs {area:?}, {} targets", targets.len());
                world.send_all(me, targets, Message::hit(area, strength));
                self.digs += 1;
            }
            Action::Custom(_) => {}
        }
        Status::None
    }
}

impl<const N: usize> Entity<N> for Avatar<N> {
    fn body(&self) -> &Body<N> {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body<N> {
        &mut self.body
    }

    fn receive(&mut self, envelope: &Envelope<N>, world: &mut World<N>) -> Status {
        match &envelope.message {
            Message::Action(action) => self.act(action, world),
            _ => receive_default(envelope),
        }
    }
}
