//! A screen that runs a world and steers one actor from the keyboard

use std::collections::BTreeMap;

use super::{InputEvent, Key, MouseButton, Screen, ViewGuard, Window};
use crate::consts::{DIG_REACH, DIG_STRENGTH, JUMP_SPEED, MOUSE_DEGREES_PER_PIXEL, WALK_SPEED};
use crate::geom::{Dir, Face, Pos};
use crate::sim::{Action, Actor, Color, Message, World};
use crate::view::ViewOffset;

pub struct WorldScreen<const N: usize> {
    world: World<N>,
    focus: Option<Actor>,
    bindings: BTreeMap<Key, Action<N>>,
    hud: bool,
    closed: bool,
}

impl<const N: usize> WorldScreen<N> {
    pub fn new(world: World<N>) -> Self {
        Self {
            world,
            focus: None,
            bindings: Self::default_bindings(),
            hud: true,
            closed: false,
        }
    }

    /// Arrows or WASD to walk, space to jump, F/G to dig sideways/down
    pub fn default_bindings() -> BTreeMap<Key, Action<N>> {
        let walk = |dim, speed| Action::Walk { dim, speed };
        let dig = |face| Action::Dig {
            face,
            reach: DIG_REACH,
            strength: DIG_STRENGTH,
        };
        let mut bindings = BTreeMap::from([
            (Key::Left, walk(0, -WALK_SPEED)),
            (Key::Char('a'), walk(0, -WALK_SPEED)),
            (Key::Right, walk(0, WALK_SPEED)),
            (Key::Char('d'), walk(0, WALK_SPEED)),
            (Key::Space, Action::Jump { speed: JUMP_SPEED }),
            (Key::Char('f'), dig(Face::new(Dir::Pos, 0))),
            (Key::Char('g'), dig(Face::DOWN)),
        ]);
        if N >= 3 {
            bindings.insert(Key::Up, walk(2, WALK_SPEED));
            bindings.insert(Key::Char('w'), walk(2, WALK_SPEED));
            bindings.insert(Key::Down, walk(2, -WALK_SPEED));
            bindings.insert(Key::Char('s'), walk(2, -WALK_SPEED));
        }
        bindings
    }

    pub fn bind(&mut self, key: Key, action: Action<N>) {
        self.bindings.insert(key, action);
    }

    pub fn unbind(&mut self, key: Key) -> Option<Action<N>> {
        self.bindings.remove(&key)
    }

    /// Route key actions to `actor` and keep the camera on it
    pub fn focus(&mut self, actor: Actor) {
        self.focus = Some(actor);
    }

    pub fn focused(&self) -> Option<Actor> {
        self.focus
    }

    pub fn world(&self) -> &World<N> {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World<N> {
        &mut self.world
    }

    fn act(&mut self, action: Action<N>) -> bool {
        match self.focus {
            Some(actor) => self.world.send(None, actor, Message::Action(action)),
            None => false,
        }
    }

    /// Centre the view on the focused actor
    fn follow(&mut self, window: &dyn Window) {
        let Some(bbox) = self.focus.and_then(|a| self.world.entity(a)).map(|e| e.bbox()) else {
            return;
        };
        match self.world.view_mut() {
            ViewOffset::View2D { offset } => {
                let [x, y] = bbox.resize::<2>().center();
                *offset = Pos([x.round() as i64, y.round() as i64]) - window.center();
            }
            ViewOffset::View3D(view) => {
                view.offset = Pos(bbox.resize::<3>().center().map(|c| c.round() as i64));
            }
        }
    }
}

impl<const N: usize> Screen for WorldScreen<N> {
    fn tick(&mut self, _window: &mut dyn Window) {
        self.world.tick();
        if let Some(actor) = self.focus
            && !self.world.is_alive(actor)
        {
            log::info!("focused {actor:?} is gone");
            self.focus = None;
        }
    }

    fn draw(&mut self, window: &mut dyn Window) {
        self.follow(window);
        {
            let mut guard = ViewGuard::new(window, *self.world.view());
            self.world.draw(&mut *guard);
        }
        if self.hud {
            let line = format!(
                "tick {}  msgs {}  entities {}",
                self.world.ticks(),
                self.world.msgs_last(),
                self.world.len()
            );
            window.text(Pos([8, 8]), &line, Color::WHITE);
            if self.focus.is_none() {
                window.centered_text(window.center(), "no avatar", Color::GRAY);
            }
        }
    }

    fn react(&mut self, event: &InputEvent, _window: &mut dyn Window) -> bool {
        match event {
            InputEvent::KeyDown(Key::Escape) => {
                self.closed = true;
                true
            }
            InputEvent::KeyDown(Key::Tab) => {
                self.hud = !self.hud;
                true
            }
            InputEvent::KeyDown(key) => match self.bindings.get(key).cloned() {
                Some(action) => self.act(action),
                None => false,
            },
            InputEvent::KeyUp(key) => match self.bindings.get(key) {
                Some(Action::Walk { .. }) => self.act(Action::Brake),
                _ => false,
            },
            InputEvent::MouseMove { buttons, delta } if buttons.contains(&MouseButton::Right) => {
                match self.world.view_mut() {
                    ViewOffset::View3D(view) => {
                        view.rotate(
                            -delta[1] as f64 * MOUSE_DEGREES_PER_PIXEL,
                            delta[0] as f64 * MOUSE_DEGREES_PER_PIXEL,
                        );
                        true
                    }
                    ViewOffset::View2D { .. } => false,
                }
            }
            InputEvent::MouseScroll { axis: 1, amount } => match self.world.view_mut() {
                ViewOffset::View3D(view) => {
                    view.zoom(0.9f64.powf(*amount));
                    true
                }
                ViewOffset::View2D { .. } => false,
            },
            _ => false,
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
