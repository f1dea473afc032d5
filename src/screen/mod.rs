//! Window and screen contracts between the simulator and a front end
//!
//! A `Window` samples input and accepts primitive draw calls. `Screen`s are
//! stacked on top of one another in a `ScreenTree`; the driver ticks all of
//! them, offers input from the top down and draws from the bottom up.

pub mod headless;
pub mod world_screen;

use std::ops::{Deref, DerefMut};

use crate::geom::{Aabb, Pos};
use crate::sim::Color;
use crate::view::ViewOffset;

pub use headless::{DrawCall, HeadlessWindow};
pub use world_screen::WorldScreen;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Char(char),
    Space,
    Enter,
    Escape,
    Tab,
    Shift,
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    KeyUp(Key),
    KeyDown(Key),
    MouseUp(MouseButton),
    MouseDown(MouseButton),
    /// Pointer moved by `delta` with `buttons` held
    MouseMove {
        buttons: Vec<MouseButton>,
        delta: Pos<2>,
    },
    MouseScroll { axis: usize, amount: f64 },
}

/// What the simulator needs from a front end
pub trait Window {
    fn width(&self) -> i64;

    fn height(&self) -> i64;

    fn shape(&self) -> Pos<2> {
        Pos([self.width(), self.height()])
    }

    fn center(&self) -> Pos<2> {
        Pos([self.width() / 2, self.height() / 2])
    }

    fn bbox(&self) -> Aabb<2> {
        Aabb::sized(Pos::ZERO, self.shape())
    }

    fn mouse_coord(&self) -> Pos<2>;

    fn mouse_delta(&self) -> Pos<2>;

    fn pressed(&self, key: Key) -> bool;

    fn down(&self, button: MouseButton) -> bool;

    fn scroll_y(&self) -> f64;

    fn push_view(&mut self, view: ViewOffset);

    fn pop_view(&mut self);

    fn fill_box(&mut self, bbox: Aabb<2>, color: Color);

    fn line_box(&mut self, bbox: Aabb<2>, color: Color);

    fn fill_cube(&mut self, bbox: Aabb<3>, color: Color);

    fn line_cube(&mut self, bbox: Aabb<3>, color: Color);

    fn text(&mut self, at: Pos<2>, text: &str, color: Color);

    fn centered_text(&mut self, at: Pos<2>, text: &str, color: Color);

    /// Input that arrived since the last call
    fn detect_events(&mut self) -> Vec<InputEvent>;
}

/// Fill a box of any dimension: flat for `N <= 2`, a cube otherwise
pub fn fill_volume<const N: usize>(window: &mut dyn Window, bbox: &Aabb<N>, color: Color) {
    if N <= 2 {
        window.fill_box(bbox.resize(), color);
    } else {
        window.fill_cube(bbox.resize(), color);
    }
}

pub fn line_volume<const N: usize>(window: &mut dyn Window, bbox: &Aabb<N>, color: Color) {
    if N <= 2 {
        window.line_box(bbox.resize(), color);
    } else {
        window.line_cube(bbox.resize(), color);
    }
}

/// A pushed view that is popped when the guard drops
pub struct ViewGuard<'a> {
    window: &'a mut dyn Window,
}

impl<'a> ViewGuard<'a> {
    pub fn new(window: &'a mut dyn Window, view: ViewOffset) -> Self {
        window.push_view(view);
        Self { window }
    }
}

impl<'a> Deref for ViewGuard<'a> {
    type Target = dyn Window + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.window
    }
}

impl<'a> DerefMut for ViewGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.window
    }
}

impl Drop for ViewGuard<'_> {
    fn drop(&mut self) {
        self.window.pop_view();
    }
}

/// One layer of the UI
pub trait Screen {
    fn tick(&mut self, window: &mut dyn Window) {
        let _ = window;
    }

    fn draw(&mut self, window: &mut dyn Window);

    /// Handle an event; `true` stops it reaching screens below
    fn react(&mut self, event: &InputEvent, window: &mut dyn Window) -> bool {
        let _ = (event, window);
        false
    }

    /// Closed screens are dropped after the next tick
    fn is_closed(&self) -> bool {
        false
    }
}

/// Stack of open screens, bottom first
#[derive(Default)]
pub struct ScreenTree {
    screens: Vec<Box<dyn Screen>>,
}

impl ScreenTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, screen: impl Screen + 'static) {
        self.screens.push(Box::new(screen));
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    pub fn tick(&mut self, window: &mut dyn Window) {
        for screen in &mut self.screens {
            screen.tick(window);
        }
        let before = self.screens.len();
        self.screens.retain(|s| !s.is_closed());
        if self.screens.len() != before {
            log::debug!("closed {} screen(s)", before - self.screens.len());
        }
    }

    /// Offer an event from the top screen down; returns whether one took it
    pub fn react(&mut self, event: &InputEvent, window: &mut dyn Window) -> bool {
        self.screens
            .iter_mut()
            .rev()
            .any(|screen| screen.react(event, window))
    }

    pub fn draw(&mut self, window: &mut dyn Window) {
        for screen in &mut self.screens {
            screen.draw(window);
        }
    }
}
