//! A window with no display that records what would have been drawn

use std::collections::{BTreeSet, VecDeque};

use super::{InputEvent, Key, MouseButton, Window};
use crate::geom::{Aabb, Pos};
use crate::sim::Color;
use crate::view::ViewOffset;

/// One recorded primitive
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    FillBox(Aabb<2>, Color),
    LineBox(Aabb<2>, Color),
    FillCube(Aabb<3>, Color),
    LineCube(Aabb<3>, Color),
    Text {
        at: Pos<2>,
        text: String,
        color: Color,
        centered: bool,
    },
}

#[derive(Debug, Clone)]
pub struct HeadlessWindow {
    width: i64,
    height: i64,
    views: Vec<ViewOffset>,
    max_views: usize,
    calls: Vec<DrawCall>,
    queued: VecDeque<InputEvent>,
    keys: BTreeSet<Key>,
    buttons: BTreeSet<MouseButton>,
    mouse: Pos<2>,
    mouse_delta: Pos<2>,
    scroll_y: f64,
}

impl HeadlessWindow {
    pub fn new(width: i64, height: i64) -> Self {
        Self {
            width,
            height,
            views: Vec::new(),
            max_views: 0,
            calls: Vec::new(),
            queued: VecDeque::new(),
            keys: BTreeSet::new(),
            buttons: BTreeSet::new(),
            mouse: Pos::ZERO,
            mouse_delta: Pos::ZERO,
            scroll_y: 0.0,
        }
    }

    /// Deliver `event` on the next `detect_events`
    pub fn queue(&mut self, event: InputEvent) {
        self.queued.push_back(event);
    }

    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Views currently pushed
    pub fn view_depth(&self) -> usize {
        self.views.len()
    }

    /// Deepest the view stack has been
    pub fn max_view_depth(&self) -> usize {
        self.max_views
    }

    pub fn current_view(&self) -> Option<&ViewOffset> {
        self.views.last()
    }
}

impl Window for HeadlessWindow {
    fn width(&self) -> i64 {
        self.width
    }

    fn height(&self) -> i64 {
        self.height
    }

    fn mouse_coord(&self) -> Pos<2> {
        self.mouse
    }

    fn mouse_delta(&self) -> Pos<2> {
        self.mouse_delta
    }

    fn pressed(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }

    fn down(&self, button: MouseButton) -> bool {
        self.buttons.contains(&button)
    }

    fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    fn push_view(&mut self, view: ViewOffset) {
        self.views.push(view);
        self.max_views = self.max_views.max(self.views.len());
    }

    fn pop_view(&mut self) {
        if self.views.pop().is_none() {
            log::warn!("pop_view on an empty view stack");
        }
    }

    fn fill_box(&mut self, bbox: Aabb<2>, color: Color) {
        self.calls.push(DrawCall::FillBox(bbox, color));
    }

    fn line_box(&mut self, bbox: Aabb<2>, color: Color) {
        self.calls.push(DrawCall::LineBox(bbox, color));
    }

    fn fill_cube(&mut self, bbox: Aabb<3>, color: Color) {
        self.calls.push(DrawCall::FillCube(bbox, color));
    }

    fn line_cube(&mut self, bbox: Aabb<3>, color: Color) {
        self.calls.push(DrawCall::LineCube(bbox, color));
    }

    fn text(&mut self, at: Pos<2>, text: &str, color: Color) {
        self.calls.push(DrawCall::Text {
            at,
            text: text.to_owned(),
            color,
            centered: false,
        });
    }

    fn centered_text(&mut self, at: Pos<2>, text: &str, color: Color) {
        self.calls.push(DrawCall::Text {
            at,
            text: text.to_owned(),
            color,
            centered: true,
        });
    }

    /// Drain queued events, updating key, button and pointer state as a real window would
    fn detect_events(&mut self) -> Vec<InputEvent> {
        self.mouse_delta = Pos::ZERO;
        self.scroll_y = 0.0;
        let events: Vec<InputEvent> = self.queued.drain(..).collect();
        for event in &events {
            match event {
                InputEvent::KeyDown(key) => {
                    self.keys.insert(*key);
                }
                InputEvent::KeyUp(key) => {
                    self.keys.remove(key);
                }
                InputEvent::MouseDown(button) => {
                    self.buttons.insert(*button);
                }
                InputEvent::MouseUp(button) => {
                    self.buttons.remove(button);
                }
                InputEvent::MouseMove { delta, .. } => {
                    self.mouse += *delta;
                    self.mouse_delta += *delta;
                }
                InputEvent::MouseScroll { axis, amount } => {
                    if *axis == 1 {
                        self.scroll_y += amount;
                    }
                }
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry() {
        let window = HeadlessWindow::new(640, 480);
        assert_eq!(window.shape(), Pos([640, 480]));
        assert_eq!(window.center(), Pos([320, 240]));
        assert_eq!(window.bbox(), Aabb::new(Pos([0, 0]), Pos([640, 480])));
    }

    #[test]
    fn test_events_update_input_state() {
        let mut window = HeadlessWindow::new(10, 10);
        window.queue(InputEvent::KeyDown(Key::Char('a')));
        window.queue(InputEvent::MouseDown(MouseButton::Left));
        window.queue(InputEvent::MouseMove {
            buttons: vec![MouseButton::Left],
            delta: Pos([3, -2]),
        });
        window.queue(InputEvent::MouseScroll { axis: 1, amount: 2.5 });
        assert_eq!(window.detect_events().len(), 4);
        assert!(window.pressed(Key::Char('a')));
        assert!(window.down(MouseButton::Left));
        assert_eq!(window.mouse_coord(), Pos([3, -2]));
        assert_eq!(window.mouse_delta(), Pos([3, -2]));
        assert_eq!(window.scroll_y(), 2.5);

        window.queue(InputEvent::KeyUp(Key::Char('a')));
        window.detect_events();
        assert!(!window.pressed(Key::Char('a')));
        assert_eq!(window.mouse_delta(), Pos::ZERO);
        assert_eq!(window.scroll_y(), 0.0);
        assert!(window.detect_events().is_empty());
    }

    #[test]
    fn test_unbalanced_pop_is_harmless() {
        let mut window = HeadlessWindow::new(10, 10);
        window.pop_view();
        window.push_view(ViewOffset::for_dims(3));
        assert!(matches!(window.current_view(), Some(ViewOffset::View3D(_))));
        window.pop_view();
        assert_eq!(window.view_depth(), 0);
    }
}
