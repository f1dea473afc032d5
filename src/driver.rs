//! Fixed-cadence loop that ticks and draws a screen tree
//!
//! Ticks run every `ms_per_tick` and frames every `ms_per_frame`. A slow
//! host gets at most `MAX_SUBSTEPS` catch-up ticks per step; beyond that the
//! clock is resynchronised instead of spiralling.

use std::thread;
use std::time::{Duration, Instant};

use crate::config::WorldConfig;
use crate::consts::MAX_SUBSTEPS;
use crate::screen::{Screen, ScreenTree, Window};

pub struct Driver<W: Window> {
    window: W,
    screens: ScreenTree,
    tick_every: Duration,
    frame_every: Duration,
    next_tick: Instant,
    next_frame: Instant,
    ticks: u64,
    frames: u64,
}

impl<W: Window> Driver<W> {
    pub fn new(window: W, config: &WorldConfig) -> Self {
        Self::starting_at(window, config, Instant::now())
    }

    /// Driver whose first tick and frame are due at `start`
    pub fn starting_at(window: W, config: &WorldConfig, start: Instant) -> Self {
        Self {
            window,
            screens: ScreenTree::new(),
            tick_every: Duration::from_millis(config.ms_per_tick.max(1)),
            frame_every: Duration::from_millis(config.ms_per_frame.max(1)),
            next_tick: start,
            next_frame: start,
            ticks: 0,
            frames: 0,
        }
    }

    pub fn open(&mut self, screen: impl Screen + 'static) {
        self.screens.open(screen);
    }

    pub fn window(&self) -> &W {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut W {
        &mut self.window
    }

    pub fn screens(&self) -> &ScreenTree {
        &self.screens
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Run whatever is due at `now`; returns the next deadline
    pub fn step(&mut self, now: Instant) -> Instant {
        let mut substeps = 0;
        while now >= self.next_tick && substeps < MAX_SUBSTEPS {
            self.tick_once();
            self.next_tick += self.tick_every;
            substeps += 1;
        }
        if now >= self.next_tick {
            log::warn!("simulation fell behind, skipping to now");
            self.next_tick = now + self.tick_every;
        }
        if now >= self.next_frame {
            self.screens.draw(&mut self.window);
            self.frames += 1;
            self.next_frame = now + self.frame_every;
        }
        self.next_tick.min(self.next_frame)
    }

    /// Tick the screens, then let them react to input gathered since the last tick
    fn tick_once(&mut self) {
        let events = self.window.detect_events();
        self.screens.tick(&mut self.window);
        for event in &events {
            self.screens.react(event, &mut self.window);
        }
        self.ticks += 1;
    }

    /// Run in real time until every screen has closed
    pub fn run(&mut self) {
        self.run_until(|_| false);
    }

    /// Run in real time until `done` or every screen has closed
    pub fn run_until(&mut self, mut done: impl FnMut(&Self) -> bool) {
        log::info!(
            "driver running: {:?}/tick, {:?}/frame",
            self.tick_every,
            self.frame_every
        );
        while !self.screens.is_empty() && !done(self) {
            let next = self.step(Instant::now());
            let now = Instant::now();
            if next > now {
                thread::sleep(next - now);
            }
        }
        log::info!("driver stopped after {} ticks, {} frames", self.ticks, self.frames);
    }
}
