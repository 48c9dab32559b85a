use bevy::utils::HashMap;
use serde::Serialize;

/// Cell of a sprite sheet. The renderer owns the sheet and slices it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SpriteCell {
    pub col: u32,
    pub row: u32,
}

impl SpriteCell {
    pub const fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    Loop,
    /// Plays through once and holds the last frame
    Once,
    Static,
}

#[derive(Debug, Clone)]
pub struct Animation {
    pub playback: Playback,
    /// Frames per second
    pub speed: f32,
    frames: Vec<SpriteCell>,
    current_frame: usize,
    elapsed: f32,
    pub finished: bool,
}

impl Animation {
    pub fn new(playback: Playback, speed: f32, frames: Vec<SpriteCell>) -> Self {
        Self { playback, speed, frames, current_frame: 0, elapsed: 0.0, finished: false }
    }

    pub fn reset(&mut self) {
        self.current_frame = 0;
        self.elapsed = 0.0;
        self.finished = false;
    }

    pub fn frame(&self) -> Option<SpriteCell> {
        self.frames.get(self.current_frame).copied()
    }

    pub fn frame_index(&self) -> usize {
        self.current_frame
    }

    /// Advances the cycle by `dt` and hands back the frame to draw.
    pub fn advance(&mut self, dt: f32) -> Option<SpriteCell> {
        match self.playback {
            Playback::Loop => {
                self.next_frame(dt);
                if self.current_frame >= self.frames.len() {
                    self.current_frame = 0;
                }
            }
            Playback::Once => {
                if !self.finished {
                    self.next_frame(dt);
                    if self.current_frame >= self.frames.len() {
                        self.current_frame = self.frames.len().saturating_sub(1);
                        self.finished = true;
                    }
                }
            }
            Playback::Static => self.current_frame = 0,
        }
        self.frame()
    }

    fn next_frame(&mut self, dt: f32) {
        self.elapsed += dt;
        if self.elapsed >= 1.0 / self.speed {
            self.current_frame += 1;
            self.elapsed = 0.0;
        }
    }
}

/// Named animations of one entity plus which one is playing.
#[derive(Debug, Clone, Default)]
pub struct AnimationLibrary {
    animations: HashMap<&'static str, Animation>,
    active: Option<&'static str>,
}

impl AnimationLibrary {
    pub fn insert(&mut self, name: &'static str, animation: Animation) {
        self.animations.insert(name, animation);
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Animation> {
        self.animations.get_mut(name)
    }

    pub fn active(&self) -> Option<&'static str> {
        self.active
    }

    pub fn select(&mut self, name: &'static str) {
        if self.animations.contains_key(name) {
            self.active = Some(name);
        }
    }

    pub fn advance(&mut self, dt: f32) -> Option<SpriteCell> {
        let name = self.active?;
        self.animations.get_mut(name)?.advance(dt)
    }
}
