use bevy::prelude::*;
use serde::Serialize;

use super::{map::grid_lines, util::Settings};

const PELLET_RADIUS: f32 = 4.0;
const POWER_PELLET_RADIUS: f32 = 8.0;

/// Seconds a fruit stays on the board.
pub const FRUIT_LIFESPAN: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pellet {
    pub position: Vec2,
    pub radius: f32,
    pub power: bool,
    pub points: u32,
}

#[derive(Debug, Clone, Default, Resource)]
pub struct PelletGroup {
    pellets: Vec<Pellet>,
    pub num_eaten: u32,
}

impl PelletGroup {
    /// One pellet per `.` cell and one power pellet per `o` cell of the grid.
    pub fn from_layout(layout: &str, settings: &Settings) -> Self {
        let board = &settings.board;
        let mut pellets = Vec::new();

        for (row, line) in grid_lines(layout).enumerate() {
            for (col, c) in line.chars().enumerate() {
                let position = Vec2::new(col as f32 * board.tile_width, row as f32 * board.tile_height);
                match c {
                    '.' => pellets.push(Pellet {
                        position,
                        radius: PELLET_RADIUS,
                        power: false,
                        points: settings.scoring.pellet,
                    }),
                    'o' => pellets.push(Pellet {
                        position,
                        radius: POWER_PELLET_RADIUS,
                        power: true,
                        points: settings.scoring.power_pellet,
                    }),
                    _ => {}
                }
            }
        }

        Self { pellets, num_eaten: 0 }
    }

    pub fn pellets(&self) -> &[Pellet] {
        &self.pellets
    }

    /// Removes the pellet at `index` and counts it.
    pub fn eat(&mut self, index: usize) -> Pellet {
        self.num_eaten += 1;
        self.pellets.swap_remove(index)
    }

    pub fn len(&self) -> usize {
        self.pellets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pellets.is_empty()
    }

    pub fn power_pellets(&self) -> usize {
        self.pellets.iter().filter(|p| p.power).count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fruit {
    pub position: Vec2,
    pub points: u32,
    pub collide_radius: f32,
    pub timer: f32,
    pub destroy: bool,
}

impl Fruit {
    pub fn new(position: Vec2, points: u32, collide_radius: f32) -> Self {
        Self { position, points, collide_radius, timer: 0.0, destroy: false }
    }

    pub fn update(&mut self, dt: f32) {
        self.timer += dt;
        if self.timer >= FRUIT_LIFESPAN {
            self.destroy = true;
        }
    }
}
