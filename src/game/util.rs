use std::{fs, io::Write, path::Path};

use anyhow::{Context, Result};
use bevy::prelude::*;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SETTINGS: &str = include_str!("../../assets/settings.toml");

const SETTINGS_PATH: &str = "./settings.toml";

lazy_static! {
    /// The embedded defaults, parsed once. The file ships with the crate and is
    /// covered by tests, so a parse failure here is a build defect.
    pub static ref DEFAULTS: Settings = match toml::from_str(DEFAULT_SETTINGS) {
        Ok(settings) => settings,
        Err(e) => panic!("embedded settings.toml is invalid: {e}"),
    };
}

/// Tile and board dimensions shared by the graph, the entities and the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Board {
    pub tile_width: f32,
    pub tile_height: f32,
    pub cols: u32,
    pub rows: u32,
}

impl Board {
    pub fn width(&self) -> f32 {
        self.cols as f32 * self.tile_width
    }

    pub fn height(&self) -> f32 {
        self.rows as f32 * self.tile_height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SpeedSettings {
    pub base: f32,
    pub portal: f32,
    pub freight_mult: f32,
    pub guide_mult: f32,
    /// SPAWN speed multiplier for a ghost that was eaten
    pub eaten_spawn_mult: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct FreightSettings {
    pub duration: f32,
    /// Share of the frighten period after which the ghost starts flashing
    pub flash_fraction: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Scoring {
    pub ghost_base_points: u32,
    pub pellet: u32,
    pub power_pellet: u32,
    pub fruit: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct PacmanSettings {
    pub lives: u32,
    pub collide_radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct GhostSettings {
    pub collide_radius: f32,
    pub rng_seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DemoSettings {
    pub seconds: f32,
    pub map: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Resource)]
pub struct Settings {
    pub board: Board,
    pub speed: SpeedSettings,
    pub freight: FreightSettings,
    pub scoring: Scoring,
    pub pacman: PacmanSettings,
    pub ghost: GhostSettings,
    pub demo: DemoSettings,
}

impl Default for Settings {
    fn default() -> Self {
        DEFAULTS.clone()
    }
}

/// Reads `./settings.toml` when it exists, the embedded defaults otherwise.
pub fn get_settings() -> Result<Settings> {
    let settings: Settings = if Path::new(SETTINGS_PATH).exists() {
        let raw = fs::read_to_string(SETTINGS_PATH).context("Failed to read settings.toml")?;
        toml::from_str(&raw).context("Failed to parse settings.toml")?
    } else {
        toml::from_str(DEFAULT_SETTINGS)?
    };

    Ok(settings)
}

/// Writes the default settings next to the binary so they can be edited.
pub fn drop_settings() -> Result<()> {
    if !Path::new(SETTINGS_PATH).exists() {
        fs::File::create(SETTINGS_PATH)?.write_all(DEFAULT_SETTINGS.as_bytes())?;
    }

    Ok(())
}

/// True when `position` has reached or passed `target` travelling away from `node`.
pub fn overshot(node: Vec2, target: Vec2, position: Vec2) -> bool {
    let node_to_target = (target - node).length_squared();
    let node_to_self = (position - node).length_squared();
    node_to_self >= node_to_target
}

/// Circle overlap without a square root.
pub fn collides(a: Vec2, b: Vec2, radius_a: f32, radius_b: f32) -> bool {
    let r = radius_a + radius_b;
    (a - b).length_squared() <= r * r
}
