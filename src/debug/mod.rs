use bevy::prelude::*;
use serde::Serialize;

use crate::game::{enemy::{GhostGroup, GhostSnapshot}, player::Pacman, GameData, GameSet};

/// Seconds between two state dumps.
const SNAPSHOT_INTERVAL: f32 = 1.0;

pub struct DebugPlugin;

impl Plugin for DebugPlugin {
    fn build(&self, app: &mut App) {
        if cfg!(debug_assertions) {
            info!("Debug Enabled");
            app
                .insert_resource(SnapshotTimer(Timer::from_seconds(SNAPSHOT_INTERVAL, TimerMode::Repeating)))
                .add_system(DebugPlugin::snapshot.after(GameSet::Collision))

            ;
        }
    }
}

#[derive(Debug, Resource)]
pub struct SnapshotTimer(pub Timer);

/// One line of the debug log.
#[derive(Debug, Serialize)]
pub struct Snapshot {
    pub elapsed: f32,
    pub score: u32,
    pub lives: u32,
    pub pacman: [f32; 2],
    pub ghosts: Vec<GhostSnapshot>,
}

impl Snapshot {
    pub fn capture(game: &GameData, pacman: &Pacman, ghosts: &GhostGroup) -> Self {
        Self {
            elapsed: game.elapsed,
            score: game.score,
            lives: pacman.lives,
            pacman: [pacman.position.x, pacman.position.y],
            ghosts: ghosts.snapshot(),
        }
    }
}

impl DebugPlugin {
    pub fn snapshot(
        time: Res<Time>,
        mut timer: ResMut<SnapshotTimer>,
        game: Res<GameData>,
        pacman: Res<Pacman>,
        ghosts: Res<GhostGroup>,
    ) {
        if !timer.0.tick(time.delta()).just_finished() { return }

        match serde_json::to_string(&Snapshot::capture(&game, &pacman, &ghosts)) {
            Ok(json) => debug!("{json}"),
            Err(e) => warn!("Could not serialise snapshot: {e}"),
        }
    }
}
