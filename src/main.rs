use std::time::Duration;

use anyhow::Result;
use bevy::{app::ScheduleRunnerSettings, log::LogPlugin, prelude::*};

use pacman::{
    debug::DebugPlugin,
    game::{enemy::GhostPlugin, player::Player, util::{drop_settings, get_settings}, GameController, Level},
};

/// Simulation rate of the headless demo.
const TICKS_PER_SECOND: f64 = 60.0;

fn main() -> Result<()> {
    if std::env::args().any(|arg| arg == "--drop-settings") {
        return drop_settings();
    }

    let mut app = App::new();

    #[cfg(debug_assertions)]
    let log = LogPlugin {
        level: bevy::log::Level::TRACE,
        filter: "debug,pacman=debug".into(),
    };

    #[cfg(not(debug_assertions))]
    let log = LogPlugin {
        level: bevy::log::Level::INFO,
        filter: "info".into(),
    };

    app
        .insert_resource(ScheduleRunnerSettings::run_loop(Duration::from_secs_f64(1.0 / TICKS_PER_SECOND)))
        .add_plugins(MinimalPlugins)
        .add_plugin(log);

    let settings = get_settings()?;
    Level::load(&settings)?.insert_into(&mut app);
    app.insert_resource(settings);

    app
        .add_plugin(Player)
        .add_plugin(GhostPlugin)
        .add_plugin(GameController)

        .add_plugin(DebugPlugin)
    .run();

    Ok(())
}
