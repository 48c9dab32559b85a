use anyhow::{Context, Result};
use bevy::{app::AppExit, prelude::*};
use serde::Serialize;

pub mod animation;
pub mod enemy;
pub mod map;
pub mod modes;
pub mod pellets;
pub mod player;
pub mod util;

use enemy::GhostGroup;
use map::{NodeGroup, TileMap};
use pellets::{Fruit, PelletGroup};
use player::Pacman;
use util::Settings;

/// Pellets eaten at which a fruit shows up
pub const FRUIT_PELLETS: [u32; 2] = [50, 140];

pub const EXTRA_LIFE_SCORE_THRESHOLD: u32 = 10000;

/// Cardinal directions in screen space, y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    Stop,
}

impl Direction {
    /// Neighbour enumeration order. Ties in goal seeking resolve in this order.
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    pub fn opposite(&self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Stop => Direction::Stop,
        }
    }

    pub fn vector(&self) -> Vec2 {
        match self {
            Direction::Up => Vec2::new(0.0, -1.0),
            Direction::Down => Vec2::new(0.0, 1.0),
            Direction::Left => Vec2::new(-1.0, 0.0),
            Direction::Right => Vec2::new(1.0, 0.0),
            Direction::Stop => Vec2::ZERO,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            Direction::Up => Some(0),
            Direction::Down => Some(1),
            Direction::Left => Some(2),
            Direction::Right => Some(3),
            Direction::Stop => None,
        }
    }

    /// Suffix used by the directional animations.
    pub fn name(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Stop => "stop",
        }
    }
}

/// Everything a level needs, loaded and validated before the first frame.
#[derive(Debug)]
pub struct Level {
    pub nodes: NodeGroup,
    pub pellets: PelletGroup,
    pub ghosts: GhostGroup,
    pub pacman: Pacman,
}

impl Level {
    pub fn load(settings: &Settings) -> Result<Self> {
        let map = TileMap::get_map(settings.demo.map.as_deref())?;
        TileMap::check_map(&map)?;

        let nodes = NodeGroup::from_layout(&map, &settings.board).context("Failed to build the node graph")?;
        let pellets = PelletGroup::from_layout(&map, settings);
        let ghosts = GhostGroup::new(&nodes, settings).context("Failed to place the ghosts")?;
        let pacman = Pacman::new(&nodes, settings).context("Failed to place Pac-Man")?;

        info!("Level loaded: {} nodes, {} pellets", nodes.len(), pellets.len());

        Ok(Self { nodes, pellets, ghosts, pacman })
    }

    pub fn insert_into(self, app: &mut App) {
        app.insert_resource(self.nodes)
            .insert_resource(self.pellets)
            .insert_resource(self.ghosts)
            .insert_resource(self.pacman);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, SystemSet)]
pub enum GameSet {
    Input,
    Movement,
    Collision,
}

#[derive(Debug, Default, Resource)]
pub struct GameData {
    pub score: u32,
    pub level: u32,
    pub elapsed: f32,
    pub extra_life_given: bool,
    pub fruit: Option<Fruit>,
}

impl GameData {
    /// Frozen while Pac-Man plays his death animation.
    pub fn running(pacman: &Pacman) -> bool {
        !pacman.dying
    }
}

#[derive(Debug)]
pub struct GameController;

impl Plugin for GameController {
    fn build(&self, app: &mut App) {
        app
            .init_resource::<GameData>()
            .configure_sets((GameSet::Input, GameSet::Movement, GameSet::Collision).chain())
            .add_systems(
                (
                    Self::check_pellets,
                    Self::check_ghosts,
                    Self::check_fruit,
                    Self::level_checker,
                    Self::death_sequence,
                    Self::stop_after,
                )
                    .chain()
                    .in_set(GameSet::Collision),
            )

        ;
    }
}

impl GameController {
    pub fn check_pellets(
        mut pacman: ResMut<Pacman>,
        settings: Res<Settings>,
        mut pellets: ResMut<PelletGroup>,
        mut ghosts: ResMut<GhostGroup>,
        mut game: ResMut<GameData>,
    ) {
        if !GameData::running(&pacman) { return }

        let Some(index) = pacman.eat_pellets(pellets.pellets()) else { return };
        let pellet = pellets.eat(index);
        game.score += pellet.points;
        ghosts.release(pellets.num_eaten);

        if FRUIT_PELLETS.contains(&pellets.num_eaten) && game.fruit.is_none() {
            let radius = settings.pacman.collide_radius;
            game.fruit = Some(Fruit::new(pacman.start_position(), settings.scoring.fruit, radius));
            debug!("Fruit appeared");
        }

        if pellet.power {
            ghosts.reset_points();
            ghosts.freight_mode();
        }

        if game.score >= EXTRA_LIFE_SCORE_THRESHOLD && !game.extra_life_given {
            game.extra_life_given = true;
            pacman.lives += 1;
            info!("Extra life!");
        }
    }

    pub fn check_ghosts(mut pacman: ResMut<Pacman>, mut ghosts: ResMut<GhostGroup>, mut game: ResMut<GameData>) {
        if !GameData::running(&pacman) { return }

        let touching = pacman.eat_ghosts(&ghosts);
        if touching.is_empty() { return }

        let contact = ghosts.resolve_contacts(&touching);
        game.score += contact.points;
        if contact.fatal {
            pacman.die();
            ghosts.hide();
        }
    }

    pub fn check_fruit(time: Res<Time>, pacman: Res<Pacman>, mut game: ResMut<GameData>) {
        let Some(fruit) = game.fruit.as_mut() else { return };
        fruit.update(time.delta_seconds());
        let eaten = pacman.eat_fruit(fruit);
        let (points, destroy) = (fruit.points, fruit.destroy);

        if eaten {
            game.score += points;
            game.fruit = None;
            info!("Fruit eaten for {} points", points);
        } else if destroy {
            game.fruit = None;
        }
    }

    /// Starts the next level once every pellet is gone.
    pub fn level_checker(
        settings: Res<Settings>,
        nodes: Res<NodeGroup>,
        mut pellets: ResMut<PelletGroup>,
        mut pacman: ResMut<Pacman>,
        mut ghosts: ResMut<GhostGroup>,
        mut game: ResMut<GameData>,
    ) {
        if !pellets.is_empty() { return }

        game.level += 1;
        info!("All pellets eaten! Starting level {}", game.level);

        match TileMap::get_map(settings.demo.map.as_deref()) {
            Ok(map) => *pellets = PelletGroup::from_layout(&map, &settings),
            Err(e) => error!("Could not reload pellets: {e:#}"),
        }
        game.fruit = None;
        pacman.reset();
        ghosts.reset(&nodes);
    }

    pub fn death_sequence(
        time: Res<Time>,
        nodes: Res<NodeGroup>,
        mut pacman: ResMut<Pacman>,
        mut ghosts: ResMut<GhostGroup>,
        game: Res<GameData>,
        mut exit: EventWriter<AppExit>,
    ) {
        if !pacman.dying { return }

        if pacman.advance_death(time.delta_seconds()) {
            if pacman.lives == 0 {
                info!("Game over! Final score: {}", game.score);
                exit.send(AppExit);
            } else {
                pacman.reset();
                ghosts.reset(&nodes);
                ghosts.show();
            }
        }
    }

    pub fn stop_after(
        time: Res<Time>,
        settings: Res<Settings>,
        mut game: ResMut<GameData>,
        mut exit: EventWriter<AppExit>,
    ) {
        game.elapsed += time.delta_seconds();
        if game.elapsed >= settings.demo.seconds {
            info!("Demo finished after {:.1}s, score {}", game.elapsed, game.score);
            exit.send(AppExit);
        }
    }
}
