use anyhow::{anyhow, Result};
use bevy::prelude::*;
use rand::Rng;
use serde::Serialize;

use super::{
    animation::{Animation, AnimationLibrary, Playback, SpriteCell},
    map::{NodeGroup, NodeId},
    modes::{Mode, ModeName, ModeStack},
    util::{overshot, Board, FreightSettings, Settings, SpeedSettings},
    Direction, GameSet,
};

mod group;
mod personality;

pub use group::GhostGroup;
pub use personality::{ChaseRule, Corner, GhostPersonality, Prey, Profile};

/// Settings a ghost reads every tick.
#[derive(Debug, Clone, Copy)]
struct Tuning {
    board: Board,
    speed: SpeedSettings,
    freight: FreightSettings,
    base_points: u32,
}

#[derive(Debug, Clone)]
pub struct Ghost {
    pub personality: GhostPersonality,
    pub position: Vec2,
    /// Node the ghost left, or is parked on
    pub node: NodeId,
    /// Node the ghost is heading for. Equal to `node` while stopped.
    pub target: NodeId,
    pub direction: Direction,
    pub speed: f32,
    pub mode: Mode,
    pub mode_timer: f32,
    pub mode_stack: ModeStack,
    pub goal: Vec2,
    pub start_node: NodeId,
    /// Where the ghost heads in SPAWN mode
    pub spawn_node: NodeId,
    pub guide: Vec<Direction>,
    pub pellets_for_release: u32,
    pub released: bool,
    pub banned_directions: Vec<Direction>,
    pub points: u32,
    pub color: Color,
    pub collide_radius: f32,
    pub animations: AnimationLibrary,
    pub image: Option<SpriteCell>,
    pub visible: bool,
    tuning: Tuning,
}

impl Ghost {
    /// Places the ghost on its start node. Fails when the graph has no start
    /// marker for this ghost or no spawn node in the home.
    pub fn new(personality: GhostPersonality, nodes: &NodeGroup, settings: &Settings) -> Result<Self> {
        let profile = personality.profile();

        let start_node = nodes
            .find(|node| personality.is_start(node))
            .ok_or_else(|| anyhow!("No node is flagged as {}'s start node", profile.name))?;
        let spawn_node = if profile.spawns_at_start { start_node } else { nodes.spawn_node()? };

        let mut mode_stack = ModeStack::default_schedule();
        let mode = mode_stack.pop();

        let mut ghost = Self {
            personality,
            position: nodes.position(start_node),
            node: start_node,
            target: start_node,
            direction: Direction::Stop,
            speed: settings.speed.base,
            mode,
            mode_timer: 0.0,
            mode_stack,
            goal: Vec2::ZERO,
            start_node,
            spawn_node,
            guide: profile.guide.to_vec(),
            pellets_for_release: profile.pellets_for_release,
            released: profile.pellets_for_release == 0,
            banned_directions: profile.banned.to_vec(),
            points: settings.scoring.ghost_base_points,
            color: profile.color,
            collide_radius: settings.ghost.collide_radius,
            animations: AnimationLibrary::default(),
            image: None,
            visible: true,
            tuning: Tuning {
                board: settings.board,
                speed: settings.speed,
                freight: settings.freight,
                base_points: settings.scoring.ghost_base_points,
            },
        };
        ghost.define_animations(profile.sprite_row);
        ghost.reset(nodes);

        info!("{} is here!", profile.name);

        Ok(ghost)
    }

    pub fn name(&self) -> &'static str {
        self.personality.profile().name
    }

    /// Back to the start node with a fresh schedule, as at the start of a level.
    pub fn reset(&mut self, nodes: &NodeGroup) {
        let profile = self.personality.profile();

        self.node = self.start_node;
        self.target = self.start_node;
        self.set_position(nodes);
        self.direction = Direction::Stop;
        self.speed = self.tuning.speed.base;
        self.mode_stack = ModeStack::default_schedule();
        self.mode = self.mode_stack.pop();
        self.mode_timer = 0.0;
        self.goal = Vec2::ZERO;
        self.points = self.tuning.base_points;
        self.pellets_for_release = profile.pellets_for_release;
        self.released = profile.pellets_for_release == 0;
        self.banned_directions = profile.banned.to_vec();
        self.visible = true;

        self.animations.select(profile.initial_animation);
        self.image = self.animations.advance(0.0);
    }

    /// One simulation step. `blinky` is Blinky's position, Inky steers off it.
    pub fn update<R: Rng + ?Sized>(&mut self, dt: f32, nodes: &NodeGroup, prey: Prey, blinky: Vec2, rng: &mut R) {
        self.visible = true;
        self.portal_slowdown(nodes);
        self.position += self.direction.vector() * self.speed * self.mode.speed_mult * dt;
        self.mode_update(dt);
        self.update_goal(nodes, prey, blinky, rng);
        self.move_by_self(nodes);
        self.update_animation(dt);
    }

    pub fn portal_slowdown(&mut self, nodes: &NodeGroup) {
        self.speed = if nodes.get(self.node).is_portal() || nodes.get(self.target).is_portal() {
            self.tuning.speed.portal
        } else {
            self.tuning.speed.base
        };
    }

    /// Advances the mode clock and moves on to the next scheduled mode when the
    /// current one runs out.
    pub fn mode_update(&mut self, dt: f32) {
        self.mode_timer += dt;
        if let Some(time) = self.mode.time {
            if self.mode_timer >= time {
                self.reverse_direction();
                self.next_mode();
            }
        }
    }

    fn next_mode(&mut self) {
        let previous = self.mode.name;
        self.mode = self.mode_stack.pop();
        self.mode_timer = 0.0;
        debug!("{}: {} -> {}", self.name(), previous, self.mode.name);
    }

    /// Power pellet eaten. Whatever was running is parked on the stack with the
    /// time it had left; a second pellet only restarts the frighten clock.
    pub fn freight_mode(&mut self) {
        if self.mode.is(ModeName::Spawn) || self.mode.is(ModeName::Guide) {
            return;
        }

        if !self.mode.is(ModeName::Freight) {
            let remaining = self.mode.time.map(|time| time - self.mode_timer);
            self.mode_stack.push(Mode::new(self.mode.name, remaining));
        }

        self.mode = Mode::freight(self.tuning.freight.duration, self.tuning.speed.freight_mult);
        self.mode_timer = 0.0;
        self.reverse_direction();
    }

    /// Heads for the spawn node, then follows the guide path out of the home.
    /// Guide steps are pushed in listed order, so the last one listed runs first.
    pub fn spawn_mode(&mut self, speed_mult: f32) {
        self.mode = Mode::spawn(speed_mult);
        self.mode_timer = 0.0;
        for direction in &self.guide {
            self.mode_stack.push(Mode::guide(*direction, self.tuning.speed.guide_mult));
        }
        info!("{} heads for home", self.name());
    }

    fn update_goal<R: Rng + ?Sized>(&mut self, nodes: &NodeGroup, prey: Prey, blinky: Vec2, rng: &mut R) {
        let board = self.tuning.board;
        match self.mode.name {
            ModeName::Chase => self.goal = self.personality.chase_goal(&board, self.position, prey, blinky),
            ModeName::Scatter => self.goal = self.personality.scatter_goal(&board),
            ModeName::Freight => {
                let x = rng.gen_range(0..=board.width() as i32);
                let y = rng.gen_range(0..=board.height() as i32);
                self.goal = Vec2::new(x as f32, y as f32);
            }
            ModeName::Spawn => self.goal = nodes.position(self.spawn_node),
            // Direction comes from the mode itself
            ModeName::Guide => {}
        }
    }

    /// Directions the ghost may take from its current node.
    pub fn valid_directions(&self, nodes: &NodeGroup) -> Vec<Direction> {
        let node = nodes.get(self.node);
        let reverse = self.direction.opposite();

        let mut valid: Vec<Direction> = node
            .open_directions()
            .filter(|d| *d != reverse)
            .filter(|d| {
                if self.mode.is(ModeName::Spawn) {
                    true
                } else if node.home_entrance {
                    *d != Direction::Down
                } else {
                    !self.banned_directions.contains(d)
                }
            })
            .collect();

        // Dead end
        if valid.is_empty() {
            valid.push(reverse);
        }
        valid
    }

    /// The candidate whose next tile lies closest to the goal. Ties go to the
    /// earlier candidate.
    pub fn closest_direction(&self, nodes: &NodeGroup, valid: &[Direction]) -> Direction {
        let origin = nodes.position(self.node);
        let tile = self.tuning.board.tile_width;

        let mut best = Direction::Stop;
        let mut best_distance = f32::INFINITY;
        for direction in valid {
            let distance = (origin + direction.vector() * tile - self.goal).length_squared();
            if distance < best_distance {
                best_distance = distance;
                best = *direction;
            }
        }
        best
    }

    /// Node arrival: pick the next direction, and step through SPAWN/GUIDE.
    pub fn move_by_self(&mut self, nodes: &NodeGroup) {
        if !self.overshot_target(nodes) {
            return;
        }

        self.node = self.target;
        self.portal(nodes);
        let valid = self.valid_directions(nodes);
        self.direction = self.closest_direction(nodes, &valid);
        self.retarget(nodes);
        self.set_position(nodes);

        match self.mode.name {
            ModeName::Spawn => {
                if self.position == self.goal {
                    self.next_mode();
                    self.follow_guide(nodes);
                }
            }
            ModeName::Guide => {
                self.next_mode();
                self.follow_guide(nodes);
            }
            _ => {}
        }
    }

    fn follow_guide(&mut self, nodes: &NodeGroup) {
        if !self.mode.is(ModeName::Guide) {
            return;
        }

        self.direction = self.mode.direction;
        self.target = match nodes.get(self.node).neighbor(self.direction) {
            Some(target) => target,
            None => panic!(
                "{} cannot follow its guide: no {:?} neighbour at {:?}",
                self.name(),
                self.direction,
                nodes.position(self.node)
            ),
        };
        self.set_position(nodes);
    }

    /// Targets the neighbour in the current direction. A dead end with nowhere
    /// to backtrack to leaves the ghost parked.
    fn retarget(&mut self, nodes: &NodeGroup) {
        match nodes.get(self.node).neighbor(self.direction) {
            Some(target) => self.target = target,
            None => {
                self.direction = Direction::Stop;
                self.target = self.node;
            }
        }
    }

    pub fn overshot_target(&self, nodes: &NodeGroup) -> bool {
        overshot(nodes.position(self.node), nodes.position(self.target), self.position)
    }

    fn portal(&mut self, nodes: &NodeGroup) {
        if let Some(other) = nodes.get(self.node).portal {
            self.node = other;
            self.set_position(nodes);
        }
    }

    fn set_position(&mut self, nodes: &NodeGroup) {
        self.position = nodes.position(self.node);
    }

    /// Turns around on the spot. GUIDE and SPAWN keep their direction.
    pub fn reverse_direction(&mut self) {
        if !self.mode.allows_reversal() || self.direction == Direction::Stop {
            return;
        }
        self.direction = self.direction.opposite();
        std::mem::swap(&mut self.node, &mut self.target);
    }

    fn define_animations(&mut self, row: u32) {
        for (col, direction) in [(0, "up"), (2, "down"), (4, "left"), (6, "right")] {
            let frames = vec![SpriteCell::new(col, row), SpriteCell::new(col + 1, row)];
            self.animations.insert(direction, Animation::new(Playback::Loop, 10.0, frames));
        }

        self.animations.insert(
            "freight",
            Animation::new(Playback::Loop, 10.0, vec![SpriteCell::new(0, 6), SpriteCell::new(1, 6)]),
        );
        self.animations.insert(
            "flash",
            Animation::new(
                Playback::Loop,
                10.0,
                vec![SpriteCell::new(0, 6), SpriteCell::new(2, 6), SpriteCell::new(1, 6), SpriteCell::new(3, 6)],
            ),
        );

        for (col, name) in [(4, "spawnup"), (5, "spawndown"), (6, "spawnleft"), (7, "spawnright")] {
            self.animations.insert(name, Animation::new(Playback::Static, 10.0, vec![SpriteCell::new(col, 6)]));
        }
    }

    fn update_animation(&mut self, dt: f32) {
        let selected = match (self.mode.name, self.direction) {
            (_, Direction::Stop) if !self.mode.is(ModeName::Freight) => None,
            (ModeName::Spawn, Direction::Up) => Some("spawnup"),
            (ModeName::Spawn, Direction::Down) => Some("spawndown"),
            (ModeName::Spawn, Direction::Left) => Some("spawnleft"),
            (ModeName::Spawn, _) => Some("spawnright"),
            (ModeName::Chase | ModeName::Scatter, direction) => Some(direction.name()),
            (ModeName::Freight, _) => {
                let flash_at = self.mode.time.unwrap_or(0.0) * self.tuning.freight.flash_fraction;
                if self.mode_timer >= flash_at { Some("flash") } else { Some("freight") }
            }
            (ModeName::Guide, _) => None,
        };

        if let Some(name) = selected {
            self.animations.select(name);
        }
        self.image = self.animations.advance(dt);
    }

    pub fn snapshot(&self) -> GhostSnapshot {
        GhostSnapshot {
            name: self.name(),
            mode: self.mode.name,
            mode_timer: self.mode_timer,
            position: [self.position.x, self.position.y],
            goal: [self.goal.x, self.goal.y],
            node: self.node,
            direction: self.direction,
            released: self.released,
            points: self.points,
            animation: self.animations.active(),
        }
    }
}

/// Serialisable view of a ghost for debug dumps.
#[derive(Debug, Clone, Serialize)]
pub struct GhostSnapshot {
    pub name: &'static str,
    pub mode: ModeName,
    pub mode_timer: f32,
    pub position: [f32; 2],
    pub goal: [f32; 2],
    pub node: NodeId,
    pub direction: Direction,
    pub released: bool,
    pub points: u32,
    pub animation: Option<&'static str>,
}

// Ghost Core
pub struct GhostPlugin;

impl Plugin for GhostPlugin {
    fn build(&self, app: &mut App) {
        info!("Here Come the Ghost Gang!");

        app
            .add_system(GhostGroup::tick.in_set(GameSet::Movement).after(crate::game::player::Player::tick))

        ;
    }
}
