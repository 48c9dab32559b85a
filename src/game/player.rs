use anyhow::{anyhow, Result};
use bevy::prelude::*;

use super::{
    animation::{Animation, AnimationLibrary, Playback, SpriteCell},
    enemy::{GhostGroup, Prey},
    map::{NodeGroup, NodeId},
    pellets::{Fruit, Pellet},
    util::{collides, overshot, Settings},
    Direction, GameSet,
};

pub struct Player;

impl Plugin for Player {
    fn build(&self, app: &mut App) {
        app
            .init_resource::<Steering>()
            .add_system(Player::steer.in_set(GameSet::Input))
            .add_system(Player::tick.in_set(GameSet::Movement))

        ;

        info!("Player Ready!");
    }
}

/// Direction Pac-Man wants to take this frame.
#[derive(Debug, Default, Resource)]
pub struct Steering(pub Option<Direction>);

impl Player {
    /// Keyboard when bevy has input wired up, the autopilot otherwise.
    pub fn steer(
        keyboard: Option<Res<Input<KeyCode>>>,
        nodes: Res<NodeGroup>,
        pacman: Res<Pacman>,
        mut steering: ResMut<Steering>,
    ) {
        steering.0 = match keyboard {
            Some(keyboard) => Self::read_keys(&keyboard),
            None => pacman.autopilot(&nodes),
        };
    }

    fn read_keys(keyboard: &Input<KeyCode>) -> Option<Direction> {
        if keyboard.pressed(KeyCode::W) || keyboard.pressed(KeyCode::Up) {
            return Some(Direction::Up);
        }
        if keyboard.pressed(KeyCode::S) || keyboard.pressed(KeyCode::Down) {
            return Some(Direction::Down);
        }
        if keyboard.pressed(KeyCode::A) || keyboard.pressed(KeyCode::Left) {
            return Some(Direction::Left);
        }
        if keyboard.pressed(KeyCode::D) || keyboard.pressed(KeyCode::Right) {
            return Some(Direction::Right);
        }
        None
    }

    pub fn tick(time: Res<Time>, nodes: Res<NodeGroup>, steering: Res<Steering>, mut pacman: ResMut<Pacman>) {
        if pacman.dying { return }
        pacman.update(time.delta_seconds(), &nodes, steering.0);
    }
}

#[derive(Debug, Clone, Resource)]
pub struct Pacman {
    pub position: Vec2,
    pub node: NodeId,
    pub target: NodeId,
    pub direction: Direction,
    /// Last direction actually travelled, kept while stopped
    pub facing: Direction,
    pub speed: f32,
    pub lives: u32,
    pub dying: bool,
    pub collide_radius: f32,
    pub start_node: NodeId,
    start_target: NodeId,
    start_position: Vec2,
    pub animations: AnimationLibrary,
    pub image: Option<SpriteCell>,
    pub visible: bool,
}

impl Pacman {
    /// Pac-Man starts half way between his start node and its left neighbour,
    /// so the layout must provide both.
    pub fn new(nodes: &NodeGroup, settings: &Settings) -> Result<Self> {
        let start_node = nodes
            .find(|node| node.pacman_start_node)
            .ok_or_else(|| anyhow!("No node is flagged as Pac-Man's start node"))?;
        let start_target = nodes
            .get(start_node)
            .neighbor(Direction::Left)
            .ok_or_else(|| anyhow!("Pac-Man's start node at {:?} has no left neighbour", nodes.position(start_node)))?;

        let mut start_position = nodes.position(start_node);
        start_position.x -= (nodes.position(start_node).x - nodes.position(start_target).x) / 2.0;

        let mut pacman = Self {
            position: start_position,
            node: start_node,
            target: start_target,
            direction: Direction::Left,
            facing: Direction::Left,
            speed: settings.speed.base,
            lives: settings.pacman.lives,
            dying: false,
            collide_radius: settings.pacman.collide_radius,
            start_node,
            start_target,
            start_position,
            animations: AnimationLibrary::default(),
            image: None,
            visible: true,
        };
        pacman.define_animations();
        pacman.reset();

        info!("Pac-Man is ready with {} lives", pacman.lives);

        Ok(pacman)
    }

    pub fn start_position(&self) -> Vec2 {
        self.start_position
    }

    /// Back on the start segment heading left. Lives are kept.
    pub fn reset(&mut self) {
        self.node = self.start_node;
        self.target = self.start_target;
        self.direction = Direction::Left;
        self.facing = Direction::Left;
        self.position = self.start_position;
        self.dying = false;
        self.visible = true;

        if let Some(death) = self.animations.get_mut("death") {
            death.reset();
        }
        self.animations.select("idle");
        self.image = self.animations.advance(0.0);
    }

    pub fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
    }

    pub fn die(&mut self) {
        self.lose_life();
        self.dying = true;
        if let Some(death) = self.animations.get_mut("death") {
            death.reset();
        }
        self.animations.select("death");
        info!("Pac-Man died, {} lives left", self.lives);
    }

    /// Plays the death animation. True once it has run through.
    pub fn advance_death(&mut self, dt: f32) -> bool {
        self.update_animation(dt);
        self.animations.get_mut("death").map_or(true, |death| death.finished)
    }

    /// What the ghosts steer by.
    pub fn prey(&self) -> Prey {
        Prey { position: self.position, direction: self.direction }
    }

    pub fn update(&mut self, dt: f32, nodes: &NodeGroup, desired: Option<Direction>) {
        self.visible = true;
        self.position += self.direction.vector() * self.speed * dt;
        self.update_animation(dt);

        match desired {
            Some(direction) => self.move_by_key(nodes, direction),
            None => self.move_by_self(nodes),
        }

        if self.direction != Direction::Stop {
            self.facing = self.direction;
        }
    }

    /// Pac-Man never walks through the home door.
    fn neighbor(&self, nodes: &NodeGroup, direction: Direction) -> Option<NodeId> {
        let node = nodes.get(self.node);
        if node.home_entrance && direction == Direction::Down {
            return None;
        }
        node.neighbor(direction)
    }

    pub fn move_by_key(&mut self, nodes: &NodeGroup, direction: Direction) {
        if self.direction == Direction::Stop {
            if let Some(target) = self.neighbor(nodes, direction) {
                self.target = target;
                self.direction = direction;
            }
            return;
        }

        if direction == self.direction.opposite() {
            self.reverse_direction();
        }

        if !self.overshot_target(nodes) {
            return;
        }

        self.node = self.target;
        self.portal(nodes);

        match self.neighbor(nodes, direction) {
            Some(target) if !nodes.get(self.node).home_entrance => {
                self.target = target;
                if self.direction != direction {
                    self.set_position(nodes);
                    self.direction = direction;
                }
            }
            // No turning on the home entrance either
            _ => self.keep_going(nodes),
        }
    }

    pub fn move_by_self(&mut self, nodes: &NodeGroup) {
        if self.direction == Direction::Stop || !self.overshot_target(nodes) {
            return;
        }

        self.node = self.target;
        self.portal(nodes);
        self.keep_going(nodes);
    }

    /// Carries on in the current direction, or stops on the node at a wall.
    fn keep_going(&mut self, nodes: &NodeGroup) {
        match self.neighbor(nodes, self.direction) {
            Some(target) => self.target = target,
            None => {
                self.target = self.node;
                self.set_position(nodes);
                self.direction = Direction::Stop;
            }
        }
    }

    pub fn reverse_direction(&mut self) {
        self.direction = self.direction.opposite();
        std::mem::swap(&mut self.node, &mut self.target);
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

    /// Demo steering: only decides when stopped, and avoids doubling back
    /// unless the node is a dead end.
    pub fn autopilot(&self, nodes: &NodeGroup) -> Option<Direction> {
        if self.direction != Direction::Stop {
            return None;
        }

        let back = self.facing.opposite();
        let open: Vec<Direction> = Direction::ALL.into_iter().filter(|d| self.neighbor(nodes, *d).is_some()).collect();
        open.iter().copied().find(|d| *d != back).or_else(|| open.first().copied())
    }

    /// Index of the first pellet Pac-Man touches.
    pub fn eat_pellets(&self, pellets: &[Pellet]) -> Option<usize> {
        pellets
            .iter()
            .position(|pellet| collides(self.position, pellet.position, self.collide_radius, pellet.radius))
    }

    /// Indices of every ghost Pac-Man touches, in update order.
    pub fn eat_ghosts(&self, ghosts: &GhostGroup) -> Vec<usize> {
        ghosts
            .ghosts()
            .iter()
            .enumerate()
            .filter(|(_, ghost)| collides(self.position, ghost.position, self.collide_radius, ghost.collide_radius))
            .map(|(index, _)| index)
            .collect()
    }

    pub fn eat_fruit(&self, fruit: &Fruit) -> bool {
        collides(self.position, fruit.position, self.collide_radius, fruit.collide_radius)
    }

    fn define_animations(&mut self) {
        let mouth = |open: [(u32, u32); 2]| {
            let [small, wide] = open.map(|(col, row)| SpriteCell::new(col, row));
            Animation::new(Playback::Loop, 30.0, vec![SpriteCell::new(4, 0), small, wide, small])
        };
        self.animations.insert("left", mouth([(0, 0), (0, 1)]));
        self.animations.insert("right", mouth([(1, 0), (1, 1)]));
        self.animations.insert("down", mouth([(2, 1), (2, 0)]));
        self.animations.insert("up", mouth([(3, 1), (3, 0)]));

        let death = (0..9).chain(std::iter::once(10)).map(|col| SpriteCell::new(col, 7)).collect();
        self.animations.insert("death", Animation::new(Playback::Once, 10.0, death));
        self.animations.insert("idle", Animation::new(Playback::Static, 10.0, vec![SpriteCell::new(4, 0)]));
    }

    fn update_animation(&mut self, dt: f32) {
        let name = if self.dying {
            "death"
        } else {
            match self.direction {
                Direction::Stop => "idle",
                direction => direction.name(),
            }
        };
        self.animations.select(name);
        self.image = self.animations.advance(dt);
    }
}
