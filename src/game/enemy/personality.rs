use bevy::prelude::*;
use serde::Serialize;

use crate::game::{map::Node, util::Board, Direction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum GhostPersonality {
    Blinky,
    Pinky,
    Inky,
    Clyde,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub fn point(&self, board: &Board) -> Vec2 {
        match self {
            Corner::TopLeft => Vec2::ZERO,
            Corner::TopRight => Vec2::new(board.width(), 0.0),
            Corner::BottomLeft => Vec2::new(0.0, board.height()),
            Corner::BottomRight => Vec2::new(board.width(), board.height()),
        }
    }
}

/// How a ghost picks its CHASE goal. Distances are in tiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChaseRule {
    /// Straight at Pac-Man
    Direct,
    /// A few tiles ahead of Pac-Man
    Ambush { lead: f32 },
    /// Point ahead of Pac-Man mirrored through Blinky and doubled
    Flank { lead: f32 },
    /// Ambush, but back off to the scatter corner once within `radius`
    Shy { lead: f32, radius: f32 },
}

/// Behaviour parameters of one ghost.
#[derive(Debug, Clone, Copy)]
pub struct Profile {
    pub name: &'static str,
    pub scatter: Corner,
    pub chase: ChaseRule,
    /// Forced steps out of the home, pushed in this order
    pub guide: &'static [Direction],
    pub pellets_for_release: u32,
    pub banned: &'static [Direction],
    /// Caged ghosts respawn at their own start node instead of the home spawn node
    pub spawns_at_start: bool,
    pub color: Color,
    pub sprite_row: u32,
    pub initial_animation: &'static str,
}

/// What a ghost needs to know about Pac-Man.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prey {
    pub position: Vec2,
    pub direction: Direction,
}

impl GhostPersonality {
    /// Update order inside the group. Blinky comes first, Inky reads his position.
    pub const ALL: [GhostPersonality; 4] =
        [GhostPersonality::Blinky, GhostPersonality::Pinky, GhostPersonality::Inky, GhostPersonality::Clyde];

    pub fn profile(&self) -> Profile {
        match self {
            GhostPersonality::Blinky => Profile {
                name: "Blinky",
                scatter: Corner::TopRight,
                chase: ChaseRule::Direct,
                guide: &[Direction::Up],
                pellets_for_release: 0,
                banned: &[],
                spawns_at_start: false,
                color: Color::rgb_u8(255, 0, 0),
                sprite_row: 2,
                initial_animation: "left",
            },
            GhostPersonality::Pinky => Profile {
                name: "Pinky",
                scatter: Corner::TopLeft,
                chase: ChaseRule::Ambush { lead: 4.0 },
                guide: &[Direction::Up],
                pellets_for_release: 0,
                banned: &[],
                spawns_at_start: false,
                color: Color::rgb_u8(255, 100, 150),
                sprite_row: 3,
                initial_animation: "up",
            },
            GhostPersonality::Inky => Profile {
                name: "Inky",
                scatter: Corner::BottomRight,
                chase: ChaseRule::Flank { lead: 2.0 },
                guide: &[Direction::Up, Direction::Right],
                pellets_for_release: 30,
                banned: &[Direction::Right],
                spawns_at_start: true,
                color: Color::rgb_u8(100, 255, 255),
                sprite_row: 4,
                initial_animation: "down",
            },
            GhostPersonality::Clyde => Profile {
                name: "Clyde",
                scatter: Corner::BottomLeft,
                chase: ChaseRule::Shy { lead: 4.0, radius: 8.0 },
                guide: &[Direction::Up, Direction::Left],
                pellets_for_release: 60,
                banned: &[Direction::Left],
                spawns_at_start: true,
                color: Color::rgb_u8(230, 190, 40),
                sprite_row: 5,
                initial_animation: "down",
            },
        }
    }

    /// Whether `node` carries this ghost's start marker.
    pub fn is_start(&self, node: &Node) -> bool {
        match self {
            GhostPersonality::Blinky => node.blinky_start_node,
            GhostPersonality::Pinky => node.pinky_start_node,
            GhostPersonality::Inky => node.inky_start_node,
            GhostPersonality::Clyde => node.clyde_start_node,
        }
    }

    pub fn scatter_goal(&self, board: &Board) -> Vec2 {
        self.profile().scatter.point(board)
    }

    /// CHASE goal for a ghost standing at `me`.
    pub fn chase_goal(&self, board: &Board, me: Vec2, prey: Prey, blinky: Vec2) -> Vec2 {
        let tile = board.tile_width;
        let ahead = |tiles: f32| prey.position + prey.direction.vector() * tile * tiles;

        match self.profile().chase {
            ChaseRule::Direct => prey.position,
            ChaseRule::Ambush { lead } => ahead(lead),
            ChaseRule::Flank { lead } => {
                let pivot = ahead(lead);
                blinky + (pivot - blinky) * 2.0
            }
            ChaseRule::Shy { lead, radius } => {
                let reach = tile * radius;
                if (prey.position - me).length_squared() <= reach * reach {
                    self.scatter_goal(board)
                } else {
                    ahead(lead)
                }
            }
        }
    }
}
