//! Ghost behaviour core of a Pac-Man clone: a node graph maze, the four ghost
//! personalities with their mode schedule, and Pac-Man as the prey they hunt.

pub mod debug;
pub mod game;
