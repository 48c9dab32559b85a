use std::{fs, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use bevy::prelude::*;
use serde::Serialize;

use super::util::Board;
use super::Direction;

const DEFAULT_MAP: &str = include_str!("../../../assets/level.map");

const CUSTOM_MAP: &str = "./clevel.map";

/// Grid characters that place a node. `P` is a portal endpoint.
const NODE_CHARS: [char; 2] = ['+', 'P'];
/// Grid characters a link may run through. `.` and `o` also hold pellets.
const PATH_CHARS: [char; 5] = ['.', 'o', '-', '|', '='];

/// Stable handle into the [`NodeGroup`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub position: Vec2,
    neighbors: [Option<NodeId>; 4],
    /// The paired endpoint when this node is a portal
    pub portal: Option<NodeId>,
    pub home_entrance: bool,
    pub spawn_node: bool,
    pub blinky_start_node: bool,
    pub pinky_start_node: bool,
    pub inky_start_node: bool,
    pub clyde_start_node: bool,
    pub pacman_start_node: bool,
}

impl Node {
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            neighbors: [None; 4],
            portal: None,
            home_entrance: false,
            spawn_node: false,
            blinky_start_node: false,
            pinky_start_node: false,
            inky_start_node: false,
            clyde_start_node: false,
            pacman_start_node: false,
        }
    }

    /// STOP never has a neighbour.
    pub fn neighbor(&self, direction: Direction) -> Option<NodeId> {
        direction.index().and_then(|i| self.neighbors[i])
    }

    /// Open directions in enumeration order (UP, DOWN, LEFT, RIGHT).
    pub fn open_directions(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL.into_iter().filter(|d| self.neighbor(*d).is_some())
    }

    pub fn is_portal(&self) -> bool {
        self.portal.is_some()
    }
}

/// Owns every node of a maze. Nodes refer to each other by [`NodeId`] only and
/// nothing changes after construction.
#[derive(Debug, Clone, Default, Resource)]
pub struct NodeGroup {
    nodes: Vec<Node>,
    home: Vec<NodeId>,
}

impl NodeGroup {
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn position(&self, id: NodeId) -> Vec2 {
        self.nodes[id.0].position
    }

    pub fn node_list(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, node)| (NodeId(i), node))
    }

    /// Nodes inside the ghost home.
    pub fn home_list(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.home.iter().map(|id| (*id, self.get(*id)))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn find(&self, predicate: impl Fn(&Node) -> bool) -> Option<NodeId> {
        self.node_list().find(|(_, node)| predicate(node)).map(|(id, _)| id)
    }

    /// The home node ghosts return to when eaten.
    pub fn spawn_node(&self) -> Result<NodeId> {
        self.home_list()
            .find(|(_, node)| node.spawn_node)
            .map(|(id, _)| id)
            .ok_or_else(|| anyhow!("No home node is flagged as the ghost spawn node"))
    }

    pub fn node_at(&self, position: Vec2) -> Option<NodeId> {
        self.find(|node| node.position == position)
    }

    /// Builds the graph from an ASCII layout.
    ///
    /// The grid comes first: `+` is a node, `P` a portal node (paired in reading
    /// order), and `. o - | =` are path cells that link the nodes on either side.
    /// Anything else is wall. Below the grid, lines of the form
    /// `@ <col> <row> <flag>...` mark nodes with `home`, `entrance`, `spawn`,
    /// `blinky`, `pinky`, `inky`, `clyde` or `pacman`.
    pub fn from_layout(layout: &str, board: &Board) -> Result<Self> {
        let grid: Vec<Vec<char>> = grid_lines(layout).map(|line| line.chars().collect()).collect();

        let mut group = Self::default();
        let mut lookup = bevy::utils::HashMap::new();
        let mut portals = Vec::new();

        for (row, line) in grid.iter().enumerate() {
            for (col, c) in line.iter().enumerate() {
                if NODE_CHARS.contains(c) {
                    let id = NodeId(group.nodes.len());
                    let position = Vec2::new(col as f32 * board.tile_width, row as f32 * board.tile_height);
                    group.nodes.push(Node::new(position));
                    lookup.insert((col, row), id);
                    if *c == 'P' {
                        portals.push(id);
                    }
                }
            }
        }

        let cell = |col: usize, row: usize| grid.get(row).and_then(|line| line.get(col)).copied();

        for (&(col, row), &id) in lookup.iter() {
            // Right
            let mut c = col + 1;
            while let Some(ch) = cell(c, row) {
                if let Some(&other) = lookup.get(&(c, row)) {
                    group.link(id, other, Direction::Right);
                    break;
                }
                if !PATH_CHARS.contains(&ch) {
                    break;
                }
                c += 1;
            }

            // Down
            let mut r = row + 1;
            while let Some(ch) = cell(col, r) {
                if let Some(&other) = lookup.get(&(col, r)) {
                    group.link(id, other, Direction::Down);
                    break;
                }
                if !PATH_CHARS.contains(&ch) {
                    break;
                }
                r += 1;
            }
        }

        if portals.len() % 2 != 0 {
            bail!("Layout has {} portal nodes, portals must come in pairs", portals.len());
        }
        for pair in portals.chunks(2) {
            group.nodes[pair[0].0].portal = Some(pair[1]);
            group.nodes[pair[1].0].portal = Some(pair[0]);
        }

        for (line_no, line) in layout.lines().enumerate().filter(|(_, l)| l.trim_start().starts_with('@')) {
            let mut parts = line.trim_start().trim_start_matches('@').split_whitespace();
            let col: usize = parts
                .next()
                .ok_or_else(|| anyhow!("line {}: missing column", line_no + 1))?
                .parse()
                .with_context(|| format!("line {}: bad column", line_no + 1))?;
            let row: usize = parts
                .next()
                .ok_or_else(|| anyhow!("line {}: missing row", line_no + 1))?
                .parse()
                .with_context(|| format!("line {}: bad row", line_no + 1))?;
            let id = *lookup
                .get(&(col, row))
                .ok_or_else(|| anyhow!("line {}: no node at column {col}, row {row}", line_no + 1))?;

            for flag in parts {
                group.apply_flag(id, flag).with_context(|| format!("line {}", line_no + 1))?;
            }
        }

        // Arena order is reading order, keep the home list in it too
        group.home.sort();

        debug!(
            "Built node graph: {} nodes, {} in home, {} portals",
            group.nodes.len(),
            group.home.len(),
            portals.len()
        );

        Ok(group)
    }

    fn link(&mut self, from: NodeId, to: NodeId, direction: Direction) {
        if let (Some(there), Some(back)) = (direction.index(), direction.opposite().index()) {
            self.nodes[from.0].neighbors[there] = Some(to);
            self.nodes[to.0].neighbors[back] = Some(from);
        }
    }

    fn apply_flag(&mut self, id: NodeId, flag: &str) -> Result<()> {
        let node = &mut self.nodes[id.0];
        match flag {
            "home" => {
                if !self.home.contains(&id) {
                    self.home.push(id);
                }
            }
            "entrance" => node.home_entrance = true,
            "spawn" => node.spawn_node = true,
            "blinky" => node.blinky_start_node = true,
            "pinky" => node.pinky_start_node = true,
            "inky" => node.inky_start_node = true,
            "clyde" => node.clyde_start_node = true,
            "pacman" => node.pacman_start_node = true,
            other => bail!("unknown node flag `{other}`"),
        }
        Ok(())
    }
}

/// The grid part of a layout, without the `@` annotations.
pub(crate) fn grid_lines(layout: &str) -> impl Iterator<Item = &str> {
    layout.lines().take_while(|line| !line.trim_start().starts_with('@'))
}

#[derive(Debug)]
pub struct TileMap;

impl TileMap {
    /// The custom map at `path` (or `./clevel.map`) when present, the bundled one otherwise.
    pub fn get_map(path: Option<&str>) -> Result<String> {
        let path = path.unwrap_or(CUSTOM_MAP);
        if Path::new(path).exists() {
            debug!("Found Custom Map!");
            fs::read_to_string(path).with_context(|| format!("Failed to read map {path}"))
        } else {
            Ok(DEFAULT_MAP.to_string())
        }
    }

    /// Pre-load checks. Missing pellets or Pac-Man make the map unusable,
    /// the rest only warns.
    pub fn check_map(map: &str) -> Result<()> {
        let grid: String = grid_lines(map).collect::<Vec<_>>().join("\n");
        if !grid.contains('.') {
            bail!("Map has no pellets!");
        }
        if !map.contains("pacman") {
            bail!("Map has no Pac-Man start node!");
        }

        let all_opt_checks = 2;
        let mut checks = 0;
        if !grid.contains('P') { warn!("Map has no portals!"); } else { checks += 1 }
        if !grid.contains('o') { warn!("Map has no power pellets!"); } else { checks += 1 }

        if checks == all_opt_checks {
            info!("Map passed pre-load checks")
        } else {
            info!("Map passed {}/{} pre-load checks! This could cause some problems!", checks, all_opt_checks)
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::util::DEFAULTS;

    const LAYOUT: &str = "\
P-+..+-P
  .  |
  +..+
@ 2 0 pacman
@ 5 2 home spawn
@ 2 2 home inky
";

    fn group() -> NodeGroup {
        NodeGroup::from_layout(LAYOUT, &DEFAULTS.board).unwrap()
    }

    #[test]
    fn nodes_are_placed_on_tile_grid() {
        let nodes = group();
        assert_eq!(nodes.len(), 6);
        let pacman = nodes.find(|n| n.pacman_start_node).unwrap();
        assert_eq!(nodes.position(pacman), Vec2::new(32.0, 0.0));
    }

    #[test]
    fn links_are_symmetric() {
        let nodes = group();
        let a = nodes.node_at(Vec2::new(32.0, 0.0)).unwrap();
        let b = nodes.node_at(Vec2::new(80.0, 0.0)).unwrap();
        let c = nodes.node_at(Vec2::new(32.0, 32.0)).unwrap();
        assert_eq!(nodes.get(a).neighbor(Direction::Right), Some(b));
        assert_eq!(nodes.get(b).neighbor(Direction::Left), Some(a));
        assert_eq!(nodes.get(a).neighbor(Direction::Down), Some(c));
        assert_eq!(nodes.get(c).neighbor(Direction::Up), Some(a));
        assert_eq!(nodes.get(a).neighbor(Direction::Up), None);
        assert_eq!(nodes.get(a).neighbor(Direction::Stop), None);
    }

    #[test]
    fn portals_pair_up() {
        let nodes = group();
        let left = nodes.node_at(Vec2::new(0.0, 0.0)).unwrap();
        let right = nodes.node_at(Vec2::new(112.0, 0.0)).unwrap();
        assert_eq!(nodes.get(left).portal, Some(right));
        assert_eq!(nodes.get(right).portal, Some(left));
    }

    #[test]
    fn home_list_and_spawn_node() {
        let nodes = group();
        assert_eq!(nodes.home_list().count(), 2);
        let spawn = nodes.spawn_node().unwrap();
        assert_eq!(nodes.position(spawn), Vec2::new(80.0, 32.0));
    }

    #[test]
    fn missing_spawn_node_is_an_error() {
        let nodes = NodeGroup::from_layout("+--+\n", &DEFAULTS.board).unwrap();
        assert!(nodes.spawn_node().is_err());
    }

    #[test]
    fn odd_portal_count_is_rejected() {
        assert!(NodeGroup::from_layout("P--+\n", &DEFAULTS.board).is_err());
    }

    #[test]
    fn annotation_must_hit_a_node() {
        assert!(NodeGroup::from_layout("+--+\n@ 1 0 home\n", &DEFAULTS.board).is_err());
        assert!(NodeGroup::from_layout("+--+\n@ 0 0 haunted\n", &DEFAULTS.board).is_err());
    }

    #[test]
    fn bundled_map_loads() {
        let map = TileMap::get_map(Some("./does-not-exist.map")).unwrap();
        TileMap::check_map(&map).unwrap();
        let nodes = NodeGroup::from_layout(&map, &DEFAULTS.board).unwrap();
        assert!(nodes.spawn_node().is_ok());
        let flags: [fn(&Node) -> bool; 5] = [
            |n: &Node| n.blinky_start_node,
            |n: &Node| n.pinky_start_node,
            |n: &Node| n.inky_start_node,
            |n: &Node| n.clyde_start_node,
            |n: &Node| n.pacman_start_node,
        ];
        for flag in flags {
            assert!(nodes.find(flag).is_some());
        }
    }
}
