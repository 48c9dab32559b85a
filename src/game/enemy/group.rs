use anyhow::Result;
use bevy::prelude::*;
use rand::{rngs::StdRng, SeedableRng};

use super::{Ghost, GhostPersonality, GhostSnapshot, Prey};
use crate::game::{map::NodeGroup, modes::ModeName, player::Pacman, util::Settings};

/// Seed used when the settings leave `ghost.rng_seed` out.
const FALLBACK_SEED: u64 = 0x5ACA_3A4;

/// Outcome of Pac-Man touching one or more ghosts in a single tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub points: u32,
    /// A ghost that was neither frightened nor heading home was touched
    pub fatal: bool,
}

/// The four ghosts, always updated Blinky first so Inky sees where Blinky
/// ended up this tick.
#[derive(Debug, Resource)]
pub struct GhostGroup {
    ghosts: Vec<Ghost>,
    base_points: u32,
    eaten_spawn_mult: f32,
    rng: StdRng,
}

impl GhostGroup {
    pub fn new(nodes: &NodeGroup, settings: &Settings) -> Result<Self> {
        let ghosts = GhostPersonality::ALL
            .iter()
            .map(|personality| Ghost::new(*personality, nodes, settings))
            .collect::<Result<Vec<_>>>()?;

        let seed = settings.ghost.rng_seed.unwrap_or(FALLBACK_SEED);
        debug!("Ghost RNG seeded with {seed}");

        Ok(Self {
            ghosts,
            base_points: settings.scoring.ghost_base_points,
            eaten_spawn_mult: settings.speed.eaten_spawn_mult,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn ghosts(&self) -> &[Ghost] {
        &self.ghosts
    }

    pub fn get(&self, personality: GhostPersonality) -> Option<&Ghost> {
        self.ghosts.iter().find(|ghost| ghost.personality == personality)
    }

    pub fn update(&mut self, dt: f32, nodes: &NodeGroup, prey: Prey) {
        for i in 0..self.ghosts.len() {
            let blinky = self.ghosts[0].position;
            self.ghosts[i].update(dt, nodes, prey, blinky, &mut self.rng);
        }
    }

    pub fn freight_mode(&mut self) {
        for ghost in self.ghosts.iter_mut() {
            ghost.freight_mode();
        }
    }

    /// Doubles the bounty of every ghost after one is eaten.
    pub fn update_points(&mut self) {
        for ghost in self.ghosts.iter_mut() {
            ghost.points *= 2;
        }
    }

    pub fn reset_points(&mut self) {
        for ghost in self.ghosts.iter_mut() {
            ghost.points = self.base_points;
        }
    }

    pub fn hide(&mut self) {
        for ghost in self.ghosts.iter_mut() {
            ghost.visible = false;
        }
    }

    pub fn show(&mut self) {
        for ghost in self.ghosts.iter_mut() {
            ghost.visible = true;
        }
    }

    /// Lets caged ghosts out once enough pellets are gone.
    pub fn release(&mut self, pellets_eaten: u32) {
        for ghost in self.ghosts.iter_mut() {
            if ghost.released || pellets_eaten < ghost.pellets_for_release {
                continue;
            }
            ghost.released = true;
            ghost.banned_directions.clear();
            ghost.spawn_mode(1.0);
            info!("{} released after {} pellets", ghost.name(), pellets_eaten);
        }
    }

    pub fn reset(&mut self, nodes: &NodeGroup) {
        for ghost in self.ghosts.iter_mut() {
            ghost.reset(nodes);
        }
    }

    /// Pac-Man caught the ghost at `index` while it was frightened. Returns the
    /// points it was worth, or `None` when there is no such ghost.
    pub fn ghost_eaten(&mut self, index: usize) -> Option<u32> {
        let eaten_spawn_mult = self.eaten_spawn_mult;
        let ghost = self.ghosts.get_mut(index)?;
        let points = ghost.points;
        ghost.spawn_mode(eaten_spawn_mult);
        info!("{} eaten for {} points", ghost.name(), points);
        self.update_points();
        Some(points)
    }

    /// Settles every ghost Pac-Man touches this tick, in update order.
    /// Frightened ghosts are eaten, ghosts heading home are ignored and any
    /// other ghost is fatal.
    pub fn resolve_contacts(&mut self, touching: &[usize]) -> Contact {
        let mut contact = Contact::default();
        for &index in touching {
            let Some(mode) = self.ghosts.get(index).map(|ghost| ghost.mode.name) else { continue };
            match mode {
                ModeName::Freight => contact.points += self.ghost_eaten(index).unwrap_or(0),
                ModeName::Spawn => {}
                _ => contact.fatal = true,
            }
        }
        contact
    }

    pub fn snapshot(&self) -> Vec<GhostSnapshot> {
        self.ghosts.iter().map(Ghost::snapshot).collect()
    }

    pub fn tick(time: Res<Time>, nodes: Res<NodeGroup>, pacman: Res<Pacman>, mut ghosts: ResMut<GhostGroup>) {
        if pacman.dying { return }
        ghosts.update(time.delta_seconds(), &nodes, pacman.prey());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{enemy::tests::LAYOUT, util::DEFAULTS, Direction};
    use proptest::prelude::*;

    fn setup() -> (NodeGroup, GhostGroup) {
        let nodes = NodeGroup::from_layout(LAYOUT, &DEFAULTS.board).unwrap();
        let group = GhostGroup::new(&nodes, &DEFAULTS).unwrap();
        (nodes, group)
    }

    fn prey() -> Prey {
        Prey { position: Vec2::new(128.0, 0.0), direction: Direction::Left }
    }

    #[test]
    fn ghosts_come_in_update_order() {
        let (_, group) = setup();
        let order: Vec<_> = group.ghosts().iter().map(|g| g.personality).collect();
        assert_eq!(order, GhostPersonality::ALL.to_vec());
        assert_eq!(group.get(GhostPersonality::Clyde).map(|g| g.name()), Some("Clyde"));
    }

    #[test]
    fn release_waits_for_the_threshold() {
        let (_, mut group) = setup();

        group.release(29);
        let inky = group.get(GhostPersonality::Inky).unwrap();
        assert!(!inky.released);
        assert_eq!(inky.mode.name, ModeName::Scatter);

        group.release(30);
        let inky = group.get(GhostPersonality::Inky).unwrap();
        assert!(inky.released);
        assert!(inky.banned_directions.is_empty());
        assert_eq!(inky.mode.name, ModeName::Spawn);
        assert_eq!(inky.mode.speed_mult, 1.0);

        let clyde = group.get(GhostPersonality::Clyde).unwrap();
        assert!(!clyde.released);
        assert_eq!(clyde.banned_directions, vec![Direction::Left]);

        // Already out ghosts are left alone
        let blinky = group.get(GhostPersonality::Blinky).unwrap();
        assert_eq!(blinky.mode.name, ModeName::Scatter);
    }

    #[test]
    fn consecutive_ghosts_double_in_value() {
        let (_, mut group) = setup();
        group.freight_mode();

        let worth: Vec<_> = (0..4).map(|i| group.ghost_eaten(i)).collect();
        assert_eq!(worth, vec![Some(200), Some(400), Some(800), Some(1600)]);

        group.reset_points();
        assert!(group.ghosts().iter().all(|g| g.points == 200));
    }

    #[test]
    fn three_doublings_reach_sixteen_hundred() {
        let (_, mut group) = setup();
        for _ in 0..3 {
            group.update_points();
        }
        assert!(group.ghosts().iter().all(|g| g.points == 1600));

        group.reset_points();
        assert!(group.ghosts().iter().all(|g| g.points == 200));
    }

    #[test]
    fn eaten_ghost_runs_home_fast() {
        let (_, mut group) = setup();
        group.freight_mode();
        assert_eq!(group.ghost_eaten(0), Some(200));

        let blinky = &group.ghosts()[0];
        assert_eq!(blinky.mode.name, ModeName::Spawn);
        assert_eq!(blinky.mode.speed_mult, 2.0);
        assert_eq!(blinky.mode_stack.peek().map(|m| (m.name, m.direction)), Some((ModeName::Guide, Direction::Up)));
    }

    #[test]
    fn eating_a_ghost_that_is_not_there_changes_nothing() {
        let (_, mut group) = setup();
        group.freight_mode();

        assert_eq!(group.ghost_eaten(4), None);
        assert_eq!(group.ghost_eaten(usize::MAX), None);
        assert!(group.ghosts().iter().all(|g| g.points == 200 && g.mode.name == ModeName::Freight));
    }

    #[test]
    fn harmless_ghost_does_not_shadow_a_dangerous_one() {
        let (nodes, mut group) = setup();
        let mut pacman = Pacman::new(&nodes, &DEFAULTS).unwrap();

        // Blinky heads home right on top of Pinky, who is still scattering
        group.ghosts[0].spawn_mode(2.0);
        group.ghosts[0].position = group.ghosts[1].position;
        pacman.position = group.ghosts[1].position + Vec2::new(0.0, 9.0);

        let touching = pacman.eat_ghosts(&group);
        assert_eq!(touching, vec![0, 1]);
        assert_eq!(group.resolve_contacts(&touching), Contact { points: 0, fatal: true });
    }

    #[test]
    fn overlapping_frightened_ghosts_are_all_eaten() {
        let (nodes, mut group) = setup();
        let mut pacman = Pacman::new(&nodes, &DEFAULTS).unwrap();
        group.freight_mode();

        group.ghosts[2].position = group.ghosts[1].position;
        pacman.position = group.ghosts[1].position;

        let touching = pacman.eat_ghosts(&group);
        assert_eq!(touching, vec![1, 2]);
        assert_eq!(group.resolve_contacts(&touching), Contact { points: 600, fatal: false });
        assert_eq!(group.ghosts()[1].mode.name, ModeName::Spawn);
        assert_eq!(group.ghosts()[2].mode.name, ModeName::Spawn);

        // Both are harmless on the way home
        assert_eq!(group.resolve_contacts(&touching), Contact::default());
    }

    #[test]
    fn hide_and_show_toggle_everyone() {
        let (nodes, mut group) = setup();
        group.hide();
        assert!(group.ghosts().iter().all(|g| !g.visible));
        group.show();
        assert!(group.ghosts().iter().all(|g| g.visible));

        group.hide();
        group.update(0.01, &nodes, prey());
        assert!(group.ghosts().iter().all(|g| g.visible));
    }

    #[test]
    fn reset_restores_cages_and_schedule() {
        let (nodes, mut group) = setup();
        group.release(100);
        group.freight_mode();
        for _ in 0..20 {
            group.update(0.05, &nodes, prey());
        }

        group.reset(&nodes);
        for ghost in group.ghosts() {
            assert_eq!(ghost.node, ghost.start_node);
            assert_eq!(ghost.mode.name, ModeName::Scatter);
            assert_eq!(ghost.mode_stack.len(), 7);
            assert_eq!(ghost.released, ghost.pellets_for_release == 0);
        }
    }

    #[test]
    fn same_seed_same_wandering() {
        let (nodes, mut a) = setup();
        let (_, mut b) = setup();
        a.freight_mode();
        b.freight_mode();
        for _ in 0..100 {
            a.update(0.02, &nodes, prey());
            b.update(0.02, &nodes, prey());
        }
        let goals = |g: &GhostGroup| g.ghosts().iter().map(|g| g.goal).collect::<Vec<_>>();
        assert_eq!(goals(&a), goals(&b));
    }

    #[test]
    fn snapshot_serialises() {
        let (_, group) = setup();
        let json = serde_json::to_value(group.snapshot()).unwrap();
        assert_eq!(json[0]["name"], "Blinky");
        assert_eq!(json[0]["mode"], "Scatter");
        assert_eq!(json[2]["released"], false);
    }

    proptest! {
        #[test]
        fn ghosts_rest_on_nodes_or_edges(
            ticks in proptest::collection::vec(0.001f32..0.1, 1..200),
            eaten in 0u32..120,
            scare in any::<bool>(),
        ) {
            let (nodes, mut group) = setup();
            group.release(eaten);
            if scare {
                group.freight_mode();
            }

            for dt in ticks {
                group.update(dt, &nodes, prey());
                for ghost in group.ghosts() {
                    let from = nodes.position(ghost.node);
                    let to = nodes.position(ghost.target);
                    if ghost.target == ghost.node {
                        prop_assert_eq!(ghost.position, from);
                    } else {
                        prop_assert_eq!(nodes.get(ghost.node).neighbor(ghost.direction), Some(ghost.target));
                        // On the segment between the two nodes
                        let along = (ghost.position - from).length() + (to - ghost.position).length();
                        prop_assert!((along - (to - from).length()).abs() < 1e-2);
                    }
                }
            }
        }
    }
}
