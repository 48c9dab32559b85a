use std::fmt;

use serde::Serialize;

use super::Direction;

/// Length of every timed phase in the default schedule, earliest first.
/// The final CHASE never expires.
const DEFAULT_SCHEDULE: [(ModeName, Option<f32>); 8] = [
    (ModeName::Scatter, Some(7.0)),
    (ModeName::Chase, Some(20.0)),
    (ModeName::Scatter, Some(7.0)),
    (ModeName::Chase, Some(20.0)),
    (ModeName::Scatter, Some(7.0)),
    (ModeName::Chase, Some(20.0)),
    (ModeName::Scatter, Some(5.0)),
    (ModeName::Chase, None),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ModeName {
    Chase,
    Scatter,
    Freight,
    Spawn,
    Guide,
}

impl fmt::Display for ModeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModeName::Chase => "CHASE",
            ModeName::Scatter => "SCATTER",
            ModeName::Freight => "FREIGHT",
            ModeName::Spawn => "SPAWN",
            ModeName::Guide => "GUIDE",
        };
        f.write_str(name)
    }
}

/// A behaviour phase. Never mutated once built, a transition always makes a new one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mode {
    pub name: ModeName,
    /// `None` means the mode never expires on its own
    pub time: Option<f32>,
    pub speed_mult: f32,
    /// Only GUIDE modes carry a forced direction
    pub direction: Direction,
}

impl Mode {
    pub fn new(name: ModeName, time: Option<f32>) -> Self {
        Self { name, time, speed_mult: 1.0, direction: Direction::Stop }
    }

    pub fn freight(duration: f32, speed_mult: f32) -> Self {
        Self { name: ModeName::Freight, time: Some(duration), speed_mult, direction: Direction::Stop }
    }

    pub fn spawn(speed_mult: f32) -> Self {
        Self { name: ModeName::Spawn, time: None, speed_mult, direction: Direction::Stop }
    }

    pub fn guide(direction: Direction, speed_mult: f32) -> Self {
        Self { name: ModeName::Guide, time: None, speed_mult, direction }
    }

    pub fn is(&self, name: ModeName) -> bool {
        self.name == name
    }

    /// GUIDE and SPAWN dictate their own direction, nothing may reverse it.
    pub fn allows_reversal(&self) -> bool {
        !matches!(self.name, ModeName::Guide | ModeName::Spawn)
    }
}

/// Upcoming modes, last in first out. The top is the next mode to run.
#[derive(Debug, Clone, Default)]
pub struct ModeStack {
    modes: Vec<Mode>,
}

impl ModeStack {
    /// The scatter/chase schedule, pushed latest-first so popping yields it in order.
    pub fn default_schedule() -> Self {
        let mut stack = Self::default();
        for (name, time) in DEFAULT_SCHEDULE.iter().rev() {
            stack.push(Mode::new(*name, *time));
        }
        stack
    }

    pub fn push(&mut self, mode: Mode) {
        self.modes.push(mode);
    }

    /// Pops the next mode. The schedule always bottoms out in a mode that never
    /// expires, so running dry means the ghost state is corrupt.
    pub fn pop(&mut self) -> Mode {
        match self.modes.pop() {
            Some(mode) => mode,
            None => panic!("mode stack exhausted: the schedule must end in a non-expiring mode"),
        }
    }

    pub fn peek(&self) -> Option<&Mode> {
        self.modes.last()
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}
