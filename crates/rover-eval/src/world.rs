//! World simulator: grid geometry, rover pose, rocks and crystals.
//!
//! Knows nothing about the language; the evaluator drives it through
//! [`CommandContext`](crate::commands::CommandContext).

use crate::error::MoveBlocked;
use rover_types::{
    Direction, GridSize, Level, ObjectKind, ObjectState, Position, Snapshot, WorldObject,
};
use std::collections::BTreeSet;

/// Mutable world state for one run.
#[derive(Debug, Clone)]
pub struct World {
    grid: GridSize,
    pos: Position,
    dir: Direction,
    obstacles: BTreeSet<Position>,
    /// Crystals first, then rocks, in level order.
    objects: Vec<WorldObject>,
}

impl World {
    /// Build the start state of `level`. A crystal under the start cell is
    /// collected immediately.
    pub fn from_level(level: &Level) -> Self {
        let crystals = level.targets.iter().enumerate().map(|(i, &pos)| WorldObject {
            id: format!("crystal-{i}"),
            kind: ObjectKind::Crystal,
            pos,
            state: ObjectState::Idle,
        });
        let rocks = level.obstacles.iter().enumerate().map(|(i, &pos)| WorldObject {
            id: format!("rock-{i}"),
            kind: ObjectKind::Rock,
            pos,
            state: ObjectState::Idle,
        });

        let mut world = Self {
            grid: level.grid_size,
            pos: level.start_position,
            dir: level.start_direction,
            obstacles: level.obstacles.iter().copied().collect(),
            objects: crystals.chain(rocks).collect(),
        };
        world.collect_if_target(world.pos);
        world
    }

    pub fn position(&self) -> Position {
        self.pos
    }

    pub fn direction(&self) -> Direction {
        self.dir
    }

    pub fn can_move_to(&self, pos: Position) -> bool {
        self.check_move(pos).is_ok()
    }

    /// Whether the rover may stand on `pos`.
    pub fn check_move(&self, pos: Position) -> Result<(), MoveBlocked> {
        if !self.grid.contains(pos) {
            Err(MoveBlocked::OutOfBounds)
        } else if self.obstacles.contains(&pos) {
            Err(MoveBlocked::BlockedByRock)
        } else {
            Ok(())
        }
    }

    pub fn face(&mut self, dir: Direction) {
        self.dir = dir;
    }

    /// Place the rover. Callers check legality first with [`check_move`](Self::check_move).
    pub fn apply_move(&mut self, pos: Position, dir: Direction) {
        self.pos = pos;
        self.dir = dir;
    }

    /// Mark an idle crystal at `pos` collected. Returns `true` if one was.
    pub fn collect_if_target(&mut self, pos: Position) -> bool {
        let mut collected = false;
        for obj in &mut self.objects {
            if obj.kind == ObjectKind::Crystal && obj.pos == pos && obj.state == ObjectState::Idle
            {
                obj.state = ObjectState::Collected;
                collected = true;
            }
        }
        collected
    }

    pub fn all_targets_collected(&self) -> bool {
        self.crystals().all(|o| o.state == ObjectState::Collected)
    }

    /// `(collected, total)` crystal counts.
    pub fn crystal_progress(&self) -> (usize, usize) {
        let total = self.crystals().count();
        let collected = self
            .crystals()
            .filter(|o| o.state == ObjectState::Collected)
            .count();
        (collected, total)
    }

    fn crystals(&self) -> impl Iterator<Item = &WorldObject> {
        self.objects
            .iter()
            .filter(|o| o.kind == ObjectKind::Crystal)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            player_pos: self.pos,
            player_dir: self.dir,
            objects: self.objects.clone(),
        }
    }
}
