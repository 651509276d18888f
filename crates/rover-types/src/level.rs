//! Level descriptor supplied by content authoring.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A grid cell. `x` is the column, `y` the row; `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell in `dir`, or `None` past the `i32` range.
    pub fn step(self, dir: Direction) -> Option<Position> {
        let (dx, dy) = dir.delta();
        Some(Position::new(
            self.x.checked_add(dx)?,
            self.y.checked_add(dy)?,
        ))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Rover facing direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    #[default]
    Right,
}

impl Direction {
    /// `(dx, dy)` of one unit step.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub rows: u32,
    pub cols: u32,
}

impl GridSize {
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.cols && (pos.y as u32) < self.rows
    }
}

/// The static puzzle description. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Level {
    pub grid_size: GridSize,
    pub start_position: Position,
    #[serde(default)]
    pub start_direction: Direction,
    /// Crystals to collect.
    #[serde(default)]
    pub targets: Vec<Position>,
    /// Rocks.
    #[serde(default)]
    pub obstacles: Vec<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_moves: Option<u32>,
    #[serde(default)]
    pub initial_code: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<String>,
}

/// An authoring problem in a [`Level`]. The engine still runs such levels.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelIssue {
    #[error("start position {0} is outside the grid")]
    StartOutOfBounds(Position),
    #[error("start position {0} is on a rock")]
    StartOnObstacle(Position),
    #[error("target {0} is outside the grid")]
    TargetOutOfBounds(Position),
    #[error("target {0} is on a rock")]
    TargetOnObstacle(Position),
    #[error("rock {0} is outside the grid")]
    ObstacleOutOfBounds(Position),
    #[error("level has neither targets nor required output")]
    NoGoal,
}

impl Level {
    /// An open grid with the rover in the top-left corner facing right.
    pub fn open(rows: u32, cols: u32) -> Self {
        Self {
            grid_size: GridSize { rows, cols },
            start_position: Position::new(0, 0),
            start_direction: Direction::Right,
            targets: Vec::new(),
            obstacles: Vec::new(),
            required_output: None,
            max_moves: None,
            initial_code: String::new(),
            hints: Vec::new(),
        }
    }

    pub fn with_start(mut self, x: i32, y: i32, dir: Direction) -> Self {
        self.start_position = Position::new(x, y);
        self.start_direction = dir;
        self
    }

    pub fn with_target(mut self, x: i32, y: i32) -> Self {
        self.targets.push(Position::new(x, y));
        self
    }

    pub fn with_obstacle(mut self, x: i32, y: i32) -> Self {
        self.obstacles.push(Position::new(x, y));
        self
    }

    pub fn with_required_output(mut self, output: impl Into<String>) -> Self {
        self.required_output = Some(output.into());
        self
    }

    pub fn with_max_moves(mut self, max_moves: u32) -> Self {
        self.max_moves = Some(max_moves);
        self
    }

    /// Parse a level from its JSON form.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Report authoring problems. An empty list means the level is well formed.
    pub fn validate(&self) -> Vec<LevelIssue> {
        let mut issues = Vec::new();
        let grid = self.grid_size;
        if !grid.contains(self.start_position) {
            issues.push(LevelIssue::StartOutOfBounds(self.start_position));
        }
        if self.obstacles.contains(&self.start_position) {
            issues.push(LevelIssue::StartOnObstacle(self.start_position));
        }
        for &target in &self.targets {
            if !grid.contains(target) {
                issues.push(LevelIssue::TargetOutOfBounds(target));
            } else if self.obstacles.contains(&target) {
                issues.push(LevelIssue::TargetOnObstacle(target));
            }
        }
        for &rock in &self.obstacles {
            if !grid.contains(rock) {
                issues.push(LevelIssue::ObstacleOutOfBounds(rock));
            }
        }
        if self.targets.is_empty() && self.required_output.is_none() {
            issues.push(LevelIssue::NoGoal);
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_level_from_json() {
        let level = Level::from_json(
            r#"{
                "gridSize": {"rows": 5, "cols": 5},
                "startPosition": {"x": 0, "y": 2},
                "startDirection": "right",
                "targets": [{"x": 4, "y": 2}],
                "obstacles": [{"x": 2, "y": 2}],
                "maxMoves": 12,
                "initialCode": "move_right()\n"
            }"#,
        )
        .unwrap();
        assert_eq!(level.grid_size, GridSize { rows: 5, cols: 5 });
        assert_eq!(level.start_position, Position::new(0, 2));
        assert_eq!(level.targets, vec![Position::new(4, 2)]);
        assert_eq!(level.obstacles, vec![Position::new(2, 2)]);
        assert_eq!(level.max_moves, Some(12));
        assert_eq!(level.required_output, None);
        assert!(level.validate().is_empty());
    }

    #[test]
    fn test_level_defaults() {
        let level =
            Level::from_json(r#"{"gridSize":{"rows":1,"cols":1},"startPosition":{"x":0,"y":0}}"#)
                .unwrap();
        assert_eq!(level.start_direction, Direction::Right);
        assert!(level.targets.is_empty());
        assert_eq!(level.initial_code, "");
    }

    #[test]
    fn test_validate_reports_issues() {
        let level = Level::open(3, 3)
            .with_start(5, 0, Direction::Up)
            .with_target(1, 1)
            .with_obstacle(1, 1)
            .with_obstacle(9, 9);
        assert_eq!(
            level.validate(),
            vec![
                LevelIssue::StartOutOfBounds(Position::new(5, 0)),
                LevelIssue::TargetOnObstacle(Position::new(1, 1)),
                LevelIssue::ObstacleOutOfBounds(Position::new(9, 9)),
            ]
        );
    }

    #[test]
    fn test_validate_no_goal() {
        assert_eq!(Level::open(2, 2).validate(), vec![LevelIssue::NoGoal]);
        assert!(Level::open(2, 2).with_required_output("hi").validate().is_empty());
    }

    #[test]
    fn test_grid_contains() {
        let grid = GridSize { rows: 1, cols: 7 };
        assert!(grid.contains(Position::new(6, 0)));
        assert!(!grid.contains(Position::new(7, 0)));
        assert!(!grid.contains(Position::new(0, 1)));
        assert!(!grid.contains(Position::new(-1, 0)));
    }

    #[test]
    fn test_position_step() {
        let p = Position::new(2, 2);
        assert_eq!(p.step(Direction::Up), Some(Position::new(2, 1)));
        assert_eq!(p.step(Direction::Down), Some(Position::new(2, 3)));
        assert_eq!(p.step(Direction::Left), Some(Position::new(1, 2)));
        assert_eq!(p.step(Direction::Right), Some(Position::new(3, 2)));
    }

    #[test]
    fn test_position_step_at_i32_edge() {
        let edge = Position::new(i32::MAX, 0);
        assert_eq!(edge.step(Direction::Right), None);
        assert_eq!(edge.step(Direction::Left), Some(Position::new(i32::MAX - 1, 0)));
        assert_eq!(Position::new(0, i32::MIN).step(Direction::Up), None);
    }
}
