use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Right,
    Left,
}

impl Direction {
    /// Scan order used when several directions are held at once.
    pub const PRIORITY: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Right,
        Direction::Left,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "right" => Some(Self::Right),
            "left" => Some(Self::Left),
            _ => None,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Right => (1, 0),
            Direction::Left => (-1, 0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dir: Direction) -> Cell {
        let (dx, dy) = dir.delta();
        Cell {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// World-space center of this tile.
    pub fn center(self, tile_size: f32) -> Vec2 {
        Vec2::new(
            (self.x as f32 + 0.5) * tile_size,
            (self.y as f32 + 0.5) * tile_size,
        )
    }

    /// Tile containing a world-space point.
    pub fn containing(point: Vec2, tile_size: f32) -> Cell {
        Cell {
            x: (point.x / tile_size).floor() as i32,
            y: (point.y / tile_size).floor() as i32,
        }
    }
}

/// Axis-aligned rectangle in world coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Area {
    pub min: Vec2,
    pub max: Vec2,
}

impl Area {
    pub fn centered(center: Vec2, size: f32) -> Self {
        let half = Vec2::splat(size * 0.5);
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Edges that only touch do not count as overlap.
    pub fn intersects(&self, other: &Area) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupKind {
    Pellet,
    PowerPellet,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    BoardCleared,
    Elimination,
    Timeout,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    PlayerLost {
        player: u8,
    },
    PickupClaimed {
        #[serde(rename = "pickupId")]
        pickup_id: u32,
        player: u8,
        kind: PickupKind,
        cell: Cell,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct ActorView {
    pub player: u8,
    pub x: f32,
    pub y: f32,
    pub cell: Cell,
    pub target: Cell,
    pub facing: Direction,
    pub moving: bool,
    pub score: u64,
    pub lives: u32,
    #[serde(rename = "invincibleSecs")]
    pub invincible_secs: f32,
    #[serde(rename = "bonusLifeAwarded")]
    pub bonus_life_awarded: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct PickupView {
    pub id: u32,
    pub cell: Cell,
    pub kind: PickupKind,
    pub claimed: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "elapsedSecs")]
    pub elapsed_secs: f32,
    #[serde(rename = "timeLeftSecs")]
    pub time_left_secs: Option<f32>,
    pub actors: Vec<ActorView>,
    pub pickups: Vec<PickupView>,
    pub events: Vec<GameEvent>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ScoreEntry {
    pub player: u8,
    pub score: u64,
    pub lives: u32,
    pub pellets: u32,
    #[serde(rename = "powerPellets")]
    pub power_pellets: u32,
    #[serde(rename = "livesLost")]
    pub lives_lost: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct GameSummary {
    /// `None` while the match is still running.
    pub reason: Option<GameOverReason>,
    #[serde(rename = "durationSecs")]
    pub duration_secs: f32,
    pub ticks: u64,
    pub winner: Option<u8>,
    pub ranking: Vec<ScoreEntry>,
}
