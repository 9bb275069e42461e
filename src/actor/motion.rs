use glam::Vec2;

use crate::board::Walkable;
use crate::types::{Cell, Direction};

/// Grid-locked motion. An actor only polls input while `AtRest`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Motion {
    AtRest { cell: Cell },
    Moving { from: Cell, to: Cell, progress: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Idle,
    /// Facing changed but the neighbouring cell is not walkable.
    Blocked(Direction),
    InTransit,
    Arrived(Cell),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionState {
    motion: Motion,
    facing: Direction,
}

impl MotionState {
    pub fn new(cell: Cell, facing: Direction) -> Self {
        Self {
            motion: Motion::AtRest { cell },
            facing,
        }
    }

    pub fn motion(&self) -> Motion {
        self.motion
    }

    pub fn facing(&self) -> Direction {
        self.facing
    }

    pub fn is_at_rest(&self) -> bool {
        matches!(self.motion, Motion::AtRest { .. })
    }

    pub fn target(&self) -> Cell {
        match self.motion {
            Motion::AtRest { cell } => cell,
            Motion::Moving { to, .. } => to,
        }
    }

    pub fn position(&self, tile_size: f32) -> Vec2 {
        match self.motion {
            Motion::AtRest { cell } => cell.center(tile_size),
            Motion::Moving { from, to, progress } => from
                .center(tile_size)
                .lerp(to.center(tile_size), progress.clamp(0.0, 1.0)),
        }
    }

    pub fn place(&mut self, cell: Cell) {
        self.motion = Motion::AtRest { cell };
    }

    /// One tick of grid motion. A move that starts this tick also covers ground this tick.
    /// Reaching the target snaps onto its center; distance past it is dropped.
    pub fn advance<W>(
        &mut self,
        dt: f32,
        desired: Option<Direction>,
        speed: f32,
        tile_size: f32,
        board: &W,
    ) -> StepOutcome
    where
        W: Walkable + ?Sized,
    {
        if let Motion::AtRest { cell } = self.motion {
            let Some(dir) = desired else {
                return StepOutcome::Idle;
            };
            self.facing = dir;
            let candidate = cell.offset(dir);
            if !board.is_walkable(candidate) {
                return StepOutcome::Blocked(dir);
            }
            self.motion = Motion::Moving {
                from: cell,
                to: candidate,
                progress: 0.0,
            };
        }

        let Motion::Moving { from, to, progress } = self.motion else {
            return StepOutcome::Idle;
        };
        let span = from.center(tile_size).distance(to.center(tile_size));
        if span <= f32::EPSILON {
            self.motion = Motion::AtRest { cell: to };
            return StepOutcome::Arrived(to);
        }

        let progress = progress + (speed * dt).max(0.0) / span;
        if progress >= 1.0 {
            self.motion = Motion::AtRest { cell: to };
            return StepOutcome::Arrived(to);
        }
        self.motion = Motion::Moving { from, to, progress };
        StepOutcome::InTransit
    }
}
