use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::Direction;

/// Abstract input identifier, e.g. a key name supplied by the platform layer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputId(pub String);

impl From<&str> for InputId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Inputs held down during one tick.
#[derive(Clone, Debug, Default)]
pub struct InputState {
    pressed: HashSet<InputId>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, id: impl Into<InputId>) {
        self.pressed.insert(id.into());
    }

    pub fn release(&mut self, id: &InputId) {
        self.pressed.remove(id);
    }

    pub fn clear(&mut self) {
        self.pressed.clear();
    }

    pub fn is_pressed(&self, id: &InputId) -> bool {
        self.pressed.contains(id)
    }
}

impl<I: Into<InputId>> FromIterator<I> for InputState {
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        Self {
            pressed: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSchema {
    pub up: InputId,
    pub down: InputId,
    pub right: InputId,
    pub left: InputId,
}

impl ControlSchema {
    pub fn new(
        up: impl Into<InputId>,
        down: impl Into<InputId>,
        right: impl Into<InputId>,
        left: impl Into<InputId>,
    ) -> Self {
        Self {
            up: up.into(),
            down: down.into(),
            right: right.into(),
            left: left.into(),
        }
    }

    pub fn arrows() -> Self {
        Self::new("ArrowUp", "ArrowDown", "ArrowRight", "ArrowLeft")
    }

    pub fn wasd() -> Self {
        Self::new("KeyW", "KeyS", "KeyD", "KeyA")
    }

    pub fn binding(&self, dir: Direction) -> &InputId {
        match dir {
            Direction::Up => &self.up,
            Direction::Down => &self.down,
            Direction::Right => &self.right,
            Direction::Left => &self.left,
        }
    }

    /// First held direction in `Direction::PRIORITY` order.
    pub fn resolve(&self, input: &InputState) -> Option<Direction> {
        Direction::PRIORITY
            .into_iter()
            .find(|dir| input.is_pressed(self.binding(*dir)))
    }
}
