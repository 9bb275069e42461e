use crate::actor::{Actor, DamageOutcome};
use crate::board::{BoardLayout, TileBoard, Walkable};
use crate::config::MatchConfig;
use crate::constants::MAX_PLAYERS;
use crate::control::{ControlSchema, InputState};
use crate::error::BoardError;
use crate::events::EventBus;
use crate::pickup::{Pickup, PickupStatus};
use crate::types::{Cell, Direction, GameOverReason, PickupKind, Snapshot};

mod outcome;

/// One player slot: who they are on the keyboard and where they start.
#[derive(Clone, Debug)]
pub struct Seat {
    pub schema: ControlSchema,
    pub origin: Cell,
    pub facing: Direction,
}

impl Seat {
    pub fn new(schema: ControlSchema, origin: Cell) -> Self {
        Self {
            schema,
            origin,
            facing: Direction::Left,
        }
    }
}

/// A single match: actors, pickups and the event bus on one board.
///
/// Every `step` runs the phases in a fixed order (invincibility countdown,
/// motion, pickup resolution, end check) so pickups always see the positions
/// actors reached this tick.
#[derive(Debug)]
pub struct MatchEngine<B: Walkable> {
    pub config: MatchConfig,
    board: B,
    actors: Vec<Actor>,
    pickups: Vec<Pickup>,
    bus: EventBus,
    initial_pickups: usize,

    tick_counter: u64,
    elapsed_secs: f32,
    ended: bool,
    end_reason: Option<GameOverReason>,
}

impl<B: Walkable> MatchEngine<B> {
    /// Players are numbered from 1 in `seats` order.
    pub fn new(
        config: MatchConfig,
        board: B,
        seats: Vec<Seat>,
        pickups: &[(Cell, PickupKind)],
    ) -> Self {
        let actors = seats
            .into_iter()
            .enumerate()
            .map(|(idx, seat)| {
                Actor::new(
                    idx as u8 + 1,
                    seat.schema,
                    seat.origin,
                    seat.facing,
                    &config,
                )
            })
            .collect::<Vec<_>>();
        let pickups = pickups
            .iter()
            .enumerate()
            .map(|(idx, (cell, kind))| Pickup::new(idx as u32 + 1, *cell, *kind, &config))
            .collect::<Vec<_>>();

        log::debug!(
            "match created with {} actors and {} pickups",
            actors.len(),
            pickups.len()
        );

        Self {
            initial_pickups: pickups.len(),
            config,
            board,
            actors,
            pickups,
            bus: EventBus::new(),
            tick_counter: 0,
            elapsed_secs: 0.0,
            ended: false,
            end_reason: None,
        }
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn end_reason(&self) -> Option<GameOverReason> {
        self.end_reason
    }

    pub fn tick(&self) -> u64 {
        self.tick_counter
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed_secs
    }

    pub fn time_left_secs(&self) -> Option<f32> {
        self.config
            .time_limit_secs
            .map(|limit| (limit - self.elapsed_secs).max(0.0))
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    /// Pickups not yet dropped. A pickup claimed this tick stays listed until the next one.
    pub fn pickups(&self) -> &[Pickup] {
        &self.pickups
    }

    pub fn remaining_pickups(&self) -> usize {
        self.pickups.iter().filter(|p| !p.is_claimed()).count()
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn step(&mut self, dt: f32, input: &InputState) {
        if self.ended {
            return;
        }
        let dt = dt.max(0.0);
        self.tick_counter += 1;
        self.elapsed_secs += dt;

        for actor in &mut self.actors {
            actor.tick(dt);
        }
        for actor in &mut self.actors {
            actor.update(dt, input, &self.board);
        }
        self.resolve_pickups();
        self.check_game_over();
    }

    /// Hazard entry point. Returns `None` for an unknown actor index.
    pub fn damage_actor(&mut self, index: usize) -> Option<DamageOutcome> {
        let actor = self.actors.get_mut(index)?;
        Some(actor.take_damage(&mut self.bus))
    }

    pub fn add_points(&mut self, index: usize, amount: u64) -> bool {
        match self.actors.get_mut(index) {
            Some(actor) => {
                actor.add_points(amount);
                true
            }
            None => false,
        }
    }

    /// Sends every actor back to its origin without touching lives or score.
    pub fn reset_positions(&mut self) {
        for actor in &mut self.actors {
            actor.reset_position();
        }
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        Snapshot {
            tick: self.tick_counter,
            elapsed_secs: self.elapsed_secs,
            time_left_secs: self.time_left_secs(),
            actors: self.actors.iter().map(Actor::view).collect(),
            pickups: self.pickups.iter().map(Pickup::view).collect(),
            events: if include_events {
                self.bus.drain_pending()
            } else {
                Vec::new()
            },
        }
    }

    fn resolve_pickups(&mut self) {
        let actors = &mut self.actors;
        let bus = &mut self.bus;
        self.pickups.retain_mut(|pickup| match pickup.resolve(actors, bus) {
            PickupStatus::Retired => {
                log::debug!("pickup {} retired", pickup.id());
                false
            }
            PickupStatus::Active | PickupStatus::Claimed { .. } => true,
        });
    }
}

impl MatchEngine<TileBoard> {
    /// Seats one actor per spawn (up to two), arrows for player 1 and WASD for player 2.
    pub fn from_layout(config: MatchConfig, layout: BoardLayout) -> Result<Self, BoardError> {
        let seat_count = layout.spawns.len().min(MAX_PLAYERS);
        if seat_count == 0 {
            return Err(BoardError::MissingSpawn(1));
        }
        let schemas = [ControlSchema::arrows(), ControlSchema::wasd()];
        let mut seats = Vec::with_capacity(seat_count);
        for (idx, schema) in schemas.into_iter().take(seat_count).enumerate() {
            let origin = layout.spawn_for(idx as u8 + 1)?;
            seats.push(Seat::new(schema, origin));
        }
        Ok(Self::new(config, layout.board, seats, &layout.pickups))
    }
}
