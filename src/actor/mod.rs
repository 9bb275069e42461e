mod motion;
mod vitality;

pub use self::motion::{Motion, MotionState, StepOutcome};
pub use self::vitality::{DamageOutcome, Vitality};

use glam::Vec2;

use crate::board::Walkable;
use crate::config::MatchConfig;
use crate::control::{ControlSchema, InputState};
use crate::events::EventBus;
use crate::types::{ActorView, Area, Cell, Direction, GameEvent, PickupKind};

#[derive(Clone, Copy, Debug, PartialEq)]
struct ActorTuning {
    tile_size: f32,
    speed: f32,
    hit_size: f32,
    invincibility_secs: f32,
    bonus_life_threshold: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActorStats {
    pub pellets: u32,
    pub power_pellets: u32,
}

#[derive(Clone, Debug)]
pub struct Actor {
    number: u8,
    schema: ControlSchema,
    origin: Cell,
    motion: MotionState,
    vitality: Vitality,
    tuning: ActorTuning,
    stats: ActorStats,
}

impl Actor {
    pub fn new(
        number: u8,
        schema: ControlSchema,
        origin: Cell,
        facing: Direction,
        config: &MatchConfig,
    ) -> Self {
        Self {
            number,
            schema,
            origin,
            motion: MotionState::new(origin, facing),
            vitality: Vitality::new(config.starting_lives),
            tuning: ActorTuning {
                tile_size: config.tile_size,
                speed: config.actor_speed,
                hit_size: config.actor_hit_size,
                invincibility_secs: config.invincibility_secs,
                bonus_life_threshold: config.bonus_life_threshold,
            },
            stats: ActorStats::default(),
        }
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn schema(&self) -> &ControlSchema {
        &self.schema
    }

    pub fn origin(&self) -> Cell {
        self.origin
    }

    pub fn facing(&self) -> Direction {
        self.motion.facing()
    }

    pub fn motion(&self) -> Motion {
        self.motion.motion()
    }

    pub fn is_at_rest(&self) -> bool {
        self.motion.is_at_rest()
    }

    /// Tile currently containing the actor's center.
    pub fn position(&self) -> Cell {
        Cell::containing(self.position_vec(), self.tuning.tile_size)
    }

    pub fn position_vec(&self) -> Vec2 {
        self.motion.position(self.tuning.tile_size)
    }

    pub fn target_cell(&self) -> Cell {
        self.motion.target()
    }

    pub fn hit_area(&self) -> Area {
        Area::centered(self.position_vec(), self.tuning.hit_size)
    }

    pub fn score(&self) -> u64 {
        self.vitality.score()
    }

    pub fn lives(&self) -> u32 {
        self.vitality.lives()
    }

    pub fn invincible_secs(&self) -> f32 {
        self.vitality.invincible_secs()
    }

    pub fn bonus_life_awarded(&self) -> bool {
        self.vitality.bonus_life_awarded()
    }

    pub fn lives_lost(&self) -> u32 {
        self.vitality.lives_lost()
    }

    pub fn stats(&self) -> &ActorStats {
        &self.stats
    }

    /// Still in the contest. Eliminated actors neither move nor claim pickups.
    pub fn is_active(&self) -> bool {
        self.vitality.lives() > 0
    }

    /// Counts down the invincibility window.
    pub fn tick(&mut self, dt: f32) {
        self.vitality.tick(dt);
    }

    /// Resolves this actor's bindings against the tick's input and advances motion.
    pub fn update<W>(&mut self, dt: f32, input: &InputState, board: &W) -> StepOutcome
    where
        W: Walkable + ?Sized,
    {
        let desired = self.schema.resolve(input);
        self.advance(dt, desired, board)
    }

    pub fn advance<W>(&mut self, dt: f32, desired: Option<Direction>, board: &W) -> StepOutcome
    where
        W: Walkable + ?Sized,
    {
        if !self.is_active() {
            return StepOutcome::Idle;
        }
        self.motion
            .advance(dt, desired, self.tuning.speed, self.tuning.tile_size, board)
    }

    pub fn add_points(&mut self, amount: u64) {
        if self
            .vitality
            .add_points(amount, self.tuning.bonus_life_threshold)
        {
            log::debug!(
                "player {} earned a bonus life at score {}",
                self.number,
                self.vitality.score()
            );
        }
    }

    pub(crate) fn award_pickup(&mut self, kind: PickupKind, amount: u64) {
        match kind {
            PickupKind::Pellet => self.stats.pellets += 1,
            PickupKind::PowerPellet => self.stats.power_pellets += 1,
        }
        self.add_points(amount);
    }

    /// Hazard contact. Inert while invincible; otherwise costs a life and sends the actor home.
    pub fn take_damage(&mut self, bus: &mut EventBus) -> DamageOutcome {
        let outcome = self
            .vitality
            .take_damage(self.tuning.invincibility_secs);
        match outcome {
            DamageOutcome::Ignored => {}
            DamageOutcome::LifeLost { remaining } => {
                self.reset_position();
                log::debug!("player {} lost a life, {} left", self.number, remaining);
            }
            DamageOutcome::Eliminated => {
                self.reset_position();
                log::debug!("player {} is out of lives", self.number);
                bus.publish(GameEvent::PlayerLost {
                    player: self.number,
                });
            }
        }
        outcome
    }

    pub fn die(&mut self, bus: &mut EventBus) -> DamageOutcome {
        self.take_damage(bus)
    }

    pub fn reset_position(&mut self) {
        self.motion.place(self.origin);
    }

    pub fn view(&self) -> ActorView {
        let pos = self.position_vec();
        ActorView {
            player: self.number,
            x: pos.x,
            y: pos.y,
            cell: self.position(),
            target: self.target_cell(),
            facing: self.facing(),
            moving: !self.is_at_rest(),
            score: self.score(),
            lives: self.lives(),
            invincible_secs: self.invincible_secs(),
            bonus_life_awarded: self.bonus_life_awarded(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::events::EventKind;

    fn open(_: Cell) -> bool {
        true
    }

    fn make_actor(origin: Cell) -> Actor {
        Actor::new(
            1,
            ControlSchema::arrows(),
            origin,
            Direction::Left,
            &MatchConfig::default(),
        )
    }

    #[test]
    fn damage_sends_actor_home_and_blocks_repeat_hits() {
        let mut bus = EventBus::new();
        let mut actor = make_actor(Cell::new(1, 1));
        for _ in 0..40 {
            let input: InputState = ["ArrowRight"].into_iter().collect();
            actor.update(1.0 / 60.0, &input, &open);
        }
        assert_ne!(actor.position_vec(), Cell::new(1, 1).center(16.0));

        assert_eq!(
            actor.take_damage(&mut bus),
            DamageOutcome::LifeLost { remaining: 2 }
        );
        assert_eq!(actor.lives(), 2);
        assert_eq!(actor.position(), Cell::new(1, 1));
        assert_eq!(actor.target_cell(), Cell::new(1, 1));
        assert!(actor.is_at_rest());
        assert_eq!(actor.invincible_secs(), 2.0);

        assert_eq!(actor.take_damage(&mut bus), DamageOutcome::Ignored);
        assert_eq!(actor.lives(), 2);
        assert!(bus.pending().is_empty());
    }

    #[test]
    fn invincible_damage_does_not_move_actor() {
        let mut bus = EventBus::new();
        let mut actor = make_actor(Cell::new(1, 1));
        actor.take_damage(&mut bus);
        let input: InputState = ["ArrowDown"].into_iter().collect();
        actor.update(1.0 / 60.0, &input, &open);
        let before = actor.position_vec();

        assert_eq!(actor.take_damage(&mut bus), DamageOutcome::Ignored);
        assert_eq!(actor.position_vec(), before);
    }

    #[test]
    fn player_lost_fires_once_when_lives_run_out() {
        let mut bus = EventBus::new();
        let lost = Rc::new(RefCell::new(Vec::new()));
        {
            let lost = Rc::clone(&lost);
            bus.subscribe(EventKind::PlayerLost, move |event| {
                lost.borrow_mut().push(event.clone())
            });
        }

        let mut actor = make_actor(Cell::new(2, 2));
        for _ in 0..5 {
            actor.take_damage(&mut bus);
            actor.tick(2.5);
        }

        assert_eq!(actor.lives(), 0);
        assert_eq!(*lost.borrow(), vec![GameEvent::PlayerLost { player: 1 }]);
        assert!(!actor.is_active());
    }

    #[test]
    fn eliminated_actor_stays_put() {
        let mut bus = EventBus::new();
        let config = MatchConfig {
            starting_lives: 1,
            ..MatchConfig::default()
        };
        let mut actor = Actor::new(
            2,
            ControlSchema::wasd(),
            Cell::new(3, 3),
            Direction::Up,
            &config,
        );
        actor.take_damage(&mut bus);
        let outcome = actor.advance(1.0 / 60.0, Some(Direction::Right), &open);
        assert_eq!(outcome, StepOutcome::Idle);
        assert_eq!(actor.target_cell(), Cell::new(3, 3));
    }

    #[test]
    fn reset_position_keeps_score_and_lives() {
        let mut actor = make_actor(Cell::new(4, 4));
        actor.add_points(120);
        actor.advance(1.0 / 60.0, Some(Direction::Up), &open);
        actor.reset_position();

        assert_eq!(actor.position(), Cell::new(4, 4));
        assert!(actor.is_at_rest());
        assert_eq!(actor.score(), 120);
        assert_eq!(actor.lives(), 3);
        assert_eq!(actor.facing(), Direction::Up);
    }

    #[test]
    fn bonus_life_through_actor_api() {
        let mut actor = make_actor(Cell::new(1, 1));
        actor.add_points(10_000);
        assert_eq!(actor.lives(), 4);
        assert!(actor.bonus_life_awarded());
        actor.add_points(1);
        assert_eq!(actor.lives(), 4);
    }

    #[test]
    fn view_reflects_motion() {
        let mut actor = make_actor(Cell::new(1, 1));
        actor.advance(1.0 / 60.0, Some(Direction::Right), &open);
        let view = actor.view();
        assert!(view.moving);
        assert_eq!(view.target, Cell::new(2, 1));
        assert_eq!(view.cell, Cell::new(1, 1));
        assert_eq!(view.facing, Direction::Right);
        assert_eq!(view.player, 1);
    }
}
