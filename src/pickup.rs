use std::cmp::Ordering;

use glam::Vec2;

use crate::actor::Actor;
use crate::config::MatchConfig;
use crate::events::EventBus;
use crate::types::{Area, Cell, GameEvent, PickupKind, PickupView};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PickupStatus {
    Active,
    /// Awarded this tick to the actor at `by`.
    Claimed { by: usize },
    /// Claimed on an earlier tick; the owner should drop it.
    Retired,
}

#[derive(Clone, Debug)]
pub struct Pickup {
    id: u32,
    cell: Cell,
    kind: PickupKind,
    center: Vec2,
    area: Area,
    value: u64,
    claimed_by: Option<u8>,
}

impl Pickup {
    pub fn new(id: u32, cell: Cell, kind: PickupKind, config: &MatchConfig) -> Self {
        let center = cell.center(config.tile_size);
        Self {
            id,
            cell,
            kind,
            center,
            area: Area::centered(center, config.pickup_hit_size),
            value: config.pickup_value(kind),
            claimed_by: None,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn cell(&self) -> Cell {
        self.cell
    }

    pub fn kind(&self) -> PickupKind {
        self.kind
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn area(&self) -> Area {
        self.area
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed_by.is_some()
    }

    /// Player number of the claimant, once claimed.
    pub fn claimed_by(&self) -> Option<u8> {
        self.claimed_by
    }

    /// One tick of claim resolution against the actors' current hit areas.
    ///
    /// Among overlapping actors the one nearest the cell center wins. An exact
    /// distance tie goes to the strictly lower score, and a tie on both goes to
    /// the lowest index in `actors`.
    pub fn resolve(&mut self, actors: &mut [Actor], bus: &mut EventBus) -> PickupStatus {
        if self.claimed_by.is_some() {
            return PickupStatus::Retired;
        }

        let Some(winner) = self.pick_claimant(actors) else {
            return PickupStatus::Active;
        };

        let actor = &mut actors[winner];
        actor.award_pickup(self.kind, self.value);
        self.claimed_by = Some(actor.number());
        log::debug!(
            "pickup {} at ({}, {}) claimed by player {}",
            self.id,
            self.cell.x,
            self.cell.y,
            actor.number()
        );
        bus.publish(GameEvent::PickupClaimed {
            pickup_id: self.id,
            player: actor.number(),
            kind: self.kind,
            cell: self.cell,
        });
        PickupStatus::Claimed { by: winner }
    }

    fn pick_claimant(&self, actors: &[Actor]) -> Option<usize> {
        actors
            .iter()
            .enumerate()
            .filter(|(_, actor)| actor.is_active() && actor.hit_area().intersects(&self.area))
            .map(|(idx, actor)| (idx, actor.position_vec().distance(self.center), actor.score()))
            .min_by(|a, b| claim_order(*a, *b))
            .map(|(idx, _, _)| idx)
    }

    pub fn view(&self) -> PickupView {
        PickupView {
            id: self.id,
            cell: self.cell,
            kind: self.kind,
            claimed: self.is_claimed(),
        }
    }
}

fn claim_order(a: (usize, f32, u64), b: (usize, f32, u64)) -> Ordering {
    a.1.total_cmp(&b.1)
        .then(a.2.cmp(&b.2))
        .then(a.0.cmp(&b.0))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::control::ControlSchema;
    use crate::events::EventKind;
    use crate::types::Direction;

    fn open(_: Cell) -> bool {
        true
    }

    fn actor_at(number: u8, cell: Cell) -> Actor {
        let schema = if number == 1 {
            ControlSchema::arrows()
        } else {
            ControlSchema::wasd()
        };
        Actor::new(number, schema, cell, Direction::Left, &MatchConfig::default())
    }

    /// A walks in from (3,4), B from (5,4); both stop 1.0 unit short of the (4,4) center.
    fn flanking_pair() -> Vec<Actor> {
        let mut a = actor_at(1, Cell::new(3, 4));
        let mut b = actor_at(2, Cell::new(5, 4));
        a.advance(0.15625, Some(Direction::Right), &open);
        b.advance(0.15625, Some(Direction::Left), &open);
        vec![a, b]
    }

    fn pellet(cell: Cell) -> Pickup {
        Pickup::new(1, cell, PickupKind::Pellet, &MatchConfig::default())
    }

    fn count_claims(bus: &mut EventBus) -> Rc<RefCell<u32>> {
        let claims = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&claims);
        bus.subscribe(EventKind::PickupClaimed, move |_| *sink.borrow_mut() += 1);
        claims
    }

    #[test]
    fn equal_distance_goes_to_trailing_score() {
        let mut bus = EventBus::new();
        let claims = count_claims(&mut bus);
        let mut actors = flanking_pair();
        actors[0].add_points(100);
        actors[1].add_points(50);
        let target = Cell::new(4, 4).center(16.0);
        assert_eq!(actors[0].position_vec().distance(target), 1.0);
        assert_eq!(actors[1].position_vec().distance(target), 1.0);

        let mut pickup = pellet(Cell::new(4, 4));
        let status = pickup.resolve(&mut actors, &mut bus);

        assert_eq!(status, PickupStatus::Claimed { by: 1 });
        assert!(pickup.is_claimed());
        assert_eq!(pickup.claimed_by(), Some(2));
        assert_eq!(actors[1].score(), 60);
        assert_eq!(actors[0].score(), 100);
        assert_eq!(*claims.borrow(), 1);
    }

    #[test]
    fn full_tie_goes_to_first_actor_every_time() {
        for _ in 0..5 {
            let mut bus = EventBus::new();
            let mut actors = flanking_pair();
            let mut pickup = pellet(Cell::new(4, 4));
            assert_eq!(
                pickup.resolve(&mut actors, &mut bus),
                PickupStatus::Claimed { by: 0 }
            );
        }
    }

    #[test]
    fn nearer_actor_beats_lower_score() {
        let mut bus = EventBus::new();
        let mut near = actor_at(1, Cell::new(4, 4));
        near.add_points(500);
        let mut far = actor_at(2, Cell::new(5, 4));
        far.advance(0.15625, Some(Direction::Left), &open);
        let mut actors = vec![far, near];

        let mut pickup = pellet(Cell::new(4, 4));
        assert_eq!(
            pickup.resolve(&mut actors, &mut bus),
            PickupStatus::Claimed { by: 1 }
        );
    }

    #[test]
    fn no_overlap_leaves_pickup_active() {
        let mut bus = EventBus::new();
        let mut actors = vec![actor_at(1, Cell::new(1, 1)), actor_at(2, Cell::new(6, 6))];
        let mut pickup = pellet(Cell::new(4, 4));

        assert_eq!(pickup.resolve(&mut actors, &mut bus), PickupStatus::Active);
        assert!(!pickup.is_claimed());
        assert!(bus.pending().is_empty());
    }

    #[test]
    fn claimed_pickup_retires_on_next_resolve() {
        let mut bus = EventBus::new();
        let claims = count_claims(&mut bus);
        let mut actors = vec![actor_at(1, Cell::new(4, 4))];
        let mut pickup = Pickup::new(
            9,
            Cell::new(4, 4),
            PickupKind::PowerPellet,
            &MatchConfig::default(),
        );

        assert_eq!(
            pickup.resolve(&mut actors, &mut bus),
            PickupStatus::Claimed { by: 0 }
        );
        assert_eq!(pickup.resolve(&mut actors, &mut bus), PickupStatus::Retired);
        assert_eq!(pickup.resolve(&mut actors, &mut bus), PickupStatus::Retired);
        assert_eq!(actors[0].score(), 50);
        assert_eq!(actors[0].stats().power_pellets, 1);
        assert_eq!(*claims.borrow(), 1);
        assert_eq!(
            bus.pending(),
            &[GameEvent::PickupClaimed {
                pickup_id: 9,
                player: 1,
                kind: PickupKind::PowerPellet,
                cell: Cell::new(4, 4),
            }]
        );
    }

    #[test]
    fn eliminated_actors_cannot_claim() {
        let mut bus = EventBus::new();
        let config = MatchConfig {
            starting_lives: 1,
            ..MatchConfig::default()
        };
        let mut out = Actor::new(
            1,
            ControlSchema::arrows(),
            Cell::new(4, 4),
            Direction::Up,
            &config,
        );
        out.take_damage(&mut bus);
        let mut actors = vec![out];
        let mut pickup = pellet(Cell::new(4, 4));

        assert_eq!(pickup.resolve(&mut actors, &mut bus), PickupStatus::Active);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn pickup_is_claimed_at_most_once(
                steps in proptest::collection::vec((0usize..2, 0u8..5), 1..120),
            ) {
                let dirs = [
                    None,
                    Some(Direction::Up),
                    Some(Direction::Down),
                    Some(Direction::Right),
                    Some(Direction::Left),
                ];
                let board = |cell: Cell| (1..8).contains(&cell.x) && (1..8).contains(&cell.y);
                let mut bus = EventBus::new();
                let claims = count_claims(&mut bus);
                let mut actors = vec![actor_at(1, Cell::new(2, 4)), actor_at(2, Cell::new(6, 4))];
                let mut pickup = pellet(Cell::new(4, 4));
                let mut claimed_before = false;

                for (who, dir) in steps {
                    actors[who].advance(1.0 / 60.0, dirs[dir as usize], &board);
                    let status = pickup.resolve(&mut actors, &mut bus);
                    if claimed_before {
                        prop_assert_eq!(status, PickupStatus::Retired);
                    }
                    claimed_before = pickup.is_claimed();
                }

                prop_assert!(*claims.borrow() <= 1);
                prop_assert_eq!(*claims.borrow() == 1, pickup.is_claimed());
            }
        }
    }
}
