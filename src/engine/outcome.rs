use super::*;
use crate::types::{GameSummary, ScoreEntry};

impl<B: Walkable> MatchEngine<B> {
    pub(super) fn check_game_over(&mut self) {
        let reason = if self.is_eliminated() {
            Some(GameOverReason::Elimination)
        } else if self.initial_pickups > 0 && self.remaining_pickups() == 0 {
            Some(GameOverReason::BoardCleared)
        } else if self
            .config
            .time_limit_secs
            .is_some_and(|limit| self.elapsed_secs >= limit)
        {
            Some(GameOverReason::Timeout)
        } else {
            None
        };

        if let Some(reason) = reason {
            self.ended = true;
            self.end_reason = Some(reason);
            log::info!(
                "match over after {} ticks: {:?}, winner {:?}",
                self.tick_counter,
                reason,
                self.winner()
            );
        }
    }

    fn is_eliminated(&self) -> bool {
        let active = self.actors.iter().filter(|a| a.is_active()).count();
        match self.actors.len() {
            0 => false,
            1 => active == 0,
            _ => active <= 1,
        }
    }

    /// Survivor on elimination, otherwise the unique top score.
    pub fn winner(&self) -> Option<u8> {
        if self.end_reason == Some(GameOverReason::Elimination) {
            let mut survivors = self.actors.iter().filter(|a| a.is_active());
            return match (survivors.next(), survivors.next()) {
                (Some(actor), None) => Some(actor.number()),
                _ => None,
            };
        }

        let best = self.actors.iter().map(Actor::score).max()?;
        let mut leaders = self.actors.iter().filter(|a| a.score() == best);
        match (leaders.next(), leaders.next()) {
            (Some(actor), None) => Some(actor.number()),
            _ => None,
        }
    }

    pub fn build_summary(&self) -> GameSummary {
        let mut ranking: Vec<ScoreEntry> = self
            .actors
            .iter()
            .map(|actor| ScoreEntry {
                player: actor.number(),
                score: actor.score(),
                lives: actor.lives(),
                pellets: actor.stats().pellets,
                power_pellets: actor.stats().power_pellets,
                lives_lost: actor.lives_lost(),
            })
            .collect();
        ranking.sort_by(|a, b| b.score.cmp(&a.score).then(a.player.cmp(&b.player)));

        GameSummary {
            reason: self.end_reason,
            duration_secs: self.elapsed_secs,
            ticks: self.tick_counter,
            winner: self.winner(),
            ranking,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(_: Cell) -> bool {
        true
    }

    fn duel(config: MatchConfig) -> MatchEngine<fn(Cell) -> bool> {
        let seats = vec![
            Seat::new(ControlSchema::arrows(), Cell::new(1, 1)),
            Seat::new(ControlSchema::wasd(), Cell::new(8, 8)),
        ];
        MatchEngine::new(
            config,
            open as fn(Cell) -> bool,
            seats,
            &[(Cell::new(4, 4), PickupKind::Pellet)],
        )
    }

    #[test]
    fn ranking_orders_by_score_then_player() {
        let mut engine = duel(MatchConfig::default());
        engine.add_points(1, 300);
        let summary = engine.build_summary();
        assert_eq!(summary.reason, None);
        assert_eq!(summary.winner, Some(2));
        assert_eq!(
            summary.ranking.iter().map(|e| e.player).collect::<Vec<_>>(),
            vec![2, 1]
        );
    }

    #[test]
    fn tied_scores_have_no_winner() {
        let mut engine = duel(MatchConfig::default());
        engine.add_points(0, 40);
        engine.add_points(1, 40);
        assert_eq!(engine.winner(), None);
    }

    #[test]
    fn simultaneous_elimination_has_no_survivor() {
        let config = MatchConfig {
            starting_lives: 1,
            ..MatchConfig::default()
        };
        let mut engine = duel(config);
        engine.add_points(0, 500);
        engine.damage_actor(0);
        engine.damage_actor(1);
        engine.step(1.0 / 60.0, &InputState::new());

        assert_eq!(engine.end_reason(), Some(GameOverReason::Elimination));
        assert_eq!(engine.winner(), None);
    }

    #[test]
    fn solo_match_ends_only_when_the_actor_is_out() {
        let config = MatchConfig {
            starting_lives: 2,
            ..MatchConfig::default()
        };
        let seats = vec![Seat::new(ControlSchema::arrows(), Cell::new(1, 1))];
        let mut engine = MatchEngine::new(
            config,
            open as fn(Cell) -> bool,
            seats,
            &[(Cell::new(4, 4), PickupKind::Pellet)],
        );
        let idle = InputState::new();

        engine.damage_actor(0);
        engine.step(2.5, &idle);
        assert!(!engine.is_ended());

        engine.damage_actor(0);
        engine.step(1.0 / 60.0, &idle);
        assert_eq!(engine.end_reason(), Some(GameOverReason::Elimination));
    }

    #[test]
    fn solo_elimination_has_no_winner() {
        let config = MatchConfig {
            starting_lives: 1,
            ..MatchConfig::default()
        };
        let seats = vec![Seat::new(ControlSchema::arrows(), Cell::new(1, 1))];
        let mut engine = MatchEngine::new(
            config,
            open as fn(Cell) -> bool,
            seats,
            &[(Cell::new(4, 4), PickupKind::Pellet)],
        );
        engine.add_points(0, 90);
        engine.damage_actor(0);
        engine.step(1.0 / 60.0, &InputState::new());

        assert_eq!(engine.end_reason(), Some(GameOverReason::Elimination));
        assert_eq!(engine.winner(), None);
        assert_eq!(engine.build_summary().winner, None);
    }

    #[test]
    fn empty_board_never_counts_as_cleared() {
        let seats = vec![Seat::new(ControlSchema::arrows(), Cell::new(1, 1))];
        let mut engine = MatchEngine::new(
            MatchConfig::default(),
            open as fn(Cell) -> bool,
            seats,
            &[],
        );
        engine.step(1.0 / 60.0, &InputState::new());
        assert!(!engine.is_ended());
    }
}
