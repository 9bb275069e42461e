#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Invincible, or already out of lives.
    Ignored,
    LifeLost { remaining: u32 },
    Eliminated,
}

/// Lives, score and the post-hit invincibility window.
#[derive(Clone, Debug, PartialEq)]
pub struct Vitality {
    score: u64,
    lives: u32,
    invincible_secs: f32,
    bonus_life_awarded: bool,
    lives_lost: u32,
}

impl Vitality {
    pub fn new(lives: u32) -> Self {
        Self {
            score: 0,
            lives,
            invincible_secs: 0.0,
            bonus_life_awarded: false,
            lives_lost: 0,
        }
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn invincible_secs(&self) -> f32 {
        self.invincible_secs
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible_secs > 0.0
    }

    pub fn bonus_life_awarded(&self) -> bool {
        self.bonus_life_awarded
    }

    pub fn lives_lost(&self) -> u32 {
        self.lives_lost
    }

    /// Returns `true` when this call granted the one-time bonus life.
    pub fn add_points(&mut self, amount: u64, bonus_threshold: u64) -> bool {
        self.score = self.score.saturating_add(amount);
        if !self.bonus_life_awarded && self.score >= bonus_threshold {
            self.lives += 1;
            self.bonus_life_awarded = true;
            return true;
        }
        false
    }

    pub fn take_damage(&mut self, invincibility_secs: f32) -> DamageOutcome {
        if self.is_invincible() || self.lives == 0 {
            return DamageOutcome::Ignored;
        }
        self.lives -= 1;
        self.lives_lost += 1;
        self.invincible_secs = invincibility_secs.max(0.0);
        if self.lives == 0 {
            DamageOutcome::Eliminated
        } else {
            DamageOutcome::LifeLost {
                remaining: self.lives,
            }
        }
    }

    pub fn tick(&mut self, dt: f32) {
        self.invincible_secs = (self.invincible_secs - dt.max(0.0)).max(0.0);
    }
}
