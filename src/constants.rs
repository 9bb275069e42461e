pub const TICK_RATE: u32 = 60;

pub const TILE_SIZE: f32 = 16.0;
pub const ACTOR_SPEED: f32 = 96.0;
pub const ACTOR_HIT_SIZE: f32 = 14.0;
pub const PICKUP_HIT_SIZE: f32 = 4.0;

pub const STARTING_LIVES: u32 = 3;
pub const INVINCIBILITY_SECS: f32 = 2.0;
pub const BONUS_LIFE_THRESHOLD: u64 = 10_000;

pub const PELLET_VALUE: u64 = 10;
pub const POWER_PELLET_VALUE: u64 = 50;

pub const MAX_PLAYERS: usize = 2;

pub fn get_time_limit_secs(minutes: u32) -> f32 {
    minutes.clamp(1, 30) as f32 * 60.0
}
