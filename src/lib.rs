pub mod actor;
pub mod board;
pub mod config;
pub mod constants;
pub mod control;
pub mod engine;
pub mod error;
pub mod events;
pub mod pickup;
pub mod types;
