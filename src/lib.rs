//! Two-player tennis on an RP2040: a 128x64 SSD1306 court, three push
//! buttons, a buzzer and a 16x2 character LCD for the score.
//!
//! Everything hardware specific sits behind the traits in [`peripherals`],
//! so the game logic builds and tests on the host.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod animation;
pub mod animation_checkerboard;
pub mod animation_fireworks;
pub mod board;
pub mod config;
pub mod display;
pub mod error;
pub mod game;
pub mod glyph;
pub mod global_state;
pub mod lcd;
pub mod peripherals;
pub mod render;
pub mod scheduler;
pub mod scoreboard;
pub mod tone;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
