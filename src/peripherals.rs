//! Capabilities the game consumes from the board support code.
//!
//! The firmware binary implements these on RP2040 peripherals; tests
//! implement them with recording fakes.

use crate::board::Player;
use crate::error::Result;

/// An edge-triggered push button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    Paddle(Player),
    Serve,
}

impl Button {
    pub const ALL: [Button; 3] = [
        Button::Paddle(Player::One),
        Button::Paddle(Player::Two),
        Button::Serve,
    ];

    pub const fn index(self) -> usize {
        match self {
            Button::Paddle(Player::One) => 0,
            Button::Paddle(Player::Two) => 1,
            Button::Serve => 2,
        }
    }
}

/// Per-button interrupt masking.
///
/// Arming is the only thing that lets an interrupt handler touch the match,
/// so callers must keep exactly the live side armed. Arming discards any edge
/// that was latched while the button was disarmed. Buttons fire on the
/// falling edge.
pub trait ButtonIrq {
    fn arm(&mut self, button: Button);
    fn disarm(&mut self, button: Button);
}

/// Millisecond counter relative to the last reset. May wrap.
pub trait ElapsedTime {
    fn reset_time(&mut self);
    fn get_time(&self) -> u32;
}

/// The timer channel wired to the buzzer.
pub trait ToneTimer {
    fn enable_overflow_interrupt(&mut self);
    fn disable_overflow_interrupt(&mut self);
    fn clear_overflow(&mut self);
    fn set_modulus(&mut self, modulus: u16);
    fn set_compare(&mut self, compare: u16);
}

/// A character display addressed by its internal DDRAM address.
pub trait CharDisplay {
    fn write_string(&mut self, address: u8, text: &[u8]) -> Result<()>;
}
