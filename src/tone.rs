//! One-shot "hit" beep, clocked by the buzzer timer's overflow interrupt.

use core::sync::atomic::Ordering;

use portable_atomic::AtomicU8;

use crate::config::HIT_TONE_CYCLES;
use crate::peripherals::ToneTimer;

/// Counter modulus producing `tone_hz` from a timer counting at `counter_hz`.
pub const fn tone_modulus(counter_hz: u32, tone_hz: u32) -> u16 {
    let modulus = counter_hz / tone_hz;
    if modulus > u16::MAX as u32 {
        u16::MAX
    } else {
        modulus as u16
    }
}

/// Shared between the paddle interrupt, which starts the beep, and the timer
/// overflow interrupt, which plays it out and then masks itself.
pub struct HitTone {
    modulus: u16,
    /// Overflows seen since the beep started.
    cycles: AtomicU8,
}

impl HitTone {
    pub const fn new(modulus: u16) -> Self {
        Self {
            modulus,
            cycles: AtomicU8::new(0),
        }
    }

    /// (Re)starts the beep. The note itself is programmed on the first overflow.
    pub fn start<T: ToneTimer + ?Sized>(&self, timer: &mut T) {
        self.cycles.store(0, Ordering::Relaxed);
        timer.enable_overflow_interrupt();
    }

    pub fn on_overflow<T: ToneTimer + ?Sized>(&self, timer: &mut T) {
        let cycles = self.cycles.load(Ordering::Relaxed);
        if cycles == 0 {
            timer.set_modulus(self.modulus);
            timer.set_compare(self.modulus / 2);
        }
        if cycles < HIT_TONE_CYCLES {
            self.cycles.store(cycles + 1, Ordering::Relaxed);
        } else {
            timer.set_modulus(0);
            timer.set_compare(0);
            self.cycles.store(0, Ordering::Relaxed);
            timer.disable_overflow_interrupt();
        }
        timer.clear_overflow();
    }
}
