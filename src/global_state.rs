use core::cell::RefCell;

use critical_section::Mutex;

use crate::game::Match;

/// A value shared between the main loop and interrupt handlers. Every access
/// runs inside a critical section, so handlers never see a half-applied
/// update.
pub struct IrqCell<T> {
    inner: Mutex<RefCell<Option<T>>>,
}

impl<T> IrqCell<T> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    pub fn install(&self, value: T) {
        critical_section::with(|cs| {
            self.inner.borrow(cs).replace(Some(value));
        });
    }

    /// Runs `f` on the value with interrupts masked. Returns `None` if nothing
    /// has been installed yet.
    pub fn with<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).as_mut().map(f))
    }
}

impl<T> Default for IrqCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the button interrupt needs: the match and the means to re-mask
/// its own sources.
pub struct SharedState<B> {
    pub game: Match,
    pub buttons: B,
}

impl<B> SharedState<B> {
    pub const fn new(game: Match, buttons: B) -> Self {
        Self { game, buttons }
    }
}
