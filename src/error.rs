use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// An I2C transfer to the OLED was not acknowledged, even after retrying.
    #[error("display bus transfer failed")]
    Bus,
    /// A GPIO line driving the character LCD could not be written.
    #[error("character display pin write failed")]
    Pin,
    /// A score update was requested for a point nobody won.
    #[error("score update without a winner")]
    NoWinner,
    /// Shared state was accessed before it was installed.
    #[error("shared state not installed")]
    Uninitialized,
}

pub type Result<T> = core::result::Result<T, Error>;
