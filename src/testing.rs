//! Recording stand-ins for the peripherals, shared by the unit tests.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{self, ErrorKind, NoAcknowledgeSource, Operation};

use crate::error::{Error, Result};
use crate::peripherals::{Button, ButtonIrq, CharDisplay, ElapsedTime, ToneTimer};

#[derive(Debug, Default)]
pub struct FakeButtons {
    armed: [bool; 3],
    pub log: Vec<(Button, bool)>,
}

impl FakeButtons {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self, button: Button) -> bool {
        self.armed[button.index()]
    }
}

impl ButtonIrq for FakeButtons {
    fn arm(&mut self, button: Button) {
        self.armed[button.index()] = true;
        self.log.push((button, true));
    }

    fn disarm(&mut self, button: Button) {
        self.armed[button.index()] = false;
        self.log.push((button, false));
    }
}

/// One I2C transaction: target address and every written byte, concatenated.
pub type Transfer = (u8, Vec<u8>);

/// I2C bus that records writes. Failures can be injected per transaction.
#[derive(Clone, Default)]
pub struct FakeBus {
    pub transfers: Rc<RefCell<Vec<Transfer>>>,
    /// Number of upcoming transactions that will be NACKed.
    pub failures: Rc<Cell<usize>>,
}

impl FakeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, count: usize) {
        self.failures.set(count);
    }

    pub fn take(&self) -> Vec<Transfer> {
        self.transfers.take()
    }
}

impl i2c::ErrorType for FakeBus {
    type Error = ErrorKind;
}

impl i2c::I2c for FakeBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> core::result::Result<(), Self::Error> {
        if self.failures.get() > 0 {
            self.failures.set(self.failures.get() - 1);
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        let mut bytes = Vec::new();
        for op in operations.iter() {
            if let Operation::Write(data) = op {
                bytes.extend_from_slice(data);
            }
        }
        self.transfers.borrow_mut().push((address, bytes));
        Ok(())
    }
}

/// Clock driven by the test through a shared counter. Clones share the
/// reference point too, so a reset by the code under test is visible to
/// the test.
#[derive(Clone, Default)]
pub struct FakeClock {
    pub now: Rc<Cell<u32>>,
    origin: Rc<Cell<u32>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }
}

impl ElapsedTime for FakeClock {
    fn reset_time(&mut self) {
        self.origin.set(self.now.get());
    }

    fn get_time(&self) -> u32 {
        self.now.get().wrapping_sub(self.origin.get())
    }
}

/// Delay that returns at once and remembers how long it was asked to wait.
#[derive(Clone, Default)]
pub struct NoDelay {
    pub waited_ns: Rc<Cell<u64>>,
}

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.waited_ns.set(self.waited_ns.get() + u64::from(ns));
    }
}

/// Recording LCD. Setting `broken` makes every write fail like a dead pin.
#[derive(Clone, Default)]
pub struct FakeLcd {
    pub writes: Rc<RefCell<Vec<(u8, Vec<u8>)>>>,
    pub broken: Rc<Cell<bool>>,
}

impl CharDisplay for FakeLcd {
    fn write_string(&mut self, address: u8, text: &[u8]) -> Result<()> {
        if self.broken.get() {
            return Err(Error::Pin);
        }
        self.writes.borrow_mut().push((address, text.to_vec()));
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneOp {
    Enable,
    Disable,
    Clear,
    Modulus(u16),
    Compare(u16),
}

#[derive(Debug, Default)]
pub struct FakeTone {
    pub ops: Vec<ToneOp>,
    pub enabled: bool,
}

impl ToneTimer for FakeTone {
    fn enable_overflow_interrupt(&mut self) {
        self.enabled = true;
        self.ops.push(ToneOp::Enable);
    }

    fn disable_overflow_interrupt(&mut self) {
        self.enabled = false;
        self.ops.push(ToneOp::Disable);
    }

    fn clear_overflow(&mut self) {
        self.ops.push(ToneOp::Clear);
    }

    fn set_modulus(&mut self, modulus: u16) {
        self.ops.push(ToneOp::Modulus(modulus));
    }

    fn set_compare(&mut self, compare: u16) {
        self.ops.push(ToneOp::Compare(compare));
    }
}
