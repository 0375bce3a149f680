//! Single byte transfers.
//!
//! A write puts the byte on the data lines and pulses the write strobe. A read
//! asserts the read strobe, waits [`READ_SETTLE_CYCLES`], samples and releases.
//! The read settle delay is mandatory: sampling earlier returns whatever was
//! left on the bus.
//!
//! All delays are fixed constants. Callers never pass a delay.

use crate::lines::{LineController, Phase};
use crate::{BusDirection, BusPlatform};

/// Cycles between asserting the read strobe and sampling the data lines.
pub const READ_SETTLE_CYCLES: u32 = 7;

/// Cycles of each settle while a read stream is being armed.
pub const STREAM_SETTLE_CYCLES: u32 = 1;

/// Cycles the reset line is held LOW (2 ms at a 16 MHz reference clock).
pub const RESET_PULSE_CYCLES: u32 = 32_000;

/// Cycles to wait after releasing reset before the first command (5 ms at a
/// 16 MHz reference clock).
pub const RESET_RECOVERY_CYCLES: u32 = 80_000;

/// Byte-wide access to the bus.
pub struct ByteBus<P> {
    lines: LineController<P>,
    direction: BusDirection,
}

impl<P: BusPlatform> ByteBus<P> {
    /// Take ownership of the platform, release every control line and
    /// configure the data lines for writing.
    pub fn new(platform: P) -> Self {
        let mut lines = LineController::new(platform);
        lines
            .platform_mut()
            .configure_bus_direction(BusDirection::Write);
        Self {
            lines,
            direction: BusDirection::Write,
        }
    }

    /// Put `value` on the bus and strobe it in as a command or data byte.
    #[inline]
    pub fn write_byte(&mut self, phase: Phase, value: u8) {
        self.lines.platform_mut().drive_data_bus(value);
        self.lines.pulse_write(phase);
    }

    /// Strobe the byte already on the bus in again.
    #[inline]
    pub fn clock(&mut self, phase: Phase) {
        self.lines.pulse_write(phase);
    }

    /// Read one byte from the controller.
    ///
    /// The bus must already be configured for reading; the read stream in
    /// [`crate::protocol`] guarantees that.
    pub fn read_byte(&mut self) -> u8 {
        debug_assert_eq!(self.direction, BusDirection::Read);
        self.lines.ready_read();
        self.lines
            .platform_mut()
            .delay_cycles(READ_SETTLE_CYCLES);
        let value = self.lines.platform_mut().sample_data_bus();
        self.lines.release_read();
        value
    }

    /// Switch the data lines, skipping the platform call when nothing changes.
    pub fn set_direction(&mut self, direction: BusDirection) {
        if self.direction != direction {
            self.lines
                .platform_mut()
                .configure_bus_direction(direction);
            self.direction = direction;
        }
    }

    /// Current data line direction.
    #[must_use]
    pub fn direction(&self) -> BusDirection {
        self.direction
    }

    /// Busy-wait one of the fixed delays.
    pub(crate) fn delay(&mut self, cycles: u32) {
        self.lines.platform_mut().delay_cycles(cycles);
    }

    /// The control lines.
    pub fn lines(&mut self) -> &mut LineController<P> {
        &mut self.lines
    }

    /// Give the platform back.
    pub fn release(self) -> P {
        self.lines.release()
    }
}
