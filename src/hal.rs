//! `embedded-hal` platform.
//!
//! [`PinBus`] drives the five control lines through [`OutputPin`]s and
//! busy-waits through a [`DelayNs`]. The eight data lines are usually one GPIO
//! port written in a single register access, which `embedded-hal` has no trait
//! for, so they go through the small [`DataPort`] trait instead.
//!
//! ## Example
//!
//! ```rust,ignore
//! use tft8080::hal::PinBus;
//! use tft8080::{controller::Ili9341, window::Tft};
//!
//! // 62 ns per delay cycle, matching a 16 MHz reference clock
//! let bus = PinBus::new(port, cs, cd, wr, rd, rst, delay, 62);
//! let mut tft = Tft::<_, Ili9341>::new(bus);
//! tft.init();
//! ```

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{OutputPin, PinState};

use crate::{BusDirection, BusPlatform, ControlLine};

/// The eight data lines.
pub trait DataPort {
    /// Drive `value` onto D0..D7, D0 being the least significant bit.
    fn write(&mut self, value: u8);

    /// Sample D0..D7.
    fn read(&mut self) -> u8;

    /// Switch the pins between output and input.
    fn set_direction(&mut self, direction: BusDirection);
}

impl<T: DataPort + ?Sized> DataPort for &mut T {
    fn write(&mut self, value: u8) {
        (**self).write(value);
    }

    fn read(&mut self) -> u8 {
        (**self).read()
    }

    fn set_direction(&mut self, direction: BusDirection) {
        (**self).set_direction(direction);
    }
}

/// [`BusPlatform`] over `embedded-hal` pins.
///
/// # Type Parameters
///
/// * `PORT` - The data lines
/// * `CS`, `CD`, `WR`, `RD`, `RST` - The control line pins
/// * `D` - Delay provider
pub struct PinBus<PORT, CS, CD, WR, RD, RST, D> {
    port: PORT,
    cs: CS,
    cd: CD,
    wr: WR,
    rd: RD,
    rst: RST,
    delay: D,
    cycle_ns: u32,
}

impl<PORT, CS, CD, WR, RD, RST, D> PinBus<PORT, CS, CD, WR, RD, RST, D> {
    /// Collect the pins.
    ///
    /// `cycle_ns` is the length of one delay cycle in nanoseconds.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        port: PORT,
        cs: CS,
        cd: CD,
        wr: WR,
        rd: RD,
        rst: RST,
        delay: D,
        cycle_ns: u32,
    ) -> Self {
        Self {
            port,
            cs,
            cd,
            wr,
            rd,
            rst,
            delay,
            cycle_ns,
        }
    }

    /// Give the pins back.
    pub fn release(self) -> (PORT, CS, CD, WR, RD, RST, D) {
        (
            self.port, self.cs, self.cd, self.wr, self.rd, self.rst, self.delay,
        )
    }
}

impl<PORT, CS, CD, WR, RD, RST, D> BusPlatform for PinBus<PORT, CS, CD, WR, RD, RST, D>
where
    PORT: DataPort,
    CS: OutputPin<Error = Infallible>,
    CD: OutputPin<Error = Infallible>,
    WR: OutputPin<Error = Infallible>,
    RD: OutputPin<Error = Infallible>,
    RST: OutputPin<Error = Infallible>,
    D: DelayNs,
{
    #[inline]
    fn drive_data_bus(&mut self, value: u8) {
        self.port.write(value);
    }

    #[inline]
    fn sample_data_bus(&mut self) -> u8 {
        self.port.read()
    }

    #[inline]
    fn set_control_line(&mut self, line: ControlLine, level: PinState) {
        let Ok(()) = match line {
            ControlLine::ChipSelect => self.cs.set_state(level),
            ControlLine::CommandData => self.cd.set_state(level),
            ControlLine::WriteStrobe => self.wr.set_state(level),
            ControlLine::ReadStrobe => self.rd.set_state(level),
            ControlLine::Reset => self.rst.set_state(level),
        };
    }

    fn configure_bus_direction(&mut self, direction: BusDirection) {
        self.port.set_direction(direction);
    }

    fn delay_cycles(&mut self, cycles: u32) {
        self.delay.delay_ns(cycles.saturating_mul(self.cycle_ns));
    }
}
