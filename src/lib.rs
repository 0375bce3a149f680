//! Bus protocol and address-window tracking for TFT display controllers on an
//! 8080-style parallel bus.
//!
//! ## How an 8080 Parallel Bus Works
//!
//! Small TFT controllers (ILI9341, ILI932x and friends) are commonly wired to a
//! microcontroller with eight shared data lines and a handful of active-LOW
//! control lines. Nothing about the bus is clocked by hardware: every transfer
//! is produced by the driver toggling pins in the right order.
//!
//! ### Signal names
//! - **D0..D7** – Shared data lines, driven by the MCU for writes and by the controller for reads
//! - **CS** – Chip select; the controller ignores the bus while CS is HIGH
//! - **CD (RS/DC)** – Command/data select: LOW marks the byte as a command opcode, HIGH as a parameter or pixel byte
//! - **WR** – Write strobe; the controller latches the data lines on the rising edge
//! - **RD** – Read strobe; the controller drives the data lines while RD is LOW
//! - **RST** – Hardware reset, held HIGH during normal operation
//!
//! ### Write transaction
//! 1. Put the byte on D0..D7.
//! 2. Set CD for command or data, with CS LOW.
//! 3. Pull WR LOW, then release it HIGH. The rising edge latches the byte.
//!
//! Control lines other than the strobe must be stable **before** the strobe is
//! asserted, and the strobe must be released **before** any of them change for
//! the next transfer. [`ControlLines::changes_to`] produces exactly that order.
//!
//! ### Read transaction
//! The MCU must first stop driving the data lines ([`BusDirection::Read`]).
//! Pulling RD LOW makes the controller drive the bus; the value is only valid
//! after a fixed settle time ([`transfer::READ_SETTLE_CYCLES`]).
//!
//! ### Address window
//! Pixel data is streamed after a memory-write command. The controller keeps an
//! internal address window (a column range and a row range) and auto-increments
//! its write pointer across it, so a rectangle fill is one window setup followed
//! by `width * height` colour words.
//!
//! Reprogramming the window costs bus transactions. Drawing single pixels only
//! needs the upper-left corner moved, provided the lower-right corner is already
//! at the panel's far corner. [`window::Tft`] keeps a shadow of what it last
//! programmed and skips the lower-right bound whenever it can prove it is
//! unchanged.
//!
//! ## Layers
//!
//! 1. [`lines`] – Control line patterns and glitch-free transitions
//! 2. [`transfer`] – Single byte writes and timed reads
//! 3. [`protocol`] – Commands, parameter pairs, pixel and read streams
//! 4. [`window`] – Address window state machine; the type drawing code uses
//!
//! [`graphics`] makes [`window::Tft`] an `embedded-graphics` draw target, and
//! [`interface`] lets `display-interface` drivers send their own commands
//! through [`protocol::Protocol`].
//!
//! The hardware itself is reached only through [`BusPlatform`]. Implement it
//! for your board, or use [`hal::PinBus`] with `embedded-hal` pins.
//!
//! ## Example
//! ```rust
//! use tft8080::controller::Ili9341;
//! use tft8080::window::Tft;
//! use tft8080::{BusDirection, BusPlatform, ControlLine};
//! use embedded_hal::digital::PinState;
//!
//! # struct Board;
//! # impl BusPlatform for Board {
//! #     fn drive_data_bus(&mut self, _value: u8) {}
//! #     fn sample_data_bus(&mut self) -> u8 { 0 }
//! #     fn set_control_line(&mut self, _line: ControlLine, _level: PinState) {}
//! #     fn configure_bus_direction(&mut self, _direction: BusDirection) {}
//! #     fn delay_cycles(&mut self, _cycles: u32) {}
//! # }
//! let mut tft = Tft::<_, Ili9341>::new(Board);
//! tft.init();
//!
//! // A 41x41 red square at (10, 20)
//! tft.set_window(10, 20, 50, 60);
//! tft.begin_pixel_stream();
//! tft.fill_pixels(0xF800, 41 * 41);
//!
//! // Single pixels only move the upper-left corner
//! tft.set_pixel(0, 0);
//! tft.begin_pixel_stream();
//! tft.send_pixel_word(0xFFFF);
//! tft.deselect();
//! ```
//!
//! ## Available Feature Flags
//!
//! ### `defmt` Feature
//! Implements `defmt::Format` for the public types and routes the crate's
//! internal trace/debug messages to `defmt`.
//!
//! ### `log` Feature
//! Routes the crate's internal trace/debug messages (window state changes,
//! resets, read streams) to the `log` facade.
#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

#[macro_use]
mod fmt;

pub mod controller;
pub mod graphics;
pub mod hal;
pub mod interface;
pub mod lines;
pub mod protocol;
pub mod transfer;
pub mod window;

#[cfg(test)]
mod mock;

use embedded_hal::digital::PinState;

pub use lines::{ControlLine, ControlLines};

/// Which side drives the shared data lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusDirection {
    /// The MCU drives the data lines (power-up state)
    #[default]
    Write,
    /// The display controller drives the data lines
    Read,
}

/// Platform abstraction over the physical bus.
///
/// This is the only seam between the protocol and a microcontroller family. It
/// maps logical signal names to pins or port registers. None of these
/// operations can fail: the protocol trusts correct wiring.
///
/// If another peripheral shares the bus lines (a touch controller on the same
/// port, for example) its chip select must be released by the caller before any
/// operation of this crate runs.
pub trait BusPlatform {
    /// Place `value` on the data lines.
    fn drive_data_bus(&mut self, value: u8);

    /// Read the data lines.
    fn sample_data_bus(&mut self) -> u8;

    /// Drive a single control line.
    fn set_control_line(&mut self, line: ControlLine, level: PinState);

    /// Switch the data lines between output and input.
    fn configure_bus_direction(&mut self, direction: BusDirection);

    /// Busy-wait for a fixed number of CPU cycles.
    fn delay_cycles(&mut self, cycles: u32);

    /// Move the control lines from the `from` pattern to the `to` pattern.
    ///
    /// The default drives only the lines that differ, one at a time, in the
    /// order given by [`ControlLines::changes_to`]. Platforms whose control
    /// lines share one port register can override this to write the whole
    /// pattern at once.
    fn apply_control_lines(&mut self, from: ControlLines, to: ControlLines) {
        for (line, level) in from.changes_to(to) {
            self.set_control_line(line, level);
        }
    }
}

impl<T: BusPlatform + ?Sized> BusPlatform for &mut T {
    #[inline]
    fn drive_data_bus(&mut self, value: u8) {
        T::drive_data_bus(self, value);
    }

    #[inline]
    fn sample_data_bus(&mut self) -> u8 {
        T::sample_data_bus(self)
    }

    #[inline]
    fn set_control_line(&mut self, line: ControlLine, level: PinState) {
        T::set_control_line(self, line, level);
    }

    #[inline]
    fn configure_bus_direction(&mut self, direction: BusDirection) {
        T::configure_bus_direction(self, direction);
    }

    #[inline]
    fn delay_cycles(&mut self, cycles: u32) {
        T::delay_cycles(self, cycles);
    }

    #[inline]
    fn apply_control_lines(&mut self, from: ControlLines, to: ControlLines) {
        T::apply_control_lines(self, from, to);
    }
}

/// Splits a 16-bit word into the byte pair sent on the bus, high byte first.
#[must_use]
pub const fn word_bytes(word: u16) -> (u8, u8) {
    ((word >> 8) as u8, word as u8)
}
