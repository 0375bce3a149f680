//! Address window state machine.
//!
//! The controller holds an address window: a column range `[x1, x2]` and a row
//! range `[y1, y2]`. Pixel streams start at the upper-left corner. Programming
//! only the start of a range leaves its end register as it was, so a driver that
//! knows the lower-right corner already sits at the panel's far corner can move
//! the upper-left corner alone, at half the bus cost. That is what
//! [`Tft::set_pixel`] does.
//!
//! Nothing is ever read back to confirm what the controller holds. The shadow
//! [`WindowState`] is the only correctness mechanism, so every path that may
//! have left the lower-right corner somewhere else downgrades it.
//!
//! The row end register is programmed only when the full panel window is
//! restored: by [`Tft::init`], and by [`Tft::set_pixel`] when leaving
//! [`WindowState::Unknown`]. [`Tft::set_window`] never narrows it, so moving
//! from [`WindowState::CustomLr`] back to [`WindowState::DefaultLr`] only needs
//! the column end.

use crate::controller::Controller;
use crate::protocol::{Protocol, ReadStream};
use crate::BusPlatform;

/// What the driver knows about the controller's lower-right window corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WindowState {
    /// No assumption (power-up, or after an unmodelled write)
    Unknown,
    /// Column end is the last column and row end is the last row
    DefaultLr,
    /// Column end was last programmed by [`Tft::set_window`]
    CustomLr {
        /// Column end sent to the controller
        x2: u16,
        /// Requested row end; rows are never narrowed on the controller
        y2: u16,
    },
}

/// A TFT controller on the parallel bus, with address window tracking.
///
/// This is the entry point for drawing code. Coordinates are passed through
/// uninterpreted: callers validate them.
///
/// # Type Parameters
///
/// * `P` - The [`BusPlatform`] driving the pins
/// * `C` - The [`Controller`] describing opcodes and panel size
pub struct Tft<P, C> {
    protocol: Protocol<P, C>,
    state: WindowState,
}

impl<P: BusPlatform, C: Controller> Tft<P, C> {
    /// Take ownership of the platform. The window state starts out
    /// [`WindowState::Unknown`].
    pub fn new(platform: P) -> Self {
        Self {
            protocol: Protocol::new(platform),
            state: WindowState::Unknown,
        }
    }

    /// Reset the controller and program the full panel window, row end
    /// included.
    ///
    /// Controller-specific power and pixel format setup goes through
    /// [`Tft::interface`] afterwards; it does not touch the window.
    pub fn init(&mut self) {
        self.protocol.reset_pulse();
        self.restore_full_window();
    }

    /// Program the whole panel as the window, both ends of both ranges.
    fn restore_full_window(&mut self) {
        self.protocol.send_command(C::COLUMN_ADDRESS_SET);
        self.protocol.send_fast(0);
        self.protocol.send_word(C::max_x());
        self.protocol.send_command(C::ROW_ADDRESS_SET);
        self.protocol.send_fast(0);
        self.protocol.send_word(C::max_y());
        self.transition(WindowState::DefaultLr);
    }

    /// Point the window at a single pixel.
    ///
    /// Programs the column range `[x, max_x]` and row range `[y, max_y]`, but
    /// only sends the upper-left corner. If the lower-right corner is not known
    /// to be the panel's far corner it is restored first: the full window from
    /// [`WindowState::Unknown`], the column end alone from
    /// [`WindowState::CustomLr`].
    pub fn set_pixel(&mut self, x: u16, y: u16) {
        match self.state {
            WindowState::DefaultLr => {}
            WindowState::Unknown => self.restore_full_window(),
            WindowState::CustomLr { .. } => self.reset_to_full_width(),
        }
        self.protocol.send_command(C::COLUMN_ADDRESS_SET);
        self.protocol.send_word(x);
        self.protocol.send_command(C::ROW_ADDRESS_SET);
        self.protocol.send_word(y);
    }

    /// Move the window's upper-left corner to the origin.
    pub fn home(&mut self) {
        self.set_pixel(0, 0);
    }

    /// Program the window `[x1, x2]` x `[y1, ..]`.
    ///
    /// Sends the full column range and the row start. The row end stays at the
    /// panel's last row; streaming exactly `(x2 - x1 + 1) * (y2 - y1 + 1)` words
    /// fills the requested rectangle. Input coordinates are assumed sorted.
    pub fn set_window(&mut self, x1: u16, y1: u16, x2: u16, y2: u16) {
        self.protocol.send_command(C::COLUMN_ADDRESS_SET);
        self.protocol.send_word(x1);
        self.protocol.send_word(x2);
        self.protocol.send_command(C::ROW_ADDRESS_SET);
        self.protocol.send_word(y1);
        self.transition(WindowState::CustomLr { x2, y2 });
    }

    /// Restore the column range to the full panel width and the row start to 0.
    ///
    /// Always sends, whatever the current state. The row end is left alone:
    /// only [`Tft::init`] and the first [`Tft::set_pixel`] after
    /// [`WindowState::Unknown`] program it.
    pub fn reset_to_full_width(&mut self) {
        self.protocol.send_command(C::COLUMN_ADDRESS_SET);
        self.protocol.send_fast(0);
        self.protocol.send_word(C::max_x());
        self.protocol.send_command(C::ROW_ADDRESS_SET);
        self.protocol.send_fast(0);
        self.transition(WindowState::DefaultLr);
    }

    /// Start a pixel write stream at the window's upper-left corner.
    pub fn begin_pixel_stream(&mut self) {
        self.protocol.begin_pixel_stream();
    }

    /// Send one pixel word.
    pub fn send_pixel_word(&mut self, color: u16) {
        self.protocol.send_pixel_word(color);
    }

    /// Send many pixel words.
    pub fn send_pixels<I>(&mut self, colors: I)
    where
        I: IntoIterator<Item = u16>,
    {
        self.protocol.send_pixels(colors);
    }

    /// Send `count` copies of one pixel word.
    pub fn fill_pixels(&mut self, color: u16, count: u32) {
        self.protocol.fill_pixels(color, count);
    }

    /// Start reading pixel data from the window's upper-left corner.
    pub fn begin_read_stream(&mut self) -> ReadStream<'_, P, C> {
        self.protocol.begin_read_stream()
    }
}

impl<P: BusPlatform, C> Tft<P, C> {
    /// What the driver currently assumes about the window.
    #[must_use]
    pub fn window_state(&self) -> WindowState {
        self.state
    }

    /// Forget what the controller's window holds.
    ///
    /// Call after anything else has written to the controller.
    pub fn invalidate(&mut self) {
        self.transition(WindowState::Unknown);
    }

    /// Raw protocol access for commands this type does not model.
    ///
    /// The window state is downgraded to [`WindowState::Unknown`], so the next
    /// [`Tft::set_pixel`] reprograms the lower-right corner.
    pub fn interface(&mut self) -> &mut Protocol<P, C> {
        self.invalidate();
        &mut self.protocol
    }

    /// Release chip select at the end of a burst.
    pub fn deselect(&mut self) {
        self.protocol.deselect();
    }

    /// Give the platform back.
    pub fn release(self) -> P {
        self.protocol.release()
    }

    fn transition(&mut self, next: WindowState) {
        if self.state != next {
            trace!("window {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}

impl<P, C> core::fmt::Debug for Tft<P, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tft")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "defmt")]
impl<P, C: Controller> defmt::Format for Tft<P, C> {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Tft<{}x{}> state: {}", C::WIDTH, C::HEIGHT, self.state);
    }
}
