//! Command and data transactions.
//!
//! Commands are single opcode bytes strobed with CD LOW. Parameters and pixel
//! words follow as data bytes, 16-bit values high byte first. After
//! [`Protocol::begin_pixel_stream`] any number of pixel words may follow: the
//! controller advances its write pointer through the programmed window on its
//! own.
//!
//! Reading pixel data needs the bus turned around. [`Protocol::begin_read_stream`]
//! returns a [`ReadStream`] guard which is the only way to read, and which
//! hands the bus back to the MCU when it ends or is dropped.

use core::marker::PhantomData;

use crate::controller::Controller;
use crate::lines::Phase;
use crate::transfer::{ByteBus, RESET_PULSE_CYCLES, RESET_RECOVERY_CYCLES, STREAM_SETTLE_CYCLES};
use crate::{word_bytes, BusDirection, BusPlatform};

/// Transaction layer for a controller of type `C`.
pub struct Protocol<P, C> {
    bus: ByteBus<P>,
    _controller: PhantomData<C>,
}

impl<P: BusPlatform, C: Controller> Protocol<P, C> {
    /// Take ownership of the platform. All lines are released and the data bus
    /// is configured for writing.
    pub fn new(platform: P) -> Self {
        Self {
            bus: ByteBus::new(platform),
            _controller: PhantomData,
        }
    }

    /// Send a command opcode.
    #[inline]
    pub fn send_command(&mut self, opcode: u8) {
        self.bus.write_byte(Phase::Command, opcode);
    }

    /// Send a command followed by its parameter bytes.
    pub fn send_command_with(&mut self, opcode: u8, params: &[u8]) {
        self.send_command(opcode);
        for &param in params {
            self.send_data_byte(param);
        }
    }

    /// Send one data byte.
    #[inline]
    pub fn send_data_byte(&mut self, value: u8) {
        self.bus.write_byte(Phase::Data, value);
    }

    /// Send two data bytes.
    #[inline]
    pub fn send_data_pair(&mut self, hi: u8, lo: u8) {
        self.send_data_byte(hi);
        self.send_data_byte(lo);
    }

    /// Send one byte clocked in twice, as a single drive of the bus.
    ///
    /// Latches the same bytes as `send_data_pair(value, value)`.
    #[inline]
    pub fn send_fast(&mut self, value: u8) {
        self.bus.write_byte(Phase::Data, value);
        self.bus.clock(Phase::Data);
    }

    /// Send a 16-bit parameter, high byte first.
    #[inline]
    pub fn send_word(&mut self, word: u16) {
        let (hi, lo) = word_bytes(word);
        self.send_data_pair(hi, lo);
    }

    /// Send one pixel word. Always exactly two byte transfers, high then low.
    #[inline]
    pub fn send_pixel_word(&mut self, color: u16) {
        self.send_word(color);
    }

    /// Start a pixel write stream at the window's upper-left corner.
    pub fn begin_pixel_stream(&mut self) {
        self.send_command(C::MEMORY_WRITE);
    }

    /// Stream arbitrary pixel words.
    pub fn send_pixels<I>(&mut self, colors: I)
    where
        I: IntoIterator<Item = u16>,
    {
        for color in colors {
            self.send_pixel_word(color);
        }
    }

    /// Stream `count` copies of `color`.
    ///
    /// When both bytes of the colour are equal the bus is driven once and only
    /// the write strobe is clocked; otherwise each pixel is a byte pair.
    pub fn fill_pixels(&mut self, color: u16, count: u32) {
        if count == 0 {
            return;
        }
        let (hi, lo) = word_bytes(color);
        if hi == lo {
            self.send_fast(hi);
            self.clock_pixels(count - 1);
        } else {
            for _ in 0..count {
                self.send_data_pair(hi, lo);
            }
        }
    }

    /// Clock `pixels` more words made of the byte already on the bus.
    fn clock_pixels(&mut self, pixels: u32) {
        let mut remaining = pixels;
        while remaining >= 8 {
            for _ in 0..16 {
                self.bus.clock(Phase::Data);
            }
            remaining -= 8;
        }
        for _ in 0..remaining * 2 {
            self.bus.clock(Phase::Data);
        }
    }

    /// Start reading pixel data from the window's upper-left corner.
    ///
    /// Sends the memory-read command, hands the data lines to the controller,
    /// strobes the dummy read the controller requires and waits
    /// [`STREAM_SETTLE_CYCLES`] twice before the first real read.
    pub fn begin_read_stream(&mut self) -> ReadStream<'_, P, C> {
        trace!("begin read stream");
        self.send_command(C::MEMORY_READ);
        self.bus.set_direction(BusDirection::Read);
        let lines = self.bus.lines();
        lines.ready_read();
        lines.release_read();
        self.bus.delay(STREAM_SETTLE_CYCLES);
        self.bus.lines().ready_read();
        self.bus.delay(STREAM_SETTLE_CYCLES);
        ReadStream { protocol: self }
    }

    /// Pulse the reset line and wait for the controller to come back.
    pub fn reset_pulse(&mut self) {
        debug!("hardware reset");
        self.bus.lines().assert_reset();
        self.bus.delay(RESET_PULSE_CYCLES);
        self.bus.lines().deselect();
        self.bus.delay(RESET_RECOVERY_CYCLES);
    }
}

impl<P: BusPlatform, C> Protocol<P, C> {
    /// Release chip select at the end of a burst.
    pub fn deselect(&mut self) {
        self.bus.lines().deselect();
    }

    /// Current data line direction.
    #[must_use]
    pub fn direction(&self) -> BusDirection {
        self.bus.direction()
    }

    /// Exclusive access to the platform.
    pub fn platform_mut(&mut self) -> &mut P {
        self.bus.lines().platform_mut()
    }

    /// Give the platform back.
    pub fn release(self) -> P {
        self.bus.release()
    }

    fn end_read_stream(&mut self) {
        self.bus.lines().release_read();
        self.bus.set_direction(BusDirection::Write);
        trace!("end read stream");
    }
}

/// An open read stream.
///
/// Returned by [`Protocol::begin_read_stream`]. Ending or dropping it returns
/// the data lines to the MCU.
pub struct ReadStream<'a, P: BusPlatform, C> {
    protocol: &'a mut Protocol<P, C>,
}

impl<P: BusPlatform, C> ReadStream<'_, P, C> {
    /// Read one byte.
    pub fn read_byte(&mut self) -> u8 {
        self.protocol.bus.read_byte()
    }

    /// Read two bytes as one word, high byte first.
    pub fn read_pixel_word(&mut self) -> u16 {
        let hi = self.read_byte();
        let lo = self.read_byte();
        u16::from_be_bytes([hi, lo])
    }

    /// Fill `buf` with consecutive bytes.
    pub fn read_into(&mut self, buf: &mut [u8]) {
        for byte in buf {
            *byte = self.read_byte();
        }
    }

    /// End the stream.
    pub fn end(self) {}
}

impl<P: BusPlatform, C> Drop for ReadStream<'_, P, C> {
    fn drop(&mut self) {
        self.protocol.end_read_stream();
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec;
    use std::vec::Vec;

    use super::*;
    use crate::controller::Ili9341;
    use crate::mock::{Event, MockBus, Transfer};
    use crate::transfer::READ_SETTLE_CYCLES;
    use crate::{ControlLine, ControlLines};
    use embedded_hal::digital::PinState;

    type TestProtocol = Protocol<MockBus, Ili9341>;

    fn protocol(mock: MockBus) -> TestProtocol {
        let mut protocol = TestProtocol::new(mock);
        protocol.platform_mut().clear();
        protocol
    }

    fn data(bytes: &[u8]) -> Vec<Transfer> {
        bytes.iter().map(|&b| Transfer::Data(b)).collect()
    }

    #[test]
    fn test_send_command() {
        let mut p = protocol(MockBus::new());
        p.send_command(0x29);
        let mock = p.release();
        assert_eq!(mock.transfers, vec![Transfer::Command(0x29)]);
    }

    #[test]
    fn test_send_command_with_params() {
        let mut p = protocol(MockBus::new());
        p.send_command_with(0x36, &[0x48]);
        p.send_command_with(0x11, &[]);
        let mock = p.release();
        assert_eq!(
            mock.transfers,
            vec![
                Transfer::Command(0x36),
                Transfer::Data(0x48),
                Transfer::Command(0x11)
            ]
        );
    }

    #[test]
    fn test_pixel_word_is_high_then_low() {
        for color in [0x0000, 0xFFFF, 0x1234, 0xF800, 0x00FF, 0xFF00] {
            let mut p = protocol(MockBus::new());
            p.send_pixel_word(color);
            let mock = p.release();
            let [hi, lo] = color.to_be_bytes();
            assert_eq!(mock.transfers, data(&[hi, lo]), "color {:#06x}", color);
        }
    }

    #[test]
    fn test_send_fast_drives_once() {
        let mut p = protocol(MockBus::new());
        p.send_fast(0x00);
        let mock = p.release();
        assert_eq!(mock.transfers, data(&[0x00, 0x00]));
        let drives = mock
            .events
            .iter()
            .filter(|e| matches!(e, Event::Drive(_)))
            .count();
        assert_eq!(drives, 1);
    }

    #[test]
    fn test_send_fast_matches_pair() {
        let mut fast = protocol(MockBus::new());
        fast.send_fast(0xEF);
        let mut pair = protocol(MockBus::new());
        pair.send_data_pair(0xEF, 0xEF);
        assert_eq!(fast.release().transfers, pair.release().transfers);
    }

    #[test]
    fn test_begin_pixel_stream() {
        let mut p = protocol(MockBus::new());
        p.begin_pixel_stream();
        p.send_pixels([0x0001, 0x0203]);
        let mock = p.release();
        assert_eq!(
            mock.transfers,
            vec![
                Transfer::Command(0x2C),
                Transfer::Data(0x00),
                Transfer::Data(0x01),
                Transfer::Data(0x02),
                Transfer::Data(0x03),
            ]
        );
    }

    #[test]
    fn test_fill_pixels_fast_path() {
        for count in [1, 7, 8, 9, 16, 17, 100] {
            let mut p = protocol(MockBus::new());
            p.fill_pixels(0xFFFF, count);
            let mock = p.release();
            assert_eq!(mock.transfers.len(), 2 * count as usize);
            assert!(mock.transfers.iter().all(|t| *t == Transfer::Data(0xFF)));
            let drives = mock
                .events
                .iter()
                .filter(|e| matches!(e, Event::Drive(_)))
                .count();
            assert_eq!(drives, 1);
        }
    }

    #[test]
    fn test_fill_pixels_pairs() {
        let mut p = protocol(MockBus::new());
        p.fill_pixels(0xF800, 3);
        let mock = p.release();
        assert_eq!(mock.transfers, data(&[0xF8, 0x00, 0xF8, 0x00, 0xF8, 0x00]));
    }

    #[test]
    fn test_fill_pixels_zero_is_silent() {
        let mut p = protocol(MockBus::new());
        p.fill_pixels(0x0000, 0);
        p.fill_pixels(0x1234, 0);
        assert!(p.release().events.is_empty());
    }

    #[test]
    fn test_fill_matches_plain_loop() {
        for color in [0x0000, 0x4242, 0x1234] {
            let mut fill = protocol(MockBus::new());
            fill.fill_pixels(color, 21);
            let mut plain = protocol(MockBus::new());
            for _ in 0..21 {
                plain.send_pixel_word(color);
            }
            assert_eq!(fill.release().transfers, plain.release().transfers);
        }
    }

    #[test]
    fn test_read_stream_sequence() {
        let mut p = protocol(MockBus::with_read_data(&[0xAB, 0xCD]));
        {
            let mut stream = p.begin_read_stream();
            assert_eq!(stream.read_pixel_word(), 0xABCD);
            stream.end();
        }
        assert_eq!(p.direction(), BusDirection::Write);
        let mock = p.release();
        assert_eq!(mock.transfers, vec![Transfer::Command(0x2E)]);

        let after_command = mock
            .events
            .iter()
            .rposition(|e| *e == Event::Line(ControlLine::WriteStrobe, PinState::High))
            .unwrap();
        assert_eq!(
            mock.events[after_command + 1..].to_vec(),
            vec![
                Event::Direction(BusDirection::Read),
                // dummy read
                Event::Line(ControlLine::CommandData, PinState::High),
                Event::Line(ControlLine::ReadStrobe, PinState::Low),
                Event::Line(ControlLine::ReadStrobe, PinState::High),
                Event::Delay(STREAM_SETTLE_CYCLES),
                Event::Line(ControlLine::ReadStrobe, PinState::Low),
                Event::Delay(STREAM_SETTLE_CYCLES),
                // first byte, strobe already primed
                Event::Delay(READ_SETTLE_CYCLES),
                Event::Sample(0xAB),
                Event::Line(ControlLine::ReadStrobe, PinState::High),
                // second byte
                Event::Line(ControlLine::ReadStrobe, PinState::Low),
                Event::Delay(READ_SETTLE_CYCLES),
                Event::Sample(0xCD),
                Event::Line(ControlLine::ReadStrobe, PinState::High),
                Event::Direction(BusDirection::Write),
            ]
        );
    }

    #[test]
    fn test_read_stream_direction_brackets_samples() {
        let mut p = protocol(MockBus::with_read_data(&[1, 2, 3, 4, 5, 6]));
        for _ in 0..3 {
            let mut stream = p.begin_read_stream();
            let mut buf = [0u8; 2];
            stream.read_into(&mut buf);
        }
        let mock = p.release();
        let mut direction = BusDirection::Write;
        let mut flips = 0;
        for event in &mock.events {
            match event {
                Event::Direction(d) => {
                    assert_ne!(*d, direction);
                    direction = *d;
                    flips += 1;
                }
                Event::Sample(_) => assert_eq!(direction, BusDirection::Read),
                Event::Drive(_) => assert_eq!(direction, BusDirection::Write),
                _ => {}
            }
        }
        assert_eq!(flips, 6);
        assert_eq!(direction, BusDirection::Write);
    }

    #[test]
    fn test_dropped_stream_restores_write() {
        let mut p = protocol(MockBus::new());
        {
            let _stream = p.begin_read_stream();
        }
        assert_eq!(p.direction(), BusDirection::Write);
        p.send_command(0x00);
        let mock = p.release();
        assert_eq!(mock.direction(), BusDirection::Write);
        assert_eq!(
            mock.transfers,
            vec![Transfer::Command(0x2E), Transfer::Command(0x00)]
        );
    }

    #[test]
    fn test_reset_pulse() {
        let mut p = protocol(MockBus::new());
        p.reset_pulse();
        let mock = p.release();
        assert_eq!(mock.resets, 1);
        assert_eq!(mock.lines(), ControlLines::DESELECTED);
        assert_eq!(
            mock.events,
            vec![
                Event::Line(ControlLine::Reset, PinState::Low),
                Event::Delay(RESET_PULSE_CYCLES),
                Event::Line(ControlLine::Reset, PinState::High),
                Event::Delay(RESET_RECOVERY_CYCLES),
            ]
        );
    }

    #[test]
    fn test_deselect_after_burst() {
        let mut p = protocol(MockBus::new());
        p.send_command(0x2C);
        p.deselect();
        let mock = p.release();
        assert_eq!(mock.lines(), ControlLines::DESELECTED);
        let latched = mock
            .events
            .iter()
            .rposition(|e| *e == Event::Line(ControlLine::WriteStrobe, PinState::High))
            .unwrap();
        assert!(mock.events[latched + 1..]
            .contains(&Event::Line(ControlLine::ChipSelect, PinState::High)));
    }
}
