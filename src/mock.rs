//! Recording platform used by the unit tests.
//!
//! Tracks line levels like the controller would see them, decodes every write
//! strobe rising edge into a latched [`Transfer`], and panics as soon as the
//! driver breaks a bus rule.

extern crate std;

use std::collections::VecDeque;
use std::vec::Vec;

use embedded_hal::digital::PinState;

use crate::{BusDirection, BusPlatform, ControlLine, ControlLines};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Drive(u8),
    Sample(u8),
    Line(ControlLine, PinState),
    Direction(BusDirection),
    Delay(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    Command(u8),
    Data(u8),
}

pub struct MockBus {
    pub events: Vec<Event>,
    pub transfers: Vec<Transfer>,
    pub resets: usize,
    /// Bytes the "controller" returns, in order; 0 once exhausted
    pub read_data: VecDeque<u8>,
    lines: ControlLines,
    bus: u8,
    direction: BusDirection,
}

impl MockBus {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            transfers: Vec::new(),
            resets: 0,
            read_data: VecDeque::new(),
            lines: ControlLines::DESELECTED,
            bus: 0,
            direction: BusDirection::Write,
        }
    }

    pub fn with_read_data(data: &[u8]) -> Self {
        let mut bus = Self::new();
        bus.read_data.extend(data.iter().copied());
        bus
    }

    pub fn lines(&self) -> ControlLines {
        self.lines
    }

    pub fn direction(&self) -> BusDirection {
        self.direction
    }

    pub fn commands(&self) -> Vec<u8> {
        self.transfers
            .iter()
            .filter_map(|t| match t {
                Transfer::Command(c) => Some(*c),
                Transfer::Data(_) => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.transfers.clear();
    }
}

impl BusPlatform for MockBus {
    fn drive_data_bus(&mut self, value: u8) {
        assert_eq!(
            self.direction,
            BusDirection::Write,
            "drove the data bus while it is configured for reading"
        );
        self.bus = value;
        self.events.push(Event::Drive(value));
    }

    fn sample_data_bus(&mut self) -> u8 {
        assert_eq!(
            self.direction,
            BusDirection::Read,
            "sampled the data bus while it is configured for writing"
        );
        assert!(!self.lines.read_strobe(), "sampled without the read strobe");
        assert!(!self.lines.chip_select(), "sampled while deselected");
        let value = self.read_data.pop_front().unwrap_or(0);
        self.events.push(Event::Sample(value));
        value
    }

    fn set_control_line(&mut self, line: ControlLine, level: PinState) {
        let next = self.lines.with(line, level);
        assert!(next.is_valid(), "both strobes asserted");
        if !line.is_strobe() && next.level(line) != self.lines.level(line) {
            assert!(
                self.lines.write_strobe() && self.lines.read_strobe(),
                "{:?} changed while a strobe is asserted",
                line
            );
        }
        let rising = self.lines.level(line) == PinState::Low && level == PinState::High;
        if rising && line == ControlLine::WriteStrobe {
            assert!(!self.lines.chip_select(), "write strobe while deselected");
            assert_eq!(self.direction, BusDirection::Write);
            let transfer = if self.lines.command_data() {
                Transfer::Data(self.bus)
            } else {
                Transfer::Command(self.bus)
            };
            self.transfers.push(transfer);
        }
        if rising && line == ControlLine::Reset {
            self.resets += 1;
        }
        self.lines = next;
        self.events.push(Event::Line(line, level));
    }

    fn configure_bus_direction(&mut self, direction: BusDirection) {
        if direction == BusDirection::Write {
            assert!(
                self.lines.read_strobe(),
                "took the bus back while the controller still drives it"
            );
        }
        self.direction = direction;
        self.events.push(Event::Direction(direction));
    }

    fn delay_cycles(&mut self, cycles: u32) {
        self.events.push(Event::Delay(cycles));
    }
}
