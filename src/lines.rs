//! Control line patterns for the parallel bus.
//!
//! All five control lines are active LOW. Every bus state the protocol uses is
//! a fixed bit pattern over those lines, stored the way a control port
//! register would hold it:
//!
//! | pattern                         | CS | CD | WR | RD | RST |
//! |---------------------------------|----|----|----|----|-----|
//! | [`ControlLines::DESELECTED`]    | 1  | 1  | 1  | 1  | 1   |
//! | [`ControlLines::IDLE`]          | 0  | 1  | 1  | 1  | 1   |
//! | [`ControlLines::READY_COMMAND`] | 0  | 0  | 0  | 1  | 1   |
//! | [`ControlLines::SEND_COMMAND`]  | 0  | 0  | 1  | 1  | 1   |
//! | [`ControlLines::READY_DATA`]    | 0  | 1  | 0  | 1  | 1   |
//! | [`ControlLines::SEND_DATA`]     | 0  | 1  | 1  | 1  | 1   |
//! | [`ControlLines::READY_READ`]    | 0  | 1  | 1  | 0  | 1   |
//! | [`ControlLines::RESET`]         | 1  | 1  | 1  | 1  | 0   |
//!
//! A write strobe is `READY_*` followed by `SEND_*`: WR goes LOW with the other
//! lines already in place, then returns HIGH, and the controller latches on that
//! rising edge. Chip select stays LOW between transfers of a burst and is only
//! released by [`LineController::deselect`].

use bitfield::bitfield;
use embedded_hal::digital::PinState;

use crate::BusPlatform;

/// One of the five bus control lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlLine {
    /// CS, chip select
    ChipSelect,
    /// CD (also called RS or DC), LOW for command and HIGH for data
    CommandData,
    /// WR, write strobe
    WriteStrobe,
    /// RD, read strobe
    ReadStrobe,
    /// RST, hardware reset
    Reset,
}

impl ControlLine {
    /// All lines, in bit order.
    pub const ALL: [ControlLine; 5] = [
        ControlLine::ChipSelect,
        ControlLine::CommandData,
        ControlLine::WriteStrobe,
        ControlLine::ReadStrobe,
        ControlLine::Reset,
    ];

    /// Bit of this line in a [`ControlLines`] pattern.
    #[must_use]
    pub const fn mask(self) -> u8 {
        match self {
            ControlLine::ChipSelect => 1 << 0,
            ControlLine::CommandData => 1 << 1,
            ControlLine::WriteStrobe => 1 << 2,
            ControlLine::ReadStrobe => 1 << 3,
            ControlLine::Reset => 1 << 4,
        }
    }

    /// Whether this line is one of the two strobes.
    #[must_use]
    pub const fn is_strobe(self) -> bool {
        matches!(self, ControlLine::WriteStrobe | ControlLine::ReadStrobe)
    }
}

bitfield! {
    /// Levels of all control lines, one bit per line (1 = HIGH).
    ///
    /// The bit layout is as follows:
    /// - Bit 4: Reset
    /// - Bit 3: Read strobe
    /// - Bit 2: Write strobe
    /// - Bit 1: Command/data select
    /// - Bit 0: Chip select
    #[derive(Clone, Copy, PartialEq, Eq)]
    #[repr(transparent)]
    pub struct ControlLines(u8);
    impl Debug;
    pub chip_select, set_chip_select: 0;
    pub command_data, set_command_data: 1;
    pub write_strobe, set_write_strobe: 2;
    pub read_strobe, set_read_strobe: 3;
    pub reset, set_reset: 4;
}

const STROBES: u8 = ControlLine::WriteStrobe.mask() | ControlLine::ReadStrobe.mask();

impl ControlLines {
    /// Mask of the bits used by the five lines.
    pub const MASK: u8 = 0b1_1111;

    /// Everything inactive, bus released.
    pub const DESELECTED: Self = Self(0b1_1111);
    /// Chip selected, no strobe active.
    pub const IDLE: Self = Self(0b1_1110);
    /// Command byte on the bus, write strobe asserted.
    pub const READY_COMMAND: Self = Self(0b1_1000);
    /// Command phase with the write strobe released.
    pub const SEND_COMMAND: Self = Self(0b1_1100);
    /// Data byte on the bus, write strobe asserted.
    pub const READY_DATA: Self = Self(0b1_1010);
    /// Data phase with the write strobe released.
    pub const SEND_DATA: Self = Self(0b1_1110);
    /// Read strobe asserted, controller drives the bus.
    pub const READY_READ: Self = Self(0b1_0110);
    /// Hardware reset asserted, chip deselected.
    pub const RESET: Self = Self(0b0_1111);

    /// Raw pattern bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Level of one line in this pattern.
    #[must_use]
    pub fn level(self, line: ControlLine) -> PinState {
        PinState::from(self.0 & line.mask() != 0)
    }

    /// This pattern with `line` driven to `level`.
    #[must_use]
    pub fn with(self, line: ControlLine, level: PinState) -> Self {
        match level {
            PinState::High => Self(self.0 | line.mask()),
            PinState::Low => Self(self.0 & !line.mask()),
        }
    }

    /// At most one strobe may be active at any instant.
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.write_strobe() || self.read_strobe()
    }

    /// Whether moving to `next` keeps every non-strobe line still while a strobe
    /// stays asserted across the move.
    #[must_use]
    pub fn is_glitch_free(self, next: ControlLines) -> bool {
        let held = (!self.write_strobe() && !next.write_strobe())
            || (!self.read_strobe() && !next.read_strobe());
        !held || (self.0 ^ next.0) & Self::MASK & !STROBES == 0
    }

    /// Line changes needed to move from `self` to `next`, in safe order.
    ///
    /// Strobes being released come first, then chip select, reset and
    /// command/data, and strobes being asserted come last. Unchanged lines are
    /// skipped.
    #[must_use]
    pub fn changes_to(self, next: ControlLines) -> Changes {
        Changes {
            from: self,
            to: next,
            index: 0,
        }
    }
}

#[derive(Clone, Copy)]
enum Stage {
    Release,
    Any,
    Assert,
}

const ORDER: [(ControlLine, Stage); 7] = [
    (ControlLine::WriteStrobe, Stage::Release),
    (ControlLine::ReadStrobe, Stage::Release),
    (ControlLine::ChipSelect, Stage::Any),
    (ControlLine::Reset, Stage::Any),
    (ControlLine::CommandData, Stage::Any),
    (ControlLine::WriteStrobe, Stage::Assert),
    (ControlLine::ReadStrobe, Stage::Assert),
];

/// Iterator returned by [`ControlLines::changes_to`].
#[derive(Debug, Clone)]
pub struct Changes {
    from: ControlLines,
    to: ControlLines,
    index: usize,
}

impl Iterator for Changes {
    type Item = (ControlLine, PinState);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&(line, stage)) = ORDER.get(self.index) {
            self.index += 1;
            let level = self.to.level(line);
            if self.from.level(line) == level {
                continue;
            }
            let due = match stage {
                Stage::Release => level == PinState::High,
                Stage::Assert => level == PinState::Low,
                Stage::Any => true,
            };
            if due {
                return Some((line, level));
            }
        }
        None
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ControlLines {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "ControlLines(cs={} cd={} wr={} rd={} rst={})",
            self.chip_select(),
            self.command_data(),
            self.write_strobe(),
            self.read_strobe(),
            self.reset()
        );
    }
}

/// Selects the command or data variant of a write strobe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// CD LOW, the byte is an opcode
    Command,
    /// CD HIGH, the byte is a parameter or pixel byte
    Data,
}

/// Drives the control lines of a [`BusPlatform`] between the named patterns.
///
/// Owns the platform and remembers the pattern last applied, so only changed
/// lines are touched.
pub struct LineController<P> {
    platform: P,
    lines: ControlLines,
}

impl<P: BusPlatform> LineController<P> {
    /// Take ownership of the platform and drive every line to
    /// [`ControlLines::DESELECTED`].
    pub fn new(mut platform: P) -> Self {
        for line in ControlLine::ALL {
            platform.set_control_line(line, PinState::High);
        }
        Self {
            platform,
            lines: ControlLines::DESELECTED,
        }
    }

    /// Pattern currently on the lines.
    #[must_use]
    pub fn lines(&self) -> ControlLines {
        self.lines
    }

    /// Apply `next`.
    pub fn enter(&mut self, next: ControlLines) {
        debug_assert!(next.is_valid(), "both strobes asserted: {:?}", next);
        debug_assert!(
            self.lines.is_glitch_free(next),
            "control line changed under an active strobe: {:?} -> {:?}",
            self.lines,
            next
        );
        if next != self.lines {
            self.platform.apply_control_lines(self.lines, next);
            self.lines = next;
        }
    }

    /// Chip selected, no strobe active.
    pub fn idle(&mut self) {
        self.enter(ControlLines::IDLE);
    }

    /// Release the bus.
    pub fn deselect(&mut self) {
        self.enter(ControlLines::DESELECTED);
    }

    /// Assert the write strobe for a command or data byte.
    pub fn ready(&mut self, phase: Phase) {
        self.enter(match phase {
            Phase::Command => ControlLines::READY_COMMAND,
            Phase::Data => ControlLines::READY_DATA,
        });
    }

    /// Release the write strobe, latching the byte on the bus.
    pub fn send(&mut self, phase: Phase) {
        self.enter(match phase {
            Phase::Command => ControlLines::SEND_COMMAND,
            Phase::Data => ControlLines::SEND_DATA,
        });
    }

    /// One full write strobe pulse.
    #[inline]
    pub fn pulse_write(&mut self, phase: Phase) {
        self.ready(phase);
        self.send(phase);
    }

    /// Assert the read strobe.
    pub fn ready_read(&mut self) {
        self.enter(ControlLines::READY_READ);
    }

    /// Release the read strobe.
    pub fn release_read(&mut self) {
        self.enter(ControlLines::SEND_DATA);
    }

    /// One full read strobe pulse, discarding whatever the controller drove.
    pub fn pulse_read(&mut self) {
        self.ready_read();
        self.release_read();
    }

    /// Assert the reset line with everything else inactive.
    pub fn assert_reset(&mut self) {
        self.enter(ControlLines::RESET);
    }

    /// Shared access to the platform.
    #[must_use]
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Exclusive access to the platform for data bus and delay operations.
    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Give the platform back.
    pub fn release(self) -> P {
        self.platform
    }
}
