//! Controller and panel description.
//!
//! Which opcodes address the window and how large the panel is are chosen at
//! build time by picking a [`Controller`] type. [`Panel`] covers every
//! controller using the MIPI DCS opcodes; [`Ili9341`] is the common 240x320
//! portrait panel.

/// MIPI DCS opcodes shared by ILI9341-class controllers.
pub mod dcs {
    /// Column address set (CASET): start column, end column
    pub const COLUMN_ADDRESS_SET: u8 = 0x2A;
    /// Page address set (PASET): start row, end row
    pub const ROW_ADDRESS_SET: u8 = 0x2B;
    /// Memory write (RAMWR): pixel words follow
    pub const MEMORY_WRITE: u8 = 0x2C;
    /// Memory read (RAMRD): pixel bytes can be read back
    pub const MEMORY_READ: u8 = 0x2E;
}

/// Compile-time description of a display controller and its panel.
///
/// Both address commands take a 16-bit start followed by a 16-bit end
/// parameter, each sent high byte first. Sending only the start leaves the
/// end register untouched, which [`crate::window::Tft`] relies on.
pub trait Controller {
    /// Panel width in pixels (number of columns)
    const WIDTH: u16;
    /// Panel height in pixels (number of rows)
    const HEIGHT: u16;
    /// Opcode that programs the column range
    const COLUMN_ADDRESS_SET: u8;
    /// Opcode that programs the row range
    const ROW_ADDRESS_SET: u8;
    /// Opcode that starts a pixel write stream
    const MEMORY_WRITE: u8;
    /// Opcode that starts a pixel read stream
    const MEMORY_READ: u8;

    /// Last column, the default lower-right column bound
    #[inline]
    #[must_use]
    fn max_x() -> u16 {
        Self::WIDTH.saturating_sub(1)
    }

    /// Last row, the default lower-right row bound
    #[inline]
    #[must_use]
    fn max_y() -> u16 {
        Self::HEIGHT.saturating_sub(1)
    }
}

/// DCS controller driving a `WIDTH` x `HEIGHT` panel.
///
/// # Type Parameters
///
/// * `WIDTH` - Number of columns
/// * `HEIGHT` - Number of rows
#[derive(Debug, Clone, Copy, Default)]
pub struct Panel<const WIDTH: u16, const HEIGHT: u16>;

impl<const WIDTH: u16, const HEIGHT: u16> Controller for Panel<WIDTH, HEIGHT> {
    const WIDTH: u16 = WIDTH;
    const HEIGHT: u16 = HEIGHT;
    const COLUMN_ADDRESS_SET: u8 = dcs::COLUMN_ADDRESS_SET;
    const ROW_ADDRESS_SET: u8 = dcs::ROW_ADDRESS_SET;
    const MEMORY_WRITE: u8 = dcs::MEMORY_WRITE;
    const MEMORY_READ: u8 = dcs::MEMORY_READ;
}

/// ILI9341 in its default portrait orientation.
pub type Ili9341 = Panel<240, 320>;
