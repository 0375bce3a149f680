//! `display-interface` support.
//!
//! [`Protocol`] implements [`WriteOnlyDataCommand`], so controller drivers
//! written against `display-interface` can run on the bit-banged bus. Command
//! opcodes are bytes; 16-bit data is split into two byte transfers.

use display_interface::{DataFormat, DisplayError, WriteOnlyDataCommand};

use crate::controller::Controller;
use crate::protocol::Protocol;
use crate::BusPlatform;

impl<P: BusPlatform, C: Controller> Protocol<P, C> {
    fn send_word_le(&mut self, word: u16) {
        let [lo, hi] = word.to_le_bytes();
        self.send_data_pair(lo, hi);
    }
}

impl<P: BusPlatform, C: Controller> WriteOnlyDataCommand for Protocol<P, C> {
    fn send_commands(&mut self, cmd: DataFormat<'_>) -> Result<(), DisplayError> {
        match cmd {
            DataFormat::U8(items) => {
                for item in items {
                    self.send_command(*item);
                }
            }
            DataFormat::U8Iter(iterator) => {
                for item in iterator {
                    self.send_command(item);
                }
            }
            _ => return Err(DisplayError::DataFormatNotImplemented),
        }
        Ok(())
    }

    fn send_data(&mut self, buf: DataFormat<'_>) -> Result<(), DisplayError> {
        match buf {
            DataFormat::U8(items) => {
                for item in items {
                    self.send_data_byte(*item);
                }
            }
            DataFormat::U16(items) => {
                for item in items {
                    self.send_word(*item);
                }
            }
            DataFormat::U16BE(items) => {
                for item in items.iter() {
                    self.send_word(*item);
                }
            }
            DataFormat::U16LE(items) => {
                for item in items.iter() {
                    self.send_word_le(*item);
                }
            }
            DataFormat::U8Iter(iterator) => {
                for item in iterator {
                    self.send_data_byte(item);
                }
            }
            DataFormat::U16BEIter(iterator) => {
                for item in iterator {
                    self.send_word(item);
                }
            }
            DataFormat::U16LEIter(iterator) => {
                for item in iterator {
                    self.send_word_le(item);
                }
            }
            _ => return Err(DisplayError::DataFormatNotImplemented),
        }
        Ok(())
    }
}
