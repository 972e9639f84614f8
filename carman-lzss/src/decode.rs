//! LZSS decoder.

use crate::window::{Window, mod_window};
use crate::{BREAK_EVEN, read_byte};
use carman_core::crc::Crc32;
use carman_core::error::{CarError, Result};
use std::io::{Read, Write};

const STAGING_SIZE: usize = 8192;

/// LZSS decoder.
#[derive(Debug)]
pub struct LzssDecoder {
    window: Window,
    current: usize,
    control: u8,
    mask: u16,
    crc: Crc32,
    staging: Vec<u8>,
}

impl LzssDecoder {
    /// Create a new decoder.
    pub fn new() -> Self {
        Self {
            window: Window::new(),
            current: 1,
            control: 0,
            mask: 0x100,
            crc: Crc32::new(),
            staging: Vec::with_capacity(STAGING_SIZE),
        }
    }

    /// Reset the decoder.
    pub fn reset(&mut self) {
        self.window.reset();
        self.current = 1;
        self.control = 0;
        self.mask = 0x100;
        self.crc.reset();
        self.staging.clear();
    }

    /// Expand a payload to exactly `original_size` bytes and return the CRC
    /// of the output.
    ///
    /// Control bytes are read only when a token needs them, so the decoder
    /// consumes nothing for an empty entry. A pair reaching past
    /// `original_size` is cut short. Running out of input before the output
    /// is complete is [`CarError::CorruptedData`].
    pub fn expand<R: Read + ?Sized, W: Write + ?Sized>(
        &mut self,
        input: &mut R,
        output: &mut W,
        original_size: u32,
    ) -> Result<u32> {
        self.reset();
        let target = original_size as usize;
        let mut produced = 0usize;

        while produced < target {
            if self.next_flag(input)? {
                let byte = Self::payload_byte(input)?;
                self.emit(byte, output)?;
                produced += 1;
            } else {
                let high = Self::payload_byte(input)?;
                let low = Self::payload_byte(input)?;
                let position = (usize::from(high & 0x0F) << 8) | usize::from(low);
                let length = usize::from(high >> 4) + BREAK_EVEN + 1;

                for i in 0..length.min(target - produced) {
                    let byte = self.window.get(mod_window(position + i));
                    self.emit(byte, output)?;
                }
                produced += length.min(target - produced);
            }
        }

        output.write_all(&self.staging)?;
        self.staging.clear();
        Ok(self.crc.value())
    }

    fn next_flag<R: Read + ?Sized>(&mut self, input: &mut R) -> Result<bool> {
        if self.mask == 0x100 {
            self.control = Self::payload_byte(input)?;
            self.mask = 1;
        }
        let bit = u16::from(self.control) & self.mask;
        self.mask <<= 1;
        Ok(bit != 0)
    }

    fn payload_byte<R: Read + ?Sized>(input: &mut R) -> Result<u8> {
        read_byte(input)?.ok_or_else(|| CarError::corrupted("compressed payload ended early"))
    }

    fn emit<W: Write + ?Sized>(&mut self, byte: u8, output: &mut W) -> Result<()> {
        self.crc.update_byte(byte);
        self.window.set(self.current, byte);
        self.current = mod_window(self.current + 1);
        self.staging.push(byte);
        if self.staging.len() >= STAGING_SIZE {
            output.write_all(&self.staging)?;
            self.staging.clear();
        }
        Ok(())
    }
}

impl Default for LzssDecoder {
    fn default() -> Self {
        Self::new()
    }
}
