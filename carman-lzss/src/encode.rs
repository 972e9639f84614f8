//! LZSS encoder.

use crate::tree::{Match, MatchTree};
use crate::window::{Window, mod_window};
use crate::{BREAK_EVEN, LOOK_AHEAD_SIZE, read_byte};
use carman_core::crc::Crc32;
use carman_core::error::{CarError, Result};
use std::io::{BufReader, Read, Write};
use tracing::{debug, trace};

/// Result of compressing one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeOutcome {
    /// The payload was written and is smaller than the input.
    Compressed {
        /// Bytes written to the output.
        compressed_size: u32,
        /// CRC-32 of the input.
        crc: u32,
    },
    /// Output would not be smaller than the input. Whatever was written so
    /// far must be discarded and the data stored instead.
    Incompressible,
}

/// Up to eight tokens behind their control byte.
#[derive(Debug)]
struct TokenBlock {
    data: [u8; 1 + 8 * 2],
    mask: u16,
    offset: usize,
}

impl TokenBlock {
    fn new() -> Self {
        Self {
            data: [0; 17],
            mask: 1,
            offset: 1,
        }
    }

    fn clear(&mut self) {
        self.data[0] = 0;
        self.mask = 1;
        self.offset = 1;
    }

    fn push_literal(&mut self, byte: u8) {
        self.data[self.offset] = byte;
        self.offset += 1;
        self.data[0] |= self.mask as u8;
        self.mask <<= 1;
    }

    fn push_pair(&mut self, position: usize, length: usize) {
        self.data[self.offset] = ((length << 4) as u8) | ((position >> 8) as u8);
        self.data[self.offset + 1] = (position & 0xFF) as u8;
        self.offset += 2;
        self.mask <<= 1;
    }

    fn is_full(&self) -> bool {
        self.mask == 0x100
    }

    fn is_empty(&self) -> bool {
        self.offset == 1
    }

    fn bytes(&self) -> &[u8] {
        &self.data[..self.offset]
    }
}

/// LZSS encoder.
///
/// Holds the window and dictionary so one encoder can be reused for every
/// entry of an archive run. State is reset at the start of each entry.
#[derive(Debug)]
pub struct LzssEncoder {
    window: Window,
    tree: MatchTree,
    block: TokenBlock,
    /// Bytes written for the current entry.
    written: u32,
    /// Input size the output must stay below.
    limit: u32,
}

impl LzssEncoder {
    /// Create a new encoder.
    pub fn new() -> Self {
        Self {
            window: Window::new(),
            tree: MatchTree::new(),
            block: TokenBlock::new(),
            written: 0,
            limit: 0,
        }
    }

    /// Reset the encoder.
    pub fn reset(&mut self) {
        self.window.reset();
        self.block.clear();
        self.written = 0;
        self.limit = 0;
    }

    /// Compress `input`, which must yield exactly `original_size` bytes.
    ///
    /// Gives up with [`EncodeOutcome::Incompressible`] the moment the output
    /// reaches `original_size` bytes. An empty input is always
    /// incompressible.
    pub fn compress<R: Read + ?Sized, W: Write + ?Sized>(
        &mut self,
        input: &mut R,
        output: &mut W,
        original_size: u32,
    ) -> Result<EncodeOutcome> {
        self.reset();
        self.limit = original_size;
        if original_size == 0 {
            return Ok(EncodeOutcome::Incompressible);
        }

        let mut input = BufReader::new(input);
        let mut crc = Crc32::new();
        let mut consumed: u64 = 0;

        let mut current = 1;
        let mut look_ahead = 0;
        while look_ahead < LOOK_AHEAD_SIZE {
            match read_byte(&mut input)? {
                Some(byte) => {
                    self.window.set(current + look_ahead, byte);
                    crc.update_byte(byte);
                    consumed += 1;
                    look_ahead += 1;
                }
                None => break,
            }
        }
        self.tree.reset(current);

        let mut found = Match::default();
        while look_ahead > 0 {
            found.length = found.length.min(look_ahead);

            let replace_count = if found.length <= BREAK_EVEN {
                self.block.push_literal(self.window.get(current));
                1
            } else {
                self.block
                    .push_pair(found.position, found.length - (BREAK_EVEN + 1));
                found.length
            };
            if self.block.is_full() && !self.flush(output)? {
                return Ok(self.give_up());
            }

            for _ in 0..replace_count {
                let incoming = mod_window(current + LOOK_AHEAD_SIZE);
                self.tree.remove(incoming);
                match read_byte(&mut input)? {
                    Some(byte) => {
                        crc.update_byte(byte);
                        consumed += 1;
                        self.window.set(incoming, byte);
                    }
                    None => look_ahead -= 1,
                }
                current = mod_window(current + 1);
                if look_ahead > 0 {
                    found = self.tree.insert(&self.window, current);
                }
            }
        }

        if consumed != u64::from(original_size) {
            return Err(CarError::corrupted(format!(
                "input yielded {} bytes, expected {}",
                consumed, original_size
            )));
        }
        if !self.flush(output)? {
            return Ok(self.give_up());
        }

        debug!(
            original_size,
            compressed_size = self.written,
            "lzss compressed"
        );
        Ok(EncodeOutcome::Compressed {
            compressed_size: self.written,
            crc: crc.finalize(),
        })
    }

    /// Write out the pending block. Returns `false` once the running total
    /// reaches the input size; nothing is written in that case.
    fn flush<W: Write + ?Sized>(&mut self, output: &mut W) -> Result<bool> {
        if self.block.is_empty() {
            return Ok(true);
        }
        let total = u64::from(self.written) + self.block.bytes().len() as u64;
        if total >= u64::from(self.limit) {
            return Ok(false);
        }
        output.write_all(self.block.bytes())?;
        // total < limit, so it fits
        self.written = total as u32;
        self.block.clear();
        Ok(true)
    }

    fn give_up(&mut self) -> EncodeOutcome {
        trace!(
            written = self.written,
            limit = self.limit,
            "lzss output reached input size"
        );
        self.block.clear();
        EncodeOutcome::Incompressible
    }
}

impl Default for LzssEncoder {
    fn default() -> Self {
        Self::new()
    }
}
