//! # CARMAN LZSS
//!
//! LZSS codec for CAR archive payloads.
//!
//! The codec uses a 4 KB circular window and indexes every window position
//! in an unbalanced binary search tree, keyed by the 17-byte string that
//! starts there. Output is grouped in blocks of up to eight tokens behind a
//! control byte:
//!
//! ```text
//! control: bit i (LSB first) = 1 -> token i is a literal byte
//!                            = 0 -> token i is a 2-byte pair
//! pair:    [ length-2 : 4 | position[11:8] : 4 ] [ position[7:0] : 8 ]
//! ```
//!
//! Matches of one byte or less are cheaper as literals (the break-even
//! point), so pairs always cover 2 to 17 bytes.
//!
//! Compression is refused as soon as the output reaches the input size; the
//! caller then stores the data instead.
//!
//! ## Example
//!
//! ```rust
//! use carman_lzss::{decode_lzss, encode_lzss};
//!
//! let data = b"abcabcabcabcabcabcabcabcabcabcabcabc".to_vec();
//! let packed = encode_lzss(&data).unwrap().expect("repetitive input compresses");
//! assert!(packed.len() < data.len());
//!
//! let unpacked = decode_lzss(&packed, data.len() as u32).unwrap();
//! assert_eq!(unpacked, data);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod decode;
pub mod encode;
pub mod tree;
pub mod window;

use carman_core::error::{CarError, Result};
use std::io::{self, Read};

/// Bits used to encode a window position.
pub const INDEX_BIT_COUNT: u32 = 12;
/// Bits used to encode a match length.
pub const LENGTH_BIT_COUNT: u32 = 4;
/// Size of the sliding window.
pub const WINDOW_SIZE: usize = 1 << INDEX_BIT_COUNT;
/// Number of lengths expressible in the length field.
pub const RAW_LOOK_AHEAD_SIZE: usize = 1 << LENGTH_BIT_COUNT;
/// Longest match that is still cheaper to send as literals.
pub const BREAK_EVEN: usize = ((1 + INDEX_BIT_COUNT + LENGTH_BIT_COUNT) / 9) as usize;
/// Longest match the codec produces.
pub const LOOK_AHEAD_SIZE: usize = RAW_LOOK_AHEAD_SIZE + BREAK_EVEN;

// Re-exports
pub use decode::LzssDecoder;
pub use encode::{EncodeOutcome, LzssEncoder};
pub use tree::{Match, MatchTree};
pub use window::Window;

/// Compress a buffer. Returns `None` when the data does not shrink.
pub fn encode_lzss(data: &[u8]) -> Result<Option<Vec<u8>>> {
    let size = u32::try_from(data.len())
        .map_err(|_| CarError::entry_too_large("<buffer>", data.len() as u64))?;

    let mut output = Vec::with_capacity(data.len());
    match LzssEncoder::new().compress(&mut &data[..], &mut output, size)? {
        EncodeOutcome::Compressed { .. } => Ok(Some(output)),
        EncodeOutcome::Incompressible => Ok(None),
    }
}

/// Expand a buffer that decodes to `original_size` bytes.
pub fn decode_lzss(data: &[u8], original_size: u32) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(original_size as usize);
    LzssDecoder::new().expand(&mut &data[..], &mut output, original_size)?;
    Ok(output)
}

/// Read one byte, `None` at end of stream.
pub(crate) fn read_byte<R: Read + ?Sized>(input: &mut R) -> io::Result<Option<u8>> {
    let mut byte = [0u8; 1];
    loop {
        match input.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}
