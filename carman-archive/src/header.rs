//! Entry header codec.
//!
//! ```text
//! name[..127]  NUL
//! method       u8     1 = stored, 2 = LZSS
//! original     u32 LE
//! compressed   u32 LE
//! data_crc     u32 LE CRC-32 of the uncompressed payload
//! header_crc   u32 LE CRC-32 of name + NUL and the 13 bytes above
//! payload      [compressed]
//! ```
//!
//! The archive ends with a header whose name is empty, i.e. a single NUL.

use carman_core::crc::{CRC_MASK, checksum};
use carman_core::entry::{Entry, MAX_NAME_LEN, Method};
use carman_core::error::{CarError, Result};
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Bytes following the name terminator.
pub const FIXED_HEADER_LEN: usize = 17;

/// Bytes of the fixed part covered by the header CRC.
const CRC_COVERED_LEN: usize = 13;

/// Position of a header written ahead of its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderSlot {
    /// Offset of the first name byte.
    pub offset: u64,
    /// Offset of the first payload byte.
    pub payload_start: u64,
}

/// Header CRC over the serialized fields of `entry`.
pub fn header_crc(entry: &Entry) -> u32 {
    let fixed = pack_fixed(entry, 0);
    let crc = checksum(entry.name_bytes(), CRC_MASK);
    let crc = checksum(&[0], crc);
    checksum(&fixed[..CRC_COVERED_LEN], crc) ^ CRC_MASK
}

fn pack_fixed(entry: &Entry, header_crc: u32) -> [u8; FIXED_HEADER_LEN] {
    let mut fixed = [0u8; FIXED_HEADER_LEN];
    fixed[0] = entry.method.to_byte();
    fixed[1..5].copy_from_slice(&entry.original_size.to_le_bytes());
    fixed[5..9].copy_from_slice(&entry.compressed_size.to_le_bytes());
    fixed[9..13].copy_from_slice(&entry.original_crc.to_le_bytes());
    fixed[13..17].copy_from_slice(&header_crc.to_le_bytes());
    fixed
}

fn read_u32_le(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Read the next header.
///
/// Returns `Ok(None)` at the terminator. A stream that ends before the
/// terminator, whether between entries or inside a header, is an
/// `UnexpectedEof` I/O error.
pub fn read_header<R: Read + ?Sized>(reader: &mut R) -> Result<Option<Entry>> {
    let mut name = Vec::with_capacity(32);
    loop {
        let mut byte = [0u8; 1];
        match reader.read(&mut byte) {
            Ok(0) if name.is_empty() => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "archive ended without a terminator",
                )
                .into());
            }
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "archive ended inside an entry name",
                )
                .into());
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
        if byte[0] == 0 {
            break;
        }
        if name.len() == MAX_NAME_LEN {
            return Err(CarError::name_too_long(MAX_NAME_LEN));
        }
        name.push(byte[0]);
    }

    if name.is_empty() {
        return Ok(None);
    }

    let mut fixed = [0u8; FIXED_HEADER_LEN];
    reader.read_exact(&mut fixed)?;

    let crc = checksum(&name, CRC_MASK);
    let crc = checksum(&[0], crc);
    let computed = checksum(&fixed[..CRC_COVERED_LEN], crc) ^ CRC_MASK;

    let mut entry = Entry::from_name_bytes(name)
        .with_method(Method::from_byte(fixed[0]))
        .with_sizes(read_u32_le(&fixed[1..5]), read_u32_le(&fixed[5..9]))
        .with_crc(read_u32_le(&fixed[9..13]));
    entry.header_crc = read_u32_le(&fixed[13..17]);

    if entry.header_crc != computed {
        return Err(CarError::header_corrupt(
            entry.name,
            entry.header_crc,
            computed,
        ));
    }

    Ok(Some(entry))
}

/// Write a header, recomputing its CRC from the fields being written.
///
/// `entry.header_crc` is updated to the value written.
pub fn write_header<W: Write + ?Sized>(writer: &mut W, entry: &mut Entry) -> Result<()> {
    entry.validate_name()?;
    entry.header_crc = header_crc(entry);

    writer.write_all(entry.name_bytes())?;
    writer.write_all(&[0])?;
    writer.write_all(&pack_fixed(entry, entry.header_crc))?;
    Ok(())
}

/// Write a provisional header at the current position.
///
/// The sizes and CRC written here are placeholders; the slot must be
/// finished with [`commit_header`] once the payload is known.
pub fn reserve_header<W: Write + Seek + ?Sized>(
    writer: &mut W,
    entry: &mut Entry,
) -> Result<HeaderSlot> {
    let offset = writer.stream_position()?;
    write_header(writer, entry)?;
    let payload_start = writer.stream_position()?;
    Ok(HeaderSlot {
        offset,
        payload_start,
    })
}

/// Rewrite a reserved header with the final fields and leave the writer
/// positioned after the payload.
pub fn commit_header<W: Write + Seek + ?Sized>(
    writer: &mut W,
    slot: &HeaderSlot,
    entry: &mut Entry,
) -> Result<()> {
    writer.seek(SeekFrom::Start(slot.offset))?;
    write_header(writer, entry)?;
    writer.seek(SeekFrom::Start(
        slot.payload_start + u64::from(entry.compressed_size),
    ))?;
    Ok(())
}

/// Write the end-of-archive marker.
pub fn write_terminator<W: Write + ?Sized>(writer: &mut W) -> Result<()> {
    writer.write_all(&[0])?;
    Ok(())
}
