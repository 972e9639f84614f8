//! CRC-32 checksum engine.
//!
//! Every checksum stored in a CAR archive, for headers and payloads alike,
//! uses the same convention:
//!
//! - Polynomial: 0x04C11DB7 (reflected: 0xEDB88320)
//! - Initial value: 0xFFFFFFFF
//! - Final XOR: 0xFFFFFFFF
//!
//! [`checksum`] is the raw running-value fold. [`Crc32`] wraps it with the
//! initial value and final XOR applied.

/// Initial value and final XOR mask.
pub const CRC_MASK: u32 = 0xFFFFFFFF;

/// CRC-32 lookup table (polynomial 0xEDB88320, reflected).
const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0usize;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB88320;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// Fold `data` into a running CRC value.
///
/// No initial value or final XOR is applied here; callers start from
/// [`CRC_MASK`] and XOR the result with [`CRC_MASK`] when done.
#[inline]
pub fn checksum(data: &[u8], running: u32) -> u32 {
    data.iter().fold(running, |crc, &byte| update_byte(crc, byte))
}

#[inline(always)]
fn update_byte(crc: u32, byte: u8) -> u32 {
    CRC32_TABLE[((crc ^ byte as u32) & 0xFF) as usize] ^ (crc >> 8)
}

/// CRC-32 accumulator.
///
/// # Example
///
/// ```
/// use carman_core::crc::Crc32;
///
/// let mut crc = Crc32::new();
/// crc.update(b"Hello, ");
/// crc.update(b"World!");
/// assert_eq!(crc.finalize(), 0xEC4AC3D0);
/// ```
#[derive(Debug, Clone)]
pub struct Crc32 {
    crc: u32,
}

impl Crc32 {
    /// Create a new CRC-32 calculator.
    pub fn new() -> Self {
        Self { crc: CRC_MASK }
    }

    /// Reset the CRC to its initial state.
    pub fn reset(&mut self) {
        self.crc = CRC_MASK;
    }

    /// Update the CRC with more data.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        self.crc = checksum(data, self.crc);
    }

    /// Update the CRC with a single byte.
    #[inline(always)]
    pub fn update_byte(&mut self, byte: u8) {
        self.crc = update_byte(self.crc, byte);
    }

    /// Get the current CRC value (without finalizing).
    #[inline(always)]
    pub fn value(&self) -> u32 {
        self.crc ^ CRC_MASK
    }

    /// Finalize and return the CRC value.
    #[inline(always)]
    pub fn finalize(self) -> u32 {
        self.crc ^ CRC_MASK
    }

    /// Compute CRC-32 for a slice in one call.
    #[inline]
    pub fn compute(data: &[u8]) -> u32 {
        checksum(data, CRC_MASK) ^ CRC_MASK
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_check_value() {
        assert_eq!(Crc32::compute(b"123456789"), 0xCBF43926);
    }

    #[test]
    fn test_crc32_empty() {
        assert_eq!(Crc32::compute(b""), 0);
        assert_eq!(Crc32::new().finalize(), 0);
    }

    #[test]
    fn test_crc32_incremental_matches_oneshot() {
        let data = b"The quick brown fox jumps over the lazy dog";
        let mut crc = Crc32::new();
        for chunk in data.chunks(5) {
            crc.update(chunk);
        }
        assert_eq!(crc.value(), Crc32::compute(data));
        assert_eq!(crc.finalize(), 0x414FA339);
    }

    #[test]
    fn test_crc32_byte_at_a_time() {
        let data = b"Hello, World!";
        let mut crc = Crc32::new();
        for &b in data {
            crc.update_byte(b);
        }
        assert_eq!(crc.finalize(), 0xEC4AC3D0);
    }

    #[test]
    fn test_running_value_chains() {
        // Two folds over split input equal one fold over the whole.
        let running = checksum(b"abc", CRC_MASK);
        let running = checksum(b"def", running);
        assert_eq!(running ^ CRC_MASK, Crc32::compute(b"abcdef"));
    }

    #[test]
    fn test_reset() {
        let mut crc = Crc32::new();
        crc.update(b"garbage");
        crc.reset();
        crc.update(b"123456789");
        assert_eq!(crc.finalize(), 0xCBF43926);
    }
}
