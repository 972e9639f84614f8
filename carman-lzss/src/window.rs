//! Sliding window shared by the encoder and decoder.
//!
//! Unlike a write-cursor ring buffer, the window is addressed by absolute
//! position: the encoder fills look-ahead bytes ahead of its cursor while the
//! dictionary still indexes the bytes behind it.

use crate::{LOOK_AHEAD_SIZE, WINDOW_SIZE};
use std::cmp::Ordering;

/// Reduce a position modulo the window size.
#[inline(always)]
pub const fn mod_window(position: usize) -> usize {
    position & (WINDOW_SIZE - 1)
}

/// Fixed-size circular byte window.
#[derive(Debug, Clone)]
pub struct Window {
    bytes: Vec<u8>,
}

impl Window {
    /// Create a zero-filled window.
    pub fn new() -> Self {
        Self {
            bytes: vec![0; WINDOW_SIZE],
        }
    }

    /// Zero the window for a new entry.
    pub fn reset(&mut self) {
        self.bytes.fill(0);
    }

    /// Byte at `position` (wrapped).
    #[inline(always)]
    pub fn get(&self, position: usize) -> u8 {
        self.bytes[mod_window(position)]
    }

    /// Store `byte` at `position` (wrapped).
    #[inline(always)]
    pub fn set(&mut self, position: usize, byte: u8) {
        self.bytes[mod_window(position)] = byte;
    }

    /// Compare the strings starting at `a` and `b`, reading cyclically.
    ///
    /// Returns the length of the common prefix (at most [`LOOK_AHEAD_SIZE`])
    /// and how the string at `a` orders against the one at `b` at the first
    /// differing byte. A full-length match compares `Equal`.
    #[inline]
    pub fn compare(&self, a: usize, b: usize) -> (usize, Ordering) {
        for i in 0..LOOK_AHEAD_SIZE {
            let ord = self.get(a + i).cmp(&self.get(b + i));
            if ord != Ordering::Equal {
                return (i, ord);
            }
        }
        (LOOK_AHEAD_SIZE, Ordering::Equal)
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::new()
    }
}
