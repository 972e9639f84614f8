//! # CARMAN Core
//!
//! Core components for the CARMAN archive manager.
//!
//! - [`crc`]: the CRC-32 checksum engine used for headers and payloads
//! - [`entry`]: archive entry metadata
//! - [`error`]: error types
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L4: CLI                                                 │
//! │     carman binary, console reporter                     │
//! ├─────────────────────────────────────────────────────────┤
//! │ L3: Archive                                             │
//! │     header codec, selectors, command engine             │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec                                               │
//! │     LZSS (binary tree dictionary, 4 KB window)          │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Core (this crate)                                   │
//! │     CRC-32, Entry, CarError                             │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use carman_core::crc::Crc32;
//!
//! let crc = Crc32::compute(b"123456789");
//! assert_eq!(crc, 0xCBF43926);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod crc;
pub mod entry;
pub mod error;

// Re-exports for convenience
pub use crc::{CRC_MASK, Crc32, checksum};
pub use entry::{Entry, MAX_NAME_LEN, Method, ratio_percent};
pub use error::{CarError, Result};
