//! Command implementations for CARMAN CLI.

pub mod decode;
pub mod list;
pub mod rewrite;

pub use decode::{Decode, cmd_decode};
pub use list::cmd_list;
pub use rewrite::{Rewrite, cmd_rewrite};
