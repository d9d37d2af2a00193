//! Bit-level reading for codec bitstreams.

pub mod expgolomb;
pub mod reader;

pub use expgolomb::{Signed, Unsigned};
pub use reader::{BitReader, RemainBits, read_flag};
