//! Thales binary I/O utilities: big-endian scalar/array reading and writing,
//! case-swapped length-prefixed strings, and instrument timestamps.

pub mod reader;
pub mod swapcase;
pub mod time;
pub mod writer;

pub use reader::*;
pub use swapcase::*;
pub use time::*;
pub use writer::*;
