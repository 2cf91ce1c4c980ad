//! CLI module for agent process spawning and stream parsing.

mod process;
mod stream;

pub use process::*;
pub use stream::*;
