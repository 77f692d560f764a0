pub mod pgn;
pub mod sample;

pub use pgn::*;
pub use sample::*;
