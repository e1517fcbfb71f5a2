pub mod execute;
pub mod legality;
pub mod magic;
pub mod movegen;
pub mod perft;
pub mod tables;
pub mod types;

pub use types::{Move, MoveBuffer, Undo};
