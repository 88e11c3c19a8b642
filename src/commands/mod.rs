//! Command implementations for the pulse CLI

mod misc;
mod run;

pub use misc::*;
pub use run::*;
