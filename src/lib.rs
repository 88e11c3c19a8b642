pub mod agent;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod job;
pub mod lexicon;
pub mod normalize;
pub mod orchestrator;
pub mod report;
pub mod score;
pub mod sentiment;

pub use error::{PulseError, Result};
