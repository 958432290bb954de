pub mod config;
pub mod domain;
pub mod error;
pub mod ncbi;
pub mod output;
pub mod pacing;
pub mod pipeline;
pub mod progress;
