pub mod cli;
pub mod client;
pub mod config;
mod error;
pub mod logging;
pub mod orchestrator;
mod run;
pub mod uploader;

pub use error::{BoxError, Error, Result};
pub use run::{run, run_with};
