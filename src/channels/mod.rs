//! Message sources — how captured text messages reach the pipeline.

pub mod channel;
pub mod cli;
pub mod http;
pub mod manager;

pub use channel::*;
pub use cli::CliSource;
pub use http::HttpSource;
pub use manager::SourceManager;
