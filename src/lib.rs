pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod git;
pub mod orchestrator;
pub mod path;
pub mod pipeline;
pub mod render;
pub mod report;
