//! Synthetic rebuffering: freeze the input at each event, optionally mark the
//! stall with a blurred spinner overlay, and stitch the result back together
//! with a short sequence of ffmpeg passes.

mod artifacts;
mod cli;
mod commands;
mod config;
mod error;
mod events;
mod graph;
mod logging;
mod output;
mod passes;
mod pipeline;
mod planner;
mod probe;
mod runner;
mod timestamp;

pub use cli::StallArgs;
pub use commands::handle_stall;
