//! Command-line front end for RunStab.

pub mod args;
pub mod config;
pub mod logging;

pub use args::{default_output_path, ArgsError, FramesArgs, StabilizeArgs};
pub use config::{stabilize_config_from, stabilize_config_from_env};
pub use logging::init_tracing;
