//! CLI module for headless Lumina.
//!
//! Drives the same `AppController` a side panel would, against the local
//! storage file, so sparks can be captured, generated and edited from
//! scripts.
//!
//! ```text
//! +-----------+     +---------------+     +---------------------+
//! | args.rs   | --> | runner.rs     | --> | AppController       |
//! | (clap)    |     | (dispatch)    |     | (store, generator)  |
//! +-----------+     +---------------+     +---------------------+
//!                          |
//!                          v
//!                   +---------------+
//!                   | output.rs     |
//!                   | (text/JSON)   |
//!                   +---------------+
//! ```

mod args;
mod bootstrap;
mod output;
mod runner;

pub use args::{Args, Command, SettingsCommand};
pub use bootstrap::{initialize, CliContext};
pub use runner::run;
