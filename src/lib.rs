//! Lumina: capture text snippets while browsing and turn each one into
//! several ready-to-post social drafts with a language model.
//!
//! The library holds the capture → generate pipeline, local storage and
//! settings. The `cli` feature adds the `lumina` front end; the `relay`
//! feature adds the quota-enforcing relay that holds the provider key.

pub mod ai;
pub mod app;
pub mod capture;
pub mod error;
pub mod models;
pub mod settings;
pub mod storage;

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(feature = "relay")]
pub mod relay;

pub use error::{LuminaError, Result};
