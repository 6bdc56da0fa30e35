//! # Funnel Configuration Library
//!
//! Typed configuration for the funnel persistence-and-sharing core.
//!
//! ## Features
//!
//! - Multi-format support (YAML, TOML, JSON), picked by file extension
//! - Every section has sensible defaults, so a missing or partial file works
//! - Validation of values the core cannot operate with
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use funnel_config::ConfigLoader;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::load_from_file("funnel.toml").await?;
//!     println!("remote timeout: {:?}", config.sync.remote_timeout());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod components;
mod config;
mod error;
mod loader;

pub use components::*;
pub use config::FunnelConfig;
pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigFormat, ConfigLoader};
