//! # sandbox-gateway
//!
//! A minimal HTTP gateway that runs untrusted code in ephemeral Docker containers.
//!
//! ## Features
//!
//! - **One container per request:** created, run and force-removed within the call
//! - **Isolation by the runtime:** no network, capped memory, weighted CPU share
//! - **Combined output:** stdout and stderr captured as one trimmed string
//! - **Bounded run phase:** runs without an exit status inside the deadline fail as timeouts

pub mod config;
pub mod error;
pub mod gateway;
pub mod sandbox;

pub use config::Config;
pub use error::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");
