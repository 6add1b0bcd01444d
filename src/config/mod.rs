//! Configuration module
//!
//! - types/mod.rs: Core configuration types (Config, ServerConfig)
//! - types/sandbox.rs: Container limits and image overrides
//! - io.rs: Configuration loading and env overrides
//! - validation.rs: Configuration validation
//! - paths.rs: Configuration file paths

mod io;
mod paths;
mod types;
mod validation;

pub use types::{Config, ServerConfig};
pub use types::sandbox::{parse_memory_limit, SandboxConfig};

pub use io::{apply_env_overrides, load_config, load_config_from_path, load_config_with};
pub use paths::{config_dir, config_path, load_dotenv};
pub use validation::{validate_config, ConfigValidationResult, ValidationIssue};
