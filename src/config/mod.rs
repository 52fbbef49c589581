//! Configuration loading, parsing, and validation
//!
//! Configuration is a TOML file with kebab-case keys. Most fields carry
//! defaults; only the target URL is required.

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{Config, OutputConfig, ScraperConfig, SelectorOverrides, TargetConfig};
pub use validation::validate;
