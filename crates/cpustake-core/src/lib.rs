pub mod config;
pub mod error;
pub mod types;

pub use config::{ConfigOverrides, StakeConfig, parse_duration};
pub use error::{ConfigError, ConfigResult};
pub use types::*;
