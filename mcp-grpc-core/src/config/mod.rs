//! Bridge configuration: centralized defaults, environment overrides and
//! validation.

mod defaults;
mod error;

pub use defaults::{BridgeDefaults, InvalidMessagePolicy};
pub use error::ConfigError;
