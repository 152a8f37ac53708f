// Haseq Config API
// JSON configuration loading and validation

pub mod parser;
pub mod validate;

pub use parser::{Config, ConfigError};
pub use validate::{
    ValidationError, ValidationReport, ValidationWarning, MIN_TIMEOUT_MS,
};
