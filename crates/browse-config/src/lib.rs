//! # browse config
//!
//! Configuration for the relay connection, the scraping engine and logging.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::{ConfigLoader, RELAY_HOST_ENV, RELAY_PORT_ENV};
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
