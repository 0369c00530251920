//! Tokenmint Core
//!
//! Shared vocabulary for the tokenmint access-token service: the error
//! taxonomy, the access-token model and the server configuration.

pub mod config;
pub mod error;
pub mod token;

pub use config::{LogFormat, ServerConfig};
pub use error::{Error, ExchangeError, Result};
pub use token::AccessToken;
