//! Error type for gwas-common

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Config file could not be read or parsed, or failed validation
    #[error("Configuration error: {0}")]
    Config(String),
}
