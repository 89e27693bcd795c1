//! Error types for the mint agent

use thiserror::Error;

use crate::contract::ContractError;
use crate::mint::MintError;
use crate::provider::ProviderError;
use crate::session::ConnectError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Connection error: {0}")]
    Connect(#[from] ConnectError),

    #[error("Mint error: {0}")]
    Mint(#[from] MintError),

    #[error("Contract error: {0}")]
    Contract(#[from] ContractError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
