//! Error types for the ENSEK suite

use thiserror::Error;

use crate::types::EnergyType;

/// Result type alias using the common Error
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Fixture not found at {0}")]
    FixtureNotFound(String),

    #[error("Invalid fixture: {0}")]
    InvalidFixture(String),

    #[error("Unknown energy type: {0}")]
    UnknownEnergyType(String),

    #[error("{0} cannot be purchased")]
    NotPurchasable(EnergyType),

    #[error("Invalid quantity: {0:?}")]
    InvalidQuantity(String),
}
