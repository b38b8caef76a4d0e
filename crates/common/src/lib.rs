//! ENSEK Common Library
//!
//! Domain types, wire DTOs and the static test fixture shared by the UI and
//! API suites.

pub mod error;
pub mod fixture;
pub mod types;

pub use error::{Error, Result};
pub use fixture::{
    Credentials, Endpoints, Fixture, FixtureConfig, InvalidInputScenario, PurchaseScenario,
    StockLevels,
};
pub use types::*;

/// Suite version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable that overrides the fixture location
pub const FIXTURE_ENV: &str = "ENSEK_FIXTURE";
