//! Static test data shared by the UI and API suites
//!
//! The fixture is loaded once per run and treated as the source of truth for
//! every expected value. Nothing in the suite writes it back.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{remaining_stock_message, EnergyType};
use crate::FIXTURE_ENV;

/// Complete fixture file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    pub config: FixtureConfig,
    pub initial_available_amounts: StockLevels,
    #[serde(default)]
    pub successful_purchases: Vec<PurchaseScenario>,
    #[serde(default)]
    pub invalid_inputs: Vec<InvalidInputScenario>,
}

/// Where the target lives and how to log in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureConfig {
    /// Web UI origin
    #[serde(rename = "baseURL")]
    pub base_url: String,

    /// REST API origin (routes live under `/ENSEK`)
    #[serde(rename = "apiBaseURL", default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default)]
    pub credentials: Credentials,

    pub endpoints: Endpoints,
}

fn default_api_base_url() -> String {
    "https://qacandidatetest.ensek.io".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: "test".to_string(),
            password: "testing".to_string(),
        }
    }
}

/// Route fragments of the web UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoints {
    pub buy_energy: String,
    pub sale_confirmed: String,
    pub generic_error: String,
}

/// Stock per energy type right after a reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevels {
    #[serde(rename = "Gas")]
    pub gas: i64,
    #[serde(rename = "Electricity")]
    pub electricity: i64,
    #[serde(rename = "Oil")]
    pub oil: i64,
    #[serde(rename = "Nuclear", default)]
    pub nuclear: i64,
}

impl StockLevels {
    pub fn get(&self, energy_type: EnergyType) -> i64 {
        match energy_type {
            EnergyType::Gas => self.gas,
            EnergyType::Electricity => self.electricity,
            EnergyType::Oil => self.oil,
            EnergyType::Nuclear => self.nuclear,
        }
    }
}

/// A purchase the UI is expected to confirm
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseScenario {
    pub energy_type: EnergyType,
    pub amount: String,
    /// `false` where the target confirms the sale without touching stock
    #[serde(default = "default_true")]
    pub stock_deducted: bool,
}

fn default_true() -> bool {
    true
}

/// Input the UI either rejects or (wrongly) accepts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidInputScenario {
    #[serde(rename = "type")]
    pub energy_type: EnergyType,
    pub value: String,
    pub expected_message_part: String,
}

/// Integer value of a quantity field.
///
/// Strict: the target binds the field as an integer, so "12abc" or "1.5"
/// land on its error page and are not quantities here either.
pub fn parse_quantity(raw: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| Error::InvalidQuantity(raw.to_string()))
}

impl Fixture {
    /// Parse a fixture from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let fixture: Self = serde_json::from_str(json)?;
        fixture.validate()?;
        Ok(fixture)
    }

    /// Parse a fixture from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FixtureNotFound(path.display().to_string()));
        }
        debug!("Loading fixture from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// `$ENSEK_FIXTURE`, or the file checked into `test_data/`
    pub fn default_path() -> PathBuf {
        std::env::var_os(FIXTURE_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                Path::new(env!("CARGO_MANIFEST_DIR"))
                    .join("../../test_data/energy_purchase_data.json")
            })
    }

    /// Load from [`Fixture::default_path`]
    pub fn load_default() -> Result<Self> {
        Self::from_file(&Self::default_path())
    }

    fn validate(&self) -> Result<()> {
        if self.config.base_url.is_empty() {
            return Err(Error::InvalidFixture("config.baseURL is empty".into()));
        }
        for scenario in &self.successful_purchases {
            scenario.energy_type.ensure_purchasable()?;
            self.expected_remaining(scenario.energy_type, parse_quantity(&scenario.amount)?)?;
        }
        for scenario in &self.invalid_inputs {
            scenario.energy_type.ensure_purchasable()?;
            if let Ok(quantity) = parse_quantity(&scenario.value) {
                self.expected_remaining(scenario.energy_type, quantity)?;
            }
        }
        Ok(())
    }

    /// Absolute URL of a UI route fragment
    pub fn url(&self, fragment: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), fragment)
    }

    /// What the target should report left after buying `purchased` units.
    ///
    /// Unclamped: the target goes negative on over-stock sales.
    pub fn expected_remaining(&self, energy_type: EnergyType, purchased: i64) -> Result<i64> {
        self.initial_available_amounts
            .get(energy_type)
            .checked_sub(purchased)
            .ok_or_else(|| {
                Error::InvalidQuantity(format!(
                    "{} units of {} overflows the remaining stock",
                    purchased, energy_type
                ))
            })
    }

    /// Remaining-stock sentence for a successful purchase scenario
    pub fn expected_stock_message(&self, scenario: &PurchaseScenario) -> Result<String> {
        let remaining = if scenario.stock_deducted {
            self.expected_remaining(scenario.energy_type, parse_quantity(&scenario.amount)?)?
        } else {
            self.initial_available_amounts.get(scenario.energy_type)
        };
        Ok(remaining_stock_message(scenario.energy_type, remaining))
    }

    /// Invalid-input rows, with their index, whose value still parses as a number
    pub fn numeric_invalid_inputs(&self) -> impl Iterator<Item = (usize, &InvalidInputScenario)> {
        self.invalid_inputs
            .iter()
            .enumerate()
            .filter(|(_, s)| parse_quantity(&s.value).is_ok())
    }

    /// Invalid-input rows, with their index, the target should bounce to its error page
    pub fn non_numeric_invalid_inputs(
        &self,
    ) -> impl Iterator<Item = (usize, &InvalidInputScenario)> {
        self.invalid_inputs
            .iter()
            .enumerate()
            .filter(|(_, s)| parse_quantity(&s.value).is_err())
    }
}
