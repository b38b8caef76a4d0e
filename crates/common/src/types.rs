//! Core types for the ENSEK suite

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Product category offered by the purchasing UI and API
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EnergyType {
    Gas,
    Electricity,
    Oil,
    Nuclear,
}

impl EnergyType {
    /// Every row shown on the Buy Energy page
    pub const ALL: [EnergyType; 4] = [
        EnergyType::Gas,
        EnergyType::Electricity,
        EnergyType::Oil,
        EnergyType::Nuclear,
    ];

    /// Types the suite is allowed to buy
    pub const PURCHASABLE: [EnergyType; 3] =
        [EnergyType::Gas, EnergyType::Electricity, EnergyType::Oil];

    /// Row label as rendered by the web UI
    pub fn label(&self) -> &'static str {
        match self {
            EnergyType::Gas => "Gas",
            EnergyType::Electricity => "Electricity",
            EnergyType::Oil => "Oil",
            EnergyType::Nuclear => "Nuclear",
        }
    }

    /// Numeric id used by `PUT /buy/{id}/{quantity}`
    pub fn api_id(&self) -> u8 {
        match self {
            EnergyType::Gas => 1,
            EnergyType::Nuclear => 2,
            EnergyType::Electricity => 3,
            EnergyType::Oil => 4,
        }
    }

    pub fn from_api_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.api_id() == id)
    }

    /// Nuclear is flagged unavailable and never bought by this suite
    pub fn is_purchasable(&self) -> bool {
        !matches!(self, EnergyType::Nuclear)
    }

    /// Fail with `NotPurchasable` for Nuclear
    pub fn ensure_purchasable(self) -> Result<Self> {
        if self.is_purchasable() {
            Ok(self)
        } else {
            Err(Error::NotPurchasable(self))
        }
    }
}

impl std::fmt::Display for EnergyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EnergyType {
    type Err = Error;

    /// Accepts UI labels as well as the fuel names used in order listings
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gas" => Ok(EnergyType::Gas),
            "electricity" | "electric" => Ok(EnergyType::Electricity),
            "oil" => Ok(EnergyType::Oil),
            "nuclear" => Ok(EnergyType::Nuclear),
            _ => Err(Error::UnknownEnergyType(s.to_string())),
        }
    }
}

/// A single purchase, either a form submission or one HTTP call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRequest {
    pub energy_type: EnergyType,
    pub quantity: i64,
}

impl PurchaseRequest {
    pub fn new(energy_type: EnergyType, quantity: i64) -> Self {
        Self {
            energy_type,
            quantity,
        }
    }

    /// Route fragment below the API prefix, e.g. `buy/1/100`
    pub fn route(&self) -> Result<String> {
        let energy = self.energy_type.ensure_purchasable()?;
        Ok(format!("buy/{}/{}", energy.api_id(), self.quantity))
    }
}

/// Body of `POST /login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Reply of `POST /login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
}

/// Reply of `PUT /buy/{id}/{quantity}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuyResponse {
    #[serde(default)]
    pub message: String,
}

/// Server-owned order record returned by `GET /orders`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Lowercase fuel name, e.g. "gas", "electric", "oil"
    pub fuel: String,
    pub id: String,
    pub quantity: i64,
    /// RFC 2822 timestamp, e.g. "Thu, 29 May 2025 23:56:11 GMT"
    pub time: String,
}

impl Order {
    pub fn energy_type(&self) -> Option<EnergyType> {
        self.fuel.parse().ok()
    }

    /// Parsed `time`; `None` when the server sends something unexpected
    pub fn placed_at(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc2822(&self.time).ok()
    }
}

/// Confirmation line the UI renders after a sale
pub fn remaining_stock_message(energy_type: EnergyType, remaining: i64) -> String {
    format!(
        "There are now {} units of {} left in our stores.",
        remaining, energy_type
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_ids_match_remote_catalogue() {
        assert_eq!(EnergyType::Gas.api_id(), 1);
        assert_eq!(EnergyType::Nuclear.api_id(), 2);
        assert_eq!(EnergyType::Electricity.api_id(), 3);
        assert_eq!(EnergyType::Oil.api_id(), 4);
        assert_eq!(EnergyType::from_api_id(3), Some(EnergyType::Electricity));
        assert_eq!(EnergyType::from_api_id(9), None);
    }

    #[test]
    fn test_parse_order_fuel_names() {
        assert_eq!("electric".parse::<EnergyType>().unwrap(), EnergyType::Electricity);
        assert_eq!("Gas".parse::<EnergyType>().unwrap(), EnergyType::Gas);
        assert!("coal".parse::<EnergyType>().is_err());
    }

    #[test]
    fn test_nuclear_route_is_rejected() {
        let err = PurchaseRequest::new(EnergyType::Nuclear, 1).route().unwrap_err();
        assert!(matches!(err, Error::NotPurchasable(EnergyType::Nuclear)));
        assert_eq!(
            PurchaseRequest::new(EnergyType::Oil, 4).route().unwrap(),
            "buy/4/4"
        );
    }

    #[test]
    fn test_order_from_listing() {
        let json = r#"{"fuel":"gas","id":"080d9823-e874-4b5b-99ff-2021f2a59b25","quantity":100,"time":"Thu, 29 May 2025 23:56:11 GMT"}"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.energy_type(), Some(EnergyType::Gas));
        assert!(order.placed_at().is_some());

        let odd = Order {
            time: "yesterday".to_string(),
            ..order
        };
        assert!(odd.placed_at().is_none());
    }

    #[test]
    fn test_remaining_stock_message() {
        assert_eq!(
            remaining_stock_message(EnergyType::Gas, -27010),
            "There are now -27010 units of Gas left in our stores."
        );
    }
}
