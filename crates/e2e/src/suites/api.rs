//! Energy API tests
//!
//! `before_all` logs in once and resets the server fixture; every case then
//! reuses the same token.

use tracing::{debug, info, warn};

use ensek_common::{Credentials, EnergyType};

use crate::api::{ApiClient, ApiConfig, RawResponse};
use crate::error::{ensure, E2eResult};
use crate::suites::{CaseReport, DefectPolicy};

/// Purchases placed by the buy cases and again by "Verify all orders"
pub const API_PURCHASES: [(EnergyType, i64); 3] = [
    (EnergyType::Gas, 100),
    (EnergyType::Electricity, 45),
    (EnergyType::Oil, 4),
];

pub const INVALID_TOKEN: &str = "this_is_an_invalid_token";

/// Statuses an invalid-token purchase may return without failing the case
pub const INVALID_TOKEN_STATUSES: [u16; 3] = [200, 401, 404];

const PURCHASE_CONFIRMATION: &str = "You have purchased";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiCase {
    Buy(EnergyType, i64),
    VerifyAllOrders,
    InvalidToken,
}

impl ApiCase {
    pub fn all() -> Vec<ApiCase> {
        let mut cases: Vec<ApiCase> = API_PURCHASES
            .iter()
            .map(|&(energy, quantity)| ApiCase::Buy(energy, quantity))
            .collect();
        cases.push(ApiCase::VerifyAllOrders);
        cases.push(ApiCase::InvalidToken);
        cases
    }

    pub fn name(&self) -> String {
        match self {
            ApiCase::Buy(energy, _) => format!("Buy {}", energy),
            ApiCase::VerifyAllOrders => "Verify all orders".to_string(),
            ApiCase::InvalidToken => "Buy with invalid token fails".to_string(),
        }
    }
}

pub struct ApiSuite {
    client: ApiClient,
    policy: DefectPolicy,
}

impl ApiSuite {
    /// Log in and reset the server fixture
    pub async fn before_all(
        config: ApiConfig,
        credentials: &Credentials,
        policy: DefectPolicy,
    ) -> E2eResult<Self> {
        let mut client = ApiClient::new(config)?;
        client.login(credentials).await?;
        let reset = client.reset().await?;
        debug!("Reset response body: {}", reset);
        Ok(Self { client, policy })
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub async fn run(&self, case: ApiCase, report: &mut CaseReport) -> E2eResult<()> {
        match case {
            ApiCase::Buy(energy, quantity) => self.buy_fuel(energy, quantity).await.map(|_| ()),
            ApiCase::VerifyAllOrders => self.verify_all_orders().await,
            ApiCase::InvalidToken => self.buy_with_invalid_token(report).await,
        }
    }

    /// Buy and check the confirmation; yields the order id when the
    /// message carries one
    pub async fn buy_fuel(&self, energy: EnergyType, quantity: i64) -> E2eResult<Option<String>> {
        let receipt = self.client.buy(energy, quantity).await?;
        ensure!(
            receipt.message.contains(PURCHASE_CONFIRMATION),
            "buy {} {}: message {:?} does not contain {:?}",
            quantity,
            energy,
            receipt.message,
            PURCHASE_CONFIRMATION
        );
        Ok(receipt.order_id)
    }

    /// Every order id handed out by a fresh purchase shows up in `/orders`
    pub async fn verify_all_orders(&self) -> E2eResult<()> {
        let mut created = Vec::new();
        for (energy, quantity) in API_PURCHASES {
            if let Some(id) = self.buy_fuel(energy, quantity).await? {
                created.push(id);
            }
        }
        if created.is_empty() {
            warn!("No purchase confirmation carried an order id; nothing to look up");
        }

        let orders = self.client.orders().await?;
        info!(
            "Orders listed: {}, expected ids: {:?}",
            orders.len(),
            created
        );

        for id in &created {
            let found = orders.iter().find(|o| &o.id == id);
            debug!("Searching for order ID={}, found order: {:?}", id, found);
            ensure!(
                found.is_some(),
                "Order with ID {} not found in the /orders list.",
                id
            );
        }
        Ok(())
    }

    pub async fn buy_with_invalid_token(&self, report: &mut CaseReport) -> E2eResult<()> {
        let resp = self
            .client
            .buy_with_token(INVALID_TOKEN, EnergyType::Gas, 100)
            .await?;
        info!("Invalid token buy response status: {}", resp.status);
        check_invalid_token_response(&resp, self.policy, report)
    }
}

/// 401 passes; 200 and 404 pass with a defect annotation; anything else fails
pub fn check_invalid_token_response(
    resp: &RawResponse,
    policy: DefectPolicy,
    report: &mut CaseReport,
) -> E2eResult<()> {
    ensure!(
        INVALID_TOKEN_STATUSES.contains(&resp.status),
        "invalid token purchase returned {}, expected one of {:?}",
        resp.status,
        INVALID_TOKEN_STATUSES
    );

    match resp.status {
        200 => {
            ensure!(
                resp.body.contains("purchased"),
                "200 reply to invalid token purchase does not mention a purchase: {}",
                resp.body
            );
            policy.defect(
                report,
                "BUG: API allows purchase with an invalid token (returns 200 OK) and completes the \
                 transaction. Expected: 401 Unauthorized or 404 Not Found (if token invalidation \
                 leads to route not found).",
            )?;
        }
        404 => {
            policy.defect(
                report,
                "BUG: API returns 404 Not Found for invalid token instead of 401 Unauthorized. \
                 Purchase should not happen.",
            )?;
        }
        _ => {}
    }
    Ok(())
}
