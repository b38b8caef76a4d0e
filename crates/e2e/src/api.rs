//! HTTP client for the ENSEK REST API
//!
//! Thin wrapper over `reqwest`: one method per route, bearer auth from the
//! token obtained by [`ApiClient::login`], status checking, and the order-id
//! extraction from purchase confirmations.

use regex::Regex;
use reqwest::{Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, trace};

use ensek_common::{
    BuyResponse, Credentials, EnergyType, LoginRequest, LoginResponse, Order, PurchaseRequest,
};

use crate::error::{E2eError, E2eResult};

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// API origin, e.g. `https://qacandidatetest.ensek.io`
    pub base_url: String,

    /// Path prefix every route lives under
    pub prefix: String,

    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://qacandidatetest.ensek.io".to_string(),
            prefix: "/ENSEK".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Status and body of a response that was not status-checked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// A successful `PUT /buy`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    pub request: PurchaseRequest,
    pub message: String,
    /// Present only when the confirmation text carries one
    pub order_id: Option<String>,
}

pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> E2eResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            config,
            token: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn route(&self, route: &str) -> String {
        format!("{}/{}", self.config.prefix.trim_end_matches('/'), route)
    }

    fn request(&self, method: Method, route: &str) -> RequestBuilder {
        let url = format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            self.route(route)
        );
        self.http.request(method, url)
    }

    fn bearer(&self, operation: &'static str) -> E2eResult<&str> {
        self.token.as_deref().ok_or(E2eError::MissingToken(operation))
    }

    /// Read the body and fail unless the status is 2xx
    async fn check(&self, method: Method, route: &str, resp: Response) -> E2eResult<String> {
        let status = resp.status();
        let body = resp.text().await?;
        debug!("{} {} -> {}", method, self.route(route), status.as_u16());
        trace!("response body: {}", body);

        if !status.is_success() {
            return Err(E2eError::UnexpectedStatus {
                method: method.to_string(),
                route: self.route(route),
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    /// Exchange credentials for a bearer token and keep it for later calls
    pub async fn login(&mut self, credentials: &Credentials) -> E2eResult<String> {
        let body = LoginRequest {
            username: credentials.username.clone(),
            password: credentials.password.clone(),
        };
        let resp = self
            .request(Method::POST, "login")
            .json(&body)
            .send()
            .await?;
        let text = self.check(Method::POST, "login", resp).await?;
        let login: LoginResponse = serde_json::from_str(&text)?;

        info!("Logged in to {} as {}", self.config.base_url, credentials.username);
        self.token = Some(login.access_token.clone());
        Ok(login.access_token)
    }

    /// Restore server-side stock and orders to their baseline
    pub async fn reset(&self) -> E2eResult<serde_json::Value> {
        let token = self.bearer("reset")?;
        let resp = self
            .request(Method::POST, "reset")
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;
        let text = self.check(Method::POST, "reset", resp).await?;

        info!("Reset fixture state: {}", text.trim());
        Ok(serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text)))
    }

    /// Buy `quantity` units. Not idempotent: every call is a new order.
    pub async fn buy(&self, energy_type: EnergyType, quantity: i64) -> E2eResult<PurchaseReceipt> {
        let request = PurchaseRequest::new(energy_type, quantity);
        let route = request.route()?;
        let token = self.bearer("buy")?;

        debug!(
            "Attempting to buy {} of {} (ID: {})",
            quantity,
            energy_type,
            energy_type.api_id()
        );
        let resp = self
            .request(Method::PUT, &route)
            .bearer_auth(token)
            .send()
            .await?;
        let text = self.check(Method::PUT, &route, resp).await?;
        let body: BuyResponse = serde_json::from_str(&text)?;

        let order_id = extract_order_id(&body.message);
        info!(
            "Bought {} {}: {} (order id: {})",
            quantity,
            energy_type,
            body.message,
            order_id.as_deref().unwrap_or("none")
        );

        Ok(PurchaseReceipt {
            request,
            message: body.message,
            order_id,
        })
    }

    /// `PUT /buy` with an arbitrary bearer value and no status check
    pub async fn buy_with_token(
        &self,
        token: &str,
        energy_type: EnergyType,
        quantity: i64,
    ) -> E2eResult<RawResponse> {
        let route = PurchaseRequest::new(energy_type, quantity).route()?;
        let resp = self
            .request(Method::PUT, &route)
            .bearer_auth(token)
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        debug!("PUT {} with supplied token -> {}", self.route(&route), status);
        trace!("response body: {}", body);
        Ok(RawResponse { status, body })
    }

    pub async fn orders(&self) -> E2eResult<Vec<Order>> {
        let token = self.bearer("orders")?;
        let resp = self
            .request(Method::GET, "orders")
            .bearer_auth(token)
            .send()
            .await?;
        let text = self.check(Method::GET, "orders", resp).await?;
        let orders: Vec<Order> = serde_json::from_str(&text)?;
        debug!("Listed {} orders", orders.len());
        Ok(orders)
    }
}

fn order_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"Your order id is ([0-9a-fA-F-]+)\.").expect("order id pattern is valid")
    })
}

/// Pull the order id out of a purchase confirmation, if it has one
pub fn extract_order_id(message: &str) -> Option<String> {
    order_id_pattern()
        .captures(message)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
