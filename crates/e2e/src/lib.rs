//! ENSEK Energy E2E Test Framework
//!
//! This crate drives the hosted ENSEK "Buy Energy" web app and its REST API:
//! - Browser cases are built from typed steps and run by Playwright via Node
//! - API cases go straight over HTTP with bearer auth
//! - Known defects of the target are annotated, or fail the run when strict
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    E2E Test Runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── load_fixture() -> Fixture                            │
//! │    ├── preflight()  (UI and API origins answer)             │
//! │    ├── ApiSuite: login, reset, buy, orders                  │
//! │    └── BuyEnergySuite -> BuyEnergyPage -> Scenario          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Scenario                                                   │
//! │    ├── steps: [Step]                                        │
//! │    │     ├── goto { url }                                   │
//! │    │     ├── fill { locator, value }                        │
//! │    │     ├── click { locator }                              │
//! │    │     ├── expect { locator, expectation }                │
//! │    │     └── capture { key, locator, read }                 │
//! │    └── rendered into one Playwright script per case         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod locator;
pub mod step;
pub mod playwright;
pub mod page;
pub mod api;
pub mod target;
pub mod runner;
pub mod suites;

pub use api::{ApiClient, ApiConfig};
pub use error::{E2eError, E2eResult};
pub use locator::Locator;
pub use page::BuyEnergyPage;
pub use playwright::{PlaywrightConfig, PlaywrightHandle};
pub use runner::{RunnerConfig, TestRunner};
pub use step::{Scenario, Step};
