//! Error types for E2E testing

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Target unreachable: {url} did not answer after {attempts} attempts")]
    TargetUnreachable { url: String, attempts: usize },

    #[error("Playwright not found. Install with: npm i -D @playwright/test && npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Step failed: {step} - {reason}")]
    StepFailed { step: String, reason: String },

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Unexpected status {status} from {method} {route}: {body}")]
    UnexpectedStatus {
        method: String,
        route: String,
        status: u16,
        body: String,
    },

    #[error("Not logged in: call login() before {0}")]
    MissingToken(&'static str),

    #[error("Defect treated as failure: {0}")]
    StrictDefect(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Common(#[from] ensek_common::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;

/// Fail the current test with `AssertionFailed` unless `cond` holds
macro_rules! ensure {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::error::E2eError::AssertionFailed(format!($($arg)+)));
        }
    };
}

pub(crate) use ensure;
