//! Main test runner that orchestrates the API and Buy Energy suites

use std::path::PathBuf;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use ensek_common::Fixture;

use crate::api::ApiConfig;
use crate::error::E2eResult;
use crate::playwright::{PlaywrightConfig, PlaywrightHandle, StepResult};
use crate::suites::{ApiCase, ApiSuite, BuyEnergySuite, CaseReport, DefectPolicy, UiCase};
use crate::target::{wait_until_reachable, TargetConfig};

pub const API_SUITE: &str = "Energy API Tests";
pub const UI_SUITE: &str = "Buy Energy Functionality";

const DEFECT: &str = "defect";

/// Note attached to a test result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

impl Annotation {
    /// A known defect the target exhibits
    pub fn defect(description: impl Into<String>) -> Self {
        Self {
            kind: DEFECT.to_string(),
            description: description.into(),
        }
    }

    pub fn is_defect(&self) -> bool {
        self.kind == DEFECT
    }
}

/// Result of running a single test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub suite: String,
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub annotations: Vec<Annotation>,
    pub error: Option<String>,
}

impl TestResult {
    fn finish(
        suite: &str,
        name: String,
        start: Instant,
        report: CaseReport,
        outcome: E2eResult<()>,
    ) -> Self {
        Self {
            suite: suite.to_string(),
            name,
            success: outcome.is_ok(),
            duration_ms: start.elapsed().as_millis() as u64,
            steps: report.steps,
            annotations: report.annotations,
            error: outcome.err().map(|e| e.to_string()),
        }
    }

    fn not_run(suite: &str, name: String, reason: &str) -> Self {
        Self {
            suite: suite.to_string(),
            name,
            success: false,
            duration_ms: 0,
            steps: vec![],
            annotations: vec![],
            error: Some(reason.to_string()),
        }
    }
}

/// Result of running all tests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Passed tests that carry at least one defect annotation
    pub defects: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    fn push(&mut self, result: TestResult) {
        if result.success {
            self.passed += 1;
            if result.annotations.iter().any(Annotation::is_defect) {
                self.defects += 1;
            }
            info!("✓ {} ({} ms)", result.name, result.duration_ms);
        } else {
            self.failed += 1;
            error!(
                "✗ {} - {}",
                result.name,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
        for defect in result.annotations.iter().filter(|a| a.is_defect()) {
            warn!("  defect: {}", defect.description);
        }
        self.total += 1;
        self.results.push(result);
    }
}

/// Which suites to run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SuiteSelection {
    #[default]
    All,
    Api,
    Ui,
}

impl SuiteSelection {
    fn api(self) -> bool {
        matches!(self, SuiteSelection::All | SuiteSelection::Api)
    }

    fn ui(self) -> bool {
        matches!(self, SuiteSelection::All | SuiteSelection::Ui)
    }
}

/// Configuration for the test runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Fixture file; `None` uses [`Fixture::default_path`]
    pub fixture_path: Option<PathBuf>,
    /// Overrides the fixture's `baseURL`
    pub ui_base_url: Option<String>,
    /// Overrides the fixture's `apiBaseURL`
    pub api_base_url: Option<String>,
    pub playwright: PlaywrightConfig,
    pub api: ApiConfig,
    pub target: TargetConfig,
    pub suites: SuiteSelection,
    /// Run only tests whose name contains this
    pub grep: Option<String>,
    pub strict_defects: bool,
    /// Check both origins answer before running anything
    pub preflight: bool,
    pub output_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            fixture_path: None,
            ui_base_url: None,
            api_base_url: None,
            playwright: PlaywrightConfig::default(),
            api: ApiConfig::default(),
            target: TargetConfig::default(),
            suites: SuiteSelection::All,
            grep: None,
            strict_defects: false,
            preflight: true,
            output_dir: PathBuf::from("test-results"),
        }
    }
}

/// Main E2E test runner
pub struct TestRunner {
    config: RunnerConfig,
}

impl TestRunner {
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    pub fn with_config(config: RunnerConfig) -> Self {
        Self { config }
    }

    fn policy(&self) -> DefectPolicy {
        DefectPolicy {
            strict: self.config.strict_defects,
        }
    }

    fn selected(&self, name: &str) -> bool {
        self.config
            .grep
            .as_deref()
            .map_or(true, |pattern| name.contains(pattern))
    }

    /// Load the fixture and apply URL overrides
    pub fn load_fixture(&self) -> E2eResult<Fixture> {
        let mut fixture = match &self.config.fixture_path {
            Some(path) => Fixture::from_file(path)?,
            None => Fixture::load_default()?,
        };
        if let Some(url) = &self.config.ui_base_url {
            fixture.config.base_url = url.clone();
        }
        if let Some(url) = &self.config.api_base_url {
            fixture.config.api_base_url = url.clone();
        }
        debug!(
            "Fixture loaded: UI {} / API {}",
            fixture.config.base_url, fixture.config.api_base_url
        );
        Ok(fixture)
    }

    /// Fail fast when either origin does not answer
    pub async fn preflight(&self, fixture: &Fixture) -> E2eResult<()> {
        if self.config.suites.ui() {
            wait_until_reachable(&fixture.config.base_url, &self.config.target).await?;
        }
        if self.config.suites.api() {
            wait_until_reachable(&fixture.config.api_base_url, &self.config.target).await?;
        }
        Ok(())
    }

    pub async fn run(&self) -> E2eResult<TestSuiteResult> {
        let start = Instant::now();
        let fixture = self.load_fixture()?;
        if self.config.preflight {
            self.preflight(&fixture).await?;
        }

        let mut results = TestSuiteResult::default();
        if self.config.suites.api() {
            self.run_api_suite(&fixture, &mut results).await;
        }
        if self.config.suites.ui() {
            self.run_ui_suite(fixture, &mut results).await;
        }
        results.duration_ms = start.elapsed().as_millis() as u64;

        info!("");
        info!(
            "Test Results: {} passed ({} with known defects), {} failed, {} skipped ({} ms)",
            results.passed, results.defects, results.failed, results.skipped, results.duration_ms
        );
        Ok(results)
    }

    pub async fn run_api_suite(&self, fixture: &Fixture, results: &mut TestSuiteResult) {
        let (cases, skipped): (Vec<ApiCase>, Vec<ApiCase>) = ApiCase::all()
            .into_iter()
            .partition(|case| self.selected(&case.name()));
        results.skipped += skipped.len();
        if cases.is_empty() {
            return;
        }

        info!("Running {} ({} test(s))...", API_SUITE, cases.len());
        let api = ApiConfig {
            base_url: fixture.config.api_base_url.clone(),
            ..self.config.api.clone()
        };

        let suite =
            match ApiSuite::before_all(api, &fixture.config.credentials, self.policy()).await {
                Ok(suite) => suite,
                Err(e) => {
                    let reason = format!("beforeAll failed: {}", e);
                    for case in cases {
                        results.push(TestResult::not_run(API_SUITE, case.name(), &reason));
                    }
                    return;
                }
            };

        for case in cases {
            let name = case.name();
            debug!("Running test: {}", name);
            let start = Instant::now();
            let mut report = CaseReport::default();
            let outcome = suite.run(case, &mut report).await;
            results.push(TestResult::finish(API_SUITE, name, start, report, outcome));
        }
    }

    pub async fn run_ui_suite(&self, fixture: Fixture, results: &mut TestSuiteResult) {
        let (cases, skipped): (Vec<UiCase>, Vec<UiCase>) = UiCase::all(&fixture)
            .into_iter()
            .partition(|case| self.selected(&case.name(&fixture)));
        results.skipped += skipped.len();
        if cases.is_empty() {
            return;
        }

        info!("Running {} ({} test(s))...", UI_SUITE, cases.len());
        let playwright = match PlaywrightHandle::new(self.config.playwright.clone()) {
            Ok(handle) => handle,
            Err(e) => {
                let reason = e.to_string();
                for case in cases {
                    results.push(TestResult::not_run(UI_SUITE, case.name(&fixture), &reason));
                }
                return;
            }
        };

        let suite = BuyEnergySuite::new(playwright, fixture, self.policy());
        for case in cases {
            let name = case.name(suite.fixture());
            debug!("Running test: {}", name);
            let start = Instant::now();
            let mut report = CaseReport::default();
            let outcome = suite.run(case, &mut report).await;
            results.push(TestResult::finish(UI_SUITE, name, start, report, outcome));
        }
    }

    /// Write test results to JSON file
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new()
    }
}
