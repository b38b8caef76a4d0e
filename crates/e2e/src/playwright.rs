//! Playwright browser automation
//!
//! A [`Scenario`] is compiled into one Node script so every step shares a
//! single browser session. The script reports progress as JSON lines on
//! stdout (`step`, `capture`, `log`, `failed`, `done`), which are parsed back
//! into a [`ScenarioOutcome`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;
use tokio::process::Command as TokioCommand;
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};
use crate::locator::js_str;
use crate::step::{Capture, Expectation, Read, Scenario, Step, UrlPattern};

/// Playwright browser handle
pub struct PlaywrightHandle {
    config: PlaywrightConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl std::str::FromStr for Browser {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" | "safari" => Ok(Browser::Webkit),
            other => Err(format!("unknown browser: {}", other)),
        }
    }
}

/// Result of executing a test step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,
    pub step_name: String,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub screenshot_path: Option<PathBuf>,
}

/// One line of script output
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum ScriptEvent {
    Step {
        index: usize,
        duration_ms: u64,
    },
    Capture {
        key: String,
        value: serde_json::Value,
    },
    Log {
        message: String,
    },
    Failed {
        index: usize,
        duration_ms: u64,
        error: String,
        #[serde(default)]
        screenshot: Option<PathBuf>,
    },
    Done,
}

/// Everything a scenario run reported
#[derive(Debug, Clone, Default)]
pub struct ScenarioOutcome {
    pub steps: Vec<StepResult>,
    captures: HashMap<String, serde_json::Value>,
    completed: bool,
}

impl ScenarioOutcome {
    /// Parse the script's stdout. Lines that are not events are page noise.
    fn from_output(scenario: &Scenario, stdout: &str) -> Self {
        let mut outcome = ScenarioOutcome::default();

        for line in stdout.lines() {
            let Ok(event) = serde_json::from_str::<ScriptEvent>(line.trim()) else {
                continue;
            };
            match event {
                ScriptEvent::Step { index, duration_ms } => {
                    outcome.steps.push(StepResult {
                        success: true,
                        step_name: step_name_at(scenario, index),
                        duration_ms,
                        error: None,
                        screenshot_path: None,
                    });
                }
                ScriptEvent::Capture { key, value } => {
                    outcome.captures.insert(key, value);
                }
                ScriptEvent::Log { message } => {
                    info!("[{}] {}", scenario.name, message);
                }
                ScriptEvent::Failed {
                    index,
                    duration_ms,
                    error,
                    screenshot,
                } => {
                    outcome.steps.push(StepResult {
                        success: false,
                        step_name: step_name_at(scenario, index),
                        duration_ms,
                        error: Some(error),
                        screenshot_path: screenshot,
                    });
                }
                ScriptEvent::Done => outcome.completed = true,
            }
        }

        outcome
    }

    /// First failed step, if any
    pub fn failure(&self) -> Option<&StepResult> {
        self.steps.iter().find(|s| !s.success)
    }

    pub fn is_success(&self) -> bool {
        self.completed && self.failure().is_none()
    }

    /// Turn a failed run into `StepFailed`
    pub fn ensure_success(&self) -> E2eResult<()> {
        if let Some(failed) = self.failure() {
            return Err(E2eError::StepFailed {
                step: failed.step_name.clone(),
                reason: failed.error.clone().unwrap_or_default(),
            });
        }
        if !self.completed {
            return Err(E2eError::Playwright(
                "script exited without reporting completion".to_string(),
            ));
        }
        Ok(())
    }

    /// Value reported by a capture step; `None` if the step never ran
    pub fn get<T: DeserializeOwned>(&self, capture: &Capture<T>) -> E2eResult<Option<T>> {
        match self.captures.get(capture.key()) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    /// Like [`ScenarioOutcome::get`] but a missing value is an error
    pub fn require<T: DeserializeOwned>(&self, capture: &Capture<T>) -> E2eResult<T> {
        self.get(capture)?.ok_or_else(|| {
            E2eError::Playwright(format!("no value captured for {}", capture.key()))
        })
    }
}

fn step_name_at(scenario: &Scenario, index: usize) -> String {
    scenario
        .steps
        .get(index)
        .map(Step::name)
        .unwrap_or_else(|| format!("step {}", index))
}

impl PlaywrightHandle {
    /// Create a new Playwright handle
    pub fn new(mut config: PlaywrightConfig) -> E2eResult<Self> {
        // Verify playwright is installed
        Self::check_playwright_installed()?;

        // Scripts run from a tempdir, so screenshot paths must be absolute
        std::fs::create_dir_all(&config.screenshot_dir)?;
        config.screenshot_dir = std::fs::canonicalize(&config.screenshot_dir)?;
        if let Some(dir) = &config.keep_scripts {
            std::fs::create_dir_all(dir)?;
        }

        Ok(Self { config })
    }

    pub fn config(&self) -> &PlaywrightConfig {
        &self.config
    }

    /// Check if Playwright is installed
    fn check_playwright_installed() -> E2eResult<()> {
        let output = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    /// Run every step of `scenario` in one browser session
    pub async fn run(&self, scenario: &Scenario) -> E2eResult<ScenarioOutcome> {
        let script = build_script(&self.config, scenario);

        // Write script to temp file
        let temp_dir = tempfile::tempdir()?;
        let script_path = temp_dir.path().join("scenario.js");
        std::fs::write(&script_path, &script)?;
        if let Some(dir) = &self.config.keep_scripts {
            std::fs::write(dir.join(format!("{}.js", file_stem(&scenario.name))), &script)?;
        }

        debug!(
            "Running scenario '{}' ({} steps): {}",
            scenario.name,
            scenario.len(),
            script_path.display()
        );

        let mut cmd = TokioCommand::new("node");
        cmd.arg(&script_path)
            .current_dir(temp_dir.path())
            .kill_on_drop(true);
        if let Some(node_path) = &self.config.node_path {
            cmd.env("NODE_PATH", node_path);
        }

        let output = tokio::time::timeout(self.config.script_timeout, cmd.output())
            .await
            .map_err(|_| {
                E2eError::Timeout(format!(
                    "scenario '{}' after {:?}",
                    scenario.name, self.config.script_timeout
                ))
            })??;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let outcome = ScenarioOutcome::from_output(scenario, &stdout);

        // No events at all means node never got as far as the browser
        if !output.status.success() && outcome.steps.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(E2eError::Playwright(format!(
                "Script failed:\nstdout: {}\nstderr: {}",
                stdout, stderr
            )));
        }

        if let Some(failed) = outcome.failure() {
            warn!(
                "Scenario '{}' failed at {}: {}",
                scenario.name,
                failed.step_name,
                failed.error.as_deref().unwrap_or("unknown error")
            );
        }

        Ok(outcome)
    }
}

fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Build the Playwright script for a scenario
pub fn build_script(config: &PlaywrightConfig, scenario: &Scenario) -> String {
    let mut script = String::new();

    // Header
    script.push_str(&format!(
        r#"
const {{ chromium, firefox, webkit }} = require('playwright');
const {{ expect }} = require('@playwright/test');

function report(event) {{
  console.log(JSON.stringify(event));
}}

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
  const page = await context.newPage();
  page.setDefaultTimeout({action_timeout});
  page.setDefaultNavigationTimeout({navigation_timeout});
  let step = 0;
  let started = Date.now();

  try {{
"#,
        browser = config.browser.as_str(),
        headless = config.headless,
        width = config.viewport_width,
        height = config.viewport_height,
        action_timeout = config.action_timeout_ms,
        navigation_timeout = config.navigation_timeout_ms,
    ));

    for (i, step) in scenario.steps.iter().enumerate() {
        script.push_str(&format!("\n    // Step {}: {}\n", i + 1, step.name()));
        script.push_str(&format!("    step = {}; started = Date.now();\n", i));
        script.push_str(&step_to_js(config, step));
        script.push_str(&format!(
            "\n    report({{ event: 'step', index: {}, duration_ms: Date.now() - started }});\n",
            i
        ));
    }

    let screenshot = config
        .screenshot_dir
        .join(format!("{}-failure.png", file_stem(&scenario.name)));

    // Footer
    script.push_str(&format!(
        r#"
    report({{ event: 'done' }});
  }} catch (error) {{
    let screenshot = null;
    if ({capture_failure}) {{
      screenshot = {screenshot};
      await page.screenshot({{ path: screenshot, fullPage: true }}).catch(() => {{ screenshot = null; }});
    }}
    report({{
      event: 'failed',
      index: step,
      duration_ms: Date.now() - started,
      error: String((error && error.message) || error),
      screenshot,
    }});
    process.exitCode = 1;
  }} finally {{
    await browser.close();
  }}
}})();
"#,
        capture_failure = config.screenshot_on_failure,
        screenshot = js_str(&screenshot.to_string_lossy()),
    ));

    script
}

fn url_pattern_js(pattern: &UrlPattern) -> String {
    match pattern {
        UrlPattern::Glob(glob) => js_str(glob),
        UrlPattern::Regex(source) => format!("new RegExp({})", js_str(source)),
    }
}

/// Convert a step to JavaScript code
fn step_to_js(config: &PlaywrightConfig, step: &Step) -> String {
    match step {
        Step::Goto { url } => format!("    await page.goto({});", js_str(url)),
        Step::WaitForUrl {
            pattern,
            wait_until,
        } => format!(
            "    await page.waitForURL({}, {{ waitUntil: '{}' }});",
            url_pattern_js(pattern),
            wait_until.as_str()
        ),
        Step::ExpectUrl { pattern } => format!(
            "    await expect(page).toHaveURL({}, {{ timeout: {} }});",
            url_pattern_js(pattern),
            config.expect_timeout_ms
        ),
        Step::WaitFor { locator, state } => format!(
            "    await {}.waitFor({{ state: '{}' }});",
            locator.to_js("page"),
            state.as_str()
        ),
        Step::Fill { locator, value } => {
            format!("    await {}.fill({});", locator.to_js("page"), js_str(value))
        }
        Step::Click { locator } => format!("    await {}.click();", locator.to_js("page")),
        Step::Expect {
            locator,
            expectation,
            timeout_ms,
        } => {
            let timeout = timeout_ms.unwrap_or(config.expect_timeout_ms);
            let target = format!("expect({})", locator.to_js("page"));
            match expectation {
                Expectation::Visible => {
                    format!("    await {}.toBeVisible({{ timeout: {} }});", target, timeout)
                }
                Expectation::Hidden => {
                    format!("    await {}.toBeHidden({{ timeout: {} }});", target, timeout)
                }
                Expectation::Enabled => {
                    format!("    await {}.toBeEnabled({{ timeout: {} }});", target, timeout)
                }
                Expectation::Value(v) => format!(
                    "    await {}.toHaveValue({}, {{ timeout: {} }});",
                    target,
                    js_str(v),
                    timeout
                ),
                Expectation::ContainsText(t) => format!(
                    "    await {}.toContainText({}, {{ timeout: {} }});",
                    target,
                    js_str(t),
                    timeout
                ),
            }
        }
        Step::Capture { key, locator, read } => {
            let read_js = match read {
                Read::IsVisible => "isVisible()",
                Read::InnerText => "innerText()",
            };
            format!(
                "    report({{ event: 'capture', key: {}, value: await {}.{} }});",
                js_str(key),
                locator.to_js("page"),
                read_js
            )
        }
        Step::Log { message } => {
            format!("    report({{ event: 'log', message: {} }});", js_str(message))
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Default bound for actions and locator waits
    pub action_timeout_ms: u64,

    /// Default bound for `goto` / `waitForURL`
    pub navigation_timeout_ms: u64,

    /// Default bound for `expect(...)` assertions
    pub expect_timeout_ms: u64,

    /// Hard limit for a whole scenario process
    pub script_timeout: Duration,

    /// Directory for failure screenshots
    pub screenshot_dir: PathBuf,
    pub screenshot_on_failure: bool,

    /// Where node should resolve `playwright` from
    pub node_path: Option<PathBuf>,

    /// Copy generated scripts here for debugging
    pub keep_scripts: Option<PathBuf>,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            action_timeout_ms: 15_000,
            navigation_timeout_ms: 30_000,
            expect_timeout_ms: 5_000,
            script_timeout: Duration::from_secs(120),
            screenshot_dir: PathBuf::from("test-results/screenshots"),
            screenshot_on_failure: true,
            node_path: None,
            keep_scripts: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::{Locator, Role};

    fn scenario() -> Scenario {
        let mut scenario = Scenario::new("buy gas");
        scenario.push(Step::Goto {
            url: "https://ensek.example/Energy/Buy".into(),
        });
        scenario.push(Step::Click {
            locator: Locator::role(Role::Button, "Reset"),
        });
        scenario
    }

    #[test]
    fn test_build_script_reports_each_step() {
        let script = build_script(&PlaywrightConfig::default(), &scenario());
        assert!(script.contains("await chromium.launch({ headless: true })"));
        assert!(script.contains(r#"await page.goto("https://ensek.example/Energy/Buy");"#));
        assert!(script.contains(
            r#"await page.getByRole("button", { name: "Reset", exact: false }).click();"#
        ));
        assert!(script.contains("report({ event: 'step', index: 1,"));
        assert!(script.contains("report({ event: 'done' });"));
        assert!(script.contains("buy_gas-failure.png"));
    }

    #[test]
    fn test_expect_uses_step_timeout() {
        let config = PlaywrightConfig::default();
        let step = Step::Expect {
            locator: Locator::css("input"),
            expectation: Expectation::Value("0".into()),
            timeout_ms: Some(10_000),
        };
        assert_eq!(
            step_to_js(&config, &step),
            r#"    await expect(page.locator("input")).toHaveValue("0", { timeout: 10000 });"#
        );
    }

    #[test]
    fn test_wait_for_url_regex() {
        let step = Step::WaitForUrl {
            pattern: UrlPattern::contains("/Energy/SaleConfirmed"),
            wait_until: crate::step::LoadState::DomContentLoaded,
        };
        assert_eq!(
            step_to_js(&PlaywrightConfig::default(), &step),
            r#"    await page.waitForURL(new RegExp("/Energy/SaleConfirmed"), { waitUntil: 'domcontentloaded' });"#
        );
    }

    #[test]
    fn test_outcome_parses_events_and_ignores_noise() {
        let mut scenario = scenario();
        let shown: Capture<bool> =
            scenario.capture("title", Locator::css("h1"), Read::IsVisible);
        let stdout = [
            r#"{"event":"step","index":0,"duration_ms":120}"#,
            "some page console output",
            r#"{"event":"step","index":1,"duration_ms":30}"#,
            format!(r#"{{"event":"capture","key":"{}","value":true}}"#, shown.key()).as_str(),
            r#"{"event":"step","index":2,"duration_ms":4}"#,
            r#"{"event":"done"}"#,
        ]
        .join("\n");

        let outcome = ScenarioOutcome::from_output(&scenario, &stdout);
        assert!(outcome.is_success());
        assert_eq!(outcome.steps.len(), 3);
        assert_eq!(outcome.steps[1].step_name, r#"click:role=button[name="Reset"]"#);
        assert!(outcome.require(&shown).unwrap());
    }

    #[test]
    fn test_outcome_reports_failed_step() {
        let scenario = scenario();
        let stdout = concat!(
            r#"{"event":"step","index":0,"duration_ms":120}"#,
            "\n",
            r#"{"event":"failed","index":1,"duration_ms":15000,"error":"Timeout 15000ms exceeded.","screenshot":"test-results/screenshots/buy_gas-failure.png"}"#,
        );
        let outcome = ScenarioOutcome::from_output(&scenario, stdout);
        assert!(!outcome.is_success());
        match outcome.ensure_success() {
            Err(E2eError::StepFailed { step, reason }) => {
                assert!(step.starts_with("click:"));
                assert!(reason.contains("Timeout"));
            }
            other => panic!("expected StepFailed, got {:?}", other),
        }
        assert!(outcome.failure().unwrap().screenshot_path.is_some());
    }

    #[test]
    fn test_missing_capture_is_none() {
        let mut scenario = scenario();
        let text: Capture<String> =
            scenario.capture("msg", Locator::css("h2"), Read::InnerText);
        let outcome = ScenarioOutcome::from_output(&scenario, "");
        assert_eq!(outcome.get(&text).unwrap(), None);
        assert!(outcome.require(&text).is_err());
        assert!(outcome.ensure_success().is_err());
    }

    #[test]
    fn test_browser_from_str() {
        assert_eq!("Firefox".parse::<Browser>().unwrap(), Browser::Firefox);
        assert!("lynx".parse::<Browser>().is_err());
    }
}
