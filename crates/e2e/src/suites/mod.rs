//! The API and Buy Energy UI test suites
//!
//! Both are usable from the harness runner and from plain `#[tokio::test]`
//! functions. Each case writes what it observed into a [`CaseReport`].

pub mod api;
pub mod buy_energy;

pub use api::{ApiCase, ApiSuite};
pub use buy_energy::{BuyEnergyScenarios, BuyEnergySuite, UiCase};

use tracing::warn;

use crate::error::{E2eError, E2eResult};
use crate::playwright::StepResult;
use crate::runner::Annotation;

/// Steps and annotations collected while a case runs
#[derive(Debug, Clone, Default)]
pub struct CaseReport {
    pub steps: Vec<StepResult>,
    pub annotations: Vec<Annotation>,
}

impl CaseReport {
    pub fn defects(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter().filter(|a| a.is_defect())
    }
}

/// What to do when the target shows a known defect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefectPolicy {
    /// Fail instead of annotating
    pub strict: bool,
}

impl DefectPolicy {
    pub fn strict() -> Self {
        Self { strict: true }
    }

    /// Annotate `report` with a defect; in strict mode also fail the case
    pub fn defect(&self, report: &mut CaseReport, description: impl Into<String>) -> E2eResult<()> {
        let description = description.into();
        warn!("Defect: {}", description);
        report.annotations.push(Annotation::defect(description.clone()));
        if self.strict {
            return Err(E2eError::StrictDefect(description));
        }
        Ok(())
    }
}
