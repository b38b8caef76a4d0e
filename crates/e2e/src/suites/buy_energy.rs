//! Buy Energy functionality, driven through the web UI
//!
//! Every case starts from the same baseline: open the Buy Energy page,
//! confirm it rendered, press Reset. Stock is shared server state, so
//! skipping the reset makes every expected value wrong.

use chrono::{Local, Timelike};
use tracing::info;

use ensek_common::{
    fixture::parse_quantity, remaining_stock_message, EnergyType, Fixture, InvalidInputScenario,
    PurchaseScenario,
};

use crate::error::{ensure, E2eError, E2eResult};
use crate::page::BuyEnergyPage;
use crate::playwright::{PlaywrightHandle, ScenarioOutcome};
use crate::step::{Capture, Expectation, Scenario, Step};
use crate::suites::{CaseReport, DefectPolicy};

/// The over-stock purchase the target wrongly accepts
pub const OVER_STOCK_PURCHASE: (EnergyType, i64) = (EnergyType::Gas, 30010);

/// Values typed before pressing Reset
const RESET_INPUTS: [(EnergyType, &str); 3] = [
    (EnergyType::Gas, "100"),
    (EnergyType::Electricity, "50"),
    (EnergyType::Oil, "10"),
];

const THANK_YOU: &str = "Thank you for your purchase";

/// Local hour from which Nuclear is expected to be on sale
const NUCLEAR_OPENING_HOUR: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiCase {
    ResetClearsInputs,
    /// Index into `successfulPurchases`
    SuccessfulPurchase(usize),
    OverStockPurchase,
    /// Index into `invalidInputs`, non-numeric value
    InvalidInputErrorPage(usize),
    /// Index into `invalidInputs`, numeric value the target still accepts
    AcceptedInvalidQuantity(usize),
    NuclearNotAvailable,
}

impl UiCase {
    /// Every case the fixture defines, in execution order
    pub fn all(fixture: &Fixture) -> Vec<UiCase> {
        let mut cases = vec![UiCase::ResetClearsInputs];
        cases.extend((0..fixture.successful_purchases.len()).map(UiCase::SuccessfulPurchase));
        cases.push(UiCase::OverStockPurchase);
        cases.extend(
            fixture
                .non_numeric_invalid_inputs()
                .map(|(i, _)| UiCase::InvalidInputErrorPage(i)),
        );
        cases.extend(
            fixture
                .numeric_invalid_inputs()
                .map(|(i, _)| UiCase::AcceptedInvalidQuantity(i)),
        );
        cases.push(UiCase::NuclearNotAvailable);
        cases
    }

    pub fn name(&self, fixture: &Fixture) -> String {
        match self {
            UiCase::ResetClearsInputs => {
                "should reset data when \"Reset\" button is clicked".to_string()
            }
            UiCase::SuccessfulPurchase(i) => match fixture.successful_purchases.get(*i) {
                Some(row) => format!(
                    "should allow purchasing {} energy ({} units), verify success, and return to Buy page",
                    row.energy_type, row.amount
                ),
                None => format!("successful purchase #{}", i),
            },
            UiCase::OverStockPurchase => format!(
                "BUG: should show incorrect success message with negative units for buying more {} than available",
                OVER_STOCK_PURCHASE.0
            ),
            UiCase::InvalidInputErrorPage(i) => match fixture.invalid_inputs.get(*i) {
                Some(row) => format!(
                    "should redirect to error page for {} with invalid input \"{}\"",
                    row.energy_type, row.value
                ),
                None => format!("invalid input #{}", i),
            },
            UiCase::AcceptedInvalidQuantity(i) => match fixture.invalid_inputs.get(*i) {
                Some(row) => format!(
                    "BUG: should confirm purchase of {} units for {}, verifying message and remaining units",
                    row.value, row.energy_type
                ),
                None => format!("invalid quantity #{}", i),
            },
            UiCase::NuclearNotAvailable => "should show Nuclear as not available".to_string(),
        }
    }
}

/// Scenarios for each case, built from the fixture without a browser
pub struct BuyEnergyScenarios {
    fixture: Fixture,
    page: BuyEnergyPage,
}

impl BuyEnergyScenarios {
    pub fn new(fixture: Fixture) -> Self {
        let page = BuyEnergyPage::from_fixture(&fixture);
        Self { fixture, page }
    }

    pub fn fixture(&self) -> &Fixture {
        &self.fixture
    }

    pub fn page(&self) -> &BuyEnergyPage {
        &self.page
    }

    /// Open the page, check it rendered, press Reset
    fn before_each(&self, scenario: &mut Scenario) -> E2eResult<Capture<bool>> {
        self.page.goto(scenario);
        let displayed = self.page.is_buy_energy_page_displayed(scenario);

        scenario.push(Step::Log {
            message: "Resetting data before each test to ensure consistent energy levels."
                .to_string(),
        });
        self.page.click_reset_button(scenario)?;

        if nuclear_hours() {
            info!("It is currently 8 PM or later. Nuclear energy should now be available.");
        }
        Ok(displayed)
    }

    pub fn reset_clears_inputs_scenario(&self, name: &str) -> E2eResult<(Scenario, Capture<bool>)> {
        let mut scenario = Scenario::new(name);
        let displayed = self.before_each(&mut scenario)?;

        for (energy, value) in RESET_INPUTS {
            self.page.enter_units_required(&mut scenario, energy, value)?;
        }
        self.page.click_reset_button(&mut scenario)?;

        for energy in EnergyType::PURCHASABLE {
            scenario.push(Step::Expect {
                locator: self.page.input_locator(energy)?,
                expectation: Expectation::Value("0".to_string()),
                timeout_ms: None,
            });
        }
        Ok((scenario, displayed))
    }

    /// Returns the scenario, the page check and the check after "Buy more"
    pub fn successful_purchase_scenario(
        &self,
        name: &str,
        row: &PurchaseScenario,
    ) -> E2eResult<(Scenario, Capture<bool>, Capture<bool>)> {
        let remaining_text = self.fixture.expected_stock_message(row)?;

        let mut scenario = Scenario::new(name);
        let displayed = self.before_each(&mut scenario)?;
        self.page.purchase_and_verify_sale_confirmed(
            &mut scenario,
            row.energy_type,
            &row.amount,
            THANK_YOU,
            &remaining_text,
        )?;

        self.page.click_buy_more_link_and_return_to_buy_page(&mut scenario);
        let back = self.page.is_buy_energy_page_displayed(&mut scenario);
        scenario.push(Step::Expect {
            locator: self.page.input_locator(row.energy_type)?,
            expectation: Expectation::Visible,
            timeout_ms: None,
        });
        Ok((scenario, displayed, back))
    }

    /// Returns the scenario, the page check and the remaining stock it expects
    pub fn over_stock_purchase_scenario(
        &self,
        name: &str,
    ) -> E2eResult<(Scenario, Capture<bool>, i64)> {
        let (energy, quantity) = OVER_STOCK_PURCHASE;
        let remaining = self.fixture.expected_remaining(energy, quantity)?;

        let mut scenario = Scenario::new(name);
        let displayed = self.before_each(&mut scenario)?;
        self.page.purchase_and_verify_sale_confirmed(
            &mut scenario,
            energy,
            &quantity.to_string(),
            &format!("{} of {} units of {}", THANK_YOU, quantity, energy),
            &remaining_stock_message(energy, remaining),
        )?;
        Ok((scenario, displayed, remaining))
    }

    /// Returns the scenario, the page check, the error heading and the message text
    pub fn invalid_input_error_page_scenario(
        &self,
        name: &str,
        row: &InvalidInputScenario,
    ) -> E2eResult<(Scenario, Capture<bool>, Capture<bool>, Capture<String>)> {
        let mut scenario = Scenario::new(name);
        let displayed = self.before_each(&mut scenario)?;

        self.page
            .enter_units_required(&mut scenario, row.energy_type, &row.value)?;
        self.page.click_buy_button(&mut scenario, row.energy_type)?;

        let heading = self.page.is_generic_error_page_displayed(&mut scenario);
        let message = self.page.generic_error_message_text(&mut scenario);
        scenario.push(Step::Expect {
            locator: self.page.generic_error_message(),
            expectation: Expectation::ContainsText(row.expected_message_part.clone()),
            timeout_ms: None,
        });
        Ok((scenario, displayed, heading, message))
    }

    /// Returns the scenario, the page check and the remaining stock it expects
    pub fn accepted_invalid_quantity_scenario(
        &self,
        name: &str,
        row: &InvalidInputScenario,
    ) -> E2eResult<(Scenario, Capture<bool>, i64)> {
        let purchased = parse_quantity(&row.value)?;
        let remaining = self.fixture.expected_remaining(row.energy_type, purchased)?;

        let mut scenario = Scenario::new(name);
        let displayed = self.before_each(&mut scenario)?;
        self.page.purchase_and_verify_sale_confirmed(
            &mut scenario,
            row.energy_type,
            &row.value,
            &row.expected_message_part,
            &remaining_stock_message(row.energy_type, remaining),
        )?;
        Ok((scenario, displayed, remaining))
    }

    /// Returns the scenario, the page check and the "Not Available" check
    pub fn nuclear_not_available_scenario(
        &self,
        name: &str,
    ) -> E2eResult<(Scenario, Capture<bool>, Capture<bool>)> {
        let mut scenario = Scenario::new(name);
        let displayed = self.before_each(&mut scenario)?;
        let unavailable = self.page.is_nuclear_not_available(&mut scenario);
        Ok((scenario, displayed, unavailable))
    }
}

pub struct BuyEnergySuite {
    playwright: PlaywrightHandle,
    scenarios: BuyEnergyScenarios,
    policy: DefectPolicy,
}

impl BuyEnergySuite {
    pub fn new(playwright: PlaywrightHandle, fixture: Fixture, policy: DefectPolicy) -> Self {
        Self {
            playwright,
            scenarios: BuyEnergyScenarios::new(fixture),
            policy,
        }
    }

    pub fn fixture(&self) -> &Fixture {
        self.scenarios.fixture()
    }

    pub fn page(&self) -> &BuyEnergyPage {
        self.scenarios.page()
    }

    pub async fn run(&self, case: UiCase, report: &mut CaseReport) -> E2eResult<()> {
        let name = case.name(self.fixture());
        match case {
            UiCase::ResetClearsInputs => self.reset_clears_inputs(&name, report).await,
            UiCase::SuccessfulPurchase(i) => {
                let row = self.fixture().successful_purchases.get(i).ok_or_else(|| {
                    E2eError::AssertionFailed(format!("no successfulPurchases[{}] in fixture", i))
                })?;
                self.successful_purchase(&name, row, report).await
            }
            UiCase::OverStockPurchase => self.over_stock_purchase(&name, report).await,
            UiCase::InvalidInputErrorPage(i) => {
                let row = self.invalid_input(i)?;
                self.invalid_input_error_page(&name, row, report).await
            }
            UiCase::AcceptedInvalidQuantity(i) => {
                let row = self.invalid_input(i)?;
                self.accepted_invalid_quantity(&name, row, report).await
            }
            UiCase::NuclearNotAvailable => self.nuclear_not_available(&name, report).await,
        }
    }

    fn invalid_input(&self, index: usize) -> E2eResult<&InvalidInputScenario> {
        self.fixture().invalid_inputs.get(index).ok_or_else(|| {
            E2eError::AssertionFailed(format!("no invalidInputs[{}] in fixture", index))
        })
    }

    /// Run the scenario and fold its steps into `report`
    async fn execute(
        &self,
        scenario: &Scenario,
        displayed: &Capture<bool>,
        report: &mut CaseReport,
    ) -> E2eResult<ScenarioOutcome> {
        let outcome = self.playwright.run(scenario).await?;
        report.steps.extend(outcome.steps.iter().cloned());

        if outcome.get(displayed)? == Some(false) {
            return Err(E2eError::AssertionFailed(
                "Buy Energy page was not displayed".to_string(),
            ));
        }
        outcome.ensure_success()?;
        Ok(outcome)
    }

    pub async fn reset_clears_inputs(&self, name: &str, report: &mut CaseReport) -> E2eResult<()> {
        let (scenario, displayed) = self.scenarios.reset_clears_inputs_scenario(name)?;
        self.execute(&scenario, &displayed, report).await?;
        Ok(())
    }

    pub async fn successful_purchase(
        &self,
        name: &str,
        row: &PurchaseScenario,
        report: &mut CaseReport,
    ) -> E2eResult<()> {
        let (scenario, displayed, back) = self.scenarios.successful_purchase_scenario(name, row)?;
        let outcome = self.execute(&scenario, &displayed, report).await?;
        ensure!(
            outcome.require(&back)?,
            "Buy Energy page not displayed after following \"Buy more\""
        );
        Ok(())
    }

    pub async fn over_stock_purchase(&self, name: &str, report: &mut CaseReport) -> E2eResult<()> {
        let (energy, quantity) = OVER_STOCK_PURCHASE;
        let (scenario, displayed, remaining) = self.scenarios.over_stock_purchase_scenario(name)?;

        self.execute(&scenario, &displayed, report).await?;
        self.policy.defect(
            report,
            format!(
                "BUG: purchase of {} units of {} exceeds the {} in stock and is confirmed with {} remaining",
                quantity,
                energy,
                self.fixture().initial_available_amounts.get(energy),
                remaining
            ),
        )
    }

    pub async fn invalid_input_error_page(
        &self,
        name: &str,
        row: &InvalidInputScenario,
        report: &mut CaseReport,
    ) -> E2eResult<()> {
        let (scenario, displayed, heading, message) =
            self.scenarios.invalid_input_error_page_scenario(name, row)?;

        let outcome = self.execute(&scenario, &displayed, report).await?;
        ensure!(outcome.require(&heading)?, "error page heading not visible");
        info!("Error page message: {}", outcome.require(&message)?.trim());
        Ok(())
    }

    pub async fn accepted_invalid_quantity(
        &self,
        name: &str,
        row: &InvalidInputScenario,
        report: &mut CaseReport,
    ) -> E2eResult<()> {
        let (scenario, displayed, _) =
            self.scenarios.accepted_invalid_quantity_scenario(name, row)?;

        self.execute(&scenario, &displayed, report).await?;
        self.policy.defect(
            report,
            format!(
                "BUG: a purchase of {} units of {} is confirmed instead of rejected",
                row.value, row.energy_type
            ),
        )
    }

    pub async fn nuclear_not_available(&self, name: &str, report: &mut CaseReport) -> E2eResult<()> {
        let (scenario, displayed, unavailable) =
            self.scenarios.nuclear_not_available_scenario(name)?;

        let outcome = self.execute(&scenario, &displayed, report).await?;
        let unavailable = outcome.require(&unavailable)?;
        if nuclear_hours() {
            info!("Nuclear row marked \"Not Available\": {}", unavailable);
            return Ok(());
        }
        ensure!(unavailable, "Nuclear row is not marked \"Not Available\"");
        Ok(())
    }
}

fn nuclear_hours() -> bool {
    Local::now().hour() >= NUCLEAR_OPENING_HOUR
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::UrlPattern;

    fn fixture() -> Fixture {
        Fixture::from_json(
            r#"{
            "config": {
                "baseURL": "https://ensek.example",
                "endpoints": {
                    "buyEnergy": "/Energy/Buy",
                    "saleConfirmed": "/Energy/SaleConfirmed",
                    "genericError": "/Home/Error"
                }
            },
            "initialAvailableAmounts": { "Gas": 3000, "Electricity": 4322, "Oil": 20 },
            "successfulPurchases": [
                { "energyType": "Gas", "amount": "100" },
                { "energyType": "Electricity", "amount": "500" }
            ],
            "invalidInputs": [
                { "type": "Gas", "value": "abc", "expectedMessagePart": "An error occurred" },
                { "type": "Gas", "value": "0", "expectedMessagePart": "0 units of Gas" },
                { "type": "Electricity", "value": "-10", "expectedMessagePart": "-10 units of Electricity" },
                { "type": "Oil", "value": "12abc", "expectedMessagePart": "An error occurred" }
            ]
        }"#,
        )
        .unwrap()
    }

    fn scenarios() -> BuyEnergyScenarios {
        BuyEnergyScenarios::new(fixture())
    }

    /// Every `ContainsText` expectation, in step order
    fn expected_texts(scenario: &Scenario) -> Vec<&str> {
        scenario
            .steps
            .iter()
            .filter_map(|step| match step {
                Step::Expect {
                    expectation: Expectation::ContainsText(text),
                    ..
                } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_cases_follow_fixture() {
        let fixture = fixture();
        assert_eq!(
            UiCase::all(&fixture),
            vec![
                UiCase::ResetClearsInputs,
                UiCase::SuccessfulPurchase(0),
                UiCase::SuccessfulPurchase(1),
                UiCase::OverStockPurchase,
                UiCase::InvalidInputErrorPage(0),
                UiCase::InvalidInputErrorPage(3),
                UiCase::AcceptedInvalidQuantity(1),
                UiCase::AcceptedInvalidQuantity(2),
                UiCase::NuclearNotAvailable,
            ]
        );
    }

    #[test]
    fn test_case_names() {
        let fixture = fixture();
        assert_eq!(
            UiCase::SuccessfulPurchase(1).name(&fixture),
            "should allow purchasing Electricity energy (500 units), verify success, and return to Buy page"
        );
        assert_eq!(
            UiCase::InvalidInputErrorPage(0).name(&fixture),
            "should redirect to error page for Gas with invalid input \"abc\""
        );
        assert_eq!(
            UiCase::SuccessfulPurchase(7).name(&fixture),
            "successful purchase #7"
        );
    }

    #[test]
    fn test_every_case_starts_from_reset() {
        let scenarios = scenarios();
        let (scenario, displayed) = scenarios.reset_clears_inputs_scenario("reset").unwrap();
        assert!(matches!(&scenario.steps[0], Step::Goto { url } if url == "https://ensek.example/Energy/Buy"));
        assert_eq!(displayed.key(), "buy_energy_page_displayed#2");
        assert!(scenario
            .steps
            .iter()
            .any(|step| matches!(step, Step::Click { locator } if *locator == scenarios.page().reset_data_button())));
    }

    #[test]
    fn test_reset_checks_every_input() {
        let scenarios = scenarios();
        let (scenario, _) = scenarios.reset_clears_inputs_scenario("reset").unwrap();

        let filled: Vec<_> = scenario
            .steps
            .iter()
            .filter_map(|step| match step {
                Step::Fill { value, .. } => Some(value.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(filled, vec!["100", "50", "10"]);

        let tail = &scenario.steps[scenario.len() - 3..];
        for (step, energy) in tail.iter().zip(EnergyType::PURCHASABLE) {
            match step {
                Step::Expect {
                    locator,
                    expectation: Expectation::Value(v),
                    ..
                } => {
                    assert_eq!(*locator, scenarios.page().input_locator(energy).unwrap());
                    assert_eq!(v, "0");
                }
                other => panic!("expected a value check for {}, got {:?}", energy, other),
            }
        }
    }

    #[test]
    fn test_successful_purchase_returns_to_buy_page() {
        let scenarios = scenarios();
        let row = &scenarios.fixture().successful_purchases[0];
        let (scenario, displayed, back) = scenarios
            .successful_purchase_scenario("gas", row)
            .unwrap();

        assert_eq!(
            expected_texts(&scenario),
            vec![THANK_YOU, "There are now 2900 units of Gas left in our stores."]
        );
        assert_ne!(displayed.key(), back.key());
        assert!(matches!(
            scenario.steps.last(),
            Some(Step::Expect { expectation: Expectation::Visible, .. })
        ));
    }

    #[test]
    fn test_over_stock_purchase_expects_negative_stock() {
        let (scenario, _, remaining) = scenarios().over_stock_purchase_scenario("over").unwrap();

        assert_eq!(remaining, 3000 - 30010);
        assert_eq!(
            expected_texts(&scenario),
            vec![
                "Thank you for your purchase of 30010 units of Gas",
                "There are now -27010 units of Gas left in our stores.",
            ]
        );
    }

    #[test]
    fn test_accepted_zero_quantity_keeps_stock() {
        let scenarios = scenarios();
        let row = &scenarios.fixture().invalid_inputs[1];
        let (scenario, _, remaining) = scenarios
            .accepted_invalid_quantity_scenario("zero", row)
            .unwrap();

        assert_eq!(remaining, 3000);
        assert_eq!(
            expected_texts(&scenario),
            vec![
                "0 units of Gas",
                "There are now 3000 units of Gas left in our stores.",
            ]
        );
    }

    #[test]
    fn test_accepted_negative_quantity_adds_stock() {
        let scenarios = scenarios();
        let row = &scenarios.fixture().invalid_inputs[2];
        let (scenario, _, remaining) = scenarios
            .accepted_invalid_quantity_scenario("negative", row)
            .unwrap();

        assert_eq!(remaining, 4332);
        assert_eq!(
            expected_texts(&scenario),
            vec![
                "-10 units of Electricity",
                "There are now 4332 units of Electricity left in our stores.",
            ]
        );
    }

    #[test]
    fn test_accepted_quantity_needs_a_number() {
        let scenarios = scenarios();
        let row = &scenarios.fixture().invalid_inputs[3];
        assert!(scenarios
            .accepted_invalid_quantity_scenario("partial", row)
            .is_err());
    }

    #[test]
    fn test_error_page_checks_message_part() {
        let scenarios = scenarios();
        let row = &scenarios.fixture().invalid_inputs[0];
        let (scenario, _, heading, message) = scenarios
            .invalid_input_error_page_scenario("abc", row)
            .unwrap();

        assert!(scenario.steps.iter().any(|step| matches!(
            step,
            Step::ExpectUrl { pattern: UrlPattern::Regex(r) } if r == "/Home/Error"
        )));
        assert_eq!(expected_texts(&scenario), vec!["An error occurred"]);
        match scenario.steps.last() {
            Some(Step::Expect { locator, .. }) => {
                assert_eq!(*locator, scenarios.page().generic_error_message())
            }
            other => panic!("expected the message check last, got {:?}", other),
        }
        assert!(heading.key().starts_with("generic_error_page_displayed#"));
        assert!(message.key().starts_with("generic_error_message_text#"));
    }

    #[test]
    fn test_nuclear_scenario_reads_row() {
        let (scenario, _, unavailable) = scenarios().nuclear_not_available_scenario("nuclear").unwrap();
        assert_eq!(unavailable.key(), format!("nuclear_not_available#{}", scenario.len() - 1));
    }
}
