//! Page object for the ENSEK "Buy Energy" page and the pages it leads to
//!
//! Locator methods return fresh [`Locator`] descriptions. Action methods
//! append steps to a [`Scenario`]; predicates append a capture step and hand
//! back a [`Capture`] to read once the scenario has run.

use ensek_common::{EnergyType, Endpoints, Fixture};

use crate::error::E2eResult;
use crate::locator::{Locator, Role};
use crate::step::{Capture, Expectation, LoadState, Read, Scenario, Step, UrlPattern, WaitState};

const QUANTITY_INPUT: &str = r#"input[name="energyType.AmountPurchased"]"#;
const VALIDATION_ERROR: &str = "span.field-validation-error, div.validation-summary-errors";
const SUCCESS_TEXT: &str = "Thank you for your purchase";
const ERROR_TEXT: &str = "An error occurred while processing your request";

/// How long Reset gets to zero the inputs
pub const RESET_TIMEOUT_MS: u64 = 10_000;

pub struct BuyEnergyPage {
    base_url: String,
    endpoints: Endpoints,
}

impl BuyEnergyPage {
    pub fn new(base_url: impl Into<String>, endpoints: Endpoints) -> Self {
        Self {
            base_url: base_url.into(),
            endpoints,
        }
    }

    pub fn from_fixture(fixture: &Fixture) -> Self {
        Self::new(fixture.config.base_url.clone(), fixture.config.endpoints.clone())
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn buy_energy_url(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.endpoints.buy_energy
        )
    }

    // Locators

    pub fn page_title(&self) -> Locator {
        Locator::role(Role::Heading, "Buy Energy")
    }

    pub fn reset_data_button(&self) -> Locator {
        Locator::role(Role::Button, "Reset")
    }

    pub fn back_to_homepage_link(&self) -> Locator {
        Locator::role(Role::Link, "Back to Homepage")
    }

    pub fn success_message(&self) -> Locator {
        Locator::css(".alert-success").or(Locator::text(SUCCESS_TEXT))
    }

    pub fn sale_confirmed_heading(&self) -> Locator {
        Locator::role(Role::Heading, "Sale Confirmed!")
    }

    pub fn generic_error_page_heading(&self) -> Locator {
        Locator::role(Role::Heading, "Error").exact()
    }

    pub fn generic_error_message(&self) -> Locator {
        Locator::css("h2").has_text(ERROR_TEXT)
    }

    pub fn buy_more_link(&self) -> Locator {
        Locator::role(Role::Link, "Buy more »")
    }

    /// Table row for an energy type
    pub fn row(&self, energy_type: EnergyType) -> Locator {
        Locator::css("tr").has_text(energy_type.label())
    }

    pub fn input_locator(&self, energy_type: EnergyType) -> E2eResult<Locator> {
        let energy_type = energy_type.ensure_purchasable()?;
        Ok(self.row(energy_type).locate(Locator::css(QUANTITY_INPUT)))
    }

    pub fn buy_button_locator(&self, energy_type: EnergyType) -> E2eResult<Locator> {
        let energy_type = energy_type.ensure_purchasable()?;
        Ok(self
            .row(energy_type)
            .locate(Locator::role(Role::Button, "Buy")))
    }

    pub fn energy_type_error_locator(&self, energy_type: EnergyType) -> E2eResult<Locator> {
        let energy_type = energy_type.ensure_purchasable()?;
        Ok(self.row(energy_type).locate(Locator::css(VALIDATION_ERROR)))
    }

    fn nuclear_not_available_cell(&self) -> Locator {
        self.row(EnergyType::Nuclear)
            .locate(Locator::css("td").has_text("Not Available"))
    }

    // Actions

    pub fn goto(&self, scenario: &mut Scenario) {
        scenario.push(Step::Goto {
            url: self.buy_energy_url(),
        });
    }

    pub fn is_buy_energy_page_displayed(&self, scenario: &mut Scenario) -> Capture<bool> {
        scenario.push(Step::WaitForUrl {
            pattern: UrlPattern::ends_with(&self.endpoints.buy_energy),
            wait_until: LoadState::NetworkIdle,
        });
        scenario.capture("buy_energy_page_displayed", self.page_title(), Read::IsVisible)
    }

    pub fn is_nuclear_not_available(&self, scenario: &mut Scenario) -> Capture<bool> {
        scenario.capture(
            "nuclear_not_available",
            self.nuclear_not_available_cell(),
            Read::IsVisible,
        )
    }

    pub fn enter_units_required(
        &self,
        scenario: &mut Scenario,
        energy_type: EnergyType,
        value: &str,
    ) -> E2eResult<()> {
        let input = self.input_locator(energy_type)?;
        scenario.push(Step::WaitFor {
            locator: input.clone(),
            state: WaitState::Visible,
        });
        scenario.push(Step::Fill {
            locator: input,
            value: value.to_string(),
        });
        Ok(())
    }

    pub fn click_buy_button(&self, scenario: &mut Scenario, energy_type: EnergyType) -> E2eResult<()> {
        let button = self.buy_button_locator(energy_type)?;
        scenario.push(expect(button.clone(), Expectation::Visible));
        scenario.push(expect(button.clone(), Expectation::Enabled));
        scenario.push(Step::Click { locator: button });
        Ok(())
    }

    /// Click Reset and wait for the Gas input to read "0"
    pub fn click_reset_button(&self, scenario: &mut Scenario) -> E2eResult<()> {
        scenario.push(Step::Click {
            locator: self.reset_data_button(),
        });
        scenario.push(Step::Expect {
            locator: self.input_locator(EnergyType::Gas)?,
            expectation: Expectation::Value("0".to_string()),
            timeout_ms: Some(RESET_TIMEOUT_MS),
        });
        Ok(())
    }

    pub fn is_success_message_displayed(&self, scenario: &mut Scenario) -> Capture<bool> {
        scenario.capture("success_message_displayed", self.success_message(), Read::IsVisible)
    }

    pub fn success_message_text(&self, scenario: &mut Scenario) -> Capture<String> {
        scenario.capture("success_message_text", self.success_message(), Read::InnerText)
    }

    /// Wait for the generic error route, then check its heading
    pub fn is_generic_error_page_displayed(&self, scenario: &mut Scenario) -> Capture<bool> {
        let error_page = UrlPattern::contains(&self.endpoints.generic_error);
        scenario.push(Step::WaitForUrl {
            pattern: error_page.clone(),
            wait_until: LoadState::DomContentLoaded,
        });
        scenario.push(Step::ExpectUrl {
            pattern: error_page,
        });
        scenario.push(expect(self.generic_error_page_heading(), Expectation::Visible));
        scenario.capture(
            "generic_error_page_displayed",
            self.generic_error_page_heading(),
            Read::IsVisible,
        )
    }

    pub fn generic_error_message_text(&self, scenario: &mut Scenario) -> Capture<String> {
        scenario.push(expect(self.generic_error_message(), Expectation::Visible));
        scenario.capture(
            "generic_error_message_text",
            self.generic_error_message(),
            Read::InnerText,
        )
    }

    pub fn click_buy_more_link_and_return_to_buy_page(&self, scenario: &mut Scenario) {
        scenario.push(expect(self.buy_more_link(), Expectation::Visible));
        scenario.push(Step::Click {
            locator: self.buy_more_link(),
        });
        scenario.push(Step::WaitForUrl {
            pattern: UrlPattern::ends_with(&self.endpoints.buy_energy),
            wait_until: LoadState::NetworkIdle,
        });
    }

    /// Land on the sale-confirmed page and check both parts of the message
    pub fn expect_sale_confirmed(
        &self,
        scenario: &mut Scenario,
        main_message_part: &str,
        remaining_units_text: &str,
    ) {
        let confirmed = UrlPattern::contains(&self.endpoints.sale_confirmed);
        scenario.push(Step::WaitForUrl {
            pattern: confirmed.clone(),
            wait_until: LoadState::DomContentLoaded,
        });
        scenario.push(Step::ExpectUrl { pattern: confirmed });
        scenario.push(expect(self.success_message(), Expectation::Visible));
        scenario.push(expect(
            self.success_message(),
            Expectation::ContainsText(main_message_part.to_string()),
        ));
        scenario.push(expect(
            self.success_message(),
            Expectation::ContainsText(remaining_units_text.to_string()),
        ));
        scenario.push(expect(self.sale_confirmed_heading(), Expectation::Visible));
    }

    /// Fill, buy, then [`BuyEnergyPage::expect_sale_confirmed`]
    pub fn purchase_and_verify_sale_confirmed(
        &self,
        scenario: &mut Scenario,
        energy_type: EnergyType,
        amount: &str,
        main_message_part: &str,
        remaining_units_text: &str,
    ) -> E2eResult<()> {
        self.enter_units_required(scenario, energy_type, amount)?;
        self.click_buy_button(scenario, energy_type)?;
        self.expect_sale_confirmed(scenario, main_message_part, remaining_units_text);
        Ok(())
    }
}

fn expect(locator: Locator, expectation: Expectation) -> Step {
    Step::Expect {
        locator,
        expectation,
        timeout_ms: None,
    }
}
