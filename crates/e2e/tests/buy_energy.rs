//! Live Buy Energy UI tests against the hosted ENSEK web app
//!
//! Ignored by default and skipped when `node` is not on PATH; run with
//! `cargo test -p ensek-e2e --test buy_energy -- --ignored`.

use tokio::sync::Mutex;

use ensek_common::Fixture;
use ensek_e2e::playwright::{PlaywrightConfig, PlaywrightHandle};
use ensek_e2e::suites::{BuyEnergySuite, CaseReport, DefectPolicy, UiCase};

static SERIAL: Mutex<()> = Mutex::const_new(());

fn in_path(binary: &str) -> bool {
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(binary).is_file()))
        .unwrap_or(false)
}

fn suite() -> Option<BuyEnergySuite> {
    if !in_path("node") {
        eprintln!("node not found on PATH; skipping");
        return None;
    }
    let fixture = Fixture::load_default().unwrap();
    let playwright = PlaywrightHandle::new(PlaywrightConfig::default()).unwrap();
    Some(BuyEnergySuite::new(playwright, fixture, DefectPolicy::default()))
}

async fn run(case: impl Fn(&Fixture) -> Vec<UiCase>) {
    let _guard = SERIAL.lock().await;
    let Some(suite) = suite() else { return };

    for case in case(suite.fixture()) {
        let mut report = CaseReport::default();
        let name = case.name(suite.fixture());
        if let Err(e) = suite.run(case, &mut report).await {
            panic!("{}: {}", name, e);
        }
        for defect in report.defects() {
            println!("{}: defect: {}", name, defect.description);
        }
    }
}

#[tokio::test]
#[ignore = "drives a browser against the hosted ENSEK app"]
async fn test_reset_clears_inputs() {
    run(|_| vec![UiCase::ResetClearsInputs]).await;
}

#[tokio::test]
#[ignore = "drives a browser against the hosted ENSEK app"]
async fn test_successful_purchases() {
    run(|fixture| {
        (0..fixture.successful_purchases.len())
            .map(UiCase::SuccessfulPurchase)
            .collect()
    })
    .await;
}

#[tokio::test]
#[ignore = "drives a browser against the hosted ENSEK app"]
async fn test_over_stock_purchase() {
    run(|_| vec![UiCase::OverStockPurchase]).await;
}

#[tokio::test]
#[ignore = "drives a browser against the hosted ENSEK app"]
async fn test_invalid_inputs() {
    run(|fixture| {
        UiCase::all(fixture)
            .into_iter()
            .filter(|case| {
                matches!(
                    case,
                    UiCase::InvalidInputErrorPage(_) | UiCase::AcceptedInvalidQuantity(_)
                )
            })
            .collect()
    })
    .await;
}

#[tokio::test]
#[ignore = "drives a browser against the hosted ENSEK app"]
async fn test_nuclear_not_available() {
    run(|_| vec![UiCase::NuclearNotAvailable]).await;
}
