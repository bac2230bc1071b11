use anyhow::{Context, Result, bail, ensure};
use chrono::{TimeZone, Utc};
use munch_core::{
    CheckoutConfig, CheckoutForm, Coordinates, KeyValueStore, LocationAssistant, LocationError,
    MemoryStore, Money, NetworkLocation, OrderingSession, PositionUnavailable, SubmissionError,
    SubmissionOutcome, ValidationError, detect_address,
};

#[derive(Debug, Clone, Copy)]
pub struct ScenarioCtx {
    pub iteration: usize,
    pub verbose: bool,
}

#[async_trait::async_trait(?Send)]
pub trait Scenario {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    async fn run(&self, ctx: &ScenarioCtx) -> Result<()>;
}

pub const ALL_SCENARIOS: &[&str] = &[
    "smoke",
    "dinein-order",
    "delivery-validation",
    "upi-deferred",
    "restore-corrupt",
    "history-snapshots",
    "location-fallback",
];

#[must_use]
pub fn get_scenario(name: &str) -> Option<Box<dyn Scenario>> {
    let scenario: Box<dyn Scenario> = match name {
        "smoke" => Box::new(Smoke),
        "dinein-order" => Box::new(DineInOrder),
        "delivery-validation" => Box::new(DeliveryValidation),
        "upi-deferred" => Box::new(UpiDeferred),
        "restore-corrupt" => Box::new(RestoreCorrupt),
        "history-snapshots" => Box::new(HistorySnapshots),
        "location-fallback" => Box::new(LocationFallback),
        _ => return None,
    };
    Some(scenario)
}

#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    ALL_SCENARIOS
        .iter()
        .filter_map(|name| get_scenario(name))
        .map(|scenario| (scenario.name(), scenario.description()))
        .collect()
}

fn fresh_session() -> (MemoryStore, OrderingSession<MemoryStore>) {
    let store = MemoryStore::new();
    let session = OrderingSession::new(store.clone(), CheckoutConfig::default_config());
    (store, session)
}

fn placed_at(ctx: &ScenarioCtx) -> chrono::DateTime<Utc> {
    let minute = u32::try_from(ctx.iteration % 60).unwrap_or(0);
    Utc.with_ymd_and_hms(2024, 6, 1, 12, minute, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

fn dine_in_form(name: &str, table: &str, payment: &str) -> CheckoutForm {
    CheckoutForm {
        name: name.to_string(),
        phone: "9876543210".to_string(),
        order_type: "dinein".to_string(),
        table_number: table.to_string(),
        payment: payment.to_string(),
        ..CheckoutForm::default()
    }
}

fn expect_rejection(
    result: Result<SubmissionOutcome, SubmissionError>,
    expected: ValidationError,
) -> Result<()> {
    match result {
        Err(SubmissionError::Validation(err)) if err == expected => Ok(()),
        Err(other) => bail!("expected {expected:?}, got error {other}"),
        Ok(outcome) => bail!("expected {expected:?}, order went through: {outcome:?}"),
    }
}

struct Smoke;

#[async_trait::async_trait(?Send)]
impl Scenario for Smoke {
    fn name(&self) -> &'static str {
        "smoke"
    }

    fn description(&self) -> &'static str {
        "Set, raise and zero a pizza quantity; totals follow"
    }

    async fn run(&self, _ctx: &ScenarioCtx) -> Result<()> {
        let (store, mut session) = fresh_session();
        let pizza = Money::from_major(250.0);

        session.set_quantity("p1", "Pizza", pizza, 1);
        ensure!(session.total_quantity() == 1, "quantity after first add");
        ensure!(session.total_price() == pizza, "price after first add");

        session.set_quantity("p1", "Pizza", pizza, 3);
        ensure!(session.total_quantity() == 3, "quantity after raise");
        ensure!(
            session.total_price() == Money::from_major(750.0),
            "price after raise was {}",
            session.total_price()
        );

        session.set_quantity("p1", "Pizza", pizza, 0);
        ensure!(session.cart().cart().is_empty(), "cart should be empty");
        ensure!(
            store.raw("cart").as_deref() == Some("[]"),
            "stored cart should be an empty list"
        );
        Ok(())
    }
}

struct DineInOrder;

#[async_trait::async_trait(?Send)]
impl Scenario for DineInOrder {
    fn name(&self) -> &'static str {
        "dinein-order"
    }

    fn description(&self) -> &'static str {
        "Dine-in cash order is recorded with tax and clears the cart"
    }

    async fn run(&self, ctx: &ScenarioCtx) -> Result<()> {
        let (_store, mut session) = fresh_session();
        session.set_quantity("b1", "Biryani", Money::from_major(100.0), 2);

        let outcome = session
            .begin_submission(&dine_in_form("Asha", "T5", "COD"), placed_at(ctx))
            .context("dine-in submission")?;
        let SubmissionOutcome::Placed(placed) = outcome else {
            bail!("cash order should not wait for payment");
        };
        ensure!(
            placed.order.total() == Money::from_major(210.0),
            "total was {}",
            placed.order.total()
        );
        ensure!(placed.order.customer().address == "Table 5", "table address");
        ensure!(placed.history_len == 1, "history length");
        ensure!(session.total_quantity() == 0, "cart should be cleared");
        Ok(())
    }
}

struct DeliveryValidation;

#[async_trait::async_trait(?Send)]
impl Scenario for DeliveryValidation {
    fn name(&self) -> &'static str {
        "delivery-validation"
    }

    fn description(&self) -> &'static str {
        "Delivery checks run in order and never touch the cart"
    }

    async fn run(&self, ctx: &ScenarioCtx) -> Result<()> {
        let (_store, mut session) = fresh_session();
        let at = placed_at(ctx);

        expect_rejection(
            session.begin_submission(&CheckoutForm::default(), at),
            ValidationError::EmptyCart,
        )?;

        session.set_quantity("d1", "Dosa", Money::from_major(80.0), 1);
        let mut form = CheckoutForm {
            name: "Ravi".to_string(),
            phone: "9000000000".to_string(),
            order_type: "delivery".to_string(),
            address: "abc".to_string(),
            payment: "COD".to_string(),
            ..CheckoutForm::default()
        };
        expect_rejection(
            session.begin_submission(&form, at),
            ValidationError::InvalidAddress,
        )?;
        ensure!(session.total_quantity() == 1, "cart changed after rejection");

        form.name = "   ".to_string();
        expect_rejection(
            session.begin_submission(&form, at),
            ValidationError::MissingName,
        )?;

        form.name = "Ravi".to_string();
        form.address = String::new();
        form.detected_location = "12 MG Road, Bengaluru".to_string();
        let outcome = session.begin_submission(&form, at)?;
        ensure!(
            matches!(outcome, SubmissionOutcome::Placed(ref placed)
                if placed.order.customer().address == "12 MG Road, Bengaluru"),
            "detected address should be used"
        );
        Ok(())
    }
}

struct UpiDeferred;

#[async_trait::async_trait(?Send)]
impl Scenario for UpiDeferred {
    fn name(&self) -> &'static str {
        "upi-deferred"
    }

    fn description(&self) -> &'static str {
        "UPI orders wait for the payment view and tokens are single-use"
    }

    async fn run(&self, ctx: &ScenarioCtx) -> Result<()> {
        let (_store, mut session) = fresh_session();
        session.set_quantity("p1", "Pizza", Money::from_major(250.0), 2);

        let outcome = session.begin_submission(&dine_in_form("Meera", "7", "UPI"), placed_at(ctx))?;
        let SubmissionOutcome::AwaitingPayment(pending) = outcome else {
            bail!("UPI order should wait for payment");
        };
        ensure!(session.total_quantity() == 2, "cart kept while paying");
        ensure!(session.order_history().is_empty(), "nothing recorded yet");

        session.set_quantity("c1", "Coke", Money::from_major(50.0), 1);
        let placed = session.complete_submission(pending.token)?;
        ensure!(
            placed.order.total() == Money::from_major(525.0),
            "snapshot total was {}",
            placed.order.total()
        );
        ensure!(session.total_quantity() == 0, "cart cleared after payment");

        match session.complete_submission(pending.token) {
            Err(SubmissionError::UnknownToken(_)) => Ok(()),
            other => bail!("second completion should be rejected, got {other:?}"),
        }
    }
}

struct RestoreCorrupt;

#[async_trait::async_trait(?Send)]
impl Scenario for RestoreCorrupt {
    fn name(&self) -> &'static str {
        "restore-corrupt"
    }

    fn description(&self) -> &'static str {
        "Corrupt or partial stored carts restore safely"
    }

    async fn run(&self, _ctx: &ScenarioCtx) -> Result<()> {
        let config = CheckoutConfig::default_config();
        for raw in ["{not json", "42", r#"{"id":"p1"}"#, "null"] {
            let store = MemoryStore::new();
            store.insert_raw(&config.cart_key, raw);
            let session = OrderingSession::new(store, config.clone());
            ensure!(session.total_quantity() == 0, "{raw:?} should restore empty");
        }

        let store = MemoryStore::new();
        store.insert_raw(
            &config.cart_key,
            r#"[{"id":"p1","name":"Pizza","price":"250","qty":2},{"id":"x","name":"Bad","price":10,"qty":0},{"name":"NoId","price":5,"qty":1}]"#,
        );
        let session = OrderingSession::new(store, config);
        ensure!(session.total_quantity() == 2, "only the valid row survives");
        ensure!(session.total_price() == Money::from_major(500.0), "price coerced");
        Ok(())
    }
}

struct HistorySnapshots;

#[async_trait::async_trait(?Send)]
impl Scenario for HistorySnapshots {
    fn name(&self) -> &'static str {
        "history-snapshots"
    }

    fn description(&self) -> &'static str {
        "Recorded orders keep their snapshot after later cart edits"
    }

    async fn run(&self, ctx: &ScenarioCtx) -> Result<()> {
        let (store, mut session) = fresh_session();
        let at = placed_at(ctx);

        session.set_quantity("p1", "Pizza", Money::from_major(250.0), 2);
        session.begin_submission(&dine_in_form("A", "1", "COD"), at)?;
        session.set_quantity("c1", "Coke", Money::from_major(50.0), 4);
        session.begin_submission(&dine_in_form("B", "2", "Card"), at)?;
        session.set_quantity("p1", "Pizza", Money::from_major(250.0), 9);

        let orders = session.order_history();
        ensure!(orders.len() == 2, "expected 2 orders, found {}", orders.len());
        ensure!(orders[0].total() == Money::from_major(525.0), "first order total");
        ensure!(orders[1].total() == Money::from_major(210.0), "second order total");
        ensure!(orders[0].customer().name == "A", "submission order kept");

        store.set_reject_writes(true);
        let failed = session.begin_submission(&dine_in_form("C", "3", "COD"), at);
        ensure!(
            matches!(failed, Err(SubmissionError::Storage(_))),
            "failed history write should surface"
        );
        store.set_reject_writes(false);
        ensure!(session.total_quantity() == 9, "cart kept after failed write");
        ensure!(
            store.get_item("orderHistory")?.is_some(),
            "history still stored"
        );
        Ok(())
    }
}

struct ScriptedLocator {
    address: Option<&'static str>,
    network: Option<NetworkLocation>,
}

#[async_trait::async_trait(?Send)]
impl LocationAssistant for ScriptedLocator {
    async fn lookup_address(&self, _coords: Coordinates) -> Option<String> {
        self.address.map(str::to_string)
    }

    async fn lookup_by_network_address(&self) -> Option<NetworkLocation> {
        self.network.clone()
    }
}

struct LocationFallback;

#[async_trait::async_trait(?Send)]
impl Scenario for LocationFallback {
    fn name(&self) -> &'static str {
        "location-fallback"
    }

    fn description(&self) -> &'static str {
        "Address detection falls back from GPS to IP lookup to retry hints"
    }

    async fn run(&self, ctx: &ScenarioCtx) -> Result<()> {
        let fix = Coordinates {
            latitude: 19.07,
            longitude: 72.87,
        };
        let geocoded = ScriptedLocator {
            address: Some("Marine Drive, Mumbai"),
            network: None,
        };
        let detected = detect_address(&geocoded, Ok(fix))
            .await
            .map_err(|err| anyhow::anyhow!("fix should resolve: {err}"))?;
        ensure!(
            detected.customer_address == "Marine Drive, Mumbai",
            "geocoded address"
        );

        let by_ip = ScriptedLocator {
            address: None,
            network: Some(NetworkLocation {
                city: Some("Mumbai".to_string()),
                region: Some("Maharashtra".to_string()),
                postal_code: Some("400001".to_string()),
                country: Some("IN".to_string()),
            }),
        };
        let detected = detect_address(&by_ip, Err(PositionUnavailable::Failed))
            .await
            .map_err(|err| anyhow::anyhow!("IP fallback should resolve: {err}"))?;
        if ctx.verbose {
            println!("   IP fallback resolved to {}", detected.customer_address);
        }
        ensure!(
            detected.customer_address == "Mumbai, Maharashtra, 400001, IN",
            "IP display was {}",
            detected.customer_address
        );

        let offline = ScriptedLocator {
            address: None,
            network: None,
        };
        let unsupported = detect_address(&offline, Err(PositionUnavailable::Unsupported)).await;
        ensure!(
            unsupported == Err(LocationError::DetectionUnavailable),
            "unsupported device message"
        );
        let denied = detect_address(&offline, Err(PositionUnavailable::Failed)).await;
        ensure!(
            denied == Err(LocationError::AccessNeeded),
            "denied permission message"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_scenario_resolves() {
        for name in ALL_SCENARIOS {
            let scenario = get_scenario(name).expect("scenario registered");
            assert_eq!(scenario.name(), *name);
        }
        assert!(get_scenario("missing").is_none());
        assert_eq!(list_scenarios().len(), ALL_SCENARIOS.len());
    }

    #[tokio::test]
    async fn all_scenarios_pass() {
        let ctx = ScenarioCtx {
            iteration: 0,
            verbose: false,
        };
        for name in ALL_SCENARIOS {
            let scenario = get_scenario(name).expect("scenario registered");
            if let Err(err) = scenario.run(&ctx).await {
                panic!("{name} failed: {err:#}");
            }
        }
    }
}
