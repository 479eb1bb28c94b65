//! Churn Prediction Pipeline
//!
//! Trains every candidate on a synthetic subscriber base, keeps the best F1,
//! writes the two artifacts to a temporary directory, reloads them and scores
//! a few new customers the way the HTTP service would.
//!
//! Run with: cargo run --example churn_pipeline

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::error::Error;
use std::sync::Arc;
use telco_churn::config::TrainConfig;
use telco_churn::dataset::ChurnTable;
use telco_churn::model::{BoostingConfig, CandidateSpec, ForestConfig, LogisticConfig};
use telco_churn::schema::{Field, MonetaryValue};
use telco_churn::service::{InferenceService, LoadedArtifacts};
use telco_churn::training::TrainingDriver;
use telco_churn::CustomerRecord;

fn pick<'a>(rng: &mut StdRng, values: &[&'a str]) -> &'a str {
    values[rng.gen_range(0..values.len())]
}

/// One synthetic subscriber. Churn risk rises with month-to-month contracts,
/// fiber, electronic checks and short tenure.
fn synthetic_customer(rng: &mut StdRng) -> (CustomerRecord, u8) {
    let internet = pick(rng, &["DSL", "Fiber optic", "No"]);
    let phone = rng.gen_bool(0.9);
    let contract = pick(rng, &["Month-to-month", "One year", "Two year"]);
    let payment = pick(
        rng,
        &[
            "Electronic check",
            "Mailed check",
            "Bank transfer (automatic)",
            "Credit card (automatic)",
        ],
    );
    let tenure = f64::from(rng.gen_range(0..=72u32));
    let monthly = (rng.gen_range(18.0..118.0_f64) * 100.0).round() / 100.0;

    let addon = |rng: &mut StdRng| -> String {
        if internet == "No" {
            "No internet service".into()
        } else {
            pick(rng, &["No", "Yes"]).into()
        }
    };
    let online_security = addon(rng);
    let online_backup = addon(rng);
    let device_protection = addon(rng);
    let tech_support = addon(rng);
    let streaming_tv = addon(rng);
    let streaming_movies = addon(rng);

    // New subscribers with no billing history arrive with a blank total.
    let total_charges = if tenure == 0.0 {
        MonetaryValue::Text(" ".into())
    } else {
        MonetaryValue::Text(format!("{:.2}", tenure * monthly))
    };

    let mut risk: f64 = -2.0;
    if contract == "Month-to-month" {
        risk += 1.8;
    }
    if internet == "Fiber optic" {
        risk += 0.8;
    }
    if payment == "Electronic check" {
        risk += 0.6;
    }
    if tech_support == "Yes" {
        risk -= 0.5;
    }
    risk -= tenure / 24.0;
    let churned = u8::from(rng.gen_bool(1.0 / (1.0 + (-risk).exp())));

    let record = CustomerRecord {
        gender: pick(rng, &["Female", "Male"]).into(),
        senior_citizen: i64::from(rng.gen_bool(0.16)),
        partner: pick(rng, &["Yes", "No"]).into(),
        dependents: pick(rng, &["Yes", "No"]).into(),
        tenure,
        phone_service: if phone { "Yes" } else { "No" }.into(),
        multiple_lines: if phone {
            pick(rng, &["No", "Yes"])
        } else {
            "No phone service"
        }
        .into(),
        internet_service: internet.into(),
        online_security,
        online_backup,
        device_protection,
        tech_support,
        streaming_tv,
        streaming_movies,
        contract: contract.into(),
        paperless_billing: pick(rng, &["Yes", "No"]).into(),
        payment_method: payment.into(),
        monthly_charges: monthly,
        total_charges,
    };
    (record, churned)
}

fn synthetic_table(n: usize, seed: u64) -> Result<ChurnTable, Box<dyn Error>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let (records, labels) = (0..n).map(|_| synthetic_customer(&mut rng)).unzip();
    Ok(ChurnTable::from_parts(Field::ALL.to_vec(), records, labels)?)
}

fn main() -> Result<(), Box<dyn Error>> {
    println!("=== Telco Churn Prediction Pipeline ===\n");

    // 1. Data
    let table = synthetic_table(1500, 7)?;
    let summary = table.summary();
    println!("Generated {} customers", summary.rows);
    println!(
        "  churned: {} ({:.1}%)",
        summary.churned,
        100.0 * summary.churned as f64 / summary.rows as f64
    );
    println!("  blank TotalCharges: {}", summary.malformed_total_charges);

    // 2. Train and select
    let config = TrainConfig {
        candidates: vec![
            CandidateSpec::RandomForest(ForestConfig {
                n_trees: 50,
                ..Default::default()
            }),
            CandidateSpec::GradientBoosting(BoostingConfig {
                n_rounds: 50,
                ..Default::default()
            }),
            CandidateSpec::LogisticRegression(LogisticConfig::default()),
        ],
        ..Default::default()
    };
    let driver = TrainingDriver::new(config)?;
    println!("\nTraining candidates...");
    let outcome = driver.train(&table)?;
    println!(
        "  train/test split: {}/{}",
        outcome.train_rows, outcome.test_rows
    );
    println!("\n{}", outcome.comparison());

    let best = outcome.selected_result();
    println!("\nSelected: {}", best.kind);
    println!("{}", best.metrics.report());

    // 3. Persist and reload
    let dir = tempfile::tempdir()?;
    let paths = outcome.persist(dir.path())?;
    println!("\nArtifacts written:");
    println!("  {}", paths.model.display());
    println!("  {}", paths.encoders.display());

    let service = InferenceService::new(Arc::new(LoadedArtifacts::load(&paths)?));

    // 4. Score new customers
    println!("\nScoring new customers:");
    let mut rng = StdRng::seed_from_u64(2024);
    for i in 0..5 {
        let (record, _) = synthetic_customer(&mut rng);
        let prediction = service.predict(&record)?;
        println!(
            "  #{} {:<15} tenure {:>4} -> {:<3} (p = {:.3})",
            i + 1,
            record.contract,
            record.tenure,
            prediction.label,
            prediction.probability
        );
    }

    // A malformed request is rejected without disturbing the service.
    let (mut bad, _) = synthetic_customer(&mut rng);
    bad.gender = "Unknown".into();
    match service.predict(&bad) {
        Ok(_) => println!("\nunexpectedly accepted a malformed request"),
        Err(err) => println!("\nRejected malformed request: {}", err),
    }

    Ok(())
}
