//! Command-line interface
//!
//! Three subcommands: `train` a forecaster from a raw CSV, `predict` one
//! week of sales from a saved model, `explore` a dataset without training.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

use crate::data::SalesLoader;
use crate::explore;
use crate::features::{self, DATE_FORMAT};
use crate::inference::{PredictionQuery, Predictor};
use crate::training::{TrainConfig, Trainer};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString {
    s.truecolor(100, 100, 100)
}
fn accent(s: &str) -> ColoredString {
    s.truecolor(120, 170, 255)
}
fn muted(s: &str) -> ColoredString {
    s.truecolor(140, 140, 140)
}
fn ok(s: &str) -> ColoredString {
    s.truecolor(100, 210, 120)
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "storecast")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Weekly retail sales forecasting")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train a forecaster on a raw sales CSV
    Train {
        /// Input sales CSV
        #[arg(short, long)]
        data: PathBuf,

        /// Output model artifact
        #[arg(short, long, default_value = "model.storecast")]
        output: PathBuf,

        /// Seed for the train/test split and subsampling
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Fraction of rows held out for evaluation
        #[arg(long, default_value = "0.2")]
        test_fraction: f64,

        /// Number of boosting rounds
        #[arg(long, default_value = "200")]
        n_estimators: usize,

        /// Shrinkage applied to each tree
        #[arg(long, default_value = "0.1")]
        learning_rate: f64,

        /// Maximum tree depth
        #[arg(long, default_value = "6")]
        max_depth: usize,

        /// Write hold-out metrics as JSON
        #[arg(long)]
        metrics_out: Option<PathBuf>,
    },

    /// Predict weekly sales for one store and week
    Predict {
        /// Trained model artifact
        #[arg(short, long)]
        model: PathBuf,

        /// Store id
        #[arg(short, long)]
        store: i64,

        /// Week date, day first (e.g. 05-02-2010)
        #[arg(short, long)]
        date: String,

        /// Whether the week contains a holiday
        #[arg(long)]
        holiday: bool,

        /// Average temperature for the week
        #[arg(long)]
        temperature: f64,

        /// Fuel price for the week
        #[arg(long)]
        fuel_price: f64,

        /// Consumer price index
        #[arg(long)]
        cpi: f64,

        /// Unemployment rate
        #[arg(long)]
        unemployment: f64,
    },

    /// Print exploratory aggregates for a sales CSV
    Explore {
        /// Input sales CSV
        #[arg(short, long)]
        data: PathBuf,

        /// Also print the chronological trend of one store
        #[arg(short, long)]
        store: Option<i64>,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
pub fn cmd_train(
    data_path: &PathBuf,
    output: &PathBuf,
    seed: u64,
    test_fraction: f64,
    n_estimators: usize,
    learning_rate: f64,
    max_depth: usize,
    metrics_out: Option<&std::path::Path>,
) -> anyhow::Result<()> {
    section("Train");

    step_run("Loading data");
    let start = Instant::now();
    let df = SalesLoader::new().load_csv(data_path)?;
    step_done(&format!(
        "{} rows × {} cols in {:?}",
        df.height(),
        df.width(),
        start.elapsed()
    ));

    step_run("Engineering calendar features");
    let start = Instant::now();
    let engineered = features::engineer(&df)?;
    step_done(&format!("{} cols in {:?}", engineered.width(), start.elapsed()));

    let config = TrainConfig::new()
        .with_seed(seed)
        .with_test_fraction(test_fraction)
        .with_n_estimators(n_estimators)
        .with_learning_rate(learning_rate)
        .with_max_depth(max_depth);

    step_run(&format!("Training {}", "gradient-boosted trees".cyan()));
    let start = Instant::now();
    let (model, metrics) = Trainer::new(config).fit(&engineered)?;
    step_done(&format!("{:?}", start.elapsed()));

    step_run(&format!("Saving → {}", output.display()));
    model.save(output)?;
    step_done("");

    println!();
    println!(
        "  {:<16} {}",
        muted("R²"),
        format!("{:.4}", metrics.r2).white().bold()
    );
    println!("  {:<16} {}", muted("MAE"), format!("{:.2}", metrics.mae).white());
    println!("  {:<16} {}", muted("RMSE"), format!("{:.2}", metrics.rmse).white());
    println!(
        "  {:<16} {}",
        muted("Split"),
        format!("{} train / {} test", metrics.n_train, metrics.n_test).white()
    );

    if let Some(importances) = model.regressor().feature_importances() {
        let mut ranked: Vec<(&String, f64)> = model
            .feature_names()
            .iter()
            .zip(importances.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        println!();
        println!("  {}", muted("Top features"));
        for (name, importance) in ranked.iter().take(5) {
            println!("  {:<16} {:.3}", name, importance);
        }
    }
    println!();

    if let Some(path) = metrics_out {
        std::fs::write(path, serde_json::to_string_pretty(&metrics)?)?;
        println!("  {} metrics written to {}", ok("✓"), path.display());
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_predict(
    model_path: &PathBuf,
    store: i64,
    date: &str,
    holiday: bool,
    temperature: f64,
    fuel_price: f64,
    cpi: f64,
    unemployment: f64,
) -> anyhow::Result<()> {
    section("Predict");

    let date = NaiveDate::parse_from_str(date, DATE_FORMAT)
        .map_err(|e| anyhow::anyhow!("invalid date '{date}' (expected day-month-year): {e}"))?;

    step_run("Loading model");
    let predictor = Predictor::from_file(model_path)?;
    step_done(&format!(
        "{} trained {}",
        predictor.model().metadata().model_type,
        predictor.model().trained_at()
    ));

    let query = PredictionQuery {
        store,
        date,
        holiday_flag: holiday,
        temperature,
        fuel_price,
        cpi,
        unemployment,
    };
    let forecast = predictor.predict_one(&query)?;

    println!();
    println!(
        "  {:<16} {}",
        muted("Weekly sales"),
        format!("{forecast:.2}").white().bold()
    );
    println!(
        "  {:<16} {}",
        muted("Store / week"),
        format!("{store} / {date}").white()
    );
    println!();

    Ok(())
}

pub fn cmd_explore(data_path: &PathBuf, store: Option<i64>) -> anyhow::Result<()> {
    section("Explore");

    step_run("Loading data");
    let df = SalesLoader::new().load_csv(data_path)?;
    step_done(&format!("{} rows × {} cols", df.height(), df.width()));

    let sales_stats = explore::summarize(&df, crate::data::schema::WEEKLY_SALES)?;
    println!();
    println!("  {}", "Weekly sales".white().bold());
    println!(
        "  {:<10} {:<14} {:<14} {:<14} {:<14}",
        muted("count"),
        muted("mean"),
        muted("std"),
        muted("min"),
        muted("max")
    );
    println!(
        "  {:<10} {:<14.2} {:<14.2} {:<14.2} {:<14.2}",
        sales_stats.count, sales_stats.avg, sales_stats.std_dev, sales_stats.min, sales_stats.max
    );

    println!();
    println!("  {}", "Average sales by store".white().bold());
    println!("  {:<8} {:>14} {:>8}", muted("store"), muted("mean"), muted("weeks"));
    for mean in explore::store_means(&df)? {
        println!(
            "  {:<8} {:>14.2} {:>8}",
            mean.store, mean.mean_sales, mean.n_weeks
        );
    }

    println!();
    println!("  {}", "Sales by month".white().bold());
    println!("  {:<8} {:>14} {:>14}", muted("month"), muted("mean"), muted("std"));
    for month in explore::monthly_stats(&df)? {
        println!(
            "  {:<8} {:>14.2} {:>14.2}",
            month.month, month.stats.avg, month.stats.std_dev
        );
    }

    // Correlations are computed on the engineered frame so the calendar
    // features participate.
    let engineered = features::engineer(&df)?;
    let corr = explore::correlation_matrix(&engineered)?;
    println!();
    println!("  {}", "Correlation with Weekly_Sales".white().bold());
    let mut pairs: Vec<(String, f64)> = corr
        .columns
        .iter()
        .filter(|c| c.as_str() != crate::data::schema::WEEKLY_SALES)
        .filter_map(|c| {
            corr.get(c, crate::data::schema::WEEKLY_SALES)
                .map(|r| (c.clone(), r))
        })
        .collect();
    pairs.sort_by(|a, b| {
        b.1.abs()
            .partial_cmp(&a.1.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for (name, r) in pairs {
        println!("  {:<16} {:>8.3}", name, r);
    }

    if let Some(store) = store {
        println!();
        println!("  {}", format!("Store {store} trend").white().bold());
        for point in explore::store_trend(&df, store)? {
            println!("  {:<12} {:>14.2}", point.date, point.weekly_sales);
        }
    }
    println!();

    Ok(())
}
