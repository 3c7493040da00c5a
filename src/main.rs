//! storecast - Main Entry Point
//!
//! Weekly retail sales forecasting from the command line.

use clap::Parser;
use storecast::cli::{cmd_explore, cmd_predict, cmd_train, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storecast=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            data,
            output,
            seed,
            test_fraction,
            n_estimators,
            learning_rate,
            max_depth,
            metrics_out,
        } => {
            cmd_train(
                &data,
                &output,
                seed,
                test_fraction,
                n_estimators,
                learning_rate,
                max_depth,
                metrics_out.as_deref(),
            )?;
        }
        Commands::Predict {
            model,
            store,
            date,
            holiday,
            temperature,
            fuel_price,
            cpi,
            unemployment,
        } => {
            cmd_predict(
                &model,
                store,
                &date,
                holiday,
                temperature,
                fuel_price,
                cpi,
                unemployment,
            )?;
        }
        Commands::Explore { data, store } => {
            cmd_explore(&data, store)?;
        }
    }

    Ok(())
}
