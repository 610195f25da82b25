use clap::Parser;
use dotenv::dotenv;
use gridpioneer::cli::{Cli, Commands, PaperRunConfig, PlanCliConfig};
use gridpioneer::commands;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from the .env file
    dotenv().ok();

    let cli = Cli::parse();

    // RUST_LOG wins over --verbose when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.verbose));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Grid {
            config,
            initial_price,
            volatility,
            quote_balance,
            base_balance,
            tick_ms,
            kline_secs,
        } => {
            let run = PaperRunConfig::from_args(
                config,
                initial_price,
                volatility,
                quote_balance,
                base_balance,
                tick_ms,
                kline_secs,
            )?;
            commands::run_grid(run).await?;
        }
        Commands::Plan {
            config,
            lower,
            upper,
            bids,
            asks,
        } => {
            let plan = PlanCliConfig::from_args(config, lower, upper, bids, asks)?;
            commands::run_plan(plan)?;
        }
    }

    Ok(())
}
