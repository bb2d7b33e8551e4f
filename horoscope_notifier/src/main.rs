use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use dotenv::dotenv;
use horoscope_notifier::config::{Cli, Settings};
use horoscope_notifier::job::Runner;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing(debug: bool) {
    let default = if debug {
        "info,horoscope_notifier=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(cli: Cli) -> anyhow::Result<usize> {
    let settings = Settings::from_cli(cli).context("invalid configuration")?;
    let runner = Runner::new(settings).context("failed to set up HTTP clients")?;
    runner.run().await.context("could not determine today's post")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // 1) .env first so clap sees GCHAT_WEBHOOK
    dotenv().ok();

    // 2) flags
    let cli = Cli::parse();
    init_tracing(cli.debug);
    info!("starting: askjiyun daily horoscope delivery");

    // 3) jobs
    match run(cli).await {
        Ok(0) => {
            info!("finished");
            ExitCode::SUCCESS
        }
        Ok(failures) => {
            error!("{failures} job(s) failed");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("run failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}
