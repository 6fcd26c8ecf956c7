use std::process::ExitCode;

use gcloud_mcp_probe::{config::Config, logging, ClientError, Probe, StdioSession};
use tokio::io::BufReader;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    logging::init_logging();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "probe aborted");
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    info!(
        gcloud_config_dir = %config.gcloud_config_dir.display(),
        call_timeout_secs = config.call_timeout.as_secs(),
        "configuration loaded"
    );

    println!("Starting MCP Client...");
    println!(
        "Connecting to server via command: {}",
        config.server.display()
    );

    let mut session = StdioSession::spawn(&config.server, config.call_timeout)?;

    let mut stdout = std::io::stdout();
    let mut stdin = BufReader::new(tokio::io::stdin());
    let outcome: Result<(), ClientError> = Probe::new(&mut session, &mut stdout)
        .run(&mut stdin)
        .await;

    session.shutdown().await;
    outcome?;
    Ok(())
}
