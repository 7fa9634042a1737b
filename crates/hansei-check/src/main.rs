//! hansei-check - validate Koku report totals
//!
//! Logs in as the configured report user and checks that the cost, storage
//! and instance-type reports agree with their own line items over a matrix of
//! time scopes and groupings. Exits non-zero if any check fails.

#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod queries;
mod runner;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hansei_client::{HanseiConfig, KokuClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hansei=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = HanseiConfig::load()?;
    let deviation = config.reports.deviation()?;

    let mut client = KokuClient::from_config(&config.koku)?;
    tracing::info!(base_url = %client.base_url(), %deviation, "Configuration loaded");

    let (username, password) = config.report_credentials();
    client.login(username, password).await?;

    match client.server_status().await {
        Ok(status) => tracing::info!(
            api_version = ?status.api_version,
            commit = ?status.commit,
            server_id = ?status.server_id,
            python_version = ?status.python_version,
            "Koku server status"
        ),
        Err(err) => tracing::warn!(error = %err, "Unable to read server status"),
    }

    let matrix = queries::report_matrix();
    let summary = runner::run_matrix(&client, &matrix, deviation).await;

    if !summary.all_passed() {
        let failures = summary.failures();
        for outcome in summary.outcomes.iter().filter(|o| !o.passed()) {
            tracing::error!(kind = outcome.kind.as_str(), case = outcome.case, "Failed check");
        }
        tracing::error!(failures, checks = summary.outcomes.len(), "Report validation failed");
        return Err(format!("{failures} of {} report checks failed", summary.outcomes.len()).into());
    }

    tracing::info!(checks = summary.outcomes.len(), "All report checks passed");
    Ok(())
}
