use std::process::ExitCode;

use serde::Deserialize;
use warden::prelude::*;

// ---------------------------------------------------------------------------
// API types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Prediction {
    id: u64,
    predicted_mean_size_nm: f64,
    created_at: String,
    #[serde(default)]
    image_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    warden::init_logging();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), WardenError> {
    let config = ClientConfig::from_env()?;
    let client = WardenClient::builder().config(config).build()?;

    let mut notices = client.notices();
    tokio::spawn(async move {
        while let Ok(notice) = notices.recv().await {
            let tag = match notice.severity {
                Severity::Success => "ok",
                Severity::Info => "info",
                Severity::Warning => "warn",
                Severity::Error => "error",
            };
            eprintln!("[{tag}] {}", notice.message);
        }
    });

    let state = client.bootstrap().await?;
    tracing::info!(%state, "session ready");

    if !state.is_authenticated() {
        let username = std::env::var("WARDEN_USERNAME").unwrap_or_default();
        let password = std::env::var("WARDEN_PASSWORD").unwrap_or_default();
        client.login(username, password).await?;
    }

    let identity = match client.admit().await? {
        Ok(identity) => identity,
        Err(redirect) => {
            return Err(WardenError::Config(format!(
                "not logged in, visit {} first",
                redirect.to
            )));
        }
    };

    let history: Vec<Prediction> = client.get_json("/history/").await?;
    println!("Prediction history for {}:", identity.username);
    if history.is_empty() {
        println!("  (no predictions yet)");
    }
    for entry in &history {
        println!(
            "  #{:<4} {:>8.2} nm  {:<22} {}",
            entry.id,
            entry.predicted_mean_size_nm,
            entry.created_at,
            entry.image_url.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}
