use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

use apm_demo::config::load_config;
use apm_demo::telemetry::{TelemetryState, TelemetryStatus};

const WATCHED_VARS: [&str; 3] = ["APM_LICENSE_KEY", "APM_APP_NAME", "APP_ENV"];

#[derive(Parser)]
#[command(name = "apm-check")]
#[command(about = "Inspect the APM configuration without starting the agent", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Report {
    status: TelemetryStatus,
    environment_variables: Vec<(String, String)>,
}

fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() > 16 {
        let head: String = chars[..8].iter().collect();
        let tail: String = chars[chars.len() - 8..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        value.to_string()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    let report = Report {
        status: TelemetryState::disabled(&config.telemetry).status(),
        environment_variables: WATCHED_VARS
            .iter()
            .map(|key| {
                let value = std::env::var(key).map(|v| mask(&v)).unwrap_or_else(|_| "NOT SET".to_string());
                (key.to_string(), value)
            })
            .collect(),
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let status = &report.status;
    println!("APM configuration check");
    println!("==================================================");
    println!("Application:");
    println!("   Environment:        {}", status.environment);
    println!("   App name:           {}", status.app_name);
    println!(
        "   License key:        {}",
        if status.configured { "CONFIGURED" } else { "NOT CONFIGURED" }
    );
    if status.configured {
        println!("   License preview:    {}", status.license_preview);
    }
    println!("   Pre-initialized:    {}", status.already_initialized_externally);

    println!();
    println!("Environment variables:");
    for (key, value) in &report.environment_variables {
        println!("   {}: {}", key, value);
    }

    println!();
    if status.configured {
        println!("APM monitoring should start correctly");
    } else {
        println!("Set a valid APM_LICENSE_KEY to enable monitoring");
    }

    Ok(())
}
