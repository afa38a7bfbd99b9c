use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use sift::config::Settings;
use sift::server;

#[derive(Parser)]
#[command(name = "sift", version, about = "CSV in, analyst report out.")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    settings: Settings,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the generateReport endpoint (default)
    Serve,
    /// Analyze one CSV file and print the report
    Analyze {
        /// CSV file to analyze
        path: PathBuf,

        /// Identity to record the report under
        #[arg(short, long, default_value = "local")]
        user: String,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        if tracing::enabled!(tracing::Level::ERROR) {
            tracing::error!(error = %format!("{e:#}"), "terminated with error");
        } else {
            eprintln!("error: {e:#}");
        }
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Missing secrets stop us here, before anything is served.
    let service = cli
        .settings
        .build_service()
        .context("failed to initialize")?;

    match cli.command {
        None | Some(Command::Serve) => {
            let settings = &cli.settings;
            server::serve(&settings.bind, service, settings.server_config()).await
        }
        Some(Command::Analyze { path, user }) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());

            let payload = json!({ "fileContent": content, "fileName": file_name });
            let response = service.generate_report(Some(user.as_str()), &payload).await?;

            eprintln!("report {} ({})", response.report_id, response.created_at);
            println!("{}", response.report);
            Ok(())
        }
    }
}
