use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "intake-cli")]
#[command(about = "Staff CLI for the form intake admin API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, env = "INTAKE_ADMIN_TOKEN")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service status and the caller's identity
    Status,
    /// Show today's and upcoming bookings plus recent activity
    Dashboard,
    /// List submissions of one type (reservations, banquets, careers, ...)
    List { kind: String },
    /// Move a submission to a new status
    SetStatus {
        kind: String,
        id: String,
        status: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let base = cli.url.trim_end_matches('/');
    let request = match &cli.command {
        Commands::Status => client.get(format!("{base}/api/admin/status")),
        Commands::Dashboard => client.get(format!("{base}/api/admin/dashboard")),
        Commands::List { kind } => client.get(format!("{base}/api/admin/{kind}")),
        Commands::SetStatus { kind, id, status } => client
            .patch(format!("{base}/api/admin/{kind}/{id}/status"))
            .json(&json!({ "status": status })),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
