use clap::{Parser, Subcommand};
use reqwest::StatusCode;
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "greet-cli")]
#[command(about = "Command-line client for the greeting service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, default_value = "/greet")]
    prefix: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the default greeting, or greet NAME
    Get { name: Option<String> },
    /// Fetch the plain-text greeting
    Plain,
    /// Change the greeting
    Set { greeting: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = format!("{}{}", cli.url.trim_end_matches('/'), cli.prefix);

    match cli.command {
        Commands::Get { name } => {
            let url = match name {
                Some(name) => format!("{base}/{name}"),
                None => base,
            };
            print_json(client.get(url).send().await?).await?;
        }
        Commands::Plain => {
            let res = client.get(format!("{base}/plain")).send().await?;
            let status = res.status();
            let text = res.text().await?;
            if status.is_success() {
                println!("{text}");
            } else {
                eprintln!("Error: service returned status {status}: {text}");
            }
        }
        Commands::Set { greeting } => {
            let res = client
                .put(format!("{base}/greeting"))
                .json(&json!({ "greeting": greeting }))
                .send()
                .await?;
            if res.status() == StatusCode::NO_CONTENT {
                println!("Greeting set to {greeting:?}");
            } else {
                print_json(res).await?;
            }
        }
    }

    Ok(())
}

async fn print_json(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let json: Value = res.json().await?;
    if !status.is_success() {
        eprintln!("Error: service returned status {status}");
    }
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
