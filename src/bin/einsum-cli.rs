use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use einsum_edge::client::{ApiClient, ApiReply};

#[derive(Parser)]
#[command(name = "einsum-cli")]
#[command(about = "Submit problems to the einsum.org compute backends", long_about = None)]
struct Cli {
    /// Site origin; requests go through its edge forwarder.
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check convexity of a tensor expression
    Convexity {
        #[arg(short, long)]
        expression: String,

        #[arg(long, default_value = "/api/")]
        path: String,
    },
    /// Generate solver code for an optimization problem
    Optimize {
        #[arg(short, long)]
        input: String,

        #[arg(long, default_value = "/api/")]
        path: String,
    },
    /// Post an arbitrary JSON payload
    Post {
        #[arg(short, long)]
        path: String,

        #[arg(short, long)]
        json: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = ApiClient::new(&cli.url)?;

    let reply = match cli.command {
        Commands::Convexity { expression, path } => {
            client
                .post(&path, &json!({ "expression": expression, "variables": [] }))
                .await?
        }
        Commands::Optimize { input, path } => client.post(&path, &json!({ "input": input })).await?,
        Commands::Post { path, json } => {
            let payload: Value = serde_json::from_str(&json)?;
            client.post(&path, &payload).await?
        }
    };

    print_reply(reply)
}

fn print_reply(reply: ApiReply) -> Result<(), Box<dyn std::error::Error>> {
    // The code generator's reply is source text; print it raw.
    if let Some(code) = reply.field_str("code") {
        println!("{code}");
        return Ok(());
    }

    match reply {
        ApiReply::Success(fields) => {
            println!("{}", serde_json::to_string_pretty(&fields)?);
            Ok(())
        }
        ApiReply::Failure { message } => {
            eprintln!("Error: {message}");
            std::process::exit(1);
        }
    }
}
