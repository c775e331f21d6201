use clap::Parser;
use serde::Deserialize;

use dice_server::http::DiceQuery;

#[derive(Parser)]
#[command(name = "dice-cli")]
#[command(about = "Roll dice against a running dice-server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    /// Game system identifier
    #[arg(short, long, default_value = "DiceBot")]
    game: String,

    /// Dice notation, e.g. "2d6+1" or "x3 CC<=50"
    dice: String,
}

#[derive(Debug, Deserialize)]
struct RollReply {
    body: Option<String>,
    error: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let target = DiceQuery::new(cli.game, cli.dice).to_target();
    let url = format!("{}{}", cli.url.trim_end_matches('/'), target);

    let res = reqwest::get(&url).await?;
    let status = res.status();
    let reply: RollReply = res.json().await?;

    match (reply.body, reply.error) {
        (Some(body), _) if status.is_success() => println!("{body}"),
        (_, Some(error)) => {
            eprintln!("Error ({status}): {error}");
            std::process::exit(1);
        }
        _ => {
            eprintln!("Error: unexpected reply with status {status}");
            std::process::exit(1);
        }
    }

    Ok(())
}
