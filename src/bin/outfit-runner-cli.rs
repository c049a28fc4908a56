use anyhow::{anyhow, Result};
use clap::Parser;
use outfit_runner::client::OutfitRunnerClientWrapper;
use outfit_runner::codec::{JsonCodec, MsgPackCodec, PayloadCodec};
use outfit_runner::look::OutfitRequest;
use std::io::{self, Read, Write};

#[derive(Parser)]
#[command(name = "outfit-runner-cli")]
#[command(about = "CLI client for the OutfitRunner gRPC service")]
struct Cli {
    /// Server address (e.g., "http://localhost:50051")
    #[arg(short, long, default_value = "http://localhost:50051")]
    server: String,

    /// Request file: a JSON object with `wardrobe` and optional constraints ("-" for stdin)
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Item ids that must be part of the outfit, added to the request's own
    #[arg(long, value_delimiter = ',')]
    forced: Vec<i64>,

    /// Item ids to avoid, added to the request's own
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<i64>,

    /// Free-text context (occasion, weather...)
    #[arg(short, long)]
    context: Option<String>,

    /// Model attempts before falling back to rule-based assembly
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Output format: json or msgpack
    #[arg(short, long, default_value = "json")]
    format: String,

    /// Request timeout in seconds
    #[arg(short, long, default_value = "120")]
    timeout: u64,
}

impl Cli {
    fn apply_overrides(&self, request: &mut OutfitRequest) {
        request.forced_item_ids.extend(&self.forced);
        request.not_liked_item_ids.extend(&self.exclude);
        if self.context.is_some() {
            request.context = self.context.clone();
        }
        if self.max_attempts.is_some() {
            request.max_attempts = self.max_attempts;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let input = if cli.input == "-" {
        let mut buffer = Vec::new();
        io::stdin()
            .read_to_end(&mut buffer)
            .map_err(|e| anyhow!("Failed to read from stdin: {e}"))?;
        buffer
    } else {
        std::fs::read(&cli.input)
            .map_err(|e| anyhow!("Failed to read input file {}: {e}", cli.input))?
    };

    let mut request: OutfitRequest = JsonCodec
        .decode(&input)
        .map_err(|e| anyhow!("Failed to parse request JSON: {e}"))?;
    cli.apply_overrides(&mut request);

    eprintln!("Connecting to OutfitRunner server at {}...", cli.server);
    let mut client = OutfitRunnerClientWrapper::connect(cli.server.clone()).await?;

    eprintln!(
        "Generating outfit from {} items ({} forced)...",
        request.wardrobe.len(),
        request.forced_item_ids.len()
    );
    let timeout = std::time::Duration::from_secs(cli.timeout);
    let view = client.generate_with_timeout(&request, timeout).await?;

    match cli.format.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&view)
                .map_err(|e| anyhow!("Failed to serialize output: {e}"))?;
            println!("{}", json);
        }
        "msgpack" => {
            let bytes = MsgPackCodec
                .encode(&view)
                .map_err(|e| anyhow!("Failed to encode output: {e}"))?;
            io::stdout()
                .write_all(&bytes)
                .map_err(|e| anyhow!("Failed to write output: {e}"))?;
        }
        _ => {
            return Err(anyhow!("Unknown output format: {}", cli.format));
        }
    }

    Ok(())
}
