use clap::Parser;
use log::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:12345")]
    server: String,

    /// Display name to claim
    #[arg(short, long, default_value = "player")]
    name: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting headless client...");
    info!("Connecting to {} as '{}'", args.server, args.name);

    let mut client = client::network::Client::connect(&args.server, &args.name).await?;
    client.run().await?;

    Ok(())
}
