use clap::Parser;
use log::info;
use server::network::Server;
use tokio::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value_t = shared::DEFAULT_PORT)]
    port: u16,

    /// Tick rate (simulation updates per second)
    #[arg(short, long, default_value = "60")]
    tick_rate: u32,

    /// Maximum number of concurrent clients
    #[arg(short, long, default_value = "32")]
    max_clients: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let address = format!("{}:{}", args.host, args.port);
    let tick_duration = Duration::from_secs_f64(1.0 / args.tick_rate as f64);

    info!(
        "Starting server on {} at {} Hz (max {} clients)",
        address, args.tick_rate, args.max_clients
    );

    let mut server = Server::bind(&address, tick_duration, args.max_clients).await?;
    server.run().await;

    Ok(())
}
