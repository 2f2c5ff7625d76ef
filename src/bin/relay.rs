use chess_session::relay;
use chess_session::RelayConfig;
use clap::Parser;

/// Relay server pairing chess clients and forwarding their moves
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:3000")]
    bind: String,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let args = Args::parse();
    let config = RelayConfig { bind: args.bind };
    relay::bind(&config)?.await
}
