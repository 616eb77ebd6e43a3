use clap::Parser;
use log::info;
use server::network::{Server, ServerConfig};
use std::time::Duration;

/// Main-method of the application.
/// Parses command-line arguments, then runs the game server until interrupted.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Command line arguments
    #[derive(Parser, Debug)]
    #[clap(author, version, about)]
    struct Args {
        /// Server IP address to bind to
        #[clap(short = 'H', long, default_value = "127.0.0.1")]
        host: String,
        /// Server port to listen on
        #[clap(short, long, default_value = "8080")]
        port: u16,
        /// Seconds a silent connection stays bound
        #[clap(long, default_value = "30")]
        session_timeout: u64,
        /// Seconds an empty room lingers before teardown
        #[clap(long, default_value = "300")]
        room_idle_timeout: u64,
        /// Maximum number of concurrent rooms
        #[clap(long, default_value = "1024")]
        max_rooms: usize,
    }

    env_logger::init();

    let args = Args::parse();
    let config = ServerConfig {
        max_rooms: args.max_rooms,
        session_timeout: Duration::from_secs(args.session_timeout),
        room_idle_timeout: Duration::from_secs(args.room_idle_timeout),
    };

    let address = format!("{}:{}", args.host, args.port);
    let mut server = Server::new(&address, config).await?;

    // Handle shutdown gracefully
    tokio::select! {
        result = server.run() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
