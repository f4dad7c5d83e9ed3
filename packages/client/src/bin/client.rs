//! Terminal participant for a Tsunagi room.
//!
//! Creates a room (or joins the one given with `--room`), sends each input
//! line as a chat message and prints whatever the peer sends. Reconnects on
//! connection loss (max 5 attempts, 1 second apart); a rejected join exits
//! with status 1.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tsunagi-client -- --name alice
//! cargo run --bin tsunagi-client -- --name bob --room AB12C
//! ```

use clap::Parser;

use tsunagi_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "tsunagi-client")]
#[command(about = "Terminal participant for a Tsunagi room", long_about = None)]
struct Args {
    /// Name shown to the other participant (unique within the room)
    #[arg(short = 'n', long)]
    name: String,

    /// Room code to join; a new room is created when omitted
    #[arg(short = 'r', long)]
    room: Option<String>,

    /// Relay base URL
    #[arg(short = 's', long, default_value = "http://127.0.0.1:8080")]
    server: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    if let Err(e) = tsunagi_client::run_client(args.server, args.room, args.name).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
