//! Tsunagi relay server.
//!
//! Pairs two participants in a room and relays every JSON message one of them
//! sends to the other.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tsunagi-server
//! cargo run --bin tsunagi-server -- --host 0.0.0.0 --port 3000 --redis-url redis://127.0.0.1:6379
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use tsunagi_server::{
    config::{DEFAULT_KEY_PREFIX, RelayConfig},
    domain::{InstanceId, PresenceStore, RandomRoomCodeGenerator},
    infrastructure::{
        presence::{InMemoryPresenceStore, RedisPresenceStore},
        registry::InMemoryConnectionRegistry,
    },
    ui::Server,
    usecase::{
        ConnectParticipantUseCase, CreateRoomUseCase, DisconnectParticipantUseCase,
        GetRoomStateUseCase, RoomEvictionScheduler, SendMessageUseCase,
    },
};
use tsunagi_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "tsunagi-server")]
#[command(about = "Two-party room relay over WebSocket", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Redis URL of the shared presence store (in-memory when omitted)
    #[arg(long)]
    redis_url: Option<String>,

    /// Namespace for presence store keys
    #[arg(long, default_value = DEFAULT_KEY_PREFIX)]
    key_prefix: String,

    /// How long an empty room is kept before it is deleted, in milliseconds
    #[arg(long, default_value = "5000")]
    grace_period_ms: u64,

    /// How long a generated room nobody joins is kept, in milliseconds
    #[arg(long, default_value = "60000")]
    unclaimed_room_ttl_ms: u64,
}

impl From<Args> for RelayConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            redis_url: args.redis_url,
            key_prefix: args.key_prefix,
            grace_period: Duration::from_millis(args.grace_period_ms),
            unclaimed_room_ttl: Duration::from_millis(args.unclaimed_room_ttl_ms),
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let config = RelayConfig::from(Args::parse());
    tracing::info!(
        "Starting relay on {} (distributed: {}, grace period: {:?})",
        config.bind_addr(),
        config.is_distributed(),
        config.grace_period
    );

    // Initialize dependencies in order:
    // 1. Presence Store
    // 2. Connection Registry
    // 3. Eviction scheduler
    // 4. UseCases
    // 5. Server

    // 1. Create Presence Store
    let store: Arc<dyn PresenceStore> = match &config.redis_url {
        Some(url) => match RedisPresenceStore::connect(url, config.key_prefix.clone()).await {
            Ok(store) => {
                tracing::info!(
                    "Using Redis presence store (key prefix '{}')",
                    config.key_prefix
                );
                Arc::new(store)
            }
            Err(e) => {
                tracing::error!("Failed to connect to Redis: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            tracing::info!("Using in-memory presence store");
            Arc::new(InMemoryPresenceStore::new())
        }
    };

    // 2. Create Connection Registry (one per process)
    let instance_id = InstanceId::generate();
    let registry = Arc::new(InMemoryConnectionRegistry::new(instance_id));

    // 3. Create eviction scheduler
    let eviction = Arc::new(RoomEvictionScheduler::new(store.clone(), config.grace_period));

    // 4. Create UseCases
    let create_room_usecase = Arc::new(CreateRoomUseCase::new(
        store.clone(),
        Arc::new(RandomRoomCodeGenerator),
        eviction.clone(),
        config.unclaimed_room_ttl,
    ));
    let connect_participant_usecase = Arc::new(ConnectParticipantUseCase::new(
        store.clone(),
        registry.clone(),
        eviction.clone(),
    ));
    let disconnect_participant_usecase = Arc::new(DisconnectParticipantUseCase::new(
        store.clone(),
        registry.clone(),
        eviction.clone(),
    ));
    let send_message_usecase = Arc::new(SendMessageUseCase::new(store.clone(), registry.clone()));
    let get_room_state_usecase = Arc::new(GetRoomStateUseCase::new(store.clone()));

    // 5. Create and run the server
    let server = Server::new(
        instance_id,
        create_room_usecase,
        connect_participant_usecase,
        disconnect_participant_usecase,
        send_message_usecase,
        get_room_state_usecase,
    );
    if let Err(e) = server.run(config.host, config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
