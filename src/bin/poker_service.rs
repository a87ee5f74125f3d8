use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use poker_core::game::{GameConfig, GameEngine};
use poker_core::messaging::TransportConfig;
use poker_core::registry::ServiceContext;
use poker_core::facade::{ServiceFacade, DEFAULT_HEARTBEAT_INTERVAL};
use poker_core::{server, InProcessTransport};

const LOG_TARGET: &str = "bin::poker_service";
const DEFAULT_BIND: &str = "127.0.0.1:4000";
const DEFAULT_TRANSPORT_ID: &str = "poker-service";
const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(10);

#[derive(Debug, Parser)]
#[command(name = "poker-service")]
#[command(about = "Run the poker game-engine façade behind an in-process transport", long_about = None)]
struct Args {
    /// Address to bind the health/readiness HTTP surface to.
    #[arg(long, env = "SERVICE_BIND", default_value = DEFAULT_BIND)]
    bind: SocketAddr,

    /// This service's own transport id on the pub/sub fabric.
    #[arg(long, env = "SERVICE_TRANSPORT_ID", default_value = DEFAULT_TRANSPORT_ID)]
    transport_id: String,

    /// Milliseconds to wait for a required-acknowledgement send before
    /// treating it as failed.
    #[arg(long, env = "SERVICE_ACK_TIMEOUT_MS", default_value_t = 5_000)]
    ack_timeout_ms: u64,

    /// Seconds between Heartbeat broadcasts; 0 disables the heartbeat.
    #[arg(long, env = "SERVICE_HEARTBEAT_SECS", default_value_t = DEFAULT_HEARTBEAT_INTERVAL.as_secs())]
    heartbeat_secs: u64,

    #[arg(long, env = "SERVICE_SMALL_BLIND", default_value_t = GameConfig::default().small_blind)]
    small_blind: u64,

    #[arg(long, env = "SERVICE_BIG_BLIND", default_value_t = GameConfig::default().big_blind)]
    big_blind: u64,

    #[arg(long, env = "SERVICE_MAX_BET", default_value_t = GameConfig::default().max_bet)]
    max_bet: u64,

    #[arg(long, env = "SERVICE_MAX_TABLE_LIMIT", default_value_t = GameConfig::default().max_table_limit)]
    max_table_limit: u64,

    #[arg(long, env = "SERVICE_MAX_PLAYERS", default_value_t = GameConfig::default().max_players)]
    max_players: usize,

    /// Toggle structured (JSON) logs.
    #[arg(long, env = "SERVICE_LOG_JSON", default_value_t = false)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    let args = Args::parse();
    init_tracing(args.json)?;

    let ctx = ServiceContext::new();
    let transport = InProcessTransport::register_with_context(args.transport_id.clone(), &ctx);
    transport
        .initialize(TransportConfig::new(args.transport_id.clone(), Duration::from_millis(args.ack_timeout_ms)))
        .context("failed to initialize transport")?;
    transport.start();

    let config = GameConfig {
        small_blind: args.small_blind,
        big_blind: args.big_blind,
        max_bet: args.max_bet,
        max_table_limit: args.max_table_limit,
        max_players: args.max_players,
    };
    let engine = GameEngine::new(config);

    let heartbeat_interval =
        (args.heartbeat_secs > 0).then(|| Duration::from_secs(args.heartbeat_secs));
    let facade = ServiceFacade::spawn(transport.clone(), engine, &ctx, heartbeat_interval);

    let router = server::build_router(facade);
    let listener = TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    let local_addr = listener.local_addr()?;
    info!(target: LOG_TARGET, %local_addr, transport_id = %args.transport_id, "poker-service listening");

    let shutdown_ctx = ctx.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown_ctx))
        .await
        .context("server exited with error")
}

fn load_dotenv() {
    let manifest_env = env!("CARGO_MANIFEST_DIR");
    let manifest_env_path = PathBuf::from(manifest_env).join(".env");
    dotenv::from_filename(manifest_env_path).ok();
    dotenv::dotenv().ok();
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt::fmt().with_env_filter(filter).with_target(false);

    if json {
        builder.json().flatten_event(true).init();
    } else {
        builder.compact().init();
    }

    Ok(())
}

async fn shutdown_signal(ctx: std::sync::Arc<ServiceContext>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(target: LOG_TARGET, %err, "failed to install ctrl-c handler");
    }
    info!(target: LOG_TARGET, "shutdown signal received");
    ctx.shutdown.shutdown_all(SHUTDOWN_DEADLINE);
}
