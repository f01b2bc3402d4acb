//! WordDuel server entry point.
//!
//! Loads the configuration, initialises structured logging, builds the
//! protocol engine, and runs the TCP accept loop until Ctrl-C.
//!
//! ```text
//! main()
//!  └─ load_config()          -- TOML file or defaults
//!  └─ Engine::new()          -- registry + match table behind one mutex
//!  └─ network::serve()       -- accept loop, one task per connection
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use wordduel_server::application::engine::{Engine, EngineConfig};
use wordduel_server::infrastructure::network;
use wordduel_server::infrastructure::storage::config::load_config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Config path: first CLI argument, or ./wordduel.toml (defaults apply
    // when the file is absent).
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("wordduel.toml"));
    let config = load_config(&config_path)?;

    // Initialise structured logging.  `RUST_LOG` overrides the config file.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    info!("WordDuel server starting");

    let engine = Arc::new(Mutex::new(Engine::new(EngineConfig {
        password: config.game.password.clone(),
        max_attempts: config.game.max_attempts,
    })));

    let addr = config.network.socket_addr();
    let listener = network::bind(&addr).await?;
    info!(%addr, "listening");

    tokio::select! {
        result = network::serve(listener, engine) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    info!("WordDuel server stopped");
    Ok(())
}
