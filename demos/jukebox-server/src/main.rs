//! Jukebox room server binary.
//!
//! # Usage
//!
//! ```bash
//! # Listen on 0.0.0.0:3000
//! jukebox-server
//!
//! # Pick the port from the environment
//! PORT=8080 jukebox-server
//!
//! # Bind a specific interface with verbose logs
//! jukebox-server --bind 127.0.0.1:4000 --log-level debug
//! ```

use clap::Parser;
use jukebox::prelude::*;
use tracing_subscriber::{
    EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Shared playback room server
#[derive(Parser, Debug)]
#[command(name = "jukebox-server")]
#[command(about = "Shared playback rooms over WebSocket")]
#[command(version)]
struct Args {
    /// Full `host:port` to bind to; overrides --port
    #[arg(short, long)]
    bind: Option<String>,

    /// Port to listen on, on all interfaces
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn server_config(&self) -> ServerConfig {
        match &self.bind {
            Some(addr) => ServerConfig::with_bind_addr(addr.as_str()),
            None => ServerConfig::with_port(self.port),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let config = args.server_config();
    tracing::info!(bind = %config.bind_addr, "Jukebox server starting");

    let server = JukeboxServer::builder().config(config).build().await?;
    tracing::info!("Server listening on {}", server.local_addr()?);

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use std::time::Duration;
    use tokio_tungstenite::tungstenite::Message;

    #[test]
    fn bind_overrides_port() {
        let args = Args::try_parse_from([
            "jukebox-server",
            "--bind",
            "127.0.0.1:4000",
            "--port",
            "9",
        ])
        .unwrap();
        assert_eq!(args.server_config().bind_addr, "127.0.0.1:4000");
    }

    #[test]
    fn port_listens_on_all_interfaces() {
        let args =
            Args::try_parse_from(["jukebox-server", "--port", "8080"]).unwrap();
        assert_eq!(args.server_config().bind_addr, "0.0.0.0:8080");
        assert_eq!(args.log_level, "info");
    }

    #[test]
    fn rejects_non_numeric_port() {
        let parsed =
            Args::try_parse_from(["jukebox-server", "--port", "eighty"]);
        assert!(parsed.is_err());
    }

    #[tokio::test]
    async fn serves_a_room_end_to_end() {
        let server = JukeboxServer::builder()
            .config(ServerConfig::with_bind_addr("127.0.0.1:0"))
            .build()
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.run());

        let (mut ws, _) =
            tokio_tungstenite::connect_async(format!("ws://{addr}"))
                .await
                .unwrap();
        let join = Envelope {
            seq: 0,
            timestamp: 0,
            payload: ClientMessage::JoinRoom(RoomKey::from("demo")),
        };
        ws.send(Message::text(serde_json::to_string(&join).unwrap()))
            .await
            .unwrap();

        let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let env: Envelope<ServerMessage> =
            serde_json::from_slice(&frame.into_data()).unwrap();
        assert_eq!(env.payload, ServerMessage::InitState(RoomState::default()));
    }
}
