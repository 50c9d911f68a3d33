//! `rendezvous-server`: runs the relay on `0.0.0.0:$PORT`.
//!
//! Environment:
//! - `PORT`: listen port, default 3000
//! - `RENDEZVOUS_HEARTBEAT_SECS`: liveness sweep interval, default 15
//! - `RUST_LOG`: log filter, default `info`

use std::str::FromStr;
use std::time::Duration;

use rendezvous::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_HEARTBEAT_SECS: u64 = 15;

#[tokio::main]
async fn main() -> Result<(), RendezvousError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let port: u16 = env_or("PORT", DEFAULT_PORT);
    let heartbeat: u64 = env_or("RENDEZVOUS_HEARTBEAT_SECS", DEFAULT_HEARTBEAT_SECS);

    let server = RendezvousServer::builder()
        .bind(&format!("0.0.0.0:{port}"))
        .liveness(LivenessConfig::with_interval(Duration::from_secs(heartbeat)))
        .build()
        .await?;

    server.run().await
}

/// Reads and parses an environment variable, falling back on absence or
/// garbage.
fn env_or<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, %default, "unparseable setting, using default");
            default
        }),
        Err(_) => default,
    }
}
