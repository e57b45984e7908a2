//! farmbot.
//!
//! Headless pixel-bot core for a browser MMO client: capture the client
//! window, read bars and name labels off the pixels, and run the farming
//! state machine against what it sees.

mod app;
mod avoid;
mod behavior;
mod capture;
mod config;
mod input;
mod motion;
mod overlay;
mod stats;

fn main() -> anyhow::Result<()> {
    // Structured logging. Use `RUST_LOG=debug` etc.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    app::run()
}
