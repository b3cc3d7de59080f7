use anyhow::Context;
use trident_api::setup;
use trident_core::Config;

// Use mimalloc as the global allocator for better performance and lower fragmentation,
// especially when running on musl-based systems inside containers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    // Telemetry must be fully initialized before the listener is bound
    let (_state, router, telemetry) = setup::initialize_app(config.clone())?;

    setup::server::start_server(&config, router, telemetry).await?;

    Ok(())
}
