//! Main application entry point for a fleetgate proxy coordinator.
//!
//! Loads configuration, starts the coordination layer against the in-process
//! bus, announces the configured seed servers and runs until a shutdown
//! signal arrives.

mod cli;
mod config;
mod host;
mod logging;
mod signals;

use cli::CliArgs;
use config::{AppConfig, BusBackend};
use fleetgate_core::{Coordinator, MemoryDirectory, ProxyHost};
use fleetgate_protocol::MemoryBus;
use fleetgate_redis::{RedisBus, RedisDirectory};
use host::StandaloneHost;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Interval between periodic health summaries.
const MONITOR_INTERVAL: Duration = Duration::from_secs(60);

pub struct Application {
    config: AppConfig,
    coordinator: Arc<Coordinator>,
}

impl Application {
    pub async fn new(args: CliArgs) -> anyhow::Result<Self> {
        // Configuration is loaded before logging exists
        let mut config = AppConfig::load_from_file(&args.config_path).await?;

        if let Some(instance_id) = args.instance_id {
            config.instance.id = instance_id;
        }
        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }
        if args.json_logs {
            config.logging.json_format = true;
        }

        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Configuration validation failed: {e}"))?;

        logging::setup_logging(&config.logging)?;

        let host: Arc<dyn ProxyHost> = Arc::new(StandaloneHost::new());
        let coordinator = match config.bus.backend {
            BusBackend::Memory => {
                warn!("⚠️ Using the in-process bus; peers will not be seen");
                Coordinator::new(
                    config.to_coordinator_config(),
                    host,
                    Arc::new(MemoryBus::new()),
                    Arc::new(MemoryDirectory::new()),
                )
            }
            BusBackend::Redis => Coordinator::new(
                config.to_coordinator_config(),
                host,
                Arc::new(RedisBus::connect(&config.bus.url).await?),
                Arc::new(RedisDirectory::connect(&config.bus.url).await?),
            ),
        };

        info!(
            "🚀 fleetgate v{} | instance '{}' | config {}",
            env!("CARGO_PKG_VERSION"),
            config.instance.id,
            args.config_path.display()
        );

        Ok(Self {
            config,
            coordinator: Arc::new(coordinator),
        })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        info!("📋 Configuration Summary:");
        info!("  ⏱️ Rescue poll interval: {}ms", self.config.routing.rescue_poll_interval_ms);
        info!("  🩺 Probe timeout: {}ms", self.config.routing.probe_timeout_ms);
        info!(
            "  🏠 Default group: '{}' (fallback: {})",
            self.config.routing.default_group, self.config.routing.default_group_fallback
        );
        info!("  🌱 Seed servers: {}", self.config.seed.servers.len());
        info!("  📡 Bus backend: {:?}", self.config.bus.backend);

        self.coordinator.start().await?;

        for seed in &self.config.seed.servers {
            if let Err(e) = self
                .coordinator
                .announce_server(seed.record(), seed.assignment())
                .await
            {
                warn!("⚠️ Could not announce seed server '{}': {}", seed.id, e);
            }
        }

        let monitoring_handle = {
            let coordinator = self.coordinator.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(MONITOR_INTERVAL);
                let mut last_received = 0u64;

                loop {
                    interval.tick().await;

                    let stats = coordinator.stats();
                    let received = stats.bridge.received - last_received;
                    last_received = stats.bridge.received;
                    let dropped = stats.bridge.decode_failures + stats.bridge.handler_failures;

                    info!(
                        "📊 System Health - {} servers | {} groups | {} rescues active | {} msgs/min | {} dropped total",
                        stats.servers, stats.groups, stats.active_rescues, received, dropped
                    );

                    let dangling = coordinator.cluster().dangling_members();
                    if !dangling.is_empty() {
                        warn!("⚠️ Groups reference unknown servers: {:?}", dangling);
                    }
                }
            })
        };

        info!("✅ fleetgate is now running");
        info!("🔍 Health monitoring active - summary every {}s", MONITOR_INTERVAL.as_secs());
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        signals::wait_for_shutdown_signal().await?;

        info!("🛑 Shutdown signal received, initiating graceful shutdown...");
        monitoring_handle.abort();
        self.coordinator.shutdown().await;

        let stats = self.coordinator.stats();
        info!("📊 Final Statistics:");
        info!("  - Messages received: {}", stats.bridge.received);
        info!("  - Messages dropped (malformed): {}", stats.bridge.decode_failures);
        info!("  - Handler failures: {}", stats.bridge.handler_failures);
        info!("👋 fleetgate shutdown complete");

        Ok(())
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let args = CliArgs::parse();

    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {:?}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("❌ Failed to start application: {e:?}");
            std::process::exit(1);
        }
    }
}
