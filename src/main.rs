#![recursion_limit = "256"]
//! # Main Entry Point
//!
//! Wires the agent together:
//! - Domain: Configuration, Types and Traits
//! - Infrastructure: Matrix adapter, Settings stores
//! - Application: Router, Dispatcher, Scheduler, AFK and reply policies
//! - Interface: Command Handlers
//!

mod application;
mod domain;
mod infrastructure;
mod interface;
mod strings;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use clap::Parser;
use matrix_sdk::{Client, config::SyncSettings};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::application::dispatcher::CommandDispatcher;
use crate::application::router::EventRouter;
use crate::application::scheduler::BroadcastScheduler;
use crate::application::state::AutomationState;
use crate::domain::config::{AppConfig, SystemConfig};
use crate::domain::traits::Transport;
use crate::domain::types::ChatId;
use crate::infrastructure::matrix::{self, MatrixTransport};
use crate::strings::logs;

/// Inbound events buffered between the Matrix handler and the router.
const EVENT_QUEUE_CAPACITY: usize = 256;

#[derive(Parser, Debug)]
#[command(name = "standby", version, about = "Owner-controlled automation for a Matrix account")]
struct Args {
    /// Path to the YAML configuration file.
    #[arg(short, long, default_value = "data/config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Load Configuration
    let config = AppConfig::load(&args.config)?;

    // 2. Logging Setup
    let _guard = application::logging::init_logging(&config.system)?;
    tracing::info!(
        "{}",
        logs::config_loaded(&args.config.display().to_string(), &config.system.owner)
    );
    let owner = ChatId::parse(&config.system.owner)
        .map_err(|e| anyhow::anyhow!("system.owner: {e}"))?;

    // 3. Settings
    let store = infrastructure::store::build_store(&config.system).await?;
    let state = match AutomationState::load(&config.automation, store.as_ref()).await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("{}", logs::store_load_fail(&e.to_string()));
            AutomationState::empty(&config.automation)
        }
    };
    let state = Arc::new(Mutex::new(state));

    // 4. Matrix Setup
    let matrix_config = &config.services.matrix;
    let client = Client::builder()
        .homeserver_url(&matrix_config.homeserver)
        .build()
        .await
        .context("Failed to build Matrix client")?;

    client
        .matrix_auth()
        .login_username(&matrix_config.username, &matrix_config.password)
        .initial_device_display_name("standby")
        .send()
        .await
        .context("Matrix login failed")?;
    tracing::info!("{}", logs::logged_in(&matrix_config.username));

    if let Some(name) = &matrix_config.display_name {
        tracing::info!("{}", logs::setting_display_name(name));
        if let Err(e) = client.account().set_display_name(Some(name.as_str())).await {
            tracing::warn!("{}", logs::set_display_name_fail(&e.to_string()));
        }
    }

    let transport = Arc::new(
        MatrixTransport::new(client.clone()).context("Matrix client has no user id after login")?,
    );
    SystemConfig::check_owner_account(&owner, &transport.own_id())?;

    // 5. Application Components
    let broadcast = &config.automation.broadcast;
    let scheduler = Arc::new(BroadcastScheduler::new(
        transport.clone(),
        broadcast.default_backoff(),
    ));
    let dispatcher = Arc::new(CommandDispatcher::new(
        config.automation.clone(),
        owner,
        state,
        scheduler.clone(),
        store,
        transport,
    ));
    let router = EventRouter::new(dispatcher);

    // 6. Event Feed
    let start_time = std::time::SystemTime::now();
    let mut events = matrix::event_stream(&client, start_time, EVENT_QUEUE_CAPACITY);

    // 7. Start Loops
    let restart_delay = config.system.restart_delay();
    let sync_client = client.clone();
    let sync_handle = tokio::spawn(async move {
        loop {
            tracing::info!("{}", logs::SYNC_LOOP_START);
            if let Err(e) = sync_client.sync(SyncSettings::default()).await {
                tracing::error!(
                    "{}",
                    logs::sync_loop_fail(&e.to_string(), restart_delay.as_secs())
                );
            }
            tokio::time::sleep(restart_delay).await;
        }
    });

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("{}", logs::shutdown_fail(&e.to_string()));
            std::future::pending::<()>().await;
        }
        tracing::info!("{}", logs::SHUTDOWN);
    };
    router.run(&mut events, shutdown).await;

    // 8. Shutdown
    sync_handle.abort();
    scheduler.shutdown(broadcast.shutdown_grace()).await;

    Ok(())
}
