//! # Chat Center Server
//!
//! High-level lifecycle manager: builds the [`ChatEngine`], spawns the two
//! background control loops on [`start`](ChatCenterServer::start), and tears
//! them down cooperatively on [`stop`](ChatCenterServer::stop). The server
//! owns one [`CancellationToken`]; both loops check it between ticks, so a
//! stop request is observed within one tick interval. A hung task is
//! aborted after a short grace period as the backstop.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use chat_engine::config::EngineConfig;
//! use chat_engine::server::ChatCenterServerBuilder;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = ChatCenterServerBuilder::new()
//!     .with_config(EngineConfig::default())
//!     .build()?;
//!
//! server.start().await?;
//!
//! // Transport layer calls go through the engine handle
//! let engine = server.engine().clone();
//! let decision = engine.admit("customer-1");
//!
//! server.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::allocator::AllocatorLoop;
use crate::config::EngineConfig;
use crate::engine::ChatEngine;
use crate::error::{ChatEngineError, Result};
use crate::monitor::LivenessMonitor;

/// Grace period for loops to observe cancellation before being aborted
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// A complete chat center server that manages engine and loop lifecycles
pub struct ChatCenterServer {
    /// The shared core
    engine: Arc<ChatEngine>,

    /// Cancellation signal shared by both loops
    cancel: CancellationToken,

    /// Handle to the allocator loop task
    allocator_handle: Option<JoinHandle<()>>,

    /// Handle to the liveness monitor task
    monitor_handle: Option<JoinHandle<()>>,
}

impl ChatCenterServer {
    /// Create a server from configuration
    pub fn new(config: EngineConfig) -> Result<Self> {
        info!("🚀 Creating chat engine with {} team(s)", config.teams.teams.len());
        let engine = Arc::new(ChatEngine::new(config)?);
        Ok(Self {
            engine,
            cancel: CancellationToken::new(),
            allocator_handle: None,
            monitor_handle: None,
        })
    }

    /// The shared engine handle for transport-layer entry points
    pub fn engine(&self) -> &Arc<ChatEngine> {
        &self.engine
    }

    /// Spawn the allocator and liveness monitor loops
    pub async fn start(&mut self) -> Result<()> {
        if self.allocator_handle.is_some() || self.monitor_handle.is_some() {
            return Err(ChatEngineError::invalid_state("server already started"));
        }

        let engine = self.engine.clone();
        let cancel = self.cancel.clone();
        self.allocator_handle = Some(tokio::spawn(async move {
            AllocatorLoop::run(engine, cancel).await;
        }));

        let engine = self.engine.clone();
        let cancel = self.cancel.clone();
        self.monitor_handle = Some(tokio::spawn(async move {
            LivenessMonitor::run(engine, cancel).await;
        }));

        info!("✅ Started allocator and liveness monitor loops");
        Ok(())
    }

    /// Stop both loops cooperatively, aborting after the grace period
    pub async fn stop(&mut self) -> Result<()> {
        info!("🛑 Stopping chat center server...");
        self.cancel.cancel();

        for handle in [self.allocator_handle.take(), self.monitor_handle.take()]
            .into_iter()
            .flatten()
        {
            Self::reap(handle).await;
        }

        info!("✅ Chat center server stopped");
        Ok(())
    }

    async fn reap(mut handle: JoinHandle<()>) {
        if timeout(SHUTDOWN_GRACE, &mut handle).await.is_err() {
            warn!("Background loop did not exit within grace period; aborting");
            handle.abort();
            let _ = handle.await;
        }
    }

    /// Run indefinitely, logging periodic stats
    pub async fn run(&self) -> Result<()> {
        info!("💬 Chat center server is running");
        loop {
            sleep(Duration::from_secs(60)).await;
            let stats = self.engine.stats();
            info!(
                "📊 Stats - queued: {}, active: {}, evicted: {}, agents available: {}",
                stats.queued,
                stats.active_sessions,
                stats.evicted_sessions,
                stats.available_agents
            );
        }
    }
}

/// Builder for [`ChatCenterServer`] with a fluent API
pub struct ChatCenterServerBuilder {
    config: Option<EngineConfig>,
}

impl ChatCenterServerBuilder {
    pub fn new() -> Self {
        Self { config: None }
    }

    /// Set the configuration
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the server
    pub fn build(self) -> Result<ChatCenterServer> {
        let config = self
            .config
            .ok_or_else(|| ChatEngineError::config("Configuration not provided"))?;
        ChatCenterServer::new(config)
    }
}

impl Default for ChatCenterServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builder_requires_config() {
        assert!(ChatCenterServerBuilder::new().build().is_err());
    }

    #[tokio::test]
    async fn start_twice_is_an_invalid_state() {
        let mut server = ChatCenterServerBuilder::new()
            .with_config(EngineConfig::default())
            .build()
            .unwrap();
        server.start().await.unwrap();
        assert!(server.start().await.is_err());
        server.stop().await.unwrap();
    }

    #[tokio::test]
    async fn stop_without_start_is_clean() {
        let mut server = ChatCenterServer::new(EngineConfig::default()).unwrap();
        server.stop().await.unwrap();
    }
}
