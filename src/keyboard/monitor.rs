//! Start/stop controller for the key-press pipeline.
//!
//! The OS event tap itself lives outside this crate; whoever registers the
//! tap captures the [`PressAggregator`] handle returned by [`start`] and
//! calls `record_key_down` from the callback. No process-global state is
//! involved.

use anyhow::{bail, Context, Result};
use log::info;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::aggregator::{spawn_aggregator, PressAggregator};
use super::flusher::KeyPressStore;

pub struct KeyboardMonitor {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    aggregator: Option<PressAggregator>,
}

impl KeyboardMonitor {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
            aggregator: None,
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.handle.is_some()
    }

    /// Spawns the aggregator task and returns the handle the event source
    /// feeds key codes through.
    pub fn start(&mut self, store: Arc<dyn KeyPressStore>) -> Result<PressAggregator> {
        if self.handle.is_some() {
            bail!("keyboard monitoring already active");
        }

        let cancel_token = CancellationToken::new();
        let (aggregator, handle) = spawn_aggregator(store, cancel_token.clone());
        info!("Keyboard monitoring started");

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        self.aggregator = Some(aggregator.clone());
        Ok(aggregator)
    }

    /// Stops monitoring: drains accumulated counts to storage, then cancels
    /// and joins the aggregator task.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(aggregator) = self.aggregator.take() {
            aggregator.drain().await;
        }

        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("press aggregator task failed to join")?;
            info!("Keyboard monitoring stopped");
        }

        Ok(())
    }
}

impl Default for KeyboardMonitor {
    fn default() -> Self {
        Self::new()
    }
}
