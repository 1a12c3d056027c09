//! Storage seam the aggregator flushes batches through.

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;

use crate::db::{Database, KeyPressDelta};

pub type FlushFuture = Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>>;

/// Durable sink for a batch of per-key press deltas.
///
/// Implementations must treat an empty batch as a no-op and commit the whole
/// batch atomically. Callers guarantee at most one flush is in flight at a
/// time, so implementations never see interleaved batches.
pub trait KeyPressStore: Send + Sync {
    fn flush(&self, batch: Vec<KeyPressDelta>) -> FlushFuture;
}

impl KeyPressStore for Database {
    fn flush(&self, batch: Vec<KeyPressDelta>) -> FlushFuture {
        let db = self.clone();
        Box::pin(async move { db.apply_press_deltas(batch).await })
    }
}
