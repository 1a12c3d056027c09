//! Event-batching key-press aggregator.
//!
//! A single task owns all pending state and is fed through an unbounded
//! channel, so the OS event callback never blocks and never touches storage.
//! Batches flush either when the pending count reaches the threshold or when
//! the 300 ms timer fires, whichever comes first. The durable merge runs as a
//! spawned task that posts its outcome back into the same channel, which
//! keeps every state transition on one timeline and makes the
//! at-most-one-in-flight guard a plain bool.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use log::{error, info};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::db::KeyPressDelta;
use crate::keyboard::flusher::KeyPressStore;
use crate::keyboard::keymap;

const MAX_PENDING_PRESSES_BEFORE_FLUSH: u32 = 30;
const BATCH_FLUSH_INTERVAL: Duration = Duration::from_millis(300);

enum Message {
    KeyDown(i64),
    FlushOutcome {
        result: Result<()>,
        batch: HashMap<i64, u32>,
    },
    Drain(oneshot::Sender<()>),
}

/// Cloneable handle for the event-delivery side. Sends are fire-and-forget;
/// the callback returns immediately regardless of aggregator load.
#[derive(Clone, Debug)]
pub struct PressAggregator {
    tx: mpsc::UnboundedSender<Message>,
}

impl PressAggregator {
    pub fn record_key_down(&self, key_code: i64) {
        let _ = self.tx.send(Message::KeyDown(key_code));
    }

    /// Flushes everything the aggregator has accumulated, waiting out any
    /// in-flight batch first. Resolves once the pending counts are durable
    /// (or dropped after a final failed attempt).
    pub async fn drain(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(Message::Drain(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }
}

/// Spawns the aggregator task. The returned handle feeds it; the join handle
/// completes after cancellation once remaining counts have been flushed.
pub fn spawn_aggregator(
    store: Arc<dyn KeyPressStore>,
    cancel_token: CancellationToken,
) -> (PressAggregator, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let task = AggregatorTask {
        rx,
        tx: tx.clone(),
        store,
        pending: HashMap::new(),
        pending_presses: 0,
        flush_deadline: None,
        in_flight: false,
        drain_acks: Vec::new(),
    };

    let handle = tokio::spawn(task.run(cancel_token));
    (PressAggregator { tx }, handle)
}

struct AggregatorTask {
    rx: mpsc::UnboundedReceiver<Message>,
    tx: mpsc::UnboundedSender<Message>,
    store: Arc<dyn KeyPressStore>,
    pending: HashMap<i64, u32>,
    pending_presses: u32,
    flush_deadline: Option<Instant>,
    in_flight: bool,
    drain_acks: Vec<oneshot::Sender<()>>,
}

impl AggregatorTask {
    async fn run(mut self, cancel_token: CancellationToken) {
        loop {
            let deadline = self.flush_deadline;

            tokio::select! {
                maybe_msg = self.rx.recv() => match maybe_msg {
                    Some(msg) => self.handle_message(msg).await,
                    None => break,
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.flush_deadline = None;
                    self.begin_flush();
                }
                _ = cancel_token.cancelled() => break,
            }
        }

        self.shutdown().await;
        info!("Press aggregator shut down");
    }

    async fn handle_message(&mut self, msg: Message) {
        match msg {
            Message::KeyDown(key_code) => self.record_press(key_code),
            Message::FlushOutcome { result, batch } => {
                self.in_flight = false;

                if let Err(err) = result {
                    error!("Failed to flush key presses: {err:#}");
                    // Additive re-merge: presses that arrived while the batch
                    // was in flight must not be overwritten.
                    self.remerge(batch);
                    if self.drain_acks.is_empty() {
                        self.arm_timer();
                    }
                } else if self.drain_acks.is_empty() {
                    if self.pending_presses >= MAX_PENDING_PRESSES_BEFORE_FLUSH {
                        self.begin_flush();
                    } else if !self.pending.is_empty() {
                        self.arm_timer();
                    }
                }

                if !self.drain_acks.is_empty() {
                    self.complete_drain().await;
                }
            }
            Message::Drain(ack) => {
                self.drain_acks.push(ack);
                if !self.in_flight {
                    self.complete_drain().await;
                }
            }
        }
    }

    fn record_press(&mut self, key_code: i64) {
        self.note_press(key_code, 1);

        if self.pending_presses >= MAX_PENDING_PRESSES_BEFORE_FLUSH {
            self.flush_deadline = None;
            self.begin_flush();
        } else {
            self.arm_timer();
        }
    }

    fn note_press(&mut self, key_code: i64, delta: u32) {
        *self.pending.entry(key_code).or_insert(0) += delta;
        self.pending_presses += delta;
    }

    /// Arming is idempotent: the timer runs from the first unflushed press.
    fn arm_timer(&mut self) {
        if self.flush_deadline.is_none() {
            self.flush_deadline = Some(Instant::now() + BATCH_FLUSH_INTERVAL);
        }
    }

    fn begin_flush(&mut self) {
        self.flush_deadline = None;
        if self.in_flight || self.pending.is_empty() {
            return;
        }

        let batch_counts = std::mem::take(&mut self.pending);
        self.pending_presses = 0;
        let batch = to_deltas(&batch_counts);
        self.in_flight = true;

        let store = Arc::clone(&self.store);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = store.flush(batch).await;
            let _ = tx.send(Message::FlushOutcome {
                result,
                batch: batch_counts,
            });
        });
    }

    /// Final inline flush for drain and shutdown. A failure here is the one
    /// bounded-loss window the contract allows; it is logged and the batch
    /// dropped.
    async fn complete_drain(&mut self) {
        self.flush_deadline = None;

        if !self.pending.is_empty() {
            let batch_counts = std::mem::take(&mut self.pending);
            let dropped = self.pending_presses;
            self.pending_presses = 0;

            if let Err(err) = self.store.flush(to_deltas(&batch_counts)).await {
                error!("Final key press flush failed, dropping {dropped} presses: {err:#}");
            }
        }

        for ack in self.drain_acks.drain(..) {
            let _ = ack.send(());
        }
    }

    async fn shutdown(&mut self) {
        // Wait out an in-flight flush so its failure re-merge is included in
        // the final batch. Presses still queued are absorbed without
        // re-triggering spawned flushes.
        while self.in_flight {
            match self.rx.recv().await {
                Some(Message::KeyDown(key_code)) => self.note_press(key_code, 1),
                Some(Message::FlushOutcome { result, batch }) => {
                    self.in_flight = false;
                    if let Err(err) = result {
                        error!("Failed to flush key presses: {err:#}");
                        self.remerge(batch);
                    }
                }
                Some(Message::Drain(ack)) => self.drain_acks.push(ack),
                None => break,
            }
        }

        self.complete_drain().await;
    }

    fn remerge(&mut self, batch: HashMap<i64, u32>) {
        for (key_code, delta) in batch {
            self.note_press(key_code, delta);
        }
    }
}

fn to_deltas(batch_counts: &HashMap<i64, u32>) -> Vec<KeyPressDelta> {
    batch_counts
        .iter()
        .map(|(&key_code, &delta)| KeyPressDelta {
            key_code,
            key_name: keymap::key_name(key_code),
            delta,
        })
        .collect()
}
