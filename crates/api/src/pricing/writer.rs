//! Background price cache writes.
//!
//! Searches hand newly resolved prices to a bounded queue and move on. One
//! worker task drains the queue into the [`PriceCache`]. A full queue drops
//! the record instead of blocking the request. Every record ends in exactly
//! one [`WriteOutcome`], broadcast to subscribers and tallied in
//! [`WriteStats`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{broadcast, mpsc};

use price_comparer_core::PriceRecordId;

use crate::db::PriceCache;
use crate::models::NewPriceRecord;

const OUTCOME_CHANNEL_CAPACITY: usize = 1024;

/// What happened to one enqueued record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Appended to the cache.
    Written {
        /// Link of the priced product.
        link: String,
        /// New row id.
        id: PriceRecordId,
    },
    /// The cache rejected the write.
    Failed {
        /// Link of the priced product.
        link: String,
        /// Error text.
        error: String,
    },
    /// Not queued: the queue was full or the worker had stopped.
    Dropped {
        /// Link of the priced product.
        link: String,
    },
}

/// Running totals of write outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    /// Records appended.
    pub written: u64,
    /// Records the cache rejected.
    pub failed: u64,
    /// Records never queued.
    pub dropped: u64,
}

#[derive(Default)]
struct Counters {
    written: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

struct Shared {
    counters: Counters,
    outcomes: broadcast::Sender<WriteOutcome>,
}

impl Shared {
    fn publish(&self, outcome: WriteOutcome) {
        let counter = match &outcome {
            WriteOutcome::Written { .. } => &self.counters.written,
            WriteOutcome::Failed { .. } => &self.counters.failed,
            WriteOutcome::Dropped { .. } => &self.counters.dropped,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        // No subscribers is fine
        let _ = self.outcomes.send(outcome);
    }
}

/// Handle to the price write queue.
///
/// Cheap to clone. The worker stops once every handle is dropped and the
/// queue is drained.
#[derive(Clone)]
pub struct PriceWriter {
    queue: mpsc::Sender<NewPriceRecord>,
    shared: Arc<Shared>,
}

impl PriceWriter {
    /// Start the worker on the current Tokio runtime.
    ///
    /// `capacity` is the number of records that may wait in the queue; zero
    /// is treated as one.
    #[must_use]
    pub fn spawn(cache: Arc<dyn PriceCache>, capacity: usize) -> Self {
        let (queue, rx) = mpsc::channel(capacity.max(1));
        let (outcomes, _) = broadcast::channel(OUTCOME_CHANNEL_CAPACITY);
        let shared = Arc::new(Shared {
            counters: Counters::default(),
            outcomes,
        });

        tokio::spawn(run_worker(cache, rx, Arc::clone(&shared)));

        Self { queue, shared }
    }

    /// Queue a record without waiting.
    pub fn enqueue(&self, record: NewPriceRecord) {
        if let Err(err) = self.queue.try_send(record) {
            let (reason, record) = match err {
                mpsc::error::TrySendError::Full(r) => ("full", r),
                mpsc::error::TrySendError::Closed(r) => ("closed", r),
            };
            tracing::warn!(link = %record.external_link, reason, "Price write dropped");
            self.shared.publish(WriteOutcome::Dropped {
                link: record.external_link,
            });
        }
    }

    /// Receive outcomes published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<WriteOutcome> {
        self.shared.outcomes.subscribe()
    }

    /// Current totals.
    #[must_use]
    pub fn stats(&self) -> WriteStats {
        let c = &self.shared.counters;
        WriteStats {
            written: c.written.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
            dropped: c.dropped.load(Ordering::Relaxed),
        }
    }
}

async fn run_worker(
    cache: Arc<dyn PriceCache>,
    mut rx: mpsc::Receiver<NewPriceRecord>,
    shared: Arc<Shared>,
) {
    while let Some(record) = rx.recv().await {
        let outcome = match cache.append(&record).await {
            Ok(id) => WriteOutcome::Written {
                link: record.external_link,
                id,
            },
            Err(e) => {
                tracing::error!(link = %record.external_link, error = %e, "Price write failed");
                WriteOutcome::Failed {
                    link: record.external_link,
                    error: e.to_string(),
                }
            }
        };
        shared.publish(outcome);
    }
    tracing::debug!("Price write queue closed");
}
