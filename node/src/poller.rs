//! Head block polling.
//!
//! A spawned task asks the node for its head every interval and publishes
//! each new head on a `watch` channel. Only strictly higher heads are sent;
//! a node briefly reporting an older block is ignored. Query failures are
//! logged and retried on the next tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::Instrument;

use agora_chain::BlockSource;
use agora_types::BlockNumber;

use crate::tracing_spans;

pub struct BlockPoller {
    heads: watch::Receiver<BlockNumber>,
    handle: JoinHandle<()>,
}

impl BlockPoller {
    /// Start polling `source`. The task stops when `shutdown` fires.
    pub fn spawn<B>(source: Arc<B>, interval: Duration, mut shutdown: broadcast::Receiver<()>) -> Self
    where
        B: BlockSource + 'static,
    {
        let (tx, heads) = watch::channel(BlockNumber::GENESIS);

        let task = async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown.recv() => {
                        tracing::debug!("block poller stopping");
                        break;
                    }
                    _ = ticker.tick() => {
                        match source.block_number().await {
                            Ok(head) => {
                                let advanced = tx.send_if_modified(|current| {
                                    if head > *current {
                                        *current = head;
                                        true
                                    } else {
                                        false
                                    }
                                });
                                if advanced {
                                    tracing::debug!(head = head.as_u64(), "new head");
                                }
                            }
                            Err(e) => tracing::warn!(error = %e, "head query failed"),
                        }
                        if tx.is_closed() {
                            break;
                        }
                    }
                }
            }
        };

        Self {
            heads,
            handle: tokio::spawn(task.instrument(tracing_spans::poll_span())),
        }
    }

    /// A receiver that sees every new head.
    pub fn subscribe(&self) -> watch::Receiver<BlockNumber> {
        self.heads.clone()
    }

    /// Highest head seen so far; genesis before the first successful poll.
    pub fn latest(&self) -> BlockNumber {
        *self.heads.borrow()
    }

    /// Wait for the task to finish after shutdown.
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "block poller task failed");
        }
    }
}
