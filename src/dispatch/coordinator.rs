use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::DispatchConfig;
use crate::delivery::{DeliveryNotifier, MessageQueuedEvent};
use crate::domain::{Campaign, NewOutboundMessage, OutboundMessage, SendResult};
use crate::error::AppError;
use crate::metrics::DispatchMetrics;
use crate::store::{with_timeout, CampaignStore, StoreError};
use crate::template::render;

/// Statistics for the dispatch coordinator
#[derive(Debug, Default)]
pub struct DispatchStats {
    /// Sends that passed the campaign lookup
    pub sends_started: AtomicU64,
    /// Sends where every customer got a message
    pub sends_completed: AtomicU64,
    /// Sends that ended with a per-customer failure
    pub sends_partial: AtomicU64,
    /// Outbound messages persisted
    pub messages_queued: AtomicU64,
    /// Per-customer tasks that failed
    pub tasks_failed: AtomicU64,
    /// Per-customer tasks skipped after cancellation
    pub tasks_skipped: AtomicU64,
}

impl DispatchStats {
    pub fn snapshot(&self) -> DispatchStatsSnapshot {
        DispatchStatsSnapshot {
            sends_started: self.sends_started.load(Ordering::Relaxed),
            sends_completed: self.sends_completed.load(Ordering::Relaxed),
            sends_partial: self.sends_partial.load(Ordering::Relaxed),
            messages_queued: self.messages_queued.load(Ordering::Relaxed),
            tasks_failed: self.tasks_failed.load(Ordering::Relaxed),
            tasks_skipped: self.tasks_skipped.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of dispatch statistics
#[derive(Debug, Clone, Serialize)]
pub struct DispatchStatsSnapshot {
    pub sends_started: u64,
    pub sends_completed: u64,
    pub sends_partial: u64,
    pub messages_queued: u64,
    pub tasks_failed: u64,
    pub tasks_skipped: u64,
}

enum TaskOutcome {
    Queued,
    Skipped,
    Failed { error: AppError, first: bool },
}

/// Fans a campaign send out to one task per customer.
///
/// At most `max_concurrency` tasks do store work at the same time. The first
/// failing task cancels the send: tasks that have not started their store work
/// skip it, tasks already past that point finish normally.
pub struct DispatchCoordinator {
    store: Arc<dyn CampaignStore>,
    notifier: Arc<dyn DeliveryNotifier>,
    max_concurrency: usize,
    store_timeout: Duration,
    stats: Arc<DispatchStats>,
}

impl DispatchCoordinator {
    pub fn new(
        store: Arc<dyn CampaignStore>,
        notifier: Arc<dyn DeliveryNotifier>,
        config: &DispatchConfig,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            notifier,
            max_concurrency: config.max_concurrency.max(1),
            store_timeout,
            stats: Arc::new(DispatchStats::default()),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn stats(&self) -> DispatchStatsSnapshot {
        self.stats.snapshot()
    }

    /// Render and persist one message per customer.
    ///
    /// `customer_ids` must be non-empty; callers validate it. A failed campaign
    /// lookup ends the send before any task starts. Otherwise every task is
    /// awaited, and a failure is returned as `PartialDispatch` carrying the
    /// count queued so far.
    #[tracing::instrument(
        name = "dispatch.send",
        skip_all,
        fields(campaign_id = campaign_id, customers = customer_ids.len())
    )]
    pub async fn send(&self, campaign_id: i64, customer_ids: &[i64]) -> Result<SendResult, AppError> {
        let started = Instant::now();

        let campaign = match with_timeout(self.store_timeout, self.store.get_campaign(campaign_id)).await {
            Ok(campaign) => Arc::new(campaign),
            Err(e) => {
                DispatchMetrics::record_rejected();
                tracing::warn!(error = %e, "Campaign lookup failed, nothing dispatched");
                return Err(e.into());
            }
        };

        self.stats.sends_started.fetch_add(1, Ordering::Relaxed);

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let queued = Arc::new(AtomicU32::new(0));
        let cancelled = Arc::new(AtomicBool::new(false));

        let mut tasks = JoinSet::new();
        for &customer_id in customer_ids {
            let task = CustomerTask {
                store: self.store.clone(),
                notifier: self.notifier.clone(),
                campaign: campaign.clone(),
                semaphore: semaphore.clone(),
                queued: queued.clone(),
                cancelled: cancelled.clone(),
                stats: self.stats.clone(),
                store_timeout: self.store_timeout,
            };
            tasks.spawn(task.run(customer_id));
        }

        let mut first_error: Option<AppError> = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(TaskOutcome::Queued) | Ok(TaskOutcome::Skipped) => {}
                Ok(TaskOutcome::Failed { error, first }) => {
                    if first {
                        first_error = Some(error);
                    }
                }
                Err(e) => {
                    self.stats.tasks_failed.fetch_add(1, Ordering::Relaxed);
                    DispatchMetrics::record_failure("internal");
                    tracing::error!(error = %e, "Dispatch task aborted");
                    if cancel(&cancelled) {
                        first_error = Some(AppError::Internal(format!("dispatch task aborted: {e}")));
                    }
                }
            }
        }

        let result = SendResult::new(campaign_id, queued.load(Ordering::SeqCst));
        let elapsed = started.elapsed();

        match first_error {
            None => {
                self.stats.sends_completed.fetch_add(1, Ordering::Relaxed);
                DispatchMetrics::record_completed(elapsed.as_secs_f64());
                tracing::info!(
                    messages_queued = result.messages_queued,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Campaign dispatched"
                );
                Ok(result)
            }
            Some(cause) => {
                self.stats.sends_partial.fetch_add(1, Ordering::Relaxed);
                DispatchMetrics::record_partial(elapsed.as_secs_f64());
                tracing::warn!(
                    messages_queued = result.messages_queued,
                    requested = customer_ids.len(),
                    error = %cause,
                    "Campaign dispatch stopped early"
                );
                Err(AppError::partial(result, cause))
            }
        }
    }
}

/// Set the cancellation flag; true only for the caller that set it
fn cancel(flag: &AtomicBool) -> bool {
    flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_ok()
}

/// Decrements the in-flight gauge when a task finishes its store work
struct InFlight;

impl InFlight {
    fn start() -> Self {
        DispatchMetrics::task_started();
        InFlight
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        DispatchMetrics::task_finished();
    }
}

struct CustomerTask {
    store: Arc<dyn CampaignStore>,
    notifier: Arc<dyn DeliveryNotifier>,
    campaign: Arc<Campaign>,
    semaphore: Arc<Semaphore>,
    queued: Arc<AtomicU32>,
    cancelled: Arc<AtomicBool>,
    stats: Arc<DispatchStats>,
    store_timeout: Duration,
}

impl CustomerTask {
    async fn run(self, customer_id: i64) -> TaskOutcome {
        // The semaphore is never closed
        let Ok(_permit) = self.semaphore.clone().acquire_owned().await else {
            return TaskOutcome::Skipped;
        };

        if self.cancelled.load(Ordering::SeqCst) {
            self.stats.tasks_skipped.fetch_add(1, Ordering::Relaxed);
            DispatchMetrics::record_skipped();
            tracing::debug!(customer_id, "Send cancelled, customer skipped");
            return TaskOutcome::Skipped;
        }

        let _in_flight = InFlight::start();

        match self.persist(customer_id).await {
            Ok(message) => {
                self.queued.fetch_add(1, Ordering::SeqCst);
                self.stats.messages_queued.fetch_add(1, Ordering::Relaxed);
                DispatchMetrics::record_queued();

                self.notifier
                    .message_queued(MessageQueuedEvent::new(&message, self.campaign.channel));

                tracing::debug!(customer_id, message_id = message.id, "Message queued");
                TaskOutcome::Queued
            }
            Err(e) => {
                let reason = if e.is_not_found() { "not_found" } else { "internal" };
                self.stats.tasks_failed.fetch_add(1, Ordering::Relaxed);
                DispatchMetrics::record_failure(reason);

                let first = cancel(&self.cancelled);
                tracing::warn!(customer_id, error = %e, first, "Customer dispatch failed");

                TaskOutcome::Failed {
                    error: e.into(),
                    first,
                }
            }
        }
    }

    async fn persist(&self, customer_id: i64) -> Result<OutboundMessage, StoreError> {
        let customer = with_timeout(self.store_timeout, self.store.get_customer(customer_id)).await?;
        let content = render(&self.campaign.base_template, Some(&customer));

        with_timeout(
            self.store_timeout,
            self.store.create_outbound_message(NewOutboundMessage::pending(
                self.campaign.id,
                customer_id,
                content,
            )),
        )
        .await
    }
}
