// Mark persister - single worker writing back the newest encoded mark buffer
use crate::application::sensor_repository::SensorRepository;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total tries, the first one included.
    pub attempts: u32,
    /// Delay before the first retry; doubles after every failure.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistStatus {
    /// Nothing written yet.
    Idle,
    Stored,
    Failed { attempts: u32 },
}

enum Attempt {
    Done(PersistStatus),
    /// A newer payload was submitted while this one was backing off.
    Superseded,
}

/// Handle to the write-back worker. Payloads are queued latest-wins: the
/// worker writes one at a time, and a retry is dropped as soon as a newer
/// payload is queued, so storage never goes back to an older map.
#[derive(Clone)]
pub struct MarkPersister {
    pending: Arc<watch::Sender<Option<Bytes>>>,
    status: watch::Receiver<PersistStatus>,
}

impl MarkPersister {
    /// Starts the worker on the current runtime. It stops once every handle
    /// is dropped.
    pub fn spawn(repository: Arc<dyn SensorRepository>, policy: RetryPolicy) -> Self {
        let (pending, queued) = watch::channel(None);
        let (status_tx, status) = watch::channel(PersistStatus::Idle);
        tokio::spawn(run_worker(repository, policy, queued, status_tx));
        Self {
            pending: Arc::new(pending),
            status,
        }
    }

    /// Queues `payload`, replacing any payload not yet written. Never blocks;
    /// the in-memory map stays authoritative whatever the outcome.
    pub fn submit(&self, payload: Bytes) {
        self.pending.send_replace(Some(payload));
    }

    /// Outcome of the most recently finished payload.
    pub fn status(&self) -> watch::Receiver<PersistStatus> {
        self.status.clone()
    }
}

async fn run_worker(
    repository: Arc<dyn SensorRepository>,
    policy: RetryPolicy,
    mut queued: watch::Receiver<Option<Bytes>>,
    status: watch::Sender<PersistStatus>,
) {
    while queued.changed().await.is_ok() {
        loop {
            let Some(payload) = queued.borrow_and_update().clone() else {
                break;
            };
            match store_with_retry(repository.as_ref(), policy, payload, &mut queued).await {
                Attempt::Done(outcome) => {
                    status.send_replace(outcome);
                    break;
                }
                Attempt::Superseded => {
                    tracing::debug!("Newer marks queued, dropping pending retry");
                }
            }
        }
    }
    tracing::debug!("Mark persister stopped");
}

/// Writes `payload`, retrying with exponential backoff until it is stored,
/// the attempts run out, or a newer payload shows up.
async fn store_with_retry(
    repository: &dyn SensorRepository,
    policy: RetryPolicy,
    payload: Bytes,
    queued: &mut watch::Receiver<Option<Bytes>>,
) -> Attempt {
    let attempts = policy.attempts.max(1);
    let mut delay = policy.backoff;
    for attempt in 1..=attempts {
        match repository.store_marks(payload.clone()).await {
            Ok(()) => {
                tracing::debug!("Stored {}B of marks (attempt {})", payload.len(), attempt);
                return Attempt::Done(PersistStatus::Stored);
            }
            Err(e) => {
                tracing::warn!("Failed to store marks (attempt {}/{}): {:#}", attempt, attempts, e);
            }
        }
        if attempt < attempts {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = queued.changed() => match changed {
                    Ok(()) => return Attempt::Superseded,
                    // Every handle dropped; finish this payload's retries.
                    Err(_) => tokio::time::sleep(delay).await,
                },
            }
            delay = delay.saturating_mul(2);
        }
    }
    tracing::error!("Giving up on storing marks after {} attempts", attempts);
    Attempt::Done(PersistStatus::Failed { attempts })
}
