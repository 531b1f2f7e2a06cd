pub mod job;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use job::GateJob;

/// Executes one job. Failures are the runner's to log.
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn run(&self, job: GateJob);
}

/// Per-commit sequential job queue.
///
/// Each `(repository, head SHA)` gets its own channel and worker task so two
/// reconciliations of the same commit never overlap, while different commits
/// proceed concurrently. A worker that sits idle removes its own entry under
/// the senders lock before exiting, so a key never has two live workers.
pub struct GateQueue {
    runner: Arc<dyn JobRunner>,
    senders: Arc<Mutex<HashMap<String, mpsc::UnboundedSender<GateJob>>>>,
    in_flight: Arc<AtomicUsize>,
    idle_timeout: Duration,
}

impl GateQueue {
    pub fn new(runner: Arc<dyn JobRunner>, idle_timeout: Duration) -> Self {
        Self {
            runner,
            senders: Arc::new(Mutex::new(HashMap::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            idle_timeout,
        }
    }

    pub async fn enqueue(&self, job: GateJob) {
        let key = job.key();
        tracing::info!(key = %key, job = %job.description(), "Enqueuing job");
        self.in_flight.fetch_add(1, Ordering::SeqCst);

        let mut senders = self.senders.lock().await;
        let job = match senders.get(&key) {
            Some(tx) => match tx.send(job) {
                Ok(()) => return,
                // Receiver dropped without deregistering (worker panicked)
                Err(mpsc::error::SendError(job)) => job,
            },
            None => job,
        };

        let (tx, rx) = mpsc::unbounded_channel();
        if tx.send(job).is_err() {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            tracing::error!(key = %key, "Failed to hand job to a fresh worker");
            return;
        }
        senders.insert(key.clone(), tx);
        self.spawn_worker(key, rx);
    }

    /// Jobs enqueued but not yet finished.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Keys with a live worker.
    pub async fn workers(&self) -> usize {
        self.senders.lock().await.len()
    }

    /// Wait until every queued job has finished or `deadline` passes.
    /// Returns whether the queue drained.
    pub async fn drain(&self, deadline: Duration) -> bool {
        let wait = async {
            while self.in_flight() > 0 {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        };
        tokio::time::timeout(deadline, wait).await.is_ok()
    }

    fn spawn_worker(&self, key: String, mut rx: mpsc::UnboundedReceiver<GateJob>) {
        let runner = Arc::clone(&self.runner);
        let in_flight = Arc::clone(&self.in_flight);
        let senders = Arc::clone(&self.senders);
        let idle_timeout = self.idle_timeout;

        tokio::spawn(async move {
            tracing::debug!(key = %key, "Worker started");
            loop {
                match tokio::time::timeout(idle_timeout, rx.recv()).await {
                    Ok(Some(job)) => {
                        runner.run(job).await;
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                    }
                    Ok(None) => break,
                    Err(_) => {
                        // enqueue sends under this lock, so an empty channel
                        // here stays empty until the entry is gone
                        let mut live = senders.lock().await;
                        match rx.try_recv() {
                            Ok(job) => {
                                drop(live);
                                runner.run(job).await;
                                in_flight.fetch_sub(1, Ordering::SeqCst);
                            }
                            Err(_) => {
                                live.remove(&key);
                                break;
                            }
                        }
                    }
                }
            }
            tracing::debug!(key = %key, "Worker idle, exiting");
        });
    }
}
