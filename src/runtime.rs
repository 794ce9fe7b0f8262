//! Bounded worker pool for running many hierarchy queries in parallel.
//!
//! The `PolicyManager` itself is synchronous and stateless. This module
//! provides a small thread-based runtime that fans queries out to a fixed
//! set of workers through a bounded queue, so callers get backpressure
//! instead of unbounded thread growth.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::{info, warn};

use crate::config::RuntimeConfig;
use crate::context::QueryContext;
use crate::entity::Employee;
use crate::error::{OrgError, OrgResult, PolicyError, RuntimeError};
use crate::policy::PolicyManager;

type Reply = Result<Vec<Employee>, PolicyError>;

enum Job {
    FirstManagers {
        ctx: QueryContext,
        employee_id: String,
        reply: Sender<Reply>,
    },

    #[cfg(test)]
    Sleep {
        duration: Duration,
        started: Sender<()>,
        reply: Sender<()>,
    },
}

struct WorkerPool {
    tx: Sender<Job>,
    workers: Vec<JoinHandle<()>>,
    queue_capacity: usize,
}

impl WorkerPool {
    fn start(
        workers: usize,
        queue_capacity: usize,
        manager: Arc<PolicyManager>,
    ) -> Result<Self, RuntimeError> {
        let workers = workers.max(1);
        let queue_capacity = queue_capacity.max(1);
        let (tx, rx) = bounded::<Job>(queue_capacity);

        let mut handles = Vec::with_capacity(workers);
        for idx in 0..workers {
            let rx: Receiver<Job> = rx.clone();
            let manager = Arc::clone(&manager);
            let spawned = thread::Builder::new()
                .name(format!("orgpolicy-worker-{idx}"))
                .spawn(move || loop {
                    match rx.recv() {
                        Ok(Job::FirstManagers {
                            ctx,
                            employee_id,
                            reply,
                        }) => {
                            let result = manager.first_managers(&ctx, &employee_id);
                            let _ = reply.send(result);
                        }
                        Err(_) => break,

                        #[cfg(test)]
                        Ok(Job::Sleep {
                            duration,
                            started,
                            reply,
                        }) => {
                            let _ = started.send(());
                            thread::sleep(duration);
                            let _ = reply.send(());
                        }
                    }
                });

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Close the queue so already-started workers exit before we bail.
                    drop(tx);
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(RuntimeError::Spawn {
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(Self {
            tx,
            workers: handles,
            queue_capacity,
        })
    }

    fn try_submit(&self, job: Job) -> Result<(), RuntimeError> {
        match self.tx.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                warn!(capacity = self.queue_capacity, "query queue full, rejecting submission");
                Err(RuntimeError::QueueFull {
                    capacity: self.queue_capacity,
                })
            }
            Err(TrySendError::Disconnected(_)) => Err(RuntimeError::Disconnected),
        }
    }

    fn shutdown(self) {
        // Close the channel: workers will drain queued jobs then exit.
        drop(self.tx);
        for handle in self.workers {
            let _ = handle.join();
        }
    }
}

/// Handle returned by [`PolicyRuntime::submit`].
pub struct QueryHandle {
    rx: Receiver<Reply>,
}

impl QueryHandle {
    /// Waits for the query to complete.
    pub fn join(self) -> OrgResult<Vec<Employee>> {
        let reply = self.rx.recv().map_err(|_| RuntimeError::Disconnected)?;
        Ok(reply?)
    }

    /// Waits for the query to complete with a timeout.
    ///
    /// The query keeps running after a timeout; cancel it through the
    /// context's token if the result is no longer wanted.
    pub fn join_timeout(self, timeout: Duration) -> OrgResult<Vec<Employee>> {
        let reply = self.rx.recv_timeout(timeout).map_err(|err| match err {
            crossbeam_channel::RecvTimeoutError::Timeout => RuntimeError::Timeout {
                duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            },
            crossbeam_channel::RecvTimeoutError::Disconnected => RuntimeError::Disconnected,
        })?;
        Ok(reply?)
    }
}

/// A pool of workers answering hierarchy queries.
pub struct PolicyRuntime {
    manager: Arc<PolicyManager>,
    pool: Option<WorkerPool>,
}

impl PolicyRuntime {
    /// Start `config.workers` workers sharing `manager`.
    pub fn start(manager: PolicyManager, config: RuntimeConfig) -> Result<Self, OrgError> {
        let config = config.validate()?;
        let manager = Arc::new(manager);
        let pool = WorkerPool::start(config.workers, config.queue_capacity, Arc::clone(&manager))?;
        info!(
            workers = config.workers,
            queue_capacity = config.queue_capacity,
            "policy runtime started"
        );
        Ok(Self {
            manager,
            pool: Some(pool),
        })
    }

    /// Queue a first-managers query without waiting for it.
    ///
    /// Fails fast with `QueueFull` instead of blocking when the queue is full.
    pub fn submit(&self, ctx: QueryContext, employee_id: impl Into<String>) -> Result<QueryHandle, RuntimeError> {
        let (tx, rx) = bounded::<Reply>(1);
        let job = Job::FirstManagers {
            ctx,
            employee_id: employee_id.into(),
            reply: tx,
        };
        self.pool()?.try_submit(job)?;
        Ok(QueryHandle { rx })
    }

    /// Run a first-managers query on the pool and wait for the answer.
    pub fn first_managers(&self, ctx: QueryContext, employee_id: impl Into<String>) -> OrgResult<Vec<Employee>> {
        self.submit(ctx, employee_id)?.join()
    }

    /// Returns a shared reference to the underlying manager.
    #[must_use]
    pub fn manager(&self) -> &PolicyManager {
        &self.manager
    }

    fn pool(&self) -> Result<&WorkerPool, RuntimeError> {
        self.pool.as_ref().ok_or(RuntimeError::Disconnected)
    }

    /// Occupies one worker for `duration`. Returns receivers for the
    /// moment the worker picks the job up and for its completion.
    #[cfg(test)]
    fn submit_sleep(&self, duration: Duration) -> Result<(Receiver<()>, Receiver<()>), RuntimeError> {
        let (started_tx, started_rx) = bounded::<()>(1);
        let (done_tx, done_rx) = bounded::<()>(1);
        self.pool()?.try_submit(Job::Sleep {
            duration,
            started: started_tx,
            reply: done_tx,
        })?;
        Ok((started_rx, done_rx))
    }
}

impl Drop for PolicyRuntime {
    fn drop(&mut self) {
        // Deterministic shutdown: stop workers and join threads.
        if let Some(pool) = self.pool.take() {
            pool.shutdown();
            info!("policy runtime stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::policy::PolicySources;
    use crate::storage::{InMemoryStores, SourceError};

    fn runtime(workers: usize, queue_capacity: usize) -> PolicyRuntime {
        let stores = InMemoryStores::demo();
        PolicyRuntime::start(
            PolicyManager::new(PolicySources::from(&stores)),
            RuntimeConfig {
                workers,
                queue_capacity,
            },
        )
        .unwrap()
    }

    #[test]
    fn runs_query_on_worker() {
        let rt = runtime(2, 8);
        let managers = rt.first_managers(QueryContext::background(), "2").unwrap();
        let ids: Vec<&str> = managers.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn policy_errors_come_back_classified() {
        let rt = runtime(1, 8);
        let err = rt.first_managers(QueryContext::background(), "99").unwrap_err();
        assert!(matches!(err, OrgError::Policy(PolicyError::EmployeeNotFound { .. })));
    }

    #[test]
    fn full_queue_fails_fast() {
        let rt = runtime(1, 1);

        // Occupy the only worker, then fill the single queue slot.
        let (started, sleep) = rt.submit_sleep(Duration::from_millis(200)).unwrap();
        started.recv_timeout(Duration::from_secs(5)).unwrap();
        let queued = rt.submit(QueryContext::background(), "2").unwrap();

        let err = rt.submit(QueryContext::background(), "2").err().unwrap();
        assert!(matches!(err, RuntimeError::QueueFull { capacity: 1 }));

        sleep.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(queued.join().unwrap().len(), 2);
    }

    #[test]
    fn join_timeout_reports_timeout_while_worker_busy() {
        let rt = runtime(1, 4);
        let (started, sleep) = rt.submit_sleep(Duration::from_millis(200)).unwrap();
        started.recv_timeout(Duration::from_secs(5)).unwrap();
        let handle = rt.submit(QueryContext::background(), "2").unwrap();

        let err = handle.join_timeout(Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err, OrgError::Runtime(RuntimeError::Timeout { duration_ms: 10 })));
        sleep.recv_timeout(Duration::from_secs(1)).unwrap();
    }

    #[test]
    fn cancelled_query_surfaces_source_error() {
        let rt = runtime(1, 4);
        let ctx = QueryContext::background();
        ctx.cancellation_token().cancel();

        let err = rt.first_managers(ctx, "2").unwrap_err();
        assert!(matches!(err, OrgError::Policy(PolicyError::Source(SourceError::Cancelled))));
    }

    #[test]
    fn handle_without_worker_reply_is_disconnected() {
        // A worker that dies mid-query drops its reply sender unsent.
        let (tx, rx) = bounded::<Reply>(1);
        drop(tx);
        let err = QueryHandle { rx }.join().unwrap_err();
        assert!(matches!(err, OrgError::Runtime(RuntimeError::Disconnected)));

        let (tx, rx) = bounded::<Reply>(1);
        drop(tx);
        let err = QueryHandle { rx }.join_timeout(Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, OrgError::Runtime(RuntimeError::Disconnected)));
    }

    #[test]
    fn drop_drains_queued_queries() {
        let rt = runtime(1, 4);
        let handle = rt.submit(QueryContext::background(), "2").unwrap();
        drop(rt);
        assert_eq!(handle.join().unwrap().len(), 2);
    }

    #[test]
    fn start_rejects_invalid_config() {
        let stores = InMemoryStores::demo();
        let result = PolicyRuntime::start(
            PolicyManager::new(PolicySources::from(&stores)),
            RuntimeConfig {
                workers: 0,
                queue_capacity: 4,
            },
        );
        assert!(matches!(result, Err(OrgError::Config(_))));
    }
}
