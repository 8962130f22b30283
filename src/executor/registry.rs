use crate::base::resolvererror::ResolverError;
use std::fmt;
use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;

/// Default core threads of the worker executor. Blocking lookups do not
/// occupy these; they run on the executor's growable blocking pool.
const DEFAULT_WORKER_THREADS: usize = 2;

/// Upper bound of the worker executor's blocking pool.
const MAX_BLOCKING_THREADS: usize = 512;

/// The two kinds of shared executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutorKind {
    /// One dedicated thread. Only sleeps and hands work to the worker.
    Timer,
    /// Runs resolution attempts; host lookups use its blocking pool.
    Worker,
}

impl ExecutorKind {
    fn index(self) -> usize {
        match self {
            ExecutorKind::Timer => 0,
            ExecutorKind::Worker => 1,
        }
    }

    fn build_runtime(self, worker_threads: usize) -> io::Result<Runtime> {
        match self {
            ExecutorKind::Timer => Builder::new_multi_thread()
                .worker_threads(1)
                .max_blocking_threads(1)
                .thread_name("rpc-resolver-timer")
                .enable_time()
                .build(),
            ExecutorKind::Worker => {
                let next_id = AtomicUsize::new(0);
                Builder::new_multi_thread()
                    .worker_threads(worker_threads)
                    .max_blocking_threads(MAX_BLOCKING_THREADS)
                    .thread_name_fn(move || {
                        let id = next_id.fetch_add(1, Ordering::Relaxed);
                        format!("rpc-resolver-executor-{id}")
                    })
                    .enable_all()
                    .build()
            }
        }
    }
}

impl fmt::Display for ExecutorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutorKind::Timer => f.write_str("timer"),
            ExecutorKind::Worker => f.write_str("worker"),
        }
    }
}

/// One holder's claim on a shared executor.
///
/// Obtained from [`ExecutorRegistry::acquire`] and given back, by value, to
/// [`ExecutorRegistry::release`]. A handle is not `Clone`: each acquisition
/// is released exactly once. Tasks spawned after the executor has been torn
/// down are dropped without running.
pub struct ExecutorHandle {
    kind: ExecutorKind,
    generation: u64,
    handle: Handle,
}

impl ExecutorHandle {
    pub fn kind(&self) -> ExecutorKind {
        self.kind
    }

    /// Tokio handle of the underlying runtime.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle.spawn(future)
    }
}

impl fmt::Debug for ExecutorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorHandle")
            .field("kind", &self.kind)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Reference-count bookkeeping of one executor kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecutorStats {
    /// Holders currently sharing the executor.
    pub ref_count: usize,
    /// How many times the executor has been built.
    pub created: u64,
    /// How many times the executor has been torn down.
    pub destroyed: u64,
}

impl ExecutorStats {
    pub fn is_live(&self) -> bool {
        self.created > self.destroyed
    }
}

#[derive(Default)]
struct Slot {
    ref_count: usize,
    runtime: Option<Runtime>,
    created: u64,
    destroyed: u64,
}

/// Reference-counted registry of the shared executors.
///
/// A single lock guards both slots. The first [`acquire`](Self::acquire) of
/// a kind builds its runtime; the [`release`](Self::release) that drops the
/// count back to zero shuts it down without waiting for queued work.
pub struct ExecutorRegistry {
    slots: Mutex<[Slot; 2]>,
    worker_threads: usize,
}

static GLOBAL: LazyLock<Arc<ExecutorRegistry>> =
    LazyLock::new(|| Arc::new(ExecutorRegistry::new()));

impl Default for ExecutorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::with_worker_threads(DEFAULT_WORKER_THREADS)
    }

    pub fn with_worker_threads(worker_threads: usize) -> Self {
        Self {
            slots: Mutex::new(Default::default()),
            worker_threads: worker_threads.max(1),
        }
    }

    /// The process-wide registry used by resolvers unless told otherwise.
    pub fn global() -> Arc<ExecutorRegistry> {
        Arc::clone(&GLOBAL)
    }

    fn lock(&self) -> MutexGuard<'_, [Slot; 2]> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes a reference on the `kind` executor, building it if nobody
    /// holds it yet.
    pub fn acquire(&self, kind: ExecutorKind) -> Result<ExecutorHandle, ResolverError> {
        let mut slots = self.lock();
        let slot = &mut slots[kind.index()];

        let handle = match &slot.runtime {
            Some(runtime) => runtime.handle().clone(),
            None => {
                let runtime = kind.build_runtime(self.worker_threads).map_err(|e| {
                    tracing::error!(%kind, error = %e, "failed to create shared executor");
                    ResolverError::ExecutorUnavailable {
                        kind,
                        source: Arc::new(e),
                    }
                })?;
                slot.created += 1;
                tracing::info!(%kind, generation = slot.created, "created shared executor");
                let handle = runtime.handle().clone();
                slot.runtime = Some(runtime);
                handle
            }
        };

        slot.ref_count += 1;
        Ok(ExecutorHandle {
            kind,
            generation: slot.created,
            handle,
        })
    }

    /// Gives back a reference obtained from [`acquire`](Self::acquire).
    ///
    /// # Errors
    ///
    /// [`ResolverError::ResourceMismatch`] if the handle belongs to an
    /// executor that has already been torn down, or the count is already
    /// zero.
    pub fn release(&self, handle: ExecutorHandle) -> Result<(), ResolverError> {
        let kind = handle.kind;
        let retired = {
            let mut slots = self.lock();
            let slot = &mut slots[kind.index()];
            if slot.ref_count == 0 || slot.runtime.is_none() || slot.created != handle.generation {
                return Err(ResolverError::ResourceMismatch { kind });
            }
            slot.ref_count -= 1;
            if slot.ref_count == 0 {
                slot.destroyed += 1;
                slot.runtime.take()
            } else {
                None
            }
        };

        if let Some(runtime) = retired {
            runtime.shutdown_background();
            tracing::info!(%kind, "destroyed shared executor");
        }
        Ok(())
    }

    pub fn stats(&self, kind: ExecutorKind) -> ExecutorStats {
        let slots = self.lock();
        let slot = &slots[kind.index()];
        ExecutorStats {
            ref_count: slot.ref_count,
            created: slot.created,
            destroyed: slot.destroyed,
        }
    }
}

impl fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutorRegistry")
            .field("timer", &self.stats(ExecutorKind::Timer))
            .field("worker", &self.stats(ExecutorKind::Worker))
            .field("worker_threads", &self.worker_threads)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_creation() {
        let registry = ExecutorRegistry::new();
        assert!(!registry.stats(ExecutorKind::Timer).is_live());

        let handle = registry.acquire(ExecutorKind::Timer).unwrap();
        let stats = registry.stats(ExecutorKind::Timer);
        assert_eq!(stats.ref_count, 1);
        assert!(stats.is_live());
        assert!(!registry.stats(ExecutorKind::Worker).is_live());

        registry.release(handle).unwrap();
        assert!(!registry.stats(ExecutorKind::Timer).is_live());
    }

    #[test]
    fn test_shared_until_last_release() {
        let registry = ExecutorRegistry::new();
        let first = registry.acquire(ExecutorKind::Worker).unwrap();
        let second = registry.acquire(ExecutorKind::Worker).unwrap();
        assert_eq!(registry.stats(ExecutorKind::Worker).created, 1);

        registry.release(first).unwrap();
        let stats = registry.stats(ExecutorKind::Worker);
        assert_eq!(stats.ref_count, 1);
        assert!(stats.is_live());

        registry.release(second).unwrap();
        let stats = registry.stats(ExecutorKind::Worker);
        assert_eq!(stats.ref_count, 0);
        assert_eq!(stats.destroyed, 1);
    }

    #[test]
    fn test_recreated_after_teardown() {
        let registry = ExecutorRegistry::new();
        let handle = registry.acquire(ExecutorKind::Timer).unwrap();
        registry.release(handle).unwrap();

        let handle = registry.acquire(ExecutorKind::Timer).unwrap();
        assert_eq!(registry.stats(ExecutorKind::Timer).created, 2);
        registry.release(handle).unwrap();
    }

    #[test]
    fn test_stale_handle_rejected() {
        let registry = ExecutorRegistry::new();
        let stale = registry.acquire(ExecutorKind::Timer).unwrap();
        let stale_generation = stale.generation;
        registry.release(stale).unwrap();

        let live = registry.acquire(ExecutorKind::Timer).unwrap();
        let forged = ExecutorHandle {
            kind: ExecutorKind::Timer,
            generation: stale_generation,
            handle: live.handle().clone(),
        };
        assert!(matches!(
            registry.release(forged),
            Err(ResolverError::ResourceMismatch {
                kind: ExecutorKind::Timer
            })
        ));
        assert_eq!(registry.stats(ExecutorKind::Timer).ref_count, 1);
        registry.release(live).unwrap();
    }

    #[test]
    fn test_worker_runs_tasks() {
        let registry = ExecutorRegistry::new();
        let worker = registry.acquire(ExecutorKind::Worker).unwrap();
        let (tx, rx) = std::sync::mpsc::channel();
        worker.spawn(async move {
            let name = std::thread::current().name().map(str::to_owned);
            let _ = tx.send(name);
        });
        let name = rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .unwrap()
            .unwrap_or_default();
        assert!(name.starts_with("rpc-resolver-executor-"), "thread {name}");
        registry.release(worker).unwrap();
    }
}
