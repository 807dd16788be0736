//! # Server and Worker Pool
//! src/server/pool.rs
//!
//! Two phases. [`Server`] is the single-threaded setup phase: bind, load the
//! resources, register routes. [`Server::start`] freezes the tables into
//! shared read-only snapshots and returns the running [`WorkerPool`]:
//!
//! ```text
//!                  ┌──────────────────┐
//!   clients ──────▶│  tippy-acceptor  │
//!                  └────────┬─────────┘
//!                           │ push (blocks when full)
//!                  ┌────────▼─────────┐
//!                  │  BoundedQueue    │  capacity = backlog
//!                  └──┬──────┬─────┬──┘
//!                pop  │      │     │
//!               tipster-0 tipster-1 ... tipster-N
//! ```

use super::acceptor::{ConnAcceptor, WorkItem};
use super::queue::BoundedQueue;
use super::worker::{ActiveSlot, ConnWorker};
use crate::config::Config;
use crate::error::ServerError;
use crate::handlers::HandlerContext;
use crate::resources::ResourceStore;
use crate::router::{Handler, RouteTable};
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// A bound, not yet serving, server
pub struct Server {
    config: Config,
    acceptor: ConnAcceptor,
    routes: RouteTable,
    resources: ResourceStore,
}

impl Server {
    /// Validates the configuration, binds the listener and loads the public
    /// directory; any failure here is fatal
    pub fn new(config: Config) -> Result<Self, ServerError> {
        let resources = ResourceStore::load(&config.public_dir).map_err(|source| ServerError::Resources {
            dir: config.public_dir.clone(),
            source,
        })?;

        tracing::info!(
            dir = %config.public_dir.display(),
            resources = resources.len(),
            "loaded resources"
        );

        Self::with_resources(config, resources)
    }

    /// Like [`new`](Self::new), with a store built by the caller
    pub fn with_resources(config: Config, resources: ResourceStore) -> Result<Self, ServerError> {
        config.validate()?;
        let acceptor = ConnAcceptor::bind(&config.address(), config.backlog)?;

        Ok(Self {
            config,
            acceptor,
            routes: RouteTable::new(),
            resources,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.acceptor.local_addr()
    }

    pub fn resources(&self) -> &ResourceStore {
        &self.resources
    }

    /// Routes every path in `paths` to `handler`; `paths[1..]` also become
    /// aliases of the resource under `paths[0]`, if there is one
    pub fn register_handler(&mut self, paths: &[&str], handler: Handler) -> bool {
        if !self.routes.register(paths, handler) {
            return false;
        }

        if paths.len() > 1 && !self.resources.register_aliases(paths) {
            tracing::debug!(primary = paths[0], "no resource to alias");
        }

        true
    }

    pub fn register_fallback(&mut self, handler: Handler) {
        self.routes.register_fallback(handler);
    }

    /// Starts the acceptor, then the workers
    pub fn start(self) -> Result<WorkerPool, ServerError> {
        let Server {
            config,
            acceptor,
            routes,
            resources,
        } = self;

        let context = HandlerContext::new(&config.server_name, Arc::new(resources));
        let routes = Arc::new(routes);

        let workers: Vec<(ConnWorker, Arc<ActiveSlot>)> = (0..config.workers)
            .map(|id| {
                let slot = Arc::new(ActiveSlot::default());
                let worker = ConnWorker::new(id, context.clone(), Arc::clone(&routes), Arc::clone(&slot));
                (worker, slot)
            })
            .collect();

        let mut pool = WorkerPool {
            local_addr: acceptor.local_addr(),
            acceptor: Arc::new(acceptor),
            queue: Arc::new(BoundedQueue::new(config.backlog)),
            slots: Vec::with_capacity(workers.len()),
            threads: Vec::with_capacity(workers.len() + 1),
        };

        let acceptor_thread = thread::Builder::new().name("tippy-acceptor".to_string()).spawn({
            let acceptor = Arc::clone(&pool.acceptor);
            let queue = Arc::clone(&pool.queue);
            move || acceptor.run(&queue)
        });

        match acceptor_thread {
            Ok(handle) => pool.threads.push(handle),
            Err(e) => return Err(ServerError::Spawn(e)),
        }

        for (mut worker, slot) in workers {
            let queue = Arc::clone(&pool.queue);
            let spawned = thread::Builder::new()
                .name(format!("tipster-{}", worker.id()))
                .spawn(move || worker.run(&queue));

            match spawned {
                Ok(handle) => {
                    pool.slots.push(slot);
                    pool.threads.push(handle);
                }
                Err(e) => {
                    pool.shutdown();
                    return Err(ServerError::Spawn(e));
                }
            }
        }

        tracing::info!(
            addr = %pool.local_addr,
            workers = pool.slots.len(),
            server = %context.server_name(),
            "server started"
        );

        Ok(pool)
    }
}

/// The running server
pub struct WorkerPool {
    local_addr: SocketAddr,
    acceptor: Arc<ConnAcceptor>,
    queue: Arc<BoundedQueue<WorkItem>>,
    slots: Vec<Arc<ActiveSlot>>,
    threads: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn workers(&self) -> usize {
        self.slots.len()
    }

    /// Connections accepted but not yet picked up by a worker
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Stops accepting, closes every connection and joins all threads
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.threads.is_empty() {
            return;
        }

        self.acceptor.soft_stop();
        self.queue.close();

        for slot in &self.slots {
            slot.halt();
        }

        for handle in self.threads.drain(..) {
            let name = handle.thread().name().unwrap_or("unnamed").to_string();

            if handle.join().is_err() {
                tracing::error!(thread = %name, "thread panicked");
            }
        }

        tracing::info!(addr = %self.local_addr, "server stopped");
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
