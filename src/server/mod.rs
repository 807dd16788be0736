//! # Server
//! src/server/mod.rs
//!
//! The concurrency core:
//! 1. `acceptor`: accepts connections and publishes them to the queue
//! 2. `queue`: the bounded queue, the only state shared mutably
//! 3. `worker`: the per-connection state machine, one per thread
//! 4. `conditional`: the 304 decision
//! 5. `pool`: setup (`Server`) and the running `WorkerPool`

pub mod acceptor;
pub mod conditional;
pub mod pool;
pub mod queue;
pub mod worker;

pub use acceptor::{ConnAcceptor, WorkItem};
pub use conditional::should_serve_fresh;
pub use pool::{Server, WorkerPool};
pub use queue::BoundedQueue;
pub use worker::{ConnWorker, WorkerError};
