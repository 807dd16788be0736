//! # Connection Acceptor
//! src/server/acceptor.rs
//!
//! The producer side: owns the listening socket, accepts connections and
//! hands them to the workers through the bounded queue. When the queue is
//! full the acceptor blocks and stops calling `accept()`, so the kernel
//! backlog absorbs the excess.

use super::queue::BoundedQueue;
use crate::error::ServerError;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// An accepted connection and its peer; moved, never shared
pub type WorkItem = (TcpStream, SocketAddr);

const WAKE_TIMEOUT: Duration = Duration::from_millis(500);

/// Pause after a failed `accept()`, so a persistent error (EMFILE) does not spin
const ACCEPT_BACKOFF: Duration = Duration::from_millis(10);

pub struct ConnAcceptor {
    listener: TcpListener,
    local_addr: SocketAddr,
    backlog: usize,
    listening: AtomicBool,
}

impl ConnAcceptor {
    /// Binds `addr`; `backlog` becomes the queue capacity
    pub fn bind(addr: &str, backlog: usize) -> Result<Self, ServerError> {
        if backlog < 1 {
            return Err(ServerError::InvalidBacklog(backlog));
        }

        let bind_error = |source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        };

        let listener = TcpListener::bind(addr).map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;

        Ok(Self {
            listener,
            local_addr,
            backlog,
            listening: AtomicBool::new(true),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn backlog(&self) -> usize {
        self.backlog
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    /// Accepts until [`soft_stop`](Self::soft_stop) is called or the queue
    /// closes
    pub fn run(&self, queue: &BoundedQueue<WorkItem>) {
        tracing::info!(addr = %self.local_addr, backlog = self.backlog, "listening");

        while self.is_listening() {
            let (stream, peer) = match self.listener.accept() {
                Ok(accepted) => accepted,
                Err(e) => {
                    if self.is_listening() {
                        tracing::warn!(error = %e, "accept failed");
                        thread::sleep(ACCEPT_BACKOFF);
                    }
                    continue;
                }
            };

            // The wake-up connection from soft_stop lands here
            if !self.is_listening() {
                break;
            }

            tracing::debug!(peer = %peer, "accepted connection");

            if let Err((stream, peer)) = queue.push((stream, peer)) {
                tracing::debug!(peer = %peer, "queue closed, dropping connection");
                drop(stream);
                break;
            }
        }

        tracing::info!(addr = %self.local_addr, "acceptor stopped");
    }

    /// Stops the accept loop and wakes a blocked `accept()`
    ///
    /// The listener itself closes when the acceptor is dropped.
    pub fn soft_stop(&self) {
        if !self.listening.swap(false, Ordering::SeqCst) {
            return;
        }

        if let Err(e) = self.wake() {
            tracing::debug!(error = %e, "wake-up connection failed");
        }
    }

    fn wake(&self) -> io::Result<()> {
        let mut target = self.local_addr;

        if target.ip().is_unspecified() {
            let loopback = match target.ip() {
                IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
                IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::LOCALHOST),
            };
            target.set_ip(loopback);
        }

        TcpStream::connect_timeout(&target, WAKE_TIMEOUT).map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_backlog_zero_rejected() {
        let result = ConnAcceptor::bind("127.0.0.1:0", 0);
        assert!(matches!(result, Err(ServerError::InvalidBacklog(0))));
    }

    #[test]
    fn test_bind_error() {
        let taken = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = taken.local_addr().unwrap().to_string();

        let result = ConnAcceptor::bind(&addr, 1);
        assert!(matches!(result, Err(ServerError::Bind { .. })));
    }

    #[test]
    fn test_accepted_connections_are_queued() {
        let acceptor = Arc::new(ConnAcceptor::bind("127.0.0.1:0", 4).unwrap());
        let queue = Arc::new(BoundedQueue::new(acceptor.backlog()));

        let handle = thread::spawn({
            let acceptor = Arc::clone(&acceptor);
            let queue = Arc::clone(&queue);
            move || acceptor.run(&queue)
        });

        let client = TcpStream::connect(acceptor.local_addr()).unwrap();
        let (_, peer) = queue.pop().unwrap();
        assert_eq!(peer, client.local_addr().unwrap());

        acceptor.soft_stop();
        handle.join().unwrap();
        assert!(!acceptor.is_listening());
    }

    #[test]
    fn test_soft_stop_unblocks_accept() {
        let acceptor = Arc::new(ConnAcceptor::bind("127.0.0.1:0", 1).unwrap());
        let queue = Arc::new(BoundedQueue::new(1));

        let handle = thread::spawn({
            let acceptor = Arc::clone(&acceptor);
            let queue = Arc::clone(&queue);
            move || acceptor.run(&queue)
        });

        thread::sleep(Duration::from_millis(50));
        acceptor.soft_stop();
        handle.join().unwrap();

        // The wake-up connection is never handed to a worker
        assert!(queue.is_empty());
    }

    #[test]
    fn test_accept_backoff_bounds() {
        // Failed accepts must yield the CPU, yet a stop still lands well
        // inside the wake-up window
        assert!(ACCEPT_BACKOFF > Duration::ZERO);
        assert!(ACCEPT_BACKOFF < WAKE_TIMEOUT);
    }

    #[test]
    fn test_closed_queue_ends_loop() {
        let acceptor = Arc::new(ConnAcceptor::bind("127.0.0.1:0", 1).unwrap());
        let queue = Arc::new(BoundedQueue::new(1));
        queue.close();

        let handle = thread::spawn({
            let acceptor = Arc::clone(&acceptor);
            let queue = Arc::clone(&queue);
            move || acceptor.run(&queue)
        });

        let _client = TcpStream::connect(acceptor.local_addr()).unwrap();
        handle.join().unwrap();
    }
}
