//! # Connection Worker
//! src/server/worker.rs
//!
//! One worker serves one connection at a time, for as many requests as the
//! client sends over it, then goes back to the queue for the next one.
//!
//! ```text
//! IDLE → CONSUME → RECEIVE → HANDLE ─┬→ REDO  → RECEIVE   (keep-alive)
//!           ▲                        ├→ RESET → CONSUME   (close)
//!           │                        └→ END               (queue closed)
//!           └──── RESET ←── ERROR  (fault or panic in any step)
//! ```
//!
//! Every step runs under `catch_unwind`: a bad connection or a panicking
//! handler resets that connection and nothing else.

use super::acceptor::WorkItem;
use super::conditional::should_serve_fresh;
use super::queue::BoundedQueue;
use crate::handlers::HandlerContext;
use crate::http::{BodyMode, HeaderName, ParseError, Request, ResponseWriter, Scanner, StatusCode};
use crate::resources::MIME_ANY;
use crate::router::RouteTable;
use std::any::Any;
use std::io::{self, BufReader, BufWriter, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// === Errors ===

/// Faults that end the current connection (never the worker)
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("cannot set up connection: {0}")]
    Setup(#[source] io::Error),

    #[error(transparent)]
    Read(#[from] ParseError),

    #[error("no connection bound")]
    NoConnection,
}

// === Active socket slot ===

#[derive(Debug, Default)]
struct SlotState {
    stream: Option<TcpStream>,
    halted: bool,
}

/// The socket a worker currently serves, reachable from the pool so that
/// `stop()` can unblock a worker stuck in a read or write
#[derive(Debug, Default)]
pub struct ActiveSlot {
    state: Mutex<SlotState>,
}

impl ActiveSlot {
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// `false` once the slot is halted; the caller must drop the connection
    fn occupy(&self, stream: TcpStream) -> bool {
        let mut state = self.lock();
        if state.halted {
            return false;
        }

        state.stream = Some(stream);
        true
    }

    fn release(&self) {
        self.lock().stream = None;
    }

    /// Shuts down the held socket and refuses any later one
    pub fn halt(&self) {
        let mut state = self.lock();
        state.halted = true;

        if let Some(stream) = state.stream.take() {
            if let Err(e) = stream.shutdown(Shutdown::Both) {
                tracing::trace!(error = %e, "shutdown of active socket failed");
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        self.lock().stream.is_some()
    }
}

// === State machine ===

enum WorkerState {
    Idle,
    Consume,
    Receive,
    Handle(Result<Request, ParseError>),
    Redo,
    Reset,
    Error,
    End,
}

/// Everything bound to the socket being served
struct Connection {
    peer: SocketAddr,
    scanner: Scanner<BufReader<TcpStream>>,
    writer: BufWriter<TcpStream>,
}

pub struct ConnWorker {
    id: usize,
    context: HandlerContext,
    routes: Arc<RouteTable>,
    slot: Arc<ActiveSlot>,
    conn: Option<Connection>,
}

impl ConnWorker {
    pub fn new(id: usize, context: HandlerContext, routes: Arc<RouteTable>, slot: Arc<ActiveSlot>) -> Self {
        Self {
            id,
            context,
            routes,
            slot,
            conn: None,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Serves connections from `queue` until it is closed
    pub fn run(&mut self, queue: &BoundedQueue<WorkItem>) {
        tracing::debug!(worker = self.id, "worker started");
        let mut state = WorkerState::Idle;

        loop {
            if let WorkerState::End = state {
                break;
            }

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.step(state, queue)));

            state = match outcome {
                Ok(Ok(next)) => next,
                Ok(Err(e)) => {
                    tracing::warn!(worker = self.id, peer = ?self.peer(), error = %e, "connection fault");
                    WorkerState::Error
                }
                Err(payload) => {
                    tracing::error!(
                        worker = self.id,
                        peer = ?self.peer(),
                        panic = %panic_message(payload.as_ref()),
                        "handler panicked"
                    );
                    WorkerState::Error
                }
            };
        }

        self.release();
        tracing::debug!(worker = self.id, "worker stopped");
    }

    /// One transition: (state, input) → next state
    fn step(&mut self, state: WorkerState, queue: &BoundedQueue<WorkItem>) -> Result<WorkerState, WorkerError> {
        match state {
            WorkerState::Idle => Ok(WorkerState::Consume),
            WorkerState::Consume => self.consume(queue),
            WorkerState::Receive => {
                let conn = self.conn.as_mut().ok_or(WorkerError::NoConnection)?;
                Ok(WorkerState::Handle(conn.scanner.next_request()))
            }
            WorkerState::Handle(parsed) => self.handle(parsed),
            WorkerState::Redo => {
                let conn = self.conn.as_mut().ok_or(WorkerError::NoConnection)?;
                conn.scanner.reset();
                Ok(WorkerState::Receive)
            }
            WorkerState::Reset | WorkerState::Error => {
                self.release();
                Ok(WorkerState::Consume)
            }
            WorkerState::End => Ok(WorkerState::End),
        }
    }

    fn consume(&mut self, queue: &BoundedQueue<WorkItem>) -> Result<WorkerState, WorkerError> {
        let Some((stream, peer)) = queue.pop() else {
            return Ok(WorkerState::End);
        };

        tracing::debug!(worker = self.id, peer = %peer, "consumed connection");

        let reader = stream.try_clone().map_err(WorkerError::Setup)?;
        let handle = stream.try_clone().map_err(WorkerError::Setup)?;

        if !self.slot.occupy(handle) {
            return Ok(WorkerState::End);
        }

        self.conn = Some(Connection {
            peer,
            scanner: Scanner::new(BufReader::new(reader)),
            writer: BufWriter::new(stream),
        });

        Ok(WorkerState::Receive)
    }

    fn handle(&mut self, parsed: Result<Request, ParseError>) -> Result<WorkerState, WorkerError> {
        let conn = self.conn.as_mut().ok_or(WorkerError::NoConnection)?;

        let request = match parsed {
            Ok(request) => request,
            Err(ParseError::ConnectionClosed) => return Ok(WorkerState::Reset),
            Err(e) if e.expects_reply() => {
                tracing::debug!(worker = self.id, peer = %conn.peer, error = %e, "malformed request");

                let close = !e.is_recoverable() || conn.scanner.connection_close();
                let sent = reply_empty(&self.context, &mut conn.writer, StatusCode::BadRequest, close);

                return Ok(next_after_reply(sent, close));
            }
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(worker = self.id, peer = %conn.peer, request = %request, "request");

        let close = request.wants_close();

        let sent = if request.header(HeaderName::Host).is_none() {
            reply_empty(&self.context, &mut conn.writer, StatusCode::BadRequest, close)
        } else if !request.method().is_supported() {
            reply_empty(&self.context, &mut conn.writer, StatusCode::NotImplemented, close)
        } else if should_serve_fresh(self.context.resources(), &request) {
            reply_empty(&self.context, &mut conn.writer, StatusCode::NotModified, close)
        } else {
            match self.routes.lookup(request.path()) {
                Some(handler) => handler(&self.context, &request, &mut ResponseWriter::new(&mut conn.writer)),
                None => reply_empty(&self.context, &mut conn.writer, StatusCode::NotFound, close),
            }
        };

        Ok(next_after_reply(sent, close))
    }

    fn peer(&self) -> Option<SocketAddr> {
        self.conn.as_ref().map(|conn| conn.peer)
    }

    /// Closes the current socket, if any
    fn release(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(e) = conn.writer.get_ref().shutdown(Shutdown::Both) {
                tracing::trace!(worker = self.id, error = %e, "shutdown failed");
            }
            tracing::debug!(worker = self.id, peer = %conn.peer, "closed connection");
        }

        self.slot.release();
    }
}

/// Status line, common headers and an empty body
fn reply_empty(ctx: &HandlerContext, out: &mut dyn Write, status: StatusCode, close: bool) -> bool {
    let mut writer = ResponseWriter::new(out);
    ctx.begin_reply(&mut writer, status.as_u16(), close) && writer.write_body(BodyMode::Empty, MIME_ANY, b"")
}

fn next_after_reply(sent: bool, close: bool) -> WorkerState {
    if sent && !close {
        WorkerState::Redo
    } else {
        WorkerState::Reset
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
