//! # Tippy
//! src/lib.rs
//!
//! A small HTTP/1.1 server built from scratch on blocking sockets: one
//! acceptor thread, a bounded connection queue and a fixed pool of worker
//! threads, each running a per-connection state machine with keep-alive.
//!
//! ## Architecture
//!
//! - `http`: request scanner, response writer, status table, HTTP dates
//! - `server`: acceptor, bounded queue, connection workers, pool lifecycle
//! - `router`: path → handler table with a fallback
//! - `resources`: static files loaded once at startup
//! - `handlers`: handler context and the stock static-file handlers
//! - `config`: CLI / environment / JSON file settings
//!
//! ## Example
//!
//! ```no_run
//! use tippy::config::Config;
//! use tippy::handlers::{not_found, serve_resource};
//! use tippy::server::Server;
//!
//! let mut server = Server::new(Config::default())?;
//! server.register_handler(&["/index.html", "/"], serve_resource);
//! server.register_fallback(not_found);
//!
//! let pool = server.start()?;
//! // ... serve until shutdown is requested
//! pool.stop();
//! # Ok::<(), tippy::error::ServerError>(())
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
pub mod resources;
pub mod router;
pub mod server;
