//! # HTTP Module
//! src/http/mod.rs
//!
//! The wire-level half of the server, written from scratch:
//!
//! - Incremental request scanning (request line, headers, fixed-length
//!   and chunked bodies)
//! - Piecewise response writing with three body framings
//! - The status-code table
//! - RFC 1123 dates
//!
//! ### Request format
//!
//! ```text
//! GET /index.html HTTP/1.1\r\n
//! Host: localhost:8085\r\n
//! Connection: Keep-Alive\r\n
//! \r\n
//! ```
//!
//! ### Response format
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Date: Sun, 06 Nov 1994 08:49:37 GMT\r\n
//! Connection: Keep-Alive\r\n
//! Server: Tippy/v0.5\r\n
//! Content-Type: text/html\r\n
//! Content-Length: 13\r\n
//! \r\n
//! <html></html>
//! ```

pub mod date;
pub mod request;
pub mod scanner;
pub mod status;
pub mod writer;

pub use request::{HeaderName, Headers, Method, Request};
pub use scanner::{ParseError, Scanner};
pub use status::StatusCode;
pub use writer::{BodyMode, ResponseWriter};
