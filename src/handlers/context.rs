//! # Handler Context
//! src/handlers/context.rs
//!
//! What every handler gets besides the request and the writer: the server
//! product token, the shared resource store and the reply preamble.

use crate::http::{date, ResponseWriter};
use crate::resources::{ResourceStore, StaticResource};
use std::sync::Arc;

/// Read-only data shared by every handler invocation
#[derive(Debug, Clone)]
pub struct HandlerContext {
    server_name: String,
    resources: Arc<ResourceStore>,
}

impl HandlerContext {
    pub fn new(server_name: &str, resources: Arc<ResourceStore>) -> Self {
        Self {
            server_name: server_name.to_string(),
            resources,
        }
    }

    /// Product token for the `Server` header
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    pub fn resources(&self) -> &ResourceStore {
        &self.resources
    }

    pub fn resource(&self, path: &str) -> Option<&StaticResource> {
        self.resources.lookup(path)
    }

    /// Current time for the `Date` header
    pub fn gmt_now(&self) -> String {
        date::now_gmt()
    }

    /// Writes the status line and the common headers, in order:
    /// `Date`, `Connection`, `Server`
    ///
    /// A `false` from the status line stops early, nothing else is tried.
    ///
    /// # Example
    /// ```
    /// use std::sync::Arc;
    /// use tippy::handlers::HandlerContext;
    /// use tippy::http::ResponseWriter;
    /// use tippy::resources::ResourceStore;
    ///
    /// let context = HandlerContext::new("Tippy/v0.5", Arc::new(ResourceStore::new()));
    /// let mut buffer = Vec::new();
    /// assert!(context.begin_reply(&mut ResponseWriter::new(&mut buffer), 404, true));
    ///
    /// let text = String::from_utf8(buffer).unwrap();
    /// assert!(text.starts_with("HTTP/1.1 404 Not Found\r\nDate: "));
    /// assert!(text.ends_with("Connection: Close\r\nServer: Tippy/v0.5\r\n"));
    /// ```
    pub fn begin_reply(&self, writer: &mut ResponseWriter<'_>, code: u16, close: bool) -> bool {
        if !writer.write_status_line(code) {
            return false;
        }

        let connection = if close { "Close" } else { "Keep-Alive" };

        writer.write_header("Date", &self.gmt_now())
            && writer.write_header("Connection", connection)
            && writer.write_header("Server", &self.server_name)
    }
}
