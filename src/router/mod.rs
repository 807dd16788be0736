//! # Route Table
//! src/router/mod.rs
//!
//! Maps request paths to handlers.
//!
//! ```text
//! Request → RouteTable → Handler(context, request, writer) → bool
//! ```
//!
//! Several paths may share one handler. A path with no route goes to the
//! fallback handler, if one was registered. The table is filled before the
//! server starts and only read afterwards.

use crate::handlers::HandlerContext;
use crate::http::{Request, ResponseWriter};
use std::collections::HashMap;

/// Handler function type
///
/// A handler writes a complete reply (status line, headers, body) and
/// returns whether every write succeeded. `false` means the peer is gone.
pub type Handler = fn(&HandlerContext, &Request, &mut ResponseWriter<'_>) -> bool;

/// Path → handler lookup with an optional fallback
#[derive(Default)]
pub struct RouteTable {
    /// path → index into `handlers`
    path_table: HashMap<String, usize>,
    handlers: Vec<Handler>,
    fallback: Option<Handler>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one handler for every path in `paths`
    ///
    /// Returns `false` (and registers nothing) when `paths` is empty.
    ///
    /// # Example
    /// ```
    /// use tippy::handlers::serve_resource;
    /// use tippy::router::RouteTable;
    ///
    /// let mut routes = RouteTable::new();
    /// assert!(routes.register(&["/index.html", "/"], serve_resource));
    /// assert!(routes.lookup("/").is_some());
    /// assert!(routes.lookup("/other").is_none());
    /// ```
    pub fn register(&mut self, paths: &[&str], handler: Handler) -> bool {
        if paths.is_empty() {
            return false;
        }

        self.handlers.push(handler);
        let index = self.handlers.len() - 1;

        for path in paths {
            self.path_table.insert(path.to_string(), index);
        }

        true
    }

    /// Handler used when no path matches
    pub fn register_fallback(&mut self, handler: Handler) {
        self.fallback = Some(handler);
    }

    /// Exact-path handler, else the fallback, else `None`
    pub fn lookup(&self, path: &str) -> Option<Handler> {
        self.path_table
            .get(path)
            .map(|&index| self.handlers[index])
            .or(self.fallback)
    }

    /// Number of registered paths
    pub fn len(&self) -> usize {
        self.path_table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path_table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Method, StatusCode};
    use crate::resources::ResourceStore;
    use std::sync::Arc;

    fn ok_handler(_ctx: &HandlerContext, _req: &Request, res: &mut ResponseWriter<'_>) -> bool {
        res.write_status_line(StatusCode::Ok.as_u16())
    }

    fn missing_handler(_ctx: &HandlerContext, _req: &Request, res: &mut ResponseWriter<'_>) -> bool {
        res.write_status_line(StatusCode::NotFound.as_u16())
    }

    fn run(routes: &RouteTable, path: &str) -> Option<String> {
        let context = HandlerContext::new("Test/1.0", Arc::new(ResourceStore::new()));
        let request = Request::new(Method::GET, path);
        let handler = routes.lookup(path)?;

        let mut buffer = Vec::new();
        handler(&context, &request, &mut ResponseWriter::new(&mut buffer));
        Some(String::from_utf8(buffer).unwrap())
    }

    #[test]
    fn test_router_creation() {
        let routes = RouteTable::new();
        assert!(routes.is_empty());
        assert!(routes.lookup("/").is_none());
    }

    #[test]
    fn test_register_many_paths() {
        let mut routes = RouteTable::new();
        assert!(routes.register(&["/index.html", "/", "/home"], ok_handler));

        assert_eq!(routes.len(), 3);
        assert_eq!(run(&routes, "/home").unwrap(), "HTTP/1.1 200 OK\r\n");
    }

    #[test]
    fn test_register_empty_paths() {
        let mut routes = RouteTable::new();
        assert!(!routes.register(&[], ok_handler));
        assert!(routes.is_empty());
    }

    #[test]
    fn test_fallback_used_for_unknown_paths() {
        let mut routes = RouteTable::new();
        routes.register(&["/index.html"], ok_handler);
        routes.register_fallback(missing_handler);

        assert_eq!(run(&routes, "/index.html").unwrap(), "HTTP/1.1 200 OK\r\n");
        assert_eq!(run(&routes, "/missing").unwrap(), "HTTP/1.1 404 Not Found\r\n");
    }

    #[test]
    fn test_no_route_and_no_fallback() {
        let mut routes = RouteTable::new();
        routes.register(&["/index.html"], ok_handler);

        assert!(run(&routes, "/missing").is_none());
    }
}
