//! # Handlers
//! src/handlers/mod.rs
//!
//! The application side of the server: handlers receive the shared
//! [`HandlerContext`], the parsed request and a writer, and send a
//! complete reply themselves.
//!
//! - `serve_resource`: the static file indexed under the request path
//! - `not_found`: the fallback, an empty 404

pub mod context;

pub use context::HandlerContext;

use crate::http::{BodyMode, Method, Request, ResponseWriter, StatusCode};
use crate::resources::MIME_ANY;

/// Serves the resource stored under the request path
///
/// HEAD gets the headers only, GET gets the payload too. A path without a
/// resource is answered like [`not_found`].
pub fn serve_resource(ctx: &HandlerContext, req: &Request, res: &mut ResponseWriter<'_>) -> bool {
    let Some(resource) = ctx.resource(req.path()) else {
        return not_found(ctx, req, res);
    };

    if !ctx.begin_reply(res, StatusCode::Ok.as_u16(), req.wants_close()) {
        return false;
    }

    let mode = match req.method() {
        Method::HEAD => BodyMode::HeadOnly,
        _ => BodyMode::WithBody,
    };

    res.write_body(mode, resource.mime_type(), resource.as_bytes())
}

/// Fallback handler: 404 with an empty body
pub fn not_found(ctx: &HandlerContext, req: &Request, res: &mut ResponseWriter<'_>) -> bool {
    if !ctx.begin_reply(res, StatusCode::NotFound.as_u16(), req.wants_close()) {
        return false;
    }

    let mode = match req.method() {
        Method::HEAD => BodyMode::HeadOnly,
        _ => BodyMode::Empty,
    };

    res.write_body(mode, MIME_ANY, b"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HeaderName;
    use crate::resources::{ResourceStore, StaticResource};
    use std::sync::Arc;

    fn context() -> HandlerContext {
        let mut store = ResourceStore::new();
        store.insert(
            "/index.html",
            StaticResource::new(b"<h1>tippy</h1>".to_vec(), "text/html", 1_000),
        );
        HandlerContext::new("Tippy/test", Arc::new(store))
    }

    fn call(handler: crate::router::Handler, request: Request) -> (bool, String) {
        let mut buffer = Vec::new();
        let ok = handler(&context(), &request, &mut ResponseWriter::new(&mut buffer));
        (ok, String::from_utf8(buffer).unwrap())
    }

    #[test]
    fn test_serve_resource_get() {
        let (ok, text) = call(serve_resource, Request::new(Method::GET, "/index.html"));

        assert!(ok);
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Type: text/html\r\n"));
        assert!(text.contains("Content-Length: 14\r\n"));
        assert!(text.ends_with("\r\n\r\n<h1>tippy</h1>"));
    }

    #[test]
    fn test_serve_resource_head() {
        let (ok, text) = call(serve_resource, Request::new(Method::HEAD, "/index.html"));

        assert!(ok);
        assert!(text.contains("Content-Length: 14\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
        assert!(!text.contains("<h1>"));
    }

    #[test]
    fn test_serve_resource_missing_is_404() {
        let (ok, text) = call(serve_resource, Request::new(Method::GET, "/nope.html"));

        assert!(ok);
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.ends_with("Content-Type: */*\r\nContent-Length: 0\r\n\r\n"));
    }

    #[test]
    fn test_not_found_mirrors_connection_close() {
        let request = Request::new(Method::GET, "/x").with_header(HeaderName::Connection, "Close");
        let (_, text) = call(not_found, request);

        assert!(text.contains("Connection: Close\r\n"));
    }
}
