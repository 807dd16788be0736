//! # Conditional GET
//! src/server/conditional.rs

use crate::http::Request;
use crate::resources::ResourceStore;

/// Whether the client's cached copy is current, so a 304 can be sent
///
/// Unknown paths are never fresh, a 404 must not turn into a 304. The
/// asserted time is `If-Modified-Since`, or 0 when it is absent, unparsable
/// or overridden by `Cache-Control: no-cache`.
pub fn should_serve_fresh(resources: &ResourceStore, request: &Request) -> bool {
    match resources.lookup(request.path()) {
        Some(resource) => resource.modified() <= request.modified_since(),
        None => false,
    }
}
