//! # HTTP Requests
//! src/http/request.rs
//!
//! The structured request produced by the [`Scanner`](super::Scanner).
//!
//! ## Request format
//!
//! ```text
//! GET /index.html HTTP/1.1\r\n
//! Host: localhost:8080\r\n
//! If-Modified-Since: Sun, 06 Nov 1994 08:49:37 GMT\r\n
//! \r\n
//! ```
//!
//! Only a fixed set of headers is kept (see [`HeaderName`]); everything
//! else is dropped while scanning. The header table is always fully
//! populated: a header the client did not send is an explicit `None`.

use super::date;

/// Request methods
///
/// Anything other than `HEAD`/`GET` still parses, and is rejected with
/// `501` when the request is dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// HEAD - like GET but only headers come back
    HEAD,

    /// GET - fetch a resource
    GET,

    /// Any other token from the request line
    Unsupported(String),
}

impl Method {
    /// Maps a request-line token to a method
    pub fn from_token(token: &str) -> Self {
        match token {
            "HEAD" => Method::HEAD,
            "GET" => Method::GET,
            other => Method::Unsupported(other.to_string()),
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Method::Unsupported(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::HEAD => "HEAD",
            Method::GET => "GET",
            Method::Unsupported(token) => token,
        }
    }
}

/// The recognized request headers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderName {
    Host,
    Connection,
    ContentType,
    ContentLength,
    TransferEncoding,
    IfModifiedSince,
    IfUnmodifiedSince,
    CacheControl,
}

impl HeaderName {
    pub const COUNT: usize = 8;

    pub const ALL: [HeaderName; HeaderName::COUNT] = [
        HeaderName::Host,
        HeaderName::Connection,
        HeaderName::ContentType,
        HeaderName::ContentLength,
        HeaderName::TransferEncoding,
        HeaderName::IfModifiedSince,
        HeaderName::IfUnmodifiedSince,
        HeaderName::CacheControl,
    ];

    /// Lower-case wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            HeaderName::Host => "host",
            HeaderName::Connection => "connection",
            HeaderName::ContentType => "content-type",
            HeaderName::ContentLength => "content-length",
            HeaderName::TransferEncoding => "transfer-encoding",
            HeaderName::IfModifiedSince => "if-modified-since",
            HeaderName::IfUnmodifiedSince => "if-unmodified-since",
            HeaderName::CacheControl => "cache-control",
        }
    }

    /// Case-insensitive lookup; `None` for headers that are not kept
    ///
    /// # Example
    /// ```
    /// use tippy::http::HeaderName;
    /// assert_eq!(HeaderName::from_name("Content-Length"), Some(HeaderName::ContentLength));
    /// assert_eq!(HeaderName::from_name("User-Agent"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|header| header.as_str().eq_ignore_ascii_case(name))
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Fixed table of recognized header values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    values: [Option<String>; HeaderName::COUNT],
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a header, `None` when the client did not send it
    pub fn get(&self, name: HeaderName) -> Option<&str> {
        self.values[name.index()].as_deref()
    }

    /// Stores a raw `name: value` pair, keeping only the first value seen
    ///
    /// The name is trimmed and matched case-insensitively, the value is
    /// trimmed. Returns `true` only when the value was stored.
    pub fn insert_first(&mut self, raw_name: &str, raw_value: &str) -> bool {
        let Some(name) = HeaderName::from_name(raw_name.trim()) else {
            return false;
        };

        let slot = &mut self.values[name.index()];
        if slot.is_some() {
            return false;
        }

        *slot = Some(raw_value.trim().to_string());
        true
    }

    /// Replaces a header value
    pub fn set(&mut self, name: HeaderName, value: &str) {
        self.values[name.index()] = Some(value.to_string());
    }

    /// Forgets every value without giving back the table
    pub fn clear(&mut self) {
        for value in self.values.iter_mut() {
            *value = None;
        }
    }

    /// Every recognized header with its value or `None`
    pub fn iter(&self) -> impl Iterator<Item = (HeaderName, Option<&str>)> + '_ {
        HeaderName::ALL
            .into_iter()
            .map(move |name| (name, self.get(name)))
    }
}

/// A parsed HTTP request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,

    /// Always starts with `/`
    path: String,

    version: String,

    headers: Headers,

    body: Vec<u8>,
}

impl Request {
    pub const DEFAULT_VERSION: &'static str = "HTTP/1.1";

    /// Builds a request by hand (tests, embedders)
    ///
    /// # Example
    /// ```
    /// use tippy::http::{HeaderName, Method, Request};
    ///
    /// let request = Request::new(Method::GET, "/index.html")
    ///     .with_header(HeaderName::Host, "localhost:8080");
    ///
    /// assert_eq!(request.header(HeaderName::Host), Some("localhost:8080"));
    /// assert_eq!(request.header(HeaderName::Connection), None);
    /// ```
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            version: Self::DEFAULT_VERSION.to_string(),
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    pub(crate) fn from_parts(
        method: Method,
        path: String,
        version: String,
        headers: Headers,
        body: Vec<u8>,
    ) -> Self {
        Self {
            method,
            path,
            version,
            headers,
            body,
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: &str) -> Self {
        self.headers.set(name, value);
        self
    }

    pub fn with_body(mut self, body: &[u8]) -> Self {
        self.body = body.to_vec();
        self
    }

    // === Accessors ===

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header(&self, name: HeaderName) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Effective body length, after de-chunking
    pub fn content_length(&self) -> usize {
        self.body.len()
    }

    // === Connection and cache helpers ===

    /// The client asked to close the connection after this exchange
    pub fn wants_close(&self) -> bool {
        self.header(HeaderName::Connection)
            .is_some_and(|value| value.eq_ignore_ascii_case("close"))
    }

    /// `Cache-Control` carries a `no-cache` directive
    pub fn no_cache(&self) -> bool {
        self.header(HeaderName::CacheControl).is_some_and(|value| {
            value
                .split(',')
                .any(|directive| directive.trim().eq_ignore_ascii_case("no-cache"))
        })
    }

    /// The time the client claims its cached copy is from, in epoch seconds
    ///
    /// 0 (really out of date) when the header is missing or unparsable,
    /// or when `no-cache` forces a full resend.
    pub fn modified_since(&self) -> i64 {
        if self.no_cache() {
            return 0;
        }

        self.header(HeaderName::IfModifiedSince)
            .and_then(date::parse_gmt)
            .unwrap_or(0)
    }

    /// Parsed `If-Unmodified-Since`, 0 when missing or unparsable
    pub fn unmodified_since(&self) -> i64 {
        self.header(HeaderName::IfUnmodifiedSince)
            .and_then(date::parse_gmt)
            .unwrap_or(0)
    }
}

impl std::fmt::Display for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.method.as_str(), self.path, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_tokens() {
        assert_eq!(Method::from_token("GET"), Method::GET);
        assert_eq!(Method::from_token("HEAD"), Method::HEAD);
        assert_eq!(
            Method::from_token("POST"),
            Method::Unsupported("POST".to_string())
        );
        assert!(!Method::from_token("get").is_supported());
        assert_eq!(Method::from_token("DELETE").as_str(), "DELETE");
    }

    #[test]
    fn test_headers_fully_populated() {
        let headers = Headers::new();
        let all: Vec<_> = headers.iter().collect();

        assert_eq!(all.len(), HeaderName::COUNT);
        assert!(all.iter().all(|(_, value)| value.is_none()));
    }

    #[test]
    fn test_headers_first_wins() {
        let mut headers = Headers::new();

        assert!(headers.insert_first(" Host ", " first "));
        assert!(!headers.insert_first("HOST", "second"));

        assert_eq!(headers.get(HeaderName::Host), Some("first"));
    }

    #[test]
    fn test_headers_unrecognized_dropped() {
        let mut headers = Headers::new();

        assert!(!headers.insert_first("User-Agent", "curl"));
        assert!(headers.iter().all(|(_, value)| value.is_none()));
    }

    #[test]
    fn test_headers_clear() {
        let mut headers = Headers::new();
        headers.insert_first("connection", "Close");
        headers.clear();

        assert_eq!(headers, Headers::new());
    }

    #[test]
    fn test_wants_close() {
        let keep = Request::new(Method::GET, "/").with_header(HeaderName::Connection, "Keep-Alive");
        let close = Request::new(Method::GET, "/").with_header(HeaderName::Connection, "Close");
        let lower = Request::new(Method::GET, "/").with_header(HeaderName::Connection, "close");

        assert!(!keep.wants_close());
        assert!(close.wants_close());
        assert!(lower.wants_close());
        assert!(!Request::new(Method::GET, "/").wants_close());
    }

    #[test]
    fn test_modified_since_parsed() {
        let request = Request::new(Method::GET, "/")
            .with_header(HeaderName::IfModifiedSince, "Sun, 06 Nov 1994 08:49:37 GMT");

        assert_eq!(request.modified_since(), 784111777);
    }

    #[test]
    fn test_modified_since_defaults_to_epoch() {
        let missing = Request::new(Method::GET, "/");
        let garbage = Request::new(Method::GET, "/")
            .with_header(HeaderName::IfModifiedSince, "not a date");

        assert_eq!(missing.modified_since(), 0);
        assert_eq!(garbage.modified_since(), 0);
    }

    #[test]
    fn test_no_cache_forces_full_resend() {
        let request = Request::new(Method::GET, "/")
            .with_header(HeaderName::IfModifiedSince, "Sun, 06 Nov 1994 08:49:37 GMT")
            .with_header(HeaderName::CacheControl, "max-age=0, No-Cache");

        assert!(request.no_cache());
        assert_eq!(request.modified_since(), 0);
    }

    #[test]
    fn test_unmodified_since() {
        let request = Request::new(Method::GET, "/")
            .with_header(HeaderName::IfUnmodifiedSince, "Sun, 06 Nov 1994 08:49:37 GMT");

        assert_eq!(request.unmodified_since(), 784111777);
        assert_eq!(Request::new(Method::GET, "/").unmodified_since(), 0);
    }

    #[test]
    fn test_display() {
        let request = Request::new(Method::HEAD, "/style.css");
        assert_eq!(request.to_string(), "HEAD /style.css HTTP/1.1");
    }
}
