//! # Incremental Request Scanner
//! src/http/scanner.rs
//!
//! Turns a byte stream into one [`Request`] at a time. The scanner reads
//! line by line straight from the stream; it never assumes the whole
//! message is already buffered.
//!
//! ## States
//!
//! ```text
//! HEADING → HEADER* → BODY → (CHUNK_LEN → CHUNK_BLOB)* → END
//!    │         │
//!    └─────────┴──→ ERROR (drain the header block, then report)
//! ```
//!
//! One scanner lives as long as its connection. Between keep-alive
//! requests it is [`reset`](Scanner::reset), not rebuilt.

use super::request::{HeaderName, Headers, Method, Request};
use std::io::{self, BufRead, Read};

/// Longest line (request line, header, chunk size) accepted, CRLF included
pub const MAX_LINE_BYTES: u64 = 8 * 1024;

/// Largest request body accepted, chunked bodies included
pub const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Why a request could not be produced
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Request line without exactly `METHOD SP PATH SP VERSION`
    #[error("malformed request line: {0:?}")]
    InvalidRequestLine(String),

    /// Header line without a `:`
    #[error("malformed header line: {0:?}")]
    InvalidHeader(String),

    /// A line longer than [`MAX_LINE_BYTES`]
    #[error("line exceeds {} bytes", MAX_LINE_BYTES)]
    LineTooLong,

    /// A declared or accumulated body larger than [`MAX_BODY_BYTES`]
    #[error("request body exceeds {} bytes", MAX_BODY_BYTES)]
    BodyTooLarge,

    /// The peer closed the stream before a new request started
    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("i/o error while reading request: {0}")]
    Io(#[from] io::Error),
}

impl ParseError {
    /// The stream is still in sync and the connection can serve another request
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ParseError::InvalidRequestLine(_) | ParseError::InvalidHeader(_)
        )
    }

    /// A reply can still be written (the peer sent something we reject)
    pub fn expects_reply(&self) -> bool {
        self.is_recoverable() || matches!(self, ParseError::LineTooLong | ParseError::BodyTooLarge)
    }
}

/// The three tokens of a request line
#[derive(Debug, Clone, PartialEq, Eq)]
struct RequestLine {
    method: Method,
    path: String,
    version: String,
}

impl RequestLine {
    /// Splits on single spaces; anything but exactly three tokens, or a
    /// path that does not start with `/`, is rejected
    fn parse(line: &str) -> Option<Self> {
        let tokens: Vec<&str> = line.split(' ').collect();

        let [method, path, version] = tokens.as_slice() else {
            return None;
        };

        if !path.starts_with('/') || version.is_empty() {
            return None;
        }

        Some(Self {
            method: Method::from_token(method),
            path: path.to_string(),
            version: version.to_string(),
        })
    }
}

/// How the next chunk body is framed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkFraming {
    /// Hex size line: read exactly this many bytes, then the CRLF
    Exact(usize),

    /// Size line was not hex: the next line is the chunk
    Line,
}

#[derive(Debug)]
enum ScanState {
    Heading,
    Header,
    Body,
    ChunkLen,
    ChunkBlob(ChunkFraming),
    Trailer,
    Error(ParseError),
    End,
}

/// Incremental HTTP/1.1 request parser bound to one stream
pub struct Scanner<R> {
    reader: R,
    state: ScanState,
    request_line: Option<RequestLine>,
    headers: Headers,
    body: Vec<u8>,
    content_length: usize,
    line: Vec<u8>,
}

impl<R: BufRead> Scanner<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            state: ScanState::Heading,
            request_line: None,
            headers: Headers::new(),
            body: Vec::new(),
            content_length: 0,
            line: Vec::with_capacity(256),
        }
    }

    /// Clears all per-message state so the next request can be read from
    /// the same stream
    pub fn reset(&mut self) {
        self.state = ScanState::Heading;
        self.request_line = None;
        self.headers.clear();
        self.body.clear();
        self.content_length = 0;
        self.line.clear();
    }

    /// Headers seen so far for the current message, even a failed one
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The current (possibly malformed) message carried `Connection: close`
    pub fn connection_close(&self) -> bool {
        self.headers
            .get(HeaderName::Connection)
            .is_some_and(|value| value.eq_ignore_ascii_case("close"))
    }

    /// Reads the next complete request
    ///
    /// The scanner must be [`reset`](Scanner::reset) between two calls.
    ///
    /// # Example
    /// ```
    /// use tippy::http::{HeaderName, Scanner};
    ///
    /// let raw: &[u8] = b"GET /index.html HTTP/1.1\r\nHost: localhost\r\n\r\n";
    /// let mut scanner = Scanner::new(raw);
    /// let request = scanner.next_request().unwrap();
    ///
    /// assert_eq!(request.path(), "/index.html");
    /// assert_eq!(request.header(HeaderName::Host), Some("localhost"));
    /// ```
    pub fn next_request(&mut self) -> Result<Request, ParseError> {
        loop {
            let state = std::mem::replace(&mut self.state, ScanState::Heading);

            if let ScanState::End = state {
                self.state = ScanState::End;
                return self.finish();
            }

            self.state = self.step(state)?;
        }
    }

    /// One transition: (state, input) → next state
    fn step(&mut self, state: ScanState) -> Result<ScanState, ParseError> {
        match state {
            ScanState::Heading => self.scan_heading(),
            ScanState::Header => self.scan_header(),
            ScanState::Body => self.scan_body(),
            ScanState::ChunkLen => self.scan_chunk_len(),
            ScanState::ChunkBlob(framing) => self.scan_chunk_blob(framing),
            ScanState::Trailer => self.scan_trailer(),
            ScanState::Error(error) => self.drain(error),
            ScanState::End => Ok(ScanState::End),
        }
    }

    fn scan_heading(&mut self) -> Result<ScanState, ParseError> {
        let Some(line) = self.read_line()? else {
            return Err(ParseError::ConnectionClosed);
        };

        // Stray CRLF between requests
        if line.is_empty() {
            return Ok(ScanState::Heading);
        }

        match RequestLine::parse(&line) {
            Some(request_line) => {
                self.request_line = Some(request_line);
                Ok(ScanState::Header)
            }
            None => Ok(ScanState::Error(ParseError::InvalidRequestLine(line))),
        }
    }

    fn scan_header(&mut self) -> Result<ScanState, ParseError> {
        let line = self.read_line_in_message()?;

        if line.is_empty() {
            return Ok(ScanState::Body);
        }

        match line.split_once(':') {
            Some((name, value)) => {
                self.headers.insert_first(name, value);
                Ok(ScanState::Header)
            }
            None => Ok(ScanState::Error(ParseError::InvalidHeader(line))),
        }
    }

    fn scan_body(&mut self) -> Result<ScanState, ParseError> {
        let chunked = self
            .headers
            .get(HeaderName::TransferEncoding)
            .is_some_and(|value| value.eq_ignore_ascii_case("chunked"));

        if chunked {
            return Ok(ScanState::ChunkLen);
        }

        let length = self
            .headers
            .get(HeaderName::ContentLength)
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(0);

        self.read_exact_into_body(length)?;

        Ok(ScanState::End)
    }

    fn scan_chunk_len(&mut self) -> Result<ScanState, ParseError> {
        let line = self.read_line_in_message()?;

        if line.is_empty() {
            return Ok(ScanState::End);
        }

        let size_token = line.split(';').next().unwrap_or_default().trim();

        match usize::from_str_radix(size_token, 16) {
            Ok(0) => Ok(ScanState::Trailer),
            Ok(size) => Ok(ScanState::ChunkBlob(ChunkFraming::Exact(size))),
            Err(_) => Ok(ScanState::ChunkBlob(ChunkFraming::Line)),
        }
    }

    fn scan_chunk_blob(&mut self, framing: ChunkFraming) -> Result<ScanState, ParseError> {
        match framing {
            ChunkFraming::Exact(size) => {
                self.read_exact_into_body(size)?;
                // CRLF closing the chunk data
                self.read_line_in_message()?;
            }
            ChunkFraming::Line => {
                let line = self.read_line_in_message()?;
                self.reserve_body(line.len())?;
                self.body.extend_from_slice(line.as_bytes());
                self.content_length += line.len();
            }
        }

        Ok(ScanState::ChunkLen)
    }

    fn scan_trailer(&mut self) -> Result<ScanState, ParseError> {
        let line = self.read_line_in_message()?;

        if line.is_empty() {
            Ok(ScanState::End)
        } else {
            Ok(ScanState::Trailer)
        }
    }

    /// Skips the rest of a rejected header block so the stream stays in
    /// sync, then reports the rejected line
    fn drain(&mut self, error: ParseError) -> Result<ScanState, ParseError> {
        loop {
            let line = match self.read_line() {
                Ok(Some(line)) => line,
                // Peer went away mid-block: the next read reports it
                Ok(None) | Err(ParseError::Io(_)) => return Err(error),
                Err(other) => return Err(other),
            };

            if line.is_empty() {
                return Err(error);
            }

            if let Some((name, value)) = line.split_once(':') {
                self.headers.insert_first(name, value);
            }
        }
    }

    fn finish(&mut self) -> Result<Request, ParseError> {
        let RequestLine {
            method,
            path,
            version,
        } = self
            .request_line
            .take()
            .ok_or_else(|| ParseError::InvalidRequestLine(String::new()))?;

        let mut headers = self.headers.clone();
        if self.content_length > 0 || headers.get(HeaderName::ContentLength).is_some() {
            headers.set(HeaderName::ContentLength, &self.content_length.to_string());
        }

        let body = std::mem::take(&mut self.body);

        Ok(Request::from_parts(method, path, version, headers, body))
    }

    // === Stream helpers ===

    /// Checks that `length` more body bytes stay within [`MAX_BODY_BYTES`]
    fn reserve_body(&self, length: usize) -> Result<(), ParseError> {
        match self.body.len().checked_add(length) {
            Some(total) if total <= MAX_BODY_BYTES => Ok(()),
            _ => Err(ParseError::BodyTooLarge),
        }
    }

    /// Appends exactly `length` bytes; the buffer grows with what arrives
    fn read_exact_into_body(&mut self, length: usize) -> Result<(), ParseError> {
        self.reserve_body(length)?;

        let read = (&mut self.reader)
            .take(length as u64)
            .read_to_end(&mut self.body)?;

        if read < length {
            return Err(ParseError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stream ended inside a request body",
            )));
        }

        self.content_length += length;
        Ok(())
    }

    /// Reads a line inside a message, where end of stream is an error
    fn read_line_in_message(&mut self) -> Result<String, ParseError> {
        self.read_line()?.ok_or_else(|| {
            ParseError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stream ended inside a request",
            ))
        })
    }

    /// Reads one line and strips surrounding whitespace (CRLF included)
    ///
    /// `Ok(None)` means end of stream.
    fn read_line(&mut self) -> Result<Option<String>, ParseError> {
        self.line.clear();

        let read = (&mut self.reader)
            .take(MAX_LINE_BYTES)
            .read_until(b'\n', &mut self.line)?;

        if read == 0 {
            return Ok(None);
        }

        if !self.line.ends_with(b"\n") && read as u64 == MAX_LINE_BYTES {
            return Err(ParseError::LineTooLong);
        }

        Ok(Some(String::from_utf8_lossy(&self.line).trim().to_string()))
    }
}
