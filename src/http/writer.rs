//! # Response Writer
//! src/http/writer.rs
//!
//! Writes a reply piece by piece straight to the connection: status line,
//! header lines, then a body in one of three framings.
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
//!
//! Every call flushes before returning and reports success as a `bool`.
//! A `false` is how callers learn that the peer is gone.

use super::StatusCode;
use std::io::Write;

pub const HTTP_VERSION: &str = "HTTP/1.1";

/// MIME type sent with every [`BodyMode::Empty`] body
pub const MIME_ANY: &str = "*/*";

/// How [`ResponseWriter::write_body`] frames the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyMode {
    /// HEAD reply: headers describe the payload, no payload bytes follow
    HeadOnly,

    /// GET reply: headers and the payload
    WithBody,

    /// Error/fallback reply: `*/*`, zero length, regardless of the arguments
    Empty,
}

/// Writes one reply onto a borrowed stream
pub struct ResponseWriter<'a> {
    out: &'a mut dyn Write,
}

impl<'a> ResponseWriter<'a> {
    pub fn new(out: &'a mut dyn Write) -> Self {
        Self { out }
    }

    /// Writes `HTTP/1.1 <code> <reason>`; codes outside the table go out as 501
    ///
    /// # Example
    /// ```
    /// use tippy::http::ResponseWriter;
    ///
    /// let mut buffer = Vec::new();
    /// assert!(ResponseWriter::new(&mut buffer).write_status_line(999));
    /// assert_eq!(buffer, b"HTTP/1.1 501 Not Implemented\r\n");
    /// ```
    pub fn write_status_line(&mut self, code: u16) -> bool {
        let status = StatusCode::from_u16_or_default(code);
        let line = format!("{} {}\r\n", HTTP_VERSION, status);

        self.send(&[line.as_bytes()])
    }

    /// Writes `<name>: <value>`
    pub fn write_header(&mut self, name: &str, value: &str) -> bool {
        let line = format!("{}: {}\r\n", name, value);

        self.send(&[line.as_bytes()])
    }

    /// Writes `Content-Type`, `Content-Length`, the blank line and,
    /// for [`BodyMode::WithBody`], the payload
    pub fn write_body(&mut self, mode: BodyMode, mime: &str, bytes: &[u8]) -> bool {
        match mode {
            BodyMode::HeadOnly => {
                let head = Self::entity_head(mime, bytes.len());
                self.send(&[head.as_bytes()])
            }
            BodyMode::WithBody => {
                let head = Self::entity_head(mime, bytes.len());
                self.send(&[head.as_bytes(), bytes])
            }
            BodyMode::Empty => {
                let head = Self::entity_head(MIME_ANY, 0);
                self.send(&[head.as_bytes()])
            }
        }
    }

    fn entity_head(mime: &str, length: usize) -> String {
        format!("Content-Type: {}\r\nContent-Length: {}\r\n\r\n", mime, length)
    }

    fn send(&mut self, parts: &[&[u8]]) -> bool {
        let result = parts
            .iter()
            .try_for_each(|part| self.out.write_all(part))
            .and_then(|()| self.out.flush());

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::trace!(error = %e, "response write failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    /// Stream whose peer has gone away
    struct DeadPeer;

    impl Write for DeadPeer {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer gone"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn text(buffer: &[u8]) -> String {
        String::from_utf8(buffer.to_vec()).unwrap()
    }

    #[test]
    fn test_status_line_known_codes() {
        let mut buffer = Vec::new();
        let mut writer = ResponseWriter::new(&mut buffer);

        assert!(writer.write_status_line(200));
        assert!(writer.write_status_line(304));
        assert!(writer.write_status_line(404));

        assert_eq!(
            text(&buffer),
            "HTTP/1.1 200 OK\r\nHTTP/1.1 304 Not Modified\r\nHTTP/1.1 404 Not Found\r\n"
        );
    }

    #[test]
    fn test_status_line_unknown_code_becomes_501() {
        let mut buffer = Vec::new();
        ResponseWriter::new(&mut buffer).write_status_line(999);

        assert_eq!(text(&buffer), "HTTP/1.1 501 Not Implemented\r\n");
    }

    #[test]
    fn test_header_line() {
        let mut buffer = Vec::new();
        ResponseWriter::new(&mut buffer).write_header("Server", "Tippy/v0.5");

        assert_eq!(text(&buffer), "Server: Tippy/v0.5\r\n");
    }

    #[test]
    fn test_head_only_body() {
        let mut buffer = Vec::new();
        let ok = ResponseWriter::new(&mut buffer).write_body(BodyMode::HeadOnly, "text/html", b"<p>hi</p>");

        assert!(ok);
        assert_eq!(
            text(&buffer),
            "Content-Type: text/html\r\nContent-Length: 9\r\n\r\n"
        );
    }

    #[test]
    fn test_with_body() {
        let mut buffer = Vec::new();
        let ok = ResponseWriter::new(&mut buffer).write_body(BodyMode::WithBody, "text/css", b"p{}");

        assert!(ok);
        assert_eq!(
            text(&buffer),
            "Content-Type: text/css\r\nContent-Length: 3\r\n\r\np{}"
        );
    }

    #[test]
    fn test_empty_body_ignores_arguments() {
        let mut buffer = Vec::new();
        let ok = ResponseWriter::new(&mut buffer).write_body(BodyMode::Empty, "text/html", b"ignored");

        assert!(ok);
        assert_eq!(text(&buffer), "Content-Type: */*\r\nContent-Length: 0\r\n\r\n");
    }

    #[test]
    fn test_with_body_zero_length_still_succeeds() {
        let mut buffer = Vec::new();
        assert!(ResponseWriter::new(&mut buffer).write_body(BodyMode::WithBody, "text/plain", b""));
    }

    #[test]
    fn test_dead_peer_reports_false() {
        let mut peer = DeadPeer;
        let mut writer = ResponseWriter::new(&mut peer);

        assert!(!writer.write_status_line(200));
        assert!(!writer.write_header("Date", "now"));
        assert!(!writer.write_body(BodyMode::WithBody, "text/plain", b"x"));
    }
}
