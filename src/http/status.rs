//! # HTTP Status Codes
//! src/http/status.rs
//!
//! The fixed status-code → reason-phrase table used by the response writer.
//! Codes that are not in the table are downgraded to `501 Not Implemented`
//! at send time (see [`StatusCode::from_u16_or_default`]).
//!
//! - **2xx**: success (200)
//! - **3xx**: cache revalidation (304)
//! - **4xx**: client errors (400, 404)
//! - **5xx**: server errors (500, 501)

/// Status codes the server knows how to send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK - the resource follows
    Ok = 200,

    /// 304 Not Modified - the client's cached copy is current
    NotModified = 304,

    /// 400 Bad Request - malformed request line/headers or missing `Host`
    BadRequest = 400,

    /// 404 Not Found - no route and no resource for the path
    NotFound = 404,

    /// 500 Internal Server Error
    InternalServerError = 500,

    /// 501 Not Implemented - unsupported method, and the fallback for unknown codes
    NotImplemented = 501,
}

impl StatusCode {
    const TABLE: [StatusCode; 6] = [
        StatusCode::Ok,
        StatusCode::NotModified,
        StatusCode::BadRequest,
        StatusCode::NotFound,
        StatusCode::InternalServerError,
        StatusCode::NotImplemented,
    ];

    /// Looks up a numeric code in the reason table
    ///
    /// # Example
    /// ```
    /// use tippy::http::StatusCode;
    /// assert_eq!(StatusCode::from_u16(304), Some(StatusCode::NotModified));
    /// assert_eq!(StatusCode::from_u16(999), None);
    /// ```
    pub fn from_u16(code: u16) -> Option<Self> {
        Self::TABLE.iter().copied().find(|status| status.as_u16() == code)
    }

    /// Like [`StatusCode::from_u16`], but unknown codes become `501`
    pub fn from_u16_or_default(code: u16) -> Self {
        Self::from_u16(code).unwrap_or(StatusCode::NotImplemented)
    }

    /// Numeric value of the code
    ///
    /// # Example
    /// ```
    /// use tippy::http::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Reason phrase sent after the code on the status line
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::NotModified => "Not Modified",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
        }
    }

    /// Checks for a 4xx code
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.as_u16())
    }

    /// Checks for a 5xx code
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.as_u16())
    }
}

impl std::fmt::Display for StatusCode {
    /// Formats as `"200 OK"`
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_values() {
        assert_eq!(StatusCode::Ok.as_u16(), 200);
        assert_eq!(StatusCode::NotModified.as_u16(), 304);
        assert_eq!(StatusCode::BadRequest.as_u16(), 400);
        assert_eq!(StatusCode::NotFound.as_u16(), 404);
        assert_eq!(StatusCode::NotImplemented.as_u16(), 501);
    }

    #[test]
    fn test_lookup_known_codes() {
        for code in [200, 304, 400, 404, 500, 501] {
            let status = StatusCode::from_u16(code).unwrap();
            assert_eq!(status.as_u16(), code);
        }
    }

    #[test]
    fn test_unknown_code_falls_back_to_501() {
        assert_eq!(StatusCode::from_u16(999), None);
        assert_eq!(StatusCode::from_u16_or_default(999), StatusCode::NotImplemented);
        assert_eq!(StatusCode::from_u16_or_default(418), StatusCode::NotImplemented);
        assert_eq!(StatusCode::from_u16_or_default(204), StatusCode::NotImplemented);
        assert_eq!(StatusCode::from_u16_or_default(503), StatusCode::NotImplemented);
        assert_eq!(StatusCode::from_u16_or_default(200), StatusCode::Ok);
    }

    #[test]
    fn test_error_classes() {
        assert!(StatusCode::BadRequest.is_client_error());
        assert!(!StatusCode::NotModified.is_client_error());
        assert!(StatusCode::NotImplemented.is_server_error());
        assert!(!StatusCode::NotFound.is_server_error());
    }

    #[test]
    fn test_display() {
        assert_eq!(StatusCode::Ok.to_string(), "200 OK");
        assert_eq!(StatusCode::NotModified.to_string(), "304 Not Modified");
        assert_eq!(StatusCode::NotImplemented.to_string(), "501 Not Implemented");
    }
}
