use std::fmt;

/// Terminal classification of a request/response cycle.
///
/// Inspected through `HttpClient::error()` once the `Finished` event has
/// been observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The cycle completed without error.
    None,
    /// Generic transport failure: refused connection, name resolution,
    /// failed write.
    Network,
    /// The peer closed the connection while a response was in flight.
    RemoteHostClosed,
    /// The parser rejected the response byte stream.
    ResponseInvalid,
    /// The caller invoked `abort()`.
    Aborted,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            ErrorKind::None => "no error",
            ErrorKind::Network => "network error",
            ErrorKind::RemoteHostClosed => "remote host closed connection",
            ErrorKind::ResponseInvalid => "invalid response",
            ErrorKind::Aborted => "request aborted",
        };
        write!(f, "{}", s)
    }
}

/// Parse failures surfaced by `ResponseParser`.
///
/// Once set, the parser refuses further input until `clear()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Malformed status line or header section.
    InvalidHead,
    /// The header section holds more headers than we are willing to track.
    TooManyHeaders,
    /// The header section exceeds the maximum accepted size.
    HeadTooLarge,
    /// A `Content-Length` value that does not parse as a decimal number.
    InvalidContentLength,
    /// Bad character in a chunk size line.
    InvalidChunkSize,
    /// A chunk extension containing a stray newline.
    InvalidChunkExtension,
    /// Missing CRLF framing around chunk data or the final chunk.
    InvalidChunkFraming,
    /// Malformed trailer line after the last chunk.
    InvalidTrailer,
    /// The stream ended in the middle of a message.
    UnexpectedEof,
}

impl ParseError {
    /// Static description of the failure.
    pub fn description(self) -> &'static str {
        match self {
            ParseError::InvalidHead => "malformed status line or header",
            ParseError::TooManyHeaders => "too many headers",
            ParseError::HeadTooLarge => "response head exceeds maximum size",
            ParseError::InvalidContentLength => "invalid content-length value",
            ParseError::InvalidChunkSize => "invalid chunk size",
            ParseError::InvalidChunkExtension => "invalid chunk extension",
            ParseError::InvalidChunkFraming => "invalid chunk framing",
            ParseError::InvalidTrailer => "invalid trailer line",
            ParseError::UnexpectedEof => "unexpected end of stream",
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl std::error::Error for ParseError {}

impl From<httparse::Error> for ParseError {
    fn from(e: httparse::Error) -> Self {
        match e {
            httparse::Error::TooManyHeaders => ParseError::TooManyHeaders,
            _ => ParseError::InvalidHead,
        }
    }
}
