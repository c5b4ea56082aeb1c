//! HTTP/1.1 client engine.
//!
//! Three tightly coupled pieces and little else:
//!
//! - [`RequestWriter`] serializes a request into a framed byte stream
//!   with minimal allocation.
//! - [`ResponseParser`] consumes response bytes in arbitrary chunks and
//!   surfaces structure as events, pausing at each message boundary.
//! - [`HttpClient`] binds both to a socket-like [`Transport`]: it manages
//!   the connection lifecycle, keep-alive reuse per `(host, port)`,
//!   request-at-a-time ordering, `100 Continue` handling and error
//!   classification.
//!
//! URL parsing, TLS, cookies, redirects and per-authority pooling are out
//! of scope and belong to whatever sits on top. The engine is the piece
//! that owns buffering, the response state machine and connection reuse.
//!
//! Everything is single threaded and event driven. The engine never
//! blocks; work happens when a request is submitted and when the
//! transport driver reports `connected`, `readable` or an error. Upstream
//! progress is drained as [`Event`]s via [`HttpClient::poll_event`].

#[macro_use]
extern crate log;

mod buf;
mod chunked;
mod client;
mod error;
mod header;
mod parser;
mod transport;
mod writer;

pub use client::{ClientState, Event, HttpClient};
pub use error::{ErrorKind, ParseError};
pub use header::{Header, HeaderCollection};
pub use parser::{ParseEvent, ResponseParser};
pub use transport::{Transport, TransportError, TransportState};
pub use writer::RequestWriter;

pub use http::Uri;
