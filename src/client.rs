use std::collections::VecDeque;

use http::Uri;

use crate::buf::ScratchBuf;
use crate::error::ErrorKind;
use crate::header::{Header, HeaderCollection};
use crate::parser::{ParseEvent, ResponseParser};
use crate::transport::{Transport, TransportError, TransportState};
use crate::writer::RequestWriter;

/// Read buffer capacity above this is released after a readable event
/// instead of being kept for reuse.
const READ_BUF_MAX_REUSE: usize = 128 * 1024;

/// Upstream progress of the current request, drained with
/// [`HttpClient::poll_event`].
///
/// Per accepted submit the order is: zero or one `HeadersReady`, zero or
/// more `ContentReady`, exactly one `Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Status code and headers are available.
    HeadersReady,
    /// Body bytes arrived; `consume_content` drains them.
    ContentReady,
    /// The request/response cycle ended; inspect `error()`.
    Finished,
}

/// Lifecycle state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// No request in flight. The connection may still be open for reuse.
    Idle,
    /// Waiting for the transport to finish connecting.
    Connecting,
    /// Writing the request.
    Sending,
    /// Request written; no response bytes seen yet.
    AwaitingResponse,
    /// Response bytes are being parsed.
    Receiving,
    /// The last cycle ended in an error or abort.
    Finished,
}

/// The request currently (or last) in flight.
#[derive(Debug)]
struct PendingRequest {
    method: Vec<u8>,
    url: Uri,
    headers: HeaderCollection,
    body: Vec<u8>,
}

/// HTTP/1.1 client engine.
///
/// Owns a transport, a request writer and a response parser, and drives
/// connect → write → read → parse → finish for one request at a time.
/// Connections are kept open after a clean response and reused when the
/// next request targets the same host and port.
///
/// The engine is event driven and never blocks. It makes progress when
/// the caller submits or aborts a request and when the transport driver
/// invokes [`connected`], [`readable`] or [`transport_error`]. Upstream
/// progress is queued as [`Event`]s.
///
/// [`connected`]: HttpClient::connected
/// [`readable`]: HttpClient::readable
/// [`transport_error`]: HttpClient::transport_error
pub struct HttpClient<T: Transport> {
    transport: T,
    writer: RequestWriter,
    parser: ResponseParser,
    request: Option<PendingRequest>,
    base_headers: HeaderCollection,
    buffer: ScratchBuf,
    events: VecDeque<Event>,
    state: ClientState,
    error: ErrorKind,
    response_pending: bool,
}

impl<T: Transport> HttpClient<T> {
    pub fn new(transport: T) -> Self {
        let mut base_headers = HeaderCollection::new();
        base_headers.push(Header::new("Accept", "*"));

        HttpClient {
            transport,
            writer: RequestWriter::new(),
            parser: ResponseParser::new(),
            request: None,
            base_headers,
            buffer: ScratchBuf::new(),
            events: VecDeque::new(),
            state: ClientState::Idle,
            error: ErrorKind::None,
            response_pending: false,
        }
    }

    pub fn get(&mut self, url: Uri, headers: HeaderCollection) {
        self.submit("GET", url, headers, Vec::new());
    }

    pub fn head(&mut self, url: Uri, headers: HeaderCollection) {
        self.submit("HEAD", url, headers, Vec::new());
    }

    pub fn post(&mut self, url: Uri, headers: HeaderCollection, body: impl Into<Vec<u8>>) {
        self.submit("POST", url, headers, body);
    }

    pub fn put(&mut self, url: Uri, headers: HeaderCollection, body: impl Into<Vec<u8>>) {
        self.submit("PUT", url, headers, body);
    }

    pub fn delete(&mut self, url: Uri, headers: HeaderCollection) {
        self.submit("DELETE", url, headers, Vec::new());
    }

    /// Submit a request.
    ///
    /// Refused with a warning while a response is pending; HTTP/1.1
    /// pipelining is not supported. An open connection to the same host
    /// and port is reused, otherwise the transport reconnects.
    pub fn submit(
        &mut self,
        method: impl Into<Vec<u8>>,
        url: Uri,
        headers: HeaderCollection,
        body: impl Into<Vec<u8>>,
    ) {
        if self.response_pending {
            warn!("submit: a request is already in flight, pipelining is not supported");
            return;
        }

        let host = url.host().unwrap_or("").to_owned();
        let port = url.port_u16().unwrap_or(80);

        let previous = self
            .request
            .as_ref()
            .and_then(|r| authority(&r.url))
            .map(|(h, p)| (h.to_owned(), p));

        self.request = Some(PendingRequest {
            method: method.into(),
            url,
            headers,
            body: body.into(),
        });
        self.response_pending = true;
        self.error = ErrorKind::None;
        self.parser.clear();

        let same_authority = previous
            .map(|(h, p)| h == host && p == port)
            .unwrap_or(false);

        if self.transport.state() == TransportState::Connected && same_authority {
            self.send_request();
        } else {
            if self.transport.state() != TransportState::Unconnected {
                self.transport.disconnect();
            }
            self.state = ClientState::Connecting;
            self.transport.connect(&host, port);
        }
    }

    /// Abort the in-flight request.
    ///
    /// Closes the transport and emits `Finished` with `Aborted` before
    /// returning. Content already consumed stays with the caller; the
    /// rest is discarded.
    pub fn abort(&mut self) {
        if !self.response_pending {
            warn!("abort: no request in flight");
            return;
        }

        self.transport.close();
        self.error = ErrorKind::Aborted;
        self.finish();
    }

    /// Whether an accepted submit has not yet emitted `Finished`.
    pub fn response_pending(&self) -> bool {
        self.response_pending
    }

    pub fn error(&self) -> ErrorKind {
        self.error
    }

    pub fn has_error(&self) -> bool {
        self.error != ErrorKind::None
    }

    /// Status code of the current response; valid after `HeadersReady`.
    pub fn status_code(&self) -> u16 {
        self.parser.status_code()
    }

    /// Headers of the current response; valid after `HeadersReady`.
    pub fn headers(&self) -> &HeaderCollection {
        self.parser.headers()
    }

    /// Move out the body bytes accumulated so far.
    pub fn consume_content(&mut self) -> Vec<u8> {
        self.parser.consume_content()
    }

    /// Next queued upstream event, if any.
    pub fn poll_event(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Transport notification: the connection attempt succeeded.
    pub fn connected(&mut self) {
        self.send_request();
    }

    /// Transport notification: bytes are available for reading.
    pub fn readable(&mut self) {
        if !self.response_pending {
            // Not supposed to be receiving anything right now. Drop the
            // data and the connection with it.
            debug!("readable with no response pending, closing");
            self.transport.close();
            return;
        }

        if self.transport.bytes_available() == 0 {
            return;
        }

        self.state = ClientState::Receiving;
        self.transport.read_into(&mut self.buffer);

        let mut consumed = self.parser.inject(&self.buffer);
        self.drain_parser_events();

        if !self.parser.has_error() && consumed < self.buffer.len() && self.response_pending {
            // The parser paused on a completed interim response and the
            // real one follows in the same read.
            consumed += self.parser.inject(&self.buffer[consumed..]);
            self.drain_parser_events();
        }

        if consumed < self.buffer.len() && !self.parser.has_error() {
            debug!(
                "readable: {} trailing bytes not consumed",
                self.buffer.len() - consumed
            );
        }

        self.buffer.reset(READ_BUF_MAX_REUSE);

        if self.parser.has_error() {
            debug!("finishing with parse error: {}", self.parser.error_description());
            self.error = ErrorKind::ResponseInvalid;
            self.transport.close();
            self.finish();
        }
    }

    /// Transport notification: the connection failed or broke.
    ///
    /// Errors between requests are absorbed; the next submit reconnects.
    pub fn transport_error(&mut self, kind: TransportError) {
        if !self.response_pending {
            return;
        }

        if kind == TransportError::RemoteHostClosed {
            // A close can legitimately end a response whose length is
            // delimited by the connection.
            self.parser.inject_eof();
            self.drain_parser_events();
            if !self.response_pending {
                self.transport.close();
                return;
            }
        }

        self.error = match kind {
            TransportError::RemoteHostClosed => ErrorKind::RemoteHostClosed,
            _ => ErrorKind::Network,
        };
        self.transport.close();
        self.finish();
    }

    /// Serialize and send the pending request over the connected
    /// transport.
    fn send_request(&mut self) {
        if !self.response_pending {
            return;
        }
        let req = match &self.request {
            Some(r) => r,
            None => return,
        };

        // Request target: percent-encoded path plus optional query.
        let mut target = req.url.path().as_bytes().to_vec();
        if let Some(q) = req.url.query() {
            target.push(b'?');
            target.extend_from_slice(q.as_bytes());
        }

        let mut headers = self.base_headers.clone();
        headers.extend(req.headers.iter().cloned());

        self.state = ClientState::Sending;
        self.writer
            .write(&mut self.transport, &req.method, &target, &headers, &req.body);
        self.state = ClientState::AwaitingResponse;
    }

    fn drain_parser_events(&mut self) {
        while let Some(ev) = self.parser.next_event() {
            match ev {
                ParseEvent::MessageBegin => {}
                ParseEvent::HeadersComplete => {
                    // Interim responses stay internal.
                    if !is_interim(self.parser.status_code()) {
                        self.events.push_back(Event::HeadersReady);
                    }
                }
                ParseEvent::Content => {
                    self.events.push_back(Event::ContentReady);
                }
                ParseEvent::MessageComplete => {
                    let status = self.parser.status_code();
                    if is_interim(status) {
                        // Keep waiting for the final response on the same
                        // connection.
                        debug!("swallowing interim {} response", status);
                        self.state = ClientState::AwaitingResponse;
                    } else {
                        self.response_pending = false;
                        self.state = ClientState::Idle;
                        self.events.push_back(Event::Finished);
                    }
                }
            }
        }
    }

    /// Terminal transition for error and abort paths.
    fn finish(&mut self) {
        self.response_pending = false;
        self.state = ClientState::Finished;
        self.events.push_back(Event::Finished);
    }
}

fn authority(url: &Uri) -> Option<(&str, u16)> {
    url.host().map(|h| (h, url.port_u16().unwrap_or(80)))
}

fn is_interim(status: u16) -> bool {
    status / 100 == 1
}
