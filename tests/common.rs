#![allow(dead_code)]

use std::sync::Once;

use h1_client::{Event, HttpClient, Transport, TransportState};

/// In-memory transport for driving the engine in tests.
///
/// Inbound bytes are scripted with `feed`; outbound bytes are captured
/// per `write` call so tests can assert on write boundaries. Connects are
/// recorded and complete instantly; the test delivers the `connected`
/// notification by calling `HttpClient::connected`.
pub struct Pipe {
    state: TransportState,
    inbound: Vec<u8>,
    pub writes: Vec<Vec<u8>>,
    pub connects: Vec<(String, u16)>,
    pub disconnects: usize,
    pub closes: usize,
}

impl Pipe {
    pub fn new() -> Self {
        Pipe {
            state: TransportState::Unconnected,
            inbound: Vec::new(),
            writes: Vec::new(),
            connects: Vec::new(),
            disconnects: 0,
            closes: 0,
        }
    }

    /// Queue bytes for the next readable notification.
    pub fn feed(&mut self, data: &[u8]) {
        self.inbound.extend_from_slice(data);
    }

    /// All outbound bytes joined together.
    pub fn written(&self) -> Vec<u8> {
        self.writes.concat()
    }

    /// Simulate the peer dropping the connection. The test still has to
    /// deliver the matching `transport_error` notification.
    pub fn break_connection(&mut self) {
        self.state = TransportState::Unconnected;
    }
}

impl Transport for Pipe {
    fn connect(&mut self, host: &str, port: u16) {
        self.connects.push((host.to_owned(), port));
        self.state = TransportState::Connected;
    }

    fn disconnect(&mut self) {
        self.disconnects += 1;
        self.state = TransportState::Unconnected;
    }

    fn close(&mut self) {
        self.closes += 1;
        self.state = TransportState::Unconnected;
    }

    fn write(&mut self, data: &[u8]) {
        self.writes.push(data.to_vec());
    }

    fn read_into(&mut self, buf: &mut Vec<u8>) -> usize {
        let n = self.inbound.len();
        buf.extend_from_slice(&self.inbound);
        self.inbound.clear();
        n
    }

    fn bytes_available(&self) -> usize {
        self.inbound.len()
    }

    fn state(&self) -> TransportState {
        self.state
    }
}

/// Deliver `data` to the client as one readable notification.
pub fn deliver(client: &mut HttpClient<Pipe>, data: &[u8]) {
    client.transport_mut().feed(data);
    client.readable();
}

/// Drain all queued upstream events.
pub fn events(client: &mut HttpClient<Pipe>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Some(ev) = client.poll_event() {
        out.push(ev);
    }
    out
}

pub fn setup_logger() {
    static START: Once = Once::new();
    START.call_once(|| {
        let test_log = std::env::var("TEST_LOG")
            .map(|x| x != "0" && x.to_lowercase() != "false")
            .unwrap_or(false);
        let level = if test_log {
            log::LevelFilter::Trace
        } else {
            log::LevelFilter::Info
        };
        pretty_env_logger::formatted_builder()
            .filter_level(log::LevelFilter::Warn)
            .filter_module("h1_client", level)
            .target(env_logger::Target::Stdout)
            .init();
    });
}
