/// Connection state of a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Unconnected,
    Connecting,
    Connected,
}

/// Failure kinds a transport reports through the `transport_error`
/// notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    ConnectionRefused,
    HostNotFound,
    RemoteHostClosed,
    TimedOut,
    Other,
}

/// Byte-stream the client engine drives.
///
/// Anything that behaves like a socket works: TCP, a TLS wrapper or an
/// in-memory pipe. The engine only ever calls these methods from the task
/// it runs on; none of them may block.
///
/// Notifications flow the other way. Whoever owns the event loop invokes
/// [`HttpClient::connected`], [`HttpClient::readable`] and
/// [`HttpClient::transport_error`] when the underlying stream reports the
/// corresponding condition.
///
/// [`HttpClient::connected`]: crate::HttpClient::connected
/// [`HttpClient::readable`]: crate::HttpClient::readable
/// [`HttpClient::transport_error`]: crate::HttpClient::transport_error
pub trait Transport {
    /// Begin connecting to `host:port`. Completion is reported through the
    /// `connected` notification.
    fn connect(&mut self, host: &str, port: u16);

    /// Gracefully tear down the connection.
    fn disconnect(&mut self);

    /// Drop the connection immediately.
    fn close(&mut self);

    /// Queue `data` for sending.
    fn write(&mut self, data: &[u8]);

    /// Append available bytes to `buf`, returning how many were appended.
    fn read_into(&mut self, buf: &mut Vec<u8>) -> usize;

    /// Bytes ready to be taken by `read_into`.
    fn bytes_available(&self) -> usize;

    fn state(&self) -> TransportState;
}
