use crate::buf::{append_decimal, ScratchBuf};
use crate::header::HeaderCollection;
use crate::transport::Transport;

/// Minimum capacity of the serialization buffer.
const BUILDER_INIT_SIZE: usize = 8 * 1024;

/// Bodies below this are appended to the head buffer so the request goes
/// out as a single write. Larger bodies are written as-is in a second
/// write to skip the copy.
const INLINE_BODY_MAX: usize = 4096;

/// Builder capacity above this is released after a request instead of
/// being kept for reuse.
const BUILDER_MAX_REUSE: usize = 16 * 1024;

/// Serializes HTTP/1.1 requests and hands the bytes to a transport.
///
/// The request line, headers and trailing CRLF are built in an internal
/// scratch buffer that is recycled across requests. `Content-Length` is
/// emitted automatically when, and only when, the body is non-empty.
#[derive(Debug, Default)]
pub struct RequestWriter {
    builder: ScratchBuf,
}

impl RequestWriter {
    pub fn new() -> Self {
        RequestWriter {
            builder: ScratchBuf::new(),
        }
    }

    pub fn get<T: Transport>(
        &mut self,
        transport: &mut T,
        target: &[u8],
        headers: &HeaderCollection,
    ) {
        self.write(transport, b"GET", target, headers, &[]);
    }

    pub fn head<T: Transport>(
        &mut self,
        transport: &mut T,
        target: &[u8],
        headers: &HeaderCollection,
    ) {
        self.write(transport, b"HEAD", target, headers, &[]);
    }

    pub fn post<T: Transport>(
        &mut self,
        transport: &mut T,
        target: &[u8],
        headers: &HeaderCollection,
        body: &[u8],
    ) {
        self.write(transport, b"POST", target, headers, body);
    }

    pub fn put<T: Transport>(
        &mut self,
        transport: &mut T,
        target: &[u8],
        headers: &HeaderCollection,
        body: &[u8],
    ) {
        self.write(transport, b"PUT", target, headers, body);
    }

    pub fn delete<T: Transport>(
        &mut self,
        transport: &mut T,
        target: &[u8],
        headers: &HeaderCollection,
    ) {
        self.write(transport, b"DELETE", target, headers, &[]);
    }

    /// Serialize one request and send it over `transport`.
    ///
    /// Issues one transport write for empty and small bodies, two for
    /// bodies of 4 KiB or more (head first, then the body verbatim).
    pub fn write<T: Transport>(
        &mut self,
        transport: &mut T,
        method: &[u8],
        target: &[u8],
        headers: &HeaderCollection,
        body: &[u8],
    ) {
        self.builder.reserve_at_least(BUILDER_INIT_SIZE);

        self.builder.extend_from_slice(method);
        self.builder.push(b' ');
        self.builder.extend_from_slice(target);
        self.builder.extend_from_slice(b" HTTP/1.1\r\n");

        for h in headers.iter() {
            self.builder.extend_from_slice(&h.name);
            self.builder.extend_from_slice(b": ");
            self.builder.extend_from_slice(&h.value);
            self.builder.extend_from_slice(b"\r\n");
        }

        if !body.is_empty() {
            self.builder.extend_from_slice(b"Content-Length: ");
            append_decimal(&mut self.builder, body.len() as u64);
            self.builder.extend_from_slice(b"\r\n");
        }

        self.builder.extend_from_slice(b"\r\n");

        trace!(
            "write head: {:?}",
            String::from_utf8_lossy(&self.builder)
        );

        if body.is_empty() {
            transport.write(&self.builder);
        } else if body.len() < INLINE_BODY_MAX {
            self.builder.extend_from_slice(body);
            transport.write(&self.builder);
        } else {
            transport.write(&self.builder);
            transport.write(body);
        }

        self.builder.reset(BUILDER_MAX_REUSE);
    }
}
