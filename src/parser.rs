use std::collections::VecDeque;
use std::mem;

use crate::chunked::ChunkedDecoder;
use crate::error::ParseError;
use crate::header::{Header, HeaderCollection};

/// Maximum accepted size of a response head (status line plus headers).
const MAX_HEAD_SIZE: usize = 80 * 1024;

/// Number of header slots handed to httparse.
const MAX_HEADERS: usize = 128;

const END_OF_HEAD: &[u8] = b"\r\n\r\n";

/// Parse progress, drained with [`ResponseParser::next_event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseEvent {
    /// A new response started; headers and content were reset.
    MessageBegin,
    /// The header section is fully parsed; status code and headers are
    /// readable.
    HeadersComplete,
    /// Body bytes were appended to the content buffer.
    Content,
    /// The response is complete. The parser is paused.
    MessageComplete,
}

/// Incremental HTTP/1.1 response parser.
///
/// Bytes are fed with [`inject`] in whatever chunks the transport
/// delivers. Parsed structure accumulates on the parser itself (status
/// code, headers, content) and progress is reported as [`ParseEvent`]s.
///
/// After each complete message the parser pauses and refuses further
/// input, so a read that contains the tail of one response and the start
/// of the next is not over-consumed; the next [`inject`] resumes
/// transparently. The return value of `inject` tells the caller where the
/// current message ended.
///
/// [`inject`]: ResponseParser::inject
pub struct ResponseParser {
    state: State,
    /// Head bytes accumulated until the terminating CRLFCRLF.
    head: Vec<u8>,
    /// Progress matching the head terminator across inject calls.
    head_match: usize,
    headers: HeaderCollection,
    content: Vec<u8>,
    status_code: u16,
    field: Vec<u8>,
    value: Vec<u8>,
    last_was_value: bool,
    error: Option<ParseError>,
    events: VecDeque<ParseEvent>,
}

enum State {
    /// Between messages, or accumulating the head of the current one.
    Head,
    /// Reading body bytes.
    Body(BodyReader),
    /// Completed a message; refusing input until the next inject.
    Paused,
    /// A parse error occurred; refusing input until `clear()`.
    Failed,
}

/// Body delimitation decided from status code and headers.
///
/// 1. `Transfer-Encoding` other than `identity` means chunked, regardless
///    of other headers.
/// 2. `Content-Length: n` means exactly `n` bytes.
/// 3. Otherwise the body runs until the connection closes.
enum BodyReader {
    Chunked(ChunkedDecoder),
    ContentLength { limit: u64, total: u64 },
    ReadToEnd,
}

impl ResponseParser {
    pub fn new() -> Self {
        ResponseParser {
            state: State::Head,
            head: Vec::new(),
            head_match: 0,
            headers: HeaderCollection::new(),
            content: Vec::new(),
            status_code: 0,
            field: Vec::new(),
            value: Vec::new(),
            last_was_value: false,
            error: None,
            events: VecDeque::new(),
        }
    }

    /// Feed bytes into the parser.
    ///
    /// Returns how many bytes were consumed. A count short of
    /// `data.len()` means the current message completed (the parser is
    /// now paused) or a parse error was hit; the caller decides what to
    /// do with the remainder.
    pub fn inject(&mut self, data: &[u8]) -> usize {
        if matches!(self.state, State::Paused) {
            // Unpause for the next message.
            self.state = State::Head;
        }

        let mut consumed = 0;

        while consumed < data.len() {
            if matches!(self.state, State::Paused | State::Failed) {
                break;
            }

            let step = if matches!(self.state, State::Head) {
                self.consume_head(&data[consumed..])
            } else {
                self.consume_body(&data[consumed..])
            };

            match step {
                Ok(n) => consumed += n,
                Err((n, e)) => {
                    consumed += n;
                    self.fail(e);
                }
            }
        }

        consumed
    }

    /// Signal end of stream.
    ///
    /// Completes a body whose length is delimited by connection close.
    /// Ending the stream inside a head or a length-delimited body is an
    /// error.
    pub fn inject_eof(&mut self) {
        match self.state {
            State::Body(BodyReader::ReadToEnd) => self.complete_message(),
            State::Head if self.head.is_empty() => {}
            State::Paused | State::Failed => {}
            _ => self.fail(ParseError::UnexpectedEof),
        }
    }

    /// Re-initialize for a fresh response, dropping headers, content and
    /// any error.
    pub fn clear(&mut self) {
        self.state = State::Head;
        self.head.clear();
        self.head_match = 0;
        self.headers.clear();
        self.content.clear();
        self.status_code = 0;
        self.field.clear();
        self.value.clear();
        self.last_was_value = false;
        self.error = None;
        self.events.clear();
    }

    /// Next parse event, if any.
    pub fn next_event(&mut self) -> Option<ParseEvent> {
        self.events.pop_front()
    }

    /// Status code of the current message; readable after
    /// `HeadersComplete`.
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn headers(&self) -> &HeaderCollection {
        &self.headers
    }

    /// Move out the accumulated body bytes.
    ///
    /// Leaves the content buffer empty; the parser keeps appending
    /// subsequent body chunks to it.
    pub fn consume_content(&mut self) -> Vec<u8> {
        mem::take(&mut self.content)
    }

    pub fn error(&self) -> Option<ParseError> {
        self.error
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Human-readable description of the current error.
    pub fn error_description(&self) -> &'static str {
        match self.error {
            Some(e) => e.description(),
            None => "no error",
        }
    }

    /// Whether the parser is paused after a completed message.
    pub fn is_paused(&self) -> bool {
        matches!(self.state, State::Paused)
    }

    /// Accumulate head bytes until the CRLFCRLF terminator, then parse the
    /// complete head.
    fn consume_head(&mut self, input: &[u8]) -> Result<usize, (usize, ParseError)> {
        if self.head.is_empty() {
            self.on_message_begin();
        }

        let mut at = 0;

        while at < input.len() {
            let b = input[at];
            at += 1;
            self.head.push(b);

            if b == END_OF_HEAD[self.head_match] {
                self.head_match += 1;
                if self.head_match == END_OF_HEAD.len() {
                    return match self.parse_head() {
                        Ok(()) => Ok(at),
                        Err(e) => Err((at, e)),
                    };
                }
            } else if self.head_match > 0 {
                // Restart the match, letting a CR begin a new candidate.
                self.head_match = if b == b'\r' { 1 } else { 0 };
            }

            if self.head.len() > MAX_HEAD_SIZE {
                return Err((at, ParseError::HeadTooLarge));
            }
        }

        Ok(at)
    }

    /// Parse a complete head with httparse and replay it through the
    /// header hooks.
    fn parse_head(&mut self) -> Result<(), ParseError> {
        // The hooks below need `&mut self`, so the head buffer moves out
        // of the struct for the duration. On error it stays taken; fail()
        // latches the parser until clear() resets everything anyway.
        let head = mem::take(&mut self.head);
        self.head_match = 0;

        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut res = httparse::Response::new(&mut headers);

        let status = res.parse(&head)?;
        if status.is_partial() {
            // A terminated head that still parses as partial is no
            // response at all.
            return Err(ParseError::InvalidHead);
        }

        let code = res.code.unwrap_or(0);

        for h in res.headers.iter() {
            self.on_header_field(h.name.as_bytes());
            self.on_header_value(h.value);
        }

        self.on_headers_complete(code)?;

        // Keep the allocation for the next head.
        let mut head = head;
        head.clear();
        self.head = head;

        Ok(())
    }

    fn consume_body(&mut self, input: &[u8]) -> Result<usize, (usize, ParseError)> {
        let len_before = self.content.len();

        let (consumed, done, failure) = match &mut self.state {
            State::Body(BodyReader::Chunked(dec)) => match dec.decode(input, &mut self.content) {
                Ok(n) => (n, dec.is_end(), None),
                Err((n, e)) => (n, false, Some(e)),
            },
            State::Body(BodyReader::ContentLength { limit, total }) => {
                let take = (*limit - *total).min(input.len() as u64) as usize;
                self.content.extend_from_slice(&input[..take]);
                *total += take as u64;
                (take, *total == *limit, None)
            }
            State::Body(BodyReader::ReadToEnd) => {
                self.content.extend_from_slice(input);
                (input.len(), false, None)
            }
            _ => panic!("consume_body outside body state"),
        };

        if self.content.len() > len_before {
            self.on_body();
        }

        if let Some(e) = failure {
            return Err((consumed, e));
        }

        if done {
            self.complete_message();
        }

        Ok(consumed)
    }

    fn on_message_begin(&mut self) {
        self.headers.clear();
        self.content.clear();
        self.status_code = 0;
        self.field.clear();
        self.value.clear();
        self.last_was_value = false;
        self.events.push_back(ParseEvent::MessageBegin);
    }

    /// Header fragments arrive as field and value pieces. A field piece
    /// following a value piece means the previous pair is done and gets
    /// committed; `headers_complete` commits the final pair.
    fn on_header_field(&mut self, data: &[u8]) {
        self.push_pending_header();
        self.field.extend_from_slice(data);
    }

    fn on_header_value(&mut self, data: &[u8]) {
        self.value.extend_from_slice(data);
        self.last_was_value = true;
    }

    fn push_pending_header(&mut self) {
        if self.last_was_value {
            let name = mem::take(&mut self.field);
            let value = mem::take(&mut self.value);
            self.headers.push(Header::new(name, value));
            self.last_was_value = false;
        }
    }

    fn on_headers_complete(&mut self, code: u16) -> Result<(), ParseError> {
        self.push_pending_header();
        self.status_code = code;
        self.events.push_back(ParseEvent::HeadersComplete);

        match self.body_reader(code)? {
            Some(reader) => self.state = State::Body(reader),
            None => self.complete_message(),
        }

        Ok(())
    }

    fn body_reader(&self, code: u16) -> Result<Option<BodyReader>, ParseError> {
        // Interim responses, 204 and 304 end at the header section no
        // matter what the headers claim.
        if code / 100 == 1 || code == 204 || code == 304 {
            return Ok(None);
        }

        if self.is_chunked() {
            return Ok(Some(BodyReader::Chunked(ChunkedDecoder::new())));
        }

        if let Some(v) = self.headers.get_str(b"content-length") {
            let limit = v
                .trim()
                .parse::<u64>()
                .map_err(|_| ParseError::InvalidContentLength)?;
            if limit == 0 {
                return Ok(None);
            }
            return Ok(Some(BodyReader::ContentLength { limit, total: 0 }));
        }

        Ok(Some(BodyReader::ReadToEnd))
    }

    fn is_chunked(&self) -> bool {
        // A transfer-encoding other than "identity" means the length is
        // defined by chunked framing.
        self.headers
            .get_str(b"transfer-encoding")
            .map(|v| !v.contains("identity"))
            .unwrap_or(false)
    }

    fn on_body(&mut self) {
        self.events.push_back(ParseEvent::Content);
    }

    fn complete_message(&mut self) {
        self.events.push_back(ParseEvent::MessageComplete);
        // Pause so a second message in the same buffer is not consumed.
        self.state = State::Paused;
    }

    fn fail(&mut self, e: ParseError) {
        debug!("response parse error: {}", e);
        self.error = Some(e);
        self.state = State::Failed;
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        ResponseParser::new()
    }
}
