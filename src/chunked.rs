use crate::error::ParseError;

/// Incremental decoder for `Transfer-Encoding: chunked` bodies.
///
/// Consumes input in whatever slices the transport delivers and appends
/// decoded chunk data to a caller-provided buffer. Chunk extensions are
/// skipped; trailers after the last chunk are consumed and discarded.
#[derive(Debug)]
pub(crate) struct ChunkedDecoder {
    state: State,
    remaining: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Hex digits of the chunk size line.
    Size,
    /// Whitespace after the size; no more digits may follow.
    SizeLws,
    /// Chunk extension, ignored up to CR.
    Extension,
    /// LF closing the size line.
    SizeLf,
    /// Chunk data.
    Data,
    /// CR after chunk data.
    DataCr,
    /// LF after chunk data.
    DataLf,
    /// A trailer line, ignored up to CR.
    Trailer,
    /// LF closing a trailer line.
    TrailerLf,
    /// CR of the final empty line.
    EndCr,
    /// LF of the final empty line.
    EndLf,
    /// Message fully decoded.
    End,
}

impl ChunkedDecoder {
    pub fn new() -> Self {
        ChunkedDecoder {
            state: State::Size,
            remaining: 0,
        }
    }

    pub fn is_end(&self) -> bool {
        self.state == State::End
    }

    /// Decode as much of `input` as possible, appending chunk data to
    /// `out`.
    ///
    /// Returns the number of input bytes consumed; decoding stops at the
    /// end of the message. On error the count covers the bytes consumed
    /// before the offending one.
    pub fn decode(
        &mut self,
        input: &[u8],
        out: &mut Vec<u8>,
    ) -> Result<usize, (usize, ParseError)> {
        let mut at = 0;

        while at < input.len() && self.state != State::End {
            if self.state == State::Data {
                let take = self.remaining.min((input.len() - at) as u64) as usize;
                out.extend_from_slice(&input[at..at + take]);
                self.remaining -= take as u64;
                at += take;
                if self.remaining == 0 {
                    self.state = State::DataCr;
                }
            } else {
                let b = input[at];
                self.step(b).map_err(|e| (at, e))?;
                at += 1;
            }
        }

        Ok(at)
    }

    fn step(&mut self, b: u8) -> Result<(), ParseError> {
        self.state = match self.state {
            State::Size => match b {
                b'0'..=b'9' => self.add_size_digit((b - b'0') as u64)?,
                b'a'..=b'f' => self.add_size_digit((b - b'a' + 10) as u64)?,
                b'A'..=b'F' => self.add_size_digit((b - b'A' + 10) as u64)?,
                b'\t' | b' ' => State::SizeLws,
                b';' => State::Extension,
                b'\r' => State::SizeLf,
                _ => return Err(ParseError::InvalidChunkSize),
            },
            State::SizeLws => match b {
                b'\t' | b' ' => State::SizeLws,
                b';' => State::Extension,
                b'\r' => State::SizeLf,
                _ => return Err(ParseError::InvalidChunkSize),
            },
            State::Extension => match b {
                b'\r' => State::SizeLf,
                // Some peers skip the CR; reject a bare LF outright instead
                // of guessing what they meant.
                b'\n' => return Err(ParseError::InvalidChunkExtension),
                _ => State::Extension,
            },
            State::SizeLf => match b {
                b'\n' if self.remaining == 0 => State::EndCr,
                b'\n' => State::Data,
                _ => return Err(ParseError::InvalidChunkFraming),
            },
            // Data bytes are copied in bulk by decode().
            State::Data => panic!("step() on chunk data"),
            State::DataCr => match b {
                b'\r' => State::DataLf,
                _ => return Err(ParseError::InvalidChunkFraming),
            },
            State::DataLf => match b {
                b'\n' => State::Size,
                _ => return Err(ParseError::InvalidChunkFraming),
            },
            State::Trailer => match b {
                b'\r' => State::TrailerLf,
                _ => State::Trailer,
            },
            State::TrailerLf => match b {
                b'\n' => State::EndCr,
                _ => return Err(ParseError::InvalidTrailer),
            },
            State::EndCr => match b {
                b'\r' => State::EndLf,
                // Not the empty line yet, so this is a trailer.
                _ => State::Trailer,
            },
            State::EndLf => match b {
                b'\n' => State::End,
                _ => return Err(ParseError::InvalidChunkFraming),
            },
            State::End => State::End,
        };
        Ok(())
    }

    fn add_size_digit(&mut self, v: u64) -> Result<State, ParseError> {
        self.remaining = self
            .remaining
            .checked_mul(16)
            .and_then(|n| n.checked_add(v))
            .ok_or(ParseError::InvalidChunkSize)?;
        Ok(State::Size)
    }
}
