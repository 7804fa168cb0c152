use super::char_tail;
use super::lob_buf::LobBuf;
use super::lob_handle::LobHandle;
use super::transfer::{PushSink, TransferSession};
use crate::{
    session::{AmSessionCore, LobDescriptor, LobTypeId},
    LobError, LobResult,
};
use debug_ignore::DebugIgnore;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum WriterState {
    Open,
    Ending,
    Finished,
    Aborted,
}

/// Streams application data into a remote LOB value.
///
/// Incoming bytes are staged until the configured write length is reached,
/// then forwarded in chunk-size-aligned pieces. For character LOBs a piece
/// never cuts through a multi-byte character; national-character data is
/// converted to CESU-8 on the way out.
///
/// Calling [`LobWriter::end`] is mandatory (or implied by a completed
/// [`pipe`](crate::pipe) into the writer): it flushes the rest, finalizes the
/// remote value with the last-data marker, releases the locator, and triggers
/// the finish signal that makes committing safe. A writer that is dropped
/// without `end()` leaks the remote locator and leaves the transaction
/// undecided.
///
/// State machine: `Open → (write)* → Ending → Finished`, or `Open → Aborted`
/// via [`LobWriter::destroy`] or a terminal error. There is no way out of
/// `Finished` or `Aborted`.
#[derive(Debug)]
pub struct LobWriter {
    handle: LobHandle,
    buffer: DebugIgnore<LobBuf>,
    write_length: usize,
    max_buffer_size: usize,
    state: WriterState,
    session: TransferSession,
}

impl LobWriter {
    /// Opens a writer over the given locator, with its own
    /// [`TransferSession`] following the configured auto-commit behavior.
    pub fn open(
        am_session: &AmSessionCore,
        locator_id: u64,
        descriptor: LobDescriptor,
    ) -> LobResult<Self> {
        let session = TransferSession::new(am_session)?;
        Self::open_with_session(am_session, locator_id, descriptor, session)
    }

    /// Opens a writer that reports into a caller-provided
    /// [`TransferSession`].
    pub fn open_with_session(
        am_session: &AmSessionCore,
        locator_id: u64,
        descriptor: LobDescriptor,
        session: TransferSession,
    ) -> LobResult<Self> {
        let handle = LobHandle::open(am_session, locator_id, descriptor)?;
        let (write_length, max_buffer_size) = {
            let core = am_session.lock()?;
            (core.lob_write_length() as usize, core.max_buffer_size())
        };
        let write_length = std::cmp::max(write_length, descriptor.chunk_size() as usize);
        Ok(Self {
            handle,
            buffer: DebugIgnore(LobBuf::with_capacity(write_length + 64)),
            write_length,
            max_buffer_size,
            state: WriterState::Open,
            session,
        })
    }

    /// The transfer session that gates the commit signal for this writer.
    pub fn transfer_session(&self) -> &TransferSession {
        &self.session
    }

    /// The LOB flavor.
    pub fn type_id(&self) -> LobTypeId {
        self.handle.type_id()
    }

    /// Number of bytes staged but not yet forwarded.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Appends `input` to the outgoing buffer, forwarding chunk-size-aligned
    /// pieces once the configured write length is reached.
    ///
    /// Fails with [`LobError::ClosedHandle`] once the writer is finalized or
    /// aborted.
    pub fn write(&mut self, input: &[u8]) -> LobResult<()> {
        self.guard_open()?;
        trace!("write() with input of len {}", input.len());
        self.buffer.append(input);
        if self.buffer.len() >= self.write_length {
            self.forward_pieces(false)?;
        }
        Ok(())
    }

    /// Flushes the remaining buffered bytes, finalizes the remote value,
    /// releases the locator, and triggers the finish signal.
    pub fn end(&mut self) -> LobResult<()> {
        self.guard_open()?;
        self.state = WriterState::Ending;
        trace!("end() with {} bytes still buffered", self.buffer.len());
        self.forward_pieces(true)?;

        // what is left becomes the final piece; character data must not end
        // within a character
        let rest = self.buffer.take_all();
        let payload = match self.encode_final(rest) {
            Ok(payload) => payload,
            Err(e) => return Err(self.abort_with(e)),
        };
        if let Err(e) = self.handle.write(&payload, true) {
            return Err(self.abort_with(e));
        }

        self.state = WriterState::Finished;
        self.handle.close_tolerated();
        self.session.writer_finished()
    }

    /// Aborts the transfer: discards buffered data, releases the locator
    /// without finalizing the value, and propagates `error` (default:
    /// [`LobError::Aborted`]) to the error observer.
    ///
    /// A second call on an already-closed writer yields
    /// [`LobError::AlreadyClosed`], which callers treat as a warning.
    pub fn destroy(&mut self, error: Option<LobError>) -> LobResult<()> {
        trace!("destroy()");
        self.buffer.clear();
        match self.state {
            WriterState::Open | WriterState::Ending => {
                self.state = WriterState::Aborted;
                self.session
                    .writer_aborted(&error.unwrap_or(LobError::Aborted));
                self.handle.close()
            }
            WriterState::Finished | WriterState::Aborted => self.handle.close(),
        }
    }

    fn guard_open(&self) -> LobResult<()> {
        match self.state {
            WriterState::Open => Ok(()),
            _ => Err(LobError::ClosedHandle),
        }
    }

    // Forwards aligned pieces. With `keep_last` the unaligned rest plus at
    // least one byte stays buffered, so the caller can emit a final piece
    // with the last-data marker.
    fn forward_pieces(&mut self, keep_last: bool) -> LobResult<()> {
        let chunk_size = self.handle.chunk_size() as usize;
        loop {
            let len = self.buffer.len();
            let has_full_piece = if keep_last {
                len > chunk_size
            } else {
                len >= chunk_size
            };
            if !has_full_piece {
                break;
            }
            let cut = match self.piece_cut(chunk_size) {
                Ok(cut) => cut,
                Err(e) => return Err(self.abort_with(e)),
            };
            if cut == 0 {
                // the whole piece is the tail of one unfinished character
                break;
            }
            let drained = self.buffer.drain(cut).map(<[u8]>::to_vec);
            let piece = match drained {
                Ok(piece) => piece,
                Err(e) => return Err(self.abort_with(e)),
            };
            let payload = match self.encode_piece(piece) {
                Ok(payload) => payload,
                Err(e) => return Err(self.abort_with(e)),
            };
            if let Err(e) = self.handle.write(&payload, false) {
                return Err(self.abort_with(e));
            }
        }
        self.buffer.shrink_to(self.max_buffer_size);
        Ok(())
    }

    // Cut point for the next piece: chunk size, shortened to the last
    // character boundary for character LOBs.
    fn piece_cut(&self, chunk_size: usize) -> LobResult<usize> {
        let n = std::cmp::min(chunk_size, self.buffer.len());
        if self.handle.type_id().is_character_type() {
            Ok(n - char_tail::utf8_tail_len(self.buffer.peek(n)?)?)
        } else {
            Ok(n)
        }
    }

    fn encode_piece(&self, piece: Vec<u8>) -> LobResult<Vec<u8>> {
        if self.handle.type_id() == LobTypeId::NCLOB {
            let (cesu8, tail) = char_tail::utf8_to_cesu8_and_utf8_tail(piece)?;
            debug_assert!(tail.is_empty());
            Ok(cesu8)
        } else {
            Ok(piece)
        }
    }

    fn encode_final(&self, rest: Vec<u8>) -> LobResult<Vec<u8>> {
        match self.handle.type_id() {
            LobTypeId::BLOB => Ok(rest),
            LobTypeId::CLOB => {
                if char_tail::utf8_tail_len(&rest)? == 0 {
                    Ok(rest)
                } else {
                    Err(LobError::Usage("stream ends within a UTF-8 character"))
                }
            }
            LobTypeId::NCLOB => {
                let (cesu8, tail) = char_tail::utf8_to_cesu8_and_utf8_tail(rest)?;
                if tail.is_empty() {
                    Ok(cesu8)
                } else {
                    Err(LobError::Usage("stream ends within a UTF-8 character"))
                }
            }
        }
    }

    // Terminal failure: discard staged data, release the locator before the
    // error surfaces, and signal the abort.
    fn abort_with(&mut self, error: LobError) -> LobError {
        self.state = WriterState::Aborted;
        self.buffer.clear();
        self.handle.close_tolerated();
        self.session.writer_aborted(&error);
        error
    }
}

impl PushSink for LobWriter {
    fn push_chunk(&mut self, chunk: &[u8]) -> LobResult<()> {
        self.write(chunk)
    }

    fn finish(&mut self) -> LobResult<()> {
        self.end()
    }
}

// Byte-stream adapter. flush() forwards full pieces but does not finalize;
// that stays with end().
impl std::io::Write for LobWriter {
    fn write(&mut self, input: &[u8]) -> std::io::Result<usize> {
        LobWriter::write(self, input).map_err(std::io::Error::other)?;
        Ok(input.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.forward_pieces(true).map_err(std::io::Error::other)
    }
}
