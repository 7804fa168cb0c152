use super::lob_handle::LobHandle;
use crate::{LobError, LobResult};
use debug_ignore::DebugIgnore;
use std::collections::VecDeque;

/// Consumption discipline of a chunk sequence: explicit pulls (`Paused`) or
/// pushes into a registered consumer (`Flowing`).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FlowMode {
    /// Chunks are handed out one per explicit pull.
    Paused,
    /// Chunks are pushed into the registered consumer as they arrive.
    Flowing,
}

/// Verdict of a [`ChunkConsumer`] after each chunk.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FlowInstruction {
    /// Keep the stream flowing.
    Continue,
    /// Park the stream; a fetch that is already under way completes and its
    /// chunk is buffered for later delivery.
    Pause,
    /// Abandon the stream and release the locator immediately.
    Abandon,
}

/// Receives the chunks of a flowing [`LobReader`](crate::LobReader).
pub trait ChunkConsumer {
    /// Called once per chunk, in strict offset order.
    fn on_chunk(&mut self, chunk: Vec<u8>) -> FlowInstruction;

    /// Called exactly once after the last chunk; the locator is already
    /// released at this point.
    fn on_complete(&mut self);

    /// Called at most once, on the first terminal error. No completion
    /// signal follows an error.
    fn on_error(&mut self, error: &LobError);
}

// Mediates between the pull-based fetch primitive of a LobHandle and the
// push-based consumer API. Owns the look-ahead buffer, so chunks fetched
// around a mode switch are parked rather than dropped.
//
// Terminal states: `completed` (end of data was observed and the handle was
// released) and `failed` (an error was surfaced, or the stream was
// destroyed). Neither accepts further chunks.
#[derive(Debug)]
pub(crate) struct FlowController {
    handle: LobHandle,
    mode: FlowMode,
    piece_size: u32,
    pending: DebugIgnore<VecDeque<Vec<u8>>>,
    fetched_all: bool,
    completed: bool,
    failed: bool,
}

impl FlowController {
    pub(crate) fn new(
        mut handle: LobHandle,
        piece_size: u32,
        seed: Vec<u8>,
        is_complete: bool,
    ) -> Self {
        let mut pending = VecDeque::new();
        if !seed.is_empty() {
            handle.advance(seed.len() as u64);
            pending.push_back(seed);
        }
        Self {
            handle,
            mode: FlowMode::Paused,
            piece_size: std::cmp::max(piece_size, 1),
            pending: DebugIgnore(pending),
            fetched_all: is_complete,
            completed: false,
            failed: false,
        }
    }

    pub(crate) fn handle(&self) -> &LobHandle {
        &self.handle
    }

    pub(crate) fn mode(&self) -> FlowMode {
        self.mode
    }

    pub(crate) fn set_mode(&mut self, mode: FlowMode) {
        self.mode = mode;
    }

    pub(crate) fn set_piece_size(&mut self, piece_size: u32) {
        self.piece_size = std::cmp::max(piece_size, 1);
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.completed
    }

    pub(crate) fn cur_buf_len(&self) -> usize {
        self.pending.iter().map(Vec::len).sum()
    }

    // Push back the unconsumed rest of a chunk (byte-granular adapters).
    pub(crate) fn unread(&mut self, rest: Vec<u8>) {
        if !rest.is_empty() {
            self.pending.push_front(rest);
        }
    }

    /// Explicit pull: the next buffered chunk if present, otherwise exactly
    /// one synchronous fetch of piece-size units. `None` is the end marker;
    /// reaching it releases the locator.
    pub(crate) fn pull(&mut self) -> LobResult<Option<Vec<u8>>> {
        if let Some(chunk) = self.pending.pop_front() {
            return Ok(Some(chunk));
        }
        if self.failed {
            return Err(LobError::ClosedHandle);
        }
        if self.fetched_all {
            self.close_for_completion();
            return Ok(None);
        }
        match self.fetch_piece()? {
            Some(chunk) => Ok(Some(chunk)),
            None => {
                self.close_for_completion();
                Ok(None)
            }
        }
    }

    /// Flowing mode: pushes chunks into `consumer` until the consumer parks
    /// or abandons the stream, the data end is reached, or an error occurs.
    ///
    /// Errors reach `consumer.on_error` exactly once over the lifetime of the
    /// stream; the same error is also returned.
    pub(crate) fn drive(&mut self, consumer: &mut dyn ChunkConsumer) -> LobResult<()> {
        if self.failed {
            return Err(LobError::ClosedHandle);
        }
        if self.completed {
            return Ok(());
        }
        self.mode = FlowMode::Flowing;
        while self.mode == FlowMode::Flowing {
            let next = if let Some(chunk) = self.pending.pop_front() {
                Some(chunk)
            } else if self.fetched_all {
                None
            } else {
                match self.fetch_piece() {
                    Ok(o_chunk) => o_chunk,
                    Err(e) => {
                        consumer.on_error(&e);
                        return Err(e);
                    }
                }
            };

            let Some(chunk) = next else {
                self.close_for_completion();
                consumer.on_complete();
                return Ok(());
            };

            match consumer.on_chunk(chunk) {
                FlowInstruction::Continue => {}
                FlowInstruction::Pause => {
                    self.mode = FlowMode::Paused;
                    // the speculative fetch that is already under way
                    // completes and is parked, never discarded
                    if self.pending.is_empty() && !self.fetched_all {
                        match self.fetch_piece() {
                            Ok(Some(look_ahead)) => self.pending.push_back(look_ahead),
                            Ok(None) => {}
                            Err(e) => {
                                consumer.on_error(&e);
                                return Err(e);
                            }
                        }
                    }
                }
                FlowInstruction::Abandon => {
                    self.mode = FlowMode::Paused;
                    match self.destroy() {
                        Ok(()) | Err(LobError::AlreadyClosed) => {}
                        Err(e) => return Err(e),
                    }
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// Fetches all outstanding data into the buffer.
    pub(crate) fn load_complete(&mut self) -> LobResult<()> {
        trace!("load_complete()");
        if self.failed {
            return Err(LobError::ClosedHandle);
        }
        while !self.fetched_all {
            if let Some(chunk) = self.fetch_piece()? {
                self.pending.push_back(chunk);
            }
        }
        Ok(())
    }

    /// Materializes all not-yet-consumed data and releases the locator.
    pub(crate) fn into_bytes(mut self) -> LobResult<Vec<u8>> {
        self.load_complete()?;
        let mut bytes = Vec::with_capacity(self.cur_buf_len());
        for chunk in self.pending.drain(..) {
            bytes.extend_from_slice(&chunk);
        }
        self.close_for_completion();
        Ok(bytes)
    }

    /// Abandons the stream and releases the locator.
    ///
    /// A second call on an already-closed handle yields
    /// [`LobError::AlreadyClosed`], which callers treat as a warning.
    pub(crate) fn destroy(&mut self) -> LobResult<()> {
        self.pending.clear();
        self.fetched_all = true;
        self.failed = true;
        self.handle.close()
    }

    // One remote fetch of piece-size units. On error the locator is released
    // before the error propagates, and the stream becomes unusable.
    fn fetch_piece(&mut self) -> LobResult<Option<Vec<u8>>> {
        debug_assert!(!self.fetched_all && !self.failed);
        match self.handle.read(self.piece_size) {
            Ok((data, is_last)) => {
                if is_last || (data.len() as u64) < u64::from(self.piece_size) {
                    self.fetched_all = true;
                }
                trace!(
                    "fetch_piece(): got {} units, fetched_all = {}",
                    data.len(),
                    self.fetched_all
                );
                if data.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(data))
                }
            }
            Err(error) => {
                self.failed = true;
                self.fetched_all = true;
                self.pending.clear();
                // release the locator before the error surfaces
                self.handle.close_tolerated();
                Err(error)
            }
        }
    }

    // End of data: release the locator, then report completion.
    fn close_for_completion(&mut self) {
        if !self.completed {
            self.completed = true;
            self.handle.close_tolerated();
        }
    }
}
