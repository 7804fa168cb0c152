use super::flow_control::{ChunkConsumer, FlowController, FlowMode};
use super::lob_handle::LobHandle;
use super::transfer::PullSource;
use crate::{
    session::{AmSessionCore, LobDescriptor, LobTypeId},
    LobError, LobResult,
};

/// Streaming access to a LOB value received from the database.
///
/// The data of bigger LOBs are not transferred completely in the first
/// roundtrip; a `LobReader` carries the session and the controls to fetch
/// the remaining pieces on demand ([`LobReader::next_piece`], paused mode)
/// or speculatively while driving a [`ChunkConsumer`] (flowing mode).
///
/// The sequence is lazy, forward-only and non-restartable; re-reading from
/// the start requires a fresh locator and a fresh reader. `&mut self` on all
/// reading operations keeps concurrent reads over one handle impossible.
/// Overlapping streams over *different* handles on one session are not
/// coordinated here — that serialization is the session collaborator's
/// documented responsibility.
///
/// Once the end of data is reached the locator is released automatically.
#[derive(Debug)]
pub struct LobReader(Box<FlowController>);

impl LobReader {
    /// Opens a reader over the given locator.
    pub fn open(
        am_session: &AmSessionCore,
        locator_id: u64,
        descriptor: LobDescriptor,
    ) -> LobResult<Self> {
        Self::with_seed(am_session, locator_id, descriptor, Vec::new(), false)
    }

    /// Opens a reader over a locator whose first bytes were already delivered
    /// inline with the first roundtrip.
    ///
    /// `seed` is served before any fetch; `is_complete` marks a value that
    /// was delivered completely inline, in which case no fetch happens at all.
    pub fn with_seed(
        am_session: &AmSessionCore,
        locator_id: u64,
        descriptor: LobDescriptor,
        seed: Vec<u8>,
        is_complete: bool,
    ) -> LobResult<Self> {
        let handle = LobHandle::open(am_session, locator_id, descriptor)?;
        let read_length = am_session.lock()?.lob_read_length();
        let piece_size = effective_piece_size(read_length, descriptor.chunk_size());
        Ok(Self(Box::new(FlowController::new(
            handle,
            piece_size,
            seed,
            is_complete,
        ))))
    }

    /// Builder-method for overriding the piece size, the granularity of a
    /// single fetch. Ideally a multiple of the server-advised chunk size.
    #[must_use]
    pub fn with_piece_size(mut self, piece_size: u32) -> Self {
        self.0.set_piece_size(piece_size);
        self
    }

    /// Returns the next chunk, or `None` once the end of data is reached.
    ///
    /// Serves buffered look-ahead chunks first, otherwise performs exactly
    /// one fetch. Reaching the end releases the locator; `None` is repeatable
    /// afterwards.
    pub fn next_piece(&mut self) -> LobResult<Option<Vec<u8>>> {
        self.0.pull()
    }

    /// Attaches `consumer` and switches to flowing mode.
    ///
    /// The consumer sees every chunk in strict offset order, then exactly one
    /// completion signal — or, on a terminal failure, exactly one error
    /// signal and no completion. The same error is also returned.
    pub fn drive(&mut self, consumer: &mut dyn ChunkConsumer) -> LobResult<()> {
        self.0.drive(consumer)
    }

    /// Parks the stream. Buffered look-ahead chunks are kept for later
    /// delivery.
    pub fn pause(&mut self) {
        self.0.set_mode(FlowMode::Paused);
    }

    /// Resumes flowing mode with the given consumer.
    pub fn resume(&mut self, consumer: &mut dyn ChunkConsumer) -> LobResult<()> {
        self.0.drive(consumer)
    }

    /// The current consumption mode.
    pub fn mode(&self) -> FlowMode {
        self.0.mode()
    }

    /// Abandons the stream and forces the locator to be released, regardless
    /// of completion state.
    ///
    /// Idempotent in the tolerated sense: a second call yields
    /// [`LobError::AlreadyClosed`] and changes nothing remotely.
    pub fn destroy(&mut self) -> LobResult<()> {
        self.0.destroy()
    }

    /// The LOB flavor.
    pub fn type_id(&self) -> LobTypeId {
        self.0.handle().type_id()
    }

    /// Total length of the value, if known.
    pub fn total_length(&self) -> Option<u64> {
        self.0.handle().total_length()
    }

    /// Returns true if the value is known to be empty.
    pub fn is_empty(&self) -> bool {
        self.total_length() == Some(0)
    }

    /// True once the end of data was observed and the locator was released.
    pub fn is_complete(&self) -> bool {
        self.0.is_complete()
    }

    /// Current size of the internal look-ahead buffer, in bytes.
    pub fn cur_buf_len(&self) -> usize {
        self.0.cur_buf_len()
    }

    /// Fetches all outstanding data into the reader.
    pub fn load_complete(&mut self) -> LobResult<()> {
        self.0.load_complete()
    }

    /// Converts the reader into the not-yet-consumed rest of the value.
    ///
    /// All outstanding data are fetched first, so this materializes the whole
    /// value; for very large objects the streaming operations are the better
    /// choice.
    pub fn into_bytes(self) -> LobResult<Vec<u8>> {
        trace!("into_bytes()");
        self.0.into_bytes()
    }

    /// Converts the rest of a character LOB into a `String`.
    ///
    /// CLOB data is decoded as UTF-8, NCLOB data as CESU-8. Fails with
    /// [`LobError::Usage`] for binary LOBs.
    pub fn into_string(self) -> LobResult<String> {
        trace!("into_string()");
        let type_id = self.type_id();
        if type_id == LobTypeId::BLOB {
            return Err(LobError::Usage(
                "into_string() is only supported for character LOBs",
            ));
        }
        let bytes = self.0.into_bytes()?;
        match type_id {
            LobTypeId::CLOB => String::from_utf8(bytes).map_err(|_| LobError::Cesu8),
            _ => Ok(cesu8::from_cesu8(&bytes)
                .map_err(|_| LobError::Cesu8)?
                .into_owned()),
        }
    }

    /// Streams the rest of the value into the given writer, piece by piece,
    /// without materializing it.
    pub fn write_into(mut self, writer: &mut dyn std::io::Write) -> LobResult<()> {
        while let Some(chunk) = self.next_piece()? {
            writer.write_all(&chunk)?;
        }
        writer.flush()?;
        Ok(())
    }
}

// Largest multiple of the chunk size that fits into the configured read
// length; at least one chunk.
fn effective_piece_size(read_length: u32, chunk_size: u32) -> u32 {
    std::cmp::max(read_length - read_length % chunk_size, chunk_size)
}

impl PullSource for LobReader {
    fn pull_chunk(&mut self) -> LobResult<Option<Vec<u8>>> {
        self.next_piece()
    }
}

// Byte-granular streaming on top of the chunked pulls.
impl std::io::Read for LobReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.0.pull().map_err(std::io::Error::other)? {
                Some(mut chunk) => {
                    let take = std::cmp::min(chunk.len(), buf.len() - filled);
                    buf[filled..filled + take].copy_from_slice(&chunk[..take]);
                    if take < chunk.len() {
                        self.0.unread(chunk.split_off(take));
                    }
                    filled += take;
                }
                None => break,
            }
        }
        Ok(filled)
    }
}

#[cfg(test)]
mod test {
    use super::effective_piece_size;

    #[test]
    fn test_effective_piece_size() {
        assert_eq!(effective_piece_size(1000, 256), 768);
        assert_eq!(effective_piece_size(256, 256), 256);
        assert_eq!(effective_piece_size(100, 256), 256);
        assert_eq!(effective_piece_size(0, 256), 256);
    }
}
