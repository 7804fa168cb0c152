use crate::{session::AmSessionCore, LobError, LobResult};
use debug_ignore::DebugIgnore;
use std::sync::{Arc, Mutex};

/// A chunk producer: a [`LobReader`](crate::LobReader), a file, an in-memory
/// buffer, or any other chunked source.
pub trait PullSource {
    /// The next chunk, or `None` once the source is exhausted.
    fn pull_chunk(&mut self) -> LobResult<Option<Vec<u8>>>;
}

/// A chunk acceptor: a [`LobWriter`](crate::LobWriter), an in-memory buffer,
/// or any other chunked sink.
pub trait PushSink {
    /// Accepts one chunk.
    fn push_chunk(&mut self, chunk: &[u8]) -> LobResult<()>;

    /// Signals that no further chunk follows.
    fn finish(&mut self) -> LobResult<()>;
}

/// Drains `source` into `sink` chunk by chunk and finishes the sink.
///
/// Piping into a [`LobWriter`](crate::LobWriter) therefore calls its
/// [`end()`](crate::LobWriter::end) implicitly.
pub fn pipe(source: &mut dyn PullSource, sink: &mut dyn PushSink) -> LobResult<()> {
    while let Some(chunk) = source.pull_chunk()? {
        sink.push_chunk(&chunk)?;
    }
    sink.finish()
}

// An in-memory buffer is the simplest sink.
impl PushSink for Vec<u8> {
    fn push_chunk(&mut self, chunk: &[u8]) -> LobResult<()> {
        self.extend_from_slice(chunk);
        Ok(())
    }

    fn finish(&mut self) -> LobResult<()> {
        Ok(())
    }
}

/// Adapts any [`std::io::Read`] into a [`PullSource`] producing pieces of the
/// given size.
pub struct ReadSource<R> {
    reader: R,
    piece_size: usize,
}

impl<R: std::io::Read> ReadSource<R> {
    pub fn new(reader: R, piece_size: usize) -> Self {
        Self {
            reader,
            piece_size: std::cmp::max(piece_size, 1),
        }
    }
}

impl<R> std::fmt::Debug for ReadSource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadSource")
            .field("piece_size", &self.piece_size)
            .finish_non_exhaustive()
    }
}

impl<R: std::io::Read> PullSource for ReadSource<R> {
    fn pull_chunk(&mut self) -> LobResult<Option<Vec<u8>>> {
        let mut piece = vec![0_u8; self.piece_size];
        let mut filled = 0;
        while filled < piece.len() {
            let n = self.reader.read(&mut piece[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        if filled == 0 {
            Ok(None)
        } else {
            piece.truncate(filled);
            Ok(Some(piece))
        }
    }
}

/// The terminal state of a write transfer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransferOutcome {
    /// The writer finished; committing is safe now.
    Finished,
    /// The writer was aborted; the transaction should be rolled back.
    Aborted,
}

/// Ties a [`LobWriter`](crate::LobWriter) to the enclosing transaction.
///
/// Committing a RETURNING-style insert before its LOB writer has finished
/// truncates the data, so the commit signal must be sequenced behind the
/// writer: once the writer reaches `Finished`, the session either issues the
/// collaborator's `commit()` itself (auto-commit) or records that committing
/// is safe now ([`TransferSession::is_safe_to_commit`]). An aborted writer
/// signals `rollback()` instead. The session only sequences these signals;
/// the transaction semantics live in the collaborator.
///
/// One finish observer and one error observer can be registered; each is
/// invoked at most once, and never both.
#[derive(Clone, Debug)]
pub struct TransferSession(Arc<Mutex<TransferCore>>);

#[derive(Debug)]
struct TransferCore {
    am_session: AmSessionCore,
    auto_commit: bool,
    outcome: Option<TransferOutcome>,
    on_finish: DebugIgnore<Option<Box<dyn FnMut() + Send>>>,
    on_error: DebugIgnore<Option<Box<dyn FnMut(&LobError) + Send>>>,
}

impl TransferSession {
    /// Creates a session that follows the configured auto-commit behavior.
    pub fn new(am_session: &AmSessionCore) -> LobResult<Self> {
        let auto_commit = am_session.lock()?.is_auto_commit();
        Ok(Self::with_auto_commit(am_session, auto_commit))
    }

    /// Creates a session with an explicit auto-commit decision, overriding
    /// the session configuration.
    pub fn with_auto_commit(am_session: &AmSessionCore, auto_commit: bool) -> Self {
        Self(Arc::new(Mutex::new(TransferCore {
            am_session: am_session.clone(),
            auto_commit,
            outcome: None,
            on_finish: DebugIgnore(None),
            on_error: DebugIgnore(None),
        })))
    }

    /// Registers the finish observer, replacing any earlier one.
    pub fn on_finish<F>(&self, callback: F) -> LobResult<()>
    where
        F: FnMut() + Send + 'static,
    {
        self.0.lock()?.on_finish.0 = Some(Box::new(callback));
        Ok(())
    }

    /// Registers the error observer, replacing any earlier one.
    pub fn on_error<F>(&self, callback: F) -> LobResult<()>
    where
        F: FnMut(&LobError) + Send + 'static,
    {
        self.0.lock()?.on_error.0 = Some(Box::new(callback));
        Ok(())
    }

    /// Whether a finished writer triggers the commit itself.
    pub fn is_auto_commit(&self) -> bool {
        self.0.lock().map_or(false, |core| core.auto_commit)
    }

    /// The terminal state of the transfer, if reached.
    pub fn outcome(&self) -> Option<TransferOutcome> {
        self.0.lock().ok().and_then(|core| core.outcome)
    }

    /// True once the writer has finished and committing cannot truncate data
    /// any more.
    pub fn is_safe_to_commit(&self) -> bool {
        self.outcome() == Some(TransferOutcome::Finished)
    }

    // The writer reached Finished: commit (if auto-commit) and notify.
    pub(crate) fn writer_finished(&self) -> LobResult<()> {
        let mut core = self.0.lock()?;
        if core.outcome.is_some() {
            return Ok(());
        }
        core.outcome = Some(TransferOutcome::Finished);
        debug!("writer finished, commit is safe now");
        if core.auto_commit {
            core.am_session.lock()?.store_mut()?.commit()?;
        }
        if let Some(callback) = core.on_finish.0.as_mut() {
            callback();
        }
        Ok(())
    }

    // The writer was aborted: signal rollback and notify the error observer.
    // Failures on this path must not mask the error that is being surfaced.
    pub(crate) fn writer_aborted(&self, error: &LobError) {
        let Ok(mut core) = self.0.lock() else {
            return;
        };
        if core.outcome.is_some() {
            return;
        }
        core.outcome = Some(TransferOutcome::Aborted);
        debug!("writer aborted: {error}");
        match core.am_session.lock() {
            Ok(mut session) => {
                if let Err(e) = session.store_mut().and_then(|store| store.rollback()) {
                    warn!("rollback signal failed with {e}");
                }
            }
            Err(e) => warn!("rollback signal failed with {e}"),
        }
        if let Some(callback) = core.on_error.0.as_mut() {
            callback(error);
        }
    }
}
