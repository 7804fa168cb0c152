use thiserror::Error;

/// A list specifying categories of [`LobError`](crate::LobError).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LobError {
    /// The given locator is null or not known to the remote session.
    #[error("Invalid LOB locator")]
    InvalidLocator,

    /// An operation was issued against a handle that is closed or finalized.
    #[error("Operation on a closed LOB handle")]
    ClosedHandle,

    /// A close was issued for a handle that is already closed.
    ///
    /// This is non-fatal; callers should report it and carry on.
    #[error("LOB handle was already closed")]
    AlreadyClosed,

    /// The read offset lies beyond the known total length of the LOB.
    #[error("Offset {offset} is beyond the total length {total}")]
    OutOfRange {
        /// The offending offset.
        offset: u64,
        /// The known total length of the LOB.
        total: u64,
    },

    /// The remote store reported a failure; the handle is unusable afterwards.
    #[error("Error occured in communication with the remote store")]
    RemoteIo {
        /// The causing Error.
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// The transfer was aborted by the caller.
    #[error("Transfer was aborted by the caller")]
    Aborted,

    /// The enclosing database session is gone; the transfer cannot proceed.
    #[error("The database session is closed")]
    SessionClosed,

    /// Some error occured while decoding character data.
    #[error("Some error occured while decoding character LOB data")]
    Cesu8,

    /// Implementation error.
    #[error("Implementation error: {}", _0)]
    Impl(&'static str),

    /// Error occured in thread synchronization.
    #[error("Error occured in thread synchronization")]
    Poison,

    /// Error occured while interacting with a byte source or sink.
    #[error(transparent)]
    Io {
        /// The causing Error.
        #[from]
        source: std::io::Error,
    },

    /// Error caused by wrong usage.
    #[error("Wrong usage: {}", _0)]
    Usage(&'static str),

    /// Error caused by wrong usage.
    #[error("Wrong usage: {}", _0)]
    UsageDetailed(String),
}

/// Abbreviation of `Result<T, LobError>`.
pub type LobResult<T> = std::result::Result<T, LobError>;

impl LobError {
    /// Wraps a transport or database failure.
    pub fn remote_io<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self::RemoteIo {
            source: error.into(),
        }
    }

    /// Reveal the inner error, if any.
    pub fn inner(&self) -> Option<&dyn std::error::Error> {
        match self {
            Self::RemoteIo { source } => Some(&**source),
            Self::Io { source } => Some(source),
            _ => None,
        }
    }
}

impl<G> From<std::sync::PoisonError<G>> for LobError {
    fn from(_error: std::sync::PoisonError<G>) -> Self {
        Self::Poison
    }
}
