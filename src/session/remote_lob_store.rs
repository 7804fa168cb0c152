use crate::LobResult;

/// Contract of the database session collaborator.
///
/// The underlying driver implements this trait on top of whatever wire
/// protocol it speaks; the engine only ever issues these calls, one at a
/// time per session. Serialization of overlapping LOB work across several
/// handles that share one session is the implementor's business.
///
/// Errors returned from these methods are surfaced unretried to exactly one
/// error observer and terminate the affected handle.
pub trait RemoteLobStore: std::fmt::Debug + Send {
    /// Validates the locator and pins it for subsequent chunk transfer.
    ///
    /// Must fail with [`LobError::InvalidLocator`](crate::LobError::InvalidLocator)
    /// if the locator is unknown or stale.
    fn open_locator(&mut self, locator_id: u64) -> LobResult<()>;

    /// Fetches up to `length` bytes starting at `offset`.
    ///
    /// The returned flag indicates whether the end of the value was reached
    /// with this reply.
    fn fetch_chunk(&mut self, locator_id: u64, offset: u64, length: u32)
        -> LobResult<(Vec<u8>, bool)>;

    /// Writes `data` at `offset` and returns the number of bytes taken.
    ///
    /// `last` marks the final piece and finalizes the remote value.
    fn write_chunk(
        &mut self,
        locator_id: u64,
        offset: u64,
        data: &[u8],
        last: bool,
    ) -> LobResult<u64>;

    /// Releases the locator.
    ///
    /// For temporary LOBs this releases temporary-tablespace storage, for
    /// persistent LOBs server-side cursors.
    fn close_locator(&mut self, locator_id: u64) -> LobResult<()>;

    /// Commits the enclosing transaction.
    fn commit(&mut self) -> LobResult<()>;

    /// Rolls the enclosing transaction back.
    fn rollback(&mut self) -> LobResult<()>;
}
