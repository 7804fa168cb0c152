use super::fetch::{fetch_a_lob_chunk, write_a_lob_chunk};
use crate::{
    session::{AmSessionCore, LobDescriptor, LobTypeId},
    LobError, LobResult,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum HandleState {
    Open,
    Closed,
}

/// Position cursor over a remote LOB value.
///
/// A `LobHandle` combines the locator, the metadata that was fixed at open
/// time, and the current offset of a single linear read or write pass.
/// LOBs are sequential-only; the offset advances monotonically and there is
/// no random index addressing.
///
/// Every operation except [`LobHandle::close`] fails with
/// [`LobError::ClosedHandle`] once the handle is closed.
#[derive(Debug)]
pub struct LobHandle {
    am_session: AmSessionCore,
    locator_id: u64,
    type_id: LobTypeId,
    chunk_size: u32,
    total_length: Option<u64>,
    offset: u64,
    state: HandleState,
}

impl LobHandle {
    /// Validates the locator with the remote session and opens a handle over it.
    ///
    /// A null locator (id 0) is rejected locally; stale locators are rejected
    /// by the store.
    pub fn open(
        am_session: &AmSessionCore,
        locator_id: u64,
        descriptor: LobDescriptor,
    ) -> LobResult<Self> {
        if locator_id == 0 {
            return Err(LobError::InvalidLocator);
        }
        am_session.lock()?.store_mut()?.open_locator(locator_id)?;
        trace!(
            "open(): locator {locator_id}, type {:?}, chunk_size {}, total_length {:?}",
            descriptor.type_id(),
            descriptor.chunk_size(),
            descriptor.total_length()
        );
        Ok(Self {
            am_session: am_session.clone(),
            locator_id,
            type_id: descriptor.type_id(),
            chunk_size: descriptor.chunk_size(),
            total_length: descriptor.total_length(),
            offset: 0,
            state: HandleState::Open,
        })
    }

    /// The LOB flavor.
    pub fn type_id(&self) -> LobTypeId {
        self.type_id
    }

    /// The server-advised optimal transfer unit, in bytes.
    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// The total length of the value, if known.
    pub fn total_length(&self) -> Option<u64> {
        self.total_length
    }

    /// The current offset of the linear pass.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns true once the handle is closed.
    pub fn is_closed(&self) -> bool {
        self.state == HandleState::Closed
    }

    // Data already delivered out of band (e.g. inline with the first
    // roundtrip) moves the cursor without a fetch.
    pub(crate) fn advance(&mut self, units: u64) {
        self.offset += units;
    }

    fn guard_open(&self) -> LobResult<()> {
        match self.state {
            HandleState::Open => Ok(()),
            HandleState::Closed => Err(LobError::ClosedHandle),
        }
    }

    /// Fetches the next at most `max_units` bytes and advances the offset.
    ///
    /// The returned flag indicates that the end of the value was reached.
    pub fn read(&mut self, max_units: u32) -> LobResult<(Vec<u8>, bool)> {
        self.guard_open()?;
        if let Some(total) = self.total_length {
            if self.offset > total {
                return Err(LobError::OutOfRange {
                    offset: self.offset,
                    total,
                });
            }
        }
        let (data, is_last) =
            fetch_a_lob_chunk(&self.am_session, self.locator_id, self.offset, max_units)?;
        self.offset += data.len() as u64;
        Ok((data, is_last))
    }

    /// Writes `data` at the current offset and advances it.
    ///
    /// `last` finalizes the remote value.
    pub fn write(&mut self, data: &[u8], last: bool) -> LobResult<u64> {
        self.guard_open()?;
        let written =
            write_a_lob_chunk(&self.am_session, self.locator_id, self.offset, data, last)?;
        self.offset += written;
        Ok(written)
    }

    /// Releases the remote locator.
    ///
    /// The second call fails with [`LobError::AlreadyClosed`]; callers must
    /// treat that as a reported no-op, not as a reason to abort.
    pub fn close(&mut self) -> LobResult<()> {
        if self.state == HandleState::Closed {
            return Err(LobError::AlreadyClosed);
        }
        self.state = HandleState::Closed;
        trace!("close(): locator {}", self.locator_id);
        self.am_session
            .lock()?
            .store_mut()?
            .close_locator(self.locator_id)
    }

    // Close variant for engine-internal cleanup paths, where a double close
    // or a dead session must not mask the error that is being surfaced.
    pub(crate) fn close_tolerated(&mut self) {
        match self.close() {
            Ok(()) => {}
            Err(LobError::AlreadyClosed) => {
                warn!("close(): locator {} was already closed", self.locator_id);
            }
            Err(e) => warn!("close(): locator {} failed with {e}", self.locator_id),
        }
    }
}
