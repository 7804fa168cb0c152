use crate::{session::AmSessionCore, LobResult};

// One remote roundtrip per call. The session is locked only for the duration
// of the call, so it stays usable by other work between pieces.

pub(crate) fn fetch_a_lob_chunk(
    am_session: &AmSessionCore,
    locator_id: u64,
    offset: u64,
    length: u32,
) -> LobResult<(Vec<u8>, bool)> {
    trace!("fetch_a_lob_chunk(): locator {locator_id}, offset {offset}, length {length}");
    am_session
        .lock()?
        .store_mut()?
        .fetch_chunk(locator_id, offset, length)
}

pub(crate) fn write_a_lob_chunk(
    am_session: &AmSessionCore,
    locator_id: u64,
    offset: u64,
    data: &[u8],
    last: bool,
) -> LobResult<u64> {
    trace!(
        "write_a_lob_chunk(): locator {locator_id}, offset {offset}, {} bytes, last = {last}",
        data.len()
    );
    am_session
        .lock()?
        .store_mut()?
        .write_chunk(locator_id, offset, data, last)
}
