use crate::{LobError, LobResult};

// Write-side staging buffer. Bytes are appended at the end; pieces are
// drained from the front via a start index, so draining a piece does not
// move the remaining bytes. compact() moves the unread tail to the front
// once the drained prefix dominates the allocation.
#[derive(Clone, Default)]
pub(crate) struct LobBuf {
    data: Vec<u8>,
    start: usize,
}

impl LobBuf {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            start: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.data.len() - self.start
    }

    #[allow(dead_code)]
    pub(crate) fn is_empty(&self) -> bool {
        self.data.len() == self.start
    }

    pub(crate) fn append(&mut self, data: &[u8]) {
        self.data.extend_from_slice(data);
    }

    // The next n bytes, without consuming them.
    pub(crate) fn peek(&self, n: usize) -> LobResult<&[u8]> {
        if n > self.len() {
            return Err(LobError::Impl("peek(): not enough data"));
        }
        Ok(&self.data[self.start..self.start + n])
    }

    pub(crate) fn drain(&mut self, n: usize) -> LobResult<&[u8]> {
        if n > self.len() {
            return Err(LobError::Impl("drain(): not enough data"));
        }
        let start = self.start;
        self.start += n;
        Ok(&self.data[start..start + n])
    }

    // Consumes the whole remaining content.
    pub(crate) fn take_all(&mut self) -> Vec<u8> {
        let rest = self.data.split_off(self.start);
        self.data.clear();
        self.start = 0;
        rest
    }

    pub(crate) fn clear(&mut self) {
        self.data.clear();
        self.start = 0;
    }

    fn compact(&mut self) {
        self.data.drain(0..self.start);
        self.start = 0;
    }

    // Gives memory back after a large flush; keeps at most `cap` allocated.
    pub(crate) fn shrink_to(&mut self, cap: usize) {
        if self.data.capacity() > cap {
            self.compact();
            self.data.shrink_to(cap);
        }
    }
}
