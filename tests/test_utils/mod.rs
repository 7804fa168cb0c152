// advisable because not all test modules use all functions of this module:
#![allow(dead_code)]

use flexi_logger::Logger;
use lobstream::{
    AmSessionCore, ChunkConsumer, FlowInstruction, LobError, LobResult, RemoteLobStore,
    TransferConfiguration,
};
use std::sync::{Arc, Mutex, MutexGuard};
use vec_map::VecMap;

// Starts a logger that prints out all info, warn and error messages.
// Tolerates being called once per test module within one test binary.
pub fn init_logger() {
    if let Ok(handle) = Logger::try_with_env_or_str("info")
        .unwrap_or_else(|e| panic!("Logger initialization failed with {e}"))
        .start()
    {
        std::mem::forget(handle);
    }
}

pub fn session(store: &MockLobStore) -> AmSessionCore {
    session_with(store, TransferConfiguration::default())
}

pub fn session_with(store: &MockLobStore, configuration: TransferConfiguration) -> AmSessionCore {
    AmSessionCore::new(store.boxed(), configuration)
}

/// In-memory fake of the remote store, with call recording and error
/// injection. Clones share state, so tests keep one clone for inspection
/// while the session owns another.
#[derive(Clone, Debug, Default)]
pub struct MockLobStore(Arc<Mutex<MockState>>);

#[derive(Debug, Default)]
pub struct MockState {
    pub lobs: VecMap<Vec<u8>>,
    pub finalized: Vec<u64>,
    pub closed: Vec<u64>,
    pub fetch_offsets: Vec<u64>,
    pub write_sizes: Vec<usize>,
    pub commits: usize,
    pub rollbacks: usize,
    /// 1-based index of the fetch call that fails.
    pub fail_fetch_at: Option<usize>,
    pub fail_writes: bool,
}

impl MockLobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(locator_id: u64, content: Vec<u8>) -> Self {
        let store = Self::default();
        store.put(locator_id, content);
        store
    }

    pub fn put(&self, locator_id: u64, content: Vec<u8>) {
        self.state().lobs.insert(locator_id as usize, content);
    }

    pub fn content(&self, locator_id: u64) -> Vec<u8> {
        self.state()
            .lobs
            .get(locator_id as usize)
            .cloned()
            .unwrap_or_default()
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.0.lock().unwrap()
    }

    pub fn boxed(&self) -> Box<dyn RemoteLobStore> {
        Box::new(self.clone())
    }
}

impl RemoteLobStore for MockLobStore {
    fn open_locator(&mut self, locator_id: u64) -> LobResult<()> {
        if self.state().lobs.contains_key(locator_id as usize) {
            Ok(())
        } else {
            Err(LobError::InvalidLocator)
        }
    }

    fn fetch_chunk(
        &mut self,
        locator_id: u64,
        offset: u64,
        length: u32,
    ) -> LobResult<(Vec<u8>, bool)> {
        let mut state = self.state();
        state.fetch_offsets.push(offset);
        if state.fail_fetch_at == Some(state.fetch_offsets.len()) {
            return Err(LobError::remote_io("simulated wire failure"));
        }
        let content = state
            .lobs
            .get(locator_id as usize)
            .ok_or(LobError::InvalidLocator)?;
        let offset = usize::try_from(offset).unwrap();
        let end = std::cmp::min(offset + length as usize, content.len());
        let data = content.get(offset..end).unwrap_or(&[]).to_vec();
        Ok((data, end >= content.len()))
    }

    fn write_chunk(
        &mut self,
        locator_id: u64,
        offset: u64,
        data: &[u8],
        last: bool,
    ) -> LobResult<u64> {
        let mut state = self.state();
        state.write_sizes.push(data.len());
        if state.fail_writes {
            return Err(LobError::remote_io("simulated write failure"));
        }
        {
            let content = state
                .lobs
                .get_mut(locator_id as usize)
                .ok_or(LobError::InvalidLocator)?;
            assert_eq!(offset as usize, content.len(), "writes must be sequential");
            content.extend_from_slice(data);
        }
        if last {
            state.finalized.push(locator_id);
        }
        Ok(data.len() as u64)
    }

    fn close_locator(&mut self, locator_id: u64) -> LobResult<()> {
        self.state().closed.push(locator_id);
        Ok(())
    }

    fn commit(&mut self) -> LobResult<()> {
        self.state().commits += 1;
        Ok(())
    }

    fn rollback(&mut self) -> LobResult<()> {
        self.state().rollbacks += 1;
        Ok(())
    }
}

/// Consumer that records everything it sees.
#[derive(Debug, Default)]
pub struct RecordingConsumer {
    pub chunks: Vec<Vec<u8>>,
    pub completions: usize,
    pub errors: Vec<String>,
    /// Park the stream once this many chunks were seen in total.
    pub pause_after: Option<usize>,
}

impl ChunkConsumer for RecordingConsumer {
    fn on_chunk(&mut self, chunk: Vec<u8>) -> FlowInstruction {
        self.chunks.push(chunk);
        match self.pause_after {
            Some(n) if self.chunks.len() >= n => FlowInstruction::Pause,
            _ => FlowInstruction::Continue,
        }
    }

    fn on_complete(&mut self) {
        self.completions += 1;
    }

    fn on_error(&mut self, error: &LobError) {
        self.errors.push(error.to_string());
    }
}

impl RecordingConsumer {
    pub fn consumed_len(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    pub fn concat(&self) -> Vec<u8> {
        self.chunks.concat()
    }
}
