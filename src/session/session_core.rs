use crate::{conf::TransferConfiguration, session::RemoteLobStore, LobError, LobResult};
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared, mutex-guarded access to one database session.
///
/// Readers and writers hold clones of this handle and lock it for the
/// duration of a single remote call, so the session stays usable between
/// pieces. The engine observes but never owns the session's lifetime:
/// once the owner calls [`SessionCore::mark_dead`], every further remote
/// call fails with [`LobError::SessionClosed`].
#[derive(Clone, Debug)]
pub struct AmSessionCore(Arc<Mutex<SessionCore>>);

impl AmSessionCore {
    /// Wraps the given store implementation.
    pub fn new(store: Box<dyn RemoteLobStore>, configuration: TransferConfiguration) -> Self {
        Self(Arc::new(Mutex::new(SessionCore {
            store,
            configuration,
            alive: true,
        })))
    }

    /// Locks the session core.
    pub fn lock(&self) -> LobResult<MutexGuard<'_, SessionCore>> {
        Ok(self.0.lock()?)
    }
}

/// The engine-side view of one database session.
#[derive(Debug)]
pub struct SessionCore {
    store: Box<dyn RemoteLobStore>,
    configuration: TransferConfiguration,
    alive: bool,
}

impl SessionCore {
    /// The configuration the session was created with.
    pub fn configuration(&self) -> &TransferConfiguration {
        &self.configuration
    }

    pub(crate) fn lob_read_length(&self) -> u32 {
        self.configuration.lob_read_length()
    }

    pub(crate) fn lob_write_length(&self) -> u32 {
        self.configuration.lob_write_length()
    }

    pub(crate) fn max_buffer_size(&self) -> usize {
        self.configuration.max_buffer_size()
    }

    pub(crate) fn is_auto_commit(&self) -> bool {
        self.configuration.is_auto_commit()
    }

    /// Signals that the enclosing connection is gone.
    ///
    /// Transfers that are under way fail cleanly at their next remote call.
    pub fn mark_dead(&mut self) {
        if self.alive {
            warn!("session was marked dead");
            self.alive = false;
        }
    }

    /// Returns false once the enclosing connection is gone.
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub(crate) fn store_mut(&mut self) -> LobResult<&mut dyn RemoteLobStore> {
        if self.alive {
            Ok(&mut *self.store)
        } else {
            Err(LobError::SessionClosed)
        }
    }
}
