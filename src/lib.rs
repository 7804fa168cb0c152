//! A chunked streaming engine for database large objects (LOBs).
//!
//! The engine sits between an application data source or sink and a remote
//! LOB locator handle that was obtained from a database session. All remote
//! interaction goes through the [`RemoteLobStore`] trait; the engine never
//! opens a network connection itself.
//!
//! [`LobReader`] pulls chunks from a locator and exposes them either through
//! explicit pulls ([`LobReader::next_piece`]) or by driving a registered
//! [`ChunkConsumer`] in flowing mode. [`LobWriter`] stages outgoing bytes and
//! forwards them in chunk-size-aligned pieces, finalizing the remote value on
//! [`LobWriter::end`]. A [`TransferSession`] gates the commit/rollback signal
//! towards the enclosing transaction.
//!
//! Reads and writes on one handle are strictly sequential and emit data in
//! strictly increasing offset order. Overlapping LOB operations on *different*
//! handles that share one database session are not coordinated here; the
//! session collaborator is expected to serialize them.

#![deny(missing_debug_implementations)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[macro_use]
extern crate log;

mod conf;
mod lob;
mod lob_error;
mod session;

pub use crate::conf::TransferConfiguration;
pub use crate::lob::{
    pipe, ChunkConsumer, FlowInstruction, FlowMode, LobHandle, LobReader, LobWriter, PullSource,
    PushSink, ReadSource, TransferOutcome, TransferSession,
};
pub use crate::lob_error::{LobError, LobResult};
pub use crate::session::{AmSessionCore, LobDescriptor, LobTypeId, RemoteLobStore, SessionCore};
