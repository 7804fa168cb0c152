mod lob_descriptor;
mod remote_lob_store;
mod session_core;

pub use self::lob_descriptor::{LobDescriptor, LobTypeId};
pub use self::remote_lob_store::RemoteLobStore;
pub use self::session_core::{AmSessionCore, SessionCore};
