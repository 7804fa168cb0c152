mod char_tail;
mod fetch;
mod flow_control;
mod lob_buf;
mod lob_handle;
mod lob_reader;
mod lob_writer;
mod transfer;

pub use self::flow_control::{ChunkConsumer, FlowInstruction, FlowMode};
pub use self::lob_handle::LobHandle;
pub use self::lob_reader::LobReader;
pub use self::lob_writer::LobWriter;
pub use self::transfer::{pipe, PullSource, PushSink, ReadSource, TransferOutcome, TransferSession};
