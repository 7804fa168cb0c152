/// The three supported LOB flavors.
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LobTypeId {
    /// Binary data.
    BLOB,
    /// Character data, stored as UTF-8.
    CLOB,
    /// National-character data, stored as CESU-8.
    NCLOB,
}

impl LobTypeId {
    /// Returns true for the character flavors (CLOB, NCLOB).
    pub fn is_character_type(self) -> bool {
        matches!(self, Self::CLOB | Self::NCLOB)
    }
}

/// Metadata of a LOB value, as reported by the type/metadata collaborator.
///
/// The engine treats these values as opaque configuration that is fixed at
/// handle-open time.
#[derive(Clone, Copy, Debug)]
pub struct LobDescriptor {
    type_id: LobTypeId,
    chunk_size: u32,
    total_length: Option<u64>,
}

impl LobDescriptor {
    /// `chunk_size` is the server-advised optimal transfer unit for the value;
    /// `total_length` is unknown for some temporary LOBs until the first read.
    pub fn new(type_id: LobTypeId, chunk_size: u32, total_length: Option<u64>) -> Self {
        Self {
            type_id,
            chunk_size: std::cmp::max(chunk_size, 1),
            total_length,
        }
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
}
