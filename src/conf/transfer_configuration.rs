/// Configuration of a LOB transfer session.
///
/// An instance is handed to [`AmSessionCore::new`](crate::AmSessionCore::new)
/// and applies to all readers and writers created over that session.
#[derive(Debug, Clone)]
pub struct TransferConfiguration {
    auto_commit: bool,
    lob_read_length: u32,
    lob_write_length: u32,
    max_buffer_size: usize,
}

impl Default for TransferConfiguration {
    fn default() -> Self {
        Self {
            auto_commit: true,
            lob_read_length: Self::DEFAULT_LOB_READ_LENGTH,
            lob_write_length: Self::DEFAULT_LOB_WRITE_LENGTH,
            max_buffer_size: Self::DEFAULT_MAX_BUFFER_SIZE,
        }
    }
}

impl TransferConfiguration {
    /// Default value for the number of units that a reader requests with a
    /// single roundtrip to the remote store.
    ///
    /// The effective piece size is this value rounded down to a multiple of
    /// the server-advised chunk size of the LOB being read.
    pub const DEFAULT_LOB_READ_LENGTH: u32 = 199 * 1024_u32;

    /// Default value for the number of bytes a writer stages before it starts
    /// forwarding chunk-size-aligned pieces to the remote store.
    pub const DEFAULT_LOB_WRITE_LENGTH: u32 = 199 * 1024_u32;

    /// Minimal write-buffer size.
    pub const MIN_BUFFER_SIZE: usize = 10 * 1_024_usize;

    /// Default value for the maximum write-buffer size.
    ///
    /// Large writes can enforce a temporary enlargement of a writer's staging
    /// buffer; after a flush, oversized buffers are shrunk back to the
    /// configured maximum.
    pub const DEFAULT_MAX_BUFFER_SIZE: usize = 20 * Self::MIN_BUFFER_SIZE;

    /// Returns whether a finished writer triggers the transaction commit.
    pub fn is_auto_commit(&self) -> bool {
        self.auto_commit
    }
    /// Defines whether a finished writer triggers the transaction commit.
    pub fn set_auto_commit(&mut self, ac: bool) {
        self.auto_commit = ac;
    }
    /// Builder-method for defining whether a finished writer triggers the
    /// transaction commit.
    #[must_use]
    pub fn with_auto_commit(mut self, ac: bool) -> Self {
        self.auto_commit = ac;
        self
    }

    /// Returns the session's lob read length.
    pub fn lob_read_length(&self) -> u32 {
        self.lob_read_length
    }
    /// Sets the session's lob read length.
    pub fn set_lob_read_length(&mut self, lob_read_length: u32) {
        self.lob_read_length = lob_read_length;
    }
    /// Builder-method for setting the session's lob read length.
    #[must_use]
    pub fn with_lob_read_length(mut self, lob_read_length: u32) -> Self {
        self.lob_read_length = lob_read_length;
        self
    }

    /// Returns the session's lob write length.
    pub fn lob_write_length(&self) -> u32 {
        self.lob_write_length
    }
    /// Sets the session's lob write length.
    pub fn set_lob_write_length(&mut self, lob_write_length: u32) {
        self.lob_write_length = lob_write_length;
    }
    /// Builder-method for setting the session's lob write length.
    #[must_use]
    pub fn with_lob_write_length(mut self, lob_write_length: u32) -> Self {
        self.lob_write_length = lob_write_length;
        self
    }

    /// Returns the session's max buffer size.
    pub fn max_buffer_size(&self) -> usize {
        self.max_buffer_size
    }
    /// Sets the session's max buffer size.
    ///
    /// See also [`TransferConfiguration::MIN_BUFFER_SIZE`] and
    /// [`TransferConfiguration::DEFAULT_MAX_BUFFER_SIZE`].
    pub fn set_max_buffer_size(&mut self, max_buffer_size: usize) {
        self.max_buffer_size = std::cmp::max(max_buffer_size, Self::MIN_BUFFER_SIZE);
    }
    /// Builder-method for setting the session's max buffer size.
    #[must_use]
    pub fn with_max_buffer_size(mut self, max_buffer_size: usize) -> Self {
        self.set_max_buffer_size(max_buffer_size);
        self
    }
}

#[cfg(test)]
mod test {
    use super::TransferConfiguration;

    #[test]
    fn test_defaults_and_builder() {
        let configuration = TransferConfiguration::default();
        assert!(configuration.is_auto_commit());
        assert_eq!(
            configuration.lob_read_length(),
            TransferConfiguration::DEFAULT_LOB_READ_LENGTH
        );

        let configuration = TransferConfiguration::default()
            .with_auto_commit(false)
            .with_lob_read_length(500)
            .with_lob_write_length(256)
            .with_max_buffer_size(1);
        assert!(!configuration.is_auto_commit());
        assert_eq!(configuration.lob_read_length(), 500);
        assert_eq!(configuration.lob_write_length(), 256);
        // undersized values are raised to the minimum
        assert_eq!(
            configuration.max_buffer_size(),
            TransferConfiguration::MIN_BUFFER_SIZE
        );
    }
}
