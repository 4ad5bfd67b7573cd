/// The maximum allowed payload size for reading, set to 1 MiB.
///
/// Frames with a payload size larger than this limit will be rejected to ensure memory safety
/// and prevent excessively large messages from impacting performance.
pub const MAX_PAYLOAD_READ: usize = 1024 * 1024;

/// Configuration options for a WebSocket connection.
///
/// ```rust
/// use wsframe::Options;
///
/// let options = Options::default()
///     .with_max_payload_read(64 * 1024)
///     .with_utf8();
/// assert_eq!(options.max_payload_read(), 64 * 1024);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Maximum allowed payload size for incoming frames, in bytes.
    ///
    /// The codec rejects a larger frame as soon as its header has been read, before buffering
    /// any of its payload.
    ///
    /// Default: 1 MiB (1,048,576 bytes) as defined in [`MAX_PAYLOAD_READ`]
    pub max_payload_read: Option<usize>,

    /// Whether received text must be valid UTF-8.
    ///
    /// If `true`, a [`Connection`](crate::Connection) reports invalid text as
    /// [`InvalidUTF8`](crate::WebSocketError::InvalidUTF8); otherwise invalid sequences are
    /// replaced with U+FFFD.
    ///
    /// Default: `false`
    pub check_utf8: bool,
}

impl Options {
    /// Sets the maximum payload size accepted for a single incoming frame.
    pub fn with_max_payload_read(self, size: usize) -> Self {
        Self {
            max_payload_read: Some(size),
            ..self
        }
    }

    /// Enables UTF-8 validation for incoming text messages.
    pub fn with_utf8(self) -> Self {
        Self {
            check_utf8: true,
            ..self
        }
    }

    /// The effective payload limit.
    pub fn max_payload_read(&self) -> usize {
        self.max_payload_read.unwrap_or(MAX_PAYLOAD_READ)
    }
}
