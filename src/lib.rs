//! # wsframe
//! The wire mechanics of the WebSocket protocol (RFC 6455): the accept token derived during the
//! HTTP upgrade handshake, and the binary framing used once the connection has switched protocols.
//!
//! The core is three pure functions:
//!
//! - [`derive_accept_token`]: client `Sec-WebSocket-Key` to `Sec-WebSocket-Accept`.
//! - [`decode_frame`]: one complete frame to its unmasked text payload.
//! - [`encode_frame`]: text to a single FIN text frame, masked when sent by a [`Role::Client`].
//!
//! Around it sit the pieces a server needs to actually talk to a browser:
//!
//! - [`codec`]: an incremental decoder/encoder for [`tokio_util::codec::Framed`], which buffers
//!   partial reads until a whole frame is available.
//! - [`Connection`]: a text-message stream over any `AsyncRead + AsyncWrite`, with an optional
//!   [`Ticker`] that lives exactly as long as the connection.
//! - [`upgrade`]: turns a hyper request into the `101 Switching Protocols` response and a future
//!   resolving to a server-side [`Connection`].
//!
//! # Features
//!
//! - `logging`: debug logging of handshakes and frame processing through the `log` crate.
//! - `simd`: UTF-8 validation of text payloads through `simdutf8`.
//!
//! # Limitations
//! Only single, unfragmented text frames carry meaning. Continuation frames are decoded as plain
//! text without reassembly, `Close` ends a [`Connection`] without a closing handshake, and
//! binary, ping and pong frames are reported as [`WebSocketError::UnsupportedFrame`].
//! No extension (compression, sub-protocols) is ever negotiated.
//!
//! # Example
//! ```rust
//! use wsframe::{decode_frame, derive_accept_token, encode_frame, Role};
//!
//! assert_eq!(
//!     derive_accept_token("dGhlIHNhbXBsZSBub25jZQ=="),
//!     "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
//! );
//!
//! let frame = encode_frame("hello", Role::Client);
//! assert_eq!(decode_frame(&frame).unwrap(), "hello");
//! ```

pub mod codec;
mod connection;
pub mod frame;
pub mod handshake;
mod mask;
mod options;

use thiserror::Error;

pub use connection::{upgrade, Connection, Ticker, UpgradeFut, UpgradeResult};
pub use frame::{decode_frame, encode_frame, Frame, OpCode, Role};
pub use handshake::{derive_accept_token, HttpResponse};
pub use options::{Options, MAX_PAYLOAD_READ};

/// A result type for WebSocket operations, using `WebSocketError` as the error type.
pub type Result<T> = std::result::Result<T, WebSocketError>;

/// Represents errors that can occur while handshaking, decoding or encoding WebSocket traffic.
///
/// Every error is local to the call (or connection) that produced it. A server is expected to
/// log it and drop the offending connection; none of these are worth retrying.
#[derive(Error, Debug)]
pub enum WebSocketError {
    /// A handshake header is missing or its value is not visible ASCII.
    /// Holds the header name.
    #[error("Malformed {0} header")]
    MalformedHeader(&'static str),

    /// The buffer ends before the frame it starts with. `expected` is the number of bytes the
    /// frame needs as far as it could be determined from the bytes `available`.
    #[error("Truncated frame: expected {expected} bytes, got {available}")]
    TruncatedFrame { expected: usize, available: usize },

    /// A well-formed frame whose opcode carries no text message.
    #[error("Unsupported frame (opcode={0:?})")]
    UnsupportedFrame(OpCode),

    /// Indicates that a text frame contains invalid UTF-8 data.
    /// According to RFC 6455, all text payloads must be valid UTF-8.
    #[error("Invalid UTF-8")]
    InvalidUTF8,

    /// Indicates receipt of a frame with a reserved opcode (0x3-0x7 or 0xB-0xF).
    #[error("Invalid opcode (byte={0})")]
    InvalidOpCode(u8),

    /// Reserved bits in the frame header are set. No extension is ever negotiated, so they
    /// must all be zero.
    #[error("Reserved bits are not zero")]
    ReservedBitsNotZero,

    /// The declared payload length exceeds the configured maximum, or cannot be addressed on
    /// this platform.
    #[error("Frame too large")]
    FrameTooLarge,

    /// The `Upgrade` header is missing or is not `websocket`.
    #[error("Invalid upgrade header")]
    InvalidUpgradeHeader,

    /// The `Connection` header is missing or does not contain the `upgrade` token.
    #[error("Invalid connection header")]
    InvalidConnectionHeader,

    /// Returned when the "Sec-WebSocket-Version" header is not set to 13 during handshake.
    #[error("Sec-Websocket-Version must be 13")]
    InvalidSecWebsocketVersion,

    /// Returned when attempting to send on a connection whose transport is gone.
    #[error("Connection is closed")]
    ConnectionClosed,

    /// Wraps standard I/O errors that may occur during WebSocket communication,
    /// such as connection resets.
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// Wraps errors from hyper that may occur while completing the connection upgrade.
    #[error(transparent)]
    HTTPError(#[from] hyper::Error),
}
