//! # Frame
//!
//! WebSocket frames as defined in [RFC 6455 Section 5.2](https://datatracker.ietf.org/doc/html/rfc6455#section-5.2).
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |F|R|R|R| opcode|M| Payload len |    Extended payload length    |
//! |I|S|S|S|  (4)  |A|     (7)     |         (16 or 64 bits)       |
//! |N|V|V|V|       |S|             |                               |
//! | |1|2|3|       |K|             |                               |
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |        Extended payload length continued, if payload len == 127|
//! +---------------------------------------------------------------+
//! |                               |   Masking-key, if MASK set to 1|
//! +-------------------------------+-------------------------------+
//! |     Masking-key (continued)       |          Payload Data      |
//! +-----------------------------------+ - - - - - - - - - - - - - -+
//! :                     Payload Data continued ...                :
//! +---------------------------------------------------------------+
//! ```
//!
//! The payload length is stored in one of three classes:
//!
//! - `0..=125`: directly in the 7-bit field.
//! - `126..=65535`: 7-bit field set to 126, followed by a big-endian `u16`.
//! - `65536..`: 7-bit field set to 127, followed by a big-endian `u64`.
//!
//! Frames sent by a [`Role::Client`] carry a 4-byte masking key and their payload is XORed with
//! it; frames sent by a [`Role::Server`] are never masked.
//!
//! The two entry points most callers need are [`decode_frame`] and [`encode_frame`]. [`Frame`]
//! and [`Header`] expose the same machinery for callers that care about opcodes, FIN or masks.
//!
//! ```rust
//! use wsframe::frame::{decode_frame, encode_frame, Role};
//!
//! let bytes = encode_frame("Hello, WebSocket!", Role::Server);
//! assert_eq!(&bytes[..2], &[0x81, 17]);
//! assert_eq!(decode_frame(&bytes).unwrap(), "Hello, WebSocket!");
//! ```
use bytes::{Bytes, BytesMut};

use crate::{mask, Result, WebSocketError};

/// WebSocket operation code (OpCode) that determines the semantic meaning of a frame.
///
/// The numeric values are defined in [RFC 6455, Section 11.8](https://datatracker.ietf.org/doc/html/rfc6455#section-11.8):
/// - Continuation = 0x0
/// - Text = 0x1
/// - Binary = 0x2
/// - Close = 0x8
/// - Ping = 0x9
/// - Pong = 0xA
///
/// The ranges 0x3-0x7 and 0xB-0xF are reserved and rejected while parsing.
///
/// Only `Text` (and `Continuation`, read as plain text) carry messages in this crate; the rest
/// are modelled so that a parsed frame always says what it is.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OpCode {
    Continuation,
    Text,
    Binary,
    Close,
    Ping,
    Pong,
}

impl OpCode {
    /// Returns `true` if the `OpCode` represents a control frame (`Close`, `Ping`, or `Pong`).
    pub fn is_control(&self) -> bool {
        matches!(*self, OpCode::Close | OpCode::Ping | OpCode::Pong)
    }

    /// Returns `true` for the opcodes whose payload is read as text.
    pub fn is_text(&self) -> bool {
        matches!(*self, OpCode::Text | OpCode::Continuation)
    }
}

impl TryFrom<u8> for OpCode {
    type Error = WebSocketError;

    /// Interprets the low nibble of the first header byte.
    /// Reserved values result in a `WebSocketError::InvalidOpCode` error.
    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0x0 => Ok(Self::Continuation),
            0x1 => Ok(Self::Text),
            0x2 => Ok(Self::Binary),
            0x8 => Ok(Self::Close),
            0x9 => Ok(Self::Ping),
            0xA => Ok(Self::Pong),
            _ => Err(WebSocketError::InvalidOpCode(value)),
        }
    }
}

impl From<OpCode> for u8 {
    fn from(val: OpCode) -> Self {
        match val {
            OpCode::Continuation => 0x0,
            OpCode::Text => 0x1,
            OpCode::Binary => 0x2,
            OpCode::Close => 0x8,
            OpCode::Ping => 0x9,
            OpCode::Pong => 0xA,
        }
    }
}

/// The role of the endpoint sending a frame.
///
/// When a server role is taken the frames will not be masked, unlike
/// the client role, in which frames are masked.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Role {
    Server,
    Client,
}

impl Role {
    /// Whether frames sent under this role carry a masking key.
    #[inline]
    pub fn masks(self) -> bool {
        self == Role::Client
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Server => write!(f, "server"),
            Self::Client => write!(f, "client"),
        }
    }
}

/// Two base bytes, an 8-byte extended length and a 4-byte mask.
pub(crate) const MAX_HEAD_SIZE: usize = 14;

/// Everything that precedes the payload of a frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Header {
    /// Final fragment flag.
    pub fin: bool,
    /// The frame type.
    pub opcode: OpCode,
    /// The masking key, present iff the MASK bit is set.
    pub mask: Option<[u8; 4]>,
    /// Payload length decoded from whichever length class the frame uses.
    pub payload_len: usize,
    /// Size of the header itself: 2 base bytes, the extended length and the mask.
    pub header_len: usize,
}

impl Header {
    /// Number of header bytes the frame starting at `buf` needs.
    ///
    /// Until the first two bytes are available only those two are known to be needed.
    pub fn required_len(buf: &[u8]) -> usize {
        if buf.len() < 2 {
            return 2;
        }

        let extra = match buf[1] & 0x7F {
            126 => 2,
            127 => 8,
            _ => 0,
        };
        let mask = if buf[1] & 0x80 != 0 { 4 } else { 0 };
        2 + extra + mask
    }

    /// Parses the header the buffer starts with.
    ///
    /// # Returns
    /// - `Ok(Some(Header))` once the whole header is present.
    /// - `Ok(None)` if `buf` is shorter than [`Header::required_len`].
    /// - `Err(WebSocketError)` on reserved bits, reserved opcodes, or a 64-bit length that does
    ///   not fit in `usize`.
    pub fn parse(buf: &[u8]) -> Result<Option<Self>> {
        if buf.len() < 2 {
            return Ok(None);
        }

        if buf[0] & 0b0111_0000 != 0 {
            return Err(WebSocketError::ReservedBitsNotZero);
        }

        let fin = buf[0] & 0b1000_0000 != 0;
        let opcode = OpCode::try_from(buf[0] & 0b0000_1111)?;
        let masked = buf[1] & 0b1000_0000 != 0;

        let header_len = Self::required_len(buf);
        if buf.len() < header_len {
            return Ok(None);
        }

        let (payload_len, mask_at) = match buf[1] & 0x7F {
            126 => (usize::from(u16::from_be_bytes([buf[2], buf[3]])), 4),
            127 => {
                let mut len = [0u8; 8];
                len.copy_from_slice(&buf[2..10]);
                let len = usize::try_from(u64::from_be_bytes(len))
                    .map_err(|_| WebSocketError::FrameTooLarge)?;
                (len, 10)
            }
            code => (usize::from(code), 2),
        };

        let mask = masked.then(|| {
            [
                buf[mask_at],
                buf[mask_at + 1],
                buf[mask_at + 2],
                buf[mask_at + 3],
            ]
        });

        Ok(Some(Self {
            fin,
            opcode,
            mask,
            payload_len,
            header_len,
        }))
    }

    /// Header plus payload, or `None` if that overflows `usize`.
    #[inline]
    pub fn frame_len(&self) -> Option<usize> {
        self.header_len.checked_add(self.payload_len)
    }
}

/// A WebSocket frame.
///
/// The payload is always held unmasked. The masking key, if any, is applied to a copy of the
/// payload while the frame is [encoded](Frame::encode), and removed from a private copy of the
/// wire bytes while it is [parsed](Frame::parse).
#[derive(Debug, Clone)]
pub struct Frame {
    /// Indicates if this is the final frame in a message.
    pub fin: bool,
    /// The opcode of the frame, defining its type.
    pub opcode: OpCode,
    /// The masking key used when this frame is encoded.
    mask: Option<[u8; 4]>,
    /// The unmasked payload.
    pub payload: BytesMut,
}

impl Frame {
    /// Creates a new WebSocket `Frame`.
    ///
    /// # Parameters
    /// - `fin`: Indicates if this frame is the final fragment in a message.
    /// - `opcode`: The operation code of the frame.
    /// - `mask`: Optional 4-byte masking key to apply when encoding.
    /// - `payload`: The unmasked frame payload.
    pub fn new(
        fin: bool,
        opcode: OpCode,
        mask: Option<[u8; 4]>,
        payload: impl Into<BytesMut>,
    ) -> Self {
        Self {
            fin,
            opcode,
            mask,
            payload: payload.into(),
        }
    }

    /// A final, unmasked text frame.
    pub fn text(payload: impl Into<BytesMut>) -> Self {
        Self::new(true, OpCode::Text, None, payload)
    }

    /// The key this frame will be masked with when encoded.
    #[inline]
    pub fn mask_key(&self) -> Option<[u8; 4]> {
        self.mask
    }

    #[inline]
    pub fn is_masked(&self) -> bool {
        self.mask.is_some()
    }

    /// Applies the masking policy of the sending `role`.
    ///
    /// A client frame keeps its key if it already has one and otherwise gets a fresh random
    /// key; a server frame loses any key it had.
    pub fn for_role(self, role: Role) -> Self {
        let mask = if role.masks() {
            Some(self.mask.unwrap_or_else(rand::random))
        } else {
            None
        };
        Self { mask, ..self }
    }

    /// Parses the frame `buf` starts with.
    ///
    /// The payload is copied out of `buf` before it is unmasked, so `buf` is never modified.
    /// Bytes after the frame are left alone; the returned length says where they start.
    ///
    /// # Errors
    /// - `TruncatedFrame` if `buf` ends before the header or payload does.
    /// - Any error from [`Header::parse`].
    pub fn parse(buf: &[u8]) -> Result<(Self, usize)> {
        let header = Header::parse(buf)?.ok_or_else(|| WebSocketError::TruncatedFrame {
            expected: Header::required_len(buf),
            available: buf.len(),
        })?;

        let frame_len = header.frame_len().ok_or(WebSocketError::FrameTooLarge)?;
        if buf.len() < frame_len {
            return Err(WebSocketError::TruncatedFrame {
                expected: frame_len,
                available: buf.len(),
            });
        }

        let mut payload = BytesMut::from(&buf[header.header_len..frame_len]);
        if let Some(mask) = header.mask {
            mask::apply_mask(&mut payload, mask);
        }

        Ok((
            Self::new(header.fin, header.opcode, None, payload),
            frame_len,
        ))
    }

    /// Borrows the payload as text.
    ///
    /// # Errors
    /// - `UnsupportedFrame` unless the opcode is `Text` or `Continuation`.
    /// - `InvalidUTF8` if the payload is not valid UTF-8.
    pub fn as_text(&self) -> Result<&str> {
        if !self.opcode.is_text() {
            return Err(WebSocketError::UnsupportedFrame(self.opcode));
        }

        from_utf8(&self.payload)
    }

    /// Like [`Frame::as_text`], but takes ownership of the text.
    pub fn into_text(self) -> Result<String> {
        self.as_text().map(str::to_owned)
    }

    /// Number of bytes [`Frame::encode`] will write.
    #[inline]
    pub fn encoded_len(&self) -> usize {
        let mut head = [0; MAX_HEAD_SIZE];
        self.fmt_head(&mut head) + self.payload.len()
    }

    /// Serializes the frame into `dst`, masking a copy of the payload if a key is set.
    pub fn encode(&self, dst: &mut BytesMut) {
        let mut head = [0; MAX_HEAD_SIZE];
        let size = self.fmt_head(&mut head);

        dst.reserve(size + self.payload.len());
        dst.extend_from_slice(&head[..size]);

        match self.mask {
            Some(mask) => mask::extend_masked(dst, &self.payload, mask),
            None => dst.extend_from_slice(&self.payload),
        }
    }

    /// Formats the frame header into the provided `head` buffer and returns its size.
    ///
    /// # Panics
    /// Panics if `head` is shorter than [`MAX_HEAD_SIZE`].
    pub(crate) fn fmt_head(&self, head: &mut [u8]) -> usize {
        head[0] = (self.fin as u8) << 7 | u8::from(self.opcode);

        let len = self.payload.len();
        let size = if len < 126 {
            head[1] = len as u8;
            2
        } else if len < 65536 {
            head[1] = 126;
            head[2..4].copy_from_slice(&(len as u16).to_be_bytes());
            4
        } else {
            head[1] = 127;
            head[2..10].copy_from_slice(&(len as u64).to_be_bytes());
            10
        };

        if let Some(mask) = self.mask {
            head[1] |= 0x80;
            head[size..size + 4].copy_from_slice(&mask);
            size + 4
        } else {
            size
        }
    }
}

#[inline]
fn from_utf8(payload: &[u8]) -> Result<&str> {
    #[cfg(feature = "simd")]
    {
        simdutf8::basic::from_utf8(payload).map_err(|_| WebSocketError::InvalidUTF8)
    }
    #[cfg(not(feature = "simd"))]
    {
        std::str::from_utf8(payload).map_err(|_| WebSocketError::InvalidUTF8)
    }
}

/// Decodes the text payload of the frame `buf` starts with.
///
/// `buf` must hold the whole frame; a short buffer fails with
/// [`WebSocketError::TruncatedFrame`] rather than waiting for more data. Use
/// [`codec::Decoder`](crate::codec::Decoder) to accumulate partial reads.
///
/// Masked frames are unmasked on a private copy. FIN is not inspected, and a `Continuation`
/// frame is read as plain text without reassembly. Any other non-text opcode is reported as
/// [`WebSocketError::UnsupportedFrame`].
///
/// ```rust
/// use wsframe::decode_frame;
///
/// // RFC 6455 section 5.7: a masked "Hello"
/// let frame = [0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d, 0x7f, 0x9f, 0x4d, 0x51, 0x58];
/// assert_eq!(decode_frame(&frame).unwrap(), "Hello");
/// ```
pub fn decode_frame(buf: &[u8]) -> Result<String> {
    let (frame, _) = Frame::parse(buf)?;
    frame.into_text()
}

/// Encodes `message` as one final text frame sent by `role`.
///
/// Client frames get a fresh random masking key; server frames are unmasked.
///
/// ```rust
/// use wsframe::{encode_frame, Role};
///
/// let frame = encode_frame("", Role::Server);
/// assert_eq!(&frame[..], &[0x81, 0x00]);
/// ```
pub fn encode_frame(message: &str, role: Role) -> Bytes {
    let frame = Frame::text(message).for_role(role);

    let mut dst = BytesMut::with_capacity(frame.encoded_len());
    frame.encode(&mut dst);
    dst.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    mod opcode_tests {
        use super::*;

        #[test]
        fn test_is_control() {
            assert!(OpCode::Close.is_control());
            assert!(OpCode::Ping.is_control());
            assert!(OpCode::Pong.is_control());

            assert!(!OpCode::Continuation.is_control());
            assert!(!OpCode::Text.is_control());
            assert!(!OpCode::Binary.is_control());
        }

        #[test]
        fn test_try_from_u8() {
            assert_eq!(OpCode::try_from(0x0).unwrap(), OpCode::Continuation);
            assert_eq!(OpCode::try_from(0x1).unwrap(), OpCode::Text);
            assert_eq!(OpCode::try_from(0x2).unwrap(), OpCode::Binary);
            assert_eq!(OpCode::try_from(0x8).unwrap(), OpCode::Close);
            assert_eq!(OpCode::try_from(0x9).unwrap(), OpCode::Ping);
            assert_eq!(OpCode::try_from(0xA).unwrap(), OpCode::Pong);

            for code in [0x3, 0x4, 0x5, 0x6, 0x7, 0xB, 0xC, 0xD, 0xE, 0xF] {
                assert!(matches!(
                    OpCode::try_from(code),
                    Err(WebSocketError::InvalidOpCode(c)) if c == code
                ));
            }
        }

        #[test]
        fn test_opcode_to_u8() {
            for code in [0x0, 0x1, 0x2, 0x8, 0x9, 0xA] {
                assert_eq!(u8::from(OpCode::try_from(code).unwrap()), code);
            }
        }
    }

    mod header_tests {
        use super::*;

        #[test]
        fn test_needs_two_bytes() {
            assert_eq!(Header::parse(&[]).unwrap(), None);
            assert_eq!(Header::parse(&[0x81]).unwrap(), None);
            assert_eq!(Header::required_len(&[0x81]), 2);
        }

        #[test]
        fn test_required_len_per_class() {
            assert_eq!(Header::required_len(&[0x81, 0x05]), 2);
            assert_eq!(Header::required_len(&[0x81, 0x85]), 6);
            assert_eq!(Header::required_len(&[0x81, 126]), 4);
            assert_eq!(Header::required_len(&[0x81, 0x80 | 126]), 8);
            assert_eq!(Header::required_len(&[0x81, 127]), 10);
            assert_eq!(Header::required_len(&[0x81, 0x80 | 127]), 14);
        }

        #[test]
        fn test_waits_for_extended_length_and_mask() {
            assert_eq!(Header::parse(&[0x81, 126, 0x01]).unwrap(), None);
            assert_eq!(Header::parse(&[0x81, 0x85, 1, 2, 3]).unwrap(), None);
        }

        #[test]
        fn test_parse_masked_extended() {
            let buf = [0x01, 0x80 | 126, 0x01, 0x00, 0xA, 0xB, 0xC, 0xD];
            let header = Header::parse(&buf).unwrap().unwrap();

            assert!(!header.fin);
            assert_eq!(header.opcode, OpCode::Text);
            assert_eq!(header.mask, Some([0xA, 0xB, 0xC, 0xD]));
            assert_eq!(header.payload_len, 256);
            assert_eq!(header.header_len, 8);
            assert_eq!(header.frame_len(), Some(264));
        }

        #[test]
        fn test_parse_64bit_length() {
            let mut buf = vec![0x82, 127];
            buf.extend_from_slice(&65536u64.to_be_bytes());
            let header = Header::parse(&buf).unwrap().unwrap();

            assert_eq!(header.opcode, OpCode::Binary);
            assert_eq!(header.mask, None);
            assert_eq!(header.payload_len, 65536);
            assert_eq!(header.header_len, 10);
        }

        #[test]
        fn test_reserved_bits() {
            for first in [0xC1, 0xA1, 0x91] {
                assert!(matches!(
                    Header::parse(&[first, 0x00]),
                    Err(WebSocketError::ReservedBitsNotZero)
                ));
            }
        }

        #[test]
        fn test_reserved_opcode() {
            assert!(matches!(
                Header::parse(&[0x83, 0x00]),
                Err(WebSocketError::InvalidOpCode(0x3))
            ));
        }
    }

    mod decode_tests {
        use super::*;

        #[test]
        fn test_unmasked_hello() {
            let frame = [0x81, 0x05, 0x48, 0x65, 0x6c, 0x6c, 0x6f];
            assert_eq!(decode_frame(&frame).unwrap(), "Hello");
        }

        #[test]
        fn test_masked_hello_leaves_input() {
            let frame = [
                0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d, 0x7f, 0x9f, 0x4d, 0x51, 0x58,
            ];
            let copy = frame;

            assert_eq!(decode_frame(&frame).unwrap(), "Hello");
            assert_eq!(frame, copy);
        }

        #[test]
        fn test_known_mask_long_payload() {
            let mask = [0x01, 0x80, 0xFE, 0x7F];
            let payload = "é".repeat(200);

            let mut buf = vec![0x81, 0x80 | 126];
            buf.extend_from_slice(&(payload.len() as u16).to_be_bytes());
            buf.extend_from_slice(&mask);
            buf.extend(
                payload
                    .bytes()
                    .enumerate()
                    .map(|(i, byte)| byte ^ mask[i % 4]),
            );

            assert_eq!(decode_frame(&buf).unwrap(), payload);
        }

        #[test]
        fn test_empty_buffer() {
            assert!(matches!(
                decode_frame(&[]),
                Err(WebSocketError::TruncatedFrame {
                    expected: 2,
                    available: 0
                })
            ));
        }

        #[test]
        fn test_truncated_header() {
            assert!(matches!(
                decode_frame(&[0x81, 0x85, 0x37, 0xfa]),
                Err(WebSocketError::TruncatedFrame {
                    expected: 6,
                    available: 4
                })
            ));
        }

        #[test]
        fn test_truncated_payload() {
            assert!(matches!(
                decode_frame(&[0x81, 0x05, 0x48, 0x65]),
                Err(WebSocketError::TruncatedFrame {
                    expected: 7,
                    available: 4
                })
            ));

            let mut buf = vec![0x81, 127];
            buf.extend_from_slice(&65536u64.to_be_bytes());
            buf.extend_from_slice(&[b'a'; 100]);
            assert!(matches!(
                decode_frame(&buf),
                Err(WebSocketError::TruncatedFrame {
                    expected: 65546,
                    available: 110
                })
            ));
        }

        #[test]
        fn test_length_overflow() {
            let mut buf = vec![0x81, 127];
            buf.extend_from_slice(&u64::MAX.to_be_bytes());
            assert!(matches!(
                decode_frame(&buf),
                Err(WebSocketError::FrameTooLarge)
            ));
        }

        #[test]
        fn test_invalid_utf8() {
            let frame = [0x81, 0x03, 0xFF, 0xFE, 0xFD];
            assert!(matches!(
                decode_frame(&frame),
                Err(WebSocketError::InvalidUTF8)
            ));
        }

        #[test]
        fn test_non_text_opcodes() {
            for (first, opcode) in [
                (0x82, OpCode::Binary),
                (0x88, OpCode::Close),
                (0x89, OpCode::Ping),
                (0x8A, OpCode::Pong),
            ] {
                match decode_frame(&[first, 0x00]) {
                    Err(WebSocketError::UnsupportedFrame(got)) => assert_eq!(got, opcode),
                    other => panic!("unexpected {other:?}"),
                }
            }
        }

        #[test]
        fn test_continuation_and_non_final_read_as_text() {
            assert_eq!(decode_frame(&[0x00, 0x02, b'h', b'i']).unwrap(), "hi");
            assert_eq!(decode_frame(&[0x01, 0x02, b'h', b'i']).unwrap(), "hi");
        }

        #[test]
        fn test_parse_reports_consumed_bytes() {
            let mut buf = encode_frame("first", Role::Client).to_vec();
            let first_len = buf.len();
            buf.extend_from_slice(&encode_frame("second", Role::Server));

            let (frame, consumed) = Frame::parse(&buf).unwrap();
            assert_eq!(consumed, first_len);
            assert_eq!(frame.as_text().unwrap(), "first");
            assert!(!frame.is_masked());

            let (frame, _) = Frame::parse(&buf[consumed..]).unwrap();
            assert_eq!(frame.into_text().unwrap(), "second");
        }
    }

    mod encode_tests {
        use super::*;

        fn header_and_payload(frame: &[u8]) -> (usize, Option<[u8; 4]>, Vec<u8>) {
            let header = Header::parse(frame).unwrap().unwrap();
            assert_eq!(frame.len(), header.frame_len().unwrap());
            (
                header.payload_len,
                header.mask,
                frame[header.header_len..].to_vec(),
            )
        }

        #[test]
        fn test_empty_message() {
            let frame = encode_frame("", Role::Server);
            assert_eq!(&frame[..], &[0x81, 0x00]);
            assert_eq!(decode_frame(&frame).unwrap(), "");
        }

        #[test]
        fn test_server_frame_is_verbatim() {
            let frame = encode_frame("Hello", Role::Server);
            assert_eq!(&frame[..], &[0x81, 0x05, 0x48, 0x65, 0x6c, 0x6c, 0x6f]);
        }

        #[test]
        fn test_client_frame_is_masked() {
            let message = "masked payload";
            let frame = encode_frame(message, Role::Client);

            assert_eq!(frame[0], 0x81);
            assert_eq!(frame[1], 0x80 | message.len() as u8);

            let (len, mask, payload) = header_and_payload(&frame);
            let mask = mask.unwrap();
            assert_eq!(len, message.len());
            for (i, byte) in payload.iter().enumerate() {
                assert_eq!(*byte ^ mask[i % 4], message.as_bytes()[i]);
            }
            assert_eq!(decode_frame(&frame).unwrap(), message);
        }

        #[test]
        fn test_client_mask_varies() {
            let masks: HashSet<[u8; 4]> = (0..16)
                .map(|_| {
                    let frame = encode_frame("same message", Role::Client);
                    assert_eq!(decode_frame(&frame).unwrap(), "same message");
                    header_and_payload(&frame).1.unwrap()
                })
                .collect();
            assert!(masks.len() > 1);
        }

        #[test]
        fn test_length_125() {
            let message = "a".repeat(125);
            let frame = encode_frame(&message, Role::Server);

            assert_eq!(frame[1], 125);
            assert_eq!(frame.len(), 2 + 125);
            assert_eq!(decode_frame(&frame).unwrap(), message);
        }

        #[test]
        fn test_length_126() {
            let message = "b".repeat(126);
            let frame = encode_frame(&message, Role::Server);

            assert_eq!(frame[1], 126);
            assert_eq!(u16::from_be_bytes([frame[2], frame[3]]), 126);
            assert_eq!(frame.len(), 4 + 126);
            assert_eq!(decode_frame(&frame).unwrap(), message);

            let frame = encode_frame(&message, Role::Client);
            assert_eq!(frame[1], 0x80 | 126);
            assert_eq!(u16::from_be_bytes([frame[2], frame[3]]), 126);
            assert_eq!(frame.len(), 4 + 4 + 126);
        }

        #[test]
        fn test_length_65535() {
            let message = "c".repeat(65535);
            let frame = encode_frame(&message, Role::Server);

            assert_eq!(frame[1], 126);
            assert_eq!(u16::from_be_bytes([frame[2], frame[3]]), 65535);
        }

        #[test]
        fn test_length_65536() {
            let message = "d".repeat(65536);
            let frame = encode_frame(&message, Role::Server);

            assert_eq!(frame[1], 127);
            let mut len = [0u8; 8];
            len.copy_from_slice(&frame[2..10]);
            assert_eq!(u64::from_be_bytes(len), 65536);
            assert_eq!(frame.len(), 10 + 65536);
            assert_eq!(decode_frame(&frame).unwrap(), message);

            let frame = encode_frame(&message, Role::Client);
            assert_eq!(frame[1], 0x80 | 127);
            assert_eq!(frame.len(), 10 + 4 + 65536);
            assert_eq!(decode_frame(&frame).unwrap(), message);
        }

        #[test]
        fn test_multibyte_length_counts_bytes() {
            let message = "héllo wörld ✓";
            let frame = encode_frame(message, Role::Server);
            assert_eq!(frame[1] as usize, message.len());
            assert_eq!(decode_frame(&frame).unwrap(), message);
        }

        #[test]
        fn test_fixed_mask_encode() {
            let frame = Frame::text("Hello")
                .for_role(Role::Server)
                .for_role(Role::Client);
            assert!(frame.is_masked());

            let frame = Frame::new(true, OpCode::Text, Some([0x37, 0xfa, 0x21, 0x3d]), "Hello");
            let mut dst = BytesMut::new();
            frame.encode(&mut dst);

            assert_eq!(
                &dst[..],
                &[0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d, 0x7f, 0x9f, 0x4d, 0x51, 0x58]
            );
            assert_eq!(&frame.payload[..], b"Hello");
            assert_eq!(frame.encoded_len(), dst.len());
        }

        #[test]
        fn test_encoded_len_matches_output_at_length_boundaries() {
            for len in [0, 125, 126, 127, 65535, 65536] {
                let payload = "a".repeat(len);
                for mask in [None, Some([9, 8, 7, 6])] {
                    let frame = Frame::new(true, OpCode::Text, mask, payload.as_str());
                    let mut dst = BytesMut::new();
                    frame.encode(&mut dst);
                    assert_eq!(frame.encoded_len(), dst.len(), "len {len} mask {mask:?}");
                }
            }
        }

        #[test]
        fn test_for_role_keeps_client_key_and_strips_server_key() {
            let key = [1, 2, 3, 4];
            let frame = Frame::new(true, OpCode::Text, Some(key), "x");
            assert_eq!(frame.clone().for_role(Role::Client).mask_key(), Some(key));
            assert_eq!(frame.for_role(Role::Server).mask_key(), None);
        }

        #[test]
        fn test_fmt_head_control_frame() {
            let frame = Frame::new(true, OpCode::Ping, None, "");
            let mut head = [0u8; MAX_HEAD_SIZE];
            assert_eq!(frame.fmt_head(&mut head), 2);
            assert_eq!(&head[..2], &[0x89, 0x00]);
        }
    }
}
