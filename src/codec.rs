//! Incremental frame codec for [`tokio_util::codec::Framed`].
//!
//! A transport read may deliver half a header, or a frame and a half. The [`Decoder`] keeps the
//! bytes buffered until a whole frame is present and remembers the parsed header between reads,
//! so each connection can feed it whatever the socket returns.
use bytes::{Buf, BytesMut};
use tokio_util::codec;

use crate::{
    frame::{Frame, Header, Role},
    mask, Options, WebSocketError,
};

/// Represents the reading state of the decoder.
#[derive(Default)]
enum ReadState {
    /// Fewer than [`Header::required_len`] bytes are buffered.
    #[default]
    AwaitingHeader,
    /// The header has been consumed; waiting for `payload_len` bytes.
    AwaitingPayload(Header),
}

/// A combined codec that provides both encoding and decoding functionality for WebSocket frames.
///
/// ```rust
/// use bytes::BytesMut;
/// use tokio_util::codec::Decoder;
/// use wsframe::{codec::Codec, encode_frame, Options, Role};
///
/// let mut codec = Codec::new(Role::Server, &Options::default());
/// let frame = encode_frame("hi", Role::Client);
///
/// let mut src = BytesMut::from(&frame[..3]);
/// assert!(codec.decode(&mut src).unwrap().is_none());
///
/// src.extend_from_slice(&frame[3..]);
/// let decoded = codec.decode(&mut src).unwrap().unwrap();
/// assert_eq!(decoded.as_text().unwrap(), "hi");
/// ```
pub struct Codec {
    decoder: Decoder,
    encoder: Encoder,
}

impl Codec {
    /// Creates the codec of an endpoint taking `role`.
    pub fn new(role: Role, options: &Options) -> Self {
        Self {
            decoder: Decoder::new(options.max_payload_read()),
            encoder: Encoder::new(role),
        }
    }
}

impl From<(Decoder, Encoder)> for Codec {
    fn from((decoder, encoder): (Decoder, Encoder)) -> Self {
        Self { decoder, encoder }
    }
}

impl codec::Decoder for Codec {
    type Item = <Decoder as codec::Decoder>::Item;
    type Error = <Decoder as codec::Decoder>::Error;

    #[inline]
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.decoder.decode(src)
    }
}

impl codec::Encoder<Frame> for Codec {
    type Error = <Encoder as codec::Encoder<Frame>>::Error;

    #[inline]
    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.encoder.encode(item, dst)
    }
}

/// A decoder for WebSocket frames, handling state transitions.
///
/// Decoded frames are unmasked. Their opcode is not interpreted here.
pub struct Decoder {
    /// Current reading state (header or payload).
    state: ReadState,
    /// Maximum allowed size for the frame payload.
    max_payload_size: usize,
}

impl Decoder {
    /// Creates a new `Decoder` rejecting payloads larger than `max_payload_size` bytes.
    pub fn new(max_payload_size: usize) -> Self {
        Self {
            state: ReadState::AwaitingHeader,
            max_payload_size,
        }
    }
}

impl codec::Decoder for Decoder {
    type Item = Frame;
    type Error = WebSocketError;

    /// Decodes WebSocket frames from a `BytesMut` buffer, managing header and payload parsing.
    ///
    /// # Returns
    /// - `Ok(Some(Frame))`: a fully decoded, unmasked `Frame`.
    /// - `Ok(None)`: more data is needed to complete the frame.
    /// - `Err(WebSocketError)`: the bytes cannot be a valid frame.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match std::mem::take(&mut self.state) {
                ReadState::AwaitingHeader => {
                    let Some(header) = Header::parse(src)? else {
                        src.reserve(Header::required_len(src) - src.len());
                        return Ok(None);
                    };

                    if header.payload_len > self.max_payload_size {
                        return Err(WebSocketError::FrameTooLarge);
                    }

                    src.advance(header.header_len);
                    self.state = ReadState::AwaitingPayload(header);
                }
                ReadState::AwaitingPayload(header) => {
                    if src.remaining() < header.payload_len {
                        src.reserve(header.payload_len - src.remaining());
                        self.state = ReadState::AwaitingPayload(header);
                        return Ok(None);
                    }

                    let mut payload = src.split_to(header.payload_len);
                    if let Some(mask) = header.mask {
                        mask::apply_mask(&mut payload, mask);
                    }

                    #[cfg(feature = "logging")]
                    log::trace!(
                        "Decoded {:?} frame (fin={} len={})",
                        header.opcode,
                        header.fin,
                        header.payload_len
                    );

                    break Ok(Some(Frame::new(header.fin, header.opcode, None, payload)));
                }
            }
        }
    }
}

/// WebSocket frame encoder for serializing `Frame` instances into a buffer.
///
/// Every frame is given the masking policy of the encoder's [`Role`] before it is written.
pub struct Encoder {
    role: Role,
}

impl Encoder {
    pub fn new(role: Role) -> Self {
        Self { role }
    }
}

impl codec::Encoder<Frame> for Encoder {
    type Error = WebSocketError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        frame.for_role(self.role).encode(dst);
        Ok(())
    }
}
