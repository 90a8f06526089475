//! Codec boundary and frame splitting.
//!
//! A frame on the wire is a VarInt length prefix followed by that many bytes
//! of packet payload. Turning a payload into a [`Packet`] (and back) is the
//! job of a [`PacketCodec`]; the relay never inspects payload bytes itself.

use bytes::{Buf, Bytes, BytesMut};
use tracing::debug;

use crate::error::ProtoError;
use crate::packet::{Direction, Packet, ProtocolState};
use crate::types::{VarInt, VarIntError};

/// Default maximum frame payload size (2 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 2 * 1024 * 1024;

/// Turns frame payloads into named packets and back.
///
/// Implementations must re-encode a packet they decoded without changes to
/// its fields so that untouched traffic forwards verbatim.
pub trait PacketCodec: Send + Sync {
    fn decode(
        &self,
        state: ProtocolState,
        direction: Direction,
        payload: Bytes,
    ) -> Result<Packet, ProtoError>;

    fn encode(&self, state: ProtocolState, packet: &Packet) -> Result<Bytes, ProtoError>;
}

/// Self-describing codec: each payload is one JSON object
/// `{"name": ..., "fields": ...}`. Used by tests and local tooling.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

#[derive(serde::Serialize, serde::Deserialize)]
struct JsonFrame {
    name: String,
    #[serde(default)]
    fields: serde_json::Value,
}

impl PacketCodec for JsonCodec {
    fn decode(
        &self,
        _state: ProtocolState,
        direction: Direction,
        payload: Bytes,
    ) -> Result<Packet, ProtoError> {
        let frame: JsonFrame = serde_json::from_slice(&payload)?;
        Ok(Packet::new(frame.name, direction, frame.fields))
    }

    fn encode(&self, _state: ProtocolState, packet: &Packet) -> Result<Bytes, ProtoError> {
        let frame = JsonFrame {
            name: packet.name.clone(),
            fields: packet.fields.clone(),
        };
        Ok(Bytes::from(serde_json::to_vec(&frame)?))
    }
}

/// Prefix `payload` with its VarInt length.
pub fn encode_frame(payload: &[u8], max_size: usize) -> Result<Bytes, ProtoError> {
    if payload.len() > max_size {
        debug!(len = payload.len(), max = max_size, "refusing to frame oversized payload");
        return Err(ProtoError::FrameTooLarge {
            size: payload.len(),
            max: max_size,
        });
    }
    let mut buf = BytesMut::with_capacity(payload.len() + VarInt::MAX_BYTES);
    VarInt(payload.len() as i32).encode(&mut buf);
    buf.extend_from_slice(payload);
    Ok(buf.freeze())
}

/// Incremental frame splitter for a byte stream.
pub struct FrameDecoder {
    buf: BytesMut,
    max_size: usize,
}

impl FrameDecoder {
    pub fn new(max_size: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(8 * 1024),
            max_size,
        }
    }

    /// Append bytes read from the stream.
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Pop the next complete frame payload, if one is buffered.
    pub fn next_frame(&mut self) -> Result<Option<Bytes>, ProtoError> {
        let (len, prefix) = match VarInt::decode(&self.buf) {
            Ok((len, prefix)) => (len.0, prefix),
            Err(VarIntError::BufferTooShort) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if len < 0 {
            debug!(len, "negative frame length");
            return Err(ProtoError::InvalidData(format!("negative frame length {len}")));
        }
        let len = len as usize;
        if len > self.max_size {
            debug!(len, max = self.max_size, buffered = self.buf.len(), "oversized frame");
            return Err(ProtoError::FrameTooLarge {
                size: len,
                max: self.max_size,
            });
        }
        if self.buf.len() < prefix + len {
            return Ok(None);
        }
        self.buf.advance(prefix);
        Ok(Some(self.buf.split_to(len).freeze()))
    }

    /// Bytes buffered but not yet returned as a frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn frames_split_across_reads() {
        let a = encode_frame(b"hello", DEFAULT_MAX_FRAME_SIZE).unwrap();
        let b = encode_frame(b"world!", DEFAULT_MAX_FRAME_SIZE).unwrap();
        let mut stream = a.to_vec();
        stream.extend_from_slice(&b);

        let mut decoder = FrameDecoder::new(DEFAULT_MAX_FRAME_SIZE);
        decoder.extend(&stream[..3]);
        assert!(decoder.next_frame().unwrap().is_none());
        decoder.extend(&stream[3..]);
        assert_eq!(&decoder.next_frame().unwrap().unwrap()[..], b"hello");
        assert_eq!(&decoder.next_frame().unwrap().unwrap()[..], b"world!");
        assert!(decoder.next_frame().unwrap().is_none());
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn oversized_frame_rejected() {
        let frame = encode_frame(&[0u8; 64], DEFAULT_MAX_FRAME_SIZE).unwrap();
        let mut decoder = FrameDecoder::new(16);
        decoder.extend(&frame);
        assert!(matches!(
            decoder.next_frame(),
            Err(ProtoError::FrameTooLarge { size: 64, max: 16 })
        ));
        assert!(encode_frame(&[0u8; 64], 16).is_err());
    }

    #[test]
    fn empty_frame_is_valid() {
        let frame = encode_frame(&[], DEFAULT_MAX_FRAME_SIZE).unwrap();
        let mut decoder = FrameDecoder::new(DEFAULT_MAX_FRAME_SIZE);
        decoder.extend(&frame);
        assert_eq!(decoder.next_frame().unwrap().unwrap().len(), 0);
    }

    #[test]
    fn json_codec_preserves_fields() {
        let codec = JsonCodec;
        let pkt = Packet::new(
            "chat",
            Direction::ToClient,
            json!({"message": "{\"text\":\"hi\"}", "position": 0}),
        );
        let bytes = codec.encode(ProtocolState::Play, &pkt).unwrap();
        let back = codec
            .decode(ProtocolState::Play, Direction::ToClient, bytes)
            .unwrap();
        assert_eq!(back, pkt);
    }

    #[test]
    fn json_codec_rejects_garbage() {
        let err = JsonCodec
            .decode(
                ProtocolState::Play,
                Direction::ToServer,
                Bytes::from_static(b"not json"),
            )
            .unwrap_err();
        assert!(matches!(err, ProtoError::Json(_)));
    }
}
