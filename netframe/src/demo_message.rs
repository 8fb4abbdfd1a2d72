//! A minimal demo message type used by the bundled examples and benchmark.
//!
//! `req_id` plus an arbitrary payload is enough to exercise the framing,
//! dispatch, and heartbeat machinery end to end without a real protocol
//! descriptor.

use bytes::{BufMut, BytesMut};
use netframe_proto::message::{FnDecoder, Message, MessageDecoder};
use netframe_proto::pkg_input::PackageInput;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoMessage {
    pub req_id: u32,
    pub payload: Vec<u8>,
}

impl Message for DemoMessage {
    const MSG_TYPE: u16 = 1;

    fn byte_size(&self) -> usize {
        4 + self.payload.len()
    }

    fn serialize_to(&self, buf: &mut BytesMut) -> bool {
        buf.put_u32_le(self.req_id);
        buf.extend_from_slice(&self.payload);
        true
    }
}

/// A [`MessageDecoder`] for [`DemoMessage`], ready to hand to
/// `Dispatch::register`.
#[must_use]
pub fn decoder() -> Box<dyn MessageDecoder> {
    Box::new(FnDecoder::new(
        DemoMessage::MSG_TYPE,
        |input: &mut PackageInput, content_size: u32| {
            if content_size < 4 {
                return None;
            }
            let mut req_id_bytes = [0u8; 4];
            input.read_buffer(&mut req_id_bytes, 4);
            let payload_len = (content_size - 4) as usize;
            let mut payload = vec![0u8; payload_len];
            if payload_len > 0 {
                input.read_buffer(&mut payload, payload_len);
            }
            Some(DemoMessage {
                req_id: u32::from_le_bytes(req_id_bytes),
                payload,
            })
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_serialize_and_decode() {
        let msg = DemoMessage {
            req_id: 1040,
            payload: b"hello".to_vec(),
        };
        let mut buf = BytesMut::new();
        assert!(msg.serialize_to(&mut buf));

        let mut input = PackageInput::new();
        input.append(buf.freeze());
        let decoder = decoder();
        let decoded = decoder
            .decode(&mut input, msg.byte_size() as u32)
            .unwrap()
            .downcast::<DemoMessage>()
            .unwrap();
        assert_eq!(*decoded, msg);
    }
}
