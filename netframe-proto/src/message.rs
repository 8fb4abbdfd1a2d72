//! The message (de)serialization contract and the carrier handed to the
//! consumer's `on_message` hook.
//!
//! A message type is free to use whatever serialization it wants (the
//! package header only carries a `content_specific_value` tag and a byte
//! count); `dispatch.rs` maps that tag to the right [`MessageDecoder`].

use crate::pkg_input::PackageInput;
use bytes::{Bytes, BytesMut};
use std::any::Any;
use std::marker::PhantomData;

/// A concrete wire message. `MSG_TYPE` is stamped into the package header's
/// `content_specific_value` field so a peer's dispatch registry can find
/// the matching decoder.
pub trait Message: Send + 'static {
    const MSG_TYPE: u16;

    fn byte_size(&self) -> usize;

    /// Append the serialized body to `buf`. Returns `false` on a codec
    /// failure (the caller treats this the same as a short serialize).
    fn serialize_to(&self, buf: &mut BytesMut) -> bool;
}

/// Parses exactly `content_size` bytes of one message body out of the
/// shared input stream. `decode` returns `None` on a malformed body; the
/// parse loop treats that the same as a short parse and shuts down with
/// `InvalidInputPackage`.
pub trait MessageDecoder: Send + Sync {
    fn msg_type(&self) -> u16;
    fn decode(&self, input: &mut PackageInput, content_size: u32) -> Option<Box<dyn Any + Send>>;
}

/// Adapts a plain parse function into a [`MessageDecoder`] without
/// requiring a dedicated struct per message type.
pub struct FnDecoder<M, F> {
    msg_type: u16,
    parse: F,
    _marker: PhantomData<fn() -> M>,
}

impl<M, F> FnDecoder<M, F>
where
    M: Send + 'static,
    F: Fn(&mut PackageInput, u32) -> Option<M> + Send + Sync,
{
    pub fn new(msg_type: u16, parse: F) -> Self {
        Self {
            msg_type,
            parse,
            _marker: PhantomData,
        }
    }
}

impl<M, F> MessageDecoder for FnDecoder<M, F>
where
    M: Send + 'static,
    F: Fn(&mut PackageInput, u32) -> Option<M> + Send + Sync,
{
    fn msg_type(&self) -> u16 {
        self.msg_type
    }

    fn decode(&self, input: &mut PackageInput, content_size: u32) -> Option<Box<dyn Any + Send>> {
        (self.parse)(input, content_size).map(|m| Box::new(m) as Box<dyn Any + Send>)
    }
}

/// Delivered to `on_message`: the decoded message by value (type-erased;
/// recover it with [`MessageCarrier::downcast`]) plus any attached opaque
/// binary payload that rode alongside the body.
pub struct MessageCarrier {
    pub msg_type: u16,
    message: Box<dyn Any + Send>,
    pub attached_buffer: Option<Bytes>,
}

impl MessageCarrier {
    #[must_use]
    pub fn new(msg_type: u16, message: Box<dyn Any + Send>, attached_buffer: Option<Bytes>) -> Self {
        Self {
            msg_type,
            message,
            attached_buffer,
        }
    }

    /// Downcast the type-erased message back to its concrete type,
    /// returning `self` unchanged on a type mismatch.
    pub fn downcast<M: 'static>(self) -> Result<M, Self> {
        match self.message.downcast::<M>() {
            Ok(boxed) => Ok(*boxed),
            Err(message) => Err(Self {
                msg_type: self.msg_type,
                message,
                attached_buffer: self.attached_buffer,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    struct Ping {
        seq: u32,
    }

    impl Message for Ping {
        const MSG_TYPE: u16 = 1;

        fn byte_size(&self) -> usize {
            4
        }

        fn serialize_to(&self, buf: &mut BytesMut) -> bool {
            buf.extend_from_slice(&self.seq.to_le_bytes());
            true
        }
    }

    #[test]
    fn carrier_downcast_round_trips() {
        let carrier = MessageCarrier::new(Ping::MSG_TYPE, Box::new(Ping { seq: 7 }), None);
        let ping = carrier.downcast::<Ping>().unwrap();
        assert_eq!(ping, Ping { seq: 7 });
    }

    #[test]
    fn carrier_downcast_mismatch_returns_self() {
        let carrier = MessageCarrier::new(Ping::MSG_TYPE, Box::new(Ping { seq: 1 }), None);
        let err = carrier.downcast::<u32>().unwrap_err();
        assert_eq!(err.msg_type, Ping::MSG_TYPE);
    }

    #[test]
    fn fn_decoder_parses_fixed_width_body() {
        use crate::pkg_input::PackageInput;
        let decoder = FnDecoder::new(Ping::MSG_TYPE, |input, content_size| {
            if content_size != 4 {
                return None;
            }
            let mut raw = [0u8; 4];
            input.read_buffer(&mut raw, 4);
            Some(Ping { seq: u32::from_le_bytes(raw) })
        });

        let mut input = PackageInput::new();
        input.append(Bytes::from_static(&42u32.to_le_bytes()));
        let decoded = decoder.decode(&mut input, 4).unwrap();
        let ping = decoded.downcast::<Ping>().unwrap();
        assert_eq!(*ping, Ping { seq: 42 });
    }
}
