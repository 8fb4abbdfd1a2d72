//! Message-type registry: maps `content_specific_value` to a decoder.
//!
//! The source generates this dispatch from a protocol descriptor via
//! templates; here it is a plain registry keyed by an integer tag,
//! populated once at entry-construction time with `register`.

use crate::message::MessageDecoder;
use hashbrown::HashMap;

/// Registry of message decoders keyed by wire type tag.
#[derive(Default)]
pub struct Dispatch {
    decoders: HashMap<u16, Box<dyn MessageDecoder>>,
}

impl Dispatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a decoder for `decoder.msg_type()`. Replaces any previous
    /// registration for the same tag.
    pub fn register(&mut self, decoder: Box<dyn MessageDecoder>) {
        self.decoders.insert(decoder.msg_type(), decoder);
    }

    #[must_use]
    pub fn get(&self, msg_type: u16) -> Option<&dyn MessageDecoder> {
        self.decoders.get(&msg_type).map(std::convert::AsRef::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::FnDecoder;
    use crate::pkg_input::PackageInput;

    #[test]
    fn register_and_look_up_by_tag() {
        let mut dispatch = Dispatch::new();
        dispatch.register(Box::new(FnDecoder::new(5, |_input: &mut PackageInput, _size| {
            Some(5u32)
        })));
        assert!(dispatch.get(5).is_some());
        assert!(dispatch.get(6).is_none());
    }

    #[test]
    fn re_registering_same_tag_replaces() {
        let mut dispatch = Dispatch::new();
        dispatch.register(Box::new(FnDecoder::new(1, |_: &mut PackageInput, _| Some(1u32))));
        dispatch.register(Box::new(FnDecoder::new(1, |_: &mut PackageInput, _| Some(2u32))));
        assert_eq!(dispatch.decoders.len(), 1);
    }
}
