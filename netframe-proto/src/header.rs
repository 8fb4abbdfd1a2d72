//! The fixed 16-byte package header.
//!
//! Layout (all fields little-endian):
//!
//! | offset | size | field                    |
//! |-------:|-----:|--------------------------|
//! |      0 |    1 | `pkg_content_type`       |
//! |      1 |    1 | `header_size_dwords`     |
//! |      2 |    2 | `content_specific_value` |
//! |      4 |    4 | `content_size`           |
//! |      8 |    4 | `attached_binary_size`   |
//! |     12 |    4 | reserved                 |
//!
//! `header_size_dwords` lets a sender reserve trailing padding; readers must
//! skip `advertized_header_size()` bytes before the body regardless of how
//! many of them were actually written.

use bytes::{Buf, BufMut, BytesMut};

pub const HEADER_LEN: usize = 16;
pub const MIN_HEADER_SIZE_DWORDS: u8 = 4;

/// Content-type discriminant for `pkg_content_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PkgContentType {
    Message,
    HeartbeatRequest,
    HeartbeatReply,
    /// Anything outside `{0,1,2}`; kept around so the parse loop can shut
    /// down with `UnknownPkgContentType` instead of panicking on decode.
    Unknown(u8),
}

impl From<u8> for PkgContentType {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Message,
            1 => Self::HeartbeatRequest,
            2 => Self::HeartbeatReply,
            other => Self::Unknown(other),
        }
    }
}

impl From<PkgContentType> for u8 {
    fn from(v: PkgContentType) -> Self {
        match v {
            PkgContentType::Message => 0,
            PkgContentType::HeartbeatRequest => 1,
            PkgContentType::HeartbeatReply => 2,
            PkgContentType::Unknown(other) => other,
        }
    }
}

/// The decoded fixed portion of a package header. Extra padding bytes
/// implied by `header_size_dwords > 4` are never represented here — callers
/// skip them via [`PackageHeader::advertized_header_size`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageHeader {
    pub pkg_content_type: u8,
    pub header_size_dwords: u8,
    pub content_specific_value: u16,
    pub content_size: u32,
    pub attached_binary_size: u32,
}

impl PackageHeader {
    #[must_use]
    pub fn message(content_specific_value: u16, content_size: u32, attached_binary_size: u32) -> Self {
        Self {
            pkg_content_type: PkgContentType::Message.into(),
            header_size_dwords: MIN_HEADER_SIZE_DWORDS,
            content_specific_value,
            content_size,
            attached_binary_size,
        }
    }

    #[must_use]
    pub fn heartbeat_request() -> Self {
        Self {
            pkg_content_type: PkgContentType::HeartbeatRequest.into(),
            header_size_dwords: MIN_HEADER_SIZE_DWORDS,
            content_specific_value: 0,
            content_size: 0,
            attached_binary_size: 0,
        }
    }

    #[must_use]
    pub fn heartbeat_reply() -> Self {
        Self {
            pkg_content_type: PkgContentType::HeartbeatReply.into(),
            header_size_dwords: MIN_HEADER_SIZE_DWORDS,
            content_specific_value: 0,
            content_size: 0,
            attached_binary_size: 0,
        }
    }

    #[must_use]
    pub const fn content_type(&self) -> PkgContentType {
        match self.pkg_content_type {
            0 => PkgContentType::Message,
            1 => PkgContentType::HeartbeatRequest,
            2 => PkgContentType::HeartbeatReply,
            other => PkgContentType::Unknown(other),
        }
    }

    /// `4 * header_size_dwords`; the number of bytes to skip before the body,
    /// regardless of how much of that space is real content.
    #[must_use]
    pub const fn advertized_header_size(&self) -> usize {
        (self.header_size_dwords as usize) * 4
    }

    /// Total logical frame length: header + body + attached binary.
    #[must_use]
    pub const fn total_frame_len(&self) -> usize {
        self.advertized_header_size() + self.content_size as usize + self.attached_binary_size as usize
    }

    /// Decode the fixed 16-byte prefix from `src`, which must already hold
    /// at least `HEADER_LEN` bytes. Does not consume anything past the
    /// reserved dword; callers skip `advertized_header_size()` separately.
    #[must_use]
    pub fn decode(src: &[u8; HEADER_LEN]) -> Self {
        let mut buf = &src[..];
        let pkg_content_type = buf.get_u8();
        let header_size_dwords = buf.get_u8();
        let content_specific_value = buf.get_u16_le();
        let content_size = buf.get_u32_le();
        let attached_binary_size = buf.get_u32_le();
        let _reserved = buf.get_u32_le();
        Self {
            pkg_content_type,
            header_size_dwords,
            content_specific_value,
            content_size,
            attached_binary_size,
        }
    }

    /// Encode the fixed 16-byte prefix. Writers must never advertise fewer
    /// than [`MIN_HEADER_SIZE_DWORDS`] dwords even when padding is absent.
    pub fn encode(&self, out: &mut BytesMut) {
        debug_assert!(self.header_size_dwords >= MIN_HEADER_SIZE_DWORDS);
        out.put_u8(self.pkg_content_type);
        out.put_u8(self.header_size_dwords);
        out.put_u16_le(self.content_specific_value);
        out.put_u32_le(self.content_size);
        out.put_u32_le(self.attached_binary_size);
        out.put_u32_le(0); // reserved, zero on emit
    }

    /// Encode into a fresh buffer, including any requested padding dwords
    /// beyond the fixed 16 bytes (zeroed, per §9's extensibility note).
    #[must_use]
    pub fn encode_with_padding(&self) -> BytesMut {
        let total = self.advertized_header_size().max(HEADER_LEN);
        let mut out = BytesMut::with_capacity(total);
        self.encode(&mut out);
        out.resize(total, 0);
        out
    }
}
