//! Ring of appended input buffers feeding the parse loop.
//!
//! Bytes arrive from the connection's read loop as owned `Bytes` chunks of
//! arbitrary, independent size (a TCP stream makes no framing promises).
//! `PackageInput` glues an unbounded run of such chunks into one logical
//! byte stream with a read-once cursor, so `header.rs` and the message
//! decoder never need to know where a chunk boundary fell.

use crate::header::{PackageHeader, HEADER_LEN};
use bytes::Bytes;
use std::collections::VecDeque;

/// Ring is allowed to grow past this many buffers before `append` starts
/// coalescing by copy instead of growing further.
const MAX_RING_BUFFERS: usize = 8;

/// Appended-buffer ring with a read-once cursor compatible with a
/// length-delimited decoder.
#[derive(Default)]
pub struct PackageInput {
    buffers: VecDeque<Bytes>,
    /// Bytes already consumed from the buffer at the front of the ring.
    first_offset: usize,
    total_size: usize,
    /// Cumulative bytes served through `next`/`back_up`, independent of
    /// `total_size` (which shrinks as bytes are skipped/read).
    byte_count: u64,
    /// Set while a segment handed out by `next` has not yet been
    /// `back_up`'d or implicitly consumed by the following call.
    served_len: Option<usize>,
}

impl PackageInput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_size == 0
    }

    /// Append `buf`. When the ring already holds `MAX_RING_BUFFERS`
    /// buffers, the new bytes are copied onto the tail buffer instead of
    /// growing the ring further.
    pub fn append(&mut self, buf: Bytes) {
        if buf.is_empty() {
            return;
        }
        self.total_size += buf.len();
        if self.buffers.len() < MAX_RING_BUFFERS {
            self.buffers.push_back(buf);
            return;
        }
        let tail = self.buffers.back_mut().expect("ring non-empty by construction");
        let mut merged = Vec::with_capacity(tail.len() + buf.len());
        merged.extend_from_slice(tail);
        merged.extend_from_slice(&buf);
        *tail = Bytes::from(merged);
    }

    /// Decode the fixed 16-byte header without consuming anything.
    /// Precondition: `total_size() >= HEADER_LEN`.
    #[must_use]
    pub fn view_header(&self) -> PackageHeader {
        debug_assert!(self.total_size >= HEADER_LEN);
        let mut arr = [0u8; HEADER_LEN];
        self.copy_into(&mut arr, 0);
        PackageHeader::decode(&arr)
    }

    /// Advance past exactly `n` bytes, dropping any buffer at the head
    /// that becomes fully consumed.
    pub fn skip(&mut self, mut n: usize) {
        debug_assert!(n <= self.total_size);
        self.total_size -= n;
        while n > 0 {
            let front = self.buffers.front().expect("n <= total_size");
            let available = front.len() - self.first_offset;
            if n < available {
                self.first_offset += n;
                n = 0;
            } else {
                n -= available;
                self.first_offset = 0;
                self.buffers.pop_front();
            }
        }
    }

    /// Copy exactly `n` bytes into `dst[..n]`, crossing buffer boundaries,
    /// and advance past them.
    pub fn read_buffer(&mut self, dst: &mut [u8], n: usize) {
        debug_assert!(n <= self.total_size);
        debug_assert!(dst.len() >= n);
        self.copy_into(dst, 0);
        self.skip(n);
    }

    /// Copy `dst.len()` bytes starting at logical offset `start` without
    /// consuming anything. Used by `view_header` and `read_buffer`.
    fn copy_into(&self, dst: &mut [u8], start: usize) {
        let want = dst.len();
        if want == 0 {
            return;
        }
        let mut skipped = start;
        let mut written = 0;
        for (i, buf) in self.buffers.iter().enumerate() {
            let offset = if i == 0 { self.first_offset } else { 0 };
            let avail = buf.len() - offset;
            if skipped >= avail {
                skipped -= avail;
                continue;
            }
            let begin = offset + skipped;
            skipped = 0;
            let take = (buf.len() - begin).min(want - written);
            dst[written..written + take].copy_from_slice(&buf[begin..begin + take]);
            written += take;
            if written == want {
                return;
            }
        }
        debug_assert_eq!(written, want, "copy_into requested more bytes than available");
    }

    /// Serve the largest contiguous unserved segment (always within one
    /// physical buffer) as a zero-copy slice. Returns `None` once the ring
    /// is drained. Implicitly consumes any previously served segment that
    /// was not `back_up`'d.
    pub fn next(&mut self) -> Option<Bytes> {
        if let Some(served) = self.served_len.take() {
            self.skip(served);
        }
        let front = self.buffers.front()?;
        let slice = front.slice(self.first_offset..);
        if slice.is_empty() {
            return None;
        }
        self.served_len = Some(slice.len());
        self.byte_count += slice.len() as u64;
        Some(slice)
    }

    /// Undo the last `k` bytes of the most recently served segment.
    /// `k` must be `<= ` that segment's length.
    pub fn back_up(&mut self, k: usize) {
        let served = self.served_len.take().unwrap_or(0);
        debug_assert!(k <= served);
        self.byte_count -= k as u64;
        self.served_len = Some(served - k);
    }

    /// Cumulative bytes served through `next`/`back_up`, distinct from
    /// `total_size` (the decoder adapter's own byte-count tracking).
    #[must_use]
    pub fn byte_count(&self) -> u64 {
        self.byte_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_view_header_across_split_chunks() {
        let mut input = PackageInput::new();
        let header = PackageHeader::message(9, 3, 0);
        let mut framed = bytes::BytesMut::new();
        header.encode(&mut framed);
        framed.extend_from_slice(b"abc");
        let whole = framed.freeze();

        // Split the frame into 1-byte chunks to exercise boundary crossing.
        for byte in whole.iter() {
            input.append(Bytes::copy_from_slice(&[*byte]));
        }

        assert_eq!(input.total_size(), 19);
        let decoded = input.view_header();
        assert_eq!(decoded.content_specific_value, 9);
        assert_eq!(decoded.content_size, 3);

        input.skip(HEADER_LEN);
        let mut body = [0u8; 3];
        input.read_buffer(&mut body, 3);
        assert_eq!(&body, b"abc");
        assert_eq!(input.total_size(), 0);
    }

    #[test]
    fn ring_coalesces_past_the_buffer_limit() {
        let mut input = PackageInput::new();
        for _ in 0..(MAX_RING_BUFFERS + 4) {
            input.append(Bytes::from_static(b"x"));
        }
        assert_eq!(input.total_size(), MAX_RING_BUFFERS as usize + 4);
        assert!(input.buffers.len() <= MAX_RING_BUFFERS);
    }

    #[test]
    fn next_back_up_round_trip() {
        let mut input = PackageInput::new();
        input.append(Bytes::from_static(b"hello"));
        let seg = input.next().unwrap();
        assert_eq!(seg.as_ref(), b"hello");
        input.back_up(2);
        assert_eq!(input.byte_count(), 3);
        // The 2 bytes were not actually skipped yet.
        assert_eq!(input.total_size(), 5);
        // Next call consumes the remaining 3 served bytes, then serves "lo".
        let seg2 = input.next().unwrap();
        assert_eq!(seg2.as_ref(), b"lo");
    }

    #[test]
    fn skip_drops_head_buffer_when_fully_consumed() {
        let mut input = PackageInput::new();
        input.append(Bytes::from_static(b"ab"));
        input.append(Bytes::from_static(b"cd"));
        input.skip(2);
        assert_eq!(input.total_size(), 2);
        let mut rest = [0u8; 2];
        input.read_buffer(&mut rest, 2);
        assert_eq!(&rest, b"cd");
    }
}
