//! The buffer model: `SimpleBuffer` for input, `HeterogeneousBuffer` for output.
//!
//! `SimpleBuffer` is an owned byte array used for read buffers and for any
//! output that has no reason to avoid a copy. `HeterogeneousBuffer` lets the
//! protocol entry hand header bytes (owned), body bytes (borrowed or shared),
//! and adjustable framing through a single output queue without forcing a
//! copy at the connection boundary.

use bytes::Bytes;

/// An owned, resizable byte array.
///
/// `size() == 0` iff the buffer holds no bytes; `capacity()` never shrinks
/// except when the buffer is dropped or explicitly replaced. Moving a
/// `SimpleBuffer` out (via [`SimpleBuffer::take`]) leaves the source at
/// `{size: 0, capacity: 0}`.
#[derive(Debug, Default)]
pub struct SimpleBuffer {
    data: Vec<u8>,
}

impl SimpleBuffer {
    #[must_use]
    pub const fn new() -> Self {
        Self { data: Vec::new() }
    }

    #[must_use]
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            data: Vec::with_capacity(cap),
        }
    }

    #[must_use]
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { data }
    }

    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// `true` iff `size() == 0`. The original source inverted this
    /// predicate; this implementation returns the corrected one.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Resize, preserving the first `min(n, old_size)` bytes.
    pub fn resize(&mut self, n: usize) {
        self.data.resize(n, 0);
    }

    /// Resize, discarding any prior content.
    pub fn resize_drop_data(&mut self, n: usize) {
        self.data.clear();
        self.data.resize(n, 0);
    }

    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Move this buffer's storage out, leaving `self` at `{size: 0, capacity: 0}`.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        Bytes::from(self.data)
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl From<Vec<u8>> for SimpleBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

/// Output-side buffer variant: borrowed, owned, shared, or adjustable.
///
/// Exactly one variant is alive at a time; moving a `HeterogeneousBuffer`
/// moves its inline storage, no variant is ever partially valid.
pub enum HeterogeneousBuffer {
    /// A borrowed, `'static` slice — no ownership, e.g. a precomputed
    /// heartbeat frame.
    ConstSlice(&'static [u8]),
    /// An owned `SimpleBuffer`.
    Owned(SimpleBuffer),
    /// A reference-counted shared buffer (cheap to clone, released only
    /// once the writer's sequence completes).
    Shared(Bytes),
    /// A buffer whose final bytes are not fixed until the adjuster runs,
    /// e.g. a header whose length field is patched once the body size is
    /// known.
    Adjustable {
        adjust: Box<dyn FnOnce(&mut SimpleBuffer) + Send>,
        buf: SimpleBuffer,
    },
}

impl HeterogeneousBuffer {
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            Self::ConstSlice(s) => s.len(),
            Self::Owned(b) => b.size(),
            Self::Shared(b) => b.len(),
            Self::Adjustable { buf, .. } => buf.size(),
        }
    }

    /// Run any pending adjustment, collapsing `Adjustable` into `Owned`.
    pub fn resolve(&mut self) {
        if let Self::Adjustable { .. } = self {
            let Self::Adjustable { adjust, mut buf } =
                std::mem::replace(self, Self::Owned(SimpleBuffer::new()))
            else {
                unreachable!()
            };
            adjust(&mut buf);
            *self = Self::Owned(buf);
        }
    }

    /// Borrow the bytes as a const slice. Fails for variants with no
    /// single contiguous owned/borrowed byte range resolved yet.
    #[must_use]
    pub fn as_const_slice(&self) -> Option<&[u8]> {
        match self {
            Self::ConstSlice(s) => Some(s),
            Self::Owned(b) => Some(b.as_slice()),
            Self::Shared(b) => Some(b.as_ref()),
            Self::Adjustable { .. } => None,
        }
    }

    /// Borrow the bytes mutably. Fails for `ConstSlice` and `Shared`
    /// (shared ownership forbids exclusive mutation) and for unresolved
    /// `Adjustable`.
    pub fn as_mutable_slice(&mut self) -> Option<&mut [u8]> {
        match self {
            Self::ConstSlice(_) | Self::Shared(_) | Self::Adjustable { .. } => None,
            Self::Owned(b) => Some(b.as_mut_slice()),
        }
    }

    /// Extract the underlying `SimpleBuffer` if this variant is, or
    /// uniquely owns, one — consuming `self` on success.
    pub fn try_extract_simple_buffer(self) -> std::result::Result<SimpleBuffer, Self> {
        match self {
            Self::Owned(b) => Ok(b),
            other => Err(other),
        }
    }

    /// Render to a `Bytes`, copying only if necessary.
    #[must_use]
    pub fn into_bytes(mut self) -> Bytes {
        self.resolve();
        match self {
            Self::ConstSlice(s) => Bytes::from_static(s),
            Self::Owned(b) => b.into_bytes(),
            Self::Shared(b) => b,
            Self::Adjustable { .. } => unreachable!("resolved above"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_buffer_is_empty_matches_size() {
        let mut b = SimpleBuffer::new();
        assert!(b.is_empty());
        b.resize(4);
        assert!(!b.is_empty());
        assert_eq!(b.size(), 4);
    }

    #[test]
    fn take_leaves_source_empty() {
        let mut b = SimpleBuffer::with_capacity(64);
        b.extend_from_slice(b"hello");
        let taken = b.take();
        assert_eq!(taken.size(), 5);
        assert_eq!(b.size(), 0);
        assert_eq!(b.capacity(), 0);
    }

    #[test]
    fn resize_preserves_prefix() {
        let mut b = SimpleBuffer::from_vec(vec![1, 2, 3, 4]);
        b.resize(2);
        assert_eq!(b.as_slice(), &[1, 2]);
        b.resize(4);
        assert_eq!(&b.as_slice()[..2], &[1, 2]);
    }

    #[test]
    fn hetero_const_slice_size() {
        let h = HeterogeneousBuffer::ConstSlice(b"abc");
        assert_eq!(h.size(), 3);
        assert!(h.as_const_slice().is_some());
    }

    #[test]
    fn hetero_extract_owned_only() {
        let h = HeterogeneousBuffer::Owned(SimpleBuffer::from_vec(vec![1, 2, 3]));
        let extracted = h.try_extract_simple_buffer();
        assert!(extracted.is_ok());

        let h = HeterogeneousBuffer::Shared(Bytes::from_static(b"xyz"));
        assert!(h.try_extract_simple_buffer().is_err());
    }

    #[test]
    fn hetero_adjustable_resolves_on_into_bytes() {
        let h = HeterogeneousBuffer::Adjustable {
            adjust: Box::new(|buf| buf.extend_from_slice(b"patched")),
            buf: SimpleBuffer::new(),
        };
        assert_eq!(h.into_bytes().as_ref(), b"patched");
    }
}
