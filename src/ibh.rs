//! The inner block header, carrying the channel, sequence number and flow
//! flags of a message.
use byteorder::{ByteOrder, NetworkEndian};

/// View over an inner block header.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct BlockHeader<B: AsRef<[u8]>> {
    buf: B,
}

impl<B: AsRef<[u8]>> BlockHeader<B> {
    // Callers must have checked the buffer holds at least HEADER_LEN bytes.
    #[inline]
    pub(crate) fn new(buf: B) -> Self {
        Self { buf }
    }

    #[inline]
    #[must_use]
    pub fn channel(&self) -> u16 {
        NetworkEndian::read_u16(&self.buf.as_ref()[offsets::CHANNEL])
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> u8 {
        self.buf.as_ref()[offsets::LEN]
    }

    #[inline]
    #[must_use]
    pub fn sequence(&self) -> u8 {
        self.buf.as_ref()[offsets::SEQUENCE]
    }

    #[inline]
    #[must_use]
    pub fn send_flags(&self) -> u16 {
        NetworkEndian::read_u16(&self.buf.as_ref()[offsets::SEND_FLAGS])
    }

    #[inline]
    #[must_use]
    pub fn recv_flags(&self) -> u16 {
        NetworkEndian::read_u16(&self.buf.as_ref()[offsets::RECV_FLAGS])
    }
}

mod offsets {
    use std::ops::Range;
    pub(crate) const CHANNEL: Range<usize> = 0..2;
    pub(crate) const LEN: usize = 2;
    pub(crate) const SEQUENCE: usize = 3;
    pub(crate) const SEND_FLAGS: Range<usize> = 4..6;
    pub(crate) const RECV_FLAGS: Range<usize> = 6..8;
}

/// Size of the inner block header.
pub const HEADER_LEN: usize = 8;
