//! Read and write TCP segments.
//!
//! Follows the [RFC 9293](https://www.rfc-editor.org/rfc/rfc9293.html) header
//! layout. Segments are looked at one at a time; there is no stream
//! reassembly and checksums are never verified.
use crate::{Error, Result};
use byteorder::{ByteOrder, NetworkEndian};

/// A TCP segment.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct Segment<B: AsRef<[u8]>> {
    buf: B,
}

impl<B: AsRef<[u8]>> Segment<B> {
    /// Create a new TCP segment.
    ///
    /// # Errors
    ///
    /// Fails when the buffer is smaller than the minimum TCP header size. The
    /// data offset field is not checked here, see [`Segment::header_len`].
    #[inline]
    #[must_use]
    pub fn new(buf: B) -> Result<Self> {
        if buf.as_ref().len() >= HEADER_LEN {
            Ok(Self { buf })
        } else {
            Err(Error::CannotParse("buffer too small"))
        }
    }

    /// Construct a new [`Segment`] using a [`SegmentBuilder`].
    ///
    /// # Errors
    ///
    /// See [`SegmentBuilder::new`].
    #[inline]
    #[must_use]
    pub fn builder<T>(buf: T) -> Result<SegmentBuilder<T>>
    where
        T: AsRef<[u8]> + AsMut<[u8]>,
    {
        SegmentBuilder::new(buf)
    }

    /// Extract the source port.
    #[inline]
    #[must_use]
    pub fn source(&self) -> u16 {
        NetworkEndian::read_u16(&self.buf.as_ref()[offsets::SOURCE])
    }

    /// Extract the destination port.
    #[inline]
    #[must_use]
    pub fn dest(&self) -> u16 {
        NetworkEndian::read_u16(&self.buf.as_ref()[offsets::DEST])
    }

    /// Extract the sequence number.
    #[inline]
    #[must_use]
    pub fn sequence(&self) -> u32 {
        NetworkEndian::read_u32(&self.buf.as_ref()[offsets::SEQUENCE])
    }

    /// Extract the acknowledgment number.
    #[inline]
    #[must_use]
    pub fn acked(&self) -> u32 {
        NetworkEndian::read_u32(&self.buf.as_ref()[offsets::ACKED])
    }

    /// Extract the raw data offset, in 4 byte words.
    #[inline]
    #[must_use]
    pub fn data_offset(&self) -> u8 {
        self.buf.as_ref()[offsets::DATA_OFFSET] >> 4
    }

    /// Length of the header in bytes, computed from the data offset. This can
    /// be smaller than [`HEADER_LEN`] for a corrupt segment.
    #[inline]
    #[must_use]
    pub fn header_len(&self) -> usize {
        usize::from(self.data_offset()) * 4
    }
}

impl<'a> Segment<&'a [u8]> {
    /// Extract the payload following the header, or `None` when the data
    /// offset points past the end of the buffer.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> Option<&'a [u8]> {
        self.buf.get(self.header_len()..)
    }
}

/// Builder for constructing [`Segment`] instances in-place.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct SegmentBuilder<B: AsRef<[u8]> + AsMut<[u8]>> {
    buf: B,
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> SegmentBuilder<B> {
    /// Create a new [`SegmentBuilder`] from an underlying byte buffer.
    ///
    /// # Errors
    ///
    /// Fails when the buffer is shorter than [`HEADER_LEN`].
    #[inline]
    #[must_use]
    pub fn new(buf: B) -> Result<Self> {
        if buf.as_ref().len() >= HEADER_LEN {
            Ok(Self { buf })
        } else {
            Err(Error::CannotParse("buffer too small"))
        }
    }

    /// Set the source port.
    #[inline]
    #[must_use]
    pub fn source(mut self, port: u16) -> Self {
        NetworkEndian::write_u16(&mut self.buf.as_mut()[offsets::SOURCE], port);
        self
    }

    /// Set the destination port.
    #[inline]
    #[must_use]
    pub fn dest(mut self, port: u16) -> Self {
        NetworkEndian::write_u16(&mut self.buf.as_mut()[offsets::DEST], port);
        self
    }

    /// Set the sequence number.
    #[inline]
    #[must_use]
    pub fn sequence(mut self, sequence: u32) -> Self {
        NetworkEndian::write_u32(&mut self.buf.as_mut()[offsets::SEQUENCE], sequence);
        self
    }

    /// Set the acknowledgment number.
    #[inline]
    #[must_use]
    pub fn acked(mut self, acked: u32) -> Self {
        NetworkEndian::write_u32(&mut self.buf.as_mut()[offsets::ACKED], acked);
        self
    }

    /// Set the raw data offset, in 4 byte words.
    #[inline]
    #[must_use]
    pub fn data_offset(mut self, words: u8) -> Self {
        let byte = &mut self.buf.as_mut()[offsets::DATA_OFFSET];
        *byte = (*byte & 0x0F) | (words << 4);
        self
    }

    /// Copy the payload in after the header. The data offset must be set
    /// first.
    ///
    /// # Errors
    ///
    /// Fails when the payload doesn't fit after the header.
    #[inline]
    #[must_use]
    pub fn payload(mut self, payload: &[u8]) -> Result<Self> {
        let start = usize::from(self.buf.as_ref()[offsets::DATA_OFFSET] >> 4) * 4;
        let data = self.buf.as_mut();
        match data.get_mut(start..) {
            Some(buf) if buf.len() >= payload.len() => {
                crate::write_all_bytes(payload, buf)?;
                Ok(self)
            }
            _ => Err(Error::NotEnoughSpace(
                "buffer not large enough to write payload",
            )),
        }
    }

    /// Create the [`Segment`].
    #[inline]
    #[must_use]
    pub fn build(self) -> Segment<B> {
        Segment { buf: self.buf }
    }
}

mod offsets {
    use std::ops::Range;
    pub(crate) const SOURCE: Range<usize> = 0..2;
    pub(crate) const DEST: Range<usize> = 2..4;
    pub(crate) const SEQUENCE: Range<usize> = 4..8;
    pub(crate) const ACKED: Range<usize> = 8..12;
    pub(crate) const DATA_OFFSET: usize = 12;
}

/// Minimum length of a TCP header.
pub const HEADER_LEN: usize = 20;

#[cfg(test)]
mod tests {
    use super::{Segment, HEADER_LEN};
    use hex_literal::hex;
    use std::error::Error;

    // ACK from port 443 to 52138 with a 32 byte header (12 bytes of options).
    const SEGMENT: [u8; 34] = hex!(
        "01bb cbaa 910c 6dc0 f67b 2cf9 8010 01f5 82fd 0000"
        "0101 080a 0000 0000 0000 0000"
        "abcd"
    );

    #[test]
    fn new_returns_err_when_buffer_too_short() {
        let segment = Segment::new(&[0, 0, 0]);
        assert!(segment.is_err());
    }

    #[test]
    fn segment_has_expected_ports() -> Result<(), Box<dyn Error>> {
        let segment = Segment::new(SEGMENT)?;
        assert_eq!(segment.source(), 443);
        assert_eq!(segment.dest(), 52138);
        Ok(())
    }

    #[test]
    fn segment_has_expected_sequence_and_ack() -> Result<(), Box<dyn Error>> {
        let segment = Segment::new(SEGMENT)?;
        assert_eq!(segment.sequence(), 2_433_510_848);
        assert_eq!(segment.acked(), 4_135_267_577);
        Ok(())
    }

    #[test]
    fn segment_has_expected_header_len() -> Result<(), Box<dyn Error>> {
        let segment = Segment::new(SEGMENT)?;
        assert_eq!(segment.data_offset(), 8);
        assert_eq!(segment.header_len(), 32);
        Ok(())
    }

    #[test]
    fn segment_has_expected_payload() -> Result<(), Box<dyn Error>> {
        let bytes = SEGMENT;
        let segment = Segment::new(bytes.as_slice())?;
        assert_eq!(segment.payload(), Some([0xab, 0xcd].as_slice()));
        Ok(())
    }

    #[test]
    fn segment_payload_is_none_when_offset_overruns_buffer() -> Result<(), Box<dyn Error>> {
        let mut bytes = [0; HEADER_LEN];
        bytes[12] = 0xF0;
        let segment = Segment::new(bytes.as_slice())?;
        assert_eq!(segment.header_len(), 60);
        assert_eq!(segment.payload(), None);
        Ok(())
    }

    #[test]
    fn segment_builder_returns_expected_segment() -> Result<(), Box<dyn Error>> {
        let mut buf = [0; HEADER_LEN + 3];
        let segment = Segment::<&[u8]>::builder(&mut buf)?
            .source(49152)
            .dest(102)
            .sequence(7)
            .acked(9)
            .data_offset(5)
            .payload(&[1, 2, 3])?
            .build();

        assert_eq!(segment.source(), 49152);
        assert_eq!(segment.dest(), 102);
        assert_eq!(segment.sequence(), 7);
        assert_eq!(segment.acked(), 9);
        assert_eq!(segment.header_len(), 20);

        let segment = Segment::new(buf.as_slice())?;
        assert_eq!(segment.payload(), Some([1, 2, 3].as_slice()));
        Ok(())
    }
}
