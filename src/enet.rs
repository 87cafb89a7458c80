//! Read and write Ethernet MAC frames.
//!
//! Only the fixed 14 byte header is interpreted. The preamble, start frame
//! delimiter and frame check sequence are never present in captured records,
//! so they are not modelled at all.
use byteorder::{ByteOrder, NetworkEndian};

use crate::{Error, Result};
use std::fmt;

/// An Ethernet frame.
///
/// This struct wraps a byte buffer directly. Nothing is parsed until the field
/// accessor methods (e.g. [`Frame::ethertype`]) are called. Addresses are
/// passed as copies since they're so small, but the payload is always referred
/// to by reference.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct Frame<B: AsRef<[u8]>> {
    buf: B,
}

impl<B: AsRef<[u8]>> Frame<B> {
    /// Create a new Ethernet frame.
    ///
    /// # Errors
    ///
    /// Fails when the buffer is shorter than [`HEADER_LEN`], but does no other
    /// validation.
    #[inline]
    #[must_use]
    pub fn new(buf: B) -> Result<Self> {
        if buf.as_ref().len() >= HEADER_LEN {
            Ok(Self { buf })
        } else {
            Err(Error::CannotParse("frame too small"))
        }
    }

    /// Construct a new [`Frame`] using a [`FrameBuilder`].
    ///
    /// # Errors
    ///
    /// See [`FrameBuilder::new`].
    #[inline]
    #[must_use]
    pub fn builder<T>(buf: T) -> Result<FrameBuilder<T>>
    where
        T: AsRef<[u8]> + AsMut<[u8]>,
    {
        FrameBuilder::new(buf)
    }

    /// Extract the destination MAC address.
    #[inline]
    #[must_use]
    pub fn dest(&self) -> MacAddr {
        let mut octets = [0; 6];
        octets.copy_from_slice(&self.buf.as_ref()[offsets::DEST]);
        MacAddr::from(octets)
    }

    /// Extract the source MAC address.
    #[inline]
    #[must_use]
    pub fn source(&self) -> MacAddr {
        let mut octets = [0; 6];
        octets.copy_from_slice(&self.buf.as_ref()[offsets::SOURCE]);
        MacAddr::from(octets)
    }

    /// Extract the encapsulated protocol type.
    #[inline]
    #[must_use]
    pub fn ethertype(&self) -> EtherType {
        let data = self.buf.as_ref();
        EtherType::from(NetworkEndian::read_u16(&data[offsets::ETHERTYPE]))
    }

    /// Total length of the frame.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.as_ref().len()
    }
}

impl<'a> Frame<&'a [u8]> {
    /// Extract the client data following the header.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &'a [u8] {
        &self.buf[offsets::PAYLOAD]
    }
}

/// Builder for constructing [`Frame`] instances in-place.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct FrameBuilder<B: AsRef<[u8]> + AsMut<[u8]>> {
    buf: B,
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> FrameBuilder<B> {
    /// Create a new [`FrameBuilder`] instance from an underlying byte buffer.
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

    /// Set the destination MAC address.
    #[inline]
    #[must_use]
    pub fn dest(mut self, dest: MacAddr) -> Self {
        self.buf.as_mut()[offsets::DEST].copy_from_slice(&dest.octets);
        self
    }

    /// Set the source MAC address.
    #[inline]
    #[must_use]
    pub fn source(mut self, source: MacAddr) -> Self {
        self.buf.as_mut()[offsets::SOURCE].copy_from_slice(&source.octets);
        self
    }

    /// Set the protocol type.
    #[inline]
    #[must_use]
    pub fn ethertype(mut self, ethertype: EtherType) -> Self {
        let data = self.buf.as_mut();
        NetworkEndian::write_u16(&mut data[offsets::ETHERTYPE], ethertype.into());
        self
    }

    /// Copy the payload into the buffer.
    ///
    /// # Errors
    ///
    /// Fails when there is not enough space left in the buffer for the
    /// payload.
    #[inline]
    #[must_use]
    pub fn payload(mut self, payload: &[u8]) -> Result<Self> {
        let data = self.buf.as_mut();
        let payload_buf = &mut data[offsets::PAYLOAD];

        if payload_buf.len() < payload.len() {
            return Err(Error::NotEnoughSpace(
                "buffer not large enough to write payload",
            ));
        }

        crate::write_all_bytes(payload, payload_buf)?;
        Ok(self)
    }

    /// Create the [`Frame`].
    #[inline]
    #[must_use]
    pub fn build(self) -> Frame<B> {
        Frame { buf: self.buf }
    }
}

mod offsets {
    use std::ops::{Range, RangeFrom};
    pub(crate) const DEST: Range<usize> = 0..6;
    pub(crate) const SOURCE: Range<usize> = 6..12;
    pub(crate) const ETHERTYPE: Range<usize> = 12..14;
    pub(crate) const PAYLOAD: RangeFrom<usize> = 14..;
}

/// The protocols this decoder tells apart. See the [IANA list of EtherType
/// values](https://www.iana.org/assignments/ieee-802-numbers/ieee-802-numbers.xhtml#ieee-802-numbers-1).
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum EtherType {
    Ipv4,
    Arp,
    Unknown(u16),
}

impl From<EtherType> for u16 {
    fn from(value: EtherType) -> Self {
        match value {
            EtherType::Ipv4 => ETHERTYPE_IPV4,
            EtherType::Arp => ETHERTYPE_ARP,
            EtherType::Unknown(typ) => typ,
        }
    }
}

impl From<u16> for EtherType {
    fn from(value: u16) -> Self {
        match value {
            ETHERTYPE_IPV4 => EtherType::Ipv4,
            ETHERTYPE_ARP => EtherType::Arp,
            _ => EtherType::Unknown(value),
        }
    }
}

/// A MAC address.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct MacAddr {
    octets: [u8; 6],
}

impl MacAddr {
    /// Create a new [`MacAddr`] instance.
    #[inline]
    #[must_use]
    pub fn new(a: u8, b: u8, c: u8, d: u8, e: u8, f: u8) -> Self {
        Self {
            octets: [a, b, c, d, e, f],
        }
    }

    /// The all-zeros address.
    #[inline]
    #[must_use]
    pub fn zero() -> Self {
        Self { octets: [0; 6] }
    }

    /// The raw address bytes.
    #[inline]
    #[must_use]
    pub fn octets(&self) -> [u8; 6] {
        self.octets
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(octets: [u8; 6]) -> Self {
        MacAddr { octets }
    }
}

impl fmt::Debug for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.octets;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// Size of the Ethernet header.
pub const HEADER_LEN: usize = 14;

// EtherType code for IPv4.
const ETHERTYPE_IPV4: u16 = 0x0800;

// EtherType code for ARP.
const ETHERTYPE_ARP: u16 = 0x0806;

#[cfg(test)]
mod tests {
    use super::{EtherType, Frame, MacAddr, HEADER_LEN};
    use hex_literal::hex;
    use std::error::Error;

    // Ethernet header carrying IPv4, followed by two bytes of client data.
    const FRAME: [u8; 16] = hex!("74a6cdb1f98b c21754777a64 0800 4500");

    #[test]
    fn frame_returns_err_when_byte_slice_too_short() {
        let frame = Frame::new(&[0, 0, 0, 0]);
        assert!(frame.is_err());
    }

    #[test]
    fn frame_accepts_exactly_header_len() {
        assert!(Frame::new(&[0; HEADER_LEN]).is_ok());
        assert!(Frame::new(&[0; HEADER_LEN - 1]).is_err());
    }

    #[test]
    fn frame_has_expected_dest_address() -> Result<(), Box<dyn Error>> {
        let frame = Frame::new(FRAME)?;
        let addr = MacAddr::new(0x74, 0xA6, 0xCD, 0xB1, 0xF9, 0x8B);
        assert_eq!(frame.dest(), addr);
        Ok(())
    }

    #[test]
    fn frame_has_expected_source_address() -> Result<(), Box<dyn Error>> {
        let frame = Frame::new(FRAME)?;
        let addr = MacAddr::new(0xC2, 0x17, 0x54, 0x77, 0x7A, 0x64);
        assert_eq!(frame.source(), addr);
        Ok(())
    }

    #[test]
    fn frame_has_expected_ethertype() -> Result<(), Box<dyn Error>> {
        let frame = Frame::new(FRAME)?;
        assert_eq!(frame.ethertype(), EtherType::Ipv4);
        Ok(())
    }

    #[test]
    fn frame_has_expected_payload() -> Result<(), Box<dyn Error>> {
        let bytes = FRAME;
        let frame = Frame::new(bytes.as_slice())?;
        assert_eq!(frame.payload(), &[0x45, 0x00]);
        assert_eq!(frame.len(), 16);
        Ok(())
    }

    #[test]
    fn frame_builder_returns_expected_frame() -> Result<(), Box<dyn Error>> {
        let mut buf = [0; 32];
        let frame = Frame::<&[u8]>::builder(&mut buf)?
            .source(MacAddr::zero())
            .dest(MacAddr::new(10, 10, 10, 10, 10, 10))
            .ethertype(EtherType::Arp)
            .payload(&[1, 2, 3])?
            .build();

        assert_eq!(frame.source(), MacAddr::zero());
        assert_eq!(frame.dest(), MacAddr::new(10, 10, 10, 10, 10, 10));
        assert_eq!(frame.ethertype(), EtherType::Arp);

        let frame = Frame::new(buf.as_slice())?;
        assert_eq!(&frame.payload()[0..5], &[1, 2, 3, 0, 0]);
        Ok(())
    }

    #[test]
    fn frame_builder_rejects_oversized_payload() -> Result<(), Box<dyn Error>> {
        let mut buf = [0; HEADER_LEN + 2];
        let result = Frame::<&[u8]>::builder(&mut buf)?.payload(&[1, 2, 3]);
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn ethertype_round_trips_known_codes() {
        assert_eq!(EtherType::from(0x0800), EtherType::Ipv4);
        assert_eq!(EtherType::from(0x0806), EtherType::Arp);
        assert_eq!(EtherType::from(0x86DD), EtherType::Unknown(0x86DD));
        assert_eq!(u16::from(EtherType::Arp), 0x0806);
    }

    #[test]
    fn macaddr_display_gives_expected_value() {
        let addr = MacAddr::new(0, 10, 20, 5, 40, 50);
        assert_eq!(addr.to_string(), "00:0a:14:05:28:32");
        assert_eq!(format!("{addr:?}"), "00:0a:14:05:28:32");
    }
}
