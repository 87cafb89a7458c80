//! IPv4 packet parsing.
//!
//! Follows the [RFC 791](https://datatracker.ietf.org/doc/html/rfc791) header
//! layout. Only the fields needed to route a packet to the TCP decoder are
//! exposed, plus the addresses for diagnostics. Checksums are never verified.
use crate::{Error, Result};
use byteorder::{ByteOrder, NetworkEndian};
use std::net::Ipv4Addr;

/// An IPv4 packet.
///
/// This struct wraps a byte buffer directly. Nothing is parsed until the field
/// accessor methods are called, like [`Packet::protocol`].
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct Packet<B: AsRef<[u8]>> {
    buf: B,
}

impl<B: AsRef<[u8]>> Packet<B> {
    /// Create a new IP packet.
    ///
    /// # Errors
    ///
    /// Fails when the buffer is shorter than [`HEADER_LEN`], but does no other
    /// validation. In particular the version and header length fields are
    /// left for the caller to check.
    #[inline]
    #[must_use]
    pub fn new(buf: B) -> Result<Self> {
        if buf.as_ref().len() >= HEADER_LEN {
            Ok(Self { buf })
        } else {
            Err(Error::CannotParse("packet too small"))
        }
    }

    /// Construct a new [`Packet`] using a [`PacketBuilder`].
    ///
    /// # Errors
    ///
    /// See [`PacketBuilder::new`].
    #[inline]
    #[must_use]
    pub fn builder<T>(buf: T) -> Result<PacketBuilder<T>>
    where
        T: AsRef<[u8]> + AsMut<[u8]>,
    {
        PacketBuilder::new(buf)
    }

    /// Extract the version.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u8 {
        self.buf.as_ref()[offsets::VERSION_IHL] >> 4
    }

    /// Length of the header in bytes. This is different from the raw field
    /// contained in the IP packet, which reports the length in 4 byte words.
    #[inline]
    #[must_use]
    pub fn header_len(&self) -> usize {
        usize::from(self.buf.as_ref()[offsets::VERSION_IHL] & 0xF) * 4
    }

    /// Extract the total length field.
    #[inline]
    #[must_use]
    pub fn len(&self) -> u16 {
        NetworkEndian::read_u16(&self.buf.as_ref()[offsets::LEN])
    }

    /// Extract the time-to-live.
    #[inline]
    #[must_use]
    pub fn ttl(&self) -> u8 {
        self.buf.as_ref()[offsets::TTL]
    }

    /// Extract the protocol.
    #[inline]
    #[must_use]
    pub fn protocol(&self) -> Protocol {
        Protocol::from(self.buf.as_ref()[offsets::PROTOCOL])
    }

    /// Extract the source address.
    #[inline]
    #[must_use]
    pub fn source(&self) -> Ipv4Addr {
        let data = self.buf.as_ref();
        Ipv4Addr::from(NetworkEndian::read_u32(&data[offsets::SOURCE]))
    }

    /// Extract the destination address.
    #[inline]
    #[must_use]
    pub fn dest(&self) -> Ipv4Addr {
        let data = self.buf.as_ref();
        Ipv4Addr::from(NetworkEndian::read_u32(&data[offsets::DEST]))
    }
}

impl<'a> Packet<&'a [u8]> {
    /// Extract the payload following the header, or `None` when the header
    /// length field points past the end of the buffer.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> Option<&'a [u8]> {
        self.buf.get(self.header_len()..)
    }
}

/// Builder for constructing [`Packet`] instances in-place.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct PacketBuilder<B: AsRef<[u8]> + AsMut<[u8]>> {
    buf: B,
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> PacketBuilder<B> {
    /// Create a new [`PacketBuilder`] from an underlying byte buffer.
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

    /// Set the version nibble.
    #[inline]
    #[must_use]
    pub fn version(mut self, version: u8) -> Self {
        let byte = &mut self.buf.as_mut()[offsets::VERSION_IHL];
        *byte = (*byte & 0x0F) | (version << 4);
        self
    }

    /// Set the header length in bytes. Only multiples of four are
    /// representable, anything else is rounded down.
    #[inline]
    #[must_use]
    pub fn header_len(mut self, len: u8) -> Self {
        let byte = &mut self.buf.as_mut()[offsets::VERSION_IHL];
        *byte = (*byte & 0xF0) | ((len / 4) & 0x0F);
        self
    }

    /// Set the total length field.
    #[inline]
    #[must_use]
    pub fn len(mut self, len: u16) -> Self {
        NetworkEndian::write_u16(&mut self.buf.as_mut()[offsets::LEN], len);
        self
    }

    /// Set the time-to-live.
    #[inline]
    #[must_use]
    pub fn ttl(mut self, ttl: u8) -> Self {
        self.buf.as_mut()[offsets::TTL] = ttl;
        self
    }

    /// Set the protocol.
    #[inline]
    #[must_use]
    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.buf.as_mut()[offsets::PROTOCOL] = protocol.into();
        self
    }

    /// Set the source address.
    #[inline]
    #[must_use]
    pub fn source(mut self, source: Ipv4Addr) -> Self {
        self.buf.as_mut()[offsets::SOURCE].copy_from_slice(&source.octets());
        self
    }

    /// Set the destination address.
    #[inline]
    #[must_use]
    pub fn dest(mut self, dest: Ipv4Addr) -> Self {
        self.buf.as_mut()[offsets::DEST].copy_from_slice(&dest.octets());
        self
    }

    /// Copy the payload in after the header. The header length must be set
    /// first.
    ///
    /// # Errors
    ///
    /// Fails when the payload doesn't fit after the header.
    #[inline]
    #[must_use]
    pub fn payload(mut self, payload: &[u8]) -> Result<Self> {
        let start = usize::from(self.buf.as_ref()[offsets::VERSION_IHL] & 0xF) * 4;
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

    /// Create the [`Packet`].
    #[inline]
    #[must_use]
    pub fn build(self) -> Packet<B> {
        Packet { buf: self.buf }
    }
}

mod offsets {
    use std::ops::Range;
    pub(crate) const VERSION_IHL: usize = 0;
    pub(crate) const LEN: Range<usize> = 2..4;
    pub(crate) const TTL: usize = 8;
    pub(crate) const PROTOCOL: usize = 9;
    pub(crate) const SOURCE: Range<usize> = 12..16;
    pub(crate) const DEST: Range<usize> = 16..20;
}

/// The transport protocol carried by a [`Packet`].
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Protocol {
    Tcp,
    Udp,
    Unknown(u8),
}

impl From<u8> for Protocol {
    fn from(value: u8) -> Self {
        match value {
            PROTOCOL_TCP => Protocol::Tcp,
            PROTOCOL_UDP => Protocol::Udp,
            _ => Protocol::Unknown(value),
        }
    }
}

impl From<Protocol> for u8 {
    fn from(value: Protocol) -> Self {
        match value {
            Protocol::Tcp => PROTOCOL_TCP,
            Protocol::Udp => PROTOCOL_UDP,
            Protocol::Unknown(value) => value,
        }
    }
}

/// Minimum length of an IPv4 header.
pub const HEADER_LEN: usize = 20;

/// Maximum length of an IPv4 header, options included.
pub const MAX_HEADER_LEN: usize = 60;

const PROTOCOL_TCP: u8 = 6;
const PROTOCOL_UDP: u8 = 17;

#[cfg(test)]
mod tests {
    use super::{Packet, Protocol, HEADER_LEN};
    use hex_literal::hex;
    use std::{error::Error, net::Ipv4Addr};

    // 20 byte header for a TCP packet from 10.0.53.7 to 104.17.239.159,
    // followed by four bytes of payload.
    const PACKET: [u8; 24] = hex!(
        "4500 0048 0000 4000 4006 a3ed 0a003507 6811ef9f"
        "deadbeef"
    );

    #[test]
    fn packet_returns_err_when_byte_slice_too_short() {
        let packet = Packet::new(&[0x45, 0, 0, 0]);
        assert!(packet.is_err());
    }

    #[test]
    fn packet_has_expected_version() -> Result<(), Box<dyn Error>> {
        let packet = Packet::new(PACKET)?;
        assert_eq!(packet.version(), 4);
        Ok(())
    }

    #[test]
    fn packet_has_expected_header_len() -> Result<(), Box<dyn Error>> {
        let packet = Packet::new(PACKET)?;
        assert_eq!(packet.header_len(), 20);
        Ok(())
    }

    #[test]
    fn packet_has_expected_len_and_ttl() -> Result<(), Box<dyn Error>> {
        let packet = Packet::new(PACKET)?;
        assert_eq!(packet.len(), 72);
        assert_eq!(packet.ttl(), 64);
        Ok(())
    }

    #[test]
    fn packet_has_expected_protocol() -> Result<(), Box<dyn Error>> {
        let packet = Packet::new(PACKET)?;
        assert_eq!(packet.protocol(), Protocol::Tcp);
        Ok(())
    }

    #[test]
    fn packet_has_expected_addresses() -> Result<(), Box<dyn Error>> {
        let packet = Packet::new(PACKET)?;
        assert_eq!(packet.source(), Ipv4Addr::new(10, 0, 53, 7));
        assert_eq!(packet.dest(), Ipv4Addr::new(104, 17, 239, 159));
        Ok(())
    }

    #[test]
    fn packet_has_expected_payload() -> Result<(), Box<dyn Error>> {
        let bytes = PACKET;
        let packet = Packet::new(bytes.as_slice())?;
        assert_eq!(packet.payload(), Some([0xde, 0xad, 0xbe, 0xef].as_slice()));
        Ok(())
    }

    #[test]
    fn packet_payload_is_none_when_header_len_overruns_buffer() -> Result<(), Box<dyn Error>> {
        let mut bytes = PACKET;
        bytes[0] = 0x4F;
        let packet = Packet::new(bytes.as_slice())?;
        assert_eq!(packet.header_len(), 60);
        assert_eq!(packet.payload(), None);
        Ok(())
    }

    #[test]
    fn packet_builder_returns_expected_packet() -> Result<(), Box<dyn Error>> {
        let mut buf = [0; HEADER_LEN + 4];
        let packet = Packet::<&[u8]>::builder(&mut buf)?
            .version(4)
            .header_len(20)
            .len(24)
            .ttl(32)
            .protocol(Protocol::Udp)
            .source(Ipv4Addr::new(127, 0, 0, 1))
            .dest(Ipv4Addr::new(10, 0, 0, 2))
            .payload(&[1, 2, 3, 4])?
            .build();

        assert_eq!(packet.version(), 4);
        assert_eq!(packet.header_len(), 20);
        assert_eq!(packet.len(), 24);
        assert_eq!(packet.ttl(), 32);
        assert_eq!(packet.protocol(), Protocol::Udp);
        assert_eq!(packet.source(), Ipv4Addr::new(127, 0, 0, 1));
        assert_eq!(packet.dest(), Ipv4Addr::new(10, 0, 0, 2));

        let packet = Packet::new(buf.as_slice())?;
        assert_eq!(packet.payload(), Some([1, 2, 3, 4].as_slice()));
        Ok(())
    }

    #[test]
    fn packet_builder_rejects_payload_past_end() -> Result<(), Box<dyn Error>> {
        let mut buf = [0; HEADER_LEN + 2];
        let result = Packet::<&[u8]>::builder(&mut buf)?
            .header_len(20)
            .payload(&[1, 2, 3]);
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn protocol_maps_known_numbers() {
        assert_eq!(Protocol::from(6), Protocol::Tcp);
        assert_eq!(Protocol::from(17), Protocol::Udp);
        assert_eq!(Protocol::from(1), Protocol::Unknown(1));
        assert_eq!(u8::from(Protocol::Tcp), 6);
    }
}
