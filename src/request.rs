//! Read and validate protocol requests.
//!
//! Requests and responses share one fixed 27 byte layout: the outer
//! [`IsoHeader`], the inner [`BlockHeader`], then a packed body of read
//! parameters. Decoding never branches on the function code beyond checking
//! it is one the protocol defines.
//!
//! ```text
//!  0       7               15      17  18  19      21      23  24          27
//!  +-------+---------------+-------+---+---+-------+-------+---+-----------+
//!  |  ISO  |      IBH      |prefix |res|siz|length |  db   |are|  start    |
//!  +-------+---------------+-------+---+---+-------+-------+---+-----------+
//! ```
use crate::config::Config;
use crate::ibh::{self, BlockHeader};
use crate::iso::{self, Function, IsoHeader};
use crate::{Error, Malformed, Result};
use byteorder::{ByteOrder, NetworkEndian};

/// A protocol request (or response, the layout is the same).
///
/// Like the other views this wraps the payload bytes directly. The whole
/// buffer is taken to be the message, so [`Request::len`] is the observed
/// length that the outer header's claimed length is checked against.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct Request<B: AsRef<[u8]>> {
    buf: B,
}

impl<B: AsRef<[u8]>> Request<B> {
    /// Create a new request view.
    ///
    /// # Errors
    ///
    /// Fails when the buffer is shorter than [`REQUEST_LEN`]. No field is
    /// validated, see [`Request::validate`].
    #[inline]
    #[must_use]
    pub fn new(buf: B) -> Result<Self> {
        if buf.as_ref().len() >= REQUEST_LEN {
            Ok(Self { buf })
        } else {
            Err(Error::CannotParse("payload too small for a request"))
        }
    }

    /// Construct a new [`Request`] using a [`RequestBuilder`].
    ///
    /// # Errors
    ///
    /// See [`RequestBuilder::new`].
    #[inline]
    #[must_use]
    pub fn builder<T>(buf: T) -> Result<RequestBuilder<T>>
    where
        T: AsRef<[u8]> + AsMut<[u8]>,
    {
        RequestBuilder::new(buf)
    }

    /// Check every structural invariant, in order: protocol identifier,
    /// function code, channel id and claimed length.
    ///
    /// # Errors
    ///
    /// Returns the first invariant that doesn't hold.
    pub fn validate(&self, config: &Config) -> std::result::Result<(), Malformed> {
        let iso = self.iso();
        if iso.protocol_id() != iso::PROTOCOL_ID {
            return Err(Malformed::ProtocolId(iso.protocol_id()));
        }
        if let Function::Unknown(code) = iso.function() {
            return Err(Malformed::UnknownFunction(code));
        }

        let channel = self.ibh().channel();
        if channel != config.expected_channel {
            return Err(Malformed::Channel {
                found: channel,
                expected: config.expected_channel,
            });
        }

        if usize::from(iso.len()) != self.len() {
            return Err(Malformed::Length {
                claimed: iso.len(),
                actual: self.len(),
            });
        }

        Ok(())
    }

    /// The outer transport header.
    #[inline]
    #[must_use]
    pub fn iso(&self) -> IsoHeader<&[u8]> {
        IsoHeader::new(&self.buf.as_ref()[offsets::ISO])
    }

    /// The inner block header.
    #[inline]
    #[must_use]
    pub fn ibh(&self) -> BlockHeader<&[u8]> {
        BlockHeader::new(&self.buf.as_ref()[offsets::IBH])
    }

    #[inline]
    #[must_use]
    pub fn prefix(&self) -> u16 {
        NetworkEndian::read_u16(&self.buf.as_ref()[offsets::PREFIX])
    }

    /// The byte between the prefix and the read size, which carries no known
    /// meaning.
    #[inline]
    #[must_use]
    pub fn reserved(&self) -> u8 {
        self.buf.as_ref()[offsets::RESERVED]
    }

    #[inline]
    #[must_use]
    pub fn read_size(&self) -> u8 {
        self.buf.as_ref()[offsets::READ_SIZE]
    }

    #[inline]
    #[must_use]
    pub fn read_length(&self) -> u16 {
        NetworkEndian::read_u16(&self.buf.as_ref()[offsets::READ_LENGTH])
    }

    /// Extract the data block number.
    #[inline]
    #[must_use]
    pub fn db_number(&self) -> u16 {
        NetworkEndian::read_u16(&self.buf.as_ref()[offsets::DB_NUMBER])
    }

    #[inline]
    #[must_use]
    pub fn area_code(&self) -> u8 {
        self.buf.as_ref()[offsets::AREA_CODE]
    }

    /// Extract the 24 bit start address.
    #[inline]
    #[must_use]
    pub fn start_address(&self) -> u32 {
        NetworkEndian::read_u24(&self.buf.as_ref()[offsets::START_ADDRESS])
    }

    /// Observed length of the message, i.e. the whole payload.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.as_ref().len()
    }
}

/// Builder for constructing [`Request`] instances in-place.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct RequestBuilder<B: AsRef<[u8]> + AsMut<[u8]>> {
    buf: B,
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> RequestBuilder<B> {
    /// Create a new [`RequestBuilder`] from an underlying byte buffer.
    ///
    /// # Errors
    ///
    /// Fails when the buffer is shorter than [`REQUEST_LEN`].
    #[inline]
    #[must_use]
    pub fn new(buf: B) -> Result<Self> {
        if buf.as_ref().len() >= REQUEST_LEN {
            Ok(Self { buf })
        } else {
            Err(Error::CannotParse("buffer too small"))
        }
    }

    /// Set the protocol identifier.
    #[inline]
    #[must_use]
    pub fn protocol_id(mut self, id: u8) -> Self {
        self.buf.as_mut()[offsets::PROTOCOL_ID] = id;
        self
    }

    /// Set the claimed message length.
    #[inline]
    #[must_use]
    pub fn len(mut self, len: u16) -> Self {
        NetworkEndian::write_u16(&mut self.buf.as_mut()[offsets::ISO_LEN], len);
        self
    }

    /// Set the transport header length indicator.
    #[inline]
    #[must_use]
    pub fn param_len(mut self, len: u8) -> Self {
        self.buf.as_mut()[offsets::PARAM_LEN] = len;
        self
    }

    /// Set the function code.
    #[inline]
    #[must_use]
    pub fn function(mut self, function: Function) -> Self {
        self.buf.as_mut()[offsets::FUNCTION] = function.into();
        self
    }

    /// Set the TPDU number.
    #[inline]
    #[must_use]
    pub fn tpdu(mut self, tpdu: u8) -> Self {
        self.buf.as_mut()[offsets::TPDU] = tpdu;
        self
    }

    /// Set the inner header's channel id.
    #[inline]
    #[must_use]
    pub fn channel(mut self, channel: u16) -> Self {
        NetworkEndian::write_u16(&mut self.buf.as_mut()[offsets::CHANNEL], channel);
        self
    }

    /// Set the inner header's length.
    #[inline]
    #[must_use]
    pub fn block_len(mut self, len: u8) -> Self {
        self.buf.as_mut()[offsets::BLOCK_LEN] = len;
        self
    }

    /// Set the inner header's sequence number.
    #[inline]
    #[must_use]
    pub fn sequence(mut self, sequence: u8) -> Self {
        self.buf.as_mut()[offsets::SEQUENCE] = sequence;
        self
    }

    /// Set the inner header's send flags.
    #[inline]
    #[must_use]
    pub fn send_flags(mut self, flags: u16) -> Self {
        NetworkEndian::write_u16(&mut self.buf.as_mut()[offsets::SEND_FLAGS], flags);
        self
    }

    /// Set the inner header's receive flags.
    #[inline]
    #[must_use]
    pub fn recv_flags(mut self, flags: u16) -> Self {
        NetworkEndian::write_u16(&mut self.buf.as_mut()[offsets::RECV_FLAGS], flags);
        self
    }

    #[inline]
    #[must_use]
    pub fn prefix(mut self, prefix: u16) -> Self {
        NetworkEndian::write_u16(&mut self.buf.as_mut()[offsets::PREFIX], prefix);
        self
    }

    #[inline]
    #[must_use]
    pub fn reserved(mut self, reserved: u8) -> Self {
        self.buf.as_mut()[offsets::RESERVED] = reserved;
        self
    }

    #[inline]
    #[must_use]
    pub fn read_size(mut self, size: u8) -> Self {
        self.buf.as_mut()[offsets::READ_SIZE] = size;
        self
    }

    #[inline]
    #[must_use]
    pub fn read_length(mut self, length: u16) -> Self {
        NetworkEndian::write_u16(&mut self.buf.as_mut()[offsets::READ_LENGTH], length);
        self
    }

    #[inline]
    #[must_use]
    pub fn db_number(mut self, db: u16) -> Self {
        NetworkEndian::write_u16(&mut self.buf.as_mut()[offsets::DB_NUMBER], db);
        self
    }

    #[inline]
    #[must_use]
    pub fn area_code(mut self, area: u8) -> Self {
        self.buf.as_mut()[offsets::AREA_CODE] = area;
        self
    }

    /// Set the start address. Only the low 24 bits are kept.
    #[inline]
    #[must_use]
    pub fn start_address(mut self, address: u32) -> Self {
        let data = self.buf.as_mut();
        NetworkEndian::write_u24(&mut data[offsets::START_ADDRESS], address & 0x00FF_FFFF);
        self
    }

    /// Create the [`Request`].
    #[inline]
    #[must_use]
    pub fn build(self) -> Request<B> {
        Request { buf: self.buf }
    }
}

mod offsets {
    use super::{ibh, iso};
    use std::ops::Range;

    pub(crate) const ISO: Range<usize> = 0..iso::HEADER_LEN;
    pub(crate) const IBH: Range<usize> = iso::HEADER_LEN..iso::HEADER_LEN + ibh::HEADER_LEN;

    pub(crate) const PROTOCOL_ID: usize = 0;
    pub(crate) const ISO_LEN: Range<usize> = 2..4;
    pub(crate) const PARAM_LEN: usize = 4;
    pub(crate) const FUNCTION: usize = 5;
    pub(crate) const TPDU: usize = 6;

    pub(crate) const CHANNEL: Range<usize> = 7..9;
    pub(crate) const BLOCK_LEN: usize = 9;
    pub(crate) const SEQUENCE: usize = 10;
    pub(crate) const SEND_FLAGS: Range<usize> = 11..13;
    pub(crate) const RECV_FLAGS: Range<usize> = 13..15;

    pub(crate) const PREFIX: Range<usize> = 15..17;
    pub(crate) const RESERVED: usize = 17;
    pub(crate) const READ_SIZE: usize = 18;
    pub(crate) const READ_LENGTH: Range<usize> = 19..21;
    pub(crate) const DB_NUMBER: Range<usize> = 21..23;
    pub(crate) const AREA_CODE: usize = 23;
    pub(crate) const START_ADDRESS: Range<usize> = 24..27;
}

/// Size of the fixed request layout. Payloads shorter than this are never
/// decoded.
pub const REQUEST_LEN: usize = 27;

#[cfg(test)]
mod tests {
    use super::{Request, REQUEST_LEN};
    use crate::config::Config;
    use crate::iso::Function;
    use crate::Malformed;
    use hex_literal::hex;
    use std::error::Error;

    // Read request for 16 bytes of DB 5 starting at 0x40.
    const REQUEST: [u8; REQUEST_LEN] = hex!(
        "03 00 00 1b 02 f0 80"
        "00 07 10 2a 00 01 00 02"
        "12 34 00 02 00 10 00 05 84 00 00 40"
    );

    #[test]
    fn request_returns_err_when_payload_too_short() {
        assert!(Request::new(&REQUEST[..REQUEST_LEN - 1]).is_err());
        assert!(Request::new(&REQUEST[..]).is_ok());
    }

    #[test]
    fn request_has_expected_headers() -> Result<(), Box<dyn Error>> {
        let request = Request::new(REQUEST)?;
        let iso = request.iso();
        assert_eq!(iso.protocol_id(), 0x03);
        assert_eq!(iso.len(), 27);
        assert_eq!(iso.param_len(), 2);
        assert_eq!(iso.function(), Function::PduTransport);
        assert_eq!(iso.tpdu(), 0x80);

        let ibh = request.ibh();
        assert_eq!(ibh.channel(), 7);
        assert_eq!(ibh.len(), 0x10);
        assert_eq!(ibh.sequence(), 0x2a);
        assert_eq!(ibh.send_flags(), 1);
        assert_eq!(ibh.recv_flags(), 2);
        Ok(())
    }

    #[test]
    fn request_has_expected_body() -> Result<(), Box<dyn Error>> {
        let request = Request::new(REQUEST)?;
        assert_eq!(request.prefix(), 0x1234);
        assert_eq!(request.reserved(), 0);
        assert_eq!(request.read_size(), 2);
        assert_eq!(request.read_length(), 16);
        assert_eq!(request.db_number(), 5);
        assert_eq!(request.area_code(), 0x84);
        assert_eq!(request.start_address(), 0x40);
        assert_eq!(request.len(), 27);
        Ok(())
    }

    #[test]
    fn valid_request_passes_validation() -> Result<(), Box<dyn Error>> {
        let request = Request::new(REQUEST)?;
        assert_eq!(request.validate(&Config::default()), Ok(()));
        Ok(())
    }

    #[test]
    fn connect_function_passes_validation() -> Result<(), Box<dyn Error>> {
        let mut bytes = REQUEST;
        bytes[5] = 0xE0;
        let request = Request::new(bytes)?;
        assert_eq!(request.validate(&Config::default()), Ok(()));
        Ok(())
    }

    #[test]
    fn bad_protocol_id_fails_validation() -> Result<(), Box<dyn Error>> {
        let mut bytes = REQUEST;
        bytes[0] = 0xFF;
        let request = Request::new(bytes)?;
        assert_eq!(
            request.validate(&Config::default()),
            Err(Malformed::ProtocolId(0xFF))
        );
        Ok(())
    }

    #[test]
    fn unknown_function_fails_validation() -> Result<(), Box<dyn Error>> {
        let mut bytes = REQUEST;
        bytes[5] = 0x42;
        let request = Request::new(bytes)?;
        assert_eq!(
            request.validate(&Config::default()),
            Err(Malformed::UnknownFunction(0x42))
        );
        Ok(())
    }

    #[test]
    fn unexpected_channel_fails_validation() -> Result<(), Box<dyn Error>> {
        let request = Request::new(REQUEST)?;
        assert_eq!(
            request.validate(&Config::new(3)),
            Err(Malformed::Channel {
                found: 7,
                expected: 3
            })
        );
        Ok(())
    }

    #[test]
    fn claimed_length_mismatch_fails_validation() -> Result<(), Box<dyn Error>> {
        let mut bytes = [0; REQUEST_LEN + 1];
        bytes[..REQUEST_LEN].copy_from_slice(&REQUEST);
        let request = Request::new(bytes)?;
        assert_eq!(
            request.validate(&Config::default()),
            Err(Malformed::Length {
                claimed: 27,
                actual: 28
            })
        );
        Ok(())
    }

    #[test]
    fn protocol_id_is_checked_before_length() -> Result<(), Box<dyn Error>> {
        let mut bytes = REQUEST;
        bytes[0] = 0x00;
        bytes[3] = 0x00;
        let request = Request::new(bytes)?;
        assert_eq!(
            request.validate(&Config::default()),
            Err(Malformed::ProtocolId(0x00))
        );
        Ok(())
    }

    #[test]
    fn builder_writes_every_field_where_view_reads_it() -> Result<(), Box<dyn Error>> {
        let mut buf = [0; REQUEST_LEN];
        let request = Request::<&[u8]>::builder(&mut buf)?
            .protocol_id(0x03)
            .len(27)
            .param_len(2)
            .function(Function::PduTransport)
            .tpdu(0x80)
            .channel(7)
            .block_len(0x10)
            .sequence(0x2a)
            .send_flags(1)
            .recv_flags(2)
            .prefix(0x1234)
            .reserved(0)
            .read_size(2)
            .read_length(16)
            .db_number(5)
            .area_code(0x84)
            .start_address(0x40)
            .build();

        assert_eq!(request.validate(&Config::default()), Ok(()));
        assert_eq!(buf, REQUEST);
        Ok(())
    }

    #[test]
    fn builder_truncates_start_address_to_24_bits() -> Result<(), Box<dyn Error>> {
        let mut buf = [0; REQUEST_LEN];
        let request = Request::<&[u8]>::builder(&mut buf)?
            .start_address(0xAB12_3456)
            .build();
        assert_eq!(request.start_address(), 0x12_3456);
        Ok(())
    }
}
