//! The outer ISO transport header.
//!
//! Seven bytes: an RFC 1006 style packet header (protocol identifier, a
//! reserved byte and the total message length) followed by the transport
//! header's length indicator, function code and TPDU number.
use byteorder::{ByteOrder, NetworkEndian};
use std::fmt;

/// View over an outer transport header.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct IsoHeader<B: AsRef<[u8]>> {
    buf: B,
}

impl<B: AsRef<[u8]>> IsoHeader<B> {
    // Callers must have checked the buffer holds at least HEADER_LEN bytes.
    #[inline]
    pub(crate) fn new(buf: B) -> Self {
        Self { buf }
    }

    /// Extract the protocol identifier. Always [`PROTOCOL_ID`] for valid
    /// traffic.
    #[inline]
    #[must_use]
    pub fn protocol_id(&self) -> u8 {
        self.buf.as_ref()[offsets::PROTOCOL_ID]
    }

    /// Extract the reserved byte.
    #[inline]
    #[must_use]
    pub fn reserved(&self) -> u8 {
        self.buf.as_ref()[offsets::RESERVED]
    }

    /// Extract the claimed length of the whole message, this header included.
    #[inline]
    #[must_use]
    pub fn len(&self) -> u16 {
        NetworkEndian::read_u16(&self.buf.as_ref()[offsets::LEN])
    }

    /// Extract the transport header length indicator.
    #[inline]
    #[must_use]
    pub fn param_len(&self) -> u8 {
        self.buf.as_ref()[offsets::PARAM_LEN]
    }

    /// Extract the function code.
    #[inline]
    #[must_use]
    pub fn function(&self) -> Function {
        Function::from(self.buf.as_ref()[offsets::FUNCTION])
    }

    /// Extract the TPDU number.
    #[inline]
    #[must_use]
    pub fn tpdu(&self) -> u8 {
        self.buf.as_ref()[offsets::TPDU]
    }
}

mod offsets {
    use std::ops::Range;
    pub(crate) const PROTOCOL_ID: usize = 0;
    pub(crate) const RESERVED: usize = 1;
    pub(crate) const LEN: Range<usize> = 2..4;
    pub(crate) const PARAM_LEN: usize = 4;
    pub(crate) const FUNCTION: usize = 5;
    pub(crate) const TPDU: usize = 6;
}

/// What the transport header carries.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Function {
    PduTransport,
    Connect,
    Unknown(u8),
}

impl From<u8> for Function {
    fn from(value: u8) -> Self {
        match value {
            FUNCTION_PDU_TRANSPORT => Function::PduTransport,
            FUNCTION_CONNECT => Function::Connect,
            _ => Function::Unknown(value),
        }
    }
}

impl From<Function> for u8 {
    fn from(value: Function) -> Self {
        match value {
            Function::PduTransport => FUNCTION_PDU_TRANSPORT,
            Function::Connect => FUNCTION_CONNECT,
            Function::Unknown(value) => value,
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::PduTransport => f.write_str("PDU Transport"),
            Function::Connect => f.write_str("Connect to rack"),
            Function::Unknown(value) => write!(f, "UNKNOWN (0x{value:02x})"),
        }
    }
}

/// Size of the outer transport header.
pub const HEADER_LEN: usize = 7;

/// The only protocol identifier this decoder accepts.
pub const PROTOCOL_ID: u8 = 0x03;

const FUNCTION_PDU_TRANSPORT: u8 = 0xF0;
const FUNCTION_CONNECT: u8 = 0xE0;
