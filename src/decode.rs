//! The per-frame decode chain.
//!
//! [`decode_frame`] peels Ethernet, IPv4 and TCP off a captured frame,
//! classifies the segment by port, and decodes the protocol request it
//! carries. Each frame is decoded on its own; nothing is remembered between
//! calls.
use crate::config::Config;
use crate::dispatch::Direction;
use crate::enet::{self, EtherType};
use crate::ipv4::{self, Protocol};
use crate::request::Request;
use crate::{tcp, Malformed};
use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};

/// What came of decoding one frame.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Outcome<'a> {
    Decoded(Message<'a>),
    Skipped(Skip),
}

/// A validated protocol message and where it was going.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Message<'a> {
    pub direction: Direction,
    pub source: SocketAddrV4,
    pub dest: SocketAddrV4,
    pub request: Request<&'a [u8]>,
}

/// Why a frame isn't protocol traffic. None of these are errors.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Skip {
    FrameTooShort(usize),
    Arp,
    UnknownEtherType(u16),
    PacketTooShort(usize),
    UnhandledIpProtocol(Protocol),
    SegmentTooShort(usize),
    PayloadTooShort(usize),
    UnknownConnection { source: u16, dest: u16 },
}

impl Skip {
    /// Whether this skip deserves a status line. Runts, ARP and payloads too
    /// small to hold a request are routine and stay quiet.
    #[inline]
    #[must_use]
    pub fn is_reported(&self) -> bool {
        matches!(
            self,
            Skip::UnknownEtherType(_)
                | Skip::UnhandledIpProtocol(_)
                | Skip::UnknownConnection { .. }
        )
    }
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Skip::FrameTooShort(len) => write!(f, "frame too short ({len} bytes)"),
            Skip::Arp => f.write_str("ARP frame"),
            Skip::UnknownEtherType(typ) => write!(f, "unknown ethernet protocol = 0x{typ:04x}"),
            Skip::PacketTooShort(len) => write!(f, "IPv4 packet too short ({len} bytes)"),
            Skip::UnhandledIpProtocol(Protocol::Udp) => {
                write!(f, "unhandled IP protocol {} (UDP)", u8::from(Protocol::Udp))
            }
            Skip::UnhandledIpProtocol(protocol) => {
                write!(f, "unhandled IP protocol {}", u8::from(*protocol))
            }
            Skip::SegmentTooShort(len) => write!(f, "TCP segment too short ({len} bytes)"),
            Skip::PayloadTooShort(len) => {
                write!(f, "TCP payload too short for a request ({len} bytes)")
            }
            Skip::UnknownConnection { source, dest } => {
                write!(f, "unknown connection at dest port = {dest}, src port = {source}")
            }
        }
    }
}

/// Decode one captured frame.
///
/// # Errors
///
/// Returns [`Malformed`] when bytes routed to a decoder break one of its
/// invariants. Frames that simply aren't protocol traffic come back as
/// [`Outcome::Skipped`] instead.
pub fn decode_frame<'a>(bytes: &'a [u8], config: &Config) -> Result<Outcome<'a>, Malformed> {
    let Ok(frame) = enet::Frame::new(bytes) else {
        return Ok(Outcome::Skipped(Skip::FrameTooShort(bytes.len())));
    };

    match frame.ethertype() {
        EtherType::Ipv4 => decode_ipv4(frame.payload(), config),
        EtherType::Arp => Ok(Outcome::Skipped(Skip::Arp)),
        EtherType::Unknown(typ) => Ok(Outcome::Skipped(Skip::UnknownEtherType(typ))),
    }
}

fn decode_ipv4<'a>(bytes: &'a [u8], config: &Config) -> Result<Outcome<'a>, Malformed> {
    let Ok(packet) = ipv4::Packet::new(bytes) else {
        return Ok(Outcome::Skipped(Skip::PacketTooShort(bytes.len())));
    };

    if packet.version() != 4 {
        return Err(Malformed::IpVersion(packet.version()));
    }

    match packet.protocol() {
        Protocol::Tcp => {
            let header_len = packet.header_len();
            if !(ipv4::HEADER_LEN..=ipv4::MAX_HEADER_LEN).contains(&header_len) {
                return Err(Malformed::IpHeaderLen(header_len));
            }
            let Some(payload) = packet.payload() else {
                return Err(Malformed::IpHeaderTruncated {
                    header_len,
                    available: bytes.len(),
                });
            };
            decode_tcp(payload, packet.source(), packet.dest(), config)
        }
        protocol => Ok(Outcome::Skipped(Skip::UnhandledIpProtocol(protocol))),
    }
}

fn decode_tcp<'a>(
    bytes: &'a [u8],
    source_addr: Ipv4Addr,
    dest_addr: Ipv4Addr,
    config: &Config,
) -> Result<Outcome<'a>, Malformed> {
    let Ok(segment) = tcp::Segment::new(bytes) else {
        return Ok(Outcome::Skipped(Skip::SegmentTooShort(bytes.len())));
    };

    let header_len = segment.header_len();
    if header_len < tcp::HEADER_LEN {
        return Err(Malformed::TcpHeaderLen(header_len));
    }
    let Some(payload) = segment.payload() else {
        return Err(Malformed::TcpHeaderTruncated {
            header_len,
            available: bytes.len(),
        });
    };

    let Ok(request) = Request::new(payload) else {
        return Ok(Outcome::Skipped(Skip::PayloadTooShort(payload.len())));
    };

    let (source, dest) = (segment.source(), segment.dest());
    let Some(direction) = Direction::classify(source, dest) else {
        return Ok(Outcome::Skipped(Skip::UnknownConnection { source, dest }));
    };

    request.validate(config)?;

    Ok(Outcome::Decoded(Message {
        direction,
        source: SocketAddrV4::new(source_addr, source),
        dest: SocketAddrV4::new(dest_addr, dest),
        request,
    }))
}
