//! Offline decoding of PROFINET-over-TCP traffic.
//!
//! Captured frames are peeled layer by layer: Ethernet, IPv4, TCP, then the
//! protocol's own framing (an ISO transport header, an inner block header and
//! a fixed-layout request body). Segments to or from the well-known port 102
//! are decoded and reported; everything else is skipped.
//!
//! ## Header views
//!
//! Every layer is a thin view over a borrowed byte buffer, like
//! [`enet::Frame`] or [`request::Request`]. The constructor checks the buffer
//! is long enough for the fixed part of the header exactly once, after which
//! every accessor reads its field at a known offset with an explicit width and
//! network byte order. Nothing is copied or allocated while decoding.
//!
//! ## Errors
//!
//! Decoding distinguishes two failure classes:
//!
//! * [`decode::Skip`]: the frame simply isn't protocol traffic (too short, ARP,
//!   UDP, unrelated ports). These are expected and never abort anything.
//! * [`Malformed`]: the bytes were routed to a decoder but break one of its
//!   structural invariants (wrong IP version, bad protocol identifier, length
//!   mismatch, and so on). These are reported against the offending frame.
//!
//! See [`decode::decode_frame`] for the entry point.
#![warn(clippy::pedantic)]
#![allow(clippy::double_must_use)]
#![allow(clippy::len_without_is_empty)]
#![allow(clippy::module_name_repetitions)]

pub mod analyzer;
pub mod capture;
pub mod config;
pub mod decode;
pub mod dispatch;
pub mod enet;
pub mod ibh;
pub mod ipv4;
pub mod iso;
pub mod report;
pub mod request;
pub mod tcp;

/// Utility wrapper for packet parsing results.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong outside of decoding a single frame.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid argument: {0}")]
    CannotParse(&'static str),
    #[error("not enough space: {0}")]
    NotEnoughSpace(&'static str),
    #[error("io error: {0}")]
    IoError(std::io::Error),
    #[error("capture error: {0}")]
    Capture(String),
    #[error("frame {index}: malformed packet: {source}")]
    MalformedFrame {
        index: usize,
        #[source]
        source: Malformed,
    },
}

/// A structural invariant broken by bytes that were routed to a decoder.
#[derive(thiserror::Error, Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Malformed {
    #[error("bad IP version {0}, expected 4")]
    IpVersion(u8),
    #[error("IPv4 header length {0} outside 20..=60")]
    IpHeaderLen(usize),
    #[error("IPv4 header length {header_len} exceeds {available} captured bytes")]
    IpHeaderTruncated { header_len: usize, available: usize },
    #[error("TCP header length {0} is below the minimum of 20")]
    TcpHeaderLen(usize),
    #[error("TCP header length {header_len} exceeds {available} captured bytes")]
    TcpHeaderTruncated { header_len: usize, available: usize },
    #[error("bad protocol identifier 0x{0:02x}")]
    ProtocolId(u8),
    #[error("unknown function 0x{0:02x}")]
    UnknownFunction(u8),
    #[error("unexpected channel id {found}, expected {expected}")]
    Channel { found: u16, expected: u16 },
    #[error("claimed length {claimed} does not match payload length {actual}")]
    Length { claimed: u16, actual: usize },
}

// Read all the bytes from `src` and write them into `dst`.
//
// # Errors
//
// Returns an error when [`Read`](std::io::Read) returns any error other
// than [`ErrorKind::Interrupted`](std::io::ErrorKind::Interrupted).
pub(crate) fn write_all_bytes<R: std::io::Read>(mut src: R, dst: &mut [u8]) -> Result<()> {
    let mut read = 0;
    while read < dst.len() {
        match src.read(&mut dst[read..]) {
            Ok(0) => break,
            Ok(n) => read += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::IoError(e)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{write_all_bytes, Malformed};
    use std::error::Error;

    #[test]
    fn write_all_bytes_fills_destination_in_order() -> Result<(), Box<dyn Error>> {
        let mut dst = [0; 4];
        write_all_bytes([1, 2, 3, 4, 5].as_slice(), &mut dst)?;
        assert_eq!(dst, [1, 2, 3, 4]);
        Ok(())
    }

    #[test]
    fn write_all_bytes_stops_when_source_runs_out() -> Result<(), Box<dyn Error>> {
        let mut dst = [9; 4];
        write_all_bytes([1, 2].as_slice(), &mut dst)?;
        assert_eq!(dst, [1, 2, 9, 9]);
        Ok(())
    }

    #[test]
    fn malformed_names_the_failed_invariant() {
        assert_eq!(
            Malformed::ProtocolId(0xFF).to_string(),
            "bad protocol identifier 0xff"
        );
        assert_eq!(
            Malformed::Length { claimed: 30, actual: 27 }.to_string(),
            "claimed length 30 does not match payload length 27"
        );
    }
}
