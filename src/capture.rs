//! Capture file input.
//!
//! Reads legacy pcap and pcapng files with [`pcap_parser`] and hands each
//! captured packet record to a callback, in capture order. The record's bytes
//! are only borrowed for the duration of the call.
use crate::{Error, Result};
use pcap_parser::pcapng::Block;
use pcap_parser::traits::PcapReaderIterator;
use pcap_parser::{create_reader, Linktype, PcapBlockOwned, PcapError};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One captured link-layer record.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Record<'a> {
    /// Position of the record in the capture, starting at 1.
    pub index: usize,
    /// Number of bytes the capture claims were captured.
    pub caplen: u32,
    /// The captured bytes, never longer than `caplen`.
    pub data: &'a [u8],
}

/// An open capture source.
pub struct Capture<'r> {
    reader: Box<dyn PcapReaderIterator + 'r>,
    frames: usize,
    linktype: Option<Linktype>,
}

impl Capture<'static> {
    /// Open a pcap or pcapng file.
    ///
    /// # Errors
    ///
    /// Fails when the file can't be opened or doesn't start with a known
    /// capture header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path).map_err(Error::IoError)?;
        Self::from_reader(file)
    }
}

impl<'r> Capture<'r> {
    /// Read a capture from any byte stream.
    ///
    /// # Errors
    ///
    /// Fails when the stream doesn't start with a known capture header.
    pub fn from_reader<R: Read + Send + 'r>(reader: R) -> Result<Self> {
        let reader = create_reader(BUFFER_SIZE, reader)
            .map_err(|e| Error::Capture(format!("unrecognized capture format: {e}")))?;
        Ok(Self {
            reader,
            frames: 0,
            linktype: None,
        })
    }

    /// Number of packet records handed out so far.
    #[inline]
    #[must_use]
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Link type announced by the capture, once a header has been read.
    #[inline]
    #[must_use]
    pub fn linktype(&self) -> Option<Linktype> {
        self.linktype
    }

    /// Call `f` with every packet record until the capture ends.
    ///
    /// # Errors
    ///
    /// Stops at the first error returned by `f`, or when the capture itself
    /// is corrupt.
    pub fn for_each<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(Record<'_>) -> Result<()>,
    {
        loop {
            match self.reader.next() {
                Ok((offset, block)) => {
                    let packet = match block {
                        PcapBlockOwned::Legacy(b) => Some((b.caplen, b.data)),
                        PcapBlockOwned::LegacyHeader(header) => {
                            self.linktype = Some(header.network);
                            check_linktype(header.network);
                            None
                        }
                        PcapBlockOwned::NG(Block::InterfaceDescription(idb)) => {
                            self.linktype = Some(idb.linktype);
                            check_linktype(idb.linktype);
                            None
                        }
                        PcapBlockOwned::NG(Block::EnhancedPacket(epb)) => {
                            Some((epb.caplen, epb.data))
                        }
                        PcapBlockOwned::NG(Block::SimplePacket(spb)) => {
                            Some((spb.origlen, spb.data))
                        }
                        PcapBlockOwned::NG(_) => None,
                    };

                    let result = match packet {
                        Some((caplen, data)) => {
                            self.frames += 1;
                            let len = data.len().min(caplen as usize);
                            f(Record {
                                index: self.frames,
                                caplen,
                                data: &data[..len],
                            })
                        }
                        None => Ok(()),
                    };

                    self.reader.consume(offset);
                    result?;
                }
                Err(PcapError::Eof) => break,
                Err(PcapError::Incomplete(_)) => {
                    self.reader
                        .refill()
                        .map_err(|e| Error::Capture(format!("refill error: {e}")))?;
                }
                Err(e) => return Err(Error::Capture(format!("parse error: {e}"))),
            }
        }

        tracing::debug!(frames = self.frames, "end of capture");
        Ok(())
    }
}

// Returns whether frames of this link type can be decoded.
fn check_linktype(linktype: Linktype) -> bool {
    if linktype == Linktype::ETHERNET {
        tracing::debug!(?linktype, "capture header");
        true
    } else {
        tracing::warn!(?linktype, "capture is not Ethernet, frames will likely be skipped");
        false
    }
}

// Size of the read buffer, enough for any Ethernet frame.
const BUFFER_SIZE: usize = 65536;
