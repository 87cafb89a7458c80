//! Human readable rendering of decoded frames.
//!
//! The reporter only formats what it is given; deciding what is worth
//! reporting is left to the caller.
use crate::analyzer::Summary;
use crate::decode::{Message, Skip};
use crate::Malformed;
use std::io::{self, Write};

/// Writes field dumps and status lines to a sink, one frame at a time.
#[derive(Debug)]
pub struct Reporter<W: Write> {
    out: W,
}

impl<W: Write> Reporter<W> {
    #[inline]
    #[must_use]
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Dump every field of a decoded message, layer by layer.
    ///
    /// # Errors
    ///
    /// Fails when the sink does.
    pub fn message(&mut self, index: usize, message: &Message<'_>) -> io::Result<()> {
        let out = &mut self.out;
        let request = &message.request;

        writeln!(
            out,
            "===== {} (frame {index}) {} -> {} =====",
            message.direction, message.source, message.dest
        )?;

        let iso = request.iso();
        writeln!(out, "ISO protocol = 0x{:02x}", iso.protocol_id())?;
        writeln!(
            out,
            "ISO length = {} (packet length {})",
            iso.len(),
            request.len()
        )?;
        writeln!(out, "ISO param length = {}", iso.param_len())?;
        writeln!(out, "ISO function = {}", iso.function())?;
        writeln!(out, "ISO tpdu = 0x{:02x}", iso.tpdu())?;

        let ibh = request.ibh();
        writeln!(out, "IBH channel = 0x{:04x}", ibh.channel())?;
        writeln!(out, "IBH len = {}", ibh.len())?;
        writeln!(out, "IBH seq = {}", ibh.sequence())?;
        writeln!(out, "IBH sflags = 0x{:04x}", ibh.send_flags())?;
        writeln!(out, "IBH rflags = 0x{:04x}", ibh.recv_flags())?;

        writeln!(out, "Prefix = 0x{:04x}", request.prefix())?;
        writeln!(out, "Reserved = 0x{:02x}", request.reserved())?;
        writeln!(out, "Read size = {}", request.read_size())?;
        writeln!(out, "Read length = {}", request.read_length())?;
        writeln!(out, "DB number = {}", request.db_number())?;
        writeln!(out, "Area code = 0x{:02x}", request.area_code())?;
        writeln!(out, "Start address = 0x{:06x}", request.start_address())
    }

    /// Write a one line status for a skipped frame.
    ///
    /// # Errors
    ///
    /// Fails when the sink does.
    pub fn skip(&mut self, index: usize, skip: &Skip) -> io::Result<()> {
        writeln!(self.out, "frame {index}: {skip}")
    }

    /// Write a one line status naming the invariant a frame broke.
    ///
    /// # Errors
    ///
    /// Fails when the sink does.
    pub fn malformed(&mut self, index: usize, err: &Malformed) -> io::Result<()> {
        writeln!(self.out, "frame {index}: malformed packet: {err}")
    }

    /// Write the totals for a run.
    ///
    /// # Errors
    ///
    /// Fails when the sink does.
    pub fn summary(&mut self, summary: &Summary) -> io::Result<()> {
        writeln!(
            self.out,
            "{} frames: {} requests, {} responses, {} skipped, {} malformed",
            summary.frames, summary.requests, summary.responses, summary.skipped, summary.malformed
        )?;
        self.out.flush()
    }

    /// Give back the sink.
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }
}
