//! The frame processing loop.
//!
//! An [`Analyzer`] takes captured records one at a time, decodes them, sends
//! the result to a [`Reporter`] and keeps count. It decides what happens to
//! malformed frames according to its [`Policy`].
use crate::capture::Record;
use crate::config::Config;
use crate::decode::{decode_frame, Outcome};
use crate::dispatch::Direction;
use crate::report::Reporter;
use crate::{Error, Result};
use std::io::Write;

/// What to do when a frame is malformed.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Default)]
pub enum Policy {
    /// Report the frame and carry on with the next one.
    #[default]
    Continue,
    /// Report the frame and stop the run with an error.
    FailFast,
}

/// Running totals for one capture.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Default)]
pub struct Summary {
    pub frames: usize,
    pub requests: usize,
    pub responses: usize,
    pub skipped: usize,
    pub malformed: usize,
}

/// Decodes and reports captured records.
#[derive(Debug)]
pub struct Analyzer<W: Write> {
    config: Config,
    policy: Policy,
    reporter: Reporter<W>,
    summary: Summary,
}

impl<W: Write> Analyzer<W> {
    #[must_use]
    pub fn new(config: Config, policy: Policy, out: W) -> Self {
        Self {
            config,
            policy,
            reporter: Reporter::new(out),
            summary: Summary::default(),
        }
    }

    /// Decode and report a single record.
    ///
    /// # Errors
    ///
    /// Fails when the report can't be written, or with
    /// [`Error::MalformedFrame`] under [`Policy::FailFast`].
    pub fn process(&mut self, record: Record<'_>) -> Result<()> {
        let index = record.index;
        self.summary.frames += 1;

        match decode_frame(record.data, &self.config) {
            Ok(Outcome::Decoded(message)) => {
                match message.direction {
                    Direction::Request => self.summary.requests += 1,
                    Direction::Response => self.summary.responses += 1,
                }
                self.reporter
                    .message(index, &message)
                    .map_err(Error::IoError)
            }
            Ok(Outcome::Skipped(skip)) => {
                self.summary.skipped += 1;
                if skip.is_reported() {
                    self.reporter.skip(index, &skip).map_err(Error::IoError)
                } else {
                    tracing::debug!(frame = index, %skip, "skipped");
                    Ok(())
                }
            }
            Err(err) => {
                self.summary.malformed += 1;
                tracing::warn!(frame = index, %err, "malformed packet");
                self.reporter.malformed(index, &err).map_err(Error::IoError)?;
                match self.policy {
                    Policy::Continue => Ok(()),
                    Policy::FailFast => Err(Error::MalformedFrame { index, source: err }),
                }
            }
        }
    }

    /// Totals so far.
    #[inline]
    #[must_use]
    pub fn summary(&self) -> Summary {
        self.summary
    }

    /// Write the summary line and give back the totals and the sink.
    ///
    /// # Errors
    ///
    /// Fails when the summary can't be written.
    pub fn finish(mut self) -> Result<(Summary, W)> {
        self.reporter
            .summary(&self.summary)
            .map_err(Error::IoError)?;
        Ok((self.summary, self.reporter.into_inner()))
    }
}
