//! Frame decoder for the battery logger's serial stream.
//!
//! Decoding is a linear pull over single-byte reads: count, then sample
//! pairs, then the terminator. Any failed read aborts the whole event.

use crate::frame::{self, TERMINATOR};
use crate::types::{DecoderConfig, Event, Sample};
use log::{debug, trace, warn};
use std::fmt;
use std::io::{ErrorKind, Read};
use thiserror::Error;

/// Errors that can occur while decoding an event.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Timed out while {0}")]
    Timeout(DecodeState),

    #[error("Malformed data: expected terminator 0xFF, got {found:#04x}")]
    MalformedData { found: u8 },

    #[error("Interrupted by user")]
    Interrupted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure categories reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    MalformedData,
    UserInterrupt,
    Other,
}

impl DecodeError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Timeout(_) => FailureKind::Timeout,
            Self::MalformedData { .. } => FailureKind::MalformedData,
            Self::Interrupted => FailureKind::UserInterrupt,
            Self::Io(_) => FailureKind::Other,
        }
    }
}

/// Position of the decoder within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    AwaitingCount,
    ReadingSample { index: u8, count: u8 },
    AwaitingTerminator,
    Done,
    Failed,
}

impl fmt::Display for DecodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingCount => write!(f, "awaiting sample count"),
            Self::ReadingSample { index, count } => {
                write!(f, "reading sample {} of {}", *index as u16 + 1, count)
            }
            Self::AwaitingTerminator => write!(f, "awaiting frame terminator"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Decodes framed events from a byte source.
///
/// The source is expected to block for at most its configured timeout and to
/// report an elapsed timeout as a zero-length read or `ErrorKind::TimedOut`.
#[derive(Debug)]
pub struct EventDecoder<R> {
    reader: R,
    config: DecoderConfig,
    state: DecodeState,
}

impl<R: Read> EventDecoder<R> {
    /// Creates a decoder with the default configuration.
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, DecoderConfig::default())
    }

    pub fn with_config(reader: R, config: DecoderConfig) -> Self {
        Self {
            reader,
            config,
            state: DecodeState::AwaitingCount,
        }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// State after the last read; `Failed` if the last event aborted.
    pub fn state(&self) -> DecodeState {
        self.state
    }

    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Reads and decodes one complete event.
    ///
    /// Nothing is returned for a partially read frame; the bytes already
    /// consumed are lost.
    pub fn read_event(&mut self) -> Result<Event, DecodeError> {
        self.state = DecodeState::AwaitingCount;
        match self.decode_frame() {
            Ok(event) => {
                self.state = DecodeState::Done;
                debug!("Decoded event with {} samples", event.len());
                Ok(event)
            }
            Err(e) => {
                self.state = DecodeState::Failed;
                Err(e)
            }
        }
    }

    fn decode_frame(&mut self) -> Result<Event, DecodeError> {
        let count = self.read_byte()?;
        trace!("Frame declares {} samples", count);

        let mut samples = Vec::with_capacity(count as usize);
        let mut elapsed_time = 0u32;

        for index in 0..count {
            self.state = DecodeState::ReadingSample { index, count };

            let delta = self.read_byte()?;
            elapsed_time = elapsed_time.saturating_add(self.config.scaled_delta(delta));

            let raw = self.read_byte()?;
            let voltage = frame::raw_to_volts(raw, self.config.max_voltage);

            trace!(
                "Sample {}: delta={} raw={:#04x} -> ({}, {:.4} V)",
                index,
                delta,
                raw,
                elapsed_time,
                voltage
            );
            samples.push(Sample::new(elapsed_time, voltage));
        }

        self.state = DecodeState::AwaitingTerminator;
        let terminator = self.read_byte()?;
        if terminator != TERMINATOR {
            warn!("Bad frame terminator {:#04x}", terminator);
            return Err(DecodeError::MalformedData { found: terminator });
        }

        Ok(Event::new(samples))
    }

    /// Reads a single byte, mapping the transport's failure modes.
    fn read_byte(&mut self) -> Result<u8, DecodeError> {
        let mut buf = [0u8; 1];
        match self.reader.read(&mut buf) {
            Ok(0) => Err(DecodeError::Timeout(self.state)),
            Ok(_) => Ok(buf[0]),
            Err(e) if e.kind() == ErrorKind::TimedOut => Err(DecodeError::Timeout(self.state)),
            Err(e) if e.kind() == ErrorKind::Interrupted => Err(DecodeError::Interrupted),
            Err(e) => Err(DecodeError::Io(e)),
        }
    }
}
