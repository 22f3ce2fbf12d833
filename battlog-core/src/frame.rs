//! Wire format of a logger frame.
//!
//! ```text
//! [count:1] [time_delta:1 raw_voltage:1] x count [0xFF]
//! ```
//!
//! All fields are single unsigned bytes. Time deltas are relative to the
//! previous sample; raw voltages are the ADC10 reading shifted down to 8 bits.

use crate::types::RawSample;
use byteorder::WriteBytesExt;
use std::io::Write;
use thiserror::Error;

/// End-of-frame marker.
pub const TERMINATOR: u8 = 0xFF;

/// Largest sample count a frame can declare.
pub const MAX_SAMPLES: usize = u8::MAX as usize;

/// Number of steps in an 8-bit reading.
const ADC_STEPS: f64 = 256.0;

/// Errors that can occur while encoding a frame.
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Too many samples for one frame: {0} (max {MAX_SAMPLES})")]
    TooManySamples(usize),
}

/// Converts a raw 8-bit reading to volts.
#[inline]
pub fn raw_to_volts(raw: u8, max_voltage: f64) -> f64 {
    raw as f64 * max_voltage / ADC_STEPS
}

/// Voltage covered by one raw step.
#[inline]
pub fn resolution(max_voltage: f64) -> f64 {
    max_voltage / ADC_STEPS
}

/// Writes one frame to `writer`.
pub fn write_frame<W: Write>(writer: &mut W, samples: &[RawSample]) -> Result<(), FrameError> {
    if samples.len() > MAX_SAMPLES {
        return Err(FrameError::TooManySamples(samples.len()));
    }

    writer.write_u8(samples.len() as u8)?;
    for sample in samples {
        writer.write_u8(sample.time_delta)?;
        writer.write_u8(sample.raw_voltage)?;
    }
    writer.write_u8(TERMINATOR)?;
    Ok(())
}

/// Encodes one frame into a new buffer.
pub fn encode_frame(samples: &[RawSample]) -> Result<Vec<u8>, FrameError> {
    let mut buf = Vec::with_capacity(samples.len() * 2 + 2);
    write_frame(&mut buf, samples)?;
    Ok(buf)
}
