//! Decoder library for serial battery-voltage loggers.
//!
//! The logger (an MSP430 board sampling a battery through its ADC) sends its
//! recorded discharge curve as a small binary frame over a 9600 baud UART.
//! This crate decodes those frames into `(elapsed time, voltage)` samples.
//!
//! # Example
//!
//! ```
//! use battlog_core::EventDecoder;
//! use std::io::Cursor;
//!
//! let bytes = vec![0x02, 0x05, 0x80, 0x03, 0xFF, 0xFF];
//! let mut decoder = EventDecoder::new(Cursor::new(bytes));
//! let event = decoder.read_event().unwrap();
//!
//! assert_eq!(event.len(), 2);
//! assert_eq!(event.samples()[0].voltage, 1.25);
//! ```
//!
//! # Features
//!
//! - Single-byte pull decoder over any `std::io::Read`
//! - Frame encoder matching the logger firmware
//! - Interruptible reads for polling serial ports
//! - Console report and CSV output

pub mod decoder;
pub mod frame;
pub mod output;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use decoder::{DecodeError, DecodeState, EventDecoder, FailureKind};
pub use frame::{FrameError, TERMINATOR};
pub use output::{OutputError, ReportWriter};
pub use transport::InterruptibleReader;
pub use types::{DecoderConfig, Event, RawSample, Sample};
