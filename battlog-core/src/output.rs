//! Output writers for decoded events.
//!
//! The console report mirrors what the logger's operators are used to
//! reading; the CSV writer is for loading a discharge curve elsewhere.

use crate::frame;
use crate::types::Event;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output writing.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Human-readable report of one event.
///
/// ```text
/// Resolution : +/- 0.010
/// 5 min. : 1.25 V
/// 8 min. : 2.49 V
///
/// 5; 8;
/// 1.25; 2.49;
/// ```
pub struct ReportWriter<W: Write> {
    writer: W,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes the smallest voltage step the logger can resolve.
    pub fn write_resolution(&mut self, max_voltage: f64) -> Result<(), OutputError> {
        writeln!(
            self.writer,
            "Resolution : +/- {:.3}",
            frame::resolution(max_voltage)
        )?;
        Ok(())
    }

    /// Writes one line per sample.
    pub fn write_samples(&mut self, event: &Event) -> Result<(), OutputError> {
        for sample in event {
            writeln!(
                self.writer,
                "{} min. : {:.2} V",
                sample.elapsed_time, sample.voltage
            )?;
        }
        Ok(())
    }

    /// Writes the times and voltages as two semicolon-separated lists.
    pub fn write_lists(&mut self, event: &Event) -> Result<(), OutputError> {
        writeln!(self.writer)?;
        let times: Vec<String> = event.times().map(|t| format!("{};", t)).collect();
        writeln!(self.writer, "{}", times.join(" "))?;
        let voltages: Vec<String> = event.voltages().map(|v| format!("{:.2};", v)).collect();
        writeln!(self.writer, "{}", voltages.join(" "))?;
        Ok(())
    }

    /// Writes the full report.
    pub fn write_report(&mut self, event: &Event, max_voltage: f64) -> Result<(), OutputError> {
        self.write_resolution(max_voltage)?;
        self.write_samples(event)?;
        self.write_lists(event)?;
        self.flush()
    }

    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// CSV writer for samples.
pub struct CsvWriter<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> CsvWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    pub fn write_header(&mut self) -> Result<(), OutputError> {
        writeln!(self.writer, "elapsed_time,voltage")?;
        Ok(())
    }

    pub fn write_event(&mut self, event: &Event) -> Result<(), OutputError> {
        for sample in event {
            writeln!(self.writer, "{},{}", sample.elapsed_time, sample.voltage)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes an event to a CSV file.
pub fn write_csv<P: AsRef<Path>>(path: P, event: &Event) -> Result<(), OutputError> {
    let file = File::create(path)?;
    let mut writer = CsvWriter::new(file);
    writer.write_header()?;
    writer.write_event(event)?;
    writer.flush()?;
    Ok(())
}
