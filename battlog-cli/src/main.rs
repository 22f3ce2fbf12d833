//! Battery logger CLI application.
//!
//! Reads battery-voltage events from a serial data logger and prints them.

use anyhow::{Context, Result};
use battlog_core::transport::{InterruptibleReader, POLL_INTERVAL};
use battlog_core::{output, DecodeError, DecoderConfig, EventDecoder, FailureKind, ReportWriter};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use serialport::SerialPort;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const EXIT_FAILURE: u8 = 1;

/// Exit status after a Ctrl-C, as a shell would report it.
const EXIT_INTERRUPTED: u8 = 130;

type SerialDecoder = EventDecoder<InterruptibleReader<Box<dyn SerialPort>>>;

/// Battery-voltage event reader for serial data loggers.
///
/// Waits for the logger to transmit its recorded samples, then prints each
/// sample's cumulative time and voltage.
#[derive(Parser, Debug)]
#[command(name = "battlog")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Serial port the logger is connected to (e.g. /dev/ttyUSB0, COM3)
    #[arg(value_name = "PORT")]
    port: String,

    /// Baud rate of the logger's UART
    #[arg(short, long, default_value_t = 9600)]
    baud: u32,

    /// Seconds to wait for each byte before giving up
    #[arg(short, long, default_value_t = 45.0)]
    timeout: f64,

    /// ADC reference voltage, in volts
    #[arg(short, long, default_value_t = 2.5)]
    max_voltage: f64,

    /// Scale factor for one time-delta unit
    #[arg(long, default_value_t = 1)]
    time_step: u32,

    /// Multiply each time delta by --time-step
    ///
    /// By default deltas are summed as transmitted.
    #[arg(long)]
    apply_time_scale: bool,

    /// Also write the samples to this CSV file
    ///
    /// With --follow, the file holds the most recent event.
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,

    /// Keep reading events until interrupted or an error occurs
    #[arg(short, long)]
    follow: bool,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn decoder_config(&self) -> Result<DecoderConfig> {
        if !(self.max_voltage.is_finite() && self.max_voltage > 0.0) {
            anyhow::bail!(
                "Invalid max voltage: {} (must be a positive number of volts)",
                self.max_voltage
            );
        }

        Ok(DecoderConfig {
            time_between_samples: self.time_step,
            max_voltage: self.max_voltage,
            apply_time_scale: self.apply_time_scale,
        })
    }

    fn read_timeout(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.timeout)
            .with_context(|| format!("Invalid timeout: {}", self.timeout))
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    println!("Starting");

    let interrupt = Arc::new(AtomicBool::new(false));
    let handler_flag = interrupt.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst)) {
        warn!("Could not install Ctrl-C handler: {}", e);
    }

    let result = open_decoder(&args, interrupt).and_then(|mut decoder| {
        let outcome = run(&args, &mut decoder);
        // Dropping the decoder closes the port before anything is reported
        drop(decoder);
        debug!("Closed serial port {}", args.port);
        outcome
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let status = report_failure(&e, &mut io::stdout().lock()).unwrap_or(EXIT_FAILURE);
            ExitCode::from(status)
        }
    }
}

/// Opens the serial port and wraps it in a decoder.
fn open_decoder(args: &Args, interrupt: Arc<AtomicBool>) -> Result<SerialDecoder> {
    let timeout = args.read_timeout()?;
    let config = args.decoder_config()?;
    let port = serialport::new(&args.port, args.baud)
        .timeout(POLL_INTERVAL.min(timeout))
        .open()
        .with_context(|| format!("Failed to open serial port {}", args.port))?;
    info!(
        "Opened {} at {} baud, {:.1}s read timeout",
        args.port,
        args.baud,
        timeout.as_secs_f64()
    );

    let reader = InterruptibleReader::new(port, timeout, interrupt);
    Ok(EventDecoder::with_config(reader, config))
}

/// Reads one event (or, with `--follow`, events until failure) and prints it.
fn run(args: &Args, decoder: &mut SerialDecoder) -> Result<()> {
    let config = *decoder.config();

    loop {
        let progress = waiting_spinner(args);
        let event = decoder.read_event();
        progress.finish_and_clear();
        let event = event?;

        info!("Received event with {} samples", event.len());

        ReportWriter::new(io::stdout().lock())
            .write_report(&event, config.max_voltage)
            .context("Failed to write report")?;

        if let Some(csv_path) = &args.csv {
            output::write_csv(csv_path, &event)
                .with_context(|| format!("Failed to write CSV to {:?}", csv_path))?;
            debug!("Wrote {} samples to {:?}", event.len(), csv_path);
        }

        if !args.follow {
            return Ok(());
        }
    }
}

fn waiting_spinner(args: &Args) -> ProgressBar {
    if args.quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(format!("Waiting for data on {}...", args.port));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Classifies a failed run; anything that is not a decode error is `Other`.
fn failure_kind(err: &anyhow::Error) -> FailureKind {
    err.downcast_ref::<DecodeError>()
        .map_or(FailureKind::Other, DecodeError::kind)
}

/// Writes the user-facing message for a failed run and returns the exit status.
fn report_failure<W: Write>(err: &anyhow::Error, out: &mut W) -> io::Result<u8> {
    let kind = failure_kind(err);
    debug!("Run failed ({:?}): {:#}", kind, err);

    let status = match kind {
        FailureKind::Timeout => {
            writeln!(out, "No data received for too long!")?;
            EXIT_FAILURE
        }
        FailureKind::MalformedData => {
            writeln!(out, "Malformed data")?;
            EXIT_FAILURE
        }
        FailureKind::UserInterrupt => {
            writeln!(out, "Quitting")?;
            EXIT_INTERRUPTED
        }
        FailureKind::Other => {
            writeln!(out, "Unexpected error")?;
            writeln!(out, "{:#}", err)?;
            EXIT_FAILURE
        }
    };
    out.flush()?;
    Ok(status)
}
