//! Interruptible blocking reads over a polling serial port.
//!
//! Serial ports block for their own timeout on every read. To give the user a
//! way out while still honouring a long per-byte timeout, the port is opened
//! with a short poll interval and this adapter keeps polling until data
//! arrives, the overall timeout elapses, or the interrupt flag is raised.

use log::trace;
use std::io::{self, ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Recommended read timeout for the wrapped port.
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Reader that turns poll timeouts into a single bounded wait.
///
/// A read returns `Ok(0)` once `timeout` has elapsed without data and
/// `ErrorKind::Interrupted` once the interrupt flag is set. A timeout too
/// large to represent as a deadline waits indefinitely.
#[derive(Debug)]
pub struct InterruptibleReader<R> {
    inner: R,
    timeout: Duration,
    interrupt: Arc<AtomicBool>,
}

impl<R: Read> InterruptibleReader<R> {
    pub fn new(inner: R, timeout: Duration, interrupt: Arc<AtomicBool>) -> Self {
        Self {
            inner,
            timeout,
            interrupt,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn interrupted(&self) -> bool {
        self.interrupt.load(Ordering::SeqCst)
    }
}

impl<R: Read> Read for InterruptibleReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let deadline = Instant::now().checked_add(self.timeout);

        loop {
            if self.interrupted() {
                return Err(io::Error::new(ErrorKind::Interrupted, "interrupted by user"));
            }

            match self.inner.read(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == ErrorKind::TimedOut => {
                    if deadline.is_some_and(|d| Instant::now() >= d) {
                        trace!("No data within {:?}", self.timeout);
                        return Ok(0);
                    }
                }
                // EINTR from a signal; the flag check above decides
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Times out a fixed number of times, then yields one byte.
    struct SlowPort {
        misses: usize,
        byte: u8,
    }

    impl Read for SlowPort {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.misses > 0 {
                self.misses -= 1;
                return Err(io::Error::new(ErrorKind::TimedOut, "poll"));
            }
            buf[0] = self.byte;
            Ok(1)
        }
    }

    fn flag(value: bool) -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(value))
    }

    #[test]
    fn test_waits_through_poll_timeouts() {
        let port = SlowPort {
            misses: 3,
            byte: 0x42,
        };
        let mut reader = InterruptibleReader::new(port, Duration::from_secs(60), flag(false));
        let mut buf = [0u8; 1];
        assert_eq!(reader.read(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], 0x42);
    }

    #[test]
    fn test_overall_timeout_reads_nothing() {
        let port = SlowPort {
            misses: usize::MAX,
            byte: 0,
        };
        let mut reader = InterruptibleReader::new(port, Duration::ZERO, flag(false));
        let mut buf = [0u8; 1];
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_huge_timeout_does_not_overflow() {
        let port = SlowPort {
            misses: 2,
            byte: 0x07,
        };
        let timeout = Duration::try_from_secs_f64(1e19).unwrap();
        let mut reader = InterruptibleReader::new(port, timeout, flag(false));
        let mut buf = [0u8; 1];
        assert_eq!(reader.read(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], 0x07);

        let mut reader = InterruptibleReader::new(
            SlowPort {
                misses: 0,
                byte: 0,
            },
            Duration::MAX,
            flag(false),
        );
        assert_eq!(reader.read(&mut buf).unwrap(), 1);
    }

    #[test]
    fn test_interrupt_flag() {
        let port = SlowPort {
            misses: 0,
            byte: 0x42,
        };
        let interrupt = flag(false);
        let mut reader = InterruptibleReader::new(port, Duration::from_secs(60), interrupt.clone());
        interrupt.store(true, Ordering::SeqCst);

        let mut buf = [0u8; 1];
        let err = reader.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Interrupted);
    }

    #[test]
    fn test_other_errors_pass_through() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(ErrorKind::BrokenPipe, "unplugged"))
            }
        }

        let mut reader = InterruptibleReader::new(Broken, Duration::from_secs(1), flag(false));
        let mut buf = [0u8; 1];
        assert_eq!(reader.read(&mut buf).unwrap_err().kind(), ErrorKind::BrokenPipe);
    }
}
