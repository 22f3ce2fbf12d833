//! Core types for decoded battery events.
//!
//! An event is one frame transmitted by the data logger: a count-prefixed,
//! terminator-suffixed list of (time delta, voltage) readings.

/// A decoded voltage sample.
///
/// The elapsed time is cumulative since the start of the event, in the
/// logger's time units (one unit per ADC interval, about a minute with the
/// stock firmware timings).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Cumulative time since the start of the event
    pub elapsed_time: u32,
    /// Battery voltage in volts
    pub voltage: f64,
}

impl Sample {
    /// Creates a new sample.
    #[inline]
    pub fn new(elapsed_time: u32, voltage: f64) -> Self {
        Self {
            elapsed_time,
            voltage,
        }
    }
}

/// A raw on-wire sample, before any scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    /// Time elapsed since the previous sample
    pub time_delta: u8,
    /// 8-bit ADC reading
    pub raw_voltage: u8,
}

impl RawSample {
    /// Creates a new raw sample.
    #[inline]
    pub fn new(time_delta: u8, raw_voltage: u8) -> Self {
        Self {
            time_delta,
            raw_voltage,
        }
    }
}

/// One complete decoded frame, samples kept in arrival order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Event {
    samples: Vec<Sample>,
}

impl Event {
    /// Creates an event from samples in arrival order.
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    /// Number of samples in the event.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the frame declared no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// All samples, in arrival order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Iterates over the samples in arrival order.
    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// Cumulative times of all samples.
    pub fn times(&self) -> impl Iterator<Item = u32> + '_ {
        self.samples.iter().map(|s| s.elapsed_time)
    }

    /// Voltages of all samples.
    pub fn voltages(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.voltage)
    }

    /// Consumes the event, returning its samples.
    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }
}

impl<'a> IntoIterator for &'a Event {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

/// Decoder settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecoderConfig {
    /// Scale factor for one time-delta unit
    pub time_between_samples: u32,
    /// ADC reference voltage, maps to a raw reading of 256
    pub max_voltage: f64,
    /// Multiply each time delta by `time_between_samples` before summing.
    ///
    /// Off by default: the logger's deltas are summed as-is.
    pub apply_time_scale: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        // MSP430 ADC10 with the internal 2.5V reference
        Self {
            time_between_samples: 1,
            max_voltage: 2.5,
            apply_time_scale: false,
        }
    }
}

impl DecoderConfig {
    /// Time units contributed by one raw delta byte.
    #[inline]
    pub fn scaled_delta(&self, delta: u8) -> u32 {
        if self.apply_time_scale {
            (delta as u32).saturating_mul(self.time_between_samples)
        } else {
            delta as u32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DecoderConfig::default();
        assert_eq!(config.time_between_samples, 1);
        assert_eq!(config.max_voltage, 2.5);
        assert!(!config.apply_time_scale);
    }

    #[test]
    fn test_scaled_delta() {
        let mut config = DecoderConfig {
            time_between_samples: 4,
            ..Default::default()
        };
        assert_eq!(config.scaled_delta(10), 10);

        config.apply_time_scale = true;
        assert_eq!(config.scaled_delta(10), 40);

        config.time_between_samples = u32::MAX;
        assert_eq!(config.scaled_delta(2), u32::MAX);
    }

    #[test]
    fn test_event_accessors() {
        let event = Event::new(vec![Sample::new(5, 1.25), Sample::new(8, 2.0)]);
        assert_eq!(event.len(), 2);
        assert!(!event.is_empty());
        assert_eq!(event.times().collect::<Vec<_>>(), vec![5, 8]);
        assert_eq!(event.voltages().collect::<Vec<_>>(), vec![1.25, 2.0]);
        assert_eq!(event.samples()[1].elapsed_time, 8);
        assert_eq!(event.iter().count(), 2);
        assert!(Event::default().is_empty());
        assert_eq!(event.into_samples(), vec![Sample::new(5, 1.25), Sample::new(8, 2.0)]);
    }
}
