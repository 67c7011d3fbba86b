//! Periodic polling loop shared by firmware and host targets.
//!
//! The loop has a single steady state: initialize the sensor once, then every
//! interval read the current, read the voltage, and hand both to a
//! [`ReportSink`]. Each cycle performs two independent conversions. A failed
//! conversion is reported to the sink and the cycle continues with the
//! zero-code fallback, so the loop never stops on its own.

use core::fmt;

use embedded_hal_async::delay::DelayNs;

use crate::adc::{AdcSampler, PinRouter};
use crate::launch::TaskSpec;
use crate::sensor::{Acs712, ReadPath, Reading, SampleError};

/// Interval between poll cycles.
pub const POLL_INTERVAL_MS: u32 = 1_000;

/// Readings produced by one poll cycle.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleReport {
    /// Zero-based cycle index (wraps).
    pub cycle: u32,
    /// Current in amperes, from the first conversion.
    pub current: Reading,
    /// Sensor output in volts, from the second conversion.
    pub voltage: Reading,
}

impl CycleReport {
    /// Returns `true` when both conversions succeeded.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.current.is_valid() && self.voltage.is_valid()
    }
}

/// Destination for everything the polling task and its launcher report.
pub trait ReportSink {
    /// Called once per cycle with both readings.
    fn cycle(&mut self, report: &CycleReport);

    /// Called when a conversion fails, before the fallback is reported.
    fn read_failed<E: fmt::Debug>(&mut self, path: ReadPath, error: &SampleError<E>);

    /// Called when the polling task could not be created.
    fn launch_failed(&mut self, task: &TaskSpec);
}

impl<T: ReportSink + ?Sized> ReportSink for &mut T {
    fn cycle(&mut self, report: &CycleReport) {
        T::cycle(self, report);
    }

    fn read_failed<E: fmt::Debug>(&mut self, path: ReadPath, error: &SampleError<E>) {
        T::read_failed(self, path, error);
    }

    fn launch_failed(&mut self, task: &TaskSpec) {
        T::launch_failed(self, task);
    }
}

/// Drives an [`Acs712`] at a fixed interval.
pub struct Poller<A> {
    sensor: Acs712<A>,
    interval_ms: u32,
    next_cycle: u32,
}

impl<A: AdcSampler> Poller<A> {
    /// Creates a poller with the one-second interval.
    pub const fn new(sensor: Acs712<A>) -> Self {
        Self::with_interval_ms(sensor, POLL_INTERVAL_MS)
    }

    /// Creates a poller with a custom interval.
    pub const fn with_interval_ms(sensor: Acs712<A>, interval_ms: u32) -> Self {
        Self {
            sensor,
            interval_ms,
            next_cycle: 0,
        }
    }

    /// Returns the configured interval.
    pub const fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    /// Returns the number of cycles completed so far (wraps).
    pub const fn cycles(&self) -> u32 {
        self.next_cycle
    }

    /// Provides access to the sensor.
    pub const fn sensor(&self) -> &Acs712<A> {
        &self.sensor
    }

    /// Provides mutable access to the sensor.
    pub fn sensor_mut(&mut self) -> &mut Acs712<A> {
        &mut self.sensor
    }

    /// Runs sensor initialization. [`Self::run`] calls this on entry.
    pub fn start<R: PinRouter + ?Sized>(&mut self, router: &mut R) {
        self.sensor.init(router);
    }

    /// Executes one cycle: current read, voltage read, report.
    pub fn poll_cycle<S: ReportSink + ?Sized>(&mut self, sink: &mut S) -> CycleReport {
        let current = self.sample(ReadPath::Current, sink);
        let voltage = self.sample(ReadPath::Voltage, sink);

        let report = CycleReport {
            cycle: self.next_cycle,
            current,
            voltage,
        };
        self.next_cycle = self.next_cycle.wrapping_add(1);

        sink.cycle(&report);
        report
    }

    /// Initializes the sensor and polls it forever.
    pub async fn run<R, D, S>(mut self, router: &mut R, delay: &mut D, sink: &mut S) -> !
    where
        R: PinRouter + ?Sized,
        D: DelayNs,
        S: ReportSink + ?Sized,
    {
        self.start(router);
        loop {
            self.poll_cycle(sink);
            delay.delay_ms(self.interval_ms).await;
        }
    }

    fn sample<S: ReportSink + ?Sized>(&mut self, path: ReadPath, sink: &mut S) -> Reading {
        match self.sensor.read(path) {
            Ok(reading) => reading,
            Err(err) => {
                sink.read_failed(path, &err);
                self.sensor.fallback(path)
            }
        }
    }
}
