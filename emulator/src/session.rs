use std::f32::consts::TAU;
use std::fmt;
use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use acs712_core::adc::{AdcChannel, AdcReadRequest, AdcSampler, GpioPin, PinRouter};
use acs712_core::launch::{TaskSpawner, TaskSpec, Watchdog};
use acs712_core::poller::{CycleReport, Poller, ReportSink};
use acs712_core::sensor::{ReadPath, SampleError, SensorConfig};
use acs712_core::telemetry::{
    ReportFormat, ReportFormatter, TelemetryRecorder, failure_line,
};
use crossterm::style::{Stylize, style};
use embassy_futures::block_on;
use embedded_hal_async::delay::DelayNs;

/// Host threads need more headroom than the MCU reservation for formatting.
const HOST_MIN_STACK: usize = 64 * 1024;

/// Reads per simulated ripple period.
const RIPPLE_PERIOD: u32 = 16;

/// Parameters of the simulated load and ADC.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationProfile {
    /// DC current through the sensor.
    pub amps: f32,
    /// Peak amplitude of a sinusoidal ripple on top of `amps`.
    pub ripple_amps: f32,
    /// Fail every N-th conversion (1-based); `None` never fails.
    pub fail_every: Option<u32>,
    /// Stop after this many cycles; `None` polls forever.
    pub cycles: Option<u32>,
    /// Delay between cycles.
    pub interval_ms: u32,
}

impl Default for SimulationProfile {
    fn default() -> Self {
        Self {
            amps: 0.0,
            ripple_amps: 0.0,
            fail_every: None,
            cycles: None,
            interval_ms: acs712_core::poller::POLL_INTERVAL_MS,
        }
    }
}

/// Failure injected by [`SimulatedAdc`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SimulatedFault {
    Timeout { read: u32 },
}

/// ACS712 output feeding a 12-bit converter through the configured front end.
pub struct SimulatedAdc {
    config: SensorConfig,
    profile: SimulationProfile,
    reads: u32,
}

impl SimulatedAdc {
    pub fn new(config: SensorConfig, profile: SimulationProfile) -> Self {
        Self {
            config,
            profile,
            reads: 0,
        }
    }

    pub fn reads(&self) -> u32 {
        self.reads
    }

    fn instantaneous_amps(&self, read: u32) -> f32 {
        #[allow(clippy::cast_precision_loss)]
        let phase = (read % RIPPLE_PERIOD) as f32 / RIPPLE_PERIOD as f32;
        self.profile.amps + self.profile.ripple_amps * (TAU * phase).sin()
    }

    /// Inverts the conversion chain: amps -> sensor volts -> ADC code.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn code_for(&self, amps: f32) -> u16 {
        let calibration = &self.config.calibration;
        let reference = &self.config.reference;
        let volts = calibration.zero_current_volts + amps * calibration.sensitivity_volts_per_amp;
        let code = volts * reference.full_scale / (reference.vref_volts * reference.gain);
        let max_code = reference.full_scale - 1.0;
        code.round().clamp(0.0, max_code) as u16
    }
}

impl AdcSampler for SimulatedAdc {
    type Error = SimulatedFault;

    fn read(&mut self, request: &AdcReadRequest) -> Result<u16, Self::Error> {
        self.reads = self.reads.wrapping_add(1);
        let read = self.reads;
        if self
            .profile
            .fail_every
            .is_some_and(|every| every > 0 && read % every == 0)
        {
            return Err(SimulatedFault::Timeout { read });
        }

        let mut sample = 0u32;
        request.equalization.average(|| {
            sample += 1;
            let offset = read.wrapping_mul(RIPPLE_PERIOD).wrapping_add(sample);
            Ok(self.code_for(self.instantaneous_amps(offset)))
        })
    }
}

/// Prints the pin routing instead of touching registers.
#[derive(Default)]
pub struct HostPins {
    pub routed: Option<(GpioPin, AdcChannel)>,
}

impl PinRouter for HostPins {
    fn init_pin(&mut self, pin: GpioPin) {
        println!("{pin}: initialized");
    }

    fn route_to_adc(&mut self, pin: GpioPin, channel: AdcChannel) {
        println!("{pin}: routed to {channel} as input");
        self.routed = Some((pin, channel));
    }
}

/// The host has no watchdog; disabling it is only announced.
#[derive(Default)]
pub struct HostWatchdog {
    pub disabled: bool,
}

impl Watchdog for HostWatchdog {
    fn disable(&mut self) {
        println!("watchdog: disabled");
        self.disabled = true;
    }
}

/// Sleeps the current thread.
pub struct HostDelay;

impl DelayNs for HostDelay {
    async fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    async fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

/// Prints report lines to the terminal and keeps the telemetry ring.
pub struct TerminalSink {
    format: ReportFormat,
    recorder: TelemetryRecorder,
}

impl TerminalSink {
    pub fn new(format: ReportFormat) -> Self {
        Self {
            format,
            recorder: TelemetryRecorder::new(),
        }
    }

    pub fn recorder(&self) -> &TelemetryRecorder {
        &self.recorder
    }

    pub fn into_recorder(self) -> TelemetryRecorder {
        self.recorder
    }
}

impl ReportSink for TerminalSink {
    fn cycle(&mut self, report: &CycleReport) {
        self.recorder.record_cycle(report);

        let formatter = ReportFormatter::new(report, self.format);
        let current = formatter.current_line();
        let voltage = formatter.voltage_line();
        if report.is_valid() {
            println!("{current}");
            println!("{voltage}");
        } else {
            println!("{}", style(current.as_str()).yellow());
            println!("{}", style(voltage.as_str()).yellow());
        }
    }

    fn read_failed<E: fmt::Debug>(&mut self, path: ReadPath, error: &SampleError<E>) {
        self.recorder.record_failure();

        let line = failure_line(path, error);
        println!("{}", style(line.as_str()).red());
    }

    fn launch_failed(&mut self, task: &TaskSpec) {
        let message = format!("[{}] Failed to create {}!", task.name, task.name);
        eprintln!("{}", style(message).red());
    }
}

/// Reasons the polling thread could not be created.
#[derive(Debug)]
pub enum HostSpawnError {
    AlreadySpawned,
    Io(io::Error),
}

impl fmt::Display for HostSpawnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadySpawned => f.write_str("polling task already running"),
            Self::Io(err) => write!(f, "thread creation failed: {err}"),
        }
    }
}

/// Runs the poller on a named `std` thread.
pub struct ThreadSpawner {
    pending: Option<(Poller<SimulatedAdc>, SimulationProfile)>,
    handle: Option<JoinHandle<TelemetryRecorder>>,
}

impl ThreadSpawner {
    pub fn new(poller: Poller<SimulatedAdc>, profile: SimulationProfile) -> Self {
        Self {
            pending: Some((poller, profile)),
            handle: None,
        }
    }

    /// Waits for a bounded run to finish and returns its telemetry.
    pub fn join(mut self) -> Option<TelemetryRecorder> {
        self.handle.take().and_then(|handle| handle.join().ok())
    }
}

impl TaskSpawner for ThreadSpawner {
    type Error = HostSpawnError;

    fn spawn(&mut self, task: &TaskSpec) -> Result<(), Self::Error> {
        let Some((poller, profile)) = self.pending.take() else {
            return Err(HostSpawnError::AlreadySpawned);
        };

        let handle = thread::Builder::new()
            .name(task.name.to_string())
            .stack_size(task.stack_size.max(HOST_MIN_STACK))
            .spawn(move || poll(poller, profile))
            .map_err(HostSpawnError::Io)?;
        self.handle = Some(handle);
        Ok(())
    }
}

fn poll(mut poller: Poller<SimulatedAdc>, profile: SimulationProfile) -> TelemetryRecorder {
    let mut pins = HostPins::default();
    let mut sink = TerminalSink::new(ReportFormat::BOARD);

    let Some(cycles) = profile.cycles else {
        let mut delay = HostDelay;
        block_on(poller.run(&mut pins, &mut delay, &mut sink))
    };

    poller.start(&mut pins);
    for cycle in 0..cycles {
        poller.poll_cycle(&mut sink);
        if cycle + 1 < cycles {
            thread::sleep(Duration::from_millis(u64::from(profile.interval_ms)));
        }
    }
    sink.into_recorder()
}
