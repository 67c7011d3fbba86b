use core::fmt;
use core::pin::pin;

use acs712_core::adc::{AdcChannel, AdcReadRequest, AdcSampler, GpioPin, PinRouter};
use acs712_core::launch::TaskSpec;
use acs712_core::poller::{CycleReport, POLL_INTERVAL_MS, Poller, ReportSink};
use acs712_core::sensor::{Acs712, ReadPath, SampleError, SampleStatus, SensorConfig};
use acs712_core::telemetry::TelemetryRecorder;
use embassy_futures::poll_once;
use embedded_hal_async::delay::DelayNs;

#[derive(Debug, Eq, PartialEq)]
struct InjectedFault;

struct CountingAdc {
    code: u16,
    reads: usize,
    fail_on: Option<usize>,
}

impl CountingAdc {
    fn new(code: u16) -> Self {
        Self {
            code,
            reads: 0,
            fail_on: None,
        }
    }

    fn failing_on(code: u16, read_index: usize) -> Self {
        Self {
            fail_on: Some(read_index),
            ..Self::new(code)
        }
    }
}

impl AdcSampler for CountingAdc {
    type Error = InjectedFault;

    fn read(&mut self, _: &AdcReadRequest) -> Result<u16, Self::Error> {
        let index = self.reads;
        self.reads += 1;
        if self.fail_on == Some(index) {
            Err(InjectedFault)
        } else {
            Ok(self.code)
        }
    }
}

#[derive(Default)]
struct RecordingRouter {
    calls: Vec<(GpioPin, Option<AdcChannel>)>,
}

impl PinRouter for RecordingRouter {
    fn init_pin(&mut self, pin: GpioPin) {
        self.calls.push((pin, None));
    }

    fn route_to_adc(&mut self, pin: GpioPin, channel: AdcChannel) {
        self.calls.push((pin, Some(channel)));
    }
}

/// Completes the first `budget` delays immediately, then never again.
struct StallingDelay {
    budget: usize,
    requested_ms: Vec<u32>,
}

impl StallingDelay {
    fn new(budget: usize) -> Self {
        Self {
            budget,
            requested_ms: Vec::new(),
        }
    }
}

impl DelayNs for StallingDelay {
    async fn delay_ns(&mut self, _: u32) {}

    async fn delay_ms(&mut self, ms: u32) {
        self.requested_ms.push(ms);
        if self.requested_ms.len() > self.budget {
            core::future::pending::<()>().await;
        }
    }
}

#[derive(Default)]
struct CollectingSink {
    reports: Vec<CycleReport>,
    failures: Vec<(ReadPath, String)>,
    telemetry: TelemetryRecorder<8>,
}

impl ReportSink for CollectingSink {
    fn cycle(&mut self, report: &CycleReport) {
        self.reports.push(*report);
        self.telemetry.record_cycle(report);
    }

    fn read_failed<E: fmt::Debug>(&mut self, path: ReadPath, error: &SampleError<E>) {
        self.failures.push((path, error.to_string()));
        self.telemetry.record_failure();
    }

    fn launch_failed(&mut self, _: &TaskSpec) {
        panic!("polling never launches tasks");
    }
}

#[test]
fn run_initializes_once_and_reads_twice_per_cycle() {
    let mut adc = CountingAdc::new(1_000);
    let mut router = RecordingRouter::default();
    let mut delay = StallingDelay::new(2);
    let mut sink = CollectingSink::default();

    {
        let poller = Poller::new(Acs712::new(&mut adc, SensorConfig::ACS712_05B));
        let mut task = pin!(poller.run(&mut router, &mut delay, &mut sink));

        assert!(poll_once(task.as_mut()).is_pending());
        assert!(
            poll_once(task.as_mut()).is_pending(),
            "polling loop must not finish on its own"
        );
    }

    assert_eq!(
        router.calls,
        vec![
            (GpioPin::new(7), None),
            (GpioPin::new(7), Some(AdcChannel::CH0)),
        ]
    );
    assert_eq!(sink.reports.len(), 3);
    assert_eq!(adc.reads, 6, "each cycle performs exactly two conversions");
    assert_eq!(delay.requested_ms, vec![POLL_INTERVAL_MS; 3]);
    assert!(sink.failures.is_empty());

    let cycles: Vec<u32> = sink.reports.iter().map(|report| report.cycle).collect();
    assert_eq!(cycles, vec![0, 1, 2]);
}

#[test]
fn failed_read_is_logged_and_loop_keeps_polling() {
    // Read #2 is the current path of the second cycle.
    let mut adc = CountingAdc::failing_on(2_048, 2);
    let mut router = RecordingRouter::default();
    let mut delay = StallingDelay::new(3);
    let mut sink = CollectingSink::default();

    {
        let poller = Poller::new(Acs712::new(&mut adc, SensorConfig::ACS712_05B));
        let mut task = pin!(poller.run(&mut router, &mut delay, &mut sink));
        assert!(poll_once(task.as_mut()).is_pending());
    }

    assert_eq!(sink.reports.len(), 4);
    assert_eq!(adc.reads, 8);
    assert_eq!(sink.failures.len(), 1);

    let (path, message) = &sink.failures[0];
    assert_eq!(*path, ReadPath::Current);
    assert!(
        message.contains("InjectedFault"),
        "failure message should carry the HAL error, got: {message}"
    );

    let degraded = &sink.reports[1];
    assert_eq!(degraded.current.status, SampleStatus::Fallback);
    assert_eq!(degraded.current.raw, 0);
    assert!((degraded.current.value - (-2.5 / 0.185)).abs() < 1e-3);
    assert_eq!(degraded.voltage.status, SampleStatus::Adc);

    assert!(sink.reports[2].is_valid());
    assert!(sink.reports[3].is_valid());
    assert_eq!(sink.telemetry.failed_reads(), 1);
    assert_eq!(sink.telemetry.cycles(), 4);
}

#[test]
fn custom_interval_is_used_between_cycles() {
    let mut adc = CountingAdc::new(0);
    let mut router = RecordingRouter::default();
    let mut delay = StallingDelay::new(1);
    let mut sink = CollectingSink::default();

    {
        let poller =
            Poller::with_interval_ms(Acs712::new(&mut adc, SensorConfig::ACS712_05B), 250);
        assert_eq!(poller.interval_ms(), 250);
        let mut task = pin!(poller.run(&mut router, &mut delay, &mut sink));
        assert!(poll_once(task.as_mut()).is_pending());
    }

    assert_eq!(delay.requested_ms, vec![250, 250]);
}
