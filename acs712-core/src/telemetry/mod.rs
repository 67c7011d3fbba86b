//! Reading history and console line formatting shared by all targets.
//!
//! [`TelemetryRecorder`] keeps the most recent cycle reports in a fixed ring
//! together with running counters. [`ReportFormatter`] renders reports into
//! the console lines both the firmware and the emulator print.

use core::fmt;

use heapless::HistoryBuf;

use crate::poller::CycleReport;
use crate::sensor::{ReadPath, SampleError};

/// Number of cycle reports retained in memory.
pub const TELEMETRY_RING_CAPACITY: usize = 32;

/// Capacity of a single rendered console line.
pub const REPORT_LINE_CAPACITY: usize = 128;

/// Fixed-capacity console line.
pub type ReportLine = heapless::String<REPORT_LINE_CAPACITY>;

/// Suffix marking a line whose content did not fit.
pub const TRUNCATION_MARKER: &str = "...";

/// Renders `write` into a fresh line.
///
/// Content that overflows the buffer is cut and the line ends with
/// [`TRUNCATION_MARKER`], so a shortened line never passes for a complete one.
pub fn render<F>(write: F) -> ReportLine
where
    F: FnOnce(&mut ReportLine) -> fmt::Result,
{
    let mut line = ReportLine::new();
    if write(&mut line).is_err() {
        while line.len() + TRUNCATION_MARKER.len() > REPORT_LINE_CAPACITY {
            line.pop();
        }
        // Room for the marker was made above.
        let _ = line.push_str(TRUNCATION_MARKER);
    }
    line
}

/// Records cycle reports into a fixed-size ring buffer.
pub struct TelemetryRecorder<const CAPACITY: usize = TELEMETRY_RING_CAPACITY> {
    ring: HistoryBuf<CycleReport, CAPACITY>,
    cycles: u32,
    failed_reads: u32,
}

impl<const CAPACITY: usize> TelemetryRecorder<CAPACITY> {
    /// Creates a recorder with an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            cycles: 0,
            failed_reads: 0,
        }
    }

    /// Stores a cycle report.
    pub fn record_cycle(&mut self, report: &CycleReport) {
        self.cycles = self.cycles.wrapping_add(1);
        self.ring.write(*report);
    }

    /// Counts a failed conversion.
    pub fn record_failure(&mut self) {
        self.failed_reads = self.failed_reads.wrapping_add(1);
    }

    /// Returns the most recent report, if any.
    pub fn latest(&self) -> Option<&CycleReport> {
        self.ring.recent()
    }

    /// Iterates over the retained reports in chronological order.
    pub fn oldest_first(&self) -> impl Iterator<Item = &CycleReport> {
        self.ring.oldest_ordered()
    }

    /// Number of reports currently retained.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Returns `true` when no reports are retained.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Total cycles recorded (wraps).
    pub const fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Total failed conversions recorded (wraps).
    pub const fn failed_reads(&self) -> u32 {
        self.failed_reads
    }

    /// Mean current over the retained reports whose current read succeeded.
    pub fn mean_amps(&self) -> Option<f32> {
        let mut sum = 0.0f32;
        let mut count = 0u16;
        for report in self.ring.oldest_ordered() {
            if report.current.is_valid() {
                sum += report.current.value;
                count += 1;
            }
        }
        (count > 0).then(|| sum / f32::from(count))
    }
}

impl<const CAPACITY: usize> Default for TelemetryRecorder<CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

/// Presentation settings for console lines.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReportFormat {
    /// Factor applied to the voltage before printing.
    pub voltage_display_scale: f32,
}

impl ReportFormat {
    /// The sensor board prints the voltage scaled by its 10:1 divider.
    pub const BOARD: Self = Self {
        voltage_display_scale: 10.0,
    };

    /// Prints the voltage as measured.
    pub const RAW: Self = Self {
        voltage_display_scale: 1.0,
    };
}

impl Default for ReportFormat {
    fn default() -> Self {
        Self::BOARD
    }
}

/// Renders a [`CycleReport`] into console lines.
#[derive(Clone, Copy, Debug)]
pub struct ReportFormatter<'a> {
    report: &'a CycleReport,
    format: ReportFormat,
}

impl<'a> ReportFormatter<'a> {
    /// Creates a formatter for `report`.
    #[must_use]
    pub const fn new(report: &'a CycleReport, format: ReportFormat) -> Self {
        Self { report, format }
    }

    /// Writes `ACS712 Current is : <amps> A`.
    pub fn write_current_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        write!(writer, "ACS712 Current is : {:.6} A", self.report.current.value)
    }

    /// Writes `ACS712 Voltage is : <volts> V`, scaled for display.
    pub fn write_voltage_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        let shown = self.report.voltage.value * self.format.voltage_display_scale;
        write!(writer, "ACS712 Voltage is : {shown:.6} V")
    }

    /// Renders the current line into a fixed buffer.
    #[must_use]
    pub fn current_line(&self) -> ReportLine {
        render(|line| self.write_current_line(line))
    }

    /// Renders the voltage line into a fixed buffer.
    #[must_use]
    pub fn voltage_line(&self) -> ReportLine {
        render(|line| self.write_voltage_line(line))
    }
}

/// Writes the diagnostic printed when a conversion fails.
pub fn write_failure_line<W, E>(writer: &mut W, path: ReadPath, error: &SampleError<E>) -> fmt::Result
where
    W: fmt::Write,
    E: fmt::Debug,
{
    write!(writer, "ACS712 {} read failed: {error}", path.label())
}

/// Renders the diagnostic printed when a conversion fails.
#[must_use]
pub fn failure_line<E: fmt::Debug>(path: ReadPath, error: &SampleError<E>) -> ReportLine {
    render(|line| write_failure_line(line, path, error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::{Reading, SampleStatus};

    fn report(cycle: u32, amps: f32, volts: f32, status: SampleStatus) -> CycleReport {
        CycleReport {
            cycle,
            current: Reading {
                raw: 0,
                value: amps,
                status,
            },
            voltage: Reading {
                raw: 0,
                value: volts,
                status,
            },
        }
    }

    #[test]
    fn recorder_keeps_most_recent_reports() {
        let mut recorder = TelemetryRecorder::<4>::new();
        for cycle in 0..6 {
            recorder.record_cycle(&report(cycle, 0.0, 0.0, SampleStatus::Adc));
        }

        assert_eq!(recorder.len(), 4);
        assert_eq!(recorder.cycles(), 6);
        assert_eq!(recorder.latest().map(|r| r.cycle), Some(5));
        let first = recorder.oldest_first().next().map(|r| r.cycle);
        assert_eq!(first, Some(2));
    }

    #[test]
    fn mean_skips_fallback_readings() {
        let mut recorder = TelemetryRecorder::<8>::new();
        recorder.record_cycle(&report(0, 1.0, 2.685, SampleStatus::Adc));
        recorder.record_cycle(&report(1, -13.5, 0.0, SampleStatus::Fallback));
        recorder.record_cycle(&report(2, 3.0, 3.055, SampleStatus::Adc));
        recorder.record_failure();

        let mean = recorder.mean_amps().expect("two valid readings");
        assert!((mean - 2.0).abs() < 1e-6);
        assert_eq!(recorder.failed_reads(), 1);
        assert_eq!(TelemetryRecorder::<8>::new().mean_amps(), None);
    }

    #[test]
    fn lines_follow_console_format() {
        let report = report(0, -13.513_514, 0.25, SampleStatus::Adc);
        let formatter = ReportFormatter::new(&report, ReportFormat::BOARD);

        assert_eq!(
            formatter.current_line().as_str(),
            "ACS712 Current is : -13.513514 A"
        );
        assert_eq!(
            formatter.voltage_line().as_str(),
            "ACS712 Voltage is : 2.500000 V"
        );

        let raw = ReportFormatter::new(&report, ReportFormat::RAW);
        assert_eq!(raw.voltage_line().as_str(), "ACS712 Voltage is : 0.250000 V");
    }

    #[test]
    fn failure_line_names_path_and_cause() {
        let mut line = ReportLine::new();
        write_failure_line(&mut line, ReadPath::Voltage, &SampleError::Hal("timeout"))
            .expect("line fits");

        assert_eq!(
            line.as_str(),
            "ACS712 voltage read failed: adc read failed: \"timeout\""
        );
    }

    #[derive(Debug)]
    #[allow(dead_code)]
    enum Fault {
        Timeout { read: u32 },
    }

    #[test]
    fn failure_line_keeps_multi_digit_fault_details() {
        let line = failure_line(
            ReadPath::Current,
            &SampleError::Hal(Fault::Timeout { read: u32::MAX }),
        );

        assert_eq!(
            line.as_str(),
            "ACS712 current read failed: adc read failed: Timeout { read: 4294967295 }"
        );
    }

    #[test]
    fn oversized_line_ends_with_marker() {
        let line = failure_line(ReadPath::Voltage, &SampleError::Hal([0u8; 64]));

        assert_eq!(line.len(), REPORT_LINE_CAPACITY);
        assert!(line.starts_with("ACS712 voltage read failed: adc read failed: [0, 0"));
        assert!(line.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn fitting_line_has_no_marker() {
        let line = render(|line| line.push_str("short").map_err(|_| fmt::Error));

        assert_eq!(line.as_str(), "short");
    }
}
