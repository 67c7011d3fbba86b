#![cfg_attr(not(target_os = "none"), allow(dead_code))]

//! Report logging for the firmware target.
//!
//! [`ReportLogger`] is the polling task's [`ReportSink`]. It keeps the
//! telemetry ring and publishes the latest values to [`crate::status`]. Each
//! cycle is printed through defmt (stdout on host builds) and optionally
//! mirrored to the UART console queue. Every [`SUMMARY_INTERVAL_CYCLES`]
//! cycles a health line built from the status snapshot and the ring is logged.

use core::fmt::{self, Write};

use acs712_core::launch::TaskSpec;
use acs712_core::poller::{CycleReport, ReportSink};
use acs712_core::sensor::{ReadPath, SampleError};
use acs712_core::telemetry::{
    ReportFormat, ReportFormatter, ReportLine, TelemetryRecorder, failure_line, render,
};

use crate::console::{self, ConsoleSender, Offer};
use crate::status::{self, StatusSnapshot};

/// Cycles between two health summaries (one minute at the default interval).
pub const SUMMARY_INTERVAL_CYCLES: u32 = 60;

/// Polling task sink that logs and records every report.
pub struct ReportLogger<'a> {
    recorder: TelemetryRecorder,
    format: ReportFormat,
    console: Option<ConsoleSender<'a>>,
    dropped_lines: u32,
}

impl<'a> ReportLogger<'a> {
    /// Creates a logger that only prints through defmt.
    pub const fn new(format: ReportFormat) -> Self {
        Self {
            recorder: TelemetryRecorder::new(),
            format,
            console: None,
            dropped_lines: 0,
        }
    }

    /// Creates a logger that also mirrors lines to the console queue.
    pub const fn with_console(format: ReportFormat, console: ConsoleSender<'a>) -> Self {
        Self {
            recorder: TelemetryRecorder::new(),
            format,
            console: Some(console),
            dropped_lines: 0,
        }
    }

    /// Renders the health line from the shared status and the local history.
    pub fn summary_line(&self) -> ReportLine {
        render_summary(
            &status::snapshot(),
            self.recorder.mean_amps(),
            self.dropped_lines,
        )
    }

    fn summary_due(&self) -> bool {
        let cycles = self.recorder.cycles();
        cycles != 0 && cycles % SUMMARY_INTERVAL_CYCLES == 0
    }

    fn mirror(&mut self, line: ReportLine) {
        let Some(sender) = self.console.as_ref() else {
            return;
        };
        if console::offer(sender, line) == Offer::Dropped {
            self.dropped_lines = self.dropped_lines.wrapping_add(1);
        }
    }
}

impl ReportSink for ReportLogger<'_> {
    fn cycle(&mut self, report: &CycleReport) {
        self.recorder.record_cycle(report);
        status::record_cycle(report);

        let formatter = ReportFormatter::new(report, self.format);
        let current = formatter.current_line();
        let voltage = formatter.voltage_line();
        emit_info(current.as_str());
        emit_info(voltage.as_str());
        self.mirror(current);
        self.mirror(voltage);

        if self.summary_due() {
            emit_info(self.summary_line().as_str());
        }
    }

    fn read_failed<E: fmt::Debug>(&mut self, path: ReadPath, error: &SampleError<E>) {
        self.recorder.record_failure();
        status::record_failure();

        let line = failure_line(path, error);
        emit_warn(line.as_str());
        self.mirror(line);
    }

    fn launch_failed(&mut self, task: &TaskSpec) {
        emit_error_task(task);
    }
}

fn render_summary(snapshot: &StatusSnapshot, mean_amps: Option<f32>, dropped: u32) -> ReportLine {
    render(|line| {
        write!(
            line,
            "acs712: {} cycles, {} failed reads, last {} mA/{} mV",
            snapshot.cycles, snapshot.failed_reads, snapshot.milliamps, snapshot.millivolts
        )?;
        if !snapshot.last_valid {
            line.write_str(" (fallback)")?;
        }
        match mean_amps {
            Some(amps) => write!(line, ", mean {amps:.3} A")?,
            None => line.write_str(", mean n/a")?,
        }
        write!(line, ", {dropped} lines dropped")
    })
}

#[cfg(target_os = "none")]
fn emit_info(line: &str) {
    defmt::info!("{}", line);
}

#[cfg(target_os = "none")]
fn emit_warn(line: &str) {
    defmt::warn!("{}", line);
}

#[cfg(target_os = "none")]
fn emit_error_task(task: &TaskSpec) {
    defmt::error!("[{}] failed to create task (stack={}B)", task.name, task.stack_size);
}

#[cfg(not(target_os = "none"))]
fn emit_info(line: &str) {
    println!("{line}");
}

#[cfg(not(target_os = "none"))]
fn emit_warn(line: &str) {
    println!("{line}");
}

#[cfg(not(target_os = "none"))]
fn emit_error_task(task: &TaskSpec) {
    println!("[{}] failed to create task (stack={}B)", task.name, task.stack_size);
}
