#![no_std]

// Shared logic for the ACS712 current monitor.
//
// This crate stays portable across MCU firmware and host tooling by avoiding the
// Rust standard library and exposing the hardware seams as traits the other
// crates implement.

pub mod adc;
pub mod calibration;
pub mod console;
pub mod launch;
pub mod poller;
pub mod sensor;
pub mod telemetry;

pub use adc::{AdcChannel, AdcReadRequest, AdcSampler, AnalogRoute, GpioPin, PinRouter};
pub use calibration::{AdcReference, SensorCalibration};
pub use launch::{LaunchError, TaskSpawner, TaskSpec, Watchdog, launch};
pub use poller::{CycleReport, Poller, ReportSink};
pub use sensor::{Acs712, ReadPath, Reading, SampleError, SampleStatus, SensorConfig};
