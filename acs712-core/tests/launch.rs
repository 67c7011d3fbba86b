use core::cell::Cell;
use core::fmt;

use acs712_core::launch::{
    LaunchError, TaskPriority, TaskSpawner, TaskSpec, Watchdog, launch,
};
use acs712_core::poller::{CycleReport, ReportSink};
use acs712_core::sensor::{ReadPath, SampleError};

struct FlagWatchdog<'a> {
    disabled: &'a Cell<bool>,
}

impl Watchdog for FlagWatchdog<'_> {
    fn disable(&mut self) {
        self.disabled.set(true);
    }
}

#[derive(Debug, Eq, PartialEq)]
struct OutOfTaskSlots;

struct RecordingSpawner<'a> {
    watchdog_disabled: &'a Cell<bool>,
    watchdog_was_disabled: Option<bool>,
    spawned: Vec<TaskSpec>,
    fail: bool,
}

impl<'a> RecordingSpawner<'a> {
    fn new(watchdog_disabled: &'a Cell<bool>, fail: bool) -> Self {
        Self {
            watchdog_disabled,
            watchdog_was_disabled: None,
            spawned: Vec::new(),
            fail,
        }
    }
}

impl TaskSpawner for RecordingSpawner<'_> {
    type Error = OutOfTaskSlots;

    fn spawn(&mut self, task: &TaskSpec) -> Result<(), Self::Error> {
        self.watchdog_was_disabled = Some(self.watchdog_disabled.get());
        if self.fail {
            return Err(OutOfTaskSlots);
        }
        self.spawned.push(*task);
        Ok(())
    }
}

#[derive(Default)]
struct LaunchLog {
    failed: Vec<&'static str>,
}

impl ReportSink for LaunchLog {
    fn cycle(&mut self, _: &CycleReport) {}

    fn read_failed<E: fmt::Debug>(&mut self, _: ReadPath, _: &SampleError<E>) {}

    fn launch_failed(&mut self, task: &TaskSpec) {
        self.failed.push(task.name);
    }
}

#[test]
fn watchdog_is_disabled_before_the_task_is_spawned() {
    let disabled = Cell::new(false);
    let mut watchdog = FlagWatchdog {
        disabled: &disabled,
    };
    let mut spawner = RecordingSpawner::new(&disabled, false);
    let mut log = LaunchLog::default();

    launch(&mut watchdog, &mut spawner, &mut log).expect("spawn succeeds");

    assert_eq!(spawner.watchdog_was_disabled, Some(true));
    assert_eq!(spawner.spawned, vec![TaskSpec::SENSOR_TASK]);
    assert!(log.failed.is_empty());
}

#[test]
fn sensor_task_uses_fixed_stack_and_normal_priority() {
    let task = TaskSpec::SENSOR_TASK;

    assert_eq!(task.name, "adcTask");
    assert_eq!(task.stack_size, 5 * 1024);
    assert_eq!(task.priority, TaskPriority::Normal);
}

#[test]
fn spawn_failure_is_reported_and_not_retried() {
    let disabled = Cell::new(false);
    let mut watchdog = FlagWatchdog {
        disabled: &disabled,
    };
    let mut spawner = RecordingSpawner::new(&disabled, true);
    let mut log = LaunchLog::default();

    let error = launch(&mut watchdog, &mut spawner, &mut log)
        .expect_err("spawner is configured to fail");

    assert_eq!(error, LaunchError::Spawn(OutOfTaskSlots));
    assert_eq!(
        error.to_string(),
        "failed to create task: OutOfTaskSlots"
    );
    assert_eq!(log.failed, vec!["adcTask"]);
    assert!(spawner.spawned.is_empty());
    assert!(disabled.get());
}
