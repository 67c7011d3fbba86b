//! Launch contract for the polling task.
//!
//! Targets hand [`launch`] their watchdog and a spawner. The watchdog is
//! disabled first so the unbounded loop is never reset, then exactly one task
//! is created from [`TaskSpec::SENSOR_TASK`]. A failed spawn is reported and
//! returned; nothing is retried.

use core::fmt;

use crate::poller::ReportSink;

/// Scheduling priority requested for a task.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskPriority {
    Low,
    Normal,
    High,
}

/// Static description of a worker task.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskSpec {
    pub name: &'static str,
    /// Stack reservation in bytes; executors without per-task stacks ignore it.
    pub stack_size: usize,
    pub priority: TaskPriority,
}

impl TaskSpec {
    /// The sensor polling task.
    pub const SENSOR_TASK: Self = Self {
        name: "adcTask",
        stack_size: 5 * 1024,
        priority: TaskPriority::Normal,
    };
}

/// Hardware watchdog that would otherwise reset the long-running loop.
pub trait Watchdog {
    /// Stops the watchdog from resetting the system.
    fn disable(&mut self);
}

/// Watchdog stand-in for targets that never arm one.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopWatchdog;

impl NoopWatchdog {
    /// Creates a new no-op watchdog.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Watchdog for NoopWatchdog {
    fn disable(&mut self) {}
}

/// Creates the worker task described by a [`TaskSpec`].
pub trait TaskSpawner {
    /// Executor-specific spawn failure.
    type Error: fmt::Debug;

    /// Spawns the task.
    ///
    /// # Errors
    ///
    /// Returns the executor failure when the task cannot be created.
    fn spawn(&mut self, task: &TaskSpec) -> Result<(), Self::Error>;
}

/// Failure to start the polling task.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LaunchError<E> {
    Spawn(E),
}

impl<E: fmt::Debug> fmt::Display for LaunchError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn(err) => write!(f, "failed to create task: {err:?}"),
        }
    }
}

/// Disables the watchdog and spawns [`TaskSpec::SENSOR_TASK`].
///
/// # Errors
///
/// Returns [`LaunchError::Spawn`] after reporting the failure to `sink`.
pub fn launch<W, P, S>(
    watchdog: &mut W,
    spawner: &mut P,
    sink: &mut S,
) -> Result<(), LaunchError<P::Error>>
where
    W: Watchdog + ?Sized,
    P: TaskSpawner + ?Sized,
    S: ReportSink + ?Sized,
{
    let task = TaskSpec::SENSOR_TASK;
    watchdog.disable();
    spawner.spawn(&task).map_err(|err| {
        sink.launch_failed(&task);
        LaunchError::Spawn(err)
    })
}
