use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::{SpawnError, Spawner};
use embassy_stm32 as hal;
use embassy_stm32::adc::Adc;

use acs712_core::launch::{TaskSpawner, TaskSpec, launch};
use acs712_core::poller::Poller;
use acs712_core::sensor::{Acs712, SensorConfig};
use acs712_core::telemetry::ReportFormat;

use crate::hw::{BoardAdc, BoardWatchdog};
use crate::telemetry::ReportLogger;
use sensor_task::SensorPoller;

#[cfg(feature = "uart-console")]
mod console_task;
mod sensor_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

#[cfg(feature = "uart-console")]
pub(super) static CONSOLE_QUEUE: crate::console::ConsoleQueue =
    embassy_sync::channel::Channel::new();

/// Reasons the sensor task could not be created.
#[derive(Debug)]
enum SpawnFailure {
    /// The poller was already handed to a task.
    AlreadySpawned,
    Executor(SpawnError),
}

/// Hands the poller and its logger to the Embassy executor.
struct ExecutorSpawner {
    spawner: Spawner,
    poller: Option<SensorPoller>,
    logger: Option<ReportLogger<'static>>,
}

impl ExecutorSpawner {
    fn new(spawner: Spawner, poller: SensorPoller, logger: ReportLogger<'static>) -> Self {
        Self {
            spawner,
            poller: Some(poller),
            logger: Some(logger),
        }
    }
}

impl TaskSpawner for ExecutorSpawner {
    type Error = SpawnFailure;

    fn spawn(&mut self, task: &TaskSpec) -> Result<(), Self::Error> {
        let (Some(poller), Some(logger)) = (self.poller.take(), self.logger.take()) else {
            return Err(SpawnFailure::AlreadySpawned);
        };

        // Embassy tasks run on the executor stack, so the requested size is
        // informational only.
        defmt::info!(
            "spawning {} (stack={}B priority={})",
            task.name,
            task.stack_size,
            task.priority
        );
        let token = sensor_task::run(poller, logger).map_err(SpawnFailure::Executor)?;
        self.spawner.spawn(token);
        Ok(())
    }
}

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let p = hal::init(config);

    let adc = BoardAdc::new(Adc::new(p.ADC1), p.PA0);
    let poller = Poller::new(Acs712::new(adc, SensorConfig::ACS712_05B));

    #[cfg(feature = "uart-console")]
    let logger = {
        let token = console_task::run(CONSOLE_QUEUE.receiver(), p.USART5, p.PB0, p.PB1)
            .expect("failed to spawn console task");
        spawner.spawn(token);
        ReportLogger::with_console(ReportFormat::BOARD, CONSOLE_QUEUE.sender())
    };
    #[cfg(not(feature = "uart-console"))]
    let logger = ReportLogger::new(ReportFormat::BOARD);

    let mut watchdog = BoardWatchdog;
    let mut task_spawner = ExecutorSpawner::new(spawner, poller, logger);
    let mut boot_log = ReportLogger::new(ReportFormat::BOARD);

    if let Err(err) = launch(&mut watchdog, &mut task_spawner, &mut boot_log) {
        defmt::error!("acs712: {}", defmt::Display2Format(&err));
    }

    core::future::pending::<()>().await;
}
