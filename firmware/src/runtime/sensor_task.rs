use acs712_core::poller::Poller;
use embassy_stm32::Peri;
use embassy_stm32::peripherals::PA0;
use embassy_time::Delay;

use crate::hw::{BoardAdc, BoardPins};
use crate::telemetry::ReportLogger;

/// ADC adapter reading the sensor on PA0.
pub type SensorAdc = BoardAdc<'static, Peri<'static, PA0>>;

/// Poller driving the on-board sensor.
pub type SensorPoller = Poller<SensorAdc>;

#[embassy_executor::task]
pub async fn run(poller: SensorPoller, mut logger: ReportLogger<'static>) -> ! {
    let mut pins = BoardPins;
    let mut delay = Delay;
    poller.run(&mut pins, &mut delay, &mut logger).await
}
