//! STM32G0 implementations of the `acs712-core` hardware seams.
//!
//! The sensor output is wired to PA0, which the G0 exposes as ADC1_IN0. The
//! Embassy ADC driver switches the pin to analog mode on every conversion, so
//! routing has no registers left to touch.

#![cfg(target_os = "none")]

use core::convert::Infallible;

use acs712_core::adc::{AdcChannel, AdcReadRequest, AdcSampler, GpioPin, PinRouter};
use acs712_core::launch::Watchdog;
use embassy_stm32::adc::{Adc, AdcChannel as HalAdcChannel, Resolution, SampleTime};
use embassy_stm32::peripherals::ADC1;

/// ADC1 bound to the sensor pin.
pub struct BoardAdc<'d, C> {
    adc: Adc<'d, ADC1>,
    pin: C,
}

impl<'d, C: HalAdcChannel<ADC1>> BoardAdc<'d, C> {
    /// Configures a 12-bit conversion with a long sample time and wraps the
    /// pin carrying the sensor output.
    pub fn new(mut adc: Adc<'d, ADC1>, pin: C) -> Self {
        adc.set_resolution(Resolution::BITS12);
        adc.set_sample_time(SampleTime::CYCLES160_5);
        Self { adc, pin }
    }
}

impl<C: HalAdcChannel<ADC1>> AdcSampler for BoardAdc<'_, C> {
    // Blocking conversions on the G0 always complete.
    type Error = Infallible;

    fn read(&mut self, request: &AdcReadRequest) -> Result<u16, Self::Error> {
        // The G0 has no bias selection and the conversion is bounded by the
        // sample time, so only the equalization setting applies.
        request
            .equalization
            .average(|| Ok(self.adc.blocking_read(&mut self.pin)))
    }
}

/// Pin routing for the sensor line. The ADC driver switches PA0 to analog
/// mode itself, so this only reports the binding.
pub struct BoardPins;

impl PinRouter for BoardPins {
    fn init_pin(&mut self, pin: GpioPin) {
        defmt::info!("acs712: claiming GPIO{} (PA0)", pin.number());
    }

    fn route_to_adc(&mut self, pin: GpioPin, channel: AdcChannel) {
        defmt::info!(
            "acs712: GPIO{} routed to ADC1 channel {} (12-bit)",
            pin.number(),
            channel.index()
        );
    }
}

/// The independent watchdog is never started on this board; disabling it
/// only records that the polling loop runs unsupervised.
pub struct BoardWatchdog;

impl Watchdog for BoardWatchdog {
    fn disable(&mut self) {
        defmt::info!("watchdog: IWDG left disarmed for the polling task");
    }
}
