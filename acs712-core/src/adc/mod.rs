//! ADC request parameters and the hardware seams the sensor reads through.
//!
//! Firmware and emulator targets implement [`AdcSampler`] and [`PinRouter`]
//! for their concrete peripherals. The core never touches registers; it only
//! describes which pin feeds which channel and how a conversion should be
//! performed.

use core::fmt;

/// ADC input channel index as numbered by the HAL.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdcChannel(u8);

impl AdcChannel {
    /// Channel sampled by the reference sensor board.
    pub const CH0: Self = Self(0);

    /// Creates a channel identifier from its raw index.
    #[must_use]
    pub const fn new(index: u8) -> Self {
        Self(index)
    }

    /// Returns the raw channel index.
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }
}

impl fmt::Display for AdcChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ADC{}", self.0)
    }
}

/// Physical GPIO pin identifier.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpioPin(u8);

impl GpioPin {
    /// Creates a pin identifier from its raw number.
    #[must_use]
    pub const fn new(number: u8) -> Self {
        Self(number)
    }

    /// Returns the raw pin number.
    #[must_use]
    pub const fn number(self) -> u8 {
        self.0
    }
}

impl fmt::Display for GpioPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO{}", self.0)
    }
}

/// Binding between the sensor's analog line and the channel that samples it.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AnalogRoute {
    pub pin: GpioPin,
    pub channel: AdcChannel,
}

impl AnalogRoute {
    /// Sensor output wired to GPIO 7 and read on channel 0.
    pub const DEFAULT: Self = Self {
        pin: GpioPin::new(7),
        channel: AdcChannel::CH0,
    };
}

/// Number of conversions the HAL averages into a single code.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Equalization {
    One,
    Two,
    Four,
    Eight,
}

impl Equalization {
    /// Returns how many raw conversions make up one code.
    #[must_use]
    pub const fn sample_count(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Four => 4,
            Self::Eight => 8,
        }
    }

    /// Averages `sample_count` conversions produced by `convert`.
    ///
    /// Targets whose HAL cannot average in hardware use this to honour the
    /// request in software.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by `convert`; the remaining
    /// conversions are skipped.
    pub fn average<E, F>(self, mut convert: F) -> Result<u16, E>
    where
        F: FnMut() -> Result<u16, E>,
    {
        let count = u32::from(self.sample_count());
        let mut sum = 0u32;
        for _ in 0..count {
            sum += u32::from(convert()?);
        }
        // The mean of u16 values always fits back into a u16.
        Ok(u16::try_from(sum / count).unwrap_or(u16::MAX))
    }
}

/// Reference/bias current selection passed through to the HAL.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BiasCurrent {
    #[default]
    Default,
    Auto,
    Volts1v8,
    Volts3v3,
}

/// Parameters for a single blocking conversion.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdcReadRequest {
    pub channel: AdcChannel,
    pub equalization: Equalization,
    pub bias: BiasCurrent,
    /// Upper bound on the conversion, in HAL ticks.
    pub timeout_ticks: u16,
}

impl AdcReadRequest {
    /// Eight-sample equalization, default bias, 0xff tick timeout on channel 0.
    pub const DEFAULT: Self = Self {
        channel: AdcChannel::CH0,
        equalization: Equalization::Eight,
        bias: BiasCurrent::Default,
        timeout_ticks: 0xff,
    };

    /// Returns a copy of this request targeting `channel`.
    #[must_use]
    pub const fn on_channel(self, channel: AdcChannel) -> Self {
        Self { channel, ..self }
    }
}

impl Default for AdcReadRequest {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Blocking single-channel ADC access.
pub trait AdcSampler {
    /// HAL-specific failure reported for a conversion.
    type Error: fmt::Debug;

    /// Performs one (possibly equalized) conversion and returns the raw code.
    ///
    /// # Errors
    ///
    /// Returns the HAL failure when the conversion does not complete.
    fn read(&mut self, request: &AdcReadRequest) -> Result<u16, Self::Error>;
}

impl<T: AdcSampler + ?Sized> AdcSampler for &mut T {
    type Error = T::Error;

    fn read(&mut self, request: &AdcReadRequest) -> Result<u16, Self::Error> {
        T::read(self, request)
    }
}

/// Pin multiplexer used to route the sensor line into the ADC.
pub trait PinRouter {
    /// Claims the pin for GPIO use.
    fn init_pin(&mut self, pin: GpioPin);

    /// Selects the ADC alternate function and configures the pin as an input.
    fn route_to_adc(&mut self, pin: GpioPin, channel: AdcChannel);
}

/// Pin router for targets whose ADC driver configures the pin on its own.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopPinRouter;

impl NoopPinRouter {
    /// Creates a new no-op router.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl PinRouter for NoopPinRouter {
    fn init_pin(&mut self, _: GpioPin) {}

    fn route_to_adc(&mut self, _: GpioPin, _: AdcChannel) {}
}
