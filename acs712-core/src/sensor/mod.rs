//! Owned ACS712 handle: pin routing, sampling and conversion.

use core::fmt;

use crate::adc::{AdcReadRequest, AdcSampler, AnalogRoute, PinRouter};
use crate::calibration::{AdcReference, SensorCalibration};

/// Everything needed to turn a routed ADC channel into current readings.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorConfig {
    pub route: AnalogRoute,
    pub request: AdcReadRequest,
    pub reference: AdcReference,
    pub calibration: SensorCalibration,
}

impl SensorConfig {
    /// ACS712-05B on the default route with the board ADC settings.
    pub const ACS712_05B: Self = Self {
        route: AnalogRoute::DEFAULT,
        request: AdcReadRequest::DEFAULT,
        reference: AdcReference::DEFAULT,
        calibration: SensorCalibration::ACS712_05B,
    };

    /// Returns a copy with a different transfer curve.
    #[must_use]
    pub const fn with_calibration(self, calibration: SensorCalibration) -> Self {
        Self {
            calibration,
            ..self
        }
    }

    /// Returns a copy that reads `route.channel` through `route.pin`.
    #[must_use]
    pub const fn with_route(self, route: AnalogRoute) -> Self {
        Self {
            route,
            request: self.request.on_channel(route.channel),
            ..self
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self::ACS712_05B
    }
}

/// Where a reading's raw code came from.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleStatus {
    /// Converted from a successful ADC read.
    Adc,
    /// The read failed; the value is derived from a zero code.
    Fallback,
}

/// Conversion path that produced a reading.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadPath {
    Current,
    Voltage,
}

impl ReadPath {
    /// Short label used in log lines.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Voltage => "voltage",
        }
    }
}

/// One converted value together with the code it was derived from.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    pub raw: u16,
    /// Volts for [`ReadPath::Voltage`], amperes for [`ReadPath::Current`].
    pub value: f32,
    pub status: SampleStatus,
}

impl Reading {
    /// Returns `true` when the value comes from a real conversion.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self.status, SampleStatus::Adc)
    }
}

/// Failure reported for a single sample.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SampleError<E> {
    /// The HAL returned a non-success status.
    Hal(E),
    /// The HAL returned a code the converter cannot produce.
    OutOfRange(u16),
}

impl<E: fmt::Debug> fmt::Display for SampleError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hal(err) => write!(f, "adc read failed: {err:?}"),
            Self::OutOfRange(raw) => write!(f, "adc code {raw} exceeds full scale"),
        }
    }
}

/// ACS712 current sensor on one ADC channel.
pub struct Acs712<A> {
    adc: A,
    config: SensorConfig,
    initialized: bool,
}

impl<A: AdcSampler> Acs712<A> {
    /// Wraps `adc` with the supplied configuration. Call [`Self::init`]
    /// before the first read.
    pub const fn new(adc: A, config: SensorConfig) -> Self {
        Self {
            adc,
            config,
            initialized: false,
        }
    }

    /// Claims the sensor pin and routes it into the configured channel.
    pub fn init<R: PinRouter + ?Sized>(&mut self, router: &mut R) {
        let route = self.config.route;
        router.init_pin(route.pin);
        router.route_to_adc(route.pin, route.channel);
        self.initialized = true;
    }

    /// Returns `true` once [`Self::init`] has run.
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Returns the active configuration.
    pub const fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Provides access to the wrapped sampler.
    pub fn adc(&self) -> &A {
        &self.adc
    }

    /// Provides mutable access to the wrapped sampler.
    pub fn adc_mut(&mut self) -> &mut A {
        &mut self.adc
    }

    /// Consumes the handle and returns the sampler.
    pub fn release(self) -> A {
        self.adc
    }

    /// Performs one conversion and validates the code.
    ///
    /// # Errors
    ///
    /// [`SampleError::Hal`] when the sampler fails, [`SampleError::OutOfRange`]
    /// when the code is at or above full scale.
    pub fn read_raw(&mut self) -> Result<u16, SampleError<A::Error>> {
        let raw = self
            .adc
            .read(&self.config.request)
            .map_err(SampleError::Hal)?;
        if !self.config.reference.accepts(raw) {
            return Err(SampleError::OutOfRange(raw));
        }
        Ok(raw)
    }

    /// Samples the channel once and returns the sensor output voltage.
    ///
    /// # Errors
    ///
    /// See [`Self::read_raw`].
    pub fn read_voltage(&mut self) -> Result<Reading, SampleError<A::Error>> {
        let raw = self.read_raw()?;
        Ok(self.convert(ReadPath::Voltage, raw, SampleStatus::Adc))
    }

    /// Samples the channel once and returns the measured current.
    ///
    /// # Errors
    ///
    /// See [`Self::read_raw`].
    pub fn read_current(&mut self) -> Result<Reading, SampleError<A::Error>> {
        let raw = self.read_raw()?;
        Ok(self.convert(ReadPath::Current, raw, SampleStatus::Adc))
    }

    /// Reads along `path`.
    ///
    /// # Errors
    ///
    /// See [`Self::read_raw`].
    pub fn read(&mut self, path: ReadPath) -> Result<Reading, SampleError<A::Error>> {
        match path {
            ReadPath::Current => self.read_current(),
            ReadPath::Voltage => self.read_voltage(),
        }
    }

    /// Reading reported after a failed conversion: the value a zero code
    /// converts to, flagged as [`SampleStatus::Fallback`].
    pub fn fallback(&self, path: ReadPath) -> Reading {
        self.convert(path, 0, SampleStatus::Fallback)
    }

    fn convert(&self, path: ReadPath, raw: u16, status: SampleStatus) -> Reading {
        let volts = self.config.reference.volts(raw);
        let value = match path {
            ReadPath::Voltage => volts,
            ReadPath::Current => self.config.calibration.amps(volts),
        };
        Reading { raw, value, status }
    }
}
