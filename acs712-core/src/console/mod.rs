//! Serial console settings for targets that mirror reports to a UART.

/// Parity mode of the console UART.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Line settings for the console UART.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConsoleSettings {
    pub baud_rate: u32,
    pub data_bits: u8,
    pub stop_bits: u8,
    pub parity: Parity,
}

impl ConsoleSettings {
    /// 115200 baud, 8-N-1.
    pub const DEFAULT: Self = Self {
        baud_rate: 115_200,
        data_bits: 8,
        stop_bits: 1,
        parity: Parity::None,
    };
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self::DEFAULT
    }
}
