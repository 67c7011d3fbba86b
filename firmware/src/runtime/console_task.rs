use acs712_core::console::{ConsoleSettings, Parity as LineParity};
use acs712_core::telemetry::REPORT_LINE_CAPACITY;
use embassy_stm32 as hal;
use embassy_stm32::Peri;
use embassy_stm32::usart::{BufferedUart, Config as UartConfig, DataBits, Parity, StopBits};
use embassy_time::{Duration, Timer};
use embedded_io_async::Write;
use static_cell::StaticCell;

use crate::console::ConsoleReceiver;

const CONSOLE_UART_BUFFER_SIZE: usize = REPORT_LINE_CAPACITY * 2;

static UART_TX_BUFFER: StaticCell<[u8; CONSOLE_UART_BUFFER_SIZE]> = StaticCell::new();
static UART_RX_BUFFER: StaticCell<[u8; CONSOLE_UART_BUFFER_SIZE]> = StaticCell::new();

embassy_stm32::bind_interrupts!(struct UartIrqs {
    USART3_4_5_6_LPUART1 => embassy_stm32::usart::BufferedInterruptHandler<hal::peripherals::USART5>;
});

fn uart_config(settings: ConsoleSettings) -> UartConfig {
    let mut config = UartConfig::default();
    config.baudrate = settings.baud_rate;
    config.data_bits = match settings.data_bits {
        9 => DataBits::DataBits9,
        _ => DataBits::DataBits8,
    };
    config.stop_bits = match settings.stop_bits {
        2 => StopBits::STOP2,
        _ => StopBits::STOP1,
    };
    config.parity = match settings.parity {
        LineParity::None => Parity::ParityNone,
        LineParity::Even => Parity::ParityEven,
        LineParity::Odd => Parity::ParityOdd,
    };
    config
}

#[embassy_executor::task]
pub async fn run(
    lines: ConsoleReceiver<'static>,
    usart: Peri<'static, hal::peripherals::USART5>,
    tx_pin: Peri<'static, hal::peripherals::PB0>,
    rx_pin: Peri<'static, hal::peripherals::PB1>,
) -> ! {
    let uart = BufferedUart::new(
        usart,
        rx_pin,
        tx_pin,
        UART_TX_BUFFER.init([0; CONSOLE_UART_BUFFER_SIZE]),
        UART_RX_BUFFER.init([0; CONSOLE_UART_BUFFER_SIZE]),
        UartIrqs,
        uart_config(ConsoleSettings::DEFAULT),
    )
    .expect("failed to initialize console UART");

    let (mut uart_tx, _uart_rx) = uart.split();

    loop {
        let line = lines.receive().await;

        let written = match uart_tx.write_all(line.as_bytes()).await {
            Ok(()) => uart_tx.write_all(b"\r\n").await,
            Err(err) => Err(err),
        };
        if written.is_err() {
            defmt::warn!("console: UART write error");
            Timer::after(Duration::from_millis(5)).await;
            continue;
        }

        if uart_tx.flush().await.is_err() {
            defmt::warn!("console: UART flush error");
        }
    }
}
