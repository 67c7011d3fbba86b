use core::panic::PanicInfo;

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    let message = info.message();
    match info.location() {
        Some(location) => defmt::error!(
            "PANIC at {}:{}: {}",
            location.file(),
            location.line(),
            defmt::Display2Format(&message)
        ),
        None => defmt::error!("PANIC: {}", defmt::Display2Format(&message)),
    }
    cortex_m::asm::udf();
}
