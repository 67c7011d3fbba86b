mod session;

use std::env;
use std::process;

use acs712_core::launch::launch;
use acs712_core::poller::Poller;
use acs712_core::sensor::{Acs712, SensorConfig};
use acs712_core::telemetry::ReportFormat;
use crossterm::style::{Stylize, style};

use session::{HostWatchdog, SimulatedAdc, SimulationProfile, TerminalSink, ThreadSpawner};

const USAGE: &str = "Usage: acs712-emulator [--amps <A>] [--ripple <A>] [--fail-every <N>] \
     [--cycles <N>] [--interval-ms <ms>]";

fn main() {
    let profile = parse_profile(env::args().skip(1)).unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("{USAGE}");
        process::exit(2);
    });

    println!(
        "ACS712 emulator: {:.3} A (ripple {:.3} A), {}",
        profile.amps,
        profile.ripple_amps,
        profile
            .cycles
            .map_or_else(|| "polling until interrupted".to_string(), |n| format!("{n} cycles"))
    );

    let config = SensorConfig::ACS712_05B;
    let adc = SimulatedAdc::new(config, profile);
    let poller = Poller::with_interval_ms(Acs712::new(adc, config), profile.interval_ms);

    let mut watchdog = HostWatchdog::default();
    let mut spawner = ThreadSpawner::new(poller, profile);
    let mut boot_log = TerminalSink::new(ReportFormat::BOARD);

    if let Err(err) = launch(&mut watchdog, &mut spawner, &mut boot_log) {
        eprintln!("{}", style(format!("acs712: {err}")).red());
        process::exit(1);
    }

    let Some(recorder) = spawner.join() else {
        eprintln!("{}", style("acs712: polling thread panicked").red());
        process::exit(1);
    };

    let mean = recorder
        .mean_amps()
        .map_or_else(|| "n/a".to_string(), |amps| format!("{amps:.6} A"));
    println!(
        "{} cycles, {} failed reads, mean current {}",
        recorder.cycles(),
        recorder.failed_reads(),
        mean
    );
}

fn parse_profile<I>(mut args: I) -> Result<SimulationProfile, String>
where
    I: Iterator<Item = String>,
{
    let mut profile = SimulationProfile::default();
    while let Some(flag) = args.next() {
        let (name, inline) = match flag.split_once('=') {
            Some((name, value)) => (name.to_string(), Some(value.to_string())),
            None => (flag, None),
        };
        let mut value = || {
            inline
                .clone()
                .or_else(|| args.next())
                .ok_or_else(|| format!("Expected value after {name}"))
        };

        match name.as_str() {
            "--amps" => profile.amps = parse_number(&name, &value()?)?,
            "--ripple" => profile.ripple_amps = parse_number(&name, &value()?)?,
            "--fail-every" => {
                let every: u32 = parse_number(&name, &value()?)?;
                profile.fail_every = (every > 0).then_some(every);
            }
            "--cycles" => profile.cycles = Some(parse_number(&name, &value()?)?),
            "--interval-ms" => profile.interval_ms = parse_number(&name, &value()?)?,
            _ => return Err(format!("Unknown argument `{name}`")),
        }
    }
    Ok(profile)
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("Invalid value `{value}` for {flag}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(ToString::to_string).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn defaults_poll_forever_at_one_hertz() {
        let profile = parse_profile(args(&[])).expect("no args");
        assert_eq!(profile, SimulationProfile::default());
        assert_eq!(profile.interval_ms, 1_000);
        assert!(profile.cycles.is_none());
    }

    #[test]
    fn parses_separate_and_inline_values() {
        let profile = parse_profile(args(&[
            "--amps",
            "1.5",
            "--ripple=0.25",
            "--fail-every",
            "7",
            "--cycles=10",
        ]))
        .expect("valid args");

        assert!((profile.amps - 1.5).abs() < f32::EPSILON);
        assert!((profile.ripple_amps - 0.25).abs() < f32::EPSILON);
        assert_eq!(profile.fail_every, Some(7));
        assert_eq!(profile.cycles, Some(10));
    }

    #[test]
    fn usage_lists_every_flag() {
        for flag in ["--amps", "--ripple", "--fail-every", "--cycles", "--interval-ms"] {
            assert!(USAGE.contains(flag), "{flag} missing from usage");
            assert!(parse_profile(args(&[flag, "1"])).is_ok(), "{flag} rejected");
        }
    }

    #[test]
    fn zero_fail_every_disables_faults() {
        let profile = parse_profile(args(&["--fail-every", "0"])).expect("valid args");
        assert_eq!(profile.fail_every, None);
    }

    #[test]
    fn rejects_unknown_flags_and_bad_values() {
        assert!(parse_profile(args(&["--volts", "1"])).is_err());
        assert!(parse_profile(args(&["--amps", "lots"])).is_err());
        assert!(parse_profile(args(&["--cycles"])).is_err());
    }
}
