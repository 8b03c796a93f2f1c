#![deny(clippy::unwrap_used)]

use chrono::Local;
use clap::builder::BoolishValueParser;
use clap::{arg, command, value_parser};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::exit;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use hp5384actrl::command::{DigitMode, Function, GateTime};
use hp5384actrl::measurement::Reading;
use hp5384actrl::proto::conv::pretty_ts;
use hp5384actrl::proto::prologix::Prologix;
use hp5384actrl::proto::{self, Result};
use hp5384actrl::{Address, Hp5384a, DEFAULT_ADDRESS, DEFAULT_BAUDRATE, DEFAULT_TTY};

#[tokio::main]
async fn main() {
    let matches = command!() // requires `cargo` feature
        .arg(
            arg!(
                -p --device <PORT> "Port of the Prologix GPIB-USB controller"
            )
            .default_value(DEFAULT_TTY)
            .required(false)
            .value_parser(value_parser!(PathBuf)),
        )
        .arg(arg!(
            -d --debug ... "Turn debugging information on"
        ))
        .arg(
            arg!(
                -b --baudrate <BAUDRATE> "Baudrate"
            )
            .default_value(DEFAULT_BAUDRATE.to_string())
            .value_parser(value_parser!(u32)),
        )
        .arg(
            arg!(
                -a --address <ADDRESS> "GPIB address of the counter"
            )
            .default_value(DEFAULT_ADDRESS.to_string())
            .value_parser(value_parser!(u8).range(0..=30)),
        )
        .subcommand(clap::Command::new("ident").about("Device identification"))
        .subcommand(clap::Command::new("adapter").about("Prologix controller version"))
        .subcommand(clap::Command::new("reset").about("Reset counter to power-on state"))
        .subcommand(
            clap::Command::new("filter")
                .about("100 kHz low-pass filter on input A")
                .arg(arg!(<state> "Set filter").value_parser(BoolishValueParser::new())),
        )
        .subcommand(
            clap::Command::new("attenuator")
                .about("x20 attenuator on input A")
                .arg(arg!(<state> "Set attenuator").value_parser(BoolishValueParser::new())),
        )
        .subcommand(
            clap::Command::new("manual-level")
                .about("Manual trigger level")
                .arg(arg!(<state> "Set manual level").value_parser(BoolishValueParser::new())),
        )
        .subcommand(
            clap::Command::new("gate")
                .about("Gate time")
                .arg(arg!(<time> "Gate time in seconds").value_parser(value_parser!(GateTime))),
        )
        .subcommand(
            clap::Command::new("measure")
                .about("Read measurements")
                .arg(
                    arg!([function] "Measurement function")
                        .value_parser(value_parser!(Function))
                        .default_value("freq-a"),
                )
                .arg(
                    arg!(-g --gate <TIME> "Select gate time first")
                        .value_parser(value_parser!(GateTime)),
                )
                .arg(
                    arg!(-n --count <N> "Number of readings, 0 for endless")
                        .default_value("1")
                        .value_parser(value_parser!(u64)),
                )
                .arg(
                    arg!(-i --interval <MS> "Pause between readings in milliseconds")
                        .default_value("0")
                        .value_parser(value_parser!(u64)),
                ),
        )
        .subcommand(
            clap::Command::new("digit")
                .about("Manual digit selection")
                .arg(arg!(<mode> "Digit mode").value_parser(value_parser!(DigitMode))),
        )
        .subcommand(
            clap::Command::new("display")
                .about("Display on or blank")
                .arg(arg!(<state> "Set display").value_parser(BoolishValueParser::new())),
        )
        .subcommand(
            clap::Command::new("text")
                .about("Custom display text, without text the display shows readings again")
                .arg(arg!([text] "Up to 12 characters")),
        )
        .subcommand(clap::Command::new("local").about("Return to front panel control"))
        .subcommand_required(true)
        .get_matches();

    let level = match matches.get_count("debug") {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Unable to set up logging: {}", err);
    }

    if let Err(e) = handle_args(&matches).await {
        let port = matches
            .get_one::<PathBuf>("device")
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        match e {
            proto::ProtoError::Serial(err) => {
                if err.kind() == tokio_serial::ErrorKind::NoDevice
                    || matches!(err.kind(), tokio_serial::ErrorKind::Io(ErrorKind::NotFound))
                {
                    eprintln!("{}: File not found", port);
                } else {
                    eprintln!("I/O Error: {} [device: {}]", err, port);
                }
            }
            proto::ProtoError::Io(err) => {
                if err.kind() == ErrorKind::NotFound {
                    eprintln!("{}: File not found", port);
                } else {
                    eprintln!("I/O Error: {} [device: {}]", err, port);
                }
            }
            proto::ProtoError::Timeout(timeout) => {
                eprintln!(
                    "No response within {:?}, is the counter connected and addressed?",
                    timeout
                );
            }
            proto::ProtoError::Abort => {
                eprintln!("Failed to communicate with controller, aborting!");
            }
            err @ (proto::ProtoError::InvalidAddress(_) | proto::ProtoError::DisplayText(_)) => {
                eprintln!("{}", err);
            }
        }
        exit(-1);
    }
}

async fn handle_args(matches: &clap::ArgMatches) -> Result<()> {
    let baud_rate = matches
        .get_one::<u32>("baudrate")
        .unwrap_or(&DEFAULT_BAUDRATE);
    let address = Address::try_from(
        *matches
            .get_one::<u8>("address")
            .unwrap_or(&DEFAULT_ADDRESS),
    )?;

    if let Some(port_path) = matches.get_one::<PathBuf>("device") {
        let mut bus = Prologix::new(port_path.to_string_lossy(), *baud_rate)?;
        bus.init().await?;

        info!("Connected to: {}", port_path.display());

        if let Some(("adapter", _args)) = matches.subcommand() {
            println!("Controller: {}", bus.version().await?);
            return Ok(());
        }

        let bus = Arc::new(Mutex::new(bus));
        let mut counter = Hp5384a::new(bus, address).await?;
        info!("{}", counter);

        match matches.subcommand() {
            Some(("ident", _args)) => {
                println!("Identity: {}", counter.identity().await?);
            }
            Some(("reset", _args)) => {
                counter.reset().await?;
                println!("OK");
            }
            Some(("filter", args)) => {
                let on = *args.get_one::<bool>("state").unwrap_or(&false);
                counter.enable_filter(on).await?;
                println!("OK");
            }
            Some(("attenuator", args)) => {
                let on = *args.get_one::<bool>("state").unwrap_or(&false);
                counter.enable_attenuator(on).await?;
                println!("OK");
            }
            Some(("manual-level", args)) => {
                let on = *args.get_one::<bool>("state").unwrap_or(&false);
                counter.set_manual_level(on).await?;
                println!("OK");
            }
            Some(("gate", args)) => {
                if let Some(gate) = args.get_one::<GateTime>("time") {
                    counter.set_gate_time(*gate).await?;
                    println!("Gate time: {}", gate);
                }
            }
            Some(("measure", args)) => {
                let function = *args
                    .get_one::<Function>("function")
                    .unwrap_or(&Function::FrequencyA);
                if let Some(gate) = args.get_one::<GateTime>("gate") {
                    counter.set_gate_time(*gate).await?;
                }
                let count = *args.get_one::<u64>("count").unwrap_or(&1);
                let interval =
                    Duration::from_millis(*args.get_one::<u64>("interval").unwrap_or(&0));

                let mut taken = 0;
                while count == 0 || taken < count {
                    let ts = Local::now();
                    match counter.measure(function).await? {
                        Some(value) => {
                            println!("{}\t{}", pretty_ts(&ts), Reading { function, value })
                        }
                        None => println!("{}\tNO_DATA", pretty_ts(&ts)),
                    }
                    taken += 1;
                    if !interval.is_zero() {
                        tokio::time::sleep(interval).await;
                    }
                }
            }
            Some(("digit", args)) => {
                if let Some(mode) = args.get_one::<DigitMode>("mode") {
                    counter.set_digit_mode(*mode).await?;
                    println!("OK");
                }
            }
            Some(("display", args)) => {
                let on = *args.get_one::<bool>("state").unwrap_or(&true);
                counter.set_display_on(on).await?;
                println!("OK");
            }
            Some(("text", args)) => {
                if let Some(text) = args.get_one::<String>("text") {
                    counter.set_display_text(text).await?;
                } else {
                    counter.set_display_normal().await?;
                }
                println!("OK");
            }
            Some(("local", _args)) => {
                counter.go_local().await?;
                println!("OK");
            }
            _ => {
                unreachable!("subcommand_required")
            }
        }
    }

    Ok(())
}
