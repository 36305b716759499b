/*
 * This file is part of smcfan.
 *
 * Copyright (C) 2026 smcfan contributors
 *
 * smcfan is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * smcfan is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with smcfan. If not, see <https://www.gnu.org/licenses/>.
 */

mod catalog;
mod fan;
mod key;
mod logger;
mod output;
mod sensors;
mod session;
mod smc;
mod value;

#[cfg(test)]
mod test_utils;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;

use fan::{SystemClock, WakeOutcome, DEFAULT_WAKE_SECONDS};
use session::Session;
use smc::SmcClient;

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  smcfan -l                      List fans");
    eprintln!("  smcfan -s                      List temperature sensors");
    eprintln!("  smcfan -f <fan> <rpm>          Set fan target RPM (negative rpm returns to auto)");
    eprintln!("  smcfan -w <fan> <rpm> [secs]   Wake a stopped fan (default {} seconds)", DEFAULT_WAKE_SECONDS);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --logging                      Append JSON events to /etc/smcfan/logs.json");
    eprintln!("  --catalog <path>               Load the sensor catalog from a JSON file");
}

struct Args {
    logging: bool,
    catalog: Option<PathBuf>,
    positional: Vec<String>,
}

fn parse_args() -> Args {
    let mut args = Args { logging: false, catalog: None, positional: Vec::new() };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--logging" => args.logging = true,
            "--catalog" => {
                match iter.next() {
                    Some(path) => args.catalog = Some(PathBuf::from(path)),
                    None => {
                        eprintln!("Error: --catalog requires a path");
                        std::process::exit(1);
                    }
                }
            }
            _ => args.positional.push(arg),
        }
    }
    args
}

fn require_root() {
    if unsafe { libc::geteuid() } != 0 {
        eprintln!("Error: smcfan requires root privileges to control fans.");
        eprintln!(
            "Please run with: sudo {}",
            std::env::args().next().unwrap_or_else(|| "smcfan".to_string())
        );
        std::process::exit(1);
    }
}

fn open_client() -> SmcClient<Session> {
    match Session::open() {
        Ok(session) => {
            logger::log_event("smc_open", serde_json::json!({}));
            SmcClient::new(session)
        }
        Err(e) => {
            logger::log_event("fatal", serde_json::json!({ "error": e.to_string() }));
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = parse_args();

    if args.logging {
        logger::init_logging();
        logger::log_event(
            "startup",
            serde_json::json!({ "args": std::env::args().collect::<Vec<_>>() }),
        );
    }

    let cmd = match args.positional.first() {
        Some(cmd) => cmd.as_str(),
        None => {
            print_usage();
            std::process::exit(1);
        }
    };

    match cmd {
        "-l" => {
            let mut client = open_client();
            let count = fan::fan_count(&mut client);
            let fans: Vec<_> = (0..count).map(|i| fan::fan_status(&mut client, i)).collect();
            output::write_fan_listing(&mut io::stdout(), &fans)?;
        }
        "-s" => {
            let sensor_catalog = match &args.catalog {
                Some(path) => catalog::load_catalog(path)?,
                None => catalog::SensorCatalog::default(),
            };
            let mut client = open_client();
            let report = sensors::enumerate(&mut client, &sensor_catalog);
            output::write_sensor_listing(&mut io::stdout(), &report)?;
        }
        "-f" => {
            let (index, rpm) = parse_fan_args(&args.positional);
            require_root();
            let mut client = open_client();
            if rpm < 0.0 {
                fan::set_auto(&mut client, index).context("returning fan to automatic control")?;
                output::write_set_ack(&mut io::stdout(), None)?;
            } else {
                fan::set_target_rpm(&mut client, index, rpm).context("setting fan target")?;
                output::write_set_ack(&mut io::stdout(), Some(rpm))?;
            }
        }
        "-w" => {
            let (index, rpm) = parse_fan_args(&args.positional);
            let max_seconds = match args.positional.get(3) {
                Some(s) => match s.parse::<u32>() {
                    Ok(n) if n > 0 => n,
                    _ => {
                        eprintln!("Error: invalid timeout {:?}", s);
                        std::process::exit(1);
                    }
                },
                None => DEFAULT_WAKE_SECONDS,
            };
            require_root();
            let mut client = open_client();

            println!("Waking fan {} to {:.0} RPM (max {} seconds)...", index, rpm, max_seconds);
            let mut clock = SystemClock;
            let outcome = fan::wake(&mut client, index, rpm, max_seconds, &mut clock, &mut |second, max| {
                println!("  Still trying... ({}/{} sec)", second, max);
                let _ = io::stdout().flush();
            })?;
            match outcome {
                WakeOutcome::Woke { rpm, elapsed_ms } => {
                    println!("Fan {} woke up! RPM: {:.0} (after {} ms)", index, rpm, elapsed_ms);
                }
                WakeOutcome::TimedOut { last_rpm } => {
                    println!("Timeout. Fan {} RPM: {:.0}", index, last_rpm.unwrap_or(-1.0));
                }
            }
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Parses the `<fan> <rpm>` pair shared by `-f` and `-w`.
fn parse_fan_args(positional: &[String]) -> (u32, f32) {
    let (Some(fan), Some(rpm)) = (positional.get(1), positional.get(2)) else {
        print_usage();
        std::process::exit(1);
    };
    let index = match fan.parse::<u32>() {
        Ok(i) => i,
        Err(_) => {
            eprintln!("Error: invalid fan index {:?}", fan);
            std::process::exit(1);
        }
    };
    let rpm = match rpm.parse::<f32>() {
        Ok(r) if r.is_finite() => r,
        _ => {
            eprintln!("Error: invalid RPM {:?}", rpm);
            std::process::exit(1);
        }
    };
    (index, rpm)
}
