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

//! The line-oriented stdout protocol consumed by frontends.
//!
//! Machine-parsed, so the formats here are frozen: `FANS`/`FAN` records,
//! `SENSORS`/`TEMP` records and the `OK` acknowledgement. Unreadable fan
//! fields print as `-1.0` to keep the record shape fixed; everywhere else
//! in the crate "unreadable" stays `None`.

use std::io::{self, Write};

use crate::fan::FanStatus;
use crate::sensors::SensorReport;

fn rpm_field(rpm: Option<f32>) -> f32 {
    rpm.unwrap_or(-1.0)
}

/// `FANS:<count>` followed by one `FAN:<i>:<current>:<min>:<max>` per fan,
/// RPM with no decimals.
pub fn write_fan_listing<W: Write>(out: &mut W, fans: &[FanStatus]) -> io::Result<()> {
    writeln!(out, "FANS:{}", fans.len())?;
    for fan in fans {
        writeln!(
            out,
            "FAN:{}:{:.0}:{:.0}:{:.0}",
            fan.index,
            rpm_field(fan.rpm),
            rpm_field(fan.min_rpm),
            rpm_field(fan.max_rpm),
        )?;
    }
    Ok(())
}

/// `SENSORS` then one `TEMP:<key>:<label>:<celsius>` per sensor with one
/// decimal, plus `_AVG`/`_MAX` CPU summary records when CPU cores were
/// found.
pub fn write_sensor_listing<W: Write>(out: &mut W, report: &SensorReport) -> io::Result<()> {
    writeln!(out, "SENSORS")?;
    for reading in &report.readings {
        writeln!(out, "TEMP:{}:{}:{:.1}", reading.key, reading.label, reading.celsius)?;
    }
    if let Some(avg) = report.avg_cpu {
        writeln!(out, "TEMP:_AVG:Average CPU:{:.1}", avg)?;
    }
    if let Some(max) = report.max_cpu {
        writeln!(out, "TEMP:_MAX:Hottest CPU:{:.1}", max)?;
    }
    Ok(())
}

/// `OK:auto` for a return to automatic control, `OK:<rpm>` for a manual
/// target.
pub fn write_set_ack<W: Write>(out: &mut W, target: Option<f32>) -> io::Result<()> {
    match target {
        Some(rpm) => writeln!(out, "OK:{:.0}", rpm),
        None => writeln!(out, "OK:auto"),
    }
}
