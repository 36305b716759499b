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

//! Fan control on top of the protocol client.
//!
//! There is no local fan object: mode, min, max, target and current RPM
//! are independent key lookups against the controller every time, because
//! the thermal firmware can change state behind our back at any moment.

use std::time::Duration;

use serde_json::json;

use crate::key::Key;
use crate::logger;
use crate::smc::{SmcClient, SmcError, Transport};
use crate::value;

/// Polling cadence of the wake loop. Deliberate, not incidental: the
/// firmware needs time to re-arbitrate control between writes.
pub const WAKE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A fan reporting more than this many RPM counts as spinning.
const WAKE_RPM_THRESHOLD: f32 = 100.0;

/// Default wake budget when the caller does not pass one.
pub const DEFAULT_WAKE_SECONDS: u32 = 30;

/// Sleep dependency of the wake loop, injectable so tests can simulate
/// elapsed iterations without real-time delay.
pub trait Clock {
    fn pause(&mut self, interval: Duration);
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn pause(&mut self, interval: Duration) {
        std::thread::sleep(interval);
    }
}

/// How a wake attempt ended. A timeout is a reportable outcome, not an
/// error: a stalled fan may be a real hardware fault the caller has to
/// decide about.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WakeOutcome {
    Woke { rpm: f32, elapsed_ms: u64 },
    TimedOut { last_rpm: Option<f32> },
}

/// Snapshot of one fan for the listing. `None` means the controller did
/// not produce a usable reading for that key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FanStatus {
    pub index: u32,
    pub rpm: Option<f32>,
    pub min_rpm: Option<f32>,
    pub max_rpm: Option<f32>,
}

/// Number of fans, from the `FNum` key. Degrades to 0 when the key is
/// missing, empty or unreadable, so a listing still prints a well-formed
/// empty record instead of aborting.
pub fn fan_count<T: Transport>(client: &mut SmcClient<T>) -> u32 {
    match client.read_key(Key::FAN_COUNT) {
        Ok(v) if !v.is_empty() => u32::from(v.bytes[0]),
        _ => 0,
    }
}

fn read_speed<T: Transport>(
    client: &mut SmcClient<T>,
    index: u32,
    suffix: &str,
) -> Result<Option<f32>, SmcError> {
    let key = Key::fan(index, suffix)?;
    let v = client.read_key(key)?;
    Ok(value::decode_fan_speed(&v))
}

pub fn fan_rpm<T: Transport>(client: &mut SmcClient<T>, index: u32) -> Result<Option<f32>, SmcError> {
    read_speed(client, index, "Ac")
}

pub fn fan_min_rpm<T: Transport>(client: &mut SmcClient<T>, index: u32) -> Result<Option<f32>, SmcError> {
    read_speed(client, index, "Mn")
}

pub fn fan_max_rpm<T: Transport>(client: &mut SmcClient<T>, index: u32) -> Result<Option<f32>, SmcError> {
    read_speed(client, index, "Mx")
}

pub fn fan_target_rpm<T: Transport>(client: &mut SmcClient<T>, index: u32) -> Result<Option<f32>, SmcError> {
    read_speed(client, index, "Tg")
}

/// Gathers one fan's listing row. Failed reads degrade to `None` instead
/// of aborting the listing.
pub fn fan_status<T: Transport>(client: &mut SmcClient<T>, index: u32) -> FanStatus {
    FanStatus {
        index,
        rpm: fan_rpm(client, index).ok().flatten(),
        min_rpm: fan_min_rpm(client, index).ok().flatten(),
        max_rpm: fan_max_rpm(client, index).ok().flatten(),
    }
}

fn set_mode<T: Transport>(client: &mut SmcClient<T>, index: u32, mode: u8) -> Result<(), SmcError> {
    let key = Key::fan(index, "Md")?;
    // Some controllers lack a mode key for an index; absent or empty is a
    // no-op, not an error.
    let mut v = match client.read_key(key) {
        Ok(v) => v,
        Err(_) => return Ok(()),
    };
    if v.is_empty() {
        return Ok(());
    }
    v.bytes[0] = mode;
    client.write_key(&v)
}

pub fn set_manual<T: Transport>(client: &mut SmcClient<T>, index: u32) -> Result<(), SmcError> {
    set_mode(client, index, 1)
}

pub fn set_auto<T: Transport>(client: &mut SmcClient<T>, index: u32) -> Result<(), SmcError> {
    set_mode(client, index, 0)
}

/// Reads the key to learn its declared type/size, encodes `rpm` into that
/// shape, and writes it back.
fn write_speed<T: Transport>(client: &mut SmcClient<T>, key: Key, rpm: f32) -> Result<(), SmcError> {
    let mut v = client.read_key(key)?;
    value::encode_fan_speed(rpm, &mut v)?;
    client.write_key(&v)
}

/// Forces manual mode and sets both the minimum-speed and target-speed
/// keys to `rpm`. Set-and-forget: does not verify the fan reached the
/// speed (use [`wake`] for that).
pub fn set_target_rpm<T: Transport>(
    client: &mut SmcClient<T>,
    index: u32,
    rpm: f32,
) -> Result<(), SmcError> {
    set_manual(client, index)?;
    write_speed(client, Key::fan(index, "Mn")?, rpm)?;
    write_speed(client, Key::fan(index, "Tg")?, rpm)?;
    logger::log_event("fan_set", json!({ "fan": index, "rpm": rpm }));
    Ok(())
}

/// Persistent wake loop: keeps re-asserting manual mode and re-writing the
/// minimum and target speed until the fan reports motion or the budget of
/// `max_seconds * 10` iterations runs out.
///
/// `progress` is invoked every 10th iteration with (elapsed seconds,
/// budget seconds). Per-iteration protocol errors are swallowed; the loop
/// itself is the retry policy.
pub fn wake<T: Transport>(
    client: &mut SmcClient<T>,
    index: u32,
    target_rpm: f32,
    max_seconds: u32,
    clock: &mut dyn Clock,
    progress: &mut dyn FnMut(u32, u32),
) -> Result<WakeOutcome, SmcError> {
    let key_mn = Key::fan(index, "Mn")?;
    let key_tg = Key::fan(index, "Tg")?;
    let max_iterations = max_seconds.saturating_mul(10);

    let mut last_rpm: Option<f32> = None;
    for i in 0..max_iterations {
        let _ = set_manual(client, index);
        let _ = write_speed(client, key_mn, target_rpm);
        let _ = write_speed(client, key_tg, target_rpm);

        clock.pause(WAKE_POLL_INTERVAL);

        if let Some(rpm) = fan_rpm(client, index).ok().flatten() {
            last_rpm = Some(rpm);
            if rpm > WAKE_RPM_THRESHOLD {
                let elapsed_ms = u64::from(i + 1) * 100;
                logger::log_event(
                    "wake_result",
                    json!({ "fan": index, "woke": true, "rpm": rpm, "elapsed_ms": elapsed_ms }),
                );
                return Ok(WakeOutcome::Woke { rpm, elapsed_ms });
            }
        }

        if (i + 1) % 10 == 0 {
            let second = (i + 1) / 10;
            progress(second, max_seconds);
            logger::log_event(
                "wake_progress",
                json!({ "fan": index, "second": second, "max_seconds": max_seconds }),
            );
        }
    }

    let last_rpm = fan_rpm(client, index).ok().flatten().or(last_rpm);
    logger::log_event(
        "wake_result",
        json!({ "fan": index, "woke": false, "last_rpm": last_rpm }),
    );
    Ok(WakeOutcome::TimedOut { last_rpm })
}
