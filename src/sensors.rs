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

//! Temperature sensor discovery.
//!
//! The controller has no "list sensors" call, so discovery is probing: try
//! every candidate key from the catalog and keep the ones that answer with
//! a plausible temperature. Absent keys are normal, not errors.

use crate::catalog::SensorCatalog;
use crate::key::Key;
use crate::smc::{SmcClient, Transport};
use crate::value::decode_temperature;

#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub key: Key,
    pub label: String,
    pub celsius: f64,
    /// True for CPU core sensors; these feed the average/maximum summary.
    pub cpu_core: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SensorReport {
    pub readings: Vec<SensorReading>,
    pub avg_cpu: Option<f64>,
    pub max_cpu: Option<f64>,
}

/// Open interval: exactly 5.0 and 130.0 are rejected along with everything
/// outside. Unpopulated keys often report 0.0 or garbage, so implausible
/// values are treated the same as absent keys.
fn plausible(celsius: f64) -> bool {
    celsius > 5.0 && celsius < 130.0
}

fn probe<T: Transport>(client: &mut SmcClient<T>, key: Key) -> Option<f64> {
    let value = client.read_key(key).ok()?;
    decode_temperature(&value).filter(|&c| plausible(c))
}

/// Probes every catalog candidate and returns the sensors that responded.
///
/// Core numbering counts accepted sensors, not candidate positions, so the
/// labels stay contiguous when some cores are absent.
pub fn enumerate<T: Transport>(
    client: &mut SmcClient<T>,
    catalog: &SensorCatalog,
) -> SensorReport {
    let mut readings = Vec::new();

    let mut cpu_n = 0u32;
    for suffix in catalog.cpu_core_suffixes.chars() {
        let Ok(key) = Key::new(&format!("Tp0{}", suffix)) else { continue };
        if let Some(celsius) = probe(client, key) {
            cpu_n += 1;
            readings.push(SensorReading {
                key,
                label: format!("CPU Core {}", cpu_n),
                celsius,
                cpu_core: true,
            });
        }
    }

    let mut gpu_n = 0u32;
    for suffix in catalog.gpu_core_suffixes.chars() {
        let Ok(key) = Key::new(&format!("Tg0{}", suffix)) else { continue };
        if let Some(celsius) = probe(client, key) {
            gpu_n += 1;
            readings.push(SensorReading {
                key,
                label: format!("GPU Core {}", gpu_n),
                celsius,
                cpu_core: false,
            });
        }
    }

    // Intel scheme: TC<i>C. Two-digit indices would need 5 characters, so
    // they cannot be SMC keys and are skipped.
    for i in 0..catalog.intel_core_count {
        let Ok(key) = Key::new(&format!("TC{}C", i)) else { continue };
        if let Some(celsius) = probe(client, key) {
            readings.push(SensorReading {
                key,
                label: format!("CPU Core {}", i),
                celsius,
                cpu_core: true,
            });
        }
    }

    for sensor in &catalog.system_sensors {
        let Ok(key) = Key::new(&sensor.key) else { continue };
        if let Some(celsius) = probe(client, key) {
            readings.push(SensorReading {
                key,
                label: sensor.label.clone(),
                celsius,
                cpu_core: false,
            });
        }
    }

    let cpu: Vec<f64> = readings.iter().filter(|r| r.cpu_core).map(|r| r.celsius).collect();
    let (avg_cpu, max_cpu) = if cpu.is_empty() {
        (None, None)
    } else {
        let avg = cpu.iter().sum::<f64>() / cpu.len() as f64;
        let max = cpu.iter().cloned().fold(f64::MIN, f64::max);
        (Some(avg), Some(max))
    };

    SensorReport { readings, avg_cpu, max_cpu }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_utils::*;
    use crate::value::TypeTag;

    fn catalog() -> SensorCatalog {
        SensorCatalog::default()
    }

    #[test]
    fn test_plausible_interval_is_open() {
        assert!(!plausible(5.0));
        assert!(!plausible(130.0));
        assert!(plausible(5.1));
        assert!(plausible(129.9));
        assert!(!plausible(0.0));
        assert!(!plausible(-10.0));
    }

    #[test]
    fn test_enumerate_empty_device() {
        let mut client = SmcClient::new(FakeDevice::new());
        let report = enumerate(&mut client, &catalog());
        assert!(report.readings.is_empty());
        assert_eq!(report.avg_cpu, None);
        assert_eq!(report.max_cpu, None);
    }

    #[test]
    fn test_cpu_core_numbering_counts_accepted_sensors() {
        let mut dev = FakeDevice::new();
        // Suffix order is "159D..."; only '1' and '9' are present, so the
        // accepted sensors are numbered 1 and 2.
        dev.insert("Tp01", TypeTag::SP78, &sp78_bytes(45.0));
        dev.insert("Tp09", TypeTag::SP78, &sp78_bytes(55.0));
        let mut client = SmcClient::new(dev);

        let report = enumerate(&mut client, &catalog());
        assert_eq!(report.readings.len(), 2);
        assert_eq!(report.readings[0].label, "CPU Core 1");
        assert_eq!(report.readings[1].label, "CPU Core 2");
        assert_eq!(report.avg_cpu, Some(50.0));
        assert_eq!(report.max_cpu, Some(55.0));
    }

    #[test]
    fn test_intel_cores_keep_candidate_index() {
        let mut dev = FakeDevice::new();
        dev.insert("TC0C", TypeTag::SP78, &sp78_bytes(40.0));
        dev.insert("TC3C", TypeTag::SP78, &sp78_bytes(48.0));
        let mut client = SmcClient::new(dev);

        let report = enumerate(&mut client, &catalog());
        let labels: Vec<&str> = report.readings.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["CPU Core 0", "CPU Core 3"]);
    }

    #[test]
    fn test_implausible_readings_are_dropped() {
        let mut dev = FakeDevice::new();
        dev.insert("TC0P", TypeTag::SP78, &sp78_bytes(0.0));
        dev.insert("TW0P", TypeTag::SP78, &sp78_bytes(5.0));
        // sp78 tops out near 128C, so the hot boundary needs the float
        // encoding.
        dev.insert("TC0D", TypeTag::FLT, &130.0f32.to_le_bytes());
        dev.insert("TA0P", TypeTag::FLT, &129.5f32.to_le_bytes());
        let mut client = SmcClient::new(dev);

        let report = enumerate(&mut client, &catalog());
        assert_eq!(report.readings.len(), 1);
        assert_eq!(report.readings[0].label, "Ambient");
        assert_eq!(report.readings[0].celsius, 129.5);
    }

    #[test]
    fn test_system_sensors_do_not_feed_cpu_summary() {
        let mut dev = FakeDevice::new();
        dev.insert("TG0D", TypeTag::SP78, &sp78_bytes(60.0));
        dev.insert("Tg05", TypeTag::SP78, &sp78_bytes(58.0));
        let mut client = SmcClient::new(dev);

        let report = enumerate(&mut client, &catalog());
        assert_eq!(report.readings.len(), 2);
        assert_eq!(report.avg_cpu, None);
        assert_eq!(report.max_cpu, None);
    }

    #[test]
    fn test_flt_sensor_decodes() {
        let mut dev = FakeDevice::new();
        dev.insert("Tp01", TypeTag::FLT, &52.5f32.to_le_bytes());
        let mut client = SmcClient::new(dev);

        let report = enumerate(&mut client, &catalog());
        assert_eq!(report.readings.len(), 1);
        assert_eq!(report.readings[0].celsius, 52.5);
        assert_eq!(report.max_cpu, Some(52.5));
    }
}
