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

//! Candidate sensor keys and their display labels.
//!
//! A pure data source, deliberately outside the protocol core: the key
//! naming scheme is platform-specific, so the catalog can be swapped for
//! another machine's tables (`--catalog <path>`) without touching the
//! decoder or controller logic.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamedSensor {
    pub key: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SensorCatalog {
    /// Apple Silicon CPU core sensors: one key `Tp0<c>` per character.
    #[serde(default = "default_cpu_core_suffixes")]
    pub cpu_core_suffixes: String,
    /// Apple Silicon GPU core sensors: one key `Tg0<c>` per character.
    #[serde(default = "default_gpu_core_suffixes")]
    pub gpu_core_suffixes: String,
    /// Intel CPU core sensors `TC<i>C` for i in 0..count.
    #[serde(default = "default_intel_core_count")]
    pub intel_core_count: u32,
    /// Individually named system sensors.
    #[serde(default = "default_system_sensors")]
    pub system_sensors: Vec<NamedSensor>,
}

fn default_cpu_core_suffixes() -> String {
    "159DHLPTXbfjnrUV".to_string()
}

fn default_gpu_core_suffixes() -> String {
    "5DLTXbfjnr19HPV".to_string()
}

fn default_intel_core_count() -> u32 {
    16
}

fn default_system_sensors() -> Vec<NamedSensor> {
    let named = |key: &str, label: &str| NamedSensor { key: key.to_string(), label: label.to_string() };
    vec![
        named("TC0P", "CPU Proximity"),
        named("TC0D", "CPU Die"),
        named("TG0D", "GPU Die"),
        named("TW0P", "Wireless"),
        named("Ts0P", "Palm Rest"),
        named("Ts1P", "Palm Rest Left"),
        named("TB0T", "Battery"),
        named("TB1T", "Battery 1"),
        named("TB2T", "Battery 2"),
        named("Tp0C", "Power Supply"),
        named("TH0a", "SSD A"),
        named("TH0b", "SSD B"),
        named("Tm0P", "Memory"),
        named("TA0P", "Ambient"),
    ]
}

impl Default for SensorCatalog {
    fn default() -> Self {
        SensorCatalog {
            cpu_core_suffixes: default_cpu_core_suffixes(),
            gpu_core_suffixes: default_gpu_core_suffixes(),
            intel_core_count: default_intel_core_count(),
            system_sensors: default_system_sensors(),
        }
    }
}

pub fn load_catalog(path: &Path) -> anyhow::Result<SensorCatalog> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading sensor catalog {}", path.display()))?;
    let catalog = serde_json::from_str(&data)
        .with_context(|| format!("parsing sensor catalog {}", path.display()))?;
    Ok(catalog)
}
