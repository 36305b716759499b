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

//! Typed interpretation of raw SMC payloads.
//!
//! The controller reports a 4-character type tag with every key; the
//! decoders dispatch on it. Unknown tags and empty payloads decode to
//! `None` rather than a sentinel number, so callers can tell "no reading"
//! from a measured zero.

use std::fmt;

use crate::key::Key;
use crate::smc::{SmcError, PAYLOAD_CAPACITY};

/// 4-character SMC type tag, stored as raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeTag(pub [u8; 4]);

impl TypeTag {
    /// Signed fixed point, 7 integer bits + 8 fraction bits.
    pub const SP78: TypeTag = TypeTag(*b"sp78");
    /// Unsigned fixed point, 14 integer bits + 2 fraction bits.
    pub const FPE2: TypeTag = TypeTag(*b"fpe2");
    /// IEEE-754 single precision, bytes verbatim.
    pub const FLT: TypeTag = TypeTag(*b"flt ");

    pub fn decode(raw: u32) -> TypeTag {
        TypeTag(raw.to_be_bytes())
    }

    pub fn encode(&self) -> u32 {
        u32::from_be_bytes(self.0)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) => f.write_str(s),
            Err(_) => write!(f, "{:02x}{:02x}{:02x}{:02x}", self.0[0], self.0[1], self.0[2], self.0[3]),
        }
    }
}

/// One key's worth of data as reported by the controller: declared size,
/// type tag, and the fixed-capacity payload buffer.
///
/// Values live for a single operation. The controller is the only source
/// of truth, so nothing here is ever cached across calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Value {
    pub key: Key,
    pub data_size: u32,
    pub tag: TypeTag,
    pub bytes: [u8; PAYLOAD_CAPACITY],
}

impl Value {
    pub fn payload(&self) -> &[u8] {
        let n = (self.data_size as usize).min(PAYLOAD_CAPACITY);
        &self.bytes[..n]
    }

    pub fn is_empty(&self) -> bool {
        self.data_size == 0
    }
}

/// Decodes a temperature in Celsius, or `None` when the payload is empty
/// or the type tag is not a temperature encoding we know.
pub fn decode_temperature(value: &Value) -> Option<f64> {
    if value.is_empty() {
        return None;
    }
    match value.tag {
        TypeTag::SP78 if value.data_size >= 2 => {
            let raw = i16::from_be_bytes([value.bytes[0], value.bytes[1]]);
            Some(f64::from(raw) / 256.0)
        }
        TypeTag::FLT if value.data_size >= 4 => {
            let raw = f32::from_le_bytes([value.bytes[0], value.bytes[1], value.bytes[2], value.bytes[3]]);
            Some(f64::from(raw))
        }
        _ => None,
    }
}

/// Decodes a fan speed in RPM, or `None` when the type tag is not a fan
/// speed encoding we know. Kept separate from [`decode_temperature`]: the
/// two "not available" cases are distinct concepts for callers.
pub fn decode_fan_speed(value: &Value) -> Option<f32> {
    match value.tag {
        TypeTag::FPE2 if value.data_size >= 2 => {
            let raw = u16::from_be_bytes([value.bytes[0], value.bytes[1]]);
            Some(f32::from(raw) / 4.0)
        }
        TypeTag::FLT if value.data_size >= 4 => {
            Some(f32::from_le_bytes([value.bytes[0], value.bytes[1], value.bytes[2], value.bytes[3]]))
        }
        _ => None,
    }
}

/// Encodes `rpm` into an existing [`Value`] in place. The value's tag and
/// size come from a prior read, so the encoding always follows what the
/// controller itself declared for the key, never a guess.
pub fn encode_fan_speed(rpm: f32, value: &mut Value) -> Result<(), SmcError> {
    match value.tag {
        TypeTag::FLT => {
            value.bytes[..4].copy_from_slice(&rpm.to_le_bytes());
            Ok(())
        }
        TypeTag::FPE2 => {
            let raw = (rpm * 4.0).round() as u16;
            value.bytes[..2].copy_from_slice(&raw.to_be_bytes());
            Ok(())
        }
        tag => Err(SmcError::UnsupportedType { key: value.key, tag }),
    }
}
