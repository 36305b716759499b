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

use std::fmt;

use crate::smc::SmcError;

/// A 4-character SMC key ("TC0P", "F0Ac", ...).
///
/// On the wire a key is the four ASCII bytes packed big-endian into a
/// 32-bit word, char 0 in the most significant byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key([u8; 4]);

impl Key {
    /// Number of fans present on the controller.
    pub const FAN_COUNT: Key = Key(*b"FNum");

    pub fn new(s: &str) -> Result<Key, SmcError> {
        let b = s.as_bytes();
        if b.len() != 4 || !b.iter().all(|c| c.is_ascii()) {
            return Err(SmcError::InvalidKey(s.to_string()));
        }
        Ok(Key([b[0], b[1], b[2], b[3]]))
    }

    /// Builds a per-fan key like `F0Ac` from a fan index and a 2-character
    /// suffix. Fails for any combination that does not come out at exactly
    /// 4 characters (e.g. index 10 with a 2-character suffix).
    pub fn fan(index: u32, suffix: &str) -> Result<Key, SmcError> {
        Key::new(&format!("F{}{}", index, suffix))
    }

    pub fn encode(&self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    pub fn decode(id: u32) -> Key {
        Key(id.to_be_bytes())
    }

    pub fn as_str(&self) -> &str {
        // Constructors only accept ASCII, so this cannot fail.
        std::str::from_utf8(&self.0).unwrap_or("????")
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
