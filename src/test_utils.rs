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

//! Shared test fixtures: an in-memory SMC device and a recording clock.

#[cfg(test)]
pub mod test_utils {
    use std::collections::HashMap;
    use std::time::Duration;

    use crate::fan::Clock;
    use crate::key::Key;
    use crate::smc::{
        SmcError, SmcKeyData, Transport, PAYLOAD_CAPACITY, SMC_CMD_READ_BYTES,
        SMC_CMD_READ_KEYINFO, SMC_CMD_WRITE_BYTES,
    };
    use crate::value::TypeTag;

    /// Result byte AppleSMC reports for a key it does not have.
    const SMC_RESULT_KEY_NOT_FOUND: u8 = 0x84;

    struct FakeKey {
        tag: TypeTag,
        bytes: Vec<u8>,
    }

    struct SpinUp {
        reads_before: u32,
        bytes: Vec<u8>,
    }

    /// In-memory device speaking the struct-method protocol against a key
    /// table. Writes are recorded for assertions, and a key can be
    /// scheduled to change its payload after a number of reads to model a
    /// fan spinning up.
    #[derive(Default)]
    pub struct FakeDevice {
        keys: HashMap<Key, FakeKey>,
        spinups: HashMap<Key, SpinUp>,
        reads: HashMap<Key, u32>,
        pub writes: Vec<(Key, Vec<u8>)>,
    }

    impl FakeDevice {
        pub fn new() -> FakeDevice {
            FakeDevice::default()
        }

        pub fn insert(&mut self, key: &str, tag: TypeTag, bytes: &[u8]) {
            let key = Key::new(key).unwrap();
            self.keys.insert(key, FakeKey { tag, bytes: bytes.to_vec() });
        }

        /// After `reads_before` read-bytes calls on `key`, subsequent reads
        /// return `bytes` instead of the original payload.
        pub fn spin_up_after(&mut self, key: &str, reads_before: u32, bytes: &[u8]) {
            let key = Key::new(key).unwrap();
            self.spinups.insert(key, SpinUp { reads_before, bytes: bytes.to_vec() });
        }

        fn not_found() -> SmcKeyData {
            SmcKeyData { result: SMC_RESULT_KEY_NOT_FOUND, ..Default::default() }
        }
    }

    impl Transport for FakeDevice {
        fn call(&mut self, input: &SmcKeyData) -> Result<SmcKeyData, SmcError> {
            let key = Key::decode(input.key);
            match input.data8 {
                SMC_CMD_READ_KEYINFO => {
                    let Some(entry) = self.keys.get(&key) else {
                        return Ok(FakeDevice::not_found());
                    };
                    let mut output = SmcKeyData::default();
                    output.key_info.data_size = entry.bytes.len() as u32;
                    output.key_info.data_type = entry.tag.encode();
                    Ok(output)
                }
                SMC_CMD_READ_BYTES => {
                    let Some(entry) = self.keys.get(&key) else {
                        return Ok(FakeDevice::not_found());
                    };
                    let reads = self.reads.entry(key).or_insert(0);
                    let payload = match self.spinups.get(&key) {
                        Some(spin) if *reads >= spin.reads_before => &spin.bytes,
                        _ => &entry.bytes,
                    };
                    *reads += 1;
                    let mut output = SmcKeyData::default();
                    let n = payload.len().min(PAYLOAD_CAPACITY);
                    output.bytes[..n].copy_from_slice(&payload[..n]);
                    Ok(output)
                }
                SMC_CMD_WRITE_BYTES => {
                    let Some(entry) = self.keys.get_mut(&key) else {
                        return Ok(FakeDevice::not_found());
                    };
                    let n = (input.key_info.data_size as usize).min(PAYLOAD_CAPACITY);
                    entry.bytes = input.bytes[..n].to_vec();
                    self.writes.push((key, entry.bytes.clone()));
                    Ok(SmcKeyData::default())
                }
                cmd => panic!("unhandled SMC command {}", cmd),
            }
        }
    }

    /// Clock that records pauses instead of sleeping.
    #[derive(Default)]
    pub struct CountingClock {
        pub pauses: u32,
        pub total: Duration,
    }

    impl Clock for CountingClock {
        fn pause(&mut self, duration: Duration) {
            self.pauses += 1;
            self.total += duration;
        }
    }

    pub fn fpe2_bytes(rpm: f32) -> [u8; 2] {
        ((rpm * 4.0).round() as u16).to_be_bytes()
    }

    pub fn sp78_bytes(celsius: f64) -> [u8; 2] {
        ((celsius * 256.0).round() as i16).to_be_bytes()
    }
}
