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

//! SMC protocol client.
//!
//! Every key access is a two-phase exchange with the controller: a
//! READ_KEYINFO call to learn the payload size and type tag, then a
//! READ_BYTES or WRITE_BYTES call sized accordingly. Sizes are not fixed
//! per key family, so the metadata phase cannot be skipped or cached.

use std::fmt;

use thiserror::Error;

use crate::key::Key;
use crate::value::{TypeTag, Value};

/// Selector for the AppleSMC user client struct method.
pub const KERNEL_INDEX_SMC: u32 = 2;

pub const SMC_CMD_READ_BYTES: u8 = 5;
pub const SMC_CMD_WRITE_BYTES: u8 = 6;
pub const SMC_CMD_READ_KEYINFO: u8 = 9;

/// Fixed payload buffer capacity in the wire struct.
pub const PAYLOAD_CAPACITY: usize = 32;

#[derive(Error, Debug)]
pub enum SmcError {
    #[error("SMC service not found")]
    NotFound,
    #[error("permission denied opening SMC - need root")]
    PermissionDenied,
    #[error("kernel call failed with status {0:#010x}")]
    Kernel(i32),
    #[error("SMC access is only available on macOS")]
    Unsupported,
    #[error("{stage} exchange failed for key {key}")]
    Protocol { key: Key, stage: Stage },
    #[error("invalid SMC key {0:?}: must be exactly 4 ASCII characters")]
    InvalidKey(String),
    #[error("key {key} has unsupported type {tag}")]
    UnsupportedType { key: Key, tag: TypeTag },
}

/// Which phase of the two-phase exchange failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    KeyInfo,
    ReadBytes,
    WriteBytes,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::KeyInfo => f.write_str("key-info"),
            Stage::ReadBytes => f.write_str("read-bytes"),
            Stage::WriteBytes => f.write_str("write-bytes"),
        }
    }
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct SmcVersion {
    pub major: u8,
    pub minor: u8,
    pub build: u8,
    pub reserved: u8,
    pub release: u16,
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct SmcPLimitData {
    pub version: u16,
    pub length: u16,
    pub cpu_p_limit: u32,
    pub gpu_p_limit: u32,
    pub mem_p_limit: u32,
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct SmcKeyInfoData {
    pub data_size: u32,
    pub data_type: u32,
    pub data_attributes: u8,
}

/// Input/output struct for the AppleSMC user client. Layout matches the
/// kernel ABI; do not reorder fields.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct SmcKeyData {
    pub key: u32,
    pub vers: SmcVersion,
    pub p_limit_data: SmcPLimitData,
    pub key_info: SmcKeyInfoData,
    pub result: u8,
    pub status: u8,
    pub data8: u8,
    pub data32: u32,
    pub bytes: [u8; PAYLOAD_CAPACITY],
}

/// The seam between the protocol client and the kernel. The real
/// implementation is [`crate::session::Session`]; tests substitute an
/// in-memory device.
pub trait Transport {
    /// Issues one struct-method call and returns the output struct.
    /// An `Err` means the transport itself failed; SMC-level failures
    /// come back in the output's `result` byte.
    fn call(&mut self, input: &SmcKeyData) -> Result<SmcKeyData, SmcError>;
}

pub struct SmcClient<T: Transport> {
    transport: T,
}

impl<T: Transport> SmcClient<T> {
    pub fn new(transport: T) -> SmcClient<T> {
        SmcClient { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Metadata phase: asks the controller for a key's payload size and
    /// type tag. Never cached; fan mode can be toggled externally between
    /// calls and the controller is the only authority.
    fn key_info(&mut self, key: Key) -> Result<SmcKeyInfoData, SmcError> {
        let input = SmcKeyData {
            key: key.encode(),
            data8: SMC_CMD_READ_KEYINFO,
            ..Default::default()
        };
        let output = self.transport.call(&input)?;
        if output.result != 0 {
            return Err(SmcError::Protocol { key, stage: Stage::KeyInfo });
        }
        if output.key_info.data_size as usize > PAYLOAD_CAPACITY {
            // A size beyond the wire buffer is a controller-side violation.
            return Err(SmcError::Protocol { key, stage: Stage::KeyInfo });
        }
        Ok(output.key_info)
    }

    pub fn read_key(&mut self, key: Key) -> Result<Value, SmcError> {
        let info = self.key_info(key)?;

        let input = SmcKeyData {
            key: key.encode(),
            key_info: SmcKeyInfoData { data_size: info.data_size, ..Default::default() },
            data8: SMC_CMD_READ_BYTES,
            ..Default::default()
        };
        let output = self.transport.call(&input)?;
        if output.result != 0 {
            return Err(SmcError::Protocol { key, stage: Stage::ReadBytes });
        }

        Ok(Value {
            key,
            data_size: info.data_size,
            tag: TypeTag::decode(info.data_type),
            bytes: output.bytes,
        })
    }

    /// Writes a value back to the controller. Metadata is re-fetched first
    /// so the write is sized to what the controller expects; the payload
    /// buffer is zero-padded past the caller's bytes, which keeps trailing
    /// bytes of a wider field from being corrupted.
    pub fn write_key(&mut self, value: &Value) -> Result<(), SmcError> {
        let key = value.key;
        let info = self.key_info(key)?;

        let input = SmcKeyData {
            key: key.encode(),
            key_info: SmcKeyInfoData { data_size: info.data_size, ..Default::default() },
            data8: SMC_CMD_WRITE_BYTES,
            bytes: value.bytes,
            ..Default::default()
        };
        let output = self.transport.call(&input)?;
        if output.result != 0 {
            return Err(SmcError::Protocol { key, stage: Stage::WriteBytes });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_utils::*;

    #[test]
    fn test_read_key_two_phase() {
        let mut dev = FakeDevice::new();
        dev.insert("TC0P", TypeTag::SP78, &[0x19, 0x80]);
        let mut client = SmcClient::new(dev);

        let v = client.read_key(Key::new("TC0P").unwrap()).unwrap();
        assert_eq!(v.data_size, 2);
        assert_eq!(v.tag, TypeTag::SP78);
        assert_eq!(v.payload(), &[0x19, 0x80]);
    }

    #[test]
    fn test_read_missing_key_fails_in_metadata_phase() {
        let mut client = SmcClient::new(FakeDevice::new());
        let err = client.read_key(Key::new("TC0P").unwrap()).unwrap_err();
        assert!(matches!(err, SmcError::Protocol { stage: Stage::KeyInfo, .. }));
    }

    #[test]
    fn test_repeated_reads_are_idempotent() {
        let mut dev = FakeDevice::new();
        dev.insert("F0Ac", TypeTag::FPE2, &[0x0C, 0x80]);
        let mut client = SmcClient::new(dev);

        let key = Key::new("F0Ac").unwrap();
        let a = client.read_key(key).unwrap();
        let b = client.read_key(key).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_write_pads_to_controller_size() {
        // Controller declares 4 bytes for the key; the caller's value only
        // carries 2 meaningful bytes. The write must cover all 4, with the
        // tail zeroed.
        let mut dev = FakeDevice::new();
        dev.insert("F0Tg", TypeTag::FPE2, &[0xAA, 0xBB, 0xCC, 0xDD]);
        let mut client = SmcClient::new(dev);

        let key = Key::new("F0Tg").unwrap();
        let mut bytes = [0u8; PAYLOAD_CAPACITY];
        bytes[0] = 0x0C;
        bytes[1] = 0x80;
        let value = Value { key, data_size: 2, tag: TypeTag::FPE2, bytes };
        client.write_key(&value).unwrap();

        let (wkey, wbytes) = client.transport().writes.last().unwrap().clone();
        assert_eq!(wkey, key);
        assert_eq!(wbytes, vec![0x0C, 0x80, 0x00, 0x00]);
    }

    #[test]
    fn test_oversized_key_info_is_a_protocol_error() {
        let mut dev = FakeDevice::new();
        dev.insert("JUNK", TypeTag(*b"ch8*"), &[0u8; PAYLOAD_CAPACITY + 1]);
        let mut client = SmcClient::new(dev);

        let err = client.read_key(Key::new("JUNK").unwrap()).unwrap_err();
        assert!(matches!(err, SmcError::Protocol { stage: Stage::KeyInfo, .. }));
    }
}
