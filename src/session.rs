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

//! The process-wide connection to the AppleSMC service.
//!
//! All IOKit FFI lives here, gated on macOS; on other targets
//! [`Session::open`] reports [`SmcError::Unsupported`] so the rest of the
//! crate builds and tests everywhere. The handle is exclusively owned and
//! closed on drop, on every exit path.

use serde_json::json;

use crate::logger;
use crate::smc::{SmcError, SmcKeyData, Transport};

pub const KIO_RETURN_NOT_FOUND: i32 = -536_870_160;
pub const KIO_RETURN_NOT_PRIVILEGED: i32 = -536_870_207;
pub const KIO_RETURN_NOT_PERMITTED: i32 = -536_870_174;

/// Maps a non-zero `IOServiceOpen` status. Opening the SMC user client
/// without root fails with either the not-privileged or the not-permitted
/// status depending on the OS release, so both read as a permission
/// problem.
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn open_status_error(status: i32) -> SmcError {
    match status {
        KIO_RETURN_NOT_PRIVILEGED | KIO_RETURN_NOT_PERMITTED => SmcError::PermissionDenied,
        KIO_RETURN_NOT_FOUND => SmcError::NotFound,
        s => SmcError::Kernel(s),
    }
}

#[cfg(target_os = "macos")]
mod iokit {
    use libc::{c_char, c_void};

    #[link(name = "IOKit", kind = "framework")]
    extern "C" {
        pub fn IOServiceMatching(name: *const c_char) -> *mut c_void;
        pub fn IOServiceGetMatchingServices(
            main_port: u32,
            matching: *const c_void,
            existing: *mut u32,
        ) -> i32;
        pub fn IOIteratorNext(iterator: u32) -> u32;
        pub fn IOServiceOpen(
            service: u32,
            owning_task: u32,
            conn_type: u32,
            connection: *mut u32,
        ) -> i32;
        pub fn IOServiceClose(connection: u32) -> i32;
        pub fn IOObjectRelease(object: u32) -> u32;
        pub fn IOConnectCallStructMethod(
            connection: u32,
            selector: u32,
            input: *const c_void,
            input_size: usize,
            output: *mut c_void,
            output_size: *mut usize,
        ) -> i32;
        pub fn mach_task_self() -> u32;
    }
}

/// Exclusively-owned `io_connect_t` to the first matching AppleSMC
/// service instance. One per process.
pub struct Session {
    #[cfg_attr(not(target_os = "macos"), allow(dead_code))]
    conn: u32,
}

impl Session {
    #[cfg(target_os = "macos")]
    pub fn open() -> Result<Session, SmcError> {
        use iokit::*;

        unsafe {
            let matching = IOServiceMatching(c"AppleSMC".as_ptr());
            if matching.is_null() {
                return Err(SmcError::NotFound);
            }

            // IOServiceGetMatchingServices consumes the dictionary.
            let mut iterator = 0u32;
            let status = IOServiceGetMatchingServices(0, matching, &mut iterator);
            if status != 0 {
                return Err(SmcError::Kernel(status));
            }

            let device = IOIteratorNext(iterator);
            IOObjectRelease(iterator);
            if device == 0 {
                return Err(SmcError::NotFound);
            }

            let mut conn = 0u32;
            let status = IOServiceOpen(device, mach_task_self(), 0, &mut conn);
            IOObjectRelease(device);
            match status {
                0 => Ok(Session { conn }),
                s => Err(open_status_error(s)),
            }
        }
    }

    #[cfg(not(target_os = "macos"))]
    pub fn open() -> Result<Session, SmcError> {
        Err(SmcError::Unsupported)
    }
}

impl Transport for Session {
    #[cfg(target_os = "macos")]
    fn call(&mut self, input: &SmcKeyData) -> Result<SmcKeyData, SmcError> {
        use crate::smc::KERNEL_INDEX_SMC;

        let mut output = SmcKeyData::default();
        let mut output_size = std::mem::size_of::<SmcKeyData>();
        let status = unsafe {
            iokit::IOConnectCallStructMethod(
                self.conn,
                KERNEL_INDEX_SMC,
                input as *const SmcKeyData as *const libc::c_void,
                std::mem::size_of::<SmcKeyData>(),
                &mut output as *mut SmcKeyData as *mut libc::c_void,
                &mut output_size,
            )
        };
        if status != 0 {
            return Err(SmcError::Kernel(status));
        }
        Ok(output)
    }

    #[cfg(not(target_os = "macos"))]
    fn call(&mut self, _input: &SmcKeyData) -> Result<SmcKeyData, SmcError> {
        Err(SmcError::Unsupported)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        logger::log_event("smc_close", json!({}));
        #[cfg(target_os = "macos")]
        unsafe {
            iokit::IOServiceClose(self.conn);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_privilege_statuses_map_to_permission_denied() {
        assert!(matches!(open_status_error(KIO_RETURN_NOT_PRIVILEGED), SmcError::PermissionDenied));
        assert!(matches!(open_status_error(KIO_RETURN_NOT_PERMITTED), SmcError::PermissionDenied));
    }

    #[test]
    fn test_missing_service_status_maps_to_not_found() {
        assert!(matches!(open_status_error(KIO_RETURN_NOT_FOUND), SmcError::NotFound));
    }

    #[test]
    fn test_other_statuses_carry_the_raw_code() {
        assert!(matches!(open_status_error(-1), SmcError::Kernel(-1)));
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn test_open_is_unsupported_off_macos() {
        assert!(matches!(Session::open(), Err(SmcError::Unsupported)));
    }
}
