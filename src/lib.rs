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

//! smcfan - Apple SMC fan and temperature utility
//!
//! This library speaks the AppleSMC user-client protocol to read thermal
//! sensors and control cooling fans on Macs. The protocol client is
//! generic over a transport, so everything above the IOKit connection can
//! be exercised without hardware.

pub mod catalog;
pub mod fan;
pub mod key;
pub mod logger;
pub mod output;
pub mod sensors;
pub mod session;
pub mod smc;
pub mod value;

#[cfg(test)]
pub mod test_utils;
