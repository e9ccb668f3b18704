// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Little- and big-endian unsigned integer decoding, plus the all-zero test
//! used throughout the on-disk formats to mark the end of a descriptor list.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

pub fn read_u16_le(buf: &[u8]) -> u16 {
    LittleEndian::read_u16(buf)
}

pub fn read_u32_le(buf: &[u8]) -> u32 {
    LittleEndian::read_u32(buf)
}

pub fn read_u64_le(buf: &[u8]) -> u64 {
    LittleEndian::read_u64(buf)
}

pub fn read_u16_be(buf: &[u8]) -> u16 {
    BigEndian::read_u16(buf)
}

pub fn read_u32_be(buf: &[u8]) -> u32 {
    BigEndian::read_u32(buf)
}

pub fn read_u64_be(buf: &[u8]) -> u64 {
    BigEndian::read_u64(buf)
}

/// True iff `buf` is at least 16 bytes and the first 16 are all zero.
/// Used as list-terminator detection for PV-area and raw-location lists.
pub fn sixteen_bytes_are_zero(buf: &[u8]) -> bool {
    buf.len() >= 16 && buf[..16].iter().all(|&b| b == 0)
}
