// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! GPT header and partition-table decoding.
//!
//! Header and entry layout follow the UEFI GPT specification: a
//! little-endian header at LBA 1 followed by a partition-entry array,
//! except for the GUID display convention, which mixes endianness on
//! the first three fields. That convention only matters for debug
//! rendering here since GUIDs are otherwise compared as raw bytes.

use std::io::{Read, Seek};

use crate::crc32::Crc32Check;
use crate::endian::{read_u16_le, read_u32_le, read_u64_le};
use crate::error::{bad_signature, Error, Result};
use crate::drive::{Drive, Window};

pub const GPT_SIGNATURE: &[u8; 8] = b"EFI PART";
pub const GPT_REVISION: u32 = 0x0001_0000;
const GPT_HEADER_LBA: u64 = 1;
const GPT_HEADER_SIZE: usize = 92;
const GPT_ENTRY_NAME_UNITS: usize = 36;

/// LVM2 PV partition type GUID, little-endian byte form, per spec.
pub const LVM_TYPE_GUID: [u8; 16] = [
    0x79, 0xD3, 0xD6, 0xE6, 0x07, 0xF5, 0xC2, 0x44, 0xA2, 0x3C, 0x23, 0x8F, 0x2A, 0x3D, 0xF9, 0x28,
];

#[derive(Debug, Clone)]
pub struct GptHeader {
    pub header_size: u32,
    pub header_crc32: u32,
    pub partition_entries_lba: u64,
    pub entry_count: u32,
    pub entry_size: u32,
}

#[derive(Debug, Clone)]
pub struct GptEntry {
    pub type_guid: [u8; 16],
    pub unique_guid: [u8; 16],
    pub first_lba: u64,
    pub last_lba: u64,
    pub attributes: u64,
    pub name: String,
}

impl GptEntry {
    pub fn is_unused(&self) -> bool {
        self.type_guid == [0u8; 16]
    }

    pub fn is_lvm_pv(&self) -> bool {
        self.type_guid == LVM_TYPE_GUID
    }

    /// Mixed-endian debug rendering of the type GUID: the first three
    /// fields are swapped to little-endian-as-printed, the last two are
    /// printed byte-for-byte, matching the conventional GUID string form.
    pub fn type_guid_display(&self) -> String {
        let g = &self.type_guid;
        format!(
            "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            g[3], g[2], g[1], g[0], g[5], g[4], g[7], g[6], g[8], g[9], g[10], g[11], g[12], g[13], g[14], g[15]
        )
    }
}

fn parse_header(buf: &[u8]) -> GptHeader {
    GptHeader {
        header_size: read_u32_le(&buf[12..16]),
        header_crc32: read_u32_le(&buf[16..20]),
        partition_entries_lba: read_u64_le(&buf[72..80]),
        entry_count: read_u32_le(&buf[80..84]),
        entry_size: read_u32_le(&buf[84..88]),
    }
}

fn parse_entry(buf: &[u8]) -> GptEntry {
    let mut type_guid = [0u8; 16];
    type_guid.copy_from_slice(&buf[0..16]);
    let mut unique_guid = [0u8; 16];
    unique_guid.copy_from_slice(&buf[16..32]);

    let name_bytes = &buf[56..56 + GPT_ENTRY_NAME_UNITS * 2];
    let units: Vec<u16> = name_bytes
        .chunks_exact(2)
        .map(read_u16_le)
        .take_while(|&u| u != 0)
        .collect();
    let name = String::from_utf16_lossy(&units);

    GptEntry {
        type_guid,
        unique_guid,
        first_lba: read_u64_le(&buf[32..40]),
        last_lba: read_u64_le(&buf[40..48]),
        attributes: read_u64_le(&buf[48..56]),
        name,
    }
}

/// Reads and validates the primary GPT header at LBA 1. The drive's window
/// must already cover at least the header and partition table -- callers
/// read the GPT immediately after opening the drive, when the window is
/// still whole-device.
fn read_header<R: Read + Seek>(
    drive: &mut Drive<R>,
    checker: &dyn Crc32Check,
) -> Result<GptHeader> {
    let sector_size = drive.sector_size();
    let mut buf = drive.read_vec_at(GPT_HEADER_LBA * sector_size, GPT_HEADER_SIZE)?;

    if &buf[0..8] != GPT_SIGNATURE {
        return Err(bad_signature("GPT header signature mismatch"));
    }
    let revision = read_u32_le(&buf[8..12]);
    if revision != GPT_REVISION {
        return Err(bad_signature(format!(
            "unsupported GPT revision {:#010x}",
            revision
        )));
    }

    let stored_crc = read_u32_le(&buf[16..20]);
    let header_size = read_u32_le(&buf[12..16]) as usize;
    let crc_region_len = header_size.min(buf.len());
    let crc_region = &mut buf[0..crc_region_len];
    crc_region[16..20].copy_from_slice(&[0, 0, 0, 0]);
    if !checker.check(stored_crc, crc_region) {
        return Err(bad_signature("GPT header CRC32 mismatch"));
    }

    Ok(parse_header(&buf))
}

/// Scans the partition table for every entry whose type GUID is the LVM2 PV
/// type, returning their absolute byte windows on the drive in table order.
/// Callers that only need the first matching partition should use
/// [`locate_first_lvm_partition`] instead.
pub fn scan_lvm_partitions<R: Read + Seek>(
    drive: &mut Drive<R>,
    checker: &dyn Crc32Check,
) -> Result<Vec<Window>> {
    let sector_size = drive.sector_size();
    let header = read_header(drive, checker)?;

    let table_len = header.entry_count as u64 * header.entry_size as u64;
    let table_start = header.partition_entries_lba * sector_size;
    drive.set_partition(0, table_start + table_len);

    let mut windows = Vec::new();
    for i in 0..header.entry_count as u64 {
        let offset = table_start + i * header.entry_size as u64;
        let buf = drive.read_vec_at(offset, header.entry_size as usize)?;
        let entry = parse_entry(&buf);
        if entry.is_unused() {
            break;
        }
        if entry.is_lvm_pv() {
            log::debug!(
                "found LVM partition {} (type {})",
                entry.name,
                entry.type_guid_display()
            );
            let start = entry.first_lba * sector_size;
            let length = (entry.last_lba - entry.first_lba + 1) * sector_size;
            windows.push(Window { start, length });
        }
    }
    Ok(windows)
}

/// Locates the first LVM2 partition and narrows the drive's window to it.
pub fn locate_first_lvm_partition<R: Read + Seek>(
    drive: &mut Drive<R>,
    checker: &dyn Crc32Check,
) -> Result<Window> {
    let windows = scan_lvm_partitions(drive, checker)?;
    let window = windows
        .into_iter()
        .next()
        .ok_or_else(|| Error::FormatSemantic("no LVM partition found on this drive".into()))?;
    drive.set_partition(window.start, window.length);
    Ok(window)
}
