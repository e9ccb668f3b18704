// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! PV label scan and PV header decoding.
//!
//! Scans the first four sectors of a partition window for a `LABELONE`
//! sector, then decodes the PV header it points to: a uuid, a size, and
//! two zero-terminated `{offset, size}` descriptor lists (data areas,
//! then metadata areas).

use std::io::{Read, Seek};

use crate::crc32::Crc32Check;
use crate::drive::Drive;
use crate::endian::{read_u32_le, read_u64_le, sixteen_bytes_are_zero};
use crate::error::{bad_signature, Error, Result};

pub const LABEL_SCAN_SECTORS: u64 = 4;
pub const ID_LEN: usize = 32;
const LABEL_SIGNATURE: &[u8; 8] = b"LABELONE";
const LABEL_TYPE_ID: &[u8; 8] = b"LVM2 001";

/// The 64-byte `LABELONE` sector found in one of the PV's first four sectors.
#[derive(Debug, Clone)]
pub struct LabelHeader {
    pub sector_index: u64,
    pub sector_number: u64,
    pub crc32: u32,
    pub data_offset: u32,
}

/// One `{offset, size}` descriptor from the PV header's area lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PvArea {
    pub offset: u64,
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct PvHeaderOnDisk {
    pub uuid: String,
    pub size: u64,
    pub data_areas: Vec<PvArea>,
    pub metadata_areas: Vec<PvArea>,
}

fn parse_area_list(buf: &[u8]) -> (Vec<PvArea>, usize) {
    let mut areas = Vec::new();
    let mut pos = 0;
    loop {
        let chunk = &buf[pos..pos + 16];
        if sixteen_bytes_are_zero(chunk) {
            pos += 16;
            break;
        }
        areas.push(PvArea {
            offset: read_u64_le(&chunk[0..8]),
            size: read_u64_le(&chunk[8..16]),
        });
        pos += 16;
    }
    (areas, pos)
}

/// Scans the first four sectors of the current window for a valid
/// `LABELONE` sector. Returns the label header and the raw bytes of the
/// sector it was found in (the PV header is addressed relative to it).
pub fn scan_label<R: Read + Seek>(
    drive: &mut Drive<R>,
    checker: &dyn Crc32Check,
) -> Result<(LabelHeader, Vec<u8>)> {
    let sector_size = drive.sector_size() as usize;
    let buf = drive.read_vec_at(0, sector_size * LABEL_SCAN_SECTORS as usize)?;

    for i in 0..LABEL_SCAN_SECTORS as usize {
        let sector = &buf[i * sector_size..(i + 1) * sector_size];
        if &sector[0..8] != LABEL_SIGNATURE {
            continue;
        }
        let stored_crc = read_u32_le(&sector[16..20]);
        if !checker.check(stored_crc, &sector[20..sector_size]) {
            continue;
        }
        let data_offset = read_u32_le(&sector[20..24]);
        let type_id = &sector[24..32];
        if type_id != LABEL_TYPE_ID {
            continue;
        }
        return Ok((
            LabelHeader {
                sector_index: i as u64,
                sector_number: read_u64_le(&sector[8..16]),
                crc32: stored_crc,
                data_offset,
            },
            sector.to_vec(),
        ));
    }

    Err(bad_signature("no PV label found in first four sectors"))
}

/// Decodes the PV header addressed by `label.data_offset` within `label_sector`.
pub fn read_pv_header<R: Read + Seek>(
    drive: &mut Drive<R>,
    label: &LabelHeader,
) -> Result<PvHeaderOnDisk> {
    let sector_size = drive.sector_size();
    let header_offset = label.sector_index * sector_size + label.data_offset as u64;

    // Read a generous prefix; real PV headers are a few hundred bytes.
    let buf = drive.read_vec_at(header_offset, 4096)?;

    if buf.len() < ID_LEN + 8 {
        return Err(Error::FormatSemantic("PV header truncated".into()));
    }
    let uuid = String::from_utf8_lossy(&buf[0..ID_LEN]).into_owned();
    let size = read_u64_le(&buf[ID_LEN..ID_LEN + 8]);

    let mut pos = ID_LEN + 8;
    let (data_areas, consumed) = parse_area_list(&buf[pos..]);
    pos += consumed;
    let (metadata_areas, consumed) = parse_area_list(&buf[pos..]);
    pos += consumed;
    let _ = pos; // bootloader-area list and ext fields follow; unread, out of scope.

    Ok(PvHeaderOnDisk {
        uuid,
        size,
        data_areas,
        metadata_areas,
    })
}
