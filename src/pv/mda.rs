// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Metadata-area header decoding and active-copy selection.
//!
//! A metadata area is a circular buffer: its header names a base offset
//! and size, followed by a zero-terminated list of raw locations, each
//! describing one historical snapshot of the text metadata. The *first*
//! location with no `IGNORED`/`INCONSISTENT`/`FAILED` flag set is the
//! active copy.

use std::io::{Read, Seek};

use crate::drive::Drive;
use crate::endian::{read_u32_le, read_u64_le, sixteen_bytes_are_zero};
use crate::error::{bad_signature, Error, Result};
use crate::pv::label::PvArea;

pub const MDA_HEADER_SIZE: usize = 512;
const MDA_SIGNATURE: &[u8; 16] = b" LVM2 x[5A%r0N*>";
const MDA_VERSION: u32 = 1;

const RAW_LOCN_IGNORED: u32 = 1;
const RAW_LOCN_INCONSISTENT: u32 = 2;
const RAW_LOCN_FAILED: u32 = 4;

#[derive(Debug, Clone)]
pub struct MdaHeader {
    pub base: u64,
    pub size: u64,
}

#[derive(Debug, Clone, Copy)]
struct RawLocation {
    offset: u64,
    size: u64,
    flags: u32,
}

impl RawLocation {
    fn is_active(&self) -> bool {
        self.flags & (RAW_LOCN_IGNORED | RAW_LOCN_INCONSISTENT | RAW_LOCN_FAILED) == 0
    }
}

/// Reads and validates the metadata-area header at the start of `area`.
fn read_header<R: Read + Seek>(drive: &mut Drive<R>, area: &PvArea) -> Result<(MdaHeader, Vec<RawLocation>)> {
    let buf = drive.read_vec_at(area.offset, MDA_HEADER_SIZE)?;

    if &buf[4..20] != MDA_SIGNATURE {
        return Err(bad_signature("metadata-area header signature mismatch"));
    }
    let version = read_u32_le(&buf[20..24]);
    if version != MDA_VERSION {
        return Err(bad_signature(format!("unsupported MDA version {}", version)));
    }
    let base = read_u64_le(&buf[24..32]);
    let size = read_u64_le(&buf[32..40]);

    let mut locations = Vec::new();
    let mut pos = 40;
    while pos + 16 <= buf.len() {
        let chunk = &buf[pos..pos + 24.min(buf.len() - pos)];
        if sixteen_bytes_are_zero(chunk) {
            break;
        }
        if chunk.len() < 24 {
            break;
        }
        locations.push(RawLocation {
            offset: read_u64_le(&chunk[0..8]),
            size: read_u64_le(&chunk[8..16]),
            flags: read_u32_le(&chunk[20..24]),
        });
        pos += 24;
    }

    Ok((MdaHeader { base, size }, locations))
}

/// Reads the active metadata text block from `area`, selecting the *first*
/// active raw-location entry and supporting the circular-buffer wraparound
/// present in the real on-disk format (an entry's byte range can run past
/// the end of the metadata area and wrap to just after its header).
pub fn read_active_metadata<R: Read + Seek>(
    drive: &mut Drive<R>,
    area: &PvArea,
) -> Result<Vec<u8>> {
    let (header, locations) = read_header(drive, area)?;

    let active = locations
        .iter()
        .find(|loc| loc.is_active())
        .ok_or_else(|| Error::FormatSemantic("no active metadata copy in this area".into()))?;

    let mda_size = header.size;
    let first_chunk_len = active.size.min(mda_size.saturating_sub(active.offset));
    let mut text = drive.read_vec_at(header.base + active.offset, first_chunk_len as usize)?;

    let remaining = active.size - first_chunk_len;
    if remaining > 0 {
        let wrapped = drive.read_vec_at(
            header.base + MDA_HEADER_SIZE as u64,
            remaining as usize,
        )?;
        text.extend_from_slice(&wrapped);
    }

    Ok(text)
}
