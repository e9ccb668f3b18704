// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Recovers a named Logical Volume's byte image directly from a raw,
//! GPT-partitioned block device, without involving the LVM2 userspace
//! tools or a running device-mapper stack.
//!
//! The pipeline: [`gpt`] locates the LVM2 partition, [`pv::label`] finds
//! and decodes its PV label and header, [`pv::mda`] reads the active copy
//! of the text metadata out of a metadata area, [`text`] parses that text
//! into a [`text::Tree`], and [`assembler`] walks the tree to read and
//! concatenate the named LV's extents via [`drive::Drive`]. [`sink`] writes
//! the result to disk.

pub mod assembler;
pub mod crc32;
pub mod drive;
pub mod endian;
pub mod error;
pub mod gpt;
pub mod model;
pub mod pv;
pub mod sink;
pub mod text;
mod util;

use std::io::{Read, Seek};

use crc32::Crc32Check;
use drive::Drive;
use error::{bad_semantic, Result};

/// Reads every metadata area on the PV at the drive's current window and
/// returns the first one that decodes successfully: any single readable
/// copy is sufficient, and multiple copies on one PV are expected to be
/// identical.
fn read_first_usable_metadata<R: Read + Seek>(
    drive: &mut Drive<R>,
    checker: &dyn Crc32Check,
) -> Result<text::Tree> {
    let (label, _sector) = pv::label::scan_label(drive, checker)?;
    let header = pv::label::read_pv_header(drive, &label)?;

    let mut last_err = None;
    for area in &header.metadata_areas {
        match pv::mda::read_active_metadata(drive, area) {
            Ok(text) => match text::parse(&text) {
                Ok(tree) => return Ok(tree),
                Err(e) => last_err = Some(e),
            },
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| bad_semantic("PV has no metadata areas")))
}

/// Runs the full extraction pipeline against an already-opened drive: finds
/// the LVM2 partition, reads its metadata, and assembles `lv_name`'s image.
///
/// Uses the real zlib/CRC-32 check throughout -- `NullChecker` exists for
/// callers (and tests) recovering from media already known to have
/// corrupt checksums.
pub fn extract_lv<R: Read + Seek>(drive: &mut Drive<R>, lv_name: &str) -> Result<Vec<u8>> {
    extract_lv_with_checker(drive, lv_name, &crc32::Zlib32Checker)
}

pub fn extract_lv_with_checker<R: Read + Seek>(
    drive: &mut Drive<R>,
    lv_name: &str,
    checker: &dyn Crc32Check,
) -> Result<Vec<u8>> {
    let lvm_partitions = gpt::scan_lvm_partitions(drive, checker)?;
    let window = lvm_partitions
        .first()
        .copied()
        .ok_or_else(|| bad_semantic("no LVM partition found on this drive"))?;
    drive.set_partition(window.start, window.length);

    let tree = read_first_usable_metadata(drive, checker)?;

    assembler::assemble_lv(drive, &tree, lv_name, &lvm_partitions, checker)
}
