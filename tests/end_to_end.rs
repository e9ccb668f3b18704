// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Full-pipeline tests against synthetic in-memory disks: a GPT table with
//! one LVM partition, a PV label and header, one metadata area, and an
//! extent data region. Exercises the same end-to-end scenarios the
//! component-level unit tests pin individually, but through the public
//! `extract_lv` entry point with the real CRC32 checker throughout.

use std::io::Cursor;

use lvextract::crc32::{crc32, Zlib32Checker};
use lvextract::drive::Drive;
use lvextract::error::Error;

const SECTOR_SIZE: u64 = 512;
const GPT_HEADER_SIZE: usize = 92;
const LVM_TYPE_GUID: [u8; 16] = [
    0x79, 0xD3, 0xD6, 0xE6, 0x07, 0xF5, 0xC2, 0x44, 0xA2, 0x3C, 0x23, 0x8F, 0x2A, 0x3D, 0xF9, 0x28,
];
const LABEL_SIGNATURE: &[u8; 8] = b"LABELONE";
const LABEL_TYPE_ID: &[u8; 8] = b"LVM2 001";
const MDA_SIGNATURE: &[u8; 16] = b" LVM2 x[5A%r0N*>";
const MDA_HEADER_SIZE: u64 = 512;

const PV_UUID_RAW: &str = "Q1Q1Q1Q1Q1Q1Q1Q1Q1Q1Q1Q1Q1Q1Q1Q1";
const PV_UUID_HYPHENATED: &str = "Q1Q1Q1-Q1Q1-Q1Q1-Q1Q1-Q1Q1-Q1Q1-Q1Q1Q1";

const PARTITION_FIRST_LBA: u64 = 40;
const PARTITION_SECTORS: u64 = 1000;

const LABEL_REL_OFFSET: u64 = 0;
const PV_HEADER_REL_OFFSET: u64 = 512;
const MDA_REL_OFFSET: u64 = 8192;
const MDA_SIZE: u64 = 65536;
const MDA_TEXT_REL_OFFSET: u64 = MDA_REL_OFFSET + MDA_HEADER_SIZE;
const EXTENTS_REL_OFFSET: u64 = MDA_REL_OFFSET + MDA_SIZE;
const PE_START_SECTORS: u64 = EXTENTS_REL_OFFSET / SECTOR_SIZE;

fn abs(rel: u64) -> usize {
    (PARTITION_FIRST_LBA * SECTOR_SIZE + rel) as usize
}

/// Builds a full synthetic disk: protective area, GPT header + one LVM
/// partition entry, a PV label and header with one metadata area, the
/// metadata text itself, and whatever the caller already placed in the
/// extent region via `extents`.
fn build_disk(metadata_text: &[u8], extents: &[u8]) -> Vec<u8> {
    let entry_count: u32 = 128;
    let entry_size: u32 = 128;
    let entries_lba: u64 = 2;

    let total_len = abs(EXTENTS_REL_OFFSET) + extents.len() + 4096;
    let mut disk = vec![0u8; total_len];

    // GPT header at LBA 1.
    let mut header = vec![0u8; GPT_HEADER_SIZE];
    header[0..8].copy_from_slice(b"EFI PART");
    header[8..12].copy_from_slice(&0x0001_0000u32.to_le_bytes());
    header[12..16].copy_from_slice(&(GPT_HEADER_SIZE as u32).to_le_bytes());
    header[72..80].copy_from_slice(&entries_lba.to_le_bytes());
    header[80..84].copy_from_slice(&entry_count.to_le_bytes());
    header[84..88].copy_from_slice(&entry_size.to_le_bytes());
    let crc = crc32(&header);
    header[16..20].copy_from_slice(&crc.to_le_bytes());
    let header_off = (SECTOR_SIZE) as usize;
    disk[header_off..header_off + GPT_HEADER_SIZE].copy_from_slice(&header);

    // One partition entry: the LVM PV.
    let table_start = (entries_lba * SECTOR_SIZE) as usize;
    let last_lba = PARTITION_FIRST_LBA + PARTITION_SECTORS - 1;
    disk[table_start..table_start + 16].copy_from_slice(&LVM_TYPE_GUID);
    disk[table_start + 32..table_start + 40].copy_from_slice(&PARTITION_FIRST_LBA.to_le_bytes());
    disk[table_start + 40..table_start + 48].copy_from_slice(&last_lba.to_le_bytes());

    // PV label sector.
    let label_off = abs(LABEL_REL_OFFSET);
    let label_sector = &mut disk[label_off..label_off + SECTOR_SIZE as usize];
    label_sector[0..8].copy_from_slice(LABEL_SIGNATURE);
    label_sector[8..16].copy_from_slice(&1u64.to_le_bytes());
    label_sector[20..24].copy_from_slice(&(PV_HEADER_REL_OFFSET as u32).to_le_bytes());
    label_sector[24..32].copy_from_slice(LABEL_TYPE_ID);
    let label_crc = crc32(&label_sector[20..]);
    label_sector[16..20].copy_from_slice(&label_crc.to_le_bytes());

    // PV header: uuid, size, an empty data-area list, one metadata area.
    let pv_header_off = abs(PV_HEADER_REL_OFFSET);
    disk[pv_header_off..pv_header_off + 32].copy_from_slice(PV_UUID_RAW.as_bytes());
    disk[pv_header_off + 32..pv_header_off + 40]
        .copy_from_slice(&(PARTITION_SECTORS * SECTOR_SIZE).to_le_bytes());
    let mut pos = pv_header_off + 40;
    pos += 16; // empty data-area list terminator
    disk[pos..pos + 8].copy_from_slice(&MDA_REL_OFFSET.to_le_bytes());
    disk[pos + 8..pos + 16].copy_from_slice(&MDA_SIZE.to_le_bytes());
    pos += 16;
    // metadata-area list terminator left as zero.

    // Metadata-area header, one active raw-location entry.
    let mda_off = abs(MDA_REL_OFFSET);
    disk[mda_off + 4..mda_off + 20].copy_from_slice(MDA_SIGNATURE);
    disk[mda_off + 20..mda_off + 24].copy_from_slice(&1u32.to_le_bytes());
    disk[mda_off + 24..mda_off + 32].copy_from_slice(&MDA_REL_OFFSET.to_le_bytes());
    disk[mda_off + 32..mda_off + 40].copy_from_slice(&MDA_SIZE.to_le_bytes());
    let loc_off = mda_off + 40;
    disk[loc_off..loc_off + 8].copy_from_slice(&MDA_HEADER_SIZE.to_le_bytes());
    disk[loc_off + 8..loc_off + 16].copy_from_slice(&(metadata_text.len() as u64).to_le_bytes());
    disk[loc_off + 20..loc_off + 24].copy_from_slice(&0u32.to_le_bytes());

    // Metadata text itself.
    let text_off = abs(MDA_TEXT_REL_OFFSET);
    disk[text_off..text_off + metadata_text.len()].copy_from_slice(metadata_text);

    // Extent data region.
    let extents_off = abs(EXTENTS_REL_OFFSET);
    disk[extents_off..extents_off + extents.len()].copy_from_slice(extents);

    disk
}

fn metadata_text(lv_body: &str) -> Vec<u8> {
    format!(
        "vg1 {{\n    extent_size = 8\n    physical_volumes {{\n        pv0 {{\n            id = \"{}\"\n            dev_size = 1048576\n            pe_start = {}\n            pe_count = 64\n        }}\n    }}\n    logical_volumes {{\n{}\n    }}\n}}\n",
        PV_UUID_HYPHENATED, PE_START_SECTORS, lv_body
    )
    .into_bytes()
}

#[test]
fn single_segment_single_stripe_round_trip() {
    let lv_body = r#"        root {
            segment_count = 1
            segment1 {
                start_extent = 0
                extent_count = 4
                stripe_count = 1
                stripes = [ "pv0", 0 ]
            }
        }"#;
    let text = metadata_text(lv_body);

    let extent_bytes = 8 * SECTOR_SIZE as usize; // extent_size sectors * sector size
    let mut extents = vec![0u8; 4 * extent_bytes];
    for (i, b) in extents.iter_mut().enumerate() {
        *b = ((i * 31) & 0xFF) as u8;
    }

    let disk = build_disk(&text, &extents);
    let mut drive = Drive::from_reader(Cursor::new(disk)).unwrap();
    let buffer = lvextract::extract_lv_with_checker(&mut drive, "root", &Zlib32Checker).unwrap();

    assert_eq!(buffer.len(), 16 * 1024);
    assert_eq!(buffer, extents);
}

#[test]
fn lv_not_found_produces_no_buffer() {
    let lv_body = r#"        root {
            segment_count = 1
            segment1 {
                start_extent = 0
                extent_count = 1
                stripe_count = 1
                stripes = [ "pv0", 0 ]
            }
        }"#;
    let text = metadata_text(lv_body);
    let extents = vec![0u8; 8 * SECTOR_SIZE as usize];
    let disk = build_disk(&text, &extents);
    let mut drive = Drive::from_reader(Cursor::new(disk)).unwrap();

    let result = lvextract::extract_lv_with_checker(&mut drive, "nonexistent", &Zlib32Checker);
    match result {
        Err(Error::FormatSemantic(_)) => {}
        Ok(buffer) => panic!("expected an error, got a {}-byte buffer", buffer.len()),
        Err(other) => panic!("expected FormatSemantic, got {:?}", other),
    }
}

#[test]
fn multi_segment_lv_concatenates_distinct_regions() {
    let lv_body = r#"        root {
            segment_count = 2
            segment1 {
                start_extent = 0
                extent_count = 2
                stripe_count = 1
                stripes = [ "pv0", 0 ]
            }
            segment2 {
                start_extent = 2
                extent_count = 3
                stripe_count = 1
                stripes = [ "pv0", 2 ]
            }
        }"#;
    let text = metadata_text(lv_body);

    let extent_bytes = 8 * SECTOR_SIZE as usize;
    let mut extents = vec![0xFFu8; 5 * extent_bytes];
    for b in extents.iter_mut().take(2 * extent_bytes) {
        *b = 0x00;
    }

    let disk = build_disk(&text, &extents);
    let mut drive = Drive::from_reader(Cursor::new(disk)).unwrap();
    let buffer = lvextract::extract_lv_with_checker(&mut drive, "root", &Zlib32Checker).unwrap();

    assert_eq!(buffer.len(), 5 * extent_bytes);
    assert!(buffer[..2 * extent_bytes].iter().all(|&b| b == 0x00));
    assert!(buffer[2 * extent_bytes..].iter().all(|&b| b == 0xFF));
}
