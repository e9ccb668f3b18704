// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Interprets the `physical_volumes` and `logical_volumes` sections of the
//! parsed tree, computes each stripe's disk layout, and streams extents
//! into the output buffer.
//!
//! A stripe only carries its PV's name in the metadata text; it's resolved
//! to an index into the assembler's own PV array once both the PV and LV
//! tables have been built, rather than kept as a string or a raw pointer.
//! PV drive windows are resolved separately, by matching every LVM-type
//! GPT partition's PV-header uuid against the metadata's per-PV `id`
//! field -- so a VG spread across more than one PV resolves correctly,
//! not just the single-PV case.

use std::collections::HashMap;
use std::io::{Read, Seek};

use crate::crc32::Crc32Check;
use crate::drive::{Drive, Window};
use crate::error::{bad_semantic, unsupported, Result};
use crate::model::{PhysicalVolume, Segment, Stripe};
use crate::pv;
use crate::text::tree::{NodeId, NodeKind, Tree};
use crate::util::hyphenate_uuid;

/// Keys present at the true file root that describe the metadata dump
/// itself, not the volume group: `contents`, `version`, `description`,
/// `creation_host`, `creation_time`, then one child keyed by the VG name.
const RESERVED_TOP_KEYS: [&str; 5] =
    ["contents", "version", "description", "creation_host", "creation_time"];

fn find_vg_node(tree: &Tree) -> Result<NodeId> {
    for id in tree.children(tree.root) {
        let node = tree.node(id);
        if matches!(node.kind, NodeKind::Child(_)) && !RESERVED_TOP_KEYS.contains(&node.key.as_str()) {
            return Ok(id);
        }
    }
    Err(bad_semantic("no volume-group section found at top level"))
}

fn int_child(tree: &Tree, parent: NodeId, key: &str) -> Result<i64> {
    let id = tree
        .find_child(parent, key)
        .ok_or_else(|| bad_semantic(format!("missing integer key '{}'", key)))?;
    match tree.node(id).kind {
        NodeKind::Integer(v) => Ok(v),
        _ => Err(bad_semantic(format!("key '{}' is not an integer", key))),
    }
}

fn string_child(tree: &Tree, parent: NodeId, key: &str) -> Result<String> {
    let id = tree
        .find_child(parent, key)
        .ok_or_else(|| bad_semantic(format!("missing string key '{}'", key)))?;
    match &tree.node(id).kind {
        NodeKind::String(s) => Ok(s.clone()),
        _ => Err(bad_semantic(format!("key '{}' is not a string", key))),
    }
}

fn child_node(tree: &Tree, parent: NodeId, key: &str) -> Result<NodeId> {
    tree.find_child(parent, key)
        .ok_or_else(|| bad_semantic(format!("missing section '{}'", key)))
}

/// Reads `extent_size` plus one [`PhysicalVolume`] per child of
/// `physical_volumes`, in file order (their final array index is what
/// stripes back-reference once resolved).
fn build_physical_volumes(tree: &Tree, vg_node: NodeId, sector_size: u64) -> Result<(u64, Vec<PhysicalVolume>)> {
    let extent_size_sectors = int_child(tree, vg_node, "extent_size")? as u64;
    let extent_size_bytes = extent_size_sectors * sector_size;

    let pvs_node = child_node(tree, vg_node, "physical_volumes")?;
    let mut pvs = Vec::new();
    for id in tree.children(pvs_node) {
        let name = tree.node(id).key.clone();
        let uuid = string_child(tree, id, "id")?;
        let device = string_child(tree, id, "device").unwrap_or_default();
        let dev_size = int_child(tree, id, "dev_size")? as u64;
        let pe_start_sectors = int_child(tree, id, "pe_start")? as u64;
        let pe_count = int_child(tree, id, "pe_count")? as u64;
        pvs.push(PhysicalVolume {
            name,
            uuid,
            device,
            extent_size_bytes,
            dev_size,
            pe_start_sectors,
            pe_count,
            window: None,
        });
    }
    Ok((extent_size_bytes, pvs))
}

/// Walks `logical_volumes/<lv_name>`'s `segmentN` children.
fn build_segments(tree: &Tree, vg_node: NodeId, lv_name: &str) -> Result<Vec<Segment>> {
    let lvs_node = child_node(tree, vg_node, "logical_volumes")?;
    let lv_node = tree
        .find_child(lvs_node, lv_name)
        .ok_or_else(|| bad_semantic(format!("logical volume '{}' not found", lv_name)))?;

    let segment_count = int_child(tree, lv_node, "segment_count")? as usize;
    let mut segments = Vec::with_capacity(segment_count);

    for i in 1..=segment_count {
        let seg_key = format!("segment{}", i);
        let seg_node = tree
            .find_child(lv_node, &seg_key)
            .ok_or_else(|| bad_semantic(format!("missing '{}'", seg_key)))?;

        let start_extent = int_child(tree, seg_node, "start_extent")? as u64;
        let extent_count = int_child(tree, seg_node, "extent_count")? as u64;
        let stripe_count = int_child(tree, seg_node, "stripe_count")? as u64;

        let stripes_node = child_node(tree, seg_node, "stripes")?;
        let elems: Vec<NodeId> = tree.children(stripes_node).collect();
        if elems.len() % 2 != 0 {
            return Err(bad_semantic(format!("'{}' stripes list has an odd element count", seg_key)));
        }

        let mut stripes = Vec::with_capacity(elems.len() / 2);
        for pair in elems.chunks(2) {
            let pv_name = match &tree.node(pair[0]).kind {
                NodeKind::String(s) => s.clone(),
                _ => return Err(bad_semantic("stripe PV name must be a string")),
            };
            let start_extent = match tree.node(pair[1]).kind {
                NodeKind::Integer(v) => v as u64,
                _ => return Err(bad_semantic("stripe start extent must be an integer")),
            };
            stripes.push(Stripe { pv_name, pv_index: None, start_extent });
        }

        segments.push(Segment { start_extent, extent_count, stripe_count, stripes });
    }

    Ok(segments)
}

/// Resolves each stripe's PV name to an index into `pvs`, a flat array --
/// not a name carried forward, not a raw pointer.
fn resolve_stripe_pvs(segments: &mut [Segment], pvs: &[PhysicalVolume]) -> Result<()> {
    for segment in segments.iter_mut() {
        for stripe in segment.stripes.iter_mut() {
            let idx = pvs
                .iter()
                .position(|pv| pv.name == stripe.pv_name)
                .ok_or_else(|| bad_semantic(format!("stripe refers to unresolved PV '{}'", stripe.pv_name)))?;
            stripe.pv_index = Some(idx);
        }
    }
    Ok(())
}

/// Resolves each PV's drive window by re-scanning every LVM partition found
/// during GPT discovery and matching its on-disk PV-header uuid against the
/// uuid recorded in the metadata's `id` field. In the common single-PV
/// case, `windows` has one entry and this just confirms it.
fn resolve_pv_windows<R: Read + Seek>(
    drive: &mut Drive<R>,
    windows: &[Window],
    pvs: &mut [PhysicalVolume],
    checker: &dyn Crc32Check,
) -> Result<()> {
    let mut by_uuid: HashMap<String, Window> = HashMap::new();
    for &window in windows {
        drive.set_partition(window.start, window.length);
        let (label, _sector) = match pv::label::scan_label(drive, checker) {
            Ok(v) => v,
            Err(_) => continue,
        };
        let header = match pv::label::read_pv_header(drive, &label) {
            Ok(v) => v,
            Err(_) => continue,
        };
        by_uuid.insert(hyphenate_uuid(header.uuid.trim()), window);
    }

    for pv in pvs.iter_mut() {
        pv.window = by_uuid.get(pv.uuid.trim()).copied();
    }
    Ok(())
}

/// Resolves PVs and segments for `lv_name` out of `tree`, then reads and
/// concatenates every segment's bytes into a single output buffer sized
/// the sum of each segment's `extentCount × extentSizeBytes`.
pub fn assemble_lv<R: Read + Seek>(
    drive: &mut Drive<R>,
    tree: &Tree,
    lv_name: &str,
    lvm_partitions: &[Window],
    checker: &dyn Crc32Check,
) -> Result<Vec<u8>> {
    let vg_node = find_vg_node(tree)?;
    let sector_size = drive.sector_size();

    let (extent_size_bytes, mut pvs) = build_physical_volumes(tree, vg_node, sector_size)?;
    resolve_pv_windows(drive, lvm_partitions, &mut pvs, checker)?;

    let mut segments = build_segments(tree, vg_node, lv_name)?;
    resolve_stripe_pvs(&mut segments, &pvs)?;

    let total_bytes: u64 = segments.iter().map(|s| s.extent_count * extent_size_bytes).sum();
    let mut output = vec![0u8; total_bytes as usize];

    let mut ordered: Vec<&Segment> = segments.iter().collect();
    ordered.sort_by_key(|s| s.start_extent);

    for segment in ordered {
        if segment.stripe_count > 1 {
            log::warn!(
                "segment at extent {} declares {} stripes; reading only the first (striping is not interleaved)",
                segment.start_extent,
                segment.stripe_count
            );
        }
        let stripe = segment
            .stripes
            .first()
            .ok_or_else(|| bad_semantic("segment has no stripes"))?;
        let pv = &pvs[stripe.pv_index.expect("resolved above")];
        let window = pv
            .window
            .ok_or_else(|| unsupported(format!("PV '{}' was not found on this drive", pv.name)))?;

        drive.set_partition(window.start, window.length);
        let read_offset = pv.pe_start_sectors * sector_size + stripe.start_extent * extent_size_bytes;
        let len = (segment.extent_count * extent_size_bytes) as usize;
        let bytes = drive.read_vec_at(read_offset, len)?;

        let out_offset = (segment.start_extent * extent_size_bytes) as usize;
        output[out_offset..out_offset + len].copy_from_slice(&bytes);
    }

    Ok(output)
}
