// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Small helpers shared across decoding stages.

/// Rounds `num` up to the next multiple of `align_to` (which must be a power of two).
pub fn align_to(num: usize, align_to: usize) -> usize {
    let agn = align_to - 1;
    (num + agn) & !agn
}

/// Renders a raw 32-character LVM PV/VG UUID in its canonical hyphenated form
/// (groups of 6,4,4,4,4,4,6 hex-alphabet characters). Display-only; the raw
/// 32-byte form is what's compared and stored everywhere else.
pub fn hyphenate_uuid(raw: &str) -> String {
    const GROUPS: [usize; 7] = [6, 4, 4, 4, 4, 4, 6];
    let mut out = String::with_capacity(raw.len() + GROUPS.len() - 1);
    let mut chars = raw.chars();
    for (i, &len) in GROUPS.iter().enumerate() {
        if i > 0 {
            out.push('-');
        }
        for _ in 0..len {
            if let Some(c) = chars.next() {
                out.push(c);
            }
        }
    }
    out
}
