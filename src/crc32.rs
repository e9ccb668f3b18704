// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A pluggable CRC32 verifier. LVM2's on-disk CRC is the zlib/CRC-32
//! variant (poly 0xEDB88320, reflected, init/xorout 0xFFFFFFFF) -- exactly
//! what `crc::CRC_32_ISO_HDLC` computes.

use crc::{Crc, CRC_32_ISO_HDLC};

static ZLIB_CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Computes the zlib/CRC-32 checksum of `buf`.
pub fn crc32(buf: &[u8]) -> u32 {
    ZLIB_CRC32.checksum(buf)
}

/// A checker that validates a stored CRC32 against a byte range.
///
/// `NullChecker` is a no-op that always returns true; `Zlib32Checker`
/// performs the real computation.
pub trait Crc32Check {
    fn check(&self, expected: u32, buf: &[u8]) -> bool;
}

/// Always reports success -- useful when corruption detection isn't the
/// point of a given run (e.g. recovering from media that's already
/// known-bad).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullChecker;

impl Crc32Check for NullChecker {
    fn check(&self, _expected: u32, _buf: &[u8]) -> bool {
        true
    }
}

/// The real zlib/CRC-32 check.
#[derive(Debug, Default, Clone, Copy)]
pub struct Zlib32Checker;

impl Crc32Check for Zlib32Checker {
    fn check(&self, expected: u32, buf: &[u8]) -> bool {
        crc32(buf) == expected
    }
}
