// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A seekable byte source windowed by a current "partition" range.
//!
//! `Drive<R>` is generic over any `Read + Seek` source, so the whole
//! pipeline can run against an in-memory `Cursor<Vec<u8>>` in tests without
//! touching a real block device.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{Error, Result};

pub const DEFAULT_SECTOR_SIZE: u64 = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: u64,
    pub length: u64,
}

/// A byte source with a current partition window. All reads are offsets
/// *within* the window; a read whose `offset + n` exceeds the window length
/// is an error, never an implicit short read or EOF.
pub struct Drive<R> {
    source: R,
    window: Window,
    sector_size: u64,
}

impl Drive<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Drive<File>> {
        let file = File::open(path)?;
        Drive::from_reader(file)
    }
}

impl<R: Read + Seek> Drive<R> {
    /// Wraps `source`, setting the initial window to cover the whole
    /// underlying stream (GPT parsing needs this before it can narrow the
    /// window to the LVM partition).
    pub fn from_reader(mut source: R) -> Result<Drive<R>> {
        let length = source.seek(SeekFrom::End(0))?;
        source.seek(SeekFrom::Start(0))?;
        Ok(Drive {
            source,
            window: Window { start: 0, length },
            sector_size: DEFAULT_SECTOR_SIZE,
        })
    }

    pub fn sector_size(&self) -> u64 {
        self.sector_size
    }

    pub fn window(&self) -> Window {
        self.window
    }

    /// Narrows (or widens) the current partition window to an absolute byte
    /// range on the underlying source.
    pub fn set_partition(&mut self, start: u64, length: u64) {
        self.window = Window { start, length };
    }

    /// Reads exactly `buf.len()` bytes starting at `offset` within the
    /// current window. Fails if `offset + buf.len()` exceeds the window's
    /// length; a short physical read is also an error, never silently
    /// tolerated.
    pub fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let n = buf.len() as u64;
        if offset.checked_add(n).map_or(true, |end| end > self.window.length) {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!(
                    "read of {} bytes at offset {} exceeds partition window of length {}",
                    n, offset, self.window.length
                ),
            )));
        }
        self.source.seek(SeekFrom::Start(self.window.start + offset))?;
        self.source.read_exact(buf)?;
        Ok(())
    }

    pub fn read_vec_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_exact_at(offset, &mut buf)?;
        Ok(buf)
    }
}
