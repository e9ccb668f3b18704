// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Writes the reconstructed LV image to `<lv-name>.bin`.

use std::fs::{self, OpenOptions, Permissions};
use std::io::Write;
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Owner+group read, no write, no execute, no world access -- the mode an
/// extracted LV image is expected to land with.
const OUTPUT_MODE: u32 = 0o440;

/// Builds the output path for `lv_name` inside `dir` (the current working
/// directory, in the CLI's case).
pub fn output_path<P: AsRef<Path>>(dir: P, lv_name: &str) -> PathBuf {
    dir.as_ref().join(format!("{}.bin", lv_name))
}

/// Creates `<lv-name>.bin` mode `0o440` and writes `buffer` to it in full.
///
/// The mode is passed to `open(2)` and then reapplied with
/// `set_permissions`, since the former is still subject to the process
/// umask and the latter is not -- the file must end up owner+group
/// readable and nothing else, regardless of umask.
pub fn write_lv_image<P: AsRef<Path>>(dir: P, lv_name: &str, buffer: &[u8]) -> Result<PathBuf> {
    let path = output_path(dir, lv_name);
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(OUTPUT_MODE)
        .open(&path)?;
    file.write_all(buffer)?;
    fs::set_permissions(&path, Permissions::from_mode(OUTPUT_MODE))?;
    Ok(path)
}
